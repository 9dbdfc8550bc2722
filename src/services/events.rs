use chrono::{NaiveDate, NaiveTime, Timelike, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::time_format::{hhmm, hhmm_option};
use crate::models::{
    ApprovalAction, ApprovalCategory, Business, Event, EventCondition, EventDetails,
    EventSpecification, EventStatus, PriceCategory,
};
use crate::services::auth::Actor;
use crate::services::scheduling;

// ── Requests ──

#[derive(Debug, Deserialize, Validate)]
pub struct SpecificationInput {
    #[validate(length(min = 1, message = "Specification title is required."))]
    pub title: String,
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ConditionInput {
    #[validate(length(min = 1, message = "Condition description is required."))]
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct PriceCategoryInput {
    #[validate(length(min = 1, message = "Price category name is required."))]
    pub name: String,
    #[validate(range(min = 0, message = "Price cannot be negative."))]
    pub price: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = "validate_create_times"))]
pub struct CreateEventRequest {
    pub business_id: i64,
    #[validate(length(min = 1, message = "Event name is required."))]
    pub name: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "Event type is required."))]
    pub event_type: String,
    #[validate(length(min = 1, message = "Event category is required."))]
    pub category: String,
    #[validate(range(min = 1, message = "Maximum count must be at least 1."))]
    pub maximum_count: i64,
    #[validate(length(min = 1, message = "Coordinator name is required."))]
    pub coordinator_name: String,
    #[validate(length(min = 1, message = "Coordinator contact is required."))]
    pub coordinator_contact: String,
    #[validate(length(min = 1, message = "Description is required."))]
    pub description: String,
    #[validate(length(min = 1, message = "Hashtag is required."))]
    pub hashtag: String,
    #[validate(length(min = 1, message = "Location is required."))]
    pub location: String,
    #[validate(length(min = 1, message = "Country is required."))]
    pub country: String,
    #[validate(range(min = 0.0, max = 100.0, message = "Discount must be between 0 and 100."))]
    pub discount: Option<f64>,
    #[validate(length(min = 1, message = "Refund policy is required."))]
    pub refund_policy: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    #[validate(url(message = "Banner URL must be a valid URI."))]
    pub banner_url: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub specifications: Vec<SpecificationInput>,
    #[serde(default)]
    #[validate(nested)]
    pub conditions: Vec<ConditionInput>,
    #[serde(default)]
    #[validate(nested)]
    pub price_categories: Vec<PriceCategoryInput>,
}

fn validate_create_times(req: &CreateEventRequest) -> Result<(), ValidationError> {
    check_time_range(req.start_time, req.end_time)
}

fn check_time_range(start: NaiveTime, end: NaiveTime) -> Result<(), ValidationError> {
    if start < end {
        Ok(())
    } else {
        Err(ValidationError::new("time_range").with_message("Start time must be before end time.".into()))
    }
}

impl CreateEventRequest {
    fn details(&self) -> EventDetails {
        EventDetails {
            name: self.name.clone(),
            event_type: self.event_type.clone(),
            category: self.category.clone(),
            maximum_count: self.maximum_count,
            coordinator_name: self.coordinator_name.clone(),
            coordinator_contact: self.coordinator_contact.clone(),
            description: self.description.clone(),
            hashtag: self.hashtag.clone(),
            location: self.location.clone(),
            country: self.country.clone(),
            discount: self.discount,
            refund_policy: self.refund_policy.clone(),
            date: self.date,
            start_time: self.start_time,
            end_time: self.end_time,
            banner_url: self.banner_url.clone(),
        }
    }
}

/// Partial update: absent fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateEventRequest {
    pub business_id: Option<i64>,
    #[validate(length(min = 1, message = "Event name cannot be empty."))]
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub category: Option<String>,
    #[validate(range(min = 1, message = "Maximum count must be at least 1."))]
    pub maximum_count: Option<i64>,
    pub coordinator_name: Option<String>,
    pub coordinator_contact: Option<String>,
    pub description: Option<String>,
    pub hashtag: Option<String>,
    pub location: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = 0.0, max = 100.0, message = "Discount must be between 0 and 100."))]
    pub discount: Option<f64>,
    pub refund_policy: Option<String>,
    pub date: Option<NaiveDate>,
    #[serde(default, with = "hhmm_option")]
    pub start_time: Option<NaiveTime>,
    #[serde(default, with = "hhmm_option")]
    pub end_time: Option<NaiveTime>,
    #[validate(url(message = "Banner URL must be a valid URI."))]
    pub banner_url: Option<String>,
}

impl UpdateEventRequest {
    fn merge(&self, mut details: EventDetails) -> EventDetails {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        set(&mut details.name, &self.name);
        set(&mut details.event_type, &self.event_type);
        set(&mut details.category, &self.category);
        set(&mut details.maximum_count, &self.maximum_count);
        set(&mut details.coordinator_name, &self.coordinator_name);
        set(&mut details.coordinator_contact, &self.coordinator_contact);
        set(&mut details.description, &self.description);
        set(&mut details.hashtag, &self.hashtag);
        set(&mut details.location, &self.location);
        set(&mut details.country, &self.country);
        set(&mut details.refund_policy, &self.refund_policy);
        set(&mut details.date, &self.date);
        set(&mut details.start_time, &self.start_time);
        set(&mut details.end_time, &self.end_time);
        if self.discount.is_some() {
            details.discount = self.discount;
        }
        if self.banner_url.is_some() {
            details.banner_url = self.banner_url.clone();
        }
        details
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
    pub hashtag: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

// ── Views ──

#[derive(Debug, Serialize)]
pub struct EventDetail {
    #[serde(flatten)]
    pub event: Event,
    pub booked_tickets: i64,
    pub remaining_tickets: i64,
    pub price_categories: Vec<PriceCategory>,
    pub specifications: Vec<EventSpecification>,
    pub conditions: Vec<EventCondition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPage {
    pub current_page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub events: Vec<Event>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 100;

// ── Operations ──

pub fn get_event_detail(conn: &Connection, event_id: i64) -> Result<EventDetail, AppError> {
    let event = queries::get_event(conn, event_id)?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
    let booked_tickets = queries::booked_ticket_count(conn, event_id)?;

    Ok(EventDetail {
        remaining_tickets: (event.maximum_count - booked_tickets).max(0),
        booked_tickets,
        price_categories: queries::get_price_categories(conn, event_id)?,
        specifications: queries::get_specifications(conn, event_id)?,
        conditions: queries::get_conditions(conn, event_id)?,
        event,
    })
}

pub fn search_events(conn: &Connection, query: &SearchQuery) -> Result<EventPage, AppError> {
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let page = query.page.unwrap_or(1).max(1);
    let name = query.name.as_deref().filter(|s| !s.is_empty());
    let hashtag = query.hashtag.as_deref().filter(|s| !s.is_empty());

    let offset = (page - 1)
        .checked_mul(limit)
        .ok_or_else(|| AppError::InvalidArgument("Page number is out of range.".to_string()))?;

    let events = queries::search_events(conn, name, hashtag, limit, offset)?;
    let total = queries::count_events(conn, name, hashtag)?;

    Ok(EventPage {
        current_page: page,
        total_pages: (total + limit - 1) / limit,
        total,
        events,
    })
}

fn load_managed_business(conn: &Connection, actor: &Actor, business_id: i64) -> Result<Business, AppError> {
    let business = queries::get_business(conn, business_id)?
        .ok_or_else(|| AppError::NotFound("Business not found.".to_string()))?;
    if !actor.can_manage_business(business.id) {
        return Err(AppError::Forbidden(
            "You can only manage events of your own business".to_string(),
        ));
    }
    Ok(business)
}

fn now_seconds() -> chrono::NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Creates an event with its price tiers, specifications and conditions,
/// provided the slot is free for the business on that date.
pub fn create_event(
    conn: &mut Connection,
    actor: &Actor,
    req: &CreateEventRequest,
) -> Result<EventDetail, AppError> {
    actor.require_event_manager()?;
    let details = req.details();

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let business = load_managed_business(&tx, actor, req.business_id)?;
    scheduling::ensure_slot_free(
        &tx,
        business.id,
        &details.date,
        details.start_time,
        details.end_time,
        None,
    )?;

    let now = now_seconds();
    let event_id = queries::insert_event(&tx, business.id, &details, &now)?;
    for spec in &req.specifications {
        queries::insert_specification(&tx, event_id, &spec.title, &spec.detail)?;
    }
    for condition in &req.conditions {
        queries::insert_condition(&tx, event_id, &condition.description)?;
    }
    for category in &req.price_categories {
        queries::insert_price_category(&tx, event_id, &category.name, category.price)?;
    }
    queries::insert_approval(
        &tx,
        Some(event_id),
        Some(business.id),
        ApprovalCategory::Event,
        ApprovalAction::Create,
    )?;

    let detail = get_event_detail(&tx, event_id)?;
    tx.commit()?;

    tracing::info!(event_id, business_id = business.id, date = %details.date, "event created");
    Ok(detail)
}

/// Applies a partial update. Schedule and capacity are re-checked against
/// the merged values before anything is written.
pub fn update_event(
    conn: &mut Connection,
    actor: &Actor,
    event_id: i64,
    req: &UpdateEventRequest,
) -> Result<EventDetail, AppError> {
    actor.require_event_manager()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let existing = queries::get_event(&tx, event_id)?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
    let mut business = load_managed_business(&tx, actor, existing.business_id)?;
    if let Some(id) = req.business_id.filter(|id| *id != existing.business_id) {
        business = load_managed_business(&tx, actor, id)?;
    }

    let details = req.merge(EventDetails::from(&existing));
    if details.start_time >= details.end_time {
        return Err(AppError::InvalidArgument(
            "Start time must be before end time.".to_string(),
        ));
    }

    let booked = queries::booked_ticket_count(&tx, event_id)?;
    if details.maximum_count < booked {
        return Err(AppError::InvalidArgument(format!(
            "Maximum count cannot be lower than the {booked} tickets already booked."
        )));
    }

    if existing.is_enabled() {
        scheduling::ensure_slot_free(
            &tx,
            business.id,
            &details.date,
            details.start_time,
            details.end_time,
            Some(event_id),
        )?;
    }

    queries::update_event(&tx, event_id, business.id, &details, &now_seconds())?;
    queries::insert_approval(
        &tx,
        Some(event_id),
        Some(business.id),
        ApprovalCategory::Event,
        ApprovalAction::Update,
    )?;

    let detail = get_event_detail(&tx, event_id)?;
    tx.commit()?;

    tracing::info!(event_id, business_id = business.id, "event updated");
    Ok(detail)
}

/// Enables or disables an event. Events are never deleted; re-enabling
/// puts the event back into the schedule and so must find its slot free.
pub fn set_event_status(
    conn: &mut Connection,
    actor: &Actor,
    event_id: i64,
    status: EventStatus,
) -> Result<Event, AppError> {
    actor.require_event_manager()?;

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let event = queries::get_event(&tx, event_id)?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
    load_managed_business(&tx, actor, event.business_id)?;

    if status == EventStatus::Enabled && !event.is_enabled() {
        scheduling::ensure_slot_free(
            &tx,
            event.business_id,
            &event.date,
            event.start_time,
            event.end_time,
            Some(event_id),
        )?;
    }

    queries::set_event_status(&tx, event_id, status, &now_seconds())?;
    let updated = queries::get_event(&tx, event_id)?
        .ok_or_else(|| AppError::NotFound("Event not found.".to_string()))?;
    tx.commit()?;

    tracing::info!(event_id, status = status.as_str(), "event status changed");
    Ok(updated)
}
