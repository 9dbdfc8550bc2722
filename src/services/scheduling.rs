use chrono::{NaiveDate, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::event::overlaps;

pub const SLOT_TAKEN: &str = "Time slot already booked for another event.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleDecision {
    Allowed,
    /// `event_id` is the first enabled event found overlapping the proposal.
    Conflict { event_id: i64 },
}

/// Checks whether `business_id` may run an event on `date` from `start_time`
/// to `end_time` without overlapping one of its enabled events.
///
/// Pure read: callers that go on to write must hold an IMMEDIATE
/// transaction around both this check and their write.
pub fn propose_event(
    conn: &Connection,
    business_id: i64,
    date: &NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    exclude_event_id: Option<i64>,
) -> Result<ScheduleDecision, AppError> {
    if queries::get_business(conn, business_id)?.is_none() {
        return Err(AppError::NotFound("Business not found.".to_string()));
    }

    let events = queries::get_enabled_events_on_date(conn, business_id, date, exclude_event_id)?;

    for existing in &events {
        if overlaps(existing.start_time, existing.end_time, start_time, end_time) {
            return Ok(ScheduleDecision::Conflict {
                event_id: existing.id,
            });
        }
    }

    Ok(ScheduleDecision::Allowed)
}

/// [`propose_event`], with a conflict turned into the caller-facing error.
pub fn ensure_slot_free(
    conn: &Connection,
    business_id: i64,
    date: &NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
    exclude_event_id: Option<i64>,
) -> Result<(), AppError> {
    match propose_event(conn, business_id, date, start_time, end_time, exclude_event_id)? {
        ScheduleDecision::Allowed => Ok(()),
        ScheduleDecision::Conflict { event_id } => {
            tracing::info!(business_id, %date, conflicting_event = event_id, "schedule conflict");
            Err(AppError::Conflict(SLOT_TAKEN.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::time_format::parse_timestamp;
    use crate::models::{EventDetails, EventStatus, Role};

    fn setup_db() -> (Connection, i64) {
        let conn = db::init_db(":memory:").unwrap();
        let user_id =
            queries::create_user(&conn, "Owner Name", "owner@example.com", "x", Role::Business).unwrap();
        let business_id = queries::create_business(&conn, user_id, "Harbour Tours").unwrap();
        (conn, business_id)
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    fn add_event(conn: &Connection, business_id: i64, date: &str, start: &str, end: &str) -> i64 {
        let details = EventDetails {
            name: "Sunset Cruise".to_string(),
            event_type: "tour".to_string(),
            category: "boat".to_string(),
            maximum_count: 10,
            coordinator_name: "Kim".to_string(),
            coordinator_contact: "+15550000000".to_string(),
            description: "A cruise".to_string(),
            hashtag: "#sunset".to_string(),
            location: "Pier 3".to_string(),
            country: "LK".to_string(),
            discount: None,
            refund_policy: "none".to_string(),
            date: d(date),
            start_time: t(start),
            end_time: t(end),
            banner_url: None,
        };
        let now = parse_timestamp("2025-06-01 09:00:00").unwrap();
        queries::insert_event(conn, business_id, &details, &now).unwrap()
    }

    #[test]
    fn test_unknown_business_not_found() {
        let (conn, business_id) = setup_db();
        let result = propose_event(&conn, business_id + 99, &d("2025-06-15"), t("14:00"), t("16:00"), None);
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[test]
    fn test_empty_day_allowed() {
        let (conn, business_id) = setup_db();
        let decision =
            propose_event(&conn, business_id, &d("2025-06-15"), t("14:00"), t("16:00"), None).unwrap();
        assert_eq!(decision, ScheduleDecision::Allowed);
    }

    #[test]
    fn test_touching_boundary_allowed_overlap_rejected() {
        let (conn, business_id) = setup_db();
        let existing = add_event(&conn, business_id, "2025-06-15", "14:00", "16:00");

        let touching =
            propose_event(&conn, business_id, &d("2025-06-15"), t("16:00"), t("18:00"), None).unwrap();
        assert_eq!(touching, ScheduleDecision::Allowed);

        let overlapping =
            propose_event(&conn, business_id, &d("2025-06-15"), t("15:00"), t("17:00"), None).unwrap();
        assert_eq!(overlapping, ScheduleDecision::Conflict { event_id: existing });
    }

    #[test]
    fn test_other_date_and_other_business_ignored() {
        let (conn, business_id) = setup_db();
        add_event(&conn, business_id, "2025-06-15", "14:00", "16:00");

        let other_day =
            propose_event(&conn, business_id, &d("2025-06-16"), t("14:00"), t("16:00"), None).unwrap();
        assert_eq!(other_day, ScheduleDecision::Allowed);

        let user_id =
            queries::create_user(&conn, "Other Owner", "other@example.com", "x", Role::Business).unwrap();
        let other_business = queries::create_business(&conn, user_id, "Reef Divers").unwrap();
        let other =
            propose_event(&conn, other_business, &d("2025-06-15"), t("14:00"), t("16:00"), None).unwrap();
        assert_eq!(other, ScheduleDecision::Allowed);
    }

    #[test]
    fn test_excluded_event_not_counted() {
        let (conn, business_id) = setup_db();
        let id = add_event(&conn, business_id, "2025-06-15", "14:00", "16:00");

        let decision =
            propose_event(&conn, business_id, &d("2025-06-15"), t("14:30"), t("16:30"), Some(id)).unwrap();
        assert_eq!(decision, ScheduleDecision::Allowed);
    }

    #[test]
    fn test_disabled_event_not_counted() {
        let (conn, business_id) = setup_db();
        let id = add_event(&conn, business_id, "2025-06-15", "14:00", "16:00");
        let now = parse_timestamp("2025-06-02 09:00:00").unwrap();
        queries::set_event_status(&conn, id, EventStatus::Disabled, &now).unwrap();

        let decision =
            propose_event(&conn, business_id, &d("2025-06-15"), t("15:00"), t("17:00"), None).unwrap();
        assert_eq!(decision, ScheduleDecision::Allowed);
    }

    #[test]
    fn test_ensure_slot_free_maps_conflict() {
        let (conn, business_id) = setup_db();
        add_event(&conn, business_id, "2025-06-15", "14:00", "16:00");

        let err = ensure_slot_free(&conn, business_id, &d("2025-06-15"), t("13:00"), t("14:30"), None)
            .unwrap_err();
        assert!(matches!(&err, AppError::Conflict(msg) if msg == SLOT_TAKEN));
    }
}
