use chrono::{Timelike, Utc};
use rusqlite::{Connection, TransactionBehavior};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::Booking;
use crate::services::auth::Actor;

pub const ALREADY_BOOKED: &str = "Event already booked by this user";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BookEventRequest {
    pub event_id: i64,
    pub price_category_id: i64,
    #[validate(range(min = 1, message = "Ticket count must be at least 1."))]
    pub ticket_count: i64,
    #[validate(range(min = 0, message = "Payment amount cannot be negative."))]
    pub payment_amount: i64,
}

/// Books `ticket_count` tickets of one price tier for the calling tourist.
///
/// Checks run in a fixed order and the first failure aborts the booking:
/// role, duplicate booking, event existence, remaining capacity, price tier
/// ownership, exact payment. Everything after the role check happens inside
/// one IMMEDIATE transaction, so the capacity read and the insert cannot be
/// interleaved with another booking for the same event.
pub fn book_event(
    conn: &mut Connection,
    actor: &Actor,
    req: &BookEventRequest,
) -> Result<Booking, AppError> {
    let tourist_id = actor.tourist_id()?;
    if req.ticket_count <= 0 {
        return Err(AppError::InvalidArgument(
            "Ticket count must be at least 1.".to_string(),
        ));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    if queries::find_booking(&tx, tourist_id, req.event_id)?.is_some() {
        return Err(AppError::Conflict(ALREADY_BOOKED.to_string()));
    }

    let event = queries::get_event(&tx, req.event_id)?
        .filter(|e| e.is_enabled())
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    let current_count = queries::booked_ticket_count(&tx, event.id)?;
    let remaining = event.maximum_count - current_count;
    if req.ticket_count > remaining {
        return Err(AppError::CapacityExceeded {
            remaining: remaining.max(0),
        });
    }

    let category = queries::get_price_category_for_event(&tx, req.price_category_id, event.id)?
        .ok_or_else(|| {
            AppError::InvalidArgument("Invalid price category for the selected event.".to_string())
        })?;

    let expected = category.price.checked_mul(req.ticket_count).ok_or_else(|| {
        AppError::InvalidArgument("Payment amount is out of range.".to_string())
    })?;
    if expected != req.payment_amount {
        return Err(AppError::InvalidArgument(format!(
            "Incorrect payment amount. Expected {expected}, got {}",
            req.payment_amount
        )));
    }

    let now = Utc::now().naive_utc();
    let paid_at = now.with_nanosecond(0).unwrap_or(now);
    let reference = Uuid::new_v4().to_string();

    let id = match queries::insert_booking(
        &tx,
        &reference,
        tourist_id,
        event.id,
        category.id,
        req.ticket_count,
        req.payment_amount,
        &paid_at,
    ) {
        Ok(id) => id,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::Conflict(ALREADY_BOOKED.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tx.commit()?;

    tracing::info!(
        booking_id = id,
        event_id = event.id,
        tourist_id,
        tickets = req.ticket_count,
        remaining = remaining - req.ticket_count,
        "booking created"
    );

    Ok(Booking {
        id,
        reference,
        tourist_id,
        event_id: event.id,
        price_category_id: category.id,
        ticket_count: req.ticket_count,
        payment_amount: req.payment_amount,
        paid_at,
    })
}

pub fn list_bookings(conn: &Connection, actor: &Actor) -> Result<Vec<Booking>, AppError> {
    let tourist_id = actor.tourist_id()?;
    Ok(queries::get_bookings_for_tourist(conn, tourist_id)?)
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
