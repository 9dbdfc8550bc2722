use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: i64,
    pub reference: String,
    pub tourist_id: i64,
    pub event_id: i64,
    pub price_category_id: i64,
    pub ticket_count: i64,
    pub payment_amount: i64,
    pub paid_at: NaiveDateTime,
}
