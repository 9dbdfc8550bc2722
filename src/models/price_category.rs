use serde::Serialize;

/// One priced ticket tier of an event. `price` is in minor currency units.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PriceCategory {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub price: i64,
}
