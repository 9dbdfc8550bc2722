use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use super::time_format::hhmm;

#[derive(Debug, Clone, Serialize)]
pub struct Event {
    pub id: i64,
    pub business_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub category: String,
    pub maximum_count: i64,
    pub coordinator_name: String,
    pub coordinator_contact: String,
    pub description: String,
    pub hashtag: String,
    pub location: String,
    pub country: String,
    pub discount: Option<f64>,
    pub refund_policy: String,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub start_time: NaiveTime,
    #[serde(with = "hhmm")]
    pub end_time: NaiveTime,
    pub banner_url: Option<String>,
    pub status: EventStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Event {
    pub fn is_enabled(&self) -> bool {
        self.status == EventStatus::Enabled
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Enabled,
    Disabled,
}

impl EventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Enabled => "enabled",
            EventStatus::Disabled => "disabled",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "disabled" => EventStatus::Disabled,
            _ => EventStatus::Enabled,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventSpecification {
    pub id: i64,
    pub event_id: i64,
    pub title: String,
    pub detail: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct EventCondition {
    pub id: i64,
    pub event_id: i64,
    pub description: String,
}

/// The mutable attributes of an event, as written by create and update.
#[derive(Debug, Clone)]
pub struct EventDetails {
    pub name: String,
    pub event_type: String,
    pub category: String,
    pub maximum_count: i64,
    pub coordinator_name: String,
    pub coordinator_contact: String,
    pub description: String,
    pub hashtag: String,
    pub location: String,
    pub country: String,
    pub discount: Option<f64>,
    pub refund_policy: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub banner_url: Option<String>,
}

impl From<&Event> for EventDetails {
    fn from(e: &Event) -> Self {
        Self {
            name: e.name.clone(),
            event_type: e.event_type.clone(),
            category: e.category.clone(),
            maximum_count: e.maximum_count,
            coordinator_name: e.coordinator_name.clone(),
            coordinator_contact: e.coordinator_contact.clone(),
            description: e.description.clone(),
            hashtag: e.hashtag.clone(),
            location: e.location.clone(),
            country: e.country.clone(),
            discount: e.discount,
            refund_policy: e.refund_policy.clone(),
            date: e.date,
            start_time: e.start_time,
            end_time: e.end_time,
            banner_url: e.banner_url.clone(),
        }
    }
}

/// Half-open interval test: `[a_start, a_end)` and `[b_start, b_end)`
/// overlap iff each starts before the other ends. Touching endpoints do not
/// overlap.
pub fn overlaps(a_start: NaiveTime, a_end: NaiveTime, b_start: NaiveTime, b_end: NaiveTime) -> bool {
    a_start < b_end && a_end > b_start
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> NaiveTime {
        NaiveTime::parse_from_str(s, "%H:%M").unwrap()
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        assert!(!overlaps(t("14:00"), t("16:00"), t("16:00"), t("18:00")));
        assert!(!overlaps(t("16:00"), t("18:00"), t("14:00"), t("16:00")));
    }

    #[test]
    fn test_partial_and_nested_overlap() {
        assert!(overlaps(t("14:00"), t("16:00"), t("15:00"), t("17:00")));
        assert!(overlaps(t("14:00"), t("16:00"), t("14:30"), t("15:30")));
        assert!(overlaps(t("14:30"), t("15:30"), t("14:00"), t("16:00")));
        assert!(overlaps(t("14:00"), t("16:00"), t("14:00"), t("16:00")));
    }

    #[test]
    fn test_disjoint_intervals() {
        assert!(!overlaps(t("08:00"), t("09:00"), t("10:00"), t("11:00")));
    }

    #[test]
    fn test_event_status_round_trip_text() {
        assert_eq!(EventStatus::parse("disabled"), EventStatus::Disabled);
        assert_eq!(EventStatus::parse(EventStatus::Enabled.as_str()), EventStatus::Enabled);
    }
}
