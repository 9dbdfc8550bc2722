use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "PENDING",
            ApprovalStatus::Approved => "APPROVED",
            ApprovalStatus::Rejected => "REJECTED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(ApprovalStatus::Pending),
            "APPROVED" => Some(ApprovalStatus::Approved),
            "REJECTED" => Some(ApprovalStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalCategory {
    Event,
    Business,
}

impl ApprovalCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalCategory::Event => "EVENT",
            ApprovalCategory::Business => "BUSINESS",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "BUSINESS" => ApprovalCategory::Business,
            _ => ApprovalCategory::Event,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ApprovalAction {
    Create,
    Update,
}

impl ApprovalAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalAction::Create => "CREATE",
            ApprovalAction::Update => "UPDATE",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "UPDATE" => ApprovalAction::Update,
            _ => ApprovalAction::Create,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub id: i64,
    pub event_id: Option<i64>,
    pub business_id: Option<i64>,
    pub category: ApprovalCategory,
    pub action: ApprovalAction,
    pub status: ApprovalStatus,
    pub authorized_by: Option<String>,
    pub authorized_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
}
