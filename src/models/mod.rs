pub mod approval;
pub mod booking;
pub mod event;
pub mod price_category;
pub mod time_format;
pub mod user;

pub use approval::{Approval, ApprovalAction, ApprovalCategory, ApprovalStatus};
pub use booking::Booking;
pub use event::{Event, EventCondition, EventDetails, EventSpecification, EventStatus};
pub use price_category::PriceCategory;
pub use user::{Business, Role, User};
