mod health;
pub mod track;

pub use health::{health_check, readiness_check};
pub use track::{method_not_allowed, track_event};
