//! HTTP handlers for the classifier service.

pub mod classify;
pub mod health;

pub use classify::classify_dress;
pub use health::health_check;
