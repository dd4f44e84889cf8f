//! Emergency contacts and SOS alerts.

pub mod dispatch;
pub mod model;
pub mod store;
