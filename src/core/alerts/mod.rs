// Proximity alert module.
//
// Architecture:
// - model.rs: Policy constants, display decisions and alert events
// - engine.rs: Tracking session state and the sample evaluator
// - dispatch.rs: Notification sinks invoked when an alert fires

pub mod dispatch;
pub mod engine;
pub mod model;
