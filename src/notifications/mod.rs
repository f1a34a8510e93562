// Notification module
// Request-scoped failure reporting and the response finalizer that flushes it

pub mod collector;
pub mod finalizer;
pub mod messages;

pub use collector::{field_issues, FieldIssue, Notification, NotificationCollector};
pub use finalizer::{failure_response, finalize_response, handle_panic, FailureEnvelope, ReportedNotifications};
pub use messages::interpolate;
