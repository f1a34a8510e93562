// Request-scoped notification collector

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::ValidationErrors;

use crate::error::ApiError;

/// A single reportable failure: where it happened and what went wrong
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub path: String,
    pub message: String,
}

impl Notification {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// One field-level validation failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: String,
    pub message: String,
}

/// Flatten `validator` errors into field issues, ordered by field name.
///
/// The rule's message is used when present, otherwise its code.
pub fn field_issues(errors: &ValidationErrors) -> Vec<FieldIssue> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(b.0));

    fields
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| FieldIssue {
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string()),
            })
        })
        .collect()
}

/// Collects notifications for exactly one request.
///
/// Clones share the same storage, so a handle can be passed down into
/// services while the response finalizer keeps its own. A new collector is
/// created for every request; never store one in shared application state.
#[derive(Debug, Clone, Default)]
pub struct NotificationCollector {
    inner: Arc<Mutex<Vec<Notification>>>,
}

impl NotificationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, path: impl Into<String>, message: impl Into<String>) {
        self.inner.lock().push(Notification::new(path, message));
    }

    /// Record one `"Field <field> <message>"` notification per issue
    pub fn add_validation_failures<I>(&self, path: &str, issues: I)
    where
        I: IntoIterator<Item = FieldIssue>,
    {
        let mut guard = self.inner.lock();
        for issue in issues {
            guard.push(Notification::new(
                path,
                format!("Field {} {}", issue.field, issue.message),
            ));
        }
    }

    /// Snapshot in insertion order
    pub fn all(&self) -> Vec<Notification> {
        self.inner.lock().clone()
    }

    pub fn has_any(&self) -> bool {
        !self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    /// Drain everything collected so far
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.inner.lock())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for NotificationCollector
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<NotificationCollector>()
            .cloned()
            .ok_or_else(|| {
                ApiError::Internal("notification collector missing from request".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Signup {
        #[validate(email(message = "Invalid email address"))]
        email: String,
        #[validate(length(min = 3))]
        name: String,
    }

    #[test]
    fn test_notifications_keep_insertion_order() {
        let collector = NotificationCollector::new();
        collector.add("x", "m1");
        collector.add("x", "m2");

        assert_eq!(
            collector.all(),
            vec![Notification::new("x", "m1"), Notification::new("x", "m2")]
        );
        assert!(collector.has_any());
    }

    #[test]
    fn test_clear_empties_collector() {
        let collector = NotificationCollector::new();
        collector.add("x", "m1");
        collector.clear();

        assert!(!collector.has_any());
        assert!(collector.all().is_empty());
    }

    #[test]
    fn test_clones_share_storage() {
        let collector = NotificationCollector::new();
        let handle = collector.clone();
        handle.add("/login", "Invalid credentials");

        assert_eq!(collector.all().len(), 1);
    }

    #[test]
    fn test_separate_collectors_do_not_leak() {
        let first = NotificationCollector::new();
        let second = NotificationCollector::new();
        first.add("/register_user", "boom");

        assert!(!second.has_any());
    }

    #[test]
    fn test_take_drains() {
        let collector = NotificationCollector::new();
        collector.add("a", "b");

        assert_eq!(collector.take().len(), 1);
        assert!(!collector.has_any());
    }

    #[test]
    fn test_validation_failures_are_prefixed_with_field() {
        let collector = NotificationCollector::new();
        collector.add_validation_failures(
            "/register_user",
            vec![
                FieldIssue {
                    field: "email".to_string(),
                    message: "Invalid email address".to_string(),
                },
                FieldIssue {
                    field: "name".to_string(),
                    message: "too short".to_string(),
                },
            ],
        );

        let all = collector.all();
        assert_eq!(all[0].message, "Field email Invalid email address");
        assert_eq!(all[1].message, "Field name too short");
        assert!(all.iter().all(|n| n.path == "/register_user"));
    }

    #[test]
    fn test_field_issues_from_validator() {
        let signup = Signup {
            email: "not-an-email".to_string(),
            name: "ab".to_string(),
        };
        let errors = signup.validate().unwrap_err();
        let issues = field_issues(&errors);

        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].field, "email");
        assert_eq!(issues[0].message, "Invalid email address");
        // No message configured: falls back to the rule code
        assert_eq!(issues[1].field, "name");
        assert_eq!(issues[1].message, "length");
    }
}
