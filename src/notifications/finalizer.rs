// Response finalizer: turns collected notifications into the failure envelope

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use tracing::{debug, error};

use crate::notifications::{
    collector::{Notification, NotificationCollector},
    messages::{INTERNAL_ERROR, REQUEST_PATH, SERVER_PATH},
};

/// The only failure shape this API ever sends
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FailureEnvelope {
    pub success: bool,
    pub notifications: Vec<Notification>,
}

impl FailureEnvelope {
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self {
            success: false,
            notifications,
        }
    }
}

/// Notifications attached to an error response on its way out.
///
/// Error types put these in the response extensions so the finalizer can
/// merge them with whatever the request collector holds.
#[derive(Debug, Clone)]
pub struct ReportedNotifications(pub Vec<Notification>);

/// Build an envelope response and tag it with the notifications it carries
pub fn failure_response(status: StatusCode, notifications: Vec<Notification>) -> Response {
    let mut response =
        (status, Json(FailureEnvelope::new(notifications.clone()))).into_response();
    response
        .extensions_mut()
        .insert(ReportedNotifications(notifications));
    response
}

/// Outermost application middleware.
///
/// Installs a fresh collector for the request, runs the rest of the stack and,
/// if anything was reported, replaces the body with the failure envelope.
/// Bare error statuses produced outside any handler (unmatched routes, wrong
/// methods) get a generic notification. Successful responses with no
/// notifications pass through untouched.
pub async fn finalize_response(mut request: Request<Body>, next: Next) -> Response {
    let collector = NotificationCollector::new();
    request.extensions_mut().insert(collector.clone());

    let response = next.run(request).await;

    let mut notifications = collector.take();
    let (mut parts, body) = response.into_parts();
    if let Some(ReportedNotifications(reported)) = parts.extensions.remove::<ReportedNotifications>()
    {
        notifications.extend(reported);
    }

    let failed = parts.status.is_client_error() || parts.status.is_server_error();
    if notifications.is_empty() {
        if !failed {
            return Response::from_parts(parts, body);
        }
        notifications.push(generic_notification(parts.status));
    }

    let status = if failed {
        parts.status
    } else {
        StatusCode::BAD_REQUEST
    };
    debug!(
        "Finalizing failed response: status={}, notifications={}",
        status,
        notifications.len()
    );

    failure_response(status, notifications)
}

fn generic_notification(status: StatusCode) -> Notification {
    if status.is_server_error() {
        Notification::new(SERVER_PATH, INTERNAL_ERROR)
    } else {
        Notification::new(REQUEST_PATH, status.canonical_reason().unwrap_or("Request failed"))
    }
}

/// Panic handler for `CatchPanicLayer`; detail stays in the logs
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Handler panicked: {}", detail);

    failure_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        vec![Notification::new(SERVER_PATH, INTERNAL_ERROR)],
    )
}
