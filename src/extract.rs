// JSON body extractor that reports parse failures through the failure envelope

use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};

use crate::error::ApiError;

/// `Json<T>` whose rejection is an `ApiError::MalformedBody`
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(ApiError::MalformedBody(rejection.body_text())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::finalize_response;
    use axum::{http::StatusCode, middleware::from_fn, routing::post, Router};
    use axum_test::TestServer;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Deserialize)]
    struct Payload {
        name: String,
    }

    async fn echo(ApiJson(payload): ApiJson<Payload>) -> String {
        payload.name
    }

    fn server() -> TestServer {
        let app = Router::new()
            .route("/echo", post(echo))
            .layer(from_fn(finalize_response));
        TestServer::new(app).unwrap()
    }

    #[tokio::test]
    async fn test_valid_body_passes_through() {
        let response = server()
            .post("/echo")
            .json(&serde_json::json!({ "name": "Jane" }))
            .await;

        response.assert_status_ok();
        assert_eq!(response.text(), "Jane");
    }

    #[tokio::test]
    async fn test_malformed_body_is_enveloped() {
        let response = server()
            .post("/echo")
            .content_type("application/json")
            .text("{ not json")
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["success"], false);
        assert_eq!(body["notifications"][0]["path"], "request");
    }

    #[tokio::test]
    async fn test_missing_field_is_enveloped() {
        let response = server()
            .post("/echo")
            .json(&serde_json::json!({ "other": 1 }))
            .await;

        assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["notifications"][0]["path"], "request");
    }
}
