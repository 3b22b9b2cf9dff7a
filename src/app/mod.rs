use axum::extract::{FromRequest, Request};
use axum::http::Method;

use crate::prelude::*;

pub mod event;
mod promo;
mod support;

/// Largest request body the HTTP adapter will read.
const BODY_LIMIT: usize = 64 * 1024;

pub struct AppState {
    pub config: Config,
    pub connector: Arc<dyn Connector>,
}

/// Serve both endpoints over HTTP, standing in for the function trigger.
pub fn build(config: Config, connector: Arc<dyn Connector>) -> axum::Router<()> {
    let state = Arc::new(AppState { config, connector });

    let r = AxumRouter::new();
    let r = promo::add_routes(r);
    let r = support::add_routes(r);

    let r = crate::utils::tracing::add_middleware(r);
    r.with_state(state)
}

/// The trigger event and context for one HTTP request.
pub struct Invocation(pub ApiEvent, pub Context);

impl<S: Send + Sync> FromRequest<S> for Invocation {
    type Rejection = ApiResponse;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let ctx = Context::from_headers(&parts.headers);

        let query = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
            Ok(Query(query)) => query,
            Err(e) => {
                tracing::debug!("ignoring query string: {e}");
                HashMap::new()
            }
        };

        // Preflights never look at the body, so don't let it reject them
        let body = if parts.method == Method::OPTIONS {
            Default::default()
        } else {
            axum::body::to_bytes(body, BODY_LIMIT).await.map_err(|e| {
                tracing::debug!("rejecting body: {e}");
                ApiResponse::from(AppError::InvalidBody)
            })?
        };

        let event = ApiEvent {
            http_method: parts.method.to_string(),
            query_string_parameters: Some(query).filter(|q| !q.is_empty()),
            body: Some(String::from_utf8_lossy(&body).into_owned()).filter(|b| !b.is_empty()),
        };
        Ok(Invocation(event, ctx))
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request};
    use tower::ServiceExt as _;

    use super::*;
    use crate::db::memory::MemoryConnector;

    async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, HeaderMap, String) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(body.to_vec()).unwrap())
    }

    fn app(db: &MemoryConnector) -> axum::Router {
        let state = db.state();
        build(state.config, state.connector)
    }

    #[tokio::test]
    async fn promo_over_http() {
        let db = MemoryConnector::new().with_promo_code("SAVE10", 10, Some(true));
        let request = Request::get("/promo?code=save10").body(Body::empty()).unwrap();
        let (status, headers, body) = send(app(&db), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        assert!(headers.contains_key("x-request-id"));
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, json!({"valid": true, "code": "SAVE10", "discount_percent": 10}));
    }

    #[tokio::test]
    async fn support_preflight_over_http() {
        let db = MemoryConnector::new();
        let request = Request::options("/support").body(Body::empty()).unwrap();
        let (status, headers, body) = send(app(&db), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.is_empty());
        assert!(headers.get(header::CONTENT_TYPE).is_none());
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "GET, POST, PUT, OPTIONS");
    }

    #[tokio::test]
    async fn preflight_ignores_oversized_body() {
        let db = MemoryConnector::new();
        for uri in ["/support", "/promo"] {
            let request = Request::options(uri).body(Body::from(vec![b'x'; BODY_LIMIT + 6 * 1024])).unwrap();
            let (status, headers, body) = send(app(&db), request).await;

            assert_eq!(status, StatusCode::OK);
            assert!(body.is_empty());
            assert_eq!(headers[header::ACCESS_CONTROL_MAX_AGE], "86400");
        }
        assert_eq!(db.opened(), 0);
    }

    #[tokio::test]
    async fn oversized_body_is_a_400() {
        let db = MemoryConnector::new();
        let request = Request::post("/support").body(Body::from(vec![b'x'; BODY_LIMIT + 1])).unwrap();
        let (status, _, body) = send(app(&db), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, json!({"error": "Invalid request body"}));
    }

    #[tokio::test]
    async fn support_post_over_http() {
        let db = MemoryConnector::new();
        let request = Request::post("/support")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"message": "Hello"}"#))
            .unwrap();
        let (status, _, body) = send(app(&db), request).await;

        assert_eq!(status, StatusCode::CREATED);
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["message"]["status"], "pending");
        assert_eq!(db.support_messages().len(), 1);
    }

    #[tokio::test]
    async fn database_failure_is_a_generic_500() {
        let db = MemoryConnector::new().failing();
        let request = Request::get("/support").body(Body::empty()).unwrap();
        let (status, headers, body) = send(app(&db), request).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json, json!({"error": "Internal server error."}));
        assert_eq!((db.opened(), db.closed()), (1, 1));
    }
}
