use crate::assets;
use crate::config::normalize_api_prefix;
use crate::ports::{PushSender, SubscriptionStore, TimeProvider};
use crate::push::NotificationDispatcher;
use crate::state::AppState;

use axum::Router;
use axum::routing::get;
use axum::routing::post;
use std::sync::Arc;

mod push;

/// Notification routes only, relative to wherever the caller mounts them.
pub fn push_routes<S, P, T>(dispatcher: Arc<NotificationDispatcher<S, P, T>>) -> Router
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    Router::new()
        .route("/vapid-public-key", get(push::vapid_public_key::<S, P, T>))
        .route("/subscribe", post(push::subscribe::<S, P, T>))
        .route("/unsubscribe", post(push::unsubscribe::<S, P, T>))
        .route("/send", post(push::send::<S, P, T>))
        .route("/stats", get(push::stats::<S, P, T>))
        .with_state(AppState { dispatcher })
}

pub fn app<S, P, T>(dispatcher: Arc<NotificationDispatcher<S, P, T>>, api_prefix: &str) -> Router
where
    S: SubscriptionStore,
    P: PushSender,
    T: TimeProvider,
{
    let routes = push_routes(dispatcher);
    let prefix = normalize_api_prefix(api_prefix);
    let router = if prefix.is_empty() {
        Router::new().merge(routes)
    } else {
        Router::new().nest(&prefix, routes)
    };
    router
        .route("/sw.js", get(assets::service_worker))
        .route("/health", get(health))
}

pub(crate) async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(non_snake_case)]
pub(crate) mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::push::tests::{TestSender, TestTime, new_subscription, test_dispatcher, test_vapid};
    use crate::types::push::SubscriptionRecord;
    use axum::body::Body;
    use axum::body::to_bytes;
    use axum::http::Request;
    use axum::http::StatusCode;
    use axum::http::header::CONTENT_TYPE;
    use serde_json::Value as JsonValue;
    use serde_json::from_slice as json_from_slice;
    use serde_json::json;
    use tower::ServiceExt;

    const PREFIX: &str = "/api/notifications";

    fn test_app() -> (Router, Arc<crate::push::tests::TestDispatcher>, TestSender) {
        let (dispatcher, sender) = test_dispatcher();
        let dispatcher = Arc::new(dispatcher);
        (app(Arc::clone(&dispatcher), PREFIX), dispatcher, sender)
    }

    fn post_json(uri: &str, body: JsonValue) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> JsonValue {
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        json_from_slice(&body).expect("json body")
    }

    #[derive(Clone)]
    struct UnavailableStore;

    impl SubscriptionStore for UnavailableStore {
        async fn get(&self, _endpoint: &str) -> Result<Option<SubscriptionRecord>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn set(&self, _record: SubscriptionRecord) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn delete(&self, _endpoint: &str) -> Result<bool, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn list(&self) -> Result<Vec<SubscriptionRecord>, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }

        async fn count(&self) -> Result<usize, StoreError> {
            Err(StoreError::Unavailable("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn app__should_return_ok_on_health_endpoint() {
        // Given
        let (app, _dispatcher, _sender) = test_app();

        // When
        let response = app
            .oneshot(get_request("/health"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read body");
        assert_eq!(body.as_ref(), b"ok");
    }

    #[tokio::test]
    async fn app__should_serve_service_worker() {
        // Given
        let (app, _dispatcher, _sender) = test_app();

        // When
        let response = app
            .oneshot(get_request("/sw.js"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).expect("content type"),
            "application/javascript"
        );
    }

    #[tokio::test]
    async fn vapid_public_key__should_return_configured_key() {
        // Given
        let (app, _dispatcher, _sender) = test_app();

        // When
        let response = app
            .oneshot(get_request("/api/notifications/vapid-public-key"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["publicKey"], test_vapid().public_key);
    }

    #[tokio::test]
    async fn subscribe__should_store_subscription_and_return_id() {
        // Given
        let (app, dispatcher, _sender) = test_app();
        let request = post_json(
            "/api/notifications/subscribe",
            json!({
                "subscription": {
                    "endpoint": "https://push.example/a",
                    "keys": { "p256dh": "p256", "auth": "auth" }
                },
                "userAgent": "Firefox",
                "timestamp": 1736674200000i64
            }),
        );

        // When
        let response = app.oneshot(request).await.expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["subscriptionId"], "YW1wbGUvYQ==");
        assert_eq!(dispatcher.get_subscription_count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn subscribe__should_reject_missing_endpoint() {
        // Given
        let (app, dispatcher, _sender) = test_app();

        // When
        let response = app
            .oneshot(post_json(
                "/api/notifications/subscribe",
                json!({ "subscription": { "keys": {} } }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Invalid subscription");
        assert_eq!(dispatcher.get_subscription_count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn subscribe__should_reject_malformed_json() {
        // Given
        let (app, _dispatcher, _sender) = test_app();
        let request = Request::builder()
            .method("POST")
            .uri("/api/notifications/subscribe")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        // When
        let response = app.oneshot(request).await.expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unsubscribe__should_succeed_twice() {
        // Given
        let (app, dispatcher, _sender) = test_app();
        dispatcher
            .subscribe(new_subscription("https://push.example/a"))
            .await
            .expect("subscribe");
        let body = json!({ "subscription": { "endpoint": "https://push.example/a" } });

        // When
        let first = app
            .clone()
            .oneshot(post_json("/api/notifications/unsubscribe", body.clone()))
            .await
            .expect("request failed");
        let second = app
            .oneshot(post_json("/api/notifications/unsubscribe", body))
            .await
            .expect("request failed");

        // Then
        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::OK);
        assert_eq!(json_body(second).await["success"], true);
        assert_eq!(dispatcher.get_subscription_count().await.expect("count"), 0);
    }

    #[tokio::test]
    async fn send__should_report_per_target_results() {
        // Given
        let (app, dispatcher, _sender) = test_app();
        dispatcher
            .subscribe(new_subscription("https://push.example/a"))
            .await
            .expect("subscribe");

        // When
        let response = app
            .oneshot(post_json(
                "/api/notifications/send",
                json!({ "title": "T", "body": "B" }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body,
            json!({
                "success": true,
                "results": [{ "endpoint": "https://push.example/a", "success": true }],
                "sent": 1,
                "failed": 0
            })
        );
    }

    #[tokio::test]
    async fn send__should_reject_empty_title_with_400() {
        // Given
        let (app, dispatcher, sender) = test_app();
        dispatcher
            .subscribe(new_subscription("https://push.example/a"))
            .await
            .expect("subscribe");

        // When
        let response = app
            .oneshot(post_json(
                "/api/notifications/send",
                json!({ "title": "", "body": "x" }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["error"],
            "Title and body are required"
        );
        assert!(sender.sent().is_empty());
        assert_eq!(dispatcher.get_subscription_count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn send__should_stay_successful_when_one_target_is_gone() {
        // Given
        let (app, dispatcher, sender) = test_app();
        for endpoint in ["https://push.example/a", "https://push.example/b"] {
            dispatcher
                .subscribe(new_subscription(endpoint))
                .await
                .expect("subscribe");
        }
        sender.fail("https://push.example/a", Some(410), "gone");

        // When
        let response = app
            .oneshot(post_json(
                "/api/notifications/send",
                json!({ "title": "T", "body": "B" }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["sent"], 1);
        assert_eq!(body["failed"], 1);
        assert_eq!(dispatcher.get_subscription_count().await.expect("count"), 1);
    }

    #[tokio::test]
    async fn stats__should_list_subscriptions() {
        // Given
        let (app, dispatcher, _sender) = test_app();
        dispatcher
            .subscribe(new_subscription("https://push.example/a"))
            .await
            .expect("subscribe");

        // When
        let response = app
            .oneshot(get_request("/api/notifications/stats"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["subscriptionCount"], 1);
        let record = &body["subscriptions"][0];
        assert_eq!(record["subscription"]["endpoint"], "https://push.example/a");
        assert_eq!(record["userAgent"], "test-agent");
        assert_eq!(record["subscriptionId"], "YW1wbGUvYQ==");
        assert_eq!(record["createdAt"], "2025-01-12T09:30:00Z");
    }

    #[tokio::test]
    async fn app__should_mount_routes_at_root_for_empty_prefix() {
        // Given
        let (dispatcher, _sender) = test_dispatcher();
        let app = app(Arc::new(dispatcher), "/");

        // When
        let response = app
            .oneshot(get_request("/stats"))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn subscribe__should_map_store_failure_to_500() {
        // Given
        let dispatcher = NotificationDispatcher::with_parts(
            test_vapid(),
            UnavailableStore,
            TestSender::default(),
            TestTime::fixed(),
        );
        let app = app(Arc::new(dispatcher), PREFIX);

        // When
        let response = app
            .oneshot(post_json(
                "/api/notifications/subscribe",
                json!({ "subscription": { "endpoint": "https://push.example/a" } }),
            ))
            .await
            .expect("request failed");

        // Then
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"], "Subscription failed");
    }
}
