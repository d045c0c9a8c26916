//! REST surface tests
//!
//! Drives the assembled router with `tower::ServiceExt::oneshot`; no socket
//! is bound.

#[cfg(feature = "ssr")]
#[macro_use]
mod common;

#[cfg(feature = "ssr")]
mod tests {
    use super::common::{bearer, TestServer};
    use axum::body::Body;
    use axum::http::{header, Method, Request, StatusCode};
    use axum::Router;
    use chatbox::shared::EventType;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, bearer(user));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let server = TestServer::new();

        let (status, body) = call(
            server.router(),
            request(Method::GET, "/api/notifications", None, None),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_ws_upgrade_requires_token() {
        let server = TestServer::new();

        let (status, _) = call(server.router(), request(Method::GET, "/ws", None, None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_send_edit_delete_flow() {
        let server = TestServer::new();
        let mut watcher = server.connect("carol").await;
        server.join(&watcher, 7).await;
        watcher.drain();

        let (status, sent) = call(
            server.router(),
            request(
                Method::POST,
                "/api/rooms/7/messages",
                Some("bob"),
                Some(json!({ "text": "hello" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent["senderUsername"], "bob");
        assert_eq!(sent["status"], "Sent");
        let id = sent["id"].as_i64().unwrap();
        assert_events!(watcher, [EventType::ReceiveMessage]);

        let (status, body) = call(
            server.router(),
            request(
                Method::PUT,
                &format!("/api/messages/{id}"),
                Some("mallory"),
                Some(json!({ "text": "mine now" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], 403);
        assert_events!(watcher, []);

        let (status, edited) = call(
            server.router(),
            request(
                Method::PUT,
                &format!("/api/messages/{id}"),
                Some("bob"),
                Some(json!({ "text": "hello, world", "reason": "typo" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(edited["text"], "hello, world");
        assert!(edited["editedAt"].is_string());
        assert_events!(watcher, [EventType::MessageEdited]);

        let (status, history) = call(
            server.router(),
            request(Method::GET, &format!("/api/messages/{id}/history"), Some("carol"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(history.as_array().map(Vec::len), Some(1));

        let (status, deleted) = call(
            server.router(),
            request(Method::DELETE, &format!("/api/messages/{id}"), Some("bob"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(deleted["isDeleted"], true);
        assert_eq!(deleted["deleteReason"], "No reason provided");
        assert_events!(watcher, [EventType::MessageDeleted]);

        // A deleted message can no longer be edited
        let (status, _) = call(
            server.router(),
            request(
                Method::PUT,
                &format!("/api/messages/{id}"),
                Some("bob"),
                Some(json!({ "text": "again" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_reaction_with_both_parents_is_bad_request() {
        let server = TestServer::new();

        let (status, body) = call(
            server.router(),
            request(
                Method::POST,
                "/api/reactions",
                Some("bob"),
                Some(json!({ "reaction": "👍", "messageId": 1, "privateMessageId": 2 })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
    }

    #[tokio::test]
    async fn test_delivered_ack_reports_moved_ids() {
        let server = TestServer::new();
        let message = server
            .state
            .lifecycle
            .send_room_message(7, "alice", "hi")
            .await
            .unwrap();

        let body = json!({ "messageIds": [message.id, 404] });
        let (status, moved) = call(
            server.router(),
            request(Method::POST, "/api/messages/delivered", Some("bob"), Some(body.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(moved, json!({ "messageIds": [message.id] }));

        // Already delivered
        let (_, moved) = call(
            server.router(),
            request(Method::POST, "/api/messages/delivered", Some("bob"), Some(body)),
        )
        .await;
        assert_eq!(moved, json!({ "messageIds": [] }));
    }

    #[tokio::test]
    async fn test_notifications_read_flow() {
        let server = TestServer::new();
        server
            .state
            .lifecycle
            .send_private_message("alice", "bob", "ping")
            .await
            .unwrap();

        let (status, list) = call(
            server.router(),
            request(Method::GET, "/api/notifications", Some("bob"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let id = list[0]["id"].as_i64().unwrap();
        assert_eq!(list[0]["isRead"], false);

        // Someone else's notification
        let (status, _) = call(
            server.router(),
            request(Method::POST, &format!("/api/notifications/{id}/read"), Some("alice"), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, read) = call(
            server.router(),
            request(Method::POST, &format!("/api/notifications/{id}/read"), Some("bob"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(read["isRead"], true);

        let (status, body) = call(
            server.router(),
            request(Method::POST, "/api/notifications/read-all", Some("bob"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["updated"], 0);
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let server = TestServer::new();

        let (status, _) = call(
            server.router(),
            request(Method::GET, "/api/nowhere", Some("bob"), None),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
