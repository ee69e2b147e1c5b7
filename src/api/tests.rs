use super::*;
use crate::client::{
    ChatRecord, ContactId, ContactRecord, LastMessage, MemoryClientFactory, MemorySeed, Operation,
};
use crate::error::ClientError;
use crate::events::DisconnectReason;
use crate::types::Jid;
use axum::body::Body;
use axum::http::Request;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

fn contact(serialized: &str, number: Option<&str>) -> ContactRecord {
    ContactRecord {
        id: ContactId::parse(serialized),
        number: number.map(str::to_string),
        is_user: true,
        ..ContactRecord::default()
    }
}

fn seed() -> MemorySeed {
    let lid_only = ContactRecord {
        id: ContactId::serialized("987654321@lid"),
        pushname: Some("Hidden".into()),
        ..ContactRecord::default()
    };
    let group = ContactRecord {
        id: ContactId::parse("120363025555555555@g.us"),
        is_group: true,
        ..ContactRecord::default()
    };
    MemorySeed {
        own_id: Some(Jid::for_phone("10000000000")),
        pushname: Some("Gateway".into()),
        contacts: vec![
            contact("15551234567@c.us", Some("15551234567")),
            lid_only,
            group,
        ],
        chats: vec![
            ChatRecord {
                id: ContactId::parse("15551234567@c.us"),
                name: "Ana".into(),
                unread_count: 2,
                last_message: Some(LastMessage {
                    body: "see you".into(),
                    timestamp: 1_700_000_000,
                }),
                ..ChatRecord::default()
            },
            ChatRecord {
                id: ContactId::serialized("555000111@lid"),
                name: "Lid chat".into(),
                ..ChatRecord::default()
            },
            ChatRecord {
                id: ContactId::parse("120363025555555555@g.us"),
                name: "Team".into(),
                is_group: true,
                ..ChatRecord::default()
            },
        ],
        registered: vec![],
    }
}

fn test_app() -> (Router, SessionRegistry, Arc<MemoryClientFactory>) {
    let factory = Arc::new(MemoryClientFactory::new(seed()));
    let registry = SessionRegistry::new(factory.clone(), "/tmp/wa-api-test");
    let app = build_router(ApiState::new(registry.clone()));
    (app, registry, factory)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::post(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

async fn body_json(resp: axum::http::Response<Body>) -> Value {
    let body = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

async fn started(id: &str) -> (Router, SessionRegistry, Arc<MemoryClientFactory>) {
    let (app, registry, factory) = test_app();
    registry.start(id).await.unwrap();
    (app, registry, factory)
}

#[tokio::test]
async fn root_lists_active_sessions() {
    let (app, _, _) = started("s1").await;
    let resp = app.oneshot(get("/")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "running");
    assert_eq!(json["activeSessions"], serde_json::json!(["s1"]));
}

#[tokio::test]
async fn start_session() {
    let (app, registry, _) = test_app();
    let resp = app
        .oneshot(post_json("/session/start", serde_json::json!({"sessionId": "s1"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Session s1 initialized. Check logs for QR code.");
    assert!(registry.contains("s1").unwrap());
}

#[tokio::test]
async fn start_requires_session_id() {
    let (app, _, _) = test_app();
    for body in [serde_json::json!({}), serde_json::json!({"sessionId": ""})] {
        let resp = app
            .clone()
            .oneshot(post_json("/session/start", body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "sessionId is required");
    }
}

#[tokio::test]
async fn missing_body_reports_missing_fields() {
    let (app, _, _) = test_app();
    let requests = [
        (Request::post("/session/start").body(Body::empty()).unwrap(), "sessionId is required"),
        (
            Request::post("/session/stop")
                .header("Content-Type", "text/plain")
                .body(Body::from("sessionId=s1"))
                .unwrap(),
            "sessionId is required",
        ),
        (
            Request::post("/message/send")
                .header("Content-Type", "application/json")
                .body(Body::empty())
                .unwrap(),
            "sessionId, phone, and message are required",
        ),
    ];
    for (request, error) in requests {
        let resp = app.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], error);
    }
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (app, _, _) = test_app();
    let request = Request::post("/phone/verify")
        .header("Content-Type", "application/json")
        .body(Body::from("{\"sessionId\":"))
        .unwrap();
    let resp = app.oneshot(request).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert!(json["error"]
        .as_str()
        .is_some_and(|e| e.starts_with("Invalid JSON body")));
}

#[tokio::test]
async fn pairing_status_includes_qr() {
    let factory = Arc::new(MemoryClientFactory::new(seed()).with_manual_pairing());
    let registry = SessionRegistry::new(factory, "/tmp/wa-api-test");
    registry.start("s1").await.unwrap();
    let app = build_router(ApiState::new(registry));

    let json = body_json(app.oneshot(get("/session/status/s1")).await.unwrap()).await;
    assert_eq!(json["state"], "pairing");
    assert!(json["qr"].as_str().is_some_and(|qr| qr.starts_with("2@")));
    assert!(json["info"].is_null());
}

#[tokio::test]
async fn start_duplicate_is_bad_request() {
    let (app, _, _) = started("s1").await;
    let resp = app
        .oneshot(post_json("/session/start", serde_json::json!({"sessionId": "s1"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "Session already exists");
}

#[tokio::test]
async fn stop_session() {
    let (app, registry, factory) = started("s1").await;
    let resp = app
        .clone()
        .oneshot(post_json("/session/stop", serde_json::json!({"sessionId": "s1"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["message"], "Session s1 stopped");
    assert!(!registry.contains("s1").unwrap());
    assert!(factory.client("s1").unwrap().is_destroyed());

    let resp = app
        .oneshot(post_json("/session/stop", serde_json::json!({"sessionId": "s1"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "Session not found");
}

#[tokio::test]
async fn stop_failure_is_internal_error_and_keeps_session() {
    let (app, registry, factory) = started("s1").await;
    factory
        .client("s1")
        .unwrap()
        .fail_on(Operation::Destroy, ClientError::Other("Target closed".into()))
        .unwrap();
    let resp = app
        .oneshot(post_json("/session/stop", serde_json::json!({"sessionId": "s1"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "Target closed");
    assert!(registry.contains("s1").unwrap());
}

#[tokio::test]
async fn session_status() {
    let (app, _, _) = started("s1").await;
    let resp = app.clone().oneshot(get("/session/status/s1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["sessionId"], "s1");
    assert_eq!(json["status"], "active");
    assert_eq!(json["state"], "ready");
    assert_eq!(json["info"]["wid"]["_serialized"], "10000000000@c.us");
    assert!(json.get("qr").is_none());

    let resp = app.oneshot(get("/session/status/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_sessions() {
    let (app, registry, _) = started("b").await;
    registry.start("a").await.unwrap();
    let json = body_json(app.oneshot(get("/sessions")).await.unwrap()).await;
    assert_eq!(
        json["sessions"],
        serde_json::json!([
            {"sessionId": "a", "status": "active"},
            {"sessionId": "b", "status": "active"},
        ])
    );
}

#[tokio::test]
async fn send_appends_suffix() {
    let (app, _, factory) = started("s1").await;
    let resp = app
        .clone()
        .oneshot(post_json(
            "/message/send",
            serde_json::json!({"sessionId": "s1", "phone": "15551234567", "message": "hi"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["message"], "Message sent");
    assert!(json["messageId"].as_str().unwrap().starts_with("3EB0"));

    app.oneshot(post_json(
        "/message/send",
        serde_json::json!({"sessionId": "s1", "phone": "15551234567@c.us", "message": "again"}),
    ))
    .await
    .unwrap();

    let sent = factory.client("s1").unwrap().sent_messages().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].to, "15551234567@c.us");
    assert_eq!(sent[0].body, "hi");
    assert_eq!(sent[1].to, "15551234567@c.us");
}

#[tokio::test]
async fn send_validation_and_lookup() {
    let (app, _, _) = started("s1").await;
    let resp = app
        .clone()
        .oneshot(post_json(
            "/message/send",
            serde_json::json!({"sessionId": "s1", "phone": "1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "sessionId, phone, and message are required"
    );

    let resp = app
        .oneshot(post_json(
            "/message/send",
            serde_json::json!({"sessionId": "other", "phone": "1", "message": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn send_failure_passes_message_through() {
    let (app, _, factory) = started("s1").await;
    factory
        .client("s1")
        .unwrap()
        .fail_on(
            Operation::SendMessage,
            ClientError::Other("Evaluation failed: no chat".into()),
        )
        .unwrap();
    let resp = app
        .oneshot(post_json(
            "/message/send",
            serde_json::json!({"sessionId": "s1", "phone": "1", "message": "x"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "Evaluation failed: no chat");
}

#[tokio::test]
async fn contacts_skip_groups_and_count() {
    let (app, _, _) = started("s1").await;
    let resp = app.oneshot(get("/contacts/s1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    let stats = &json["stats"];
    assert_eq!(stats["total"], 2);
    assert_eq!(stats["withPhone"], 1);
    assert_eq!(stats["withoutPhone"], 1);
    assert_eq!(stats["lidContacts"], 1);
    assert_eq!(stats["cusContacts"], 1);

    let contacts = json["contacts"].as_array().unwrap();
    assert_eq!(contacts[0]["phone"], "15551234567");
    assert_eq!(contacts[0]["type"], "c.us");
    assert_eq!(contacts[1]["type"], "lid");
    assert!(contacts[1]["phone"].is_null());
    assert_eq!(contacts[1]["name"], "Hidden");
}

#[tokio::test]
async fn contacts_unknown_session_and_failure() {
    let (app, _, factory) = started("s1").await;
    let resp = app.clone().oneshot(get("/contacts/nope")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    factory
        .client("s1")
        .unwrap()
        .fail_on(Operation::GetContacts, ClientError::Other("boom".into()))
        .unwrap();
    let resp = app.oneshot(get("/contacts/s1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn contact_info_direct() {
    let (app, _, _) = started("s1").await;
    let resp = app
        .oneshot(post_json(
            "/contact/info",
            serde_json::json!({"sessionId": "s1", "contactId": "15551234567@c.us"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["contact"]["phone"], "15551234567");
    assert!(json["contact"].get("note").is_none());
}

#[tokio::test]
async fn contact_info_fallback_without_number() {
    let mut seed = seed();
    seed.chats.push(ChatRecord {
        id: ContactId::serialized("987654321@lid"),
        name: "Hidden".into(),
        ..ChatRecord::default()
    });
    let factory = Arc::new(MemoryClientFactory::new(seed));
    let registry = SessionRegistry::new(factory, "/tmp/wa-api-test");
    registry.start("s1").await.unwrap();
    let app = build_router(ApiState::new(registry));

    let resp = app
        .oneshot(post_json(
            "/contact/info",
            serde_json::json!({"sessionId": "s1", "contactId": "987654321@lid"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert!(json["contact"]["phone"].is_null());
    assert_eq!(json["contact"]["type"], "lid");
    assert_eq!(
        json["contact"]["note"],
        crate::contact::NOTE_PHONE_UNAVAILABLE
    );
}

#[tokio::test]
async fn contact_info_uses_number_found_via_chat() {
    use crate::client::{ClientFactory, MemoryClient, MessagingClient, SessionConfig};

    // Contact lookup hides the number; the chat's contact exposes it.
    struct SplitFactory;
    impl ClientFactory for SplitFactory {
        fn create(&self, config: SessionConfig) -> crate::error::ClientResult<crate::client::Client> {
            let seed = MemorySeed {
                contacts: vec![ContactRecord {
                    id: ContactId::serialized("555000111@lid"),
                    number: Some("15559990000".into()),
                    ..ContactRecord::default()
                }],
                chats: vec![ChatRecord {
                    id: ContactId::serialized("555000111@lid"),
                    name: "Lid chat".into(),
                    ..ChatRecord::default()
                }],
                ..MemorySeed::default()
            };
            Ok(Arc::new(HidingClient(MemoryClient::new(config, seed))))
        }
    }

    struct HidingClient(MemoryClient);

    #[async_trait::async_trait]
    impl MessagingClient for HidingClient {
        async fn subscribe(&self, handler: crate::client::EventHandler) {
            self.0.subscribe(handler).await
        }
        async fn initialize(&self) -> crate::error::ClientResult<()> {
            self.0.initialize().await
        }
        async fn destroy(&self) -> crate::error::ClientResult<()> {
            self.0.destroy().await
        }
        fn info(&self) -> Option<crate::client::ClientInfo> {
            self.0.info()
        }
        async fn send_message(
            &self,
            chat_id: &str,
            body: &str,
        ) -> crate::error::ClientResult<crate::client::SendResponse> {
            self.0.send_message(chat_id, body).await
        }
        async fn get_contacts(&self) -> crate::error::ClientResult<Vec<ContactRecord>> {
            self.0.get_contacts().await
        }
        async fn get_contact_by_id(&self, id: &str) -> crate::error::ClientResult<ContactRecord> {
            let mut contact = self.0.get_contact_by_id(id).await?;
            contact.number = None;
            Ok(contact)
        }
        async fn get_chats(&self) -> crate::error::ClientResult<Vec<ChatRecord>> {
            self.0.get_chats().await
        }
        async fn get_chat_contact(
            &self,
            chat: &ChatRecord,
        ) -> crate::error::ClientResult<ContactRecord> {
            self.0.get_chat_contact(chat).await
        }
        async fn get_number_id(&self, phone: &str) -> crate::error::ClientResult<Option<Jid>> {
            self.0.get_number_id(phone).await
        }
    }

    let registry = SessionRegistry::new(Arc::new(SplitFactory), "/tmp/wa-api-test");
    registry.start("s1").await.unwrap();
    let app = build_router(ApiState::new(registry));

    let resp = app
        .oneshot(post_json(
            "/contact/info",
            serde_json::json!({"sessionId": "s1", "contactId": "555000111@lid"}),
        ))
        .await
        .unwrap();
    let json = body_json(resp).await;
    assert_eq!(json["contact"]["phone"], "15559990000");
    assert_eq!(json["contact"]["note"], crate::contact::NOTE_FROM_CHAT);
    assert_eq!(json["contact"]["type"], "lid");
}

#[tokio::test]
async fn contact_info_swallows_fallback_failure() {
    let (app, _, factory) = started("s1").await;
    factory
        .client("s1")
        .unwrap()
        .fail_on(Operation::GetChats, ClientError::Other("chats unavailable".into()))
        .unwrap();
    let resp = app
        .oneshot(post_json(
            "/contact/info",
            serde_json::json!({"sessionId": "s1", "contactId": "987654321@lid"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["success"], true);
    assert!(json["contact"]["phone"].is_null());
}

#[tokio::test]
async fn contact_info_validation() {
    let (app, _, _) = started("s1").await;
    let resp = app
        .oneshot(post_json(
            "/contact/info",
            serde_json::json!({"sessionId": "s1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(resp).await["error"],
        "sessionId and contactId are required"
    );
}

#[tokio::test]
async fn chats_resolve_contacts() {
    let (app, _, _) = started("s1").await;
    let resp = app.oneshot(get("/chats/s1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["stats"]["total"], 2);
    assert_eq!(json["stats"]["withPhone"], 1);
    assert_eq!(json["stats"]["withoutPhone"], 1);

    let chats = json["chats"].as_array().unwrap();
    assert_eq!(chats[0]["chatId"], "15551234567@c.us");
    assert_eq!(chats[0]["unreadCount"], 2);
    assert_eq!(chats[0]["lastMessage"]["body"], "see you");
    assert_eq!(chats[0]["contact"]["phone"], "15551234567");
    assert!(chats[1]["lastMessage"].is_null());
    assert_eq!(chats[1]["contact"]["type"], "lid");
}

#[tokio::test]
async fn chats_fail_when_a_contact_fails() {
    let (app, _, factory) = started("s1").await;
    factory
        .client("s1")
        .unwrap()
        .fail_on(Operation::GetChatContact, ClientError::Other("detached".into()))
        .unwrap();
    let resp = app.oneshot(get("/chats/s1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(resp).await["error"], "detached");
}

#[tokio::test]
async fn verify_phone_normalizes_digits() {
    let (app, _, _) = started("s1").await;
    let resp = app
        .clone()
        .oneshot(post_json(
            "/phone/verify",
            serde_json::json!({"sessionId": "s1", "phone": "+1 (555) 123-4567"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["exists"], true);
    assert_eq!(json["phone"], "15551234567");
    assert_eq!(json["numberId"], "15551234567@c.us");
    assert_eq!(json["type"], "c.us");

    let json = body_json(
        app.oneshot(post_json(
            "/phone/verify",
            serde_json::json!({"sessionId": "s1", "phone": "+44 20 0000"}),
        ))
        .await
        .unwrap(),
    )
    .await;
    assert_eq!(json["exists"], false);
    assert_eq!(json["phone"], "44200000");
    assert!(json.get("numberId").is_none());
}

#[tokio::test]
async fn verify_phone_errors() {
    let (app, _, factory) = started("s1").await;
    let resp = app
        .clone()
        .oneshot(post_json("/phone/verify", serde_json::json!({"phone": "1"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "sessionId and phone are required");

    factory
        .client("s1")
        .unwrap()
        .fail_on(Operation::GetNumberId, ClientError::Other("rate limited".into()))
        .unwrap();
    let resp = app
        .oneshot(post_json(
            "/phone/verify",
            serde_json::json!({"sessionId": "s1", "phone": "1"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn disconnected_session_disappears_from_routes() {
    let (app, _, factory) = started("s1").await;
    factory
        .client("s1")
        .unwrap()
        .disconnect(DisconnectReason::Logout)
        .await;
    let resp = app.oneshot(get("/session/status/s1")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}
