//! Tests for reply-driven connection promotion.

use chrono::{TimeZone, Utc};
use engagement_notify::application::promoter::{
    PromoteError, PromotionOutcome, ReplyConnectionPromoter,
};
use engagement_notify::infrastructure::memory_store::InMemoryDocumentStore;
use engagement_notify::infrastructure::mocks::MockClock;
use engagement_notify::{
    ChatMessageEvent, Clock, Collection, Connection, ConnectionRequest, DocKey, DocumentStore,
    RequestStatus,
};
use std::sync::Arc;

fn clock() -> MockClock {
    MockClock::new(Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap())
}

fn promoter(store: Arc<InMemoryDocumentStore>, clock: MockClock) -> ReplyConnectionPromoter {
    ReplyConnectionPromoter::new(store, Arc::new(clock))
}

async fn seed_request(store: &InMemoryDocumentStore, from: &str, to: &str) {
    let request = ConnectionRequest::new(from, to, Utc::now());
    store
        .put(
            DocKey::new(
                Collection::ConnectionRequests,
                ConnectionRequest::doc_id(from, to),
            ),
            serde_json::to_value(&request).unwrap(),
        )
        .await
        .unwrap();
}

async fn read_request(store: &InMemoryDocumentStore, from: &str, to: &str) -> ConnectionRequest {
    let doc = store
        .get(&DocKey::new(
            Collection::ConnectionRequests,
            ConnectionRequest::doc_id(from, to),
        ))
        .await
        .unwrap()
        .unwrap();
    serde_json::from_value(doc).unwrap()
}

fn first_message(sender: &str, receiver: &str) -> ChatMessageEvent {
    ChatMessageEvent {
        thread_id: "thread-1".into(),
        message_id: "msg-1".into(),
        sender_id: sender.into(),
        receiver_id: receiver.into(),
        is_first_in_thread: true,
    }
}

#[tokio::test]
async fn test_first_reply_promotes_pending_request() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let clock = clock();
    seed_request(&store, "alice", "bob").await;
    let promoter = promoter(store.clone(), clock.clone());

    // Bob replies to Alice's request.
    let outcome = promoter
        .on_chat_message(&first_message("bob", "alice"))
        .await
        .unwrap();

    let connection_id = match outcome {
        PromotionOutcome::Promoted { connection_id } => connection_id,
        other => panic!("expected promotion, got {other:?}"),
    };

    let request = read_request(&store, "alice", "bob").await;
    assert_eq!(request.status, RequestStatus::Accepted);

    let doc = store
        .get(&DocKey::new(Collection::Connections, connection_id))
        .await
        .unwrap()
        .unwrap();
    let connection: Connection = serde_json::from_value(doc).unwrap();
    assert_eq!(connection.participants, ["alice", "bob"]);
    assert_eq!(connection.connected_at, clock.now());
    assert_eq!(store.len(Collection::Connections).await, 1);
}

#[tokio::test]
async fn test_requester_sending_first_promotes_too() {
    let store = Arc::new(InMemoryDocumentStore::new());
    seed_request(&store, "alice", "bob").await;
    let promoter = promoter(store.clone(), clock());

    // Alice follows up her own request with the first message.
    let outcome = promoter
        .on_chat_message(&first_message("alice", "bob"))
        .await
        .unwrap();

    assert!(matches!(outcome, PromotionOutcome::Promoted { .. }));
    let request = read_request(&store, "alice", "bob").await;
    assert_eq!(request.status, RequestStatus::Accepted);
}

#[tokio::test]
async fn test_later_messages_have_no_effect() {
    let store = Arc::new(InMemoryDocumentStore::new());
    seed_request(&store, "alice", "bob").await;
    let promoter = promoter(store.clone(), clock());

    let mut event = first_message("bob", "alice");
    event.is_first_in_thread = false;

    let outcome = promoter.on_chat_message(&event).await.unwrap();

    assert_eq!(outcome, PromotionOutcome::NotFirstMessage);
    let request = read_request(&store, "alice", "bob").await;
    assert!(request.is_pending());
    assert_eq!(store.len(Collection::Connections).await, 0);
}

#[tokio::test]
async fn test_first_message_without_request_does_nothing() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let promoter = promoter(store.clone(), clock());

    let outcome = promoter
        .on_chat_message(&first_message("bob", "alice"))
        .await
        .unwrap();

    assert_eq!(outcome, PromotionOutcome::NoPendingRequest);
    assert_eq!(store.len(Collection::Connections).await, 0);
}

#[tokio::test]
async fn test_redelivery_after_promotion_is_harmless() {
    let store = Arc::new(InMemoryDocumentStore::new());
    seed_request(&store, "alice", "bob").await;
    let promoter = promoter(store.clone(), clock());

    let event = first_message("bob", "alice");
    let first = promoter.on_chat_message(&event).await.unwrap();
    assert!(matches!(first, PromotionOutcome::Promoted { .. }));

    // The trigger fires again for the same message. The request is already
    // accepted, so no second connection appears.
    let second = promoter.on_chat_message(&event).await.unwrap();
    assert_eq!(second, PromotionOutcome::NoPendingRequest);
    assert_eq!(store.len(Collection::Connections).await, 1);
}

#[tokio::test]
async fn test_self_addressed_message_rejected() {
    let store = Arc::new(InMemoryDocumentStore::new());
    let promoter = promoter(store, clock());

    let err = promoter
        .on_chat_message(&first_message("alice", "alice"))
        .await
        .unwrap_err();

    assert!(matches!(err, PromoteError::InvalidEvent(_)));
}
