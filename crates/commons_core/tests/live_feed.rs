//! Live subscription behavior against an in-memory database

use std::time::Duration;

use pretty_assertions::assert_eq;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tokio::time::timeout;

use commons_core::chat::{ChatView, FeedState, send_message, start_or_find_conversation, subscribe};
use commons_core::db::client::create_test_db;
use commons_core::id::{ConversationId, UserId};
use commons_core::profile::create_profile;

const DELIVERY_WAIT: Duration = Duration::from_secs(5);

async fn seeded_conversation(db: &Surreal<Any>) -> (UserId, UserId, ConversationId) {
    let a = create_profile(db, "Ana Reyes", "ana@campus.edu").await.unwrap();
    let b = create_profile(db, "Ben Moyo", "ben@campus.edu").await.unwrap();
    let conversation = start_or_find_conversation(db, a.id, "ben@campus.edu")
        .await
        .unwrap();
    (a.id, b.id, conversation)
}

#[tokio::test]
async fn live_insert_is_delivered_once() {
    let db = create_test_db().await.unwrap();
    let (a, _b, conversation) = seeded_conversation(&db).await;

    let mut live = subscribe(&db, conversation).await.unwrap();
    assert_eq!(live.conversation_id(), conversation);

    let sent = send_message(&db, conversation, a, "ping").await.unwrap();

    let delivered = timeout(DELIVERY_WAIT, live.recv())
        .await
        .expect("live delivery timed out")
        .expect("live channel closed unexpectedly");
    assert_eq!(delivered.id, sent.id);
    assert_eq!(delivered.body, "ping");
    assert_eq!(delivered.sender_id, a);

    // Exactly one delivery per insert
    assert!(live.try_recv().is_none());
    live.release();
}

#[tokio::test]
async fn live_channel_only_carries_its_own_conversation() {
    let db = create_test_db().await.unwrap();
    let (a, b, conversation) = seeded_conversation(&db).await;

    // A second thread between B and a third profile
    create_profile(&db, "Caro Duran", "caro@campus.edu").await.unwrap();
    let other_conversation = start_or_find_conversation(&db, b, "caro@campus.edu")
        .await
        .unwrap();

    let mut live = subscribe(&db, conversation).await.unwrap();

    send_message(&db, other_conversation, b, "elsewhere").await.unwrap();
    let sent = send_message(&db, conversation, a, "here").await.unwrap();

    let delivered = timeout(DELIVERY_WAIT, live.recv())
        .await
        .expect("live delivery timed out")
        .expect("live channel closed unexpectedly");
    assert_eq!(delivered.id, sent.id);
    assert_eq!(delivered.body, "here");
    assert!(live.try_recv().is_none());
}

#[tokio::test]
async fn view_open_loads_history_and_follows_live_inserts() {
    let db = create_test_db().await.unwrap();
    let (a, b, conversation) = seeded_conversation(&db).await;

    send_message(&db, conversation, a, "before open").await.unwrap();

    let mut view = ChatView::new(b);
    view.open(&db, conversation).await.unwrap();

    let feed = view.feed().expect("view should hold a feed");
    assert_eq!(feed.state(), FeedState::Loaded);
    assert_eq!(feed.messages().len(), 1);
    assert_eq!(feed.messages()[0].body, "before open");
    assert!(view.has_live());
    assert!(view.take_scroll_request());

    let sent = send_message(&db, conversation, a, "after open").await.unwrap();
    let delivered = timeout(DELIVERY_WAIT, view.recv_live())
        .await
        .expect("live delivery timed out")
        .expect("live channel closed unexpectedly");
    assert!(view.apply_live(delivered));
    assert!(view.take_scroll_request());

    let feed = view.feed().unwrap();
    assert_eq!(feed.messages().len(), 2);
    assert_eq!(feed.messages()[1].id, sent.id);

    view.close();
}

#[tokio::test]
async fn senders_own_echo_is_not_rendered_twice() {
    let db = create_test_db().await.unwrap();
    let (a, _b, conversation) = seeded_conversation(&db).await;

    let mut view = ChatView::new(a);
    view.open(&db, conversation).await.unwrap();

    // Local echo first, live delivery of the same row afterwards
    let sent = send_message(&db, conversation, a, "hello").await.unwrap();
    assert!(view.apply_live(sent.clone()));

    let delivered = timeout(DELIVERY_WAIT, view.recv_live())
        .await
        .expect("live delivery timed out")
        .expect("live channel closed unexpectedly");
    assert_eq!(delivered.id, sent.id);
    assert!(!view.apply_live(delivered));

    let matching = view
        .feed()
        .unwrap()
        .messages()
        .iter()
        .filter(|m| m.id == sent.id)
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn closed_view_receives_nothing() {
    let db = create_test_db().await.unwrap();
    let (a, b, conversation) = seeded_conversation(&db).await;

    let mut view = ChatView::new(b);
    view.open(&db, conversation).await.unwrap();
    assert!(view.has_live());

    view.close();
    assert!(!view.has_live());
    assert!(view.feed().is_none());

    send_message(&db, conversation, a, "into the void").await.unwrap();

    // With the subscription released, recv_live pends forever
    let outcome = timeout(Duration::from_millis(300), view.recv_live()).await;
    assert!(outcome.is_err(), "released view must not receive messages");
}

#[tokio::test]
async fn switching_conversations_swaps_the_subscription() {
    let db = create_test_db().await.unwrap();
    let (a, b, first) = seeded_conversation(&db).await;

    create_profile(&db, "Caro Duran", "caro@campus.edu").await.unwrap();
    let second = start_or_find_conversation(&db, b, "caro@campus.edu")
        .await
        .unwrap();

    let mut view = ChatView::new(b);
    view.open(&db, first).await.unwrap();
    view.open(&db, second).await.unwrap();
    assert_eq!(view.current(), Some(second));

    // Traffic on the first conversation no longer reaches the view
    send_message(&db, first, a, "old thread").await.unwrap();
    let sent = send_message(&db, second, b, "new thread").await.unwrap();

    let delivered = timeout(DELIVERY_WAIT, view.recv_live())
        .await
        .expect("live delivery timed out")
        .expect("live channel closed unexpectedly");
    assert_eq!(delivered.id, sent.id);
    assert_eq!(delivered.conversation_id, second);
}
