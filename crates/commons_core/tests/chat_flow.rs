//! End-to-end conversation flow tests against an in-memory database

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde::Deserialize;
use surrealdb::engine::any::Any;
use surrealdb::{RecordId, Surreal};

use commons_core::chat::{
    ensure_participant, list_conversations, load_history, resolve_other_party, send_message,
    start_or_find_conversation,
};
use commons_core::db::DbParticipant;
use commons_core::db::client::create_test_db;
use commons_core::id::{ConversationId, MessageId, UserId};
use commons_core::profile::{Profile, create_profile};
use commons_core::CoreError;

async fn seeded_pair(db: &Surreal<Any>) -> (Profile, Profile) {
    let a = create_profile(db, "Ana Reyes", "ana@campus.edu").await.unwrap();
    let b = create_profile(db, "Ben Moyo", "ben@campus.edu").await.unwrap();
    (a, b)
}

async fn count(db: &Surreal<Any>, table: &str) -> usize {
    #[derive(Deserialize)]
    struct Count {
        count: usize,
    }

    let mut response = db
        .query(format!("SELECT count() FROM {} GROUP ALL", table))
        .await
        .unwrap();
    let rows: Vec<Count> = response.take(0).unwrap();
    rows.first().map(|c| c.count).unwrap_or(0)
}

async fn insert_message_at(
    db: &Surreal<Any>,
    conversation: ConversationId,
    sender: UserId,
    body: &str,
    at: DateTime<Utc>,
) {
    db.query(
        "CREATE type::thing('messages', $id) SET conversation_id = $conversation, \
         sender_id = $sender, body = $body, created_at = $created",
    )
    .bind(("id", MessageId::generate().to_record_key()))
    .bind(("conversation", RecordId::from(conversation)))
    .bind(("sender", RecordId::from(sender)))
    .bind(("body", body.to_string()))
    .bind(("created", surrealdb::Datetime::from(at)))
    .await
    .unwrap()
    .check()
    .unwrap();
}

#[tokio::test]
async fn start_then_message_reaches_the_other_side() {
    let db = create_test_db().await.unwrap();
    let (a, b) = seeded_pair(&db).await;

    let conversation = start_or_find_conversation(&db, a.id, "ben@campus.edu")
        .await
        .unwrap();

    let sent = send_message(&db, conversation, a.id, "hello").await.unwrap();
    assert_eq!(sent.sender_id, a.id);

    let summaries = list_conversations(&db, b.id).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, conversation);
    assert_eq!(summaries[0].title, "Ana Reyes");
    assert_eq!(summaries[0].last_message.as_deref(), Some("hello"));
    assert!(summaries[0].last_at.is_some());
}

#[tokio::test]
async fn repeated_start_reuses_the_conversation() {
    let db = create_test_db().await.unwrap();
    let (a, _b) = seeded_pair(&db).await;

    let first = start_or_find_conversation(&db, a.id, "ben@campus.edu")
        .await
        .unwrap();
    // Different casing and stray whitespace still resolve to the same thread
    let second = start_or_find_conversation(&db, a.id, "  BEN@Campus.EDU ")
        .await
        .unwrap();

    assert_eq!(first, second);
    assert_eq!(count(&db, "conversations").await, 1);
    assert_eq!(count(&db, "participants").await, 2);
}

#[tokio::test]
async fn start_from_either_side_shares_one_thread() {
    let db = create_test_db().await.unwrap();
    let (a, b) = seeded_pair(&db).await;

    let from_a = start_or_find_conversation(&db, a.id, "ben@campus.edu")
        .await
        .unwrap();
    let from_b = start_or_find_conversation(&db, b.id, "ana@campus.edu")
        .await
        .unwrap();

    assert_eq!(from_a, from_b);
    assert_eq!(count(&db, "conversations").await, 1);
    assert_eq!(count(&db, "participants").await, 2);
}

#[tokio::test]
async fn self_target_is_rejected_without_side_effects() {
    let db = create_test_db().await.unwrap();
    let (a, _b) = seeded_pair(&db).await;

    let err = start_or_find_conversation(&db, a.id, "ana@campus.edu")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::SelfConversation));

    assert_eq!(count(&db, "conversations").await, 0);
    assert_eq!(count(&db, "participants").await, 0);
}

#[tokio::test]
async fn empty_and_unknown_addresses_are_rejected() {
    let db = create_test_db().await.unwrap();
    let (a, _b) = seeded_pair(&db).await;

    let err = start_or_find_conversation(&db, a.id, "   ").await.unwrap_err();
    assert!(matches!(err, CoreError::EmptyContactAddress));

    let err = start_or_find_conversation(&db, a.id, "ghost@campus.edu")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ContactNotFound { .. }));

    assert_eq!(count(&db, "conversations").await, 0);
}

#[tokio::test]
async fn history_is_ascending_regardless_of_insert_order() {
    let db = create_test_db().await.unwrap();
    let (a, _b) = seeded_pair(&db).await;

    let conversation = start_or_find_conversation(&db, a.id, "ben@campus.edu")
        .await
        .unwrap();

    let t1 = Utc.timestamp_opt(1_700_000_100, 0).unwrap();
    let t2 = Utc.timestamp_opt(1_700_000_200, 0).unwrap();
    let t3 = Utc.timestamp_opt(1_700_000_300, 0).unwrap();

    // Physical insert order deliberately scrambled
    insert_message_at(&db, conversation, a.id, "third", t3).await;
    insert_message_at(&db, conversation, a.id, "first", t1).await;
    insert_message_at(&db, conversation, a.id, "second", t2).await;

    let history = load_history(&db, conversation, a.id).await.unwrap();
    let bodies: Vec<&str> = history.iter().map(|m| m.body.as_str()).collect();
    assert_eq!(bodies, vec!["first", "second", "third"]);
    assert_eq!(
        history.iter().map(|m| m.created_at).collect::<Vec<_>>(),
        vec![t1, t2, t3]
    );
}

#[tokio::test]
async fn load_history_self_heals_a_missing_participation() {
    let db = create_test_db().await.unwrap();
    let (a, b) = seeded_pair(&db).await;

    // A conversation B was never recorded in: only A has a row
    let conversation = ConversationId::generate();
    db.query(
        "CREATE type::thing('conversations', $id) SET started_by = $starter, \
         created_at = time::now(), updated_at = time::now()",
    )
    .bind(("id", conversation.to_record_key()))
    .bind(("starter", RecordId::from(a.id)))
    .await
    .unwrap()
    .check()
    .unwrap();
    ensure_participant(&db, conversation, a.id).await.unwrap();
    send_message(&db, conversation, a.id, "anyone there?").await.unwrap();
    assert_eq!(count(&db, "participants").await, 1);

    // B can read immediately and is granted a participation row
    let history = load_history(&db, conversation, b.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].body, "anyone there?");
    assert_eq!(count(&db, "participants").await, 2);

    // The healed row makes the conversation show up in B's directory
    let summaries = list_conversations(&db, b.id).await.unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].id, conversation);
}

#[tokio::test]
async fn ensure_participant_is_idempotent() {
    let db = create_test_db().await.unwrap();
    let (a, _b) = seeded_pair(&db).await;
    let conversation = start_or_find_conversation(&db, a.id, "ben@campus.edu")
        .await
        .unwrap();
    assert_eq!(count(&db, "participants").await, 2);

    for _ in 0..3 {
        ensure_participant(&db, conversation, a.id).await.unwrap();
    }
    assert_eq!(count(&db, "participants").await, 2);

    let rows: Vec<DbParticipant> = db.select("participants").await.unwrap();
    assert_eq!(rows.len(), 2);
    assert!(
        rows.iter()
            .all(|row| row.conversation_id == RecordId::from(conversation))
    );
}

#[tokio::test]
async fn directory_is_empty_without_participations() {
    let db = create_test_db().await.unwrap();
    let (a, _b) = seeded_pair(&db).await;

    // Somebody else's conversation exists, but the lonely profile has no
    // participation rows at all
    start_or_find_conversation(&db, a.id, "ben@campus.edu")
        .await
        .unwrap();

    let lonely = create_profile(&db, "Caro Duran", "caro@campus.edu")
        .await
        .unwrap();
    let summaries = list_conversations(&db, lonely.id).await.unwrap();
    assert!(summaries.is_empty());
}

#[tokio::test]
async fn directory_only_lists_own_conversations() {
    let db = create_test_db().await.unwrap();
    let (a, b) = seeded_pair(&db).await;
    let outsider = create_profile(&db, "Caro Duran", "caro@campus.edu")
        .await
        .unwrap();

    let conversation = start_or_find_conversation(&db, a.id, "ben@campus.edu")
        .await
        .unwrap();
    send_message(&db, conversation, b.id, "hi ana").await.unwrap();

    assert!(list_conversations(&db, outsider.id).await.unwrap().is_empty());
    assert_eq!(list_conversations(&db, a.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn other_party_resolution_handles_degenerate_conversations() {
    let db = create_test_db().await.unwrap();
    let (a, b) = seeded_pair(&db).await;

    // Transient state: the starter has inserted only one side so far
    let conversation = ConversationId::generate();
    db.query(
        "CREATE type::thing('conversations', $id) SET started_by = $starter, \
         created_at = time::now(), updated_at = time::now()",
    )
    .bind(("id", conversation.to_record_key()))
    .bind(("starter", RecordId::from(a.id)))
    .await
    .unwrap()
    .check()
    .unwrap();
    ensure_participant(&db, conversation, a.id).await.unwrap();

    let title = resolve_other_party(&db, conversation, a.id).await.unwrap();
    assert_eq!(title, "Conversation");

    // Once the counterpart lands, the title resolves to their name
    ensure_participant(&db, conversation, b.id).await.unwrap();
    let title = resolve_other_party(&db, conversation, a.id).await.unwrap();
    assert_eq!(title, "Ben Moyo");
}
