use std::collections::HashSet;

use helpdesk_db::{FeedbackEvent, FeedbackRepository, HelpdeskDbPool, TicketRepository};
use sqlx::SqlitePool;

#[tokio::test]
async fn ticket_repository_create_and_list_roundtrip() {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();

    TicketRepository::create(&pool, "Integration question A", Some("a@example.com"))
        .await
        .unwrap();
    TicketRepository::create(&pool, "Integration question B", None)
        .await
        .unwrap();

    let all = TicketRepository::list_all(&pool).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].question, "Integration question A");
    assert_eq!(all[1].contact, None);
}

#[tokio::test]
async fn concurrent_ticket_creation_assigns_distinct_ids() {
    let dir = tempfile::tempdir().unwrap();
    let db = HelpdeskDbPool::open(&dir.path().join("tickets.sqlite3"))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for i in 0..20 {
        let db = db.clone();
        handles.push(tokio::spawn(async move {
            TicketRepository::create(db.pool(), "Same burst question", Some(&format!("{i}@x")))
                .await
                .unwrap()
                .id
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }

    assert_eq!(ids.len(), 20);
    assert_eq!(TicketRepository::count(db.pool()).await.unwrap(), 20);
}

#[tokio::test]
async fn concurrent_duplicate_feedback_creates_one_ticket() {
    let dir = tempfile::tempdir().unwrap();
    let db = HelpdeskDbPool::open(&dir.path().join("feedback.sqlite3"))
        .await
        .unwrap();

    let event = FeedbackEvent {
        message_id: "msg-burst".to_string(),
        helpful: false,
        contact: None,
        original_question: "Why was I charged twice?".to_string(),
    };

    let mut handles = Vec::new();
    for _ in 0..8 {
        let db = db.clone();
        let event = event.clone();
        handles.push(tokio::spawn(async move {
            FeedbackRepository::record(db.pool(), &event).await.unwrap()
        }));
    }

    let mut created = 0;
    for handle in handles {
        if handle.await.unwrap().ticket.is_some() {
            created += 1;
        }
    }

    assert_eq!(created, 1);
    assert_eq!(TicketRepository::count(db.pool()).await.unwrap(), 1);
}

#[tokio::test]
async fn closed_pool_surfaces_an_error() {
    let pool = SqlitePool::connect(":memory:").await.unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    pool.close().await;

    let result = TicketRepository::create(&pool, "Anyone there?", None).await;
    assert!(matches!(result, Err(helpdesk_db::DbError::Sql(_))));
}
