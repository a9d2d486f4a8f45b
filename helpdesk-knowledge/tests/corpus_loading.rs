use std::sync::Arc;

use helpdesk_knowledge::{IndexOptions, KnowledgeError, KnowledgeIndex};

const PLAIN_CORPUS: &str = "\
Password Reset
To reset your password, click the Forgot Password link on the login page.

Billing Questions
Refunds take 5-7 business days after approval.
Invoices are emailed on the first of each month.

Account Creation
Click Sign Up and verify your email address.
";

#[tokio::test]
async fn test_load_plain_text_corpus() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("knowledge_base.txt");
    tokio::fs::write(&path, PLAIN_CORPUS).await.unwrap();

    let index = KnowledgeIndex::load(&path, IndexOptions::default())
        .await
        .unwrap();

    assert_eq!(index.len(), 3);
    let titles: Vec<_> = index.sections().iter().map(|s| s.title()).collect();
    assert_eq!(
        titles,
        vec!["Password Reset", "Billing Questions", "Account Creation"]
    );

    let hits = index.search("How long do refunds take?");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].section.title(), "Billing Questions");
}

#[tokio::test]
async fn test_missing_corpus_is_reported() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.txt");

    let result = KnowledgeIndex::load(&path, IndexOptions::default()).await;
    match result {
        Err(KnowledgeError::CorpusNotFound(missing)) => assert_eq!(missing, path),
        other => panic!("expected CorpusNotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_concurrent_searches_share_index() {
    let index = Arc::new(KnowledgeIndex::from_text(
        PLAIN_CORPUS,
        IndexOptions::default(),
    ));

    let mut handles = Vec::new();
    for _ in 0..16 {
        let index = Arc::clone(&index);
        handles.push(tokio::spawn(async move {
            index
                .search("reset password")
                .iter()
                .map(|hit| hit.section.title().to_string())
                .collect::<Vec<_>>()
        }));
    }

    for handle in handles {
        let titles = handle.await.unwrap();
        assert_eq!(titles, vec!["Password Reset".to_string()]);
    }
}
