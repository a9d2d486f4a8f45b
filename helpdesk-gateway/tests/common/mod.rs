//! Shared helpers for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use helpdesk_core::Settings;
use helpdesk_db::HelpdeskDbPool;
use helpdesk_db::test_helpers::create_test_pool;
use helpdesk_gateway::chat::ChatOrchestrator;
use helpdesk_gateway::prompt::Prompt;
use helpdesk_gateway::providers::{GenerationError, ResponseGenerator};
use helpdesk_knowledge::{IndexOptions, KnowledgeIndex};

pub const CORPUS: &str = "\
# Billing
Refunds take 5-7 business days to appear on your statement.
Invoices are emailed on the first of each month.

# Password Reset
Click the Forgot Password link on the login page and follow the emailed instructions.

# Mobile Apps
Our apps are available for iOS and Android devices.
";

/// Deterministic generator with a fixed reply and optional delay.
///
/// The delay ignores the timeout handed in so tests can check that the
/// orchestrator enforces the deadline itself.
pub struct StubGenerator {
    reply: Result<String, GenerationError>,
    delay: Duration,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    last_prompt: Mutex<Option<Prompt>>,
}

impl StubGenerator {
    fn with(reply: Result<String, GenerationError>, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            reply,
            delay,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        })
    }

    pub fn answering(text: &str) -> Arc<Self> {
        Self::with(Ok(text.to_string()), Duration::ZERO)
    }

    pub fn failing(error: GenerationError) -> Arc<Self> {
        Self::with(Err(error), Duration::ZERO)
    }

    pub fn slow(text: &str, delay: Duration) -> Arc<Self> {
        Self::with(Ok(text.to_string()), delay)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<Prompt> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ResponseGenerator for StubGenerator {
    fn name(&self) -> &str {
        "stub"
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        _timeout: Duration,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.clone());

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.reply.clone()
    }
}

pub fn index() -> Arc<KnowledgeIndex> {
    Arc::new(KnowledgeIndex::from_text(CORPUS, IndexOptions::default()))
}

pub async fn orchestrator_with(
    generator: Arc<StubGenerator>,
    settings: &Settings,
) -> (ChatOrchestrator, HelpdeskDbPool) {
    let db = create_test_pool().await.expect("in-memory database");
    let orchestrator = ChatOrchestrator::new(index(), generator, db.clone(), settings)
        .expect("prompt budget fits a question");
    (orchestrator, db)
}

pub async fn orchestrator(generator: Arc<StubGenerator>) -> (ChatOrchestrator, HelpdeskDbPool) {
    orchestrator_with(generator, &Settings::default()).await
}
