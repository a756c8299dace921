//! Mock collaborators for tests
//!
//! These stand in for the generative backend, the homestay directory, the
//! host navigator and the reveal timer so turns run without real I/O.

use crate::actions::{NavigationTarget, Navigator};
use crate::conversation::Language;
use crate::knowledge::{Homestay, HomestayDirectory, HomestayLookupError};
use crate::llm::{LlmError, LlmRequest, LlmResponse, LlmService};
use crate::streaming::Scheduler;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Mock LLM Client
// ============================================================================

/// Backend that returns queued responses and records every request
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<LlmResponse, LlmError>>>,
    requests: Mutex<Vec<LlmRequest>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn queue_response(&self, response: LlmResponse) {
        self.responses.lock().unwrap().push_back(Ok(response));
    }

    pub fn queue_error(&self, error: LlmError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_requests(&self) -> Vec<LlmRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmService for MockLlmClient {
    async fn complete(&self, request: &LlmRequest) -> Result<LlmResponse, LlmError> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::network("No mock response queued")))
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Mock Homestay Directory
// ============================================================================

pub struct MockHomestayDirectory {
    homestays: Option<Vec<Homestay>>,
    calls: AtomicUsize,
}

impl MockHomestayDirectory {
    pub fn with(homestays: Vec<Homestay>) -> Self {
        Self {
            homestays: Some(homestays),
            calls: AtomicUsize::new(0),
        }
    }

    /// Directory whose every lookup fails with a transport error
    pub fn failing() -> Self {
        Self {
            homestays: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HomestayDirectory for MockHomestayDirectory {
    async fn all_homestays(&self, _language: Language) -> Result<Vec<Homestay>, HomestayLookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.homestays
            .clone()
            .ok_or_else(|| HomestayLookupError::Transport("connection refused".to_string()))
    }
}

pub fn sample_homestays(n: usize) -> Vec<Homestay> {
    const NAMES: &[&str] = &["Pondok Bambu", "Rumah Kopi", "Saung Sawah", "Villa Kabut", "Griya Tani"];
    (1..=n)
        .map(|i| Homestay {
            id: i64::try_from(i).unwrap(),
            title: NAMES[(i - 1) % NAMES.len()].to_string(),
            base_price: 250_000 + 50_000 * u64::try_from(i).unwrap(),
            location: "Dusun Cibeureum".to_string(),
            max_guests: 2 + u32::try_from(i % 4).unwrap(),
            images: vec![format!("/uploads/homestay-{i}.jpg")],
        })
        .collect()
}

// ============================================================================
// Navigator and Scheduler
// ============================================================================

/// Navigator that remembers every target it was asked to open
#[derive(Debug, Clone, Default)]
pub struct RecordingNavigator {
    targets: Arc<Mutex<Vec<NavigationTarget>>>,
}

impl RecordingNavigator {
    pub fn targets(&self) -> Vec<NavigationTarget> {
        self.targets.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, target: &NavigationTarget) {
        self.targets.lock().unwrap().push(target.clone());
    }
}

/// Scheduler that returns immediately and records the requested delays
#[derive(Debug, Default)]
pub struct InstantScheduler {
    delays: Mutex<Vec<Duration>>,
}

impl InstantScheduler {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().unwrap().clone()
    }
}

#[async_trait]
impl Scheduler for InstantScheduler {
    async fn sleep(&self, delay: Duration) {
        self.delays.lock().unwrap().push(delay);
    }
}
