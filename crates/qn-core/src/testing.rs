//! Test utilities shared across the workspace.
//! Only compiled when running tests or with the `testing` feature.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::error::Error;
use crate::generate::Generator;
use crate::message::{Message, Usage};
use crate::provider::{CompletionRequest, CompletionResponse, FinishReason, Provider};
use crate::search::{SearchHit, SearchProvider};
use crate::store::{NewsState, TopicStore};

/// A mock provider that returns pre-configured responses.
pub struct MockProvider {
    responses: Mutex<Vec<CompletionResponse>>,
    /// Captured requests (for assertion).
    pub captured_requests: Mutex<Vec<CompletionRequest>>,
    pub name: String,
    pub default_model: Option<String>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_requests: Mutex::new(Vec::new()),
            name: "mock".to_string(),
            default_model: None,
        }
    }

    /// Queue a response to be returned by the next complete() call.
    /// Responses are returned in FIFO order (first queued = first returned).
    pub fn queue_response(&self, content: &str) {
        let response = CompletionResponse {
            message: Message::assistant(content),
            thinking: None,
            usage: Usage::new(0, 0),
            model: "mock-model".to_string(),
            finish_reason: FinishReason::Stop,
        };
        self.responses.lock().unwrap().insert(0, response);
    }

    /// Get the last captured request.
    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.captured_requests.lock().unwrap().last().cloned()
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn default_model(&self) -> Option<&str> {
        self.default_model.as_deref()
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, Error> {
        self.captured_requests.lock().unwrap().push(request);
        match self.responses.lock().unwrap().pop() {
            Some(response) => Ok(response),
            None => Err(Error::Unknown("No mock response queued".to_string())),
        }
    }
}

/// A mock search provider with queued results.
///
/// When built with [`MockSearch::observing`], every call records a snapshot
/// of the store taken at call time.
pub struct MockSearch {
    responses: Mutex<Vec<Result<Vec<SearchHit>, Error>>>,
    /// Captured (query, max_results) pairs.
    pub queries: Mutex<Vec<(String, usize)>>,
    observed: Mutex<Vec<NewsState>>,
    store: Option<TopicStore>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            queries: Mutex::new(Vec::new()),
            observed: Mutex::new(Vec::new()),
            store: None,
        }
    }

    pub fn observing(store: TopicStore) -> Self {
        Self {
            store: Some(store),
            ..Self::new()
        }
    }

    /// Queue hits for the next search() call (FIFO).
    pub fn queue_hits(&self, hits: Vec<SearchHit>) {
        self.responses.lock().unwrap().insert(0, Ok(hits));
    }

    /// Queue a failure for the next search() call (FIFO).
    pub fn queue_error(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }

    pub fn last_query(&self) -> Option<(String, usize)> {
        self.queries.lock().unwrap().last().cloned()
    }

    pub fn observed_states(&self) -> Vec<NewsState> {
        self.observed.lock().unwrap().clone()
    }
}

impl Default for MockSearch {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchProvider for MockSearch {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, query: &str, max_results: usize) -> Result<Vec<SearchHit>, Error> {
        if let Some(store) = &self.store {
            self.observed.lock().unwrap().push(store.snapshot());
        }
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), max_results));
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(Error::Unknown(
                "No mock search response queued".to_string(),
            )))
    }
}

/// A mock generator with queued outputs and captured (instructions, input) calls.
pub struct MockGenerator {
    responses: Mutex<Vec<Result<String, Error>>>,
    pub captured_calls: Mutex<Vec<(String, String)>>,
    observed: Mutex<Vec<NewsState>>,
    store: Option<TopicStore>,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            captured_calls: Mutex::new(Vec::new()),
            observed: Mutex::new(Vec::new()),
            store: None,
        }
    }

    pub fn observing(store: TopicStore) -> Self {
        Self {
            store: Some(store),
            ..Self::new()
        }
    }

    /// Queue an output for the next generate() call (FIFO).
    pub fn queue_ok(&self, output: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(0, Ok(output.to_string()));
    }

    /// Queue a failure for the next generate() call (FIFO).
    pub fn queue_err(&self, error: Error) {
        self.responses.lock().unwrap().insert(0, Err(error));
    }

    pub fn call_count(&self) -> usize {
        self.captured_calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.captured_calls.lock().unwrap().clone()
    }

    pub fn observed_states(&self) -> Vec<NewsState> {
        self.observed.lock().unwrap().clone()
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Generator for MockGenerator {
    async fn generate(&self, instructions: &str, input: &str) -> Result<String, Error> {
        if let Some(store) = &self.store {
            self.observed.lock().unwrap().push(store.snapshot());
        }
        self.captured_calls
            .lock()
            .unwrap()
            .push((instructions.to_string(), input.to_string()));
        self.responses
            .lock()
            .unwrap()
            .pop()
            .unwrap_or(Err(Error::Unknown(
                "No mock generate response queued".to_string(),
            )))
    }
}
