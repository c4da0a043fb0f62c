use super::provider::{GenerationRequest, ProviderError, TextGenerator};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum FakeMode {
    /// Reply with "{prefix} #{call number}"
    Reply(String),
    Quota,
    ServerError,
    Empty,
}

pub(crate) struct FakeGenerator {
    mode: Mutex<FakeMode>,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub(crate) fn new(mode: FakeMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(prefix: &str) -> Self {
        Self::new(FakeMode::Reply(prefix.to_string()))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn set_mode(&self, mode: FakeMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.prompts.lock().unwrap().push(request.prompt.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let mode = self.mode.lock().unwrap().clone();
        match mode {
            FakeMode::Reply(prefix) => Ok(format!("{} #{}", prefix, call)),
            FakeMode::Quota => Err(ProviderError::QuotaExceeded(
                "Resource has been exhausted (e.g. check quota).".to_string(),
            )),
            FakeMode::ServerError => Err(ProviderError::Api {
                status: 500,
                message: "internal error".to_string(),
            }),
            FakeMode::Empty => Err(ProviderError::EmptyResponse),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}
