pub mod llm;
pub mod prompt;
pub mod retry;
pub mod schema;
pub mod store;

pub use llm::{ChatClient, GenerationParams, RemoteError};
pub use retry::RetryPolicy;
pub use schema::{BundleField, BundleUpdate, ChatMessage, ConfigurationBundle, Role};
pub use store::{BundleStore, FsBundleStore, StoreError};

use std::time::Instant;
use tracing::info;

pub struct Evaluator {
    client: ChatClient,
    retry: RetryPolicy,
}

impl Evaluator {
    pub fn new(client: ChatClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Grade a submission against the configuration bundle.
    ///
    /// The model's first choice is returned unmodified. Only transient
    /// transport failures are retried, as bounded by the retry policy.
    pub async fn evaluate(
        &self,
        bundle: &ConfigurationBundle,
        submission: &str,
    ) -> Result<String, RemoteError> {
        let messages = prompt::build_messages(bundle, submission);
        let started = Instant::now();

        let evaluation = self
            .retry
            .retry("chat_completion", || self.client.complete(&messages))
            .await?;

        info!(
            model = self.client.model(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = evaluation.chars().count(),
            "Evaluation received"
        );

        Ok(evaluation)
    }
}
