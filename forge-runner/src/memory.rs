use forge_core::{ForgeError, GenerateOptions, Llm, Result};
use forge_pipeline::strip_code_fences;
use forge_session::PersistenceGateway;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Best-effort extraction of durable user facts from one exchange.
///
/// Failures never reach the chat response: [`MemoryExtractor::spawn`] logs and drops them.
#[derive(Clone)]
pub struct MemoryExtractor {
    llm: Arc<dyn Llm>,
    model: String,
    gateway: Arc<dyn PersistenceGateway>,
}

impl MemoryExtractor {
    pub fn new(
        llm: Arc<dyn Llm>,
        model: impl Into<String>,
        gateway: Arc<dyn PersistenceGateway>,
    ) -> Self {
        Self { llm, model: model.into(), gateway }
    }

    /// Run [`extract`](Self::extract) on a background task.
    pub fn spawn(&self, user_id: String, message: String, reply: String) -> JoinHandle<()> {
        let extractor = self.clone();
        tokio::spawn(async move {
            match extractor.extract(&user_id, &message, &reply).await {
                Ok(facts) if !facts.is_empty() => {
                    tracing::debug!(user.id = %user_id, count = facts.len(), "memories saved");
                }
                Ok(_) => {}
                Err(error) => {
                    tracing::warn!(user.id = %user_id, error = %error, "memory extraction failed");
                }
            }
        })
    }

    /// Ask the model for facts worth remembering and save each one. Returns the saved facts.
    pub async fn extract(&self, user_id: &str, message: &str, reply: &str) -> Result<Vec<String>> {
        let prompt = format!(
            "Extract durable facts about the user from this exchange (preferences, background, \
             goals). Ignore anything temporary.\n\nUser: {message}\nAssistant: {reply}\n\n\
             Reply with a JSON array of short strings, or [] if there is nothing worth keeping."
        );
        let options = GenerateOptions::new().with_temperature(0.0);
        let response = self.llm.generate(&prompt, &self.model, &options).await?;

        let facts: Vec<String> = serde_json::from_str(strip_code_fences(&response.content))
            .map_err(|e| ForgeError::Format(format!("memory reply is not a JSON array: {e}")))?;
        let facts: Vec<String> = facts
            .into_iter()
            .map(|fact| fact.trim().to_string())
            .filter(|fact| !fact.is_empty())
            .collect();
        for fact in &facts {
            self.gateway.save_memory(user_id, fact).await?;
        }
        Ok(facts)
    }
}
