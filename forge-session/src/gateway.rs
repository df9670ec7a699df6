use async_trait::async_trait;
use chrono::{DateTime, Utc};
use forge_core::{ChatMessage, Result, Role};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
    /// Conversation order.
    pub messages: Vec<ChatMessage>,
}

/// One successful pipeline stage, as persisted after the stage's payload is folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub stage: String,
    /// 1-based attempt that produced the accepted output.
    pub attempt_number: u32,
    pub summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileVersion {
    pub content: String,
    pub commit_msg: String,
    pub created_at: DateTime<Utc>,
}

/// Append-only store for conversations, pipeline steps and extracted memories.
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Returns the new thread id.
    async fn create_thread(&self, user_id: &str, title: &str) -> Result<String>;

    async fn find_thread(&self, thread_id: &str) -> Result<Option<Thread>>;

    async fn append_message(&self, thread_id: &str, role: Role, content: &str) -> Result<()>;

    async fn record_pipeline_step(&self, project_id: &str, record: StageRecord) -> Result<()>;

    async fn save_memory(&self, user_id: &str, fact: &str) -> Result<()>;
}

/// Versioned project files. Each call is applied independently; there is no transaction
/// spanning several calls.
#[async_trait]
pub trait ProjectFileStore: Send + Sync {
    async fn create_file_version(
        &self,
        project_id: &str,
        path: &str,
        content: &str,
        commit_msg: &str,
    ) -> Result<()>;

    async fn update_file(
        &self,
        project_id: &str,
        path: &str,
        content: &str,
        commit_msg: &str,
    ) -> Result<()>;

    /// Drop the latest version of `path`, restoring the previous one.
    async fn revert_file(&self, project_id: &str, path: &str, commit_msg: &str) -> Result<()>;
}
