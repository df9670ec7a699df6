use crate::gateway::{FileVersion, PersistenceGateway, ProjectFileStore, StageRecord, Thread};
use async_trait::async_trait;
use chrono::Utc;
use forge_core::{ChatMessage, ForgeError, Result, Role};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

type FileKey = (String, String);

/// Process-local gateway. Cloning shares the underlying maps.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    threads: Arc<RwLock<HashMap<String, Thread>>>,
    steps: Arc<RwLock<HashMap<String, Vec<StageRecord>>>>,
    memories: Arc<RwLock<HashMap<String, Vec<String>>>>,
    files: Arc<RwLock<HashMap<FileKey, Vec<FileVersion>>>>,
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| ForgeError::Persistence("store lock poisoned".to_string()))
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| ForgeError::Persistence("store lock poisoned".to_string()))
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pipeline_steps(&self, project_id: &str) -> Vec<StageRecord> {
        read(&self.steps)
            .map(|steps| steps.get(project_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    pub fn memories(&self, user_id: &str) -> Vec<String> {
        read(&self.memories)
            .map(|memories| memories.get(user_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    /// Current content of a project file, if any version exists.
    pub fn file_content(&self, project_id: &str, path: &str) -> Option<String> {
        let files = read(&self.files).ok()?;
        files
            .get(&(project_id.to_string(), path.to_string()))
            .and_then(|versions| versions.last())
            .map(|version| version.content.clone())
    }

    pub fn file_versions(&self, project_id: &str, path: &str) -> Vec<FileVersion> {
        read(&self.files)
            .ok()
            .and_then(|files| files.get(&(project_id.to_string(), path.to_string())).cloned())
            .unwrap_or_default()
    }

    fn push_version(&self, project_id: &str, path: &str, content: &str, commit_msg: &str) -> Result<()> {
        let version = FileVersion {
            content: content.to_string(),
            commit_msg: commit_msg.to_string(),
            created_at: Utc::now(),
        };
        write(&self.files)?
            .entry((project_id.to_string(), path.to_string()))
            .or_default()
            .push(version);
        Ok(())
    }
}

#[async_trait]
impl PersistenceGateway for InMemoryGateway {
    async fn create_thread(&self, user_id: &str, title: &str) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let thread = Thread {
            id: id.clone(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            created_at: Utc::now(),
            messages: Vec::new(),
        };
        write(&self.threads)?.insert(id.clone(), thread);
        tracing::debug!(thread.id = %id, user.id = %user_id, "thread created");
        Ok(id)
    }

    async fn find_thread(&self, thread_id: &str) -> Result<Option<Thread>> {
        Ok(read(&self.threads)?.get(thread_id).cloned())
    }

    async fn append_message(&self, thread_id: &str, role: Role, content: &str) -> Result<()> {
        let mut threads = write(&self.threads)?;
        let thread = threads
            .get_mut(thread_id)
            .ok_or_else(|| ForgeError::Persistence(format!("thread {thread_id} not found")))?;
        thread.messages.push(ChatMessage::new(role, content));
        Ok(())
    }

    async fn record_pipeline_step(&self, project_id: &str, record: StageRecord) -> Result<()> {
        write(&self.steps)?.entry(project_id.to_string()).or_default().push(record);
        Ok(())
    }

    async fn save_memory(&self, user_id: &str, fact: &str) -> Result<()> {
        write(&self.memories)?.entry(user_id.to_string()).or_default().push(fact.to_string());
        Ok(())
    }
}

#[async_trait]
impl ProjectFileStore for InMemoryGateway {
    async fn create_file_version(
        &self,
        project_id: &str,
        path: &str,
        content: &str,
        commit_msg: &str,
    ) -> Result<()> {
        self.push_version(project_id, path, content, commit_msg)
    }

    async fn update_file(
        &self,
        project_id: &str,
        path: &str,
        content: &str,
        commit_msg: &str,
    ) -> Result<()> {
        if self.file_content(project_id, path).is_none() {
            return Err(ForgeError::Persistence(format!("cannot update missing file {path}")));
        }
        self.push_version(project_id, path, content, commit_msg)
    }

    async fn revert_file(&self, project_id: &str, path: &str, _commit_msg: &str) -> Result<()> {
        let mut files = write(&self.files)?;
        let versions = files
            .get_mut(&(project_id.to_string(), path.to_string()))
            .filter(|versions| versions.len() > 1)
            .ok_or_else(|| {
                ForgeError::Persistence(format!("no earlier version of {path} to revert to"))
            })?;
        versions.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_thread_messages_keep_order() {
        let gateway = InMemoryGateway::new();
        let id = gateway.create_thread("u1", "greetings").await.unwrap();
        gateway.append_message(&id, Role::User, "hi").await.unwrap();
        gateway.append_message(&id, Role::Assistant, "hello").await.unwrap();

        let thread = gateway.find_thread(&id).await.unwrap().unwrap();
        let contents: Vec<&str> = thread.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello"]);
        assert_eq!(thread.messages[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn test_append_to_unknown_thread_fails() {
        let gateway = InMemoryGateway::new();
        let err = gateway.append_message("missing", Role::User, "x").await.unwrap_err();
        assert!(matches!(err, ForgeError::Persistence(_)));
        assert!(gateway.find_thread("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_versions_and_revert() {
        let gateway = InMemoryGateway::new();
        gateway.create_file_version("p", "src/main.rs", "v1", "init").await.unwrap();
        gateway.update_file("p", "src/main.rs", "v2", "edit").await.unwrap();
        assert_eq!(gateway.file_content("p", "src/main.rs").as_deref(), Some("v2"));

        gateway.revert_file("p", "src/main.rs", "undo").await.unwrap();
        assert_eq!(gateway.file_content("p", "src/main.rs").as_deref(), Some("v1"));
        assert!(gateway.revert_file("p", "src/main.rs", "undo").await.is_err());
    }

    #[tokio::test]
    async fn test_update_requires_existing_file() {
        let gateway = InMemoryGateway::new();
        assert!(gateway.update_file("p", "nope.rs", "x", "edit").await.is_err());
    }
}
