// Credential files on disk: one JSON file per Discord user id under the
// tokens directory. The directory is volume-mounted in Docker so tokens
// survive container restarts.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;

use crate::core::auth::{AuthError, CredentialStore, UserCredentials};

pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    // User ids are Discord snowflakes, but the callback hands us the raw
    // `state` string, so strip anything that could escape the directory.
    fn token_path(&self, user_id: &str) -> PathBuf {
        let safe: String = user_id
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        self.dir.join(format!("{safe}.json"))
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn exists(&self, user_id: &str) -> bool {
        self.token_path(user_id).exists()
    }

    async fn load(&self, user_id: &str) -> Result<Option<UserCredentials>, AuthError> {
        let path = self.token_path(user_id);
        if !path.exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&path)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;
        let creds: UserCredentials =
            serde_json::from_str(&text).map_err(|e| AuthError::Store(e.to_string()))?;
        Ok(Some(creds))
    }

    async fn save(&self, user_id: &str, creds: &UserCredentials) -> Result<(), AuthError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))?;

        let text =
            serde_json::to_string_pretty(creds).map_err(|e| AuthError::Store(e.to_string()))?;
        fs::write(self.token_path(user_id), text)
            .await
            .map_err(|e| AuthError::Store(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn sample_creds() -> UserCredentials {
        UserCredentials {
            access_token: "access-123".to_string(),
            refresh_token: Some("refresh-456".to_string()),
            expiry: Utc::now() + Duration::hours(1),
            scopes: vec!["https://www.googleapis.com/auth/documents".to_string()],
        }
    }

    #[tokio::test]
    async fn exists_tracks_presence_only() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());

        assert!(!store.exists("42").await);
        store.save("42", &sample_creds()).await.unwrap();
        assert!(store.exists("42").await);
        assert!(!store.exists("43").await);
    }

    #[tokio::test]
    async fn save_load_round_trips_exactly() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        let creds = sample_creds();

        store.save("42", &creds).await.unwrap();
        let loaded = store.load("42").await.unwrap().unwrap();
        assert_eq!(loaded, creds);
    }

    #[tokio::test]
    async fn load_absent_returns_none() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());
        assert_eq!(store.load("42").await.unwrap(), None);
    }

    #[tokio::test]
    async fn records_survive_store_reinstantiation() {
        let dir = TempDir::new().unwrap();
        let creds = sample_creds();

        FileCredentialStore::new(dir.path())
            .save("42", &creds)
            .await
            .unwrap();

        // Fresh store over the same directory, as after a process restart.
        let store = FileCredentialStore::new(dir.path());
        assert_eq!(store.load("42").await.unwrap(), Some(creds));
    }

    #[tokio::test]
    async fn save_overwrites_previous_record() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());

        store.save("42", &sample_creds()).await.unwrap();
        let mut updated = sample_creds();
        updated.access_token = "access-789".to_string();
        store.save("42", &updated).await.unwrap();

        assert_eq!(store.load("42").await.unwrap(), Some(updated));
    }

    #[tokio::test]
    async fn hostile_state_value_cannot_escape_the_directory() {
        let dir = TempDir::new().unwrap();
        let store = FileCredentialStore::new(dir.path());

        store.save("../evil", &sample_creds()).await.unwrap();
        assert!(!dir.path().parent().unwrap().join("evil.json").exists());
    }
}
