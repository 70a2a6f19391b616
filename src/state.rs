use crate::config::Config;
use crate::errors::AppError;
use crate::models::CrmData;
use crate::storage::persist_data;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    data: Arc<Mutex<CrmData>>,
}

impl AppState {
    pub fn new(config: Config, data: CrmData) -> Self {
        Self {
            config: Arc::new(config),
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn read(&self) -> MutexGuard<'_, CrmData> {
        self.data.lock().await
    }

    /// Runs `change` on a draft under the lock. The draft replaces the live
    /// data only once it is on disk, so a failed write changes nothing.
    pub async fn mutate<T>(
        &self,
        change: impl FnOnce(&mut CrmData) -> Result<T, AppError>,
    ) -> Result<T, AppError> {
        let mut data = self.data.lock().await;
        let mut draft = data.clone();
        let outcome = change(&mut draft)?;
        persist_data(&self.config.data_path, &draft).await?;
        *data = draft;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Client, NewClient};
    use crate::store;
    use axum::http::StatusCode;
    use serde_json::json;
    use std::path::PathBuf;

    fn state_at(data_path: PathBuf) -> AppState {
        AppState::new(
            Config {
                port: 0,
                data_path,
            },
            CrmData::default(),
        )
    }

    fn acme() -> NewClient {
        serde_json::from_value(json!({ "name": "Acme", "email": "a@acme.com" })).unwrap()
    }

    #[tokio::test]
    async fn failed_write_leaves_memory_untouched() {
        let state = state_at(std::env::temp_dir().join("crm_state_missing_dir/nested/crm.json"));

        let err = state
            .mutate(|data| store::create::<Client>(data, acme()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);

        let data = state.read().await;
        assert!(data.clients.is_empty());
        assert_eq!(data.clients.next_id, 1);
    }

    #[tokio::test]
    async fn rejected_change_is_not_applied() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!("crm_state_{}_{nanos}.json", std::process::id()));
        let state = state_at(path.clone());

        state
            .mutate(|data| store::create::<Client>(data, acme()))
            .await
            .unwrap();
        let err = state
            .mutate(|data| store::create::<Client>(data, acme()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(state.read().await.clients.len(), 1);

        let _ = std::fs::remove_file(path);
    }
}
