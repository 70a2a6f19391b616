use crate::errors::AppError;
use crate::models::CrmData;
use std::path::Path;
use tokio::fs;
use tracing::{error, info};

pub async fn load_data(path: &Path) -> CrmData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<CrmData>(&bytes) {
            Ok(data) => {
                info!(
                    clients = data.clients.len(),
                    contacts = data.contacts.len(),
                    activities = data.activities.len(),
                    tasks = data.tasks.len(),
                    "loaded data from {}",
                    path.display()
                );
                data
            }
            Err(err) => {
                error!("failed to parse data file: {err}");
                CrmData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => CrmData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            CrmData::default()
        }
    }
}

/// Writes to a sibling temp file first so a crash never leaves half a document.
pub async fn persist_data(path: &Path, data: &CrmData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await?;
    fs::rename(&staging, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewTask, Task};
    use crate::store;

    fn temp_path(name: &str) -> std::path::PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("crm_storage_{name}_{}_{nanos}.json", std::process::id()))
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let data = load_data(&temp_path("missing")).await;
        assert!(data.clients.is_empty());
        assert_eq!(data.tasks.next_id, 1);
    }

    #[tokio::test]
    async fn persisted_data_reloads_with_counters() {
        let path = temp_path("roundtrip");
        let mut data = CrmData::default();
        let input: NewTask = serde_json::from_value(serde_json::json!({ "title": "Follow up" })).unwrap();
        let task = store::create::<Task>(&mut data, input).unwrap();
        store::delete::<Task>(&mut data, task.id).unwrap();

        persist_data(&path, &data).await.unwrap();
        let reloaded = load_data(&path).await;
        assert!(reloaded.tasks.is_empty());
        assert_eq!(reloaded.tasks.next_id, 2);

        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn corrupt_file_falls_back_to_empty() {
        let path = temp_path("corrupt");
        std::fs::write(&path, b"{ not json").unwrap();
        let data = load_data(&path).await;
        assert!(data.contacts.is_empty());
        let _ = std::fs::remove_file(path);
    }
}
