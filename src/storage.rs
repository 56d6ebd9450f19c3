use crate::errors::AppError;
use crate::models::AppData;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tokio::{fs, sync::Mutex};
use tracing::error;

pub async fn load_data(path: &Path) -> AppData {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(data) => data,
            Err(err) => {
                error!("failed to parse data file: {err}");
                AppData::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => AppData::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            AppData::default()
        }
    }
}

pub async fn persist_data(path: &Path, data: &AppData) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(data).map_err(AppError::internal)?;
    fs::write(path, payload).await.map_err(AppError::internal)?;
    Ok(())
}

#[derive(Clone)]
pub struct LocalStore {
    path: PathBuf,
    data: Arc<Mutex<AppData>>,
}

impl LocalStore {
    pub async fn open(path: PathBuf) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let data = load_data(&path).await;
        Ok(Self::with_data(path, data))
    }

    pub fn with_data(path: PathBuf, data: AppData) -> Self {
        Self {
            path,
            data: Arc::new(Mutex::new(data)),
        }
    }

    pub async fn read<R>(&self, f: impl FnOnce(&AppData) -> R) -> R {
        let data = self.data.lock().await;
        f(&data)
    }

    pub async fn update<R>(&self, f: impl FnOnce(&mut AppData) -> R) -> Result<R, AppError> {
        let mut data = self.data.lock().await;
        let result = f(&mut data);
        persist_data(&self.path, &data).await?;
        Ok(result)
    }
}
