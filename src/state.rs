use std::time::Instant;

use crate::config::settings::AppConfig;
use crate::infrastructure::process::runner::ProcessRegistry;
use crate::infrastructure::storage::s3::StorageService;
use crate::modules::jobs::registry::JobRegistry;
use crate::workers::notifier::NotificationDispatcher;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub storage: StorageService,
    pub jobs: JobRegistry,
    pub processes: ProcessRegistry,
    pub notifier: NotificationDispatcher,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: AppConfig, storage: StorageService) -> Self {
        Self {
            config,
            storage,
            jobs: JobRegistry::new(),
            processes: ProcessRegistry::new(),
            notifier: NotificationDispatcher::new(),
            started_at: Instant::now(),
        }
    }
}
