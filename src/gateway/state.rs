use std::sync::Arc;

use chrono::Utc;

use crate::census::Census;
use crate::core_types::Timestamp;
use crate::store::RecordStore;
use crate::transfer::TransferCoordinator;

/// Gateway shared state
#[derive(Clone)]
pub struct AppState {
    /// Hospitals and patients
    pub census: Arc<Census>,
    /// Transfer workflow
    pub transfers: Arc<TransferCoordinator>,
    pub started_at: Timestamp,
}

impl AppState {
    /// Both services share one record store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            census: Arc::new(Census::new(store.clone())),
            transfers: Arc::new(TransferCoordinator::new(store)),
            started_at: Utc::now(),
        }
    }
}
