/// View registrar that records credits instead of calling a backend
use async_trait::async_trait;
use lyra_core::{TrackId, ViewRegistrar};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct LoggingRegistrar {
    credited: Mutex<Vec<TrackId>>,
}

impl LoggingRegistrar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credited track ids, in registration order
    pub fn credited(&self) -> Vec<TrackId> {
        self.credited.lock().unwrap().clone()
    }
}

#[async_trait]
impl ViewRegistrar for LoggingRegistrar {
    async fn register_view(&self, track_id: &TrackId) -> lyra_core::Result<()> {
        tracing::info!(track_id = %track_id, "View credited");
        self.credited.lock().unwrap().push(track_id.clone());
        Ok(())
    }
}
