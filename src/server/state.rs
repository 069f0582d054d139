use std::sync::Arc;

use crate::adapters::{CloudinaryHost, FirebaseIdentity, FirestoreStore, MemoryStore};
use crate::config::{AppConfig, StoreBackend};
use crate::core::{AdminConsole, Catalog, UploadLimits};
use crate::domain::ports::{DocumentStore, IdentityProvider, ImageHost};
use crate::utils::error::Result;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub catalog: Catalog,
    pub admin: AdminConsole,
    pub identity: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        images: Arc<dyn ImageHost>,
        limits: UploadLimits,
    ) -> Self {
        Self {
            catalog: Catalog::new(store.clone()),
            admin: AdminConsole::new(store, images, limits),
            identity,
        }
    }

    /// Wires the hosted service adapters selected by `config`.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let store: Arc<dyn DocumentStore> = match config.store_backend() {
            StoreBackend::Firestore => {
                let settings = config.firestore_settings()?;
                tracing::info!(
                    "🗄️ Using Firestore project {} ({})",
                    settings.project_id,
                    settings.database
                );
                Arc::new(FirestoreStore::new(settings)?)
            }
            StoreBackend::Memory => {
                tracing::warn!("🗄️ Using the in-memory store; data is lost on restart");
                Arc::new(MemoryStore::new())
            }
        };

        let identity = FirebaseIdentity::new(config.identity_settings()?)?;
        let image_settings = config.image_settings()?;
        let limits = UploadLimits::from(&image_settings);
        let images = CloudinaryHost::new(image_settings)?;

        Ok(Self::new(store, Arc::new(identity), Arc::new(images), limits))
    }
}
