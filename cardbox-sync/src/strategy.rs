//! Store selection.
//!
//! Callers depend on [`CardStore`] and this factory; which concrete store
//! they get is decided here from configuration alone.

use std::path::Path;
use std::sync::Arc;

use cardbox_adaptive::PerfTracker;
use cardbox_core::config::CardboxConfig;
use cardbox_core::errors::{CardboxError, CardboxResult};
use cardbox_core::traits::CardStore;
use cardbox_storage::LocalStore;

#[cfg(feature = "remote-http")]
use crate::hybrid::HybridStore;
#[cfg(feature = "remote-http")]
use crate::mirror::http::HttpMirror;

/// Open the store the configuration asks for.
///
/// Sync disabled yields a plain local store. Sync enabled requires a
/// `remote_url`; with the `remote-http` feature that becomes a hybrid
/// store mirroring to that URL, without it the store degrades to
/// local-only with a warning rather than failing to open.
pub fn open_store(
    config: &CardboxConfig,
    tracker: Arc<PerfTracker>,
) -> CardboxResult<Arc<dyn CardStore>> {
    let local = Arc::new(LocalStore::open(
        Path::new(&config.storage.db_path),
        &config.storage,
        tracker,
    )?);

    if !config.sync.enabled {
        tracing::info!(db = %config.storage.db_path, "opened local-only store");
        return Ok(local);
    }

    let Some(url) = config.sync.remote_url.as_deref() else {
        return Err(CardboxError::Config {
            reason: "sync is enabled but no remote_url is configured".to_string(),
        });
    };

    #[cfg(feature = "remote-http")]
    {
        let mirror = Arc::new(HttpMirror::for_url(url)?);
        tracing::info!(
            db = %config.storage.db_path,
            remote = %url,
            "opened hybrid store"
        );
        Ok(Arc::new(HybridStore::new(
            local,
            mirror,
            config.sync.clone(),
        )))
    }

    #[cfg(not(feature = "remote-http"))]
    {
        tracing::warn!(
            remote = %url,
            "remote mirroring requires the remote-http feature; degrading to local-only"
        );
        Ok(local)
    }
}
