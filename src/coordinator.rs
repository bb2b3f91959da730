//! Shared, per-patchset coverage cache.
//!
//! The coordinator holds at most one [`CoverageEntry`], keyed by
//! [`ChangeKey`]. An entry's two fetches start as background tasks the
//! moment it is created, and every caller for the same key awaits the same
//! shared futures, so each (key, kind) pair reaches the network once.
//!
//! When the key changes the entry is replaced wholesale. Accessors clone the
//! futures out of the entry before their first suspension point, so a slow
//! fetch for an older patchset can never leak into a caller that asked for
//! a newer one, and a caller that asked for the older one still gets the
//! older data.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};
use tracing::{debug, warn};

use crate::error::CoverageError;
use crate::fetch::{CoverageService, DataKind};
use crate::model::{ChangeKey, CoverageRange, PercentageData, PercentageMap, RangeMap};
use crate::transport::HttpTransport;

/// A background fetch every interested caller can await. Failures are
/// captured in the output so awaiting never panics.
pub(crate) type SharedFetch<T> =
    Shared<BoxFuture<'static, std::result::Result<Arc<T>, Arc<CoverageError>>>>;

/// Start `fut` on the runtime immediately and return a shareable handle to
/// its result. A failure is logged once, here, whether or not anyone ever
/// awaits it.
///
/// Must be called from within a Tokio runtime.
pub(crate) fn spawn_shared<T, F>(label: String, fut: F) -> SharedFetch<T>
where
    T: Send + Sync + 'static,
    F: Future<Output = crate::error::Result<T>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        fut.await.map(Arc::new).map_err(|err| {
            warn!(fetch = %label, error = %err, "background fetch failed");
            Arc::new(err)
        })
    });
    async move {
        handle
            .await
            .unwrap_or_else(|err| Err(Arc::new(CoverageError::Task(err.to_string()))))
    }
    .boxed()
    .shared()
}

/// Everything fetched for one patchset.
struct CoverageEntry {
    key: ChangeKey,
    ranges: SharedFetch<RangeMap>,
    percentages: SharedFetch<PercentageMap>,
}

impl CoverageEntry {
    fn start(service: &CoverageService, key: ChangeKey) -> Self {
        let ranges = {
            let service = service.clone();
            let key = key.clone();
            spawn_shared(format!("{key} {}", DataKind::Lines), async move {
                service.fetch_ranges(&key).await
            })
        };
        let percentages = {
            let service = service.clone();
            let key = key.clone();
            spawn_shared(format!("{key} {}", DataKind::Percentages), async move {
                service.fetch_percentages(&key).await
            })
        };
        Self {
            key,
            ranges,
            percentages,
        }
    }
}

/// Owns the coverage cache for one UI session. Share it by reference (or
/// `Arc`) with every consumer.
pub struct CoverageCoordinator {
    service: CoverageService,
    current: Mutex<Option<Arc<CoverageEntry>>>,
}

impl CoverageCoordinator {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            service: CoverageService::new(transport),
            current: Mutex::new(None),
        }
    }

    /// Return the entry for `key`, replacing the current one if it belongs
    /// to a different key. Invalid keys touch nothing.
    fn ensure_fresh(&self, key: &ChangeKey) -> Option<Arc<CoverageEntry>> {
        if !key.is_valid() {
            debug!(%key, "ignoring incomplete change key");
            return None;
        }

        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = current.as_ref().filter(|e| e.key == *key) {
            return Some(Arc::clone(entry));
        }

        debug!(%key, "starting coverage fetch");
        let entry = Arc::new(CoverageEntry::start(&self.service, key.clone()));
        *current = Some(Arc::clone(&entry));
        Some(entry)
    }

    /// Make sure data for `key` is cached or in flight. Returns `false` when
    /// the key is incomplete and nothing was started.
    ///
    /// Starting a fetch spawns onto the current Tokio runtime, so this must be
    /// called from within one.
    pub fn prefetch(&self, key: &ChangeKey) -> bool {
        self.ensure_fresh(key).is_some()
    }

    /// The key of the cached entry, if any.
    pub fn current_key(&self) -> Option<ChangeKey> {
        self.current
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|e| e.key.clone())
    }

    /// Coverage ranges for `path`.
    ///
    /// `Some(vec![])` when the service has no data for the file, `None` when
    /// the key is incomplete or the fetch failed.
    pub async fn ranges_for_file(&self, key: &ChangeKey, path: &str) -> Option<Vec<CoverageRange>> {
        let ranges = self.ensure_fresh(key)?.ranges.clone();
        match ranges.await {
            Ok(map) => Some(map.get(path).cloned().unwrap_or_default()),
            Err(err) => {
                debug!(%key, path, error = %err, "no coverage ranges");
                None
            }
        }
    }

    /// Coverage percentages for `path`, or `None` when the file has none,
    /// the key is incomplete, or the fetch failed.
    pub async fn percentages_for_file(&self, key: &ChangeKey, path: &str) -> Option<PercentageData> {
        self.percentages(key).await?.get(path).cloned()
    }

    /// All per-file percentages for `key`, or `None` on failure.
    pub async fn percentages(&self, key: &ChangeKey) -> Option<Arc<PercentageMap>> {
        let percentages = self.ensure_fresh(key)?.percentages.clone();
        match percentages.await {
            Ok(map) => Some(map),
            Err(err) => {
                debug!(%key, error = %err, "no coverage percentages");
                None
            }
        }
    }
}
