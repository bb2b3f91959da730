//! Per-project "show coverage" flag, read from the review host's plugin
//! config endpoint and cached until the project changes.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::debug;
use url::Url;

use crate::coordinator::{spawn_shared, SharedFetch};
use crate::error::{CoverageError, Result};
use crate::model::CoverageConfig;
use crate::transport::{strip_xssi_prefix, HttpTransport};

/// Default plugin name; also the project config section holding `enabled`.
pub const DEFAULT_PLUGIN_NAME: &str = "code-coverage";

/// REST URL of the plugin config for `project` on the review host at `origin`.
/// The project is encoded as a single path segment, so `chromium/src`
/// becomes `chromium%2Fsrc`.
pub fn config_url(origin: &str, project: &str, plugin_name: &str) -> Result<String> {
    let mut url = Url::parse(origin)?;
    url.path_segments_mut()
        .map_err(|()| CoverageError::Format(format!("'{origin}' cannot carry a path")))?
        .pop_if_empty()
        .push("projects")
        .push(project)
        .push(&format!("{plugin_name}~config"));
    Ok(url.into())
}

async fn fetch_config(
    transport: Arc<dyn HttpTransport>,
    url: String,
) -> Result<CoverageConfig> {
    let resp = transport.get(&url, &[]).await?;
    if !resp.is_success() {
        return Err(CoverageError::Http {
            status: resp.status,
            body: resp.body,
        });
    }
    Ok(serde_json::from_str(strip_xssi_prefix(&resp.body))?)
}

struct ConfigEntry {
    origin: String,
    project: String,
    config: SharedFetch<CoverageConfig>,
}

pub struct ProjectConfigCache {
    transport: Arc<dyn HttpTransport>,
    plugin_name: String,
    current: Mutex<Option<Arc<ConfigEntry>>>,
}

impl ProjectConfigCache {
    pub fn new(transport: Arc<dyn HttpTransport>, plugin_name: impl Into<String>) -> Self {
        Self {
            transport,
            plugin_name: plugin_name.into(),
            current: Mutex::new(None),
        }
    }

    fn entry(&self, origin: &str, project: &str) -> Arc<ConfigEntry> {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = current
            .as_ref()
            .filter(|e| e.project == project && e.origin == origin)
        {
            return Arc::clone(entry);
        }

        let url = config_url(origin, project, &self.plugin_name);
        let transport = Arc::clone(&self.transport);
        let entry = Arc::new(ConfigEntry {
            origin: origin.to_string(),
            project: project.to_string(),
            config: spawn_shared(format!("{project} config"), async move {
                fetch_config(transport, url?).await
            }),
        });
        *current = Some(Arc::clone(&entry));
        entry
    }

    /// Whether coverage is switched on for `project`. Any failure reads as
    /// disabled.
    pub async fn is_enabled_for_project(&self, origin: &str, project: &str) -> bool {
        let config = self.entry(origin, project).config.clone();
        match config.await {
            Ok(cfg) => cfg.enabled,
            Err(err) => {
                debug!(project, error = %err, "treating coverage as disabled");
                false
            }
        }
    }
}
