use std::{path::Path, sync::Arc};

use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    config::EngineConfig,
    data::{
        action::Action,
        catalog::SchemaCatalog,
        session::{Session, SessionError},
    },
};

/// Errors raised by the batch composition workflow.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Everything needed to compose one event without interaction.
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    /// Root schema key, e.g. `event`.
    pub key: String,
    /// Schema version; the latest when `None`.
    pub version: Option<String>,
    /// Event type to pre-select.
    pub type_name: Option<String>,
    /// Actions applied in order after the session opens.
    pub actions: Vec<Action>,
}

/// Open a session for `request` and apply its actions in order.
///
/// Actions naming unknown fields or values are logged and skipped, so the
/// returned session reflects every action that could be applied.
///
/// # Errors
///
/// Returns an error when the schema cannot be opened.
pub async fn compose(
    catalog: Arc<dyn SchemaCatalog>,
    config: EngineConfig,
    request: &ComposeRequest,
) -> Result<Session, RunError> {
    let mut session = Session::open(
        catalog,
        config,
        &request.key,
        request.version.as_deref(),
        request.type_name.as_deref(),
    )
    .await?;

    let mut skipped = 0;
    for action in &request.actions {
        if !session.apply(action).await {
            skipped += 1;
        }
    }
    if skipped > 0 {
        warn!("{skipped} of {} actions skipped", request.actions.len());
    }
    Ok(session)
}

/// Write `event` as pretty JSON to `path`.
pub async fn write_event(path: impl AsRef<Path>, event: &Value) -> Result<(), RunError> {
    let path = path.as_ref();
    let content = serde_json::to_string_pretty(event)?;
    tokio::fs::write(path, content)
        .await
        .map_err(|source| RunError::Write {
            path: path.display().to_string(),
            source,
        })?;
    info!("event written to {}", path.display());
    Ok(())
}
