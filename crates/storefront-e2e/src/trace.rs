// Trace recording - execution traces for a browser context
//
// playwright-rs creates the context's `Tracing` protocol object but does not
// expose start/stop on it, so the recorder talks to it over the library's
// protocol channel, the same way the library's own objects send RPCs.
//
// Protocol flow:
//   Tracing.tracingStart      { name, snapshots, screenshots }
//   Tracing.tracingStartChunk { title }
//   Tracing.tracingStopChunk  { mode: "archive" }  -> { artifact: { guid } }
//   Artifact.saveAs           { path }
//   Artifact.delete
//   Tracing.tracingStop

use crate::error::CleanupError;
use playwright_rs::BrowserContext;
use playwright_rs::server::channel::Channel;
use playwright_rs::server::channel_owner::ChannelOwner;
use serde::Deserialize;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Deserialize)]
struct GuidRef {
    guid: String,
}

#[derive(Debug, Deserialize)]
struct StopChunkResponse {
    artifact: Option<GuidRef>,
}

/// Reads the tracing object's GUID from a context initializer.
fn tracing_guid(initializer: &Value) -> Option<&str> {
    initializer.get("tracing")?.get("guid")?.as_str()
}

/// An in-progress execution trace for one browser context
pub struct TraceRecorder {
    channel: Channel,
    context: BrowserContext,
}

impl TraceRecorder {
    /// Starts tracing with DOM snapshots and screenshots.
    ///
    /// # Errors
    ///
    /// Returns a [`CleanupError`] when the context carries no tracing object
    /// or the server rejects the start; callers treat this as non-fatal.
    pub async fn start(context: &BrowserContext, title: &str) -> Result<Self, CleanupError> {
        let guid = tracing_guid(ChannelOwner::initializer(context)).ok_or_else(|| {
            CleanupError::Protocol("browser context has no tracing object".to_string())
        })?;
        let channel = Channel::new(Arc::from(guid), ChannelOwner::connection(context));

        channel
            .send_no_result(
                "tracingStart",
                json!({ "name": title, "snapshots": true, "screenshots": true }),
            )
            .await
            .map_err(|e| CleanupError::playwright("start tracing", e))?;
        let _: Value = channel
            .send("tracingStartChunk", json!({ "title": title }))
            .await
            .map_err(|e| CleanupError::playwright("start trace chunk", e))?;

        tracing::debug!(title, "Tracing started");
        Ok(Self {
            channel,
            context: context.clone(),
        })
    }

    /// Stops tracing and writes the archive to `path`.
    ///
    /// Must run before the context is closed.
    pub async fn stop(self, path: &Path) -> Result<PathBuf, CleanupError> {
        let saved = self.save_chunk(path).await;

        // The tracing object must be stopped even when saving the chunk failed
        let stopped = self
            .channel
            .send_no_result("tracingStop", json!({}))
            .await
            .map_err(|e| CleanupError::playwright("stop tracing", e));

        let path = saved?;
        stopped?;
        Ok(path)
    }

    async fn save_chunk(&self, path: &Path) -> Result<PathBuf, CleanupError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CleanupError::io("create trace dir", parent, e))?;
        }
        let path_str = path
            .to_str()
            .ok_or_else(|| CleanupError::Protocol(format!("non UTF-8 trace path {}", path.display())))?;

        let response: StopChunkResponse = self
            .channel
            .send("tracingStopChunk", json!({ "mode": "archive" }))
            .await
            .map_err(|e| CleanupError::playwright("stop trace chunk", e))?;
        let artifact = response.artifact.ok_or_else(|| {
            CleanupError::Protocol("tracingStopChunk returned no artifact".to_string())
        })?;

        let artifact = Channel::new(
            Arc::from(artifact.guid.as_str()),
            ChannelOwner::connection(&self.context),
        );
        artifact
            .send_no_result("saveAs", json!({ "path": path_str }))
            .await
            .map_err(|e| CleanupError::playwright("save trace", e))?;
        if let Err(e) = artifact.send_no_result("delete", json!({})).await {
            tracing::debug!(error = %e, "Could not delete server-side trace artifact");
        }

        tracing::debug!(path = %path.display(), "Trace saved");
        Ok(path.to_path_buf())
    }
}
