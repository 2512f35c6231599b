// Artifacts - per-test video/trace bookkeeping
//
// Artifacts are written under `<root>/<worker>/<attempt>/` so parallel
// workers and repeated run attempts never share a directory. Deletion and
// attachment only ever touch files confirmed to live inside this run's own
// namespace.

use crate::config::{Settings, sanitize_component};
use crate::error::CleanupError;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

/// Interval between size checks while a video is being finalised
pub const SETTLE_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Outcome of one test case
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
}

/// Decides whether a test's artifacts survive teardown
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Keep artifacts of passing tests as well
    pub keep_all: bool,
}

impl RetentionPolicy {
    pub fn should_keep(&self, outcome: Outcome) -> bool {
        self.keep_all || outcome == Outcome::Failed
    }
}

/// Kind of recorded artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Video,
    Trace,
}

impl ArtifactKind {
    pub fn extension(self) -> &'static str {
        match self {
            ArtifactKind::Video => "webm",
            ArtifactKind::Trace => "zip",
        }
    }
}

/// What teardown did with an artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Fate {
    Kept,
    Deleted,
    /// Deletion was attempted and failed, the file may still exist
    Orphaned,
}

/// One artifact produced by a test context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactRecord {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    pub fate: Fate,
    /// Copy placed in the results directory for report attachment
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached: Option<PathBuf>,
}

/// Directory layout for one worker/attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLayout {
    video_root: PathBuf,
    trace_root: PathBuf,
    results_dir: PathBuf,
    worker: String,
    attempt: String,
}

impl ArtifactLayout {
    pub fn new(
        video_root: impl Into<PathBuf>,
        trace_root: impl Into<PathBuf>,
        results_dir: impl Into<PathBuf>,
        worker: &str,
        attempt: &str,
    ) -> Self {
        Self {
            video_root: video_root.into(),
            trace_root: trace_root.into(),
            results_dir: results_dir.into(),
            worker: sanitize_component(worker),
            attempt: sanitize_component(attempt),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.video_dir.clone(),
            settings.trace_dir.clone(),
            settings.results_dir.clone(),
            &settings.worker_id,
            &settings.attempt_id,
        )
    }

    pub fn worker(&self) -> &str {
        &self.worker
    }

    pub fn attempt(&self) -> &str {
        &self.attempt
    }

    pub fn results_dir(&self) -> &Path {
        &self.results_dir
    }

    /// `<video_root>/<worker>/<attempt>`
    pub fn video_namespace(&self) -> PathBuf {
        self.video_root.join(&self.worker).join(&self.attempt)
    }

    /// `<trace_root>/<worker>/<attempt>`
    pub fn trace_namespace(&self) -> PathBuf {
        self.trace_root.join(&self.worker).join(&self.attempt)
    }

    pub fn namespace(&self, kind: ArtifactKind) -> PathBuf {
        match kind {
            ArtifactKind::Video => self.video_namespace(),
            ArtifactKind::Trace => self.trace_namespace(),
        }
    }

    /// Recording directory handed to the browser for one test's video
    pub fn video_dir_for(&self, slug: &str) -> PathBuf {
        self.video_namespace().join(slug)
    }

    pub fn trace_path_for(&self, slug: &str) -> PathBuf {
        self.trace_namespace().join(format!("{slug}.zip"))
    }

    /// File name of an artifact copy in the results directory
    pub fn attachment_name(&self, slug: &str, kind: ArtifactKind) -> String {
        format!(
            "{}-{}-{}.{}",
            self.worker,
            self.attempt,
            slug,
            kind.extension()
        )
    }

    /// Summary file for this worker/attempt in the results directory
    pub fn summary_path(&self) -> PathBuf {
        self.results_dir
            .join(format!("{}-{}-summary.json", self.worker, self.attempt))
    }
}

/// Turns a test name into a file-name-safe slug.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.trim().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.ends_with('_') && !slug.is_empty() {
            slug.push('_');
        }
    }
    let slug = slug.trim_end_matches('_');
    if slug.is_empty() {
        "test".to_string()
    } else {
        slug.to_string()
    }
}

/// Hands out artifact slugs that are unique within one worker/attempt.
///
/// Names that slugify alike ("Login: user" and "login user") get `_2`, `_3`
/// suffixes, so their recordings, traces and attachments never share a path.
#[derive(Debug, Default)]
pub struct SlugAllocator {
    issued: Mutex<HashSet<String>>,
}

impl SlugAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&self, name: &str) -> String {
        let base = slugify(name);
        let mut issued = self.issued.lock();
        let mut slug = base.clone();
        let mut n = 2;
        while issued.contains(&slug) {
            slug = format!("{base}_{n}");
            n += 1;
        }
        issued.insert(slug.clone());
        slug
    }
}

/// True when `path` resolves to a location inside `root`.
///
/// Both sides are canonicalised, so `..` segments and symlinks cannot escape.
/// Paths that do not exist are never considered inside.
pub async fn is_within(root: &Path, path: &Path) -> bool {
    let (Ok(root), Ok(path)) = (
        tokio::fs::canonicalize(root).await,
        tokio::fs::canonicalize(path).await,
    ) else {
        return false;
    };
    path.starts_with(&root) && path != root
}

/// Finds the video recorded into `dir`, newest first when several exist.
pub async fn find_video(dir: &Path) -> Result<Option<PathBuf>, CleanupError> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(CleanupError::io("read video dir", dir, e)),
    };

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| CleanupError::io("read video dir", dir, e))?
    {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("webm") {
            continue;
        }
        let modified = entry
            .metadata()
            .await
            .and_then(|m| m.modified())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        if newest.as_ref().is_none_or(|(time, _)| modified >= *time) {
            newest = Some((modified, path));
        }
    }

    Ok(newest.map(|(_, path)| path))
}

/// Polls until `path` has a non-zero size that is unchanged between two
/// consecutive checks, or `timeout` elapses.
///
/// Returns `true` when the size settled.
pub async fn wait_for_stable_size(path: &Path, timeout: Duration, interval: Duration) -> bool {
    let start = Instant::now();
    let mut last: Option<u64> = None;

    loop {
        let size = tokio::fs::metadata(path).await.ok().map(|m| m.len());
        match (last, size) {
            (Some(prev), Some(now)) if now > 0 && now == prev => return true,
            _ => last = size,
        }

        if start.elapsed() >= timeout {
            tracing::debug!(path = %path.display(), ?timeout, "Artifact size did not settle");
            return false;
        }
        tokio::time::sleep(interval).await;
    }
}

/// Deletes an artifact, but only when it lives under `namespace`.
///
/// A file that is already gone counts as deleted.
pub async fn discard(path: &Path, namespace: &Path) -> Result<(), CleanupError> {
    if tokio::fs::metadata(path).await.is_err() {
        return Ok(());
    }
    if !is_within(namespace, path).await {
        return Err(CleanupError::OutsideNamespace {
            path: path.to_path_buf(),
            root: namespace.to_path_buf(),
        });
    }
    match tokio::fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CleanupError::io("delete artifact", path, e)),
    }
}

/// Removes `dir` when it is empty and lives under `namespace`.
pub async fn remove_empty_dir(dir: &Path, namespace: &Path) -> Result<(), CleanupError> {
    if !is_within(namespace, dir).await {
        return Ok(());
    }
    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| CleanupError::io("read dir", dir, e))?;
    let has_entries = entries
        .next_entry()
        .await
        .map_err(|e| CleanupError::io("read dir", dir, e))?
        .is_some();
    if has_entries {
        return Ok(());
    }
    tokio::fs::remove_dir(dir)
        .await
        .map_err(|e| CleanupError::io("remove dir", dir, e))
}

/// Copies an artifact from `namespace` into `results_dir` under `name`.
pub async fn attach(
    path: &Path,
    namespace: &Path,
    results_dir: &Path,
    name: &str,
) -> Result<PathBuf, CleanupError> {
    if !is_within(namespace, path).await {
        return Err(CleanupError::OutsideNamespace {
            path: path.to_path_buf(),
            root: namespace.to_path_buf(),
        });
    }
    tokio::fs::create_dir_all(results_dir)
        .await
        .map_err(|e| CleanupError::io("create results dir", results_dir, e))?;
    let target = results_dir.join(name);
    tokio::fs::copy(path, &target)
        .await
        .map_err(|e| CleanupError::io("attach artifact", path, e))?;
    Ok(target)
}
