// Per-test context fixture
//
// Each test gets a fresh browser context (own cookies, storage, cache) with
// video recording into a namespaced directory and optional tracing. Teardown
// runs a fixed sequence of best-effort steps and then applies the retention
// policy to whatever artifacts were produced.

use crate::artifacts::{
    self, ArtifactKind, ArtifactLayout, ArtifactRecord, Fate, Outcome, RetentionPolicy,
    SETTLE_POLL_INTERVAL,
};
use crate::cleanup::best_effort;
use crate::config::Settings;
use crate::error::{CleanupError, Result};
use crate::session::Session;
use crate::trace::TraceRecorder;
use playwright_rs::{BrowserContext, BrowserContextOptions, Page, RecordVideo, Viewport};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Builds context options: viewport plus video recording into `video_dir`.
pub fn context_options(settings: &Settings, video_dir: Option<&Path>) -> BrowserContextOptions {
    let mut builder = BrowserContextOptions::builder().viewport(Viewport {
        width: settings.viewport_width,
        height: settings.viewport_height,
    });

    if let Some(dir) = video_dir {
        builder = builder.record_video(RecordVideo {
            dir: dir.to_string_lossy().into_owned(),
            size: Some(Viewport {
                width: settings.video_width,
                height: settings.video_height,
            }),
        });
    }

    builder.build()
}

/// What teardown did for one test
#[derive(Debug, Clone, Default, Serialize)]
pub struct TeardownReport {
    pub artifacts: Vec<ArtifactRecord>,
}

impl TeardownReport {
    pub fn get(&self, kind: ArtifactKind) -> Option<&ArtifactRecord> {
        self.artifacts.iter().find(|a| a.kind == kind)
    }
}

/// An isolated browsing context bound to one test
pub struct TestContext {
    name: String,
    slug: String,
    context: BrowserContext,
    page: Page,
    trace: Option<TraceRecorder>,
    video_dir: Option<PathBuf>,
    layout: ArtifactLayout,
    retention: RetentionPolicy,
    settings: Arc<Settings>,
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("name", &self.name)
            .field("slug", &self.slug)
            .field("tracing", &self.trace.is_some())
            .field("video_dir", &self.video_dir)
            .finish_non_exhaustive()
    }
}

impl TestContext {
    /// Creates the context and its page, and starts tracing when enabled.
    ///
    /// # Errors
    ///
    /// Fails when the session is closed or the context/page cannot be
    /// created. A failure to start tracing is logged and ignored.
    pub async fn open(session: &Session, name: &str) -> Result<Self> {
        let settings = session.settings().clone();
        let layout = session.layout().clone();
        let slug = session.artifact_slug(name);

        let video_dir = if settings.record_video {
            let dir = layout.video_dir_for(&slug);
            tokio::fs::create_dir_all(&dir).await?;
            Some(dir)
        } else {
            None
        };

        let browser = session.browser()?;
        let context = browser
            .new_context_with_options(context_options(&settings, video_dir.as_deref()))
            .await?;

        let page = match context.new_page().await {
            Ok(page) => page,
            Err(e) => {
                if let Err(close_err) = context.close().await {
                    tracing::warn!(error = %close_err, "Failed to close context after page error");
                }
                return Err(e.into());
            }
        };

        let trace = if settings.record_trace {
            best_effort("start tracing", TraceRecorder::start(&context, name)).await
        } else {
            None
        };

        tracing::debug!(test = name, tracing = trace.is_some(), "Test context opened");

        Ok(Self {
            name: name.to_string(),
            slug,
            context,
            page,
            trace,
            video_dir,
            layout,
            retention: session.retention(),
            settings,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unique artifact slug of this test within the worker/attempt
    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn context(&self) -> &BrowserContext {
        &self.context
    }

    pub fn is_tracing(&self) -> bool {
        self.trace.is_some()
    }

    /// Tears the context down and applies artifact retention.
    ///
    /// Steps, each best-effort:
    /// 1. close the page (flushes the recording)
    /// 2. stop tracing into the namespaced trace path
    /// 3. locate the recorded video
    /// 4. close the context (finalises the video file)
    /// 5. wait for the video size to settle
    /// 6. copy failure artifacts into the results directory
    /// 7. keep or delete each artifact
    pub async fn finish(self, outcome: Outcome) -> TeardownReport {
        let TestContext {
            name,
            slug,
            context,
            page,
            trace,
            video_dir,
            layout,
            retention,
            settings,
        } = self;

        best_effort("close page", async {
            page.close()
                .await
                .map_err(|e| CleanupError::playwright("close page", e))
        })
        .await;

        let trace_path = match trace {
            Some(recorder) => {
                best_effort("stop tracing", recorder.stop(&layout.trace_path_for(&slug))).await
            }
            None => None,
        };

        let video_path = match &video_dir {
            Some(dir) => best_effort("locate video", artifacts::find_video(dir))
                .await
                .flatten(),
            None => None,
        };

        best_effort("close context", async {
            context
                .close()
                .await
                .map_err(|e| CleanupError::playwright("close context", e))
        })
        .await;

        if let Some(video) = &video_path {
            let settled = artifacts::wait_for_stable_size(
                video,
                settings.artifact_timeout(),
                SETTLE_POLL_INTERVAL,
            )
            .await;
            if !settled {
                tracing::warn!(test = %name, video = %video.display(), "Video did not finish writing in time");
            }
        }

        let keep = retention.should_keep(outcome);
        let attach = outcome == Outcome::Failed && settings.attach_on_failure;

        let mut report = TeardownReport::default();
        for (kind, path) in [
            (ArtifactKind::Video, video_path),
            (ArtifactKind::Trace, trace_path),
        ] {
            let Some(path) = path else { continue };
            let record = settle_artifact(&layout, &slug, kind, path, keep, attach).await;
            report.artifacts.push(record);
        }

        if let Some(dir) = &video_dir {
            best_effort(
                "remove empty video dir",
                artifacts::remove_empty_dir(dir, &layout.video_namespace()),
            )
            .await;
        }

        tracing::debug!(test = %name, ?outcome, artifacts = report.artifacts.len(), "Test context closed");
        report
    }
}

/// Attaches and/or deletes one artifact according to the retention decision.
async fn settle_artifact(
    layout: &ArtifactLayout,
    slug: &str,
    kind: ArtifactKind,
    path: PathBuf,
    keep: bool,
    attach: bool,
) -> ArtifactRecord {
    let namespace = layout.namespace(kind);

    let attached = if attach {
        best_effort(
            "attach artifact",
            artifacts::attach(
                &path,
                &namespace,
                layout.results_dir(),
                &layout.attachment_name(slug, kind),
            ),
        )
        .await
    } else {
        None
    };

    let fate = if keep {
        Fate::Kept
    } else if best_effort("delete artifact", artifacts::discard(&path, &namespace))
        .await
        .is_some()
    {
        Fate::Deleted
    } else {
        Fate::Orphaned
    };

    ArtifactRecord {
        kind,
        path,
        fate,
        attached,
    }
}
