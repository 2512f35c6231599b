// Suite runner - sequential scenarios on one session-scoped browser
//
// A worker launches one browser, runs each registered case in a fresh
// context, and closes the browser once at the end no matter how the cases
// went. Case bodies run in their own task so a panic is recorded as a
// failure and the context is still torn down.

use crate::artifacts::{ArtifactLayout, ArtifactRecord, Outcome};
use crate::cleanup::best_effort;
use crate::config::Settings;
use crate::credentials::Credentials;
use crate::error::{CleanupError, Error, Result};
use crate::report;
use crate::session::Session;
use playwright_rs::Page;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

/// Everything a case body gets to work with
#[derive(Clone)]
pub struct Case {
    pub page: Page,
    pub settings: Arc<Settings>,
    pub credentials: Arc<Credentials>,
}

type CaseFuture = Pin<Box<dyn Future<Output = Result<()>> + Send>>;
type CaseFn = Box<dyn FnOnce(Case) -> CaseFuture + Send>;

/// Result of one case
#[derive(Debug, Clone, Serialize)]
pub struct CaseResult {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub artifacts: Vec<ArtifactRecord>,
}

/// Results of one worker/attempt
#[derive(Debug, Clone, Serialize)]
pub struct SuiteSummary {
    pub worker: String,
    pub attempt: String,
    pub browser: String,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<CaseResult>,
}

impl SuiteSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// A list of named scenarios sharing one browser session
pub struct Suite {
    settings: Arc<Settings>,
    credentials: Arc<Credentials>,
    cases: Vec<(String, CaseFn)>,
}

impl Suite {
    pub fn new(settings: Settings, credentials: Credentials) -> Self {
        Self {
            settings: Arc::new(settings),
            credentials: Arc::new(credentials),
            cases: Vec::new(),
        }
    }

    /// Registers a case.
    pub fn case<F, Fut>(mut self, name: &str, body: F) -> Self
    where
        F: FnOnce(Case) -> Fut + Send + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let body: CaseFn = Box::new(move |case| Box::pin(body(case)));
        self.cases.push((name.to_string(), body));
        self
    }

    /// Keeps only cases whose name contains `filter`.
    pub fn filter(mut self, filter: Option<&str>) -> Self {
        if let Some(filter) = filter {
            self.cases.retain(|(name, _)| name.contains(filter));
        }
        self
    }

    pub fn case_names(&self) -> Vec<&str> {
        self.cases.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// Runs every case and returns the summary.
    ///
    /// # Errors
    ///
    /// Only fatal setup errors (unsupported browser, launch failure) are
    /// returned; case failures are reported in the summary.
    pub async fn run(self) -> Result<SuiteSummary> {
        let started = Instant::now();
        let session = Session::launch(self.settings.clone()).await?;

        let mut results = Vec::with_capacity(self.cases.len());
        for (name, body) in self.cases {
            let result = run_case(&session, &self.credentials, &name, body).await;
            match &result.error {
                None => tracing::info!(case = %name, duration_ms = result.duration_ms, "PASSED"),
                Some(error) => tracing::error!(case = %name, %error, "FAILED"),
            }
            results.push(result);
        }

        session.close().await;

        let passed = results
            .iter()
            .filter(|r| r.outcome == Outcome::Passed)
            .count();
        let summary = SuiteSummary {
            worker: session.layout().worker().to_string(),
            attempt: session.layout().attempt().to_string(),
            browser: session.kind().to_string(),
            total: results.len(),
            passed,
            failed: results.len() - passed,
            duration_ms: started.elapsed().as_millis() as u64,
            results,
        };

        tracing::info!(
            total = summary.total,
            passed = summary.passed,
            failed = summary.failed,
            "Suite finished"
        );

        best_effort("write summary", write_summary(session.layout(), &summary)).await;
        if self.settings.generate_report {
            best_effort("generate report", report::generate(&self.settings)).await;
        }

        Ok(summary)
    }
}

async fn run_case(
    session: &Session,
    credentials: &Arc<Credentials>,
    name: &str,
    body: CaseFn,
) -> CaseResult {
    let started = Instant::now();
    tracing::info!(case = name, "Running");

    let ctx = match session.new_test(name).await {
        Ok(ctx) => ctx,
        Err(e) => {
            return CaseResult {
                name: name.to_string(),
                outcome: Outcome::Failed,
                duration_ms: started.elapsed().as_millis() as u64,
                error: Some(format!("context setup failed: {e}")),
                artifacts: Vec::new(),
            };
        }
    };

    let case = Case {
        page: ctx.page().clone(),
        settings: session.settings().clone(),
        credentials: credentials.clone(),
    };
    let outcome = match tokio::spawn(body(case)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e),
        Err(join_err) if join_err.is_panic() => {
            Err(Error::Panicked(panic_message(join_err.into_panic())))
        }
        Err(join_err) => Err(Error::Panicked(join_err.to_string())),
    };

    let (verdict, error) = match outcome {
        Ok(()) => (Outcome::Passed, None),
        Err(e) => (Outcome::Failed, Some(e.to_string())),
    };
    let report = ctx.finish(verdict).await;

    CaseResult {
        name: name.to_string(),
        outcome: verdict,
        duration_ms: started.elapsed().as_millis() as u64,
        error,
        artifacts: report.artifacts,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

async fn write_summary(layout: &ArtifactLayout, summary: &SuiteSummary) -> std::result::Result<(), CleanupError> {
    let path = layout.summary_path();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CleanupError::io("create results dir", parent, e))?;
    }
    let json = serde_json::to_vec_pretty(summary)
        .map_err(|e| CleanupError::Protocol(format!("serialize summary: {e}")))?;
    tokio::fs::write(&path, json)
        .await
        .map_err(|e| CleanupError::io("write summary", &path, e))?;
    tracing::debug!(path = %path.display(), "Summary written");
    Ok(())
}
