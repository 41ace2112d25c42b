use crate::report::{Failure, RunOutcome, RunReport, RunStats, Stage, StageTiming};
use briefly_common::{Credentials, LlmConfig};
use briefly_config::BrieflyConfig;
use briefly_export::ReportExporter;
use briefly_llm::retry::RetryPolicy;
use briefly_llm::summary::ContextBudget;
use briefly_llm::{build_llm_client, FailureKind, LengthPreference, SummaryGenerator};
use briefly_web::{ContentFetcher, FetchSettings, SearchClient};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

const BLANK_QUERY: &str = "Please enter a research query.";
const NO_RESULTS: &str = "No search results found.";
const NO_RESULTS_REMEDY: &str = "Please try a different query.";
const SUMMARY_FAILED: &str = "Could not generate the report.";
const EXPORT_FAILED: &str = "Could not create the report documents.";
const EXPORT_REMEDY: &str = "Please try again.";

/// Sequences the research stages for one query at a time.
pub struct Orchestrator {
    search: SearchClient,
    fetcher: ContentFetcher,
    summarizer: SummaryGenerator,
    exporter: ReportExporter,
}

/// Live view of a run, kept outside the stage future so a panic does not
/// lose it.
struct Progress {
    stage: Stage,
    stats: RunStats,
    timings: Vec<StageTiming>,
    entered: Instant,
}

impl Progress {
    fn new() -> Self {
        Self {
            stage: Stage::Idle,
            stats: RunStats::default(),
            timings: Vec::new(),
            entered: Instant::now(),
        }
    }

    fn enter(&mut self, next: Stage) {
        let now = Instant::now();
        if self.stage != Stage::Idle {
            self.timings.push(StageTiming {
                stage: self.stage,
                elapsed: now.duration_since(self.entered),
            });
        }
        tracing::info!(
            target: "pipeline",
            from = %self.stage,
            to = %next,
            "pipeline.transition"
        );
        self.stage = next;
        self.entered = now;
    }
}

fn lock(progress: &Mutex<Progress>) -> MutexGuard<'_, Progress> {
    progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl Orchestrator {
    pub fn new(search: SearchClient, fetcher: ContentFetcher, summarizer: SummaryGenerator) -> Self {
        Self {
            search,
            fetcher,
            summarizer,
            exporter: ReportExporter,
        }
    }

    /// Wire every component from loaded configuration.
    pub fn from_config(config: &BrieflyConfig, llm: &LlmConfig) -> briefly_common::Result<Self> {
        let search = match &config.search.endpoint {
            Some(endpoint) => SearchClient::with_endpoint(endpoint)?,
            None => SearchClient::new()?,
        }
        .with_engine(config.search.engine.clone())
        .with_num_results(config.search.num_results);

        let fetcher = ContentFetcher::new(FetchSettings {
            timeout: Duration::from_secs(config.fetch.timeout_secs),
            user_agent: config.fetch.user_agent.clone(),
            concurrency: config.fetch.concurrency,
            min_fragment_chars: config.fetch.min_fragment_chars,
        })?;

        let summary = &config.summary;
        let summarizer = SummaryGenerator::new(build_llm_client(llm)?)
            .with_policy(RetryPolicy::new(
                summary.max_attempts,
                Duration::from_millis(summary.base_delay_ms),
            ))
            .with_budget(ContextBudget {
                context_window_tokens: summary.context_window_tokens,
                safety_buffer_tokens: summary.safety_buffer_tokens,
                max_input_chars: summary.max_input_chars,
                ..ContextBudget::default()
            });

        Ok(Self::new(search, fetcher, summarizer))
    }

    /// Run all stages for `query`. Never panics and never returns early
    /// without a terminal [`RunReport`].
    pub async fn run(
        &self,
        query: &str,
        length: LengthPreference,
        credentials: &Credentials,
    ) -> RunReport {
        let progress = Mutex::new(Progress::new());
        let started = Instant::now();

        let result = AssertUnwindSafe(self.run_stages(query, length, credentials, &progress))
            .catch_unwind()
            .await;

        let mut p = lock(&progress);
        let at = p.stage;
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(failure)) => RunOutcome::Failed { at, failure },
            Err(payload) => {
                let detail = panic_message(payload.as_ref());
                tracing::error!(target: "pipeline", stage = %at, detail = %detail, "pipeline.panic");
                RunOutcome::Failed {
                    at,
                    failure: Failure::new(FailureKind::Unexpected.user_message())
                        .remedy(FailureKind::Unexpected.remedy())
                        .cause(detail),
                }
            }
        };

        let terminal = match outcome {
            RunOutcome::Completed { .. } => Stage::Done,
            RunOutcome::Failed { .. } => Stage::Failed,
        };
        p.enter(terminal);

        match &outcome {
            RunOutcome::Completed { report, .. } => tracing::info!(
                target: "pipeline",
                report_chars = report.len(),
                sources_used = p.stats.sources_used,
                sources_attempted = p.stats.sources_attempted,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "pipeline.done"
            ),
            RunOutcome::Failed { at, failure } => tracing::warn!(
                target: "pipeline",
                at = %at,
                message = %failure.message,
                cause = failure.cause.as_deref().unwrap_or(""),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "pipeline.failed"
            ),
        }

        RunReport {
            stage: terminal,
            outcome,
            stats: p.stats,
            timings: std::mem::take(&mut p.timings),
        }
    }

    async fn run_stages(
        &self,
        query: &str,
        length: LengthPreference,
        credentials: &Credentials,
        progress: &Mutex<Progress>,
    ) -> Result<RunOutcome, Failure> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Failure::new(BLANK_QUERY));
        }

        lock(progress).enter(Stage::Searching);
        let found = self.search.search(query, &credentials.search_api_key).await;
        lock(progress).stats.search_results = found.results.len();
        if found.results.is_empty() {
            let mut failure = Failure::new(NO_RESULTS).remedy(NO_RESULTS_REMEDY);
            if let Some(e) = found.error {
                failure = failure.cause(e.to_string());
            }
            return Err(failure);
        }

        lock(progress).enter(Stage::Extracting);
        let content = self.fetcher.extract(&found.results).await;
        {
            let mut p = lock(progress);
            p.stats.sources_attempted = content.sources_attempted;
            p.stats.sources_used = content.sources_used;
            p.enter(Stage::Summarizing);
        }

        let report = match self.summarizer.summarize(&content.text, length).await {
            Ok(summary) => {
                lock(progress).stats.summary_attempts = summary.attempts;
                summary.text
            }
            Err(failure) => {
                lock(progress).stats.summary_attempts = failure.attempts;
                return Err(Failure::new(SUMMARY_FAILED)
                    .remedy(failure.remedy())
                    .cause(failure.user_message()));
            }
        };

        lock(progress).enter(Stage::Exporting);
        let documents = self.exporter.export_all(&report).map_err(|e| {
            Failure::new(EXPORT_FAILED)
                .remedy(EXPORT_REMEDY)
                .cause(e.to_string())
        })?;

        Ok(RunOutcome::Completed { report, documents })
    }
}
