use briefly_export::ExportedDocument;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Idle,
    Searching,
    Extracting,
    Summarizing,
    Exporting,
    Done,
    Failed,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Searching => "searching",
            Self::Extracting => "extracting",
            Self::Summarizing => "summarizing",
            Self::Exporting => "exporting",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the person who asked should read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub message: String,
    pub remedy: Option<String>,
    /// Diagnostic cause, already free of secrets.
    pub cause: Option<String>,
}

impl Failure {
    pub(crate) fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
            remedy: None,
            cause: None,
        }
    }

    pub(crate) fn remedy(mut self, remedy: &str) -> Self {
        self.remedy = Some(remedy.to_string());
        self
    }

    pub(crate) fn cause(mut self, cause: impl Into<String>) -> Self {
        self.cause = Some(cause.into());
        self
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(cause) = &self.cause {
            write!(f, " {cause}")?;
        }
        if let Some(remedy) = &self.remedy {
            write!(f, " {remedy}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed {
        report: String,
        documents: Vec<ExportedDocument>,
    },
    Failed {
        /// Stage that was active when the run failed.
        at: Stage,
        failure: Failure,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    pub search_results: usize,
    pub sources_attempted: usize,
    pub sources_used: usize,
    pub summary_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageTiming {
    pub stage: Stage,
    pub elapsed: Duration,
}

/// Result of one run, rendered by whatever presents it.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Always terminal: `Done` or `Failed`.
    pub stage: Stage,
    pub outcome: RunOutcome,
    pub stats: RunStats,
    pub timings: Vec<StageTiming>,
}

impl RunReport {
    pub fn is_success(&self) -> bool {
        self.stage == Stage::Done
    }

    pub fn report_text(&self) -> Option<&str> {
        match &self.outcome {
            RunOutcome::Completed { report, .. } => Some(report),
            RunOutcome::Failed { .. } => None,
        }
    }

    pub fn failure(&self) -> Option<&Failure> {
        match &self.outcome {
            RunOutcome::Failed { failure, .. } => Some(failure),
            RunOutcome::Completed { .. } => None,
        }
    }

    /// "N/M sources used" line for display.
    pub fn sources_line(&self) -> String {
        format!(
            "{}/{} sources used",
            self.stats.sources_used, self.stats.sources_attempted
        )
    }
}
