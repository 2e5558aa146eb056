use std::io::IsTerminal;

use crate::config::{ConfigError, DashboardConfig};
use crate::pipeline::{decode_pipeline, PipelineEntry};
use crate::tui::dashboard::{run_dashboard, DashboardError};
use crate::ui::theme::resolve_color_enabled;
use crate::ui::{OutputMode, PlainRenderer, UiError};
use crate::RunArgs;

mod render;

pub use render::{render_summary_json, render_summary_text, PipelineSummary, ProcessSummary};

#[derive(Debug)]
pub enum RunnerError {
    Config(ConfigError),
    PipelineMissing { env: String },
    PipelineEmpty { env: String },
    Dashboard(DashboardError),
    Ui(UiError),
    Json(serde_json::Error),
}

impl std::fmt::Display for RunnerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunnerError::Config(err) => write!(f, "{err}"),
            RunnerError::PipelineMissing { env } => {
                write!(f, "no pipeline given: set {env} or pass --pipeline")
            }
            RunnerError::PipelineEmpty { env } => {
                write!(f, "pipeline from {env} decodes to zero processes")
            }
            RunnerError::Dashboard(err) => write!(f, "{err}"),
            RunnerError::Ui(err) => write!(f, "{err}"),
            RunnerError::Json(err) => write!(f, "failed to encode summary: {err}"),
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<ConfigError> for RunnerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<DashboardError> for RunnerError {
    fn from(value: DashboardError) -> Self {
        Self::Dashboard(value)
    }
}

impl From<UiError> for RunnerError {
    fn from(value: UiError) -> Self {
        Self::Ui(value)
    }
}

impl From<serde_json::Error> for RunnerError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl RunnerError {
    /// Suggestion printed under the error block, when there is an obvious fix.
    pub fn hint(&self) -> Option<String> {
        match self {
            RunnerError::PipelineMissing { env } | RunnerError::PipelineEmpty { env } => Some(
                format!("Export {env}=\"name###meta:::name###meta\" from the orchestrator"),
            ),
            RunnerError::Dashboard(DashboardError::NoTerminal) => {
                Some("Run processview from an interactive terminal".to_owned())
            }
            RunnerError::Dashboard(DashboardError::Listener(_)) => {
                Some("Pick a free port with --port or PROCESSVIEW_PORT".to_owned())
            }
            _ => None,
        }
    }
}

/// Resolves configuration and the pipeline, runs the dashboard and returns the
/// rendered exit summary.
pub fn run(args: RunArgs) -> Result<String, RunnerError> {
    let config = DashboardConfig::resolve(&args)?;
    let entries = resolve_pipeline(&args, &config, |name| std::env::var(name).ok())?;
    let outcome = run_dashboard(entries, &config)?;
    let summary = PipelineSummary::from_outcome(&outcome);

    if args.output_json {
        return render_summary_json(&summary).map_err(RunnerError::from);
    }
    let color_enabled =
        resolve_color_enabled(OutputMode::from_env(), std::io::stdout().is_terminal());
    let mut renderer = PlainRenderer::new(Vec::<u8>::new(), color_enabled);
    render_summary_text(&mut renderer, &summary)?;
    Ok(String::from_utf8_lossy(&renderer.into_inner()).into_owned())
}

pub fn resolve_pipeline<F>(
    args: &RunArgs,
    config: &DashboardConfig,
    lookup: F,
) -> Result<Vec<PipelineEntry>, RunnerError>
where
    F: Fn(&str) -> Option<String>,
{
    let env = config.pipeline.env.clone();
    let raw = match &args.pipeline {
        Some(raw) => raw.clone(),
        None => lookup(&env).ok_or_else(|| RunnerError::PipelineMissing { env: env.clone() })?,
    };
    let entries = decode_pipeline(&raw, &config.separators());
    if entries.is_empty() {
        return Err(RunnerError::PipelineEmpty { env });
    }
    Ok(entries)
}
