use serde::Serialize;

use crate::pipeline::{ProcessState, ProcessStatus};
use crate::tui::dashboard::{DashboardOutcome, RuntimeDiagnostics};
use crate::ui::{KeyValue, MessageBlock, NoticeLevel, Renderer, TableSpec, UiResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    pub index: usize,
    pub name: String,
    pub status: ProcessStatus,
    pub returncode: i32,
}

impl From<&ProcessState> for ProcessSummary {
    fn from(state: &ProcessState) -> Self {
        Self {
            index: state.index(),
            name: state.name().to_owned(),
            status: state.status(),
            returncode: state.returncode(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSummary {
    pub elapsed_ms: u128,
    pub frames: usize,
    pub keypresses: usize,
    pub snapshots_applied: usize,
    pub box_redraws: usize,
    pub traces: Vec<String>,
}

impl From<&RuntimeDiagnostics> for DiagnosticsSummary {
    fn from(diagnostics: &RuntimeDiagnostics) -> Self {
        Self {
            elapsed_ms: diagnostics.elapsed_ms(),
            frames: diagnostics.frame_count(),
            keypresses: diagnostics.keypress_count(),
            snapshots_applied: diagnostics.snapshots_applied(),
            box_redraws: diagnostics.box_redraws(),
            traces: diagnostics.traces(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineSummary {
    pub listen_address: String,
    pub peer: Option<String>,
    pub accepted: usize,
    pub rejected: usize,
    pub listener_error: Option<String>,
    pub processes: Vec<ProcessSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<DiagnosticsSummary>,
}

impl PipelineSummary {
    pub fn from_outcome(outcome: &DashboardOutcome) -> Self {
        let (peer, accepted, rejected, listener_error) = match &outcome.listener {
            Ok(report) => (
                report.peer.map(|peer| peer.to_string()),
                report.accepted,
                report.rejected,
                None,
            ),
            Err(error) => (None, 0, 0, Some(error.to_string())),
        };
        Self {
            listen_address: outcome.listen_address.to_string(),
            peer,
            accepted,
            rejected,
            listener_error,
            processes: outcome.processes.iter().map(ProcessSummary::from).collect(),
            diagnostics: outcome
                .diagnostics
                .enabled()
                .then(|| DiagnosticsSummary::from(&outcome.diagnostics)),
        }
    }
}

pub fn render_summary_text<R: Renderer>(renderer: &mut R, summary: &PipelineSummary) -> UiResult<()> {
    renderer.section("Pipeline Results")?;
    let rows = summary
        .processes
        .iter()
        .map(|process| {
            let status = match process.status {
                ProcessStatus::Unset => "-".to_owned(),
                status => status.label().to_owned(),
            };
            vec![
                process.index.to_string(),
                process.name.clone(),
                status,
                process.returncode.to_string(),
            ]
        })
        .collect::<Vec<Vec<String>>>();
    renderer.table(
        &TableSpec::new(
            vec![
                "#".to_owned(),
                "process".to_owned(),
                "status".to_owned(),
                "returncode".to_owned(),
            ],
            rows,
        )
        .with_right_aligned(&[0, 3]),
    )?;

    renderer.key_values(&[
        KeyValue::new("listener", summary.listen_address.clone()),
        KeyValue::new(
            "client",
            summary
                .peer
                .clone()
                .unwrap_or_else(|| "<never connected>".to_owned()),
        ),
        KeyValue::new("accepted", summary.accepted.to_string()),
        KeyValue::new("rejected", summary.rejected.to_string()),
    ])?;
    if let Some(error) = &summary.listener_error {
        renderer.warning_block(&MessageBlock::new("Status listener failed", error.clone()))?;
    }

    if let Some(diagnostics) = &summary.diagnostics {
        renderer.text("")?;
        renderer.section("Diagnostics")?;
        renderer.key_values(&[
            KeyValue::new("elapsed", format!("{}ms", diagnostics.elapsed_ms)),
            KeyValue::new("frames", diagnostics.frames.to_string()),
            KeyValue::new("keypresses", diagnostics.keypresses.to_string()),
            KeyValue::new("snapshots", diagnostics.snapshots_applied.to_string()),
            KeyValue::new("box redraws", diagnostics.box_redraws.to_string()),
        ])?;
        renderer.bullet_list("traces", &diagnostics.traces)?;
    }

    let failed = summary
        .processes
        .iter()
        .filter(|process| process.status == ProcessStatus::Failed)
        .count();
    if failed > 0 {
        renderer.notice(
            NoticeLevel::Error,
            &format!("{failed} process(es) reported FAILED"),
        )?;
    }
    Ok(())
}

pub fn render_summary_json(summary: &PipelineSummary) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(summary)
}
