pub mod layout;
pub mod state;

pub use layout::{BoxGeometry, GridLayout, LayoutSpec};
pub use state::{ProcessState, ProcessStatus, UNKNOWN_RETURNCODE};

pub const DEFAULT_PIPELINE_ENV: &str = "PROCESSVIEW_PIPELINE";
pub const DEFAULT_ENTRY_SEPARATOR: &str = ":::";
pub const DEFAULT_NAME_SEPARATOR: &str = "###";

/// One process as announced by the orchestrator: `<name>###<metadata>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineEntry {
    pub name: String,
    pub metadata: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSeparators {
    pub entry: String,
    pub name: String,
}

impl Default for PipelineSeparators {
    fn default() -> Self {
        Self {
            entry: DEFAULT_ENTRY_SEPARATOR.to_owned(),
            name: DEFAULT_NAME_SEPARATOR.to_owned(),
        }
    }
}

pub fn decode_pipeline(raw: &str, separators: &PipelineSeparators) -> Vec<PipelineEntry> {
    raw.trim()
        .split(separators.entry.as_str())
        .filter(|entry| !entry.trim().is_empty())
        .map(|entry| match entry.split_once(separators.name.as_str()) {
            Some((name, metadata)) => PipelineEntry {
                name: name.trim().to_owned(),
                metadata: metadata.to_owned(),
            },
            None => PipelineEntry {
                name: entry.trim().to_owned(),
                metadata: String::new(),
            },
        })
        .collect()
}

pub fn initial_states(entries: &[PipelineEntry]) -> Vec<ProcessState> {
    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| ProcessState::new(index, entry.name.clone()))
        .collect()
}
