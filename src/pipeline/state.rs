use std::num::IntErrorKind;

/// Returncode stored until the orchestrator reports a valid integer.
pub const UNKNOWN_RETURNCODE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProcessStatus {
    #[default]
    Unset,
    Ready,
    Running,
    Complete,
    Failed,
    Waiting,
    Block,
}

impl ProcessStatus {
    /// Fixed ordering of the wire statuses; colour indices are derived from it.
    pub const ORDERED: [ProcessStatus; 6] = [
        ProcessStatus::Ready,
        ProcessStatus::Running,
        ProcessStatus::Complete,
        ProcessStatus::Failed,
        ProcessStatus::Waiting,
        ProcessStatus::Block,
    ];

    /// Parses an orchestrator token such as `running` or `COMPLETE=0`.
    /// Anything unrecognised becomes [`ProcessStatus::Unset`].
    pub fn parse(token: &str) -> Self {
        let normalized = normalize_status_token(token);
        Self::ORDERED
            .into_iter()
            .find(|status| status.label() == normalized)
            .unwrap_or(ProcessStatus::Unset)
    }

    pub fn label(self) -> &'static str {
        match self {
            ProcessStatus::Unset => "",
            ProcessStatus::Ready => "READY",
            ProcessStatus::Running => "RUNNING",
            ProcessStatus::Complete => "COMPLETE",
            ProcessStatus::Failed => "FAILED",
            ProcessStatus::Waiting => "WAITING",
            ProcessStatus::Block => "BLOCK",
        }
    }

    /// Palette index: position in [`ProcessStatus::ORDERED`] plus one, `0` when unset.
    pub fn colour(self) -> u8 {
        Self::ORDERED
            .iter()
            .position(|status| *status == self)
            .map(|position| position as u8 + 1)
            .unwrap_or(0)
    }
}

pub fn normalize_status_token(token: &str) -> String {
    let trimmed = token.trim();
    let head = trimmed
        .split_once('=')
        .map(|(head, _)| head)
        .unwrap_or(trimmed);
    head.trim().to_ascii_uppercase()
}

/// Integers outside `i32` saturate so their sign survives; anything else is unknown.
pub fn validate_returncode(token: &str) -> i32 {
    match token.trim().parse::<i32>() {
        Ok(returncode) => returncode,
        Err(error) => match error.kind() {
            IntErrorKind::PosOverflow => i32::MAX,
            IntErrorKind::NegOverflow => i32::MIN,
            _ => UNKNOWN_RETURNCODE,
        },
    }
}

/// A completed process with a positive returncode is reported as failed.
pub fn validate_status(status: ProcessStatus, returncode: i32) -> ProcessStatus {
    if status == ProcessStatus::Complete && returncode > 0 {
        ProcessStatus::Failed
    } else {
        status
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessState {
    index: usize,
    name: String,
    status: ProcessStatus,
    returncode: i32,
}

impl ProcessState {
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            status: ProcessStatus::Unset,
            returncode: UNKNOWN_RETURNCODE,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> ProcessStatus {
        validate_status(self.status, self.returncode)
    }

    pub fn returncode(&self) -> i32 {
        self.returncode
    }

    pub fn colour(&self) -> u8 {
        self.status().colour()
    }

    pub fn set_status(&mut self, token: &str) {
        self.status = validate_status(ProcessStatus::parse(token), self.returncode);
    }

    pub fn set_returncode(&mut self, token: &str) {
        self.returncode = validate_returncode(token);
        self.status = validate_status(self.status, self.returncode);
    }

    /// Applies one snapshot pair. The returncode must land before the status so the
    /// completion check sees the value reported alongside it.
    pub fn update(&mut self, status: &str, returncode: &str) -> bool {
        let before = (self.status(), self.returncode);
        self.set_returncode(returncode);
        self.set_status(status);
        before != (self.status(), self.returncode)
    }

    /// Text shown inside the status box: the returncode once one is known.
    pub fn display_text(&self) -> String {
        if self.returncode == UNKNOWN_RETURNCODE {
            String::new()
        } else {
            self.returncode.to_string()
        }
    }
}
