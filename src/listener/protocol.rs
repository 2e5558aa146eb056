use std::fmt::{Display, Formatter};

pub const BATCH_SEPARATOR: &str = "|||";
pub const FIELD_SEPARATOR: char = ';';
pub const ACKNOWLEDGEMENT: &[u8] = b"OK";
pub const RECV_BLOCK_SIZE: usize = 2048;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct StatusUpdate {
    pub status: String,
    pub returncode: String,
}

impl StatusUpdate {
    pub fn new(status: impl Into<String>, returncode: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            returncode: returncode.into(),
        }
    }
}

/// A full batch of raw `(status, returncode)` tokens, one per process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Snapshot {
    updates: Vec<StatusUpdate>,
}

impl Snapshot {
    pub fn new(updates: Vec<StatusUpdate>) -> Self {
        Self { updates }
    }

    pub fn updates(&self) -> &[StatusUpdate] {
        &self.updates
    }

    pub fn len(&self) -> usize {
        self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    MissingSeparator,
    ExtraSeparator,
    MissingStatuses { expected: usize, found: usize },
    MissingReturncodes { expected: usize, found: usize },
}

impl Display for ProtocolError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ProtocolError::MissingSeparator => {
                write!(f, "status batch is missing the `{BATCH_SEPARATOR}` separator")
            }
            ProtocolError::ExtraSeparator => write!(
                f,
                "status batch contains more than one `{BATCH_SEPARATOR}` separator"
            ),
            ProtocolError::MissingStatuses { expected, found } => {
                write!(f, "expected {expected} status tokens, found {found}")
            }
            ProtocolError::MissingReturncodes { expected, found } => {
                write!(f, "expected {expected} returncode tokens, found {found}")
            }
        }
    }
}

impl std::error::Error for ProtocolError {}

/// Parses `<ignored>;<status>...|||<ignored>;<rc>...` into a snapshot of exactly
/// `process_count` pairs. Surplus tokens are dropped.
pub fn parse_status_batch(line: &str, process_count: usize) -> Result<Snapshot, ProtocolError> {
    let (status_segment, returncode_segment) = line
        .split_once(BATCH_SEPARATOR)
        .ok_or(ProtocolError::MissingSeparator)?;
    if returncode_segment.contains(BATCH_SEPARATOR) {
        return Err(ProtocolError::ExtraSeparator);
    }

    let statuses = segment_tokens(status_segment);
    if statuses.len() < process_count {
        return Err(ProtocolError::MissingStatuses {
            expected: process_count,
            found: statuses.len(),
        });
    }
    let returncodes = segment_tokens(returncode_segment);
    if returncodes.len() < process_count {
        return Err(ProtocolError::MissingReturncodes {
            expected: process_count,
            found: returncodes.len(),
        });
    }

    let updates = statuses
        .into_iter()
        .zip(returncodes)
        .take(process_count)
        .map(|(status, returncode)| StatusUpdate::new(status, returncode))
        .collect();
    Ok(Snapshot::new(updates))
}

/// Drops the leading label field and returns the per-process tokens.
fn segment_tokens(segment: &str) -> Vec<&str> {
    segment.split(FIELD_SEPARATOR).skip(1).collect()
}

/// Strips the line terminator a client may append to a batch.
pub fn trim_line(raw: &str) -> &str {
    raw.trim_end_matches(['\r', '\n'])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_two_process_batch() {
        let snapshot = parse_status_batch("A;READY;RUNNING|||B;-1;0", 2).expect("parse batch");
        assert_eq!(
            snapshot.updates(),
            &[
                StatusUpdate::new("READY", "-1"),
                StatusUpdate::new("RUNNING", "0"),
            ]
        );
    }

    #[test]
    fn rejects_message_without_separator() {
        assert_eq!(
            parse_status_batch("justtext", 1),
            Err(ProtocolError::MissingSeparator)
        );
    }

    #[test]
    fn rejects_message_with_repeated_separator() {
        assert_eq!(
            parse_status_batch("A;READY|||B;0|||C;1", 1),
            Err(ProtocolError::ExtraSeparator)
        );
    }

    #[test]
    fn rejects_short_returncode_list() {
        assert_eq!(
            parse_status_batch("A;READY;RUNNING|||B;0", 2),
            Err(ProtocolError::MissingReturncodes {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn rejects_short_status_list() {
        assert_eq!(
            parse_status_batch("A;READY|||B;0;0", 2),
            Err(ProtocolError::MissingStatuses {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn surplus_tokens_are_ignored() {
        let snapshot =
            parse_status_batch("A;READY;RUNNING;BLOCK|||B;0;1;2", 2).expect("parse batch");
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.updates()[1], StatusUpdate::new("RUNNING", "1"));
    }

    #[test]
    fn empty_tokens_are_kept_positionally() {
        let snapshot = parse_status_batch("A;;COMPLETE=0|||B;;0", 2).expect("parse batch");
        assert_eq!(snapshot.updates()[0], StatusUpdate::new("", ""));
        assert_eq!(snapshot.updates()[1], StatusUpdate::new("COMPLETE=0", "0"));
    }

    #[test]
    fn trim_line_strips_only_trailing_terminators() {
        assert_eq!(trim_line("A;READY|||B;0\r\n"), "A;READY|||B;0");
        assert_eq!(trim_line("\n\r\n"), "");
        assert_eq!(trim_line(" keep \n"), " keep ");
    }
}
