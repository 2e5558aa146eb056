pub(super) const MAX_TRACE_LINES: usize = 48;
pub(super) const DIAGNOSTICS_ENV: &str = "PROCESSVIEW_DIAGNOSTICS";

pub(super) const HEADER_HEIGHT: u16 = 3;
