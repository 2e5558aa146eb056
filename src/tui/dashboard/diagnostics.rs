use std::collections::VecDeque;
use std::time::Instant;

use crossterm::event::KeyEvent;

use super::config::{DIAGNOSTICS_ENV, MAX_TRACE_LINES};

#[derive(Debug, Clone)]
pub struct RuntimeDiagnostics {
    enabled: bool,
    started_at: Instant,
    frame_count: usize,
    keypress_count: usize,
    snapshots_applied: usize,
    box_redraws: usize,
    traces: VecDeque<String>,
}

impl RuntimeDiagnostics {
    pub fn from_env() -> Self {
        let enabled = std::env::var(DIAGNOSTICS_ENV)
            .ok()
            .is_some_and(|value| value == "1" || value.eq_ignore_ascii_case("true"));
        Self::new(enabled)
    }

    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            started_at: Instant::now(),
            frame_count: 0,
            keypress_count: 0,
            snapshots_applied: 0,
            box_redraws: 0,
            traces: VecDeque::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn elapsed_ms(&self) -> u128 {
        self.started_at.elapsed().as_millis()
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn keypress_count(&self) -> usize {
        self.keypress_count
    }

    pub fn snapshots_applied(&self) -> usize {
        self.snapshots_applied
    }

    pub fn box_redraws(&self) -> usize {
        self.box_redraws
    }

    pub fn traces(&self) -> Vec<String> {
        self.traces.iter().cloned().collect()
    }

    pub(super) fn record_frame(&mut self) {
        if !self.enabled {
            return;
        }
        self.frame_count = self.frame_count.saturating_add(1);
    }

    pub(super) fn record_keypress(&mut self, key: &KeyEvent) {
        if !self.enabled {
            return;
        }
        self.keypress_count = self.keypress_count.saturating_add(1);
        self.push_trace(format!(
            "key code={:?} modifiers={:?}",
            key.code, key.modifiers
        ));
    }

    pub(super) fn record_snapshot(&mut self, generation: u64, changed: usize) {
        if !self.enabled {
            return;
        }
        self.snapshots_applied = self.snapshots_applied.saturating_add(1);
        self.box_redraws = self.box_redraws.saturating_add(changed);
        self.push_trace(format!("snapshot generation={generation} changed={changed}"));
    }

    pub(super) fn record_interrupt(&mut self, source: &str) {
        if !self.enabled {
            return;
        }
        self.push_trace(format!("interrupt source={source}"));
    }

    fn push_trace(&mut self, line: String) {
        self.traces.push_back(line);
        while self.traces.len() > MAX_TRACE_LINES {
            self.traces.pop_front();
        }
    }
}
