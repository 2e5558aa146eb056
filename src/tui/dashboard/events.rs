use crossterm::event::KeyEvent;

use crate::listener::SnapshotSlot;
use crate::tui::core::{is_interrupt_key, LoopControl};

use super::diagnostics::RuntimeDiagnostics;
use super::state::DashboardState;

/// Applies the slot's snapshot if it arrived since the last tick. Returns whether
/// the frame needs repainting.
pub(super) fn apply_latest_snapshot(
    slot: &SnapshotSlot,
    state: &mut DashboardState,
    diagnostics: &mut RuntimeDiagnostics,
) -> bool {
    let Some(stamped) = slot.latest() else {
        return false;
    };
    if !state.is_new_generation(stamped.generation) {
        return false;
    }
    state.mark_generation(stamped.generation);
    let changed = state.apply_snapshot(&stamped.snapshot);
    diagnostics.record_snapshot(stamped.generation, changed);
    // The header's update counter moves even when no box does.
    true
}

pub(super) fn handle_key(key: &KeyEvent, diagnostics: &mut RuntimeDiagnostics) -> LoopControl {
    if is_interrupt_key(key) {
        diagnostics.record_interrupt("ctrl-c");
        return LoopControl::Quit;
    }
    diagnostics.record_keypress(key);
    LoopControl::Continue
}
