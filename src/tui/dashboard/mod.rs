use std::io;
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::Duration;

use ratatui::backend::Backend;
use ratatui::Terminal;

use crate::config::DashboardConfig;
use crate::listener::{ListenerError, ListenerReport, SnapshotSlot, StatusListener};
use crate::pipeline::{PipelineEntry, ProcessState};
use crate::signals::{install_interrupt_handler, InterruptFlag};
use crate::tui::core::{CrosstermInput, InputSource, LoopControl};

mod config;
mod diagnostics;
mod events;
mod lifecycle;
mod render;
mod state;

pub use diagnostics::RuntimeDiagnostics;
pub use render::{palette_color, StatusBox};
pub use state::DashboardState;

use events::{apply_latest_snapshot, handle_key};
use lifecycle::{init_terminal, restore_terminal};
use render::render_dashboard;

#[derive(Debug)]
pub enum DashboardError {
    Io(io::Error),
    Listener(ListenerError),
    TerminalInit(io::Error),
    Signal(io::Error),
    NoTerminal,
    EmptyPipeline,
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashboardError::Io(err) => write!(f, "{err}"),
            DashboardError::Listener(err) => write!(f, "{err}"),
            DashboardError::TerminalInit(err) => {
                write!(f, "failed to initialise terminal: {err}")
            }
            DashboardError::Signal(err) => {
                write!(f, "failed to swap interrupt handlers: {err}")
            }
            DashboardError::NoTerminal => write!(f, "stdout is not a terminal"),
            DashboardError::EmptyPipeline => write!(f, "pipeline has no processes"),
        }
    }
}

impl std::error::Error for DashboardError {}

impl From<io::Error> for DashboardError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ListenerError> for DashboardError {
    fn from(value: ListenerError) -> Self {
        Self::Listener(value)
    }
}

#[derive(Debug)]
pub struct DashboardOutcome {
    pub processes: Vec<ProcessState>,
    pub listen_address: SocketAddr,
    pub listener: Result<ListenerReport, ListenerError>,
    pub diagnostics: RuntimeDiagnostics,
}

/// Runs the dashboard until interrupted. The terminal, the previous signal
/// actions and the listener are put back on every exit path once set up.
pub fn run_dashboard(
    entries: Vec<PipelineEntry>,
    config: &DashboardConfig,
) -> Result<DashboardOutcome, DashboardError> {
    if entries.is_empty() {
        return Err(DashboardError::EmptyPipeline);
    }
    if !io::stdout().is_terminal() {
        return Err(DashboardError::NoTerminal);
    }

    let listener = StatusListener::bind(config.listen_address(), entries.len())?;
    let listen_address = listener.local_addr();
    let interrupt_handler = install_interrupt_handler().map_err(DashboardError::Signal)?;
    let mut terminal = init_terminal().map_err(DashboardError::TerminalInit)?;
    let screen_width = match terminal.size() {
        Ok(size) => size.width,
        Err(error) => {
            let _ = restore_terminal(&mut terminal);
            return Err(DashboardError::TerminalInit(error));
        }
    };
    let mut state = DashboardState::new(
        &entries,
        screen_width,
        config.layout_spec(),
        listen_address.to_string(),
    );
    let listener = match listener.spawn() {
        Ok(handle) => handle,
        Err(error) => {
            let _ = restore_terminal(&mut terminal);
            return Err(error.into());
        }
    };

    let mut diagnostics = RuntimeDiagnostics::from_env();
    let mut input = CrosstermInput;
    let result = run_loop(
        &mut terminal,
        &mut state,
        listener.slot(),
        &mut input,
        interrupt_handler.flag(),
        config.tick(),
        &mut diagnostics,
    );

    let restored = restore_terminal(&mut terminal);
    let signals_restored = interrupt_handler.restore();
    let listener_report = listener.stop();
    result?;
    restored?;
    signals_restored.map_err(DashboardError::Signal)?;

    Ok(DashboardOutcome {
        processes: state.into_processes(),
        listen_address,
        listener: listener_report,
        diagnostics,
    })
}

/// The poll loop: apply any newly arrived snapshot, repaint when something
/// changed, then wait up to `tick` for a key.
pub fn run_loop<B, I>(
    terminal: &mut Terminal<B>,
    state: &mut DashboardState,
    slot: &SnapshotSlot,
    input: &mut I,
    interrupt: InterruptFlag,
    tick: Duration,
    diagnostics: &mut RuntimeDiagnostics,
) -> Result<(), DashboardError>
where
    B: Backend,
    I: InputSource,
{
    let mut needs_draw = true;
    loop {
        if interrupt.is_raised() {
            diagnostics.record_interrupt("signal");
            return Ok(());
        }

        if apply_latest_snapshot(slot, state, diagnostics) {
            needs_draw = true;
        }
        if needs_draw {
            terminal.draw(|frame| render_dashboard(frame, state))?;
            diagnostics.record_frame();
            needs_draw = false;
        }

        if let Some(key) = input.poll_key(tick)? {
            if handle_key(&key, diagnostics) == LoopControl::Quit {
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/dashboard_loop_tests.rs"]
mod tests;
