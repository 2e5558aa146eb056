use std::collections::VecDeque;
use std::io;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::buffer::Buffer;
use ratatui::style::Color;
use ratatui::Terminal;

use super::{run_loop, DashboardState, RuntimeDiagnostics};
use crate::listener::{parse_status_batch, SnapshotSlot};
use crate::pipeline::{decode_pipeline, LayoutSpec, PipelineSeparators, ProcessStatus};
use crate::signals::detached_flag;
use crate::tui::core::InputSource;

const TICK: Duration = Duration::from_millis(1);

/// Replays keys tick by tick, running a hook before each poll so tests can
/// publish snapshots between ticks. Quits with Ctrl-C once the script runs out.
struct ScriptedInput<'a> {
    steps: VecDeque<Option<KeyEvent>>,
    before_poll: Box<dyn FnMut(usize) + 'a>,
    polls: usize,
}

impl<'a> ScriptedInput<'a> {
    fn new(steps: Vec<Option<KeyEvent>>) -> Self {
        Self {
            steps: steps.into(),
            before_poll: Box::new(|_| {}),
            polls: 0,
        }
    }

    fn with_hook(mut self, hook: impl FnMut(usize) + 'a) -> Self {
        self.before_poll = Box::new(hook);
        self
    }
}

impl InputSource for ScriptedInput<'_> {
    fn poll_key(&mut self, _timeout: Duration) -> io::Result<Option<KeyEvent>> {
        (self.before_poll)(self.polls);
        self.polls += 1;
        Ok(self
            .steps
            .pop_front()
            .unwrap_or_else(|| Some(ctrl_c())))
    }
}

fn ctrl_c() -> KeyEvent {
    KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)
}

fn key(code: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(code), KeyModifiers::NONE)
}

fn state(raw: &str, width: u16) -> DashboardState {
    let entries = decode_pipeline(raw, &PipelineSeparators::default());
    DashboardState::new(&entries, width, LayoutSpec::default(), "127.0.0.1:8888")
}

fn row_text(buf: &Buffer, y: u16) -> String {
    (0..buf.area.width)
        .map(|x| buf[(x, y)].symbol())
        .collect::<String>()
}

#[test]
fn applies_published_snapshot_and_paints_boxes() {
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).expect("terminal");
    let mut state = state("fetch:::build", 40);
    let slot = SnapshotSlot::new();
    slot.publish(parse_status_batch("A;READY;RUNNING|||B;-1;0", 2).expect("parse"));
    let mut input = ScriptedInput::new(vec![None]);
    let mut diagnostics = RuntimeDiagnostics::new(true);

    run_loop(
        &mut terminal,
        &mut state,
        &slot,
        &mut input,
        detached_flag(),
        TICK,
        &mut diagnostics,
    )
    .expect("run loop");

    assert_eq!(state.processes()[0].status(), ProcessStatus::Ready);
    assert_eq!(state.processes()[1].status(), ProcessStatus::Running);

    // 2 boxes: 2*8 + 4 = 20 wide, 20 - 10 = 10; second box at 22.
    let buf = terminal.backend().buffer().clone();
    assert_eq!(&row_text(&buf, 4)[..], "          ┌fetch─┐    ┌build─┐          ");
    assert_eq!(&row_text(&buf, 5)[..], "          │      │    │ 0    │          ");
    assert_eq!(buf[(12, 5)].bg, Color::Blue);
    assert_eq!(buf[(24, 5)].bg, Color::Yellow);
    assert!(row_text(&buf, 0).contains("PROCESSVIEW"));
    assert!(row_text(&buf, 1).contains("2 processes"));
}

#[test]
fn snapshot_published_between_ticks_is_picked_up() {
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).expect("terminal");
    let mut state = state("deploy", 40);
    let slot = SnapshotSlot::new();
    let mut input = ScriptedInput::new(vec![None, Some(key('x')), None]).with_hook(|poll| {
        match poll {
            0 => {
                slot.publish(parse_status_batch("A;COMPLETE|||B;0", 1).expect("parse"));
            }
            1 => {
                slot.publish(parse_status_batch("A;COMPLETE|||B;1", 1).expect("parse"));
            }
            _ => {}
        }
    });
    let mut diagnostics = RuntimeDiagnostics::new(true);

    run_loop(
        &mut terminal,
        &mut state,
        &slot,
        &mut input,
        detached_flag(),
        TICK,
        &mut diagnostics,
    )
    .expect("run loop");

    assert_eq!(state.processes()[0].status(), ProcessStatus::Failed);
    assert_eq!(state.processes()[0].returncode(), 1);
    assert_eq!(diagnostics.snapshots_applied(), 2);
    assert_eq!(diagnostics.keypress_count(), 1);
    // Initial paint plus one per applied snapshot.
    assert_eq!(diagnostics.frame_count(), 3);
    let buf = terminal.backend().buffer().clone();
    assert_eq!(buf[(17, 5)].bg, Color::Red);
}

#[test]
fn raised_interrupt_stops_before_painting() {
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).expect("terminal");
    let mut state = state("fetch", 40);
    let slot = SnapshotSlot::new();
    let interrupt = detached_flag();
    interrupt.raise();
    let mut input = ScriptedInput::new(Vec::new());
    let mut diagnostics = RuntimeDiagnostics::new(true);

    run_loop(
        &mut terminal,
        &mut state,
        &slot,
        &mut input,
        interrupt,
        TICK,
        &mut diagnostics,
    )
    .expect("run loop");

    assert_eq!(input.polls, 0);
    assert_eq!(diagnostics.frame_count(), 0);
    assert_eq!(diagnostics.traces(), vec!["interrupt source=signal".to_owned()]);
}

#[test]
fn ordinary_keys_keep_the_loop_running() {
    let mut terminal = Terminal::new(TestBackend::new(40, 12)).expect("terminal");
    let mut state = state("fetch", 40);
    let slot = SnapshotSlot::new();
    let mut input = ScriptedInput::new(vec![Some(key('q')), Some(key('r')), None]);
    let mut diagnostics = RuntimeDiagnostics::new(true);

    run_loop(
        &mut terminal,
        &mut state,
        &slot,
        &mut input,
        detached_flag(),
        TICK,
        &mut diagnostics,
    )
    .expect("run loop");

    assert_eq!(input.polls, 4);
    assert_eq!(diagnostics.keypress_count(), 2);
    assert_eq!(diagnostics.frame_count(), 1);
}
