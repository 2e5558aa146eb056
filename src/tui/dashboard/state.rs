use crate::listener::Snapshot;
use crate::pipeline::layout::row_top;
use crate::pipeline::{initial_states, GridLayout, LayoutSpec, PipelineEntry, ProcessState};

use super::render::StatusBox;

pub struct DashboardState {
    processes: Vec<ProcessState>,
    boxes: Vec<StatusBox>,
    layout: LayoutSpec,
    listen_address: String,
    snapshots_applied: usize,
    last_generation: Option<u64>,
}

impl DashboardState {
    pub fn new(
        entries: &[PipelineEntry],
        screen_width: u16,
        layout: LayoutSpec,
        listen_address: impl Into<String>,
    ) -> Self {
        let processes = initial_states(entries);
        let grid = GridLayout::compute(processes.len(), screen_width, &layout);
        let boxes = grid
            .boxes()
            .zip(&processes)
            .map(|(geometry, process)| StatusBox::new(*geometry, process.name()))
            .collect();
        Self {
            processes,
            boxes,
            layout,
            listen_address: listen_address.into(),
            snapshots_applied: 0,
            last_generation: None,
        }
    }

    pub fn processes(&self) -> &[ProcessState] {
        &self.processes
    }

    pub fn boxes(&self) -> &[StatusBox] {
        &self.boxes
    }

    pub fn listen_address(&self) -> &str {
        &self.listen_address
    }

    pub fn snapshots_applied(&self) -> usize {
        self.snapshots_applied
    }

    pub(super) fn first_row_top(&self) -> u16 {
        row_top(0, &self.layout)
    }

    /// Whether `generation` has not been applied yet. Arrival, not content, decides.
    pub(super) fn is_new_generation(&self, generation: u64) -> bool {
        self.last_generation != Some(generation)
    }

    pub(super) fn mark_generation(&mut self, generation: u64) {
        self.last_generation = Some(generation);
    }

    /// Feeds each pair to the process at the same position and refreshes its box.
    /// Returns how many boxes changed.
    pub fn apply_snapshot(&mut self, snapshot: &Snapshot) -> usize {
        self.snapshots_applied = self.snapshots_applied.saturating_add(1);
        let mut changed = 0usize;
        for ((process, status_box), update) in self
            .processes
            .iter_mut()
            .zip(self.boxes.iter_mut())
            .zip(snapshot.updates())
        {
            process.update(&update.status, &update.returncode);
            if status_box.redraw(process.colour(), &process.display_text()) {
                changed += 1;
            }
        }
        changed
    }

    pub fn into_processes(self) -> Vec<ProcessState> {
        self.processes
    }
}
