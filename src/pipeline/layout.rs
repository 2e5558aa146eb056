pub const BOX_WIDTH: u16 = 8;
pub const BOX_HEIGHT: u16 = 4;
pub const DEFAULT_MARGIN: u16 = 4;
pub const MAX_ROW_ITEMS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSpec {
    pub box_width: u16,
    pub box_height: u16,
    pub margin: u16,
    pub max_row_items: usize,
}

impl Default for LayoutSpec {
    fn default() -> Self {
        Self {
            box_width: BOX_WIDTH,
            box_height: BOX_HEIGHT,
            margin: DEFAULT_MARGIN,
            max_row_items: MAX_ROW_ITEMS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoxGeometry {
    pub row: usize,
    pub column: usize,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Rows of centred status boxes, computed once for the lifetime of a dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    rows: Vec<Vec<BoxGeometry>>,
}

impl GridLayout {
    pub fn compute(process_count: usize, screen_width: u16, spec: &LayoutSpec) -> Self {
        let per_row = spec.max_row_items.max(1);
        let mut rows = Vec::with_capacity(process_count.div_ceil(per_row));
        let mut remaining = process_count;
        while remaining > 0 {
            let count = remaining.min(per_row);
            let row = rows.len();
            rows.push(layout_row(row, count, screen_width, spec));
            remaining -= count;
        }
        Self { rows }
    }

    pub fn rows(&self) -> &[Vec<BoxGeometry>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Every box in original process order.
    pub fn boxes(&self) -> impl Iterator<Item = &BoxGeometry> {
        self.rows.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

pub fn row_left(count: usize, screen_width: u16, spec: &LayoutSpec) -> u16 {
    let count = count as u32;
    let total_width = count * u32::from(spec.box_width)
        + count.saturating_sub(1) * u32::from(spec.margin);
    // Undersized terminals pin the row to the left edge.
    (u32::from(screen_width) / 2)
        .saturating_sub(total_width / 2)
        .min(u32::from(u16::MAX)) as u16
}

pub fn row_top(row: usize, spec: &LayoutSpec) -> u16 {
    let row = row as u64;
    let top = (row + 1) * u64::from(spec.box_height) + row * u64::from(spec.margin);
    top.min(u64::from(u16::MAX)) as u16
}

fn layout_row(row: usize, count: usize, screen_width: u16, spec: &LayoutSpec) -> Vec<BoxGeometry> {
    let left = u32::from(row_left(count, screen_width, spec));
    let y = row_top(row, spec);
    let stride = u32::from(spec.box_width) + u32::from(spec.margin);
    (0..count)
        .map(|column| BoxGeometry {
            row,
            column,
            x: (left + column as u32 * stride).min(u32::from(u16::MAX)) as u16,
            y,
            width: spec.box_width,
            height: spec.box_height,
        })
        .collect()
}
