/// Append-only spin history, newest first
///
/// The log itself is unbounded; analysis only ever reads a sliding window of
/// the most recent entries:
/// - per-dozen occurrence counts
/// - per-dozen gap (index of the most recent occurrence)
/// - hot / cold dozen over the window

use std::collections::VecDeque;

use serde::Serialize;

use crate::spin::{Dozen, Spin};

/// Gap reported for a dozen that does not appear in the window
pub const ABSENT_GAP: usize = 99;

/// Ordered log of observed spins
#[derive(Debug, Clone, Default)]
pub struct HistoryLog {
    spins: VecDeque<Spin>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new spin as the most recent entry
    pub fn record(&mut self, spin: Spin) {
        self.spins.push_front(spin);
    }

    pub fn len(&self) -> usize {
        self.spins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    /// Most recent spin, if any
    pub fn latest(&self) -> Option<Spin> {
        self.spins.front().copied()
    }

    /// The `size` most recent spins, newest first
    pub fn window(&self, size: usize) -> impl Iterator<Item = Spin> + '_ {
        self.spins.iter().copied().take(size)
    }

    pub fn clear(&mut self) {
        self.spins.clear();
    }

    /// Per-dozen statistics over the `size` most recent spins
    pub fn dozen_stats(&self, size: usize) -> DozenWindowStats {
        DozenWindowStats::from_window(self.window(size))
    }
}

/// Counts and gaps for one dozen inside a window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DozenCell {
    pub dozen: Dozen,
    pub count: usize,
    /// Index of the most recent occurrence (0 = newest spin), `ABSENT_GAP` if absent
    pub last_seen: usize,
}

/// Window summary used by the predictor and the stats accessor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DozenWindowStats {
    pub window_len: usize,
    pub zeros: usize,
    pub cells: [DozenCell; 3],
}

impl DozenWindowStats {
    pub fn from_window<I: IntoIterator<Item = Spin>>(window: I) -> Self {
        let mut cells = Dozen::ALL.map(|dozen| DozenCell {
            dozen,
            count: 0,
            last_seen: ABSENT_GAP,
        });
        let mut window_len = 0;
        let mut zeros = 0;

        for (idx, spin) in window.into_iter().enumerate() {
            window_len += 1;
            match spin.dozen() {
                Some(dozen) => {
                    let cell = &mut cells[dozen.slot()];
                    cell.count += 1;
                    if cell.last_seen == ABSENT_GAP {
                        cell.last_seen = idx;
                    }
                }
                None => zeros += 1,
            }
        }

        Self {
            window_len,
            zeros,
            cells,
        }
    }

    pub fn cell(&self, dozen: Dozen) -> &DozenCell {
        &self.cells[dozen.slot()]
    }

    pub fn non_zero(&self) -> usize {
        self.window_len - self.zeros
    }

    /// Non-zero spins divided evenly across the three dozens
    pub fn expected_per_dozen(&self) -> f64 {
        self.non_zero() as f64 / 3.0
    }

    /// Most frequent dozen, lowest index on ties. `None` for an empty window.
    pub fn hot(&self) -> Option<Dozen> {
        if self.non_zero() == 0 {
            return None;
        }
        let mut best = &self.cells[0];
        for cell in &self.cells[1..] {
            if cell.count > best.count {
                best = cell;
            }
        }
        Some(best.dozen)
    }

    /// Least frequent dozen, lowest index on ties. `None` for an empty window.
    pub fn cold(&self) -> Option<Dozen> {
        if self.non_zero() == 0 {
            return None;
        }
        let mut worst = &self.cells[0];
        for cell in &self.cells[1..] {
            if cell.count < worst.count {
                worst = cell;
            }
        }
        Some(worst.dozen)
    }
}
