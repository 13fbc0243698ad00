//! Progress-bar scaling for chunked transfers.
//!
//! Purely derived display state; nothing here touches the wire or the
//! transfer timing.

/// Widest bar the terminal rendering should produce.
const MAX_BAR_SEGMENTS: usize = 30;

/// Largest divider probed before giving up.
const MAX_DIVIDER: usize = 64;

/// Smallest divider in `1..=64` that keeps `chunk_count / divider` within 30
/// bar segments, or 64 when none does.
pub fn find_lowest_bar_divider(chunk_count: usize) -> usize {
    (1..=MAX_DIVIDER)
        .find(|i| chunk_count / i <= MAX_BAR_SEGMENTS)
        .unwrap_or(MAX_DIVIDER)
}

/// Derived display state for one transfer.
///
/// Recomputed per transfer, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressState {
    chunk_count: usize,
    divider: usize,
}

impl ProgressState {
    /// Build the display state for a transfer of `chunk_count` full chunks.
    pub fn new(chunk_count: usize) -> Self {
        Self {
            chunk_count,
            divider: find_lowest_bar_divider(chunk_count),
        }
    }

    /// The scaling divider chosen for this transfer.
    pub fn divider(&self) -> usize {
        self.divider
    }

    /// Total bar segments to render.
    pub fn segments(&self) -> usize {
        self.chunk_count / self.divider
    }

    /// Bar segments filled once `completed` full chunks are done.
    pub fn filled(&self, completed: usize) -> usize {
        completed.min(self.chunk_count) / self.divider
    }
}
