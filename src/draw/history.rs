//! Raster undo/redo timeline for a single drawing surface.

use super::canvas::Snapshot;

/// Ordered sequence of committed canvas snapshots with a cursor.
///
/// The timeline never forks: pushing after an undo discards every snapshot
/// past the cursor. It always holds at least one entry (the initial blank
/// canvas), and `index < len` holds at all times.
#[derive(Debug)]
pub struct RasterHistory {
    timeline: Vec<Snapshot>,
    index: usize,
    /// Maximum retained snapshots (0 = unlimited)
    max_entries: usize,
}

impl RasterHistory {
    /// Creates a timeline whose only entry is `initial`.
    pub fn new(initial: Snapshot) -> Self {
        Self::with_capacity_limit(initial, 0)
    }

    /// Creates a timeline that keeps at most `max_entries` snapshots.
    ///
    /// `0` disables the limit. A limit of 1 is raised to 2 so a single undo
    /// step stays possible.
    pub fn with_capacity_limit(initial: Snapshot, max_entries: usize) -> Self {
        let max_entries = if max_entries == 1 { 2 } else { max_entries };
        Self {
            timeline: vec![initial],
            index: 0,
            max_entries,
        }
    }

    /// Commits `snapshot` after the cursor, pruning any redo branch.
    pub fn push(&mut self, snapshot: Snapshot) {
        let pruned = self.timeline.len() - (self.index + 1);
        if pruned > 0 {
            log::debug!("Discarding {pruned} redo snapshot(s)");
        }
        self.timeline.truncate(self.index + 1);
        self.timeline.push(snapshot);

        if self.max_entries > 0 && self.timeline.len() > self.max_entries {
            let overflow = self.timeline.len() - self.max_entries;
            self.timeline.drain(..overflow);
            log::debug!("History limit {} reached; dropped {overflow} oldest", self.max_entries);
        }

        self.index = self.timeline.len() - 1;
    }

    /// Steps back one snapshot and returns it, or `None` at the start.
    pub fn undo(&mut self) -> Option<&Snapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.timeline.get(self.index)
    }

    /// Steps forward one snapshot and returns it, or `None` at the end.
    pub fn redo(&mut self) -> Option<&Snapshot> {
        if self.index + 1 >= self.timeline.len() {
            return None;
        }
        self.index += 1;
        self.timeline.get(self.index)
    }

    /// Snapshot under the cursor.
    pub fn current(&self) -> &Snapshot {
        &self.timeline[self.index]
    }

    /// Cursor position in the timeline.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of retained snapshots, including the initial one.
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.timeline.len()
    }

    /// Approximate memory held by the timeline in bytes.
    pub fn retained_bytes(&self) -> usize {
        self.timeline.iter().map(Snapshot::byte_len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::Canvas;

    /// Produces distinguishable snapshots by filling the canvas with a
    /// different gray level per step.
    fn snapshots(count: usize) -> Vec<Snapshot> {
        let mut canvas = Canvas::new(4, 4, 1.0).unwrap();
        (0..count)
            .map(|step| {
                let level = step as f64 / count as f64;
                canvas
                    .draw(|ctx| {
                        ctx.set_operator(cairo::Operator::Source);
                        ctx.set_source_rgba(level, level, level, 1.0);
                        ctx.paint()
                    })
                    .unwrap();
                canvas.snapshot().unwrap()
            })
            .collect()
    }

    #[test]
    fn starts_with_single_entry() {
        let mut frames = snapshots(1);
        let history = RasterHistory::new(frames.remove(0));
        assert_eq!(history.len(), 1);
        assert_eq!(history.index(), 0);
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_k_steps_returns_snapshot_n_minus_k() {
        let frames = snapshots(6);
        let mut history = RasterHistory::new(frames[0].clone());
        for frame in &frames[1..] {
            history.push(frame.clone());
        }
        let n = frames.len() - 1;

        for k in 1..=n {
            let restored = history.undo().cloned().unwrap();
            assert_eq!(restored, frames[n - k]);
            assert_eq!(history.current(), &frames[n - k]);
        }
    }

    #[test]
    fn boundaries_are_no_ops() {
        let frames = snapshots(2);
        let mut history = RasterHistory::new(frames[0].clone());

        assert!(history.undo().is_none());
        assert_eq!(history.index(), 0);

        history.push(frames[1].clone());
        assert!(history.redo().is_none());
        assert_eq!(history.index(), 1);
    }

    #[test]
    fn redo_walks_forward_again() {
        let frames = snapshots(3);
        let mut history = RasterHistory::new(frames[0].clone());
        history.push(frames[1].clone());
        history.push(frames[2].clone());

        history.undo();
        history.undo();
        assert_eq!(history.redo(), Some(&frames[1]));
        assert_eq!(history.redo(), Some(&frames[2]));
        assert!(history.redo().is_none());
    }

    #[test]
    fn push_after_undo_prunes_redo_branch() {
        let frames = snapshots(5);
        let mut history = RasterHistory::new(frames[0].clone());
        for frame in &frames[1..4] {
            history.push(frame.clone());
        }
        assert_eq!(history.len(), 4);

        history.undo();
        history.undo();
        assert_eq!(history.index(), 1);

        history.push(frames[4].clone());
        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        assert!(history.redo().is_none());
        assert_eq!(history.current(), &frames[4]);

        assert_eq!(history.undo(), Some(&frames[1]));
        assert_eq!(history.redo(), Some(&frames[4]));
    }

    #[test]
    fn capacity_limit_drops_oldest() {
        let frames = snapshots(5);
        let mut history = RasterHistory::with_capacity_limit(frames[0].clone(), 3);
        for frame in &frames[1..] {
            history.push(frame.clone());
        }

        assert_eq!(history.len(), 3);
        assert_eq!(history.index(), 2);
        assert_eq!(history.current(), &frames[4]);
        history.undo();
        history.undo();
        assert_eq!(history.current(), &frames[2]);
        assert!(history.undo().is_none());
    }

    #[test]
    fn retained_bytes_tracks_timeline() {
        let frames = snapshots(2);
        let mut history = RasterHistory::new(frames[0].clone());
        let single = history.retained_bytes();
        history.push(frames[1].clone());
        assert_eq!(history.retained_bytes(), single * 2);
    }
}
