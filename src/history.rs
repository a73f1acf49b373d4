use std::collections::VecDeque;
use std::sync::Arc;

use crate::error::DrawingResult;
use crate::surface::PixelSurface;

/// Default number of snapshots kept on the undo side
pub const DEFAULT_DEPTH: usize = 50;

/// A full PNG encoding of the surface at one point in time
#[derive(Clone, PartialEq, Eq)]
pub struct Snapshot(Arc<[u8]>);

impl Snapshot {
    pub fn capture(surface: &PixelSurface) -> DrawingResult<Self> {
        Ok(Self(surface.encode()?.into()))
    }

    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Self {
        Self(bytes.into())
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Snapshot({} bytes)", self.0.len())
    }
}

/// Bounded undo/redo history of whole-surface snapshots.
///
/// The undo side always holds at least the base entry. Undo never removes
/// the last remaining entry; only capacity eviction drops entries, from the
/// oldest end.
#[derive(Debug)]
pub struct HistoryStack {
    /// Oldest first; the back is the current state
    undo_stack: VecDeque<Snapshot>,
    /// Most recently undone last
    redo_stack: Vec<Snapshot>,
    depth: usize,
    /// True while a gesture is open; snapshots wait until it completes
    gesture_open: bool,
    /// Bumped on every change so observers can detect updates cheaply
    revision: u64,
}

impl HistoryStack {
    /// Creates a history whose base entry is the current state of `surface`.
    pub fn new(surface: &PixelSurface, depth: usize) -> DrawingResult<Self> {
        Ok(Self::with_base(Snapshot::capture(surface)?, depth))
    }

    pub fn with_base(base: Snapshot, depth: usize) -> Self {
        Self {
            undo_stack: VecDeque::from([base]),
            redo_stack: Vec::new(),
            depth: depth.max(1),
            gesture_open: false,
            revision: 0,
        }
    }

    /// Drops everything and makes `base` the sole entry.
    pub fn reset(&mut self, base: Snapshot) {
        self.undo_stack.clear();
        self.undo_stack.push_back(base);
        self.redo_stack.clear();
        self.gesture_open = false;
        self.revision += 1;
    }

    /// Marks a gesture as in progress; snapshots are skipped until it ends.
    pub fn begin_gesture(&mut self) {
        self.gesture_open = true;
    }

    pub fn end_gesture(&mut self) {
        self.gesture_open = false;
    }

    pub fn gesture_open(&self) -> bool {
        self.gesture_open
    }

    /// Records the current surface as a new undo entry and clears redo.
    ///
    /// Returns false without recording while a gesture is open.
    pub fn snapshot(&mut self, surface: &PixelSurface) -> DrawingResult<bool> {
        if self.gesture_open {
            log::debug!("Snapshot skipped: gesture in progress");
            return Ok(false);
        }
        let snapshot = Snapshot::capture(surface)?;
        self.push(snapshot);
        Ok(true)
    }

    fn push(&mut self, snapshot: Snapshot) {
        self.undo_stack.push_back(snapshot);
        while self.undo_stack.len() > self.depth {
            self.undo_stack.pop_front();
        }
        self.redo_stack.clear(); // a new edit invalidates the redo branch
        self.revision += 1;
        log::debug!("History: {} undo, 0 redo", self.undo_stack.len());
    }

    /// Restores the state before the most recent edit.
    ///
    /// Returns false at the base floor. A snapshot that fails to decode
    /// leaves both the surface and the stacks unchanged.
    pub fn undo(&mut self, surface: &mut PixelSurface) -> DrawingResult<bool> {
        if !self.can_undo() {
            return Ok(false);
        }
        let previous = &self.undo_stack[self.undo_stack.len() - 2];
        surface.decode_into(previous.bytes())?;

        if let Some(undone) = self.undo_stack.pop_back() {
            self.redo_stack.push(undone);
        }
        self.revision += 1;
        log::debug!("Undo: {} undo, {} redo", self.undo_stack.len(), self.redo_stack.len());
        Ok(true)
    }

    /// Reapplies the most recently undone edit. Returns false when there is none.
    pub fn redo(&mut self, surface: &mut PixelSurface) -> DrawingResult<bool> {
        let Some(next) = self.redo_stack.last() else {
            return Ok(false);
        };
        surface.decode_into(next.bytes())?;

        if let Some(redone) = self.redo_stack.pop() {
            self.undo_stack.push_back(redone);
        }
        self.revision += 1;
        log::debug!("Redo: {} undo, {} redo", self.undo_stack.len(), self.redo_stack.len());
        Ok(true)
    }

    /// Redraws the current state onto `surface` without changing the stacks.
    pub fn restore_current(&self, surface: &mut PixelSurface) -> DrawingResult<()> {
        match self.undo_stack.back() {
            Some(current) => surface.decode_into(current.bytes()),
            None => Ok(()),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.undo_stack.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo_stack.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }
}
