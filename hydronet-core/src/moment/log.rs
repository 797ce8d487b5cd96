//! Undo/redo history of applied moments.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::Moment;

/// Identifier of a model state, as reached after applying a moment.
pub type StateId = String;

/// State id of a model with no history and no snapshot.
pub const INIT_STATE_ID: &str = "0";

/// A recorded step: the moment that was applied and its inverse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// State reached after `forward`.
    pub state_id: StateId,
    /// The applied moment.
    pub forward: Moment,
    /// The moment that undoes `forward`.
    pub reverse: Moment,
}

/// A baseline moment that rebuilds the model from scratch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// State reached by applying `moment` to an empty model.
    pub state_id: StateId,
    /// Moment putting every asset of the baseline.
    pub moment: Moment,
}

/// The moment to apply for an undo or redo, with the state it leads to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepMoment<'a> {
    /// Moment to apply.
    pub moment: &'a Moment,
    /// State reached once applied.
    pub state_id: &'a str,
}

/// Linear history of moments with a movable pointer.
///
/// The pointer indexes the last applied entry and is `-1` when every entry
/// has been undone (or there are none). Undo and redo only move the pointer;
/// applying the moments is the caller's job. Appending discards the entries
/// after the pointer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentLog {
    deltas: Vec<LogEntry>,
    pointer: isize,
    snapshot: Option<Snapshot>,
}

impl Default for MomentLog {
    fn default() -> Self {
        Self::new()
    }
}

impl MomentLog {
    /// An empty log.
    #[must_use]
    pub fn new() -> Self {
        Self {
            deltas: Vec::new(),
            pointer: -1,
            snapshot: None,
        }
    }

    /// Sets the baseline the deltas apply on top of.
    pub fn set_snapshot(&mut self, moment: Moment, state_id: impl Into<StateId>) {
        self.snapshot = Some(Snapshot {
            state_id: state_id.into(),
            moment,
        });
    }

    /// The baseline, if any.
    #[must_use]
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    /// Records an applied moment, dropping any redoable entries.
    pub fn append(&mut self, forward: Moment, reverse: Moment, state_id: impl Into<StateId>) {
        let new_pointer = self.pointer + 1;
        self.deltas.truncate(new_pointer as usize);
        self.deltas.push(LogEntry {
            state_id: state_id.into(),
            forward,
            reverse,
        });
        self.pointer = new_pointer;
    }

    /// Moves the pointer one entry back. No-op when nothing can be undone.
    pub fn undo(&mut self) {
        if self.pointer < 0 {
            return;
        }
        self.pointer -= 1;
    }

    /// Moves the pointer one entry forward. No-op when nothing can be redone.
    pub fn redo(&mut self) {
        if self.pointer >= self.len() as isize - 1 {
            return;
        }
        self.pointer += 1;
    }

    fn entry(&self, position: isize) -> Option<&LogEntry> {
        usize::try_from(position)
            .ok()
            .and_then(|p| self.deltas.get(p))
    }

    /// The moment that undoes the current entry, and the state it restores:
    /// the previous entry's, else the snapshot's, else [`INIT_STATE_ID`].
    #[must_use]
    pub fn next_undo(&self) -> Option<StepMoment<'_>> {
        let entry = self.entry(self.pointer)?;
        let state_id = match self.entry(self.pointer - 1) {
            Some(previous) => previous.state_id.as_str(),
            None => self
                .snapshot
                .as_ref()
                .map_or(INIT_STATE_ID, |s| s.state_id.as_str()),
        };
        Some(StepMoment {
            moment: &entry.reverse,
            state_id,
        })
    }

    /// The moment that redoes the next entry, and the state it reaches.
    #[must_use]
    pub fn next_redo(&self) -> Option<StepMoment<'_>> {
        let entry = self.entry(self.pointer + 1)?;
        Some(StepMoment {
            moment: &entry.forward,
            state_id: &entry.state_id,
        })
    }

    /// The forward moment of the current entry.
    #[must_use]
    pub fn last(&self) -> Option<&Moment> {
        self.entry(self.pointer).map(|e| &e.forward)
    }

    /// The state reached at the pointer.
    #[must_use]
    pub fn current_state_id(&self) -> &str {
        match self.entry(self.pointer) {
            Some(entry) => &entry.state_id,
            None => self
                .snapshot
                .as_ref()
                .map_or(INIT_STATE_ID, |s| s.state_id.as_str()),
        }
    }

    /// Index of the current entry, `-1` when there is none.
    #[must_use]
    pub fn pointer(&self) -> isize {
        self.pointer
    }

    /// Number of recorded entries, including redoable ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// Whether no entries are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Forward moments of every applied entry, oldest first.
    pub fn deltas(&self) -> impl Iterator<Item = &Moment> + '_ {
        let applied = usize::try_from(self.pointer + 1).unwrap_or(0);
        self.deltas[..applied].iter().map(|e| &e.forward)
    }

    /// The moments that bring a model at `from_pointer` to the current
    /// pointer.
    ///
    /// When the current pointer is at or ahead of `from_pointer`, these are
    /// the forward moments after it. Otherwise they are the reverse moments
    /// from `from_pointer` back down to the entry after the pointer.
    /// Out-of-range pointers are clamped to `[-1, len - 1]`.
    #[must_use]
    pub fn deltas_from(&self, from_pointer: isize) -> Vec<&Moment> {
        let max_pointer = self.len() as isize - 1;
        let from = from_pointer.min(max_pointer).max(-1);
        if from != from_pointer {
            warn!(
                from_pointer,
                clamped = from,
                pointer = self.pointer,
                deltas = self.len(),
                "moment log pointer out of bounds"
            );
        }

        if self.pointer >= from {
            ((from + 1)..=self.pointer)
                .filter_map(|i| self.entry(i))
                .map(|e| &e.forward)
                .collect()
        } else {
            ((self.pointer + 1)..=from)
                .rev()
                .filter_map(|i| self.entry(i))
                .map(|e| &e.reverse)
                .collect()
        }
    }

    /// Iterates over `(forward moment, position, offset)` for every entry,
    /// where `offset` is the distance from the pointer to the entry.
    pub fn iter(&self) -> impl Iterator<Item = (&Moment, usize, isize)> + '_ {
        self.deltas
            .iter()
            .enumerate()
            .map(|(position, e)| (&e.forward, position, self.pointer - position as isize))
    }
}
