use crate::engine::{EntryId, ExerciseGroupingEngine, GroupKey};

/// What the pointer picked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragSubject {
    /// One entry, reordered inside its own group.
    Entry(EntryId),
    /// A whole block (a group, or a single entry as its own block).
    Block(GroupKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragTarget {
    Entry(EntryId),
    Block(GroupKey),
}

/// One drag gesture from pick-up to drop.
///
/// Every hover event is forwarded to the engine against its current list.
/// Repeated events over the same target are skipped so the dragged entry
/// does not bounce back and forth while the pointer rests. Rejected moves
/// leave the session running.
#[derive(Debug, Clone)]
pub struct DragSession {
    subject: DragSubject,
    last_target: Option<DragTarget>,
    moves: usize,
}

impl DragSession {
    pub fn entry(id: EntryId) -> Self {
        Self::new(DragSubject::Entry(id))
    }

    pub fn block(key: GroupKey) -> Self {
        Self::new(DragSubject::Block(key))
    }

    fn new(subject: DragSubject) -> Self {
        log::debug!("Drag started: {subject:?}");
        Self {
            subject,
            last_target: None,
            moves: 0,
        }
    }

    pub fn subject(&self) -> DragSubject {
        self.subject
    }

    /// Number of hover events that actually moved something.
    pub fn moves(&self) -> usize {
        self.moves
    }

    /// Pointer is over entry `target`.
    pub fn over_entry(&mut self, engine: &mut ExerciseGroupingEngine, target: EntryId) -> bool {
        if self.last_target == Some(DragTarget::Entry(target)) {
            return false;
        }
        self.last_target = Some(DragTarget::Entry(target));
        let moved = match self.subject {
            DragSubject::Entry(dragged) => engine.reorder_within_group(dragged, target),
            DragSubject::Block(dragged) => match engine.group_key(target) {
                Some(key) => engine.reorder_group(dragged, key),
                None => false,
            },
        };
        self.record(moved)
    }

    /// Pointer is over the header of block `target`.
    pub fn over_block(&mut self, engine: &mut ExerciseGroupingEngine, target: GroupKey) -> bool {
        let DragSubject::Block(dragged) = self.subject else {
            return false;
        };
        if self.last_target == Some(DragTarget::Block(target)) {
            return false;
        }
        self.last_target = Some(DragTarget::Block(target));
        let moved = engine.reorder_group(dragged, target);
        self.record(moved)
    }

    fn record(&mut self, moved: bool) -> bool {
        if moved {
            self.moves += 1;
        }
        moved
    }

    /// Drop or cancel. The list already reflects every accepted move.
    pub fn finish(self) -> usize {
        log::debug!("Drag of {:?} finished after {} moves", self.subject, self.moves);
        self.moves
    }
}
