//! Ordered, grouped list of exercises being edited in a workout.
//!
//! Entries live in one flat list. Supersets and circuits are expressed by a
//! shared [`GroupId`] on consecutive entries rather than by nesting, so a
//! drag across the list only ever moves slices of a single `Vec`.
//!
//! Every mutation keeps the following true:
//! - entries sharing a group id are contiguous and share one [`SetStructure`]
//! - a group never has fewer than two members
//! - `order` is the entry's 1-based position in the list

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::catalog::CatalogExercise;
use crate::sets::{ExerciseField, SetField, SetRow, SetTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entry#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// How an entry is performed relative to its neighbours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetStructure {
    #[default]
    Single,
    Superset,
    Circuit,
}

impl SetStructure {
    pub fn code(self) -> u8 {
        match self {
            SetStructure::Single => 0,
            SetStructure::Superset => 1,
            SetStructure::Circuit => 2,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(SetStructure::Single),
            1 => Some(SetStructure::Superset),
            2 => Some(SetStructure::Circuit),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SetStructure::Single => "single",
            SetStructure::Superset => "superset",
            SetStructure::Circuit => "circuit",
        }
    }
}

/// The block an entry moves with: its group, or the entry itself when ungrouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Group(GroupId),
    Single(EntryId),
}

/// Request to link a newly added exercise with an existing entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupContext {
    pub base_entry_id: EntryId,
    pub target_structure: SetStructure,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExerciseEntry {
    pub id: EntryId,
    pub exercise: CatalogExercise,
    pub order: u32,
    pub group_id: Option<GroupId>,
    pub structure: SetStructure,
    pub sets: SetTable,
}

impl ExerciseEntry {
    pub fn new(id: EntryId, exercise: CatalogExercise) -> Self {
        Self {
            id,
            exercise,
            order: 0,
            group_id: None,
            structure: SetStructure::Single,
            sets: SetTable::default(),
        }
    }

    pub fn group_key(&self) -> GroupKey {
        match self.group_id {
            Some(g) => GroupKey::Group(g),
            None => GroupKey::Single(self.id),
        }
    }
}

/// A run of consecutive entries that move together.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub key: GroupKey,
    pub structure: SetStructure,
    pub start: usize,
    pub entries: Vec<EntryId>,
}

/// Editing operations, replayable from a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Add {
        exercise: CatalogExercise,
        #[serde(default)]
        group: Option<GroupContext>,
    },
    AddFromSearch {
        exercise: CatalogExercise,
    },
    BeginAddToGroup {
        context: GroupContext,
    },
    CancelAddToGroup,
    Remove {
        entry: EntryId,
    },
    ReorderWithinGroup {
        dragged: EntryId,
        target: EntryId,
    },
    ReorderGroup {
        dragged: GroupKey,
        target: GroupKey,
    },
    SetGroupField {
        entry: EntryId,
        field: ExerciseField,
    },
    AddSet {
        entry: EntryId,
    },
    RemoveSet {
        entry: EntryId,
        index: usize,
    },
    UpdateSetField {
        entry: EntryId,
        index: usize,
        field: SetField,
    },
    UpdateFieldForAllSets {
        entry: EntryId,
        field: SetField,
    },
}

/// Owns the entries of one workout and every structural edit on them.
///
/// Entry and group ids are allocated sequentially from 1, so a scripted
/// sequence of [`Command`]s can refer to entries it created earlier.
/// Invalid requests (unknown ids, cross-group drags) are ignored and
/// reported through the `bool`/`Option` return values.
#[derive(Debug, Clone, Default)]
pub struct ExerciseGroupingEngine {
    entries: Vec<ExerciseEntry>,
    next_entry_id: u64,
    next_group_id: u64,
    pending_group: Option<GroupContext>,
}

impl ExerciseGroupingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from already-populated entries.
    ///
    /// Scattered group members are gathered after the first member of their
    /// group, structures are unified per group and one-member groups are
    /// collapsed, so the result satisfies the usual invariants.
    pub(crate) fn from_entries(entries: Vec<ExerciseEntry>) -> Self {
        let next_entry_id = entries.iter().map(|e| e.id.0).max().unwrap_or(0);
        let next_group_id = entries
            .iter()
            .filter_map(|e| e.group_id.map(|g| g.0))
            .max()
            .unwrap_or(0);

        let mut placed: Vec<ExerciseEntry> = Vec::with_capacity(entries.len());
        for entry in entries {
            let slot = entry
                .group_id
                .and_then(|g| placed.iter().rposition(|e| e.group_id == Some(g)));
            match slot {
                Some(last) => placed.insert(last + 1, entry),
                None => placed.push(entry),
            }
        }

        let mut members: HashMap<GroupId, (usize, SetStructure)> = HashMap::new();
        for e in &placed {
            if let Some(g) = e.group_id {
                let slot = members.entry(g).or_insert((0, e.structure));
                slot.0 += 1;
            }
        }
        for e in &mut placed {
            let Some(g) = e.group_id else {
                e.structure = SetStructure::Single;
                continue;
            };
            let (count, structure) = members[&g];
            if count < 2 {
                e.group_id = None;
                e.structure = SetStructure::Single;
            } else {
                e.structure = match structure {
                    SetStructure::Single if count == 2 => SetStructure::Superset,
                    SetStructure::Single => SetStructure::Circuit,
                    other => other,
                };
            }
        }

        let mut engine = Self {
            entries: placed,
            next_entry_id,
            next_group_id,
            pending_group: None,
        };
        engine.recompute_order();
        engine
    }

    pub fn entries(&self) -> &[ExerciseEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: EntryId) -> Option<&ExerciseEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut ExerciseEntry> {
        self.entries.iter_mut().find(|e| e.id == id)
    }

    pub fn index_of(&self, id: EntryId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    pub fn group_key(&self, id: EntryId) -> Option<GroupKey> {
        self.get(id).map(ExerciseEntry::group_key)
    }

    fn has_key(&self, key: GroupKey) -> bool {
        self.entries.iter().any(|e| e.group_key() == key)
    }

    fn alloc_entry_id(&mut self) -> EntryId {
        self.next_entry_id += 1;
        EntryId(self.next_entry_id)
    }

    fn alloc_group_id(&mut self) -> GroupId {
        self.next_group_id += 1;
        GroupId(self.next_group_id)
    }

    /// Remember that the next exercise picked from search joins `base`'s group.
    pub fn begin_add_to_group(&mut self, base_entry_id: EntryId, target: SetStructure) -> bool {
        if self.get(base_entry_id).is_none() {
            log::debug!("Ignoring add-to-group for unknown {base_entry_id}");
            return false;
        }
        self.pending_group = Some(GroupContext {
            base_entry_id,
            target_structure: target,
        });
        true
    }

    pub fn cancel_add_to_group(&mut self) {
        self.pending_group = None;
    }

    pub fn pending_group(&self) -> Option<GroupContext> {
        self.pending_group
    }

    /// Add an exercise chosen from search using the pending group context.
    pub fn add_from_search(&mut self, exercise: CatalogExercise) -> EntryId {
        let context = self.pending_group.take();
        self.add_entry(exercise, context)
    }

    /// Add `exercise` with one blank set and return its id.
    ///
    /// Without a context the entry is appended as a single. With one, every
    /// member of the base entry's group (the base alone if it was a single,
    /// which then receives a fresh group id) takes the target structure and
    /// the new entry is placed right after the group's last member. An
    /// unknown base or a `Single` target falls back to a plain append.
    /// Any pending add-to-group context is cleared.
    pub fn add_entry(&mut self, exercise: CatalogExercise, group: Option<GroupContext>) -> EntryId {
        self.pending_group = None;
        let id = self.alloc_entry_id();
        let mut entry = ExerciseEntry::new(id, exercise);

        let linked = group
            .filter(|ctx| ctx.target_structure != SetStructure::Single)
            .and_then(|ctx| self.index_of(ctx.base_entry_id).map(|idx| (idx, ctx)));

        let insert_at = match linked {
            Some((base_idx, ctx)) => {
                let group_id = match self.entries[base_idx].group_id {
                    Some(g) => g,
                    None => {
                        let g = self.alloc_group_id();
                        self.entries[base_idx].group_id = Some(g);
                        g
                    }
                };
                for e in self.entries.iter_mut().filter(|e| e.group_id == Some(group_id)) {
                    e.structure = ctx.target_structure;
                }
                entry.group_id = Some(group_id);
                entry.structure = ctx.target_structure;
                log::debug!(
                    "Adding {} to {group_id} as {}",
                    entry.exercise.name,
                    ctx.target_structure.as_str()
                );
                self.entries
                    .iter()
                    .rposition(|e| e.group_id == Some(group_id))
                    .map_or(self.entries.len(), |last| last + 1)
            }
            None => {
                if let Some(ctx) = group {
                    log::debug!(
                        "Group context for {} not applicable, appending single",
                        ctx.base_entry_id
                    );
                }
                self.entries.len()
            }
        };

        self.entries.insert(insert_at, entry);
        self.recompute_order();
        id
    }

    /// Remove an entry, collapsing its group if only one member is left.
    pub fn remove_entry(&mut self, id: EntryId) -> bool {
        let Some(idx) = self.index_of(id) else {
            log::debug!("Ignoring removal of unknown {id}");
            return false;
        };
        let removed = self.entries.remove(idx);
        if let Some(group) = removed.group_id {
            let remaining: Vec<usize> = self
                .entries
                .iter()
                .enumerate()
                .filter(|(_, e)| e.group_id == Some(group))
                .map(|(i, _)| i)
                .collect();
            if let &[only] = remaining.as_slice() {
                let survivor = &mut self.entries[only];
                survivor.group_id = None;
                survivor.structure = SetStructure::Single;
                log::debug!("Collapsed {group}, {} is single again", survivor.id);
            }
        }
        self.recompute_order();
        true
    }

    /// Move `dragged` to `target`'s index when both belong to the same group.
    ///
    /// Called on every drag-over event; a move anywhere else is ignored.
    pub fn reorder_within_group(&mut self, dragged: EntryId, target: EntryId) -> bool {
        if dragged == target {
            return false;
        }
        let (Some(from), Some(to)) = (self.index_of(dragged), self.index_of(target)) else {
            return false;
        };
        if self.entries[from].group_key() != self.entries[to].group_key() {
            log::debug!("Rejected drag of {dragged} onto {target}: different groups");
            return false;
        }
        let moved = self.entries.remove(from);
        self.entries.insert(to, moved);
        self.recompute_order();
        true
    }

    /// Move a whole block to just before `target`'s block.
    ///
    /// A single call can therefore never make the dragged block the last one;
    /// to reach the end, drag the current last block above it instead.
    pub fn reorder_group(&mut self, dragged: GroupKey, target: GroupKey) -> bool {
        if dragged == target || !self.has_key(dragged) || !self.has_key(target) {
            return false;
        }
        let start = self.entries.iter().position(|e| e.group_key() == dragged);
        let len = self.entries.iter().filter(|e| e.group_key() == dragged).count();
        let target_start = self.entries.iter().position(|e| e.group_key() == target);
        if start.map(|s| s + len) == target_start {
            return false;
        }
        let (block, mut rest): (Vec<ExerciseEntry>, Vec<ExerciseEntry>) =
            std::mem::take(&mut self.entries)
                .into_iter()
                .partition(|e| e.group_key() == dragged);
        let at = rest
            .iter()
            .position(|e| e.group_key() == target)
            .unwrap_or(rest.len());
        let tail = rest.split_off(at);
        rest.extend(block);
        rest.extend(tail);
        self.entries = rest;
        self.recompute_order();
        true
    }

    /// Write a per-exercise column to every set of `id`.
    pub fn set_group_field(&mut self, id: EntryId, field: ExerciseField) -> bool {
        self.update_field_for_all_sets(id, &field.into())
    }

    pub fn add_set(&mut self, id: EntryId) -> Option<u32> {
        self.get_mut(id).map(|e| e.sets.add_set())
    }

    pub fn remove_set(&mut self, id: EntryId, index: usize) -> Option<SetRow> {
        self.get_mut(id).and_then(|e| e.sets.remove_set(index))
    }

    pub fn update_set_field(&mut self, id: EntryId, index: usize, field: &SetField) -> bool {
        self.get_mut(id).is_some_and(|e| e.sets.update_field(index, field))
    }

    pub fn update_field_for_all_sets(&mut self, id: EntryId, field: &SetField) -> bool {
        match self.get_mut(id) {
            Some(e) => {
                e.sets.update_field_for_all_sets(field);
                true
            }
            None => false,
        }
    }

    /// Reassign `order` as list position + 1.
    pub fn recompute_order(&mut self) {
        for (i, e) in self.entries.iter_mut().enumerate() {
            e.order = i as u32 + 1;
        }
        debug_assert!(self.is_contiguous(), "group split across the list");
    }

    /// Apply one editing command. Returns whether anything changed.
    pub fn apply(&mut self, command: Command) -> bool {
        match command {
            Command::Add { exercise, group } => {
                self.add_entry(exercise, group);
                true
            }
            Command::AddFromSearch { exercise } => {
                self.add_from_search(exercise);
                true
            }
            Command::BeginAddToGroup { context } => {
                self.begin_add_to_group(context.base_entry_id, context.target_structure)
            }
            Command::CancelAddToGroup => {
                let had = self.pending_group.is_some();
                self.cancel_add_to_group();
                had
            }
            Command::Remove { entry } => self.remove_entry(entry),
            Command::ReorderWithinGroup { dragged, target } => {
                self.reorder_within_group(dragged, target)
            }
            Command::ReorderGroup { dragged, target } => self.reorder_group(dragged, target),
            Command::SetGroupField { entry, field } => self.set_group_field(entry, field),
            Command::AddSet { entry } => self.add_set(entry).is_some(),
            Command::RemoveSet { entry, index } => self.remove_set(entry, index).is_some(),
            Command::UpdateSetField {
                entry,
                index,
                field,
            } => self.update_set_field(entry, index, &field),
            Command::UpdateFieldForAllSets { entry, field } => {
                self.update_field_for_all_sets(entry, &field)
            }
        }
    }

    /// Consecutive runs of entries sharing a group key, in list order.
    pub fn blocks(&self) -> Vec<Block> {
        let mut blocks: Vec<Block> = Vec::new();
        for (i, e) in self.entries.iter().enumerate() {
            match blocks.last_mut() {
                Some(b) if b.key == e.group_key() => b.entries.push(e.id),
                _ => blocks.push(Block {
                    key: e.group_key(),
                    structure: e.structure,
                    start: i,
                    entries: vec![e.id],
                }),
            }
        }
        blocks
    }

    /// Display labels: blocks lettered in order, group members numbered.
    pub fn labels(&self) -> Vec<(EntryId, String)> {
        let mut labels = Vec::with_capacity(self.entries.len());
        for (i, block) in self.blocks().iter().enumerate() {
            let letter = block_letter(i);
            if block.entries.len() == 1 && block.structure == SetStructure::Single {
                labels.push((block.entries[0], letter));
            } else {
                for (n, id) in block.entries.iter().enumerate() {
                    labels.push((*id, format!("{letter}{}", n + 1)));
                }
            }
        }
        labels
    }

    /// True when no group is split by another entry.
    pub fn is_contiguous(&self) -> bool {
        let mut closed: HashSet<GroupKey> = HashSet::new();
        let mut current: Option<GroupKey> = None;
        for e in &self.entries {
            let key = e.group_key();
            if current != Some(key) {
                if !closed.insert(key) {
                    return false;
                }
                current = Some(key);
            }
        }
        true
    }
}

/// Spreadsheet-style letters: A..Z, AA, AB, ...
fn block_letter(mut index: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
