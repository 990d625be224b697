//! Workout editor core for trainer-built workouts.
//!
//! [`engine::ExerciseGroupingEngine`] keeps the ordered list of exercises,
//! grouping them into supersets and circuits, and each entry owns a
//! [`sets::SetTable`]. Everything else maps that state to and from the
//! backend: wire payloads, catalog search and the HTTP client.

pub mod api;
pub mod catalog;
pub mod drag;
pub mod engine;
pub mod export;
pub mod navigation;
pub mod payload;
pub mod search;
pub mod sets;
pub mod settings;

pub use engine::{
    Command, EntryId, ExerciseEntry, ExerciseGroupingEngine, GroupContext, GroupId, GroupKey,
    SetStructure,
};
pub use payload::{WorkoutDetails, WorkoutPayload};
pub use sets::{SetField, SetRow, SetTable};
