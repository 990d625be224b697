//! Mapping between the editor state and the "save workout" request body.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::catalog::CatalogExercise;
use crate::engine::{EntryId, ExerciseEntry, ExerciseGroupingEngine, GroupId, SetStructure};
use crate::sets::{DurationOrVelocity, EffortScale, SetRow, SetTable, Weight, WeightUnit};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutPayload {
    pub workout_data: WorkoutData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutData {
    pub client_id: Option<u64>,
    pub workout_name: String,
    pub workout_date: NaiveDate,
    pub workout_start_time: DateTime<Utc>,
    pub workout_end_time: DateTime<Utc>,
    pub workout_type: String,
    /// Length in minutes.
    pub duration: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prebuilt_workout: Option<u64>,
    pub exercises: Vec<PayloadExercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadExercise {
    /// Catalog exercise id.
    pub id: u32,
    #[serde(default)]
    pub exercise_name: Option<String>,
    pub exercise_order: u32,
    /// 0 when the exercise is not part of a superset or circuit.
    #[serde(default)]
    pub group_id: u64,
    #[serde(default)]
    pub set_structure: u8,
    #[serde(default)]
    pub sets: Vec<PayloadSet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayloadSet {
    pub sets_order: u32,
    #[serde(default)]
    pub weight: Weight,
    #[serde(default)]
    pub reps: String,
    #[serde(default)]
    pub rir: Option<f64>,
    #[serde(default)]
    pub weight_unit: Option<u8>,
    #[serde(default)]
    pub duration_or_velocity: Option<u8>,
    #[serde(default)]
    pub rir_or_rpe: Option<u8>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Structured workout proposed by the AI agent run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSuggestion {
    #[serde(default)]
    pub workout_name: Option<String>,
    #[serde(default)]
    pub exercises: Vec<PayloadExercise>,
}

impl WorkoutSuggestion {
    pub fn into_engine(self) -> ExerciseGroupingEngine {
        ExerciseGroupingEngine::from_exercises(&self.exercises)
    }
}

/// Workout-level fields entered next to the exercise list.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDetails {
    pub client_id: Option<u64>,
    pub workout_name: String,
    pub workout_date: NaiveDate,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub workout_type: String,
    pub prebuilt_workout: Option<u64>,
}

impl WorkoutDetails {
    pub fn starting_at(
        workout_name: impl Into<String>,
        start: DateTime<Utc>,
        minutes: u32,
        workout_type: impl Into<String>,
    ) -> Self {
        Self {
            client_id: None,
            workout_name: workout_name.into(),
            workout_date: start.date_naive(),
            start,
            end: start + Duration::minutes(i64::from(minutes)),
            workout_type: workout_type.into(),
            prebuilt_workout: None,
        }
    }

    /// Whole minutes between start and end, zero if end precedes start.
    pub fn duration_minutes(&self) -> u32 {
        let minutes = (self.end - self.start).num_minutes().max(0);
        u32::try_from(minutes).unwrap_or(u32::MAX)
    }
}

impl From<&WorkoutData> for WorkoutDetails {
    fn from(data: &WorkoutData) -> Self {
        Self {
            client_id: data.client_id,
            workout_name: data.workout_name.clone(),
            workout_date: data.workout_date,
            start: data.workout_start_time,
            end: data.workout_end_time,
            workout_type: data.workout_type.clone(),
            prebuilt_workout: data.prebuilt_workout,
        }
    }
}

impl WorkoutPayload {
    /// Copy of this payload addressed to another client.
    pub fn for_client(&self, client_id: u64) -> Self {
        let mut copy = self.clone();
        copy.workout_data.client_id = Some(client_id);
        copy
    }
}

fn wire_set(row: &SetRow) -> PayloadSet {
    PayloadSet {
        sets_order: row.set_order,
        weight: row.weight.resolved(),
        reps: row.reps.trim().to_string(),
        rir: row.rir,
        weight_unit: Some(row.weight_unit.code()),
        duration_or_velocity: Some(row.duration_or_velocity.code()),
        rir_or_rpe: Some(row.rir_or_rpe.code()),
        duration: row.duration,
    }
}

fn wire_exercise(entry: &ExerciseEntry) -> PayloadExercise {
    let bad = entry.sets.invalid_reps();
    if !bad.is_empty() {
        log::warn!(
            "Saving '{}' with unrecognised reps in sets {bad:?}",
            entry.exercise.name
        );
    }
    PayloadExercise {
        id: entry.exercise.id,
        exercise_name: Some(entry.exercise.name.clone()),
        exercise_order: entry.order,
        group_id: entry.group_id.map_or(0, |g| g.0),
        set_structure: entry.structure.code(),
        sets: entry.sets.rows().iter().map(wire_set).collect(),
    }
}

fn code_or_default<T: Default>(code: Option<u8>, parse: fn(u8) -> Option<T>, what: &str) -> T {
    match code {
        None => T::default(),
        Some(c) => parse(c).unwrap_or_else(|| {
            log::warn!("Unknown {what} code {c}, using default");
            T::default()
        }),
    }
}

fn hydrate_set(set: &PayloadSet) -> SetRow {
    SetRow {
        set_order: set.sets_order,
        reps: set.reps.clone(),
        weight: set.weight.clone(),
        weight_unit: code_or_default(set.weight_unit, WeightUnit::from_code, "weight unit"),
        rir: set.rir,
        rir_or_rpe: code_or_default(set.rir_or_rpe, EffortScale::from_code, "effort scale"),
        duration_or_velocity: code_or_default(
            set.duration_or_velocity,
            DurationOrVelocity::from_code,
            "duration/velocity",
        ),
        duration: set.duration,
    }
}

impl ExerciseGroupingEngine {
    /// Serialize the current list for the save call.
    ///
    /// Numeric weight text becomes a number here; everything else is sent
    /// as typed.
    pub fn to_payload(&self, details: &WorkoutDetails) -> WorkoutPayload {
        WorkoutPayload {
            workout_data: WorkoutData {
                client_id: details.client_id,
                workout_name: details.workout_name.clone(),
                workout_date: details.workout_date,
                workout_start_time: details.start,
                workout_end_time: details.end,
                workout_type: details.workout_type.clone(),
                duration: details.duration_minutes(),
                prebuilt_workout: details.prebuilt_workout,
                exercises: self.entries().iter().map(wire_exercise).collect(),
            },
        }
    }

    /// Rebuild an editor state from wire exercises (saved drafts, AI output).
    ///
    /// Exercises are taken in `exercise_order`, every distinct non-zero wire
    /// group gets a fresh [`GroupId`] and sets are renumbered densely.
    pub fn from_exercises(exercises: &[PayloadExercise]) -> Self {
        let mut sorted: Vec<&PayloadExercise> = exercises.iter().collect();
        sorted.sort_by_key(|e| e.exercise_order);

        let mut groups: HashMap<u64, GroupId> = HashMap::new();
        let mut entries = Vec::with_capacity(sorted.len());
        for (i, ex) in sorted.into_iter().enumerate() {
            let mut rows: Vec<&PayloadSet> = ex.sets.iter().collect();
            rows.sort_by_key(|s| s.sets_order);

            let group_id = match ex.group_id {
                0 => None,
                wire => {
                    let next = GroupId(groups.len() as u64 + 1);
                    Some(*groups.entry(wire).or_insert(next))
                }
            };
            let structure = SetStructure::from_code(ex.set_structure).unwrap_or_else(|| {
                log::warn!("Unknown set structure {} for exercise {}", ex.set_structure, ex.id);
                SetStructure::Single
            });
            let catalog = CatalogExercise::new(
                ex.id,
                ex.exercise_name.clone().unwrap_or_else(|| format!("Exercise {}", ex.id)),
            );
            let mut entry = ExerciseEntry::new(EntryId(i as u64 + 1), catalog);
            entry.group_id = group_id;
            entry.structure = structure;
            entry.sets = SetTable::from_rows(rows.into_iter().map(hydrate_set).collect());
            entries.push(entry);
        }
        log::debug!("Hydrated {} exercises in {} groups", entries.len(), groups.len());
        Self::from_entries(entries)
    }
}
