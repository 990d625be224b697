use serde::Serialize;
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;

use crate::engine::ExerciseGroupingEngine;
use crate::payload::WorkoutPayload;
use crate::sets::Weight;

pub fn write_json<T: Serialize + ?Sized, P: AsRef<Path>>(
    value: &T,
    path: P,
) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value).map_err(std::io::Error::other)
}

pub fn save_payload_json<P: AsRef<Path>>(path: P, payload: &WorkoutPayload) -> std::io::Result<()> {
    write_json(payload, path)
}

pub fn load_payload_json<P: AsRef<Path>>(path: P) -> std::io::Result<WorkoutPayload> {
    let data = std::fs::read_to_string(path)?;
    serde_json::from_str(&data).map_err(std::io::Error::other)
}

#[derive(Serialize)]
struct SetSheetRow<'a> {
    exercise_order: u32,
    label: &'a str,
    exercise: &'a str,
    structure: &'static str,
    set_order: u32,
    reps: &'a str,
    weight: String,
    weight_unit: &'static str,
    rir: Option<f64>,
    effort_scale: &'static str,
    duration_or_velocity: &'static str,
    duration: Option<f64>,
}

/// Write one CSV row per planned set, in list order.
pub fn write_sets_csv(writer: impl Write, engine: &ExerciseGroupingEngine) -> csv::Result<()> {
    use crate::sets::{DurationOrVelocity, EffortScale, WeightUnit};

    let labels: HashMap<_, _> = engine.labels().into_iter().collect();
    let mut wtr = csv::Writer::from_writer(writer);
    for entry in engine.entries() {
        let label = labels.get(&entry.id).map(String::as_str).unwrap_or("");
        for row in entry.sets.rows() {
            let weight = match &row.weight {
                Weight::Amount(v) => v.to_string(),
                Weight::Text(t) => t.clone(),
            };
            wtr.serialize(SetSheetRow {
                exercise_order: entry.order,
                label,
                exercise: &entry.exercise.name,
                structure: entry.structure.as_str(),
                set_order: row.set_order,
                reps: &row.reps,
                weight,
                weight_unit: match row.weight_unit {
                    WeightUnit::Lbs => "lbs",
                    WeightUnit::Kg => "kg",
                },
                rir: row.rir,
                effort_scale: match row.rir_or_rpe {
                    EffortScale::Rir => "rir",
                    EffortScale::Rpe => "rpe",
                },
                duration_or_velocity: match row.duration_or_velocity {
                    DurationOrVelocity::Duration => "duration",
                    DurationOrVelocity::Velocity => "velocity",
                },
                duration: row.duration,
            })?;
        }
    }
    wtr.flush().map_err(Into::into)
}

pub fn save_sets_csv<P: AsRef<Path>>(path: P, engine: &ExerciseGroupingEngine) -> csv::Result<()> {
    write_sets_csv(std::fs::File::create(path)?, engine)
}
