// Planned sets for a single exercise entry
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeightUnit {
    #[default]
    Lbs,
    Kg,
}

impl WeightUnit {
    pub fn code(self) -> u8 {
        match self {
            WeightUnit::Lbs => 0,
            WeightUnit::Kg => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(WeightUnit::Lbs),
            1 => Some(WeightUnit::Kg),
            _ => None,
        }
    }
}

/// Scale used to record effort in the `rir` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EffortScale {
    /// Reps in reserve.
    #[default]
    Rir,
    /// Rate of perceived exertion.
    Rpe,
}

impl EffortScale {
    pub fn code(self) -> u8 {
        match self {
            EffortScale::Rir => 0,
            EffortScale::Rpe => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(EffortScale::Rir),
            1 => Some(EffortScale::Rpe),
            _ => None,
        }
    }
}

/// Meaning of the `duration` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DurationOrVelocity {
    #[default]
    Duration,
    Velocity,
}

impl DurationOrVelocity {
    pub fn code(self) -> u8 {
        match self {
            DurationOrVelocity::Duration => 0,
            DurationOrVelocity::Velocity => 1,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(DurationOrVelocity::Duration),
            1 => Some(DurationOrVelocity::Velocity),
            _ => None,
        }
    }
}

/// Weight as typed by the trainer.
///
/// Placeholder text such as `"BW"` is kept verbatim while editing. Numeric
/// text is only resolved to a number when the workout is serialized, see
/// [`Weight::resolved`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Weight {
    Amount(f64),
    Text(String),
}

impl Default for Weight {
    fn default() -> Self {
        Weight::Text(String::new())
    }
}

impl Weight {
    /// Classify raw input from a weight cell.
    pub fn parse_input(input: &str) -> Self {
        let trimmed = input.trim();
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Weight::Amount(v),
            _ => Weight::Text(trimmed.to_string()),
        }
    }

    /// Resolve numeric text into an amount, leaving real placeholders alone.
    pub fn resolved(&self) -> Weight {
        match self {
            Weight::Amount(v) => Weight::Amount(*v),
            Weight::Text(t) => Weight::parse_input(t),
        }
    }
}

static REPS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)(\s*-\s*(\d+))?\s*$").expect("valid reps pattern"));

/// Accepts empty text, a count (`"8"`) or an ascending range (`"8-10"`).
pub fn is_valid_reps(reps: &str) -> bool {
    if reps.trim().is_empty() {
        return true;
    }
    let Some(caps) = REPS_PATTERN.captures(reps) else {
        return false;
    };
    match (caps.get(1), caps.get(3)) {
        (Some(lo), Some(hi)) => {
            let lo: u32 = lo.as_str().parse().unwrap_or(u32::MAX);
            let hi: u32 = hi.as_str().parse().unwrap_or(0);
            lo <= hi
        }
        (Some(_), None) => true,
        _ => false,
    }
}

/// One planned set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetRow {
    pub set_order: u32,
    pub reps: String,
    pub weight: Weight,
    pub weight_unit: WeightUnit,
    pub rir: Option<f64>,
    pub rir_or_rpe: EffortScale,
    pub duration_or_velocity: DurationOrVelocity,
    pub duration: Option<f64>,
}

impl SetRow {
    pub fn new(set_order: u32) -> Self {
        Self {
            set_order,
            reps: String::new(),
            weight: Weight::default(),
            weight_unit: WeightUnit::default(),
            rir: Some(0.0),
            rir_or_rpe: EffortScale::default(),
            duration_or_velocity: DurationOrVelocity::default(),
            duration: None,
        }
    }

    pub fn apply(&mut self, field: &SetField) {
        match field {
            SetField::Reps(v) => self.reps = v.clone(),
            SetField::Weight(v) => self.weight = v.clone(),
            SetField::WeightUnit(v) => self.weight_unit = *v,
            SetField::Rir(v) => self.rir = *v,
            SetField::EffortScale(v) => self.rir_or_rpe = *v,
            SetField::DurationOrVelocity(v) => self.duration_or_velocity = *v,
            SetField::Duration(v) => self.duration = *v,
        }
    }
}

/// A single set column together with its new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum SetField {
    Reps(String),
    Weight(Weight),
    WeightUnit(WeightUnit),
    Rir(Option<f64>),
    EffortScale(EffortScale),
    DurationOrVelocity(DurationOrVelocity),
    Duration(Option<f64>),
}

/// Columns that are shown once per exercise but stored on every set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum ExerciseField {
    WeightUnit(WeightUnit),
    EffortScale(EffortScale),
    DurationOrVelocity(DurationOrVelocity),
}

impl From<ExerciseField> for SetField {
    fn from(field: ExerciseField) -> Self {
        match field {
            ExerciseField::WeightUnit(v) => SetField::WeightUnit(v),
            ExerciseField::EffortScale(v) => SetField::EffortScale(v),
            ExerciseField::DurationOrVelocity(v) => SetField::DurationOrVelocity(v),
        }
    }
}

/// Ordered set rows of one exercise entry. `set_order` is kept dense from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTable {
    rows: Vec<SetRow>,
}

impl Default for SetTable {
    /// A new exercise starts with one blank set.
    fn default() -> Self {
        Self {
            rows: vec![SetRow::new(1)],
        }
    }
}

impl SetTable {
    pub fn empty() -> Self {
        Self { rows: Vec::new() }
    }

    /// Build a table from existing rows, renumbering them by position.
    pub fn from_rows(rows: Vec<SetRow>) -> Self {
        let mut table = Self { rows };
        table.renumber();
        table
    }

    pub fn rows(&self) -> &[SetRow] {
        &self.rows
    }

    pub fn get(&self, index: usize) -> Option<&SetRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append a blank set numbered after the current last set.
    pub fn add_set(&mut self) -> u32 {
        let next = self.rows.last().map_or(0, |r| r.set_order) + 1;
        self.rows.push(SetRow::new(next));
        next
    }

    /// Remove the set at `index` and renumber the rest. Out of range is a no-op.
    pub fn remove_set(&mut self, index: usize) -> Option<SetRow> {
        if index >= self.rows.len() {
            return None;
        }
        let removed = self.rows.remove(index);
        self.renumber();
        Some(removed)
    }

    pub fn update_field(&mut self, index: usize, field: &SetField) -> bool {
        match self.rows.get_mut(index) {
            Some(row) => {
                row.apply(field);
                true
            }
            None => false,
        }
    }

    pub fn update_field_for_all_sets(&mut self, field: &SetField) {
        for row in &mut self.rows {
            row.apply(field);
        }
    }

    /// Orders of the sets whose reps text [`is_valid_reps`] rejects.
    pub fn invalid_reps(&self) -> Vec<u32> {
        self.rows
            .iter()
            .filter(|r| !is_valid_reps(&r.reps))
            .map(|r| r.set_order)
            .collect()
    }

    pub fn renumber(&mut self) {
        for (i, row) in self.rows.iter_mut().enumerate() {
            row.set_order = i as u32 + 1;
        }
    }
}
