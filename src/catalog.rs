use phf::phf_map;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Typical equipment used for an exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Barbell,
    Dumbbell,
    Machine,
    Cable,
    Bodyweight,
    Kettlebell,
    Band,
    Other,
}

impl Equipment {
    pub fn as_str(self) -> &'static str {
        match self {
            Equipment::Barbell => "barbell",
            Equipment::Dumbbell => "dumbbell",
            Equipment::Machine => "machine",
            Equipment::Cable => "cable",
            Equipment::Bodyweight => "bodyweight",
            Equipment::Kettlebell => "kettlebell",
            Equipment::Band => "band",
            Equipment::Other => "other",
        }
    }
}

/// Exercise as returned by the catalog search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogExercise {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub equipment: Option<Equipment>,
    #[serde(default)]
    pub muscle_groups: Vec<String>,
}

impl CatalogExercise {
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            category: None,
            equipment: None,
            muscle_groups: Vec::new(),
        }
    }
}

/// Free-text query plus optional facets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    pub text: String,
    #[serde(default)]
    pub muscle_group: Option<String>,
    #[serde(default)]
    pub equipment: Option<Equipment>,
}

impl SearchQuery {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

const FUZZY_THRESHOLD: f64 = 0.85;

fn score(name: &str, text: &str) -> Option<f64> {
    if text.is_empty() {
        return Some(0.0);
    }
    let name = name.to_lowercase();
    // earlier substring hits rank higher, a prefix scores 2.0
    if let Some(idx) = name.find(text) {
        return Some(1.0 + 1.0 / (1.0 + idx as f64));
    }
    let best = name
        .split_whitespace()
        .map(|word| strsim::jaro_winkler(word, text))
        .fold(strsim::jaro_winkler(&name, text), f64::max);
    (best >= FUZZY_THRESHOLD).then_some(best)
}

/// Filter and rank `catalog` against `query`, best match first.
///
/// Names match case-insensitively by prefix, substring or close spelling.
/// Facets must match exactly when present. Ties keep catalog order.
pub fn search(catalog: &[CatalogExercise], query: &SearchQuery) -> Vec<CatalogExercise> {
    let text = query.text.trim().to_lowercase();
    let mut hits: Vec<(f64, &CatalogExercise)> = catalog
        .iter()
        .filter(|ex| query.equipment.is_none_or(|eq| ex.equipment == Some(eq)))
        .filter(|ex| {
            query.muscle_group.as_deref().is_none_or(|mg| {
                ex.muscle_groups.iter().any(|m| m.eq_ignore_ascii_case(mg))
            })
        })
        .filter_map(|ex| score(&ex.name, &text).map(|s| (s, ex)))
        .collect();
    hits.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    hits.into_iter().map(|(_, ex)| ex.clone()).collect()
}

struct BuiltinInfo {
    id: u32,
    category: &'static str,
    equipment: Equipment,
    muscles: &'static [&'static str],
}

static BUILTIN: phf::Map<&'static str, BuiltinInfo> = phf_map! {
    "Bench Press" => BuiltinInfo {
        id: 1,
        category: "Strength",
        equipment: Equipment::Barbell,
        muscles: &["Chest", "Triceps"],
    },
    "Back Squat" => BuiltinInfo {
        id: 2,
        category: "Strength",
        equipment: Equipment::Barbell,
        muscles: &["Quads", "Glutes"],
    },
    "Deadlift" => BuiltinInfo {
        id: 3,
        category: "Strength",
        equipment: Equipment::Barbell,
        muscles: &["Back", "Hamstrings"],
    },
    "Pull-Up" => BuiltinInfo {
        id: 4,
        category: "Strength",
        equipment: Equipment::Bodyweight,
        muscles: &["Back", "Biceps"],
    },
    "Push-Up" => BuiltinInfo {
        id: 5,
        category: "Strength",
        equipment: Equipment::Bodyweight,
        muscles: &["Chest", "Triceps"],
    },
    "Dumbbell Curl" => BuiltinInfo {
        id: 6,
        category: "Strength",
        equipment: Equipment::Dumbbell,
        muscles: &["Biceps"],
    },
    "Triceps Pushdown" => BuiltinInfo {
        id: 7,
        category: "Strength",
        equipment: Equipment::Cable,
        muscles: &["Triceps"],
    },
    "Lying Leg Curl (Machine)" => BuiltinInfo {
        id: 8,
        category: "Strength",
        equipment: Equipment::Machine,
        muscles: &["Hamstrings"],
    },
    "Kettlebell Swing" => BuiltinInfo {
        id: 9,
        category: "Conditioning",
        equipment: Equipment::Kettlebell,
        muscles: &["Glutes", "Hamstrings"],
    },
    "Plank" => BuiltinInfo {
        id: 10,
        category: "Core",
        equipment: Equipment::Bodyweight,
        muscles: &["Abs"],
    },
};

/// Small offline catalog, sorted by id.
pub fn builtin_catalog() -> Vec<CatalogExercise> {
    let mut all: Vec<CatalogExercise> = BUILTIN
        .entries()
        .map(|(name, info)| CatalogExercise {
            id: info.id,
            name: (*name).to_string(),
            category: Some(info.category.to_string()),
            equipment: Some(info.equipment),
            muscle_groups: info.muscles.iter().map(|m| (*m).to_string()).collect(),
        })
        .collect();
    all.sort_by_key(|e| e.id);
    all
}

/// Look up a built-in exercise by exact name.
pub fn builtin(name: &str) -> Option<CatalogExercise> {
    BUILTIN.get(name).map(|info| CatalogExercise {
        id: info.id,
        name: name.to_string(),
        category: Some(info.category.to_string()),
        equipment: Some(info.equipment),
        muscle_groups: info.muscles.iter().map(|m| (*m).to_string()).collect(),
    })
}
