//! Exercise catalog: alias normalization and category classification.
//!
//! The built-in table is compiled in; user-defined exercises from the config
//! file are layered on top with [`Catalog::with_custom`].

use crate::config::CustomExercise;
use crate::types::Category;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Built-in exercises: canonical id, category, aliases
const BUILTIN_EXERCISES: &[(&str, Category, &[&str])] = &[
    // Strength
    ("squat", Category::Strength, &["squat", "sq"]),
    ("bench_press", Category::Strength, &["bench", "bench press", "bp"]),
    ("deadlift", Category::Strength, &["deadlift", "dl"]),
    ("ohp", Category::Strength, &["ohp", "overhead press", "op", "press"]),
    (
        "barbell_row",
        Category::Strength,
        &["row", "rows", "barbell row", "bent over row"],
    ),
    ("incline_row", Category::Strength, &["incline row"]),
    ("weighted_dip", Category::Strength, &["weighted dip"]),
    (
        "dumbbell_bench_press",
        Category::Strength,
        &["db bench", "dumbbell bench", "db press"],
    ),
    ("shrug", Category::Strength, &["shrug"]),
    // Bodyweight
    ("dip", Category::Bodyweight, &["dip"]),
    ("chin_up", Category::Bodyweight, &["chin up", "chin-up", "chinup"]),
    ("weighted_chin_up", Category::Bodyweight, &["weighted chin up"]),
    ("pull_up", Category::Bodyweight, &["pull up", "pull-up", "pullup"]),
    (
        "weighted_pull_up",
        Category::Bodyweight,
        &["weighted pull up", "weighted pullup", "weighted pull-up"],
    ),
    (
        "dragon_flag",
        Category::Bodyweight,
        &["dragon flag", "dragon-flag", "dragonflag"],
    ),
    // Machines
    (
        "chest_press_machine",
        Category::Machine,
        &["chest press", "chest press machine"],
    ),
    (
        "tricep_dip_machine",
        Category::Machine,
        &["tricep dip machine", "triceip dip"],
    ),
    ("ab_crunch", Category::Machine, &["ab crunch", "ab_crunch"]),
    (
        "cybex_ab_crunch",
        Category::Machine,
        &["cybex ab crunch", "cybex_ab_crunch"],
    ),
    ("leg_press", Category::Machine, &["leg press", "leg_press"]),
    ("hack_squat", Category::Machine, &["hack squat", "hack_squat"]),
    ("face_pulls", Category::Machine, &["face pulls", "face pull"]),
    (
        "lat_pulldown",
        Category::Machine,
        &["lat pulldown", "lat pull down", "lat pull-down"],
    ),
    // Cardio
    ("treadmill", Category::Cardio, &["treadmill", "tm"]),
    ("rowing", Category::Cardio, &["rowing", "rower", "row machine"]),
    (
        "stationary_bike",
        Category::Cardio,
        &["bike", "stationary bike"],
    ),
];

/// Longest alias, in words; bounds the orchestrator's multi-word lookup
pub const MAX_ALIAS_WORDS: usize = 3;

/// A canonical exercise and its classification
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExerciseDef {
    pub id: String,
    pub category: Category,
    pub aliases: Vec<String>,
}

impl ExerciseDef {
    /// Dumbbell movements accept the `2xW NxR` pair notation
    pub fn is_dumbbell(&self) -> bool {
        self.id.contains("dumbbell")
    }
}

/// Alias table plus classification for every canonical id
#[derive(Clone, Debug)]
pub struct Catalog {
    exercises: Vec<ExerciseDef>,
    by_alias: HashMap<String, usize>,
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Builds the catalog of built-in exercises
pub fn build_default_catalog() -> Catalog {
    let mut catalog = Catalog {
        exercises: Vec::with_capacity(BUILTIN_EXERCISES.len()),
        by_alias: HashMap::new(),
    };
    for (id, category, aliases) in BUILTIN_EXERCISES {
        catalog.insert(ExerciseDef {
            id: (*id).to_string(),
            category: *category,
            aliases: aliases.iter().map(|a| (*a).to_string()).collect(),
        });
    }
    catalog
}

/// Lowercase, trim, and collapse inner whitespace
fn alias_key(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

impl Catalog {
    /// Default catalog extended with user-defined exercises
    pub fn with_custom(custom: &[CustomExercise]) -> Self {
        let mut catalog = build_default_catalog();
        for exercise in custom {
            tracing::debug!(
                "Registering custom exercise '{}' ({})",
                exercise.id,
                exercise.category
            );
            catalog.insert(ExerciseDef {
                id: exercise.id.clone(),
                category: exercise.category,
                aliases: exercise.aliases.clone(),
            });
        }
        catalog
    }

    fn insert(&mut self, def: ExerciseDef) {
        let index = match self.exercises.iter().position(|e| e.id == def.id) {
            Some(existing) => {
                self.exercises[existing].category = def.category;
                self.exercises[existing].aliases.extend(def.aliases.iter().cloned());
                existing
            }
            None => {
                self.exercises.push(def.clone());
                self.exercises.len() - 1
            }
        };
        for alias in &def.aliases {
            self.by_alias.insert(alias_key(alias), index);
        }
    }

    /// Resolve an alias to its canonical exercise
    ///
    /// Case-insensitive exact match; no fuzzy matching.
    pub fn normalize(&self, raw_name: &str) -> Option<&ExerciseDef> {
        self.by_alias
            .get(&alias_key(raw_name))
            .map(|&index| &self.exercises[index])
    }

    /// Category of a canonical exercise id
    pub fn classify(&self, id: &str) -> Option<Category> {
        self.get(id).map(|e| e.category)
    }

    pub fn get(&self, id: &str) -> Option<&ExerciseDef> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn exercises(&self) -> &[ExerciseDef] {
        &self.exercises
    }

    /// Validate the catalog for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        for def in &self.exercises {
            if def.id.trim().is_empty() {
                errors.push("Exercise has empty ID".to_string());
            }
            if def.id.chars().any(char::is_whitespace) {
                errors.push(format!("Exercise ID '{}' contains whitespace", def.id));
            }
            if def.aliases.is_empty() {
                errors.push(format!("Exercise '{}' has no aliases", def.id));
            }
            for alias in &def.aliases {
                let key = alias_key(alias);
                if key.is_empty() {
                    errors.push(format!("Exercise '{}' has an empty alias", def.id));
                } else if key.split(' ').count() > MAX_ALIAS_WORDS {
                    errors.push(format!(
                        "Alias '{}' of '{}' is longer than {} words",
                        alias, def.id, MAX_ALIAS_WORDS
                    ));
                }
            }
        }

        for (alias, &index) in &self.by_alias {
            if index >= self.exercises.len() {
                errors.push(format!("Alias '{}' references a missing exercise", alias));
            }
        }

        errors
    }
}
