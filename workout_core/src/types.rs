//! Core domain types for the workout log.
//!
//! This module defines the fundamental types used throughout the system:
//! - Exercise categories and weight units
//! - Strength sets and cardio metrics
//! - The persisted workout record and its partition key

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

// ============================================================================
// Classification
// ============================================================================

/// Category of exercise; decides which grammar and record shape apply
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Strength,
    Bodyweight,
    Machine,
    Cardio,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Strength => "strength",
            Category::Bodyweight => "bodyweight",
            Category::Machine => "machine",
            Category::Cardio => "cardio",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unit of an external load
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum WeightUnit {
    #[default]
    Lb,
    Kg,
}

impl WeightUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Lb => "lb",
            WeightUnit::Kg => "kg",
        }
    }
}

// ============================================================================
// Record Body Types
// ============================================================================

fn is_false(value: &bool) -> bool {
    !*value
}

/// One performed set
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StrengthSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub reps: u32,
    #[serde(default, skip_serializing_if = "is_false")]
    pub failed: bool,
}

impl StrengthSet {
    pub fn bodyweight(reps: u32) -> Self {
        Self {
            weight: None,
            reps,
            failed: false,
        }
    }

    pub fn weighted(weight: f64, reps: u32) -> Self {
        Self {
            weight: Some(weight),
            reps,
            failed: false,
        }
    }

    /// A set where the target reps were not completed
    pub fn failed(weight: Option<f64>) -> Self {
        Self {
            weight,
            reps: 0,
            failed: true,
        }
    }
}

/// Strength, bodyweight and machine work
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Lift {
    pub exercise: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<WeightUnit>,
    pub sets: Vec<StrengthSet>,
}

/// Cardio session metrics; each field is present only if it was mentioned
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Default)]
pub struct CardioSession {
    pub modality: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_mph: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incline_percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
}

/// Category-specific body of a record, tagged by `type` on the wire
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Entry {
    Strength(Lift),
    Bodyweight(Lift),
    Machine(Lift),
    Cardio(CardioSession),
    /// Free-text journal entry; the text lives in the record's `notes`
    Note,
}

impl Entry {
    /// Build the lift variant matching a non-cardio category
    pub fn lift(category: Category, lift: Lift) -> Self {
        match category {
            Category::Bodyweight => Entry::Bodyweight(lift),
            Category::Machine => Entry::Machine(lift),
            _ => Entry::Strength(lift),
        }
    }

    pub fn category(&self) -> Option<Category> {
        match self {
            Entry::Strength(_) => Some(Category::Strength),
            Entry::Bodyweight(_) => Some(Category::Bodyweight),
            Entry::Machine(_) => Some(Category::Machine),
            Entry::Cardio(_) => Some(Category::Cardio),
            Entry::Note => None,
        }
    }

    /// Wire name of the `type` tag
    pub fn kind(&self) -> &'static str {
        match self.category() {
            Some(category) => category.as_str(),
            None => "note",
        }
    }

    /// Canonical exercise id or cardio modality
    pub fn name(&self) -> Option<&str> {
        match self {
            Entry::Strength(lift) | Entry::Bodyweight(lift) | Entry::Machine(lift) => {
                Some(&lift.exercise)
            }
            Entry::Cardio(cardio) => Some(&cardio.modality),
            Entry::Note => None,
        }
    }

    pub fn as_lift(&self) -> Option<&Lift> {
        match self {
            Entry::Strength(lift) | Entry::Bodyweight(lift) | Entry::Machine(lift) => Some(lift),
            _ => None,
        }
    }

    pub fn as_cardio(&self) -> Option<&CardioSession> {
        match self {
            Entry::Cardio(cardio) => Some(cardio),
            _ => None,
        }
    }
}

// ============================================================================
// Persisted Record
// ============================================================================

/// A complete workout log entry, one JSON line in the store
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    #[serde(rename = "ts")]
    pub timestamp: DateTime<FixedOffset>,
    #[serde(flatten)]
    pub entry: Entry,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rpe: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub source: String,
    pub raw: String,
}

impl WorkoutRecord {
    /// Partition this record belongs to, from its local calendar date
    pub fn partition_key(&self) -> PartitionKey {
        PartitionKey::from_datetime(&self.timestamp)
    }
}

/// Year/month/day grouping used by the store
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PartitionKey {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl PartitionKey {
    pub fn from_datetime(ts: &DateTime<FixedOffset>) -> Self {
        Self::from_date(ts.date_naive())
    }

    pub fn from_date(date: chrono::NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
            day: date.day(),
        }
    }

    /// Store-relative file path, `YYYY/MM/DD.jsonl`
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(format!("{:04}", self.year))
            .join(format!("{:02}", self.month))
            .join(format!("{:02}.jsonl", self.day))
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}
