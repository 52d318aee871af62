//! Human-readable rendering of stored records.
//!
//! Display only: output is lossy and is not meant to be parsed back.

use crate::types::{CardioSession, Entry, StrengthSet, WorkoutRecord};

/// Longest commit summary body before truncation
const COMMIT_SUMMARY_LIMIT: usize = 65;

/// `315.0` → `315`, `22.5` → `22.5`
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

/// `pull_up` → `Pull Up`
pub fn display_name(id: &str) -> String {
    id.replace('_', " ")
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn rep_label(set: &StrengthSet) -> String {
    if set.failed {
        format!("{} (fail)", set.reps)
    } else {
        set.reps.to_string()
    }
}

/// Consecutive sets sharing one weight
struct SetGroup {
    weight: Option<f64>,
    reps: Vec<String>,
}

fn group_sets(sets: &[StrengthSet]) -> Vec<SetGroup> {
    let mut groups: Vec<SetGroup> = Vec::new();
    for set in sets {
        match groups.last_mut() {
            Some(group) if group.weight == set.weight => group.reps.push(rep_label(set)),
            _ => groups.push(SetGroup {
                weight: set.weight,
                reps: vec![rep_label(set)],
            }),
        }
    }
    groups
}

/// Concise set summary, e.g. `315x5x3`, `315x[5, 4]` or `20, 20, 25 reps`
pub fn format_sets(sets: &[StrengthSet]) -> String {
    if sets.is_empty() {
        return "No sets".to_string();
    }

    group_sets(sets)
        .iter()
        .map(|group| {
            let count = group.reps.len();
            let first = &group.reps[0];
            let uniform = count > 1 && group.reps.iter().all(|r| r == first);

            match group.weight {
                Some(weight) => {
                    let weight = format_number(weight);
                    if uniform {
                        format!("{}x{}x{}", weight, count, first)
                    } else if count == 1 {
                        format!("{}x{}", weight, first)
                    } else {
                        format!("{}x[{}]", weight, group.reps.join(", "))
                    }
                }
                None if uniform => format!("{}x{} reps", count, first),
                None => format!("{} reps", group.reps.join(", ")),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// `10 min, 3 mi, 3.2 mph, 15% inc` for the metrics present
pub fn format_cardio(session: &CardioSession) -> String {
    let mut parts = Vec::new();
    if let Some(duration) = session.duration_min {
        parts.push(format!("{} min", format_number(duration)));
    }
    if let Some(distance) = session.distance_miles {
        parts.push(format!("{} mi", format_number(distance)));
    }
    if let Some(speed) = session.speed_mph {
        parts.push(format!("{} mph", format_number(speed)));
    }
    if let Some(incline) = session.incline_percent {
        parts.push(format!("{}% inc", format_number(incline)));
    }
    parts.join(", ")
}

/// One-line summary of a record
///
/// ```text
/// [2026-02-16] Squat: 315x5x3 @ RPE 8 - "felt strong"
/// [2026-02-16] Treadmill: 10 min, 3.2 mph, 15% inc
/// [2026-02-16] Note: "Felt tired today"
/// ```
pub fn format_record(record: &WorkoutRecord) -> String {
    let date = record.timestamp.date_naive();
    let notes = record.notes.as_deref().unwrap_or("");

    let (name, summary) = match &record.entry {
        Entry::Note => return format!("[{}] Note: \"{}\"", date, notes),
        Entry::Cardio(session) => (display_name(&session.modality), format_cardio(session)),
        Entry::Strength(lift) | Entry::Bodyweight(lift) | Entry::Machine(lift) => {
            (display_name(&lift.exercise), format_sets(&lift.sets))
        }
    };

    let mut line = format!("[{}] {}: {}", date, name, summary);
    if let Some(rpe) = record.rpe {
        line.push_str(&format!(" @ RPE {}", rpe));
    }
    if !notes.is_empty() {
        line.push_str(&format!(" - \"{}\"", notes));
    }
    line
}

fn truncate_summary(text: &str) -> String {
    if text.chars().count() > COMMIT_SUMMARY_LIMIT {
        let head: String = text.chars().take(COMMIT_SUMMARY_LIMIT).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

/// Commit subject for a record, e.g. `workout: squat 315x5x3 rpe8`
pub fn commit_summary(record: &WorkoutRecord) -> String {
    if record.entry == Entry::Note {
        let notes = record.notes.as_deref().unwrap_or("").trim();
        return format!("note: {}", truncate_summary(notes));
    }

    let mut parts = vec![record.entry.name().unwrap_or("workout").to_string()];

    if let Some(sets) = record.entry.as_lift().map(|lift| &lift.sets) {
        if let Some(first) = sets.first() {
            let uniform = sets
                .iter()
                .all(|s| s.weight == first.weight && s.reps == first.reps);
            let part = match (first.weight, sets.len()) {
                (Some(weight), 1) => format!("{}x{}", format_number(weight), first.reps),
                (None, 1) => first.reps.to_string(),
                (Some(weight), n) if uniform => {
                    format!("{}x{}x{}", format_number(weight), n, first.reps)
                }
                (None, n) if uniform => format!("{}x{}", n, first.reps),
                (_, n) => format!("{} sets", n),
            };
            parts.push(part);
        }
    }

    if let Some(rpe) = record.rpe {
        parts.push(format!("rpe{}", rpe));
    }

    format!("workout: {}", truncate_summary(&parts.join(" ")))
}
