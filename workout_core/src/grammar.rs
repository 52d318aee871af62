//! Set and cardio notation grammars.
//!
//! Strength-style payloads are matched by an ordered list of [`SetRule`]s;
//! the first rule that matches decides how the leading tokens are read.
//! Cardio payloads are scanned by independent extractors that may all fire.

use crate::catalog::ExerciseDef;
use crate::error::ParseError;
use crate::types::{CardioSession, Category, StrengthSet};
use once_cell::sync::Lazy;
use regex::Regex;

static BARE_WEIGHT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid regex"));
static BARE_COUNT: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+$").expect("valid regex"));
static WEIGHT_BY_COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)x(\d+)$").expect("valid regex"));
static WEIGHT_SETS_REPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+(?:\.\d+)?)x(\d+)x(\d+)$").expect("valid regex"));
static TRAILING_REPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^x?(\d+)$").expect("valid regex"));
static SETS_BY_REPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)x(\d+)$").expect("valid regex"));
static DUMBBELL_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^2x(\d+(?:\.\d+)?)$").expect("valid regex"));
static DUMBBELL_SETS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(\d+)x(\d+(?:,\d+)*)$").expect("valid regex"));
static RPE_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^rpe(\d+)$").expect("valid regex"));

static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*min(?:ute)?s?").expect("valid regex"));
static SPEED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*mph").expect("valid regex"));
static INCLINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*degree\s*incline|incline\s*(\d+(?:\.\d+)?)")
        .expect("valid regex")
});
static DISTANCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*miles?").expect("valid regex"));
static SEPARATORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").expect("valid regex"));

/// Note attached to dumbbell pair notation
pub const PER_DUMBBELL_NOTE: &str = "per dumbbell";

/// Most sets one message may describe
pub const MAX_SETS: usize = 100;

// ============================================================================
// Rep lists
// ============================================================================

/// One component of a comma reps list
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RepCount {
    Completed(u32),
    Failed,
}

impl RepCount {
    fn into_set(self, weight: Option<f64>) -> StrengthSet {
        match self {
            RepCount::Completed(reps) => StrengthSet {
                weight,
                reps,
                failed: false,
            },
            RepCount::Failed => StrengthSet::failed(weight),
        }
    }
}

/// Parse `20,20,25` or `2,1,x`; `x`, `f` and `fail` mark a failed set
///
/// Returns `None` if any component is empty or not a rep count.
pub fn parse_rep_list(token: &str) -> Option<Vec<RepCount>> {
    token
        .split(',')
        .map(|part| {
            let part = part.trim().to_lowercase();
            match part.as_str() {
                "x" | "f" | "fail" => Some(RepCount::Failed),
                _ if BARE_COUNT.is_match(&part) => part.parse().ok().map(RepCount::Completed),
                _ => None,
            }
        })
        .collect()
}

fn parse_weight(token: &str) -> Option<f64> {
    if BARE_WEIGHT.is_match(token) {
        token.parse().ok()
    } else {
        None
    }
}

/// `count` identical sets, or `None` past [`MAX_SETS`]
fn repeat_set(weight: Option<f64>, count: u32, reps: u32) -> Option<Vec<StrengthSet>> {
    if count as usize > MAX_SETS {
        return None;
    }
    Some(
        (0..count)
            .map(|_| StrengthSet {
                weight,
                reps,
                failed: false,
            })
            .collect(),
    )
}

// ============================================================================
// Strength rules
// ============================================================================

/// Leading tokens claimed by a rule and the sets they describe
#[derive(Clone, Debug, PartialEq)]
pub struct SetMatch {
    pub sets: Vec<StrengthSet>,
    pub consumed: usize,
    pub note: Option<&'static str>,
}

impl SetMatch {
    fn new(sets: Vec<StrengthSet>, consumed: usize) -> Option<Self> {
        if sets.is_empty() {
            return None;
        }
        Some(Self {
            sets,
            consumed,
            note: None,
        })
    }
}

/// Set notations, tried in [`SET_RULES`] order
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetRule {
    /// `20,20,25` / `2,1,x`
    CommaReps,
    /// `2x90 4x10,7` for dumbbell movements
    DumbbellPair,
    /// `315x5x3`, `315x5 3`, `315x5`, bodyweight `7x10`
    WeightSetsReps,
    /// `405 1x3`
    WeightThenSetsReps,
    /// `405 2,1,x`
    WeightCommaReps,
    /// bodyweight `20`
    BodyweightSingle,
}

pub const SET_RULES: [SetRule; 6] = [
    SetRule::CommaReps,
    SetRule::DumbbellPair,
    SetRule::WeightSetsReps,
    SetRule::WeightThenSetsReps,
    SetRule::WeightCommaReps,
    SetRule::BodyweightSingle,
];

impl SetRule {
    pub fn name(&self) -> &'static str {
        match self {
            SetRule::CommaReps => "comma_reps",
            SetRule::DumbbellPair => "dumbbell_pair",
            SetRule::WeightSetsReps => "weight_sets_reps",
            SetRule::WeightThenSetsReps => "weight_then_sets_reps",
            SetRule::WeightCommaReps => "weight_comma_reps",
            SetRule::BodyweightSingle => "bodyweight_single",
        }
    }

    /// Try this rule against the leading payload tokens
    pub fn apply(&self, exercise: &ExerciseDef, tokens: &[&str]) -> Option<SetMatch> {
        let first = *tokens.first()?;
        let second = tokens.get(1).copied();

        match self {
            SetRule::CommaReps => {
                if !first.contains(',') {
                    return None;
                }
                let reps = parse_rep_list(first)?;
                SetMatch::new(reps.into_iter().map(|r| r.into_set(None)).collect(), 1)
            }

            SetRule::DumbbellPair => {
                if !exercise.is_dumbbell() {
                    return None;
                }
                let weight: f64 = DUMBBELL_PAIR.captures(first)?[1].parse().ok()?;
                let caps = DUMBBELL_SETS.captures(second?)?;
                let uniform: u32 = caps[1].parse().ok()?;
                let reps = caps[2]
                    .split(',')
                    .map(|r| r.parse::<u32>().ok())
                    .collect::<Option<Vec<_>>>()?;
                let (main, extra) = reps.split_first()?;

                let mut sets = repeat_set(Some(weight), uniform, *main)?;
                sets.extend(extra.iter().map(|&r| StrengthSet::weighted(weight, r)));
                if sets.len() > MAX_SETS {
                    return None;
                }

                let mut matched = SetMatch::new(sets, 2)?;
                matched.note = Some(PER_DUMBBELL_NOTE);
                Some(matched)
            }

            SetRule::WeightSetsReps => {
                if let Some(caps) = WEIGHT_SETS_REPS.captures(first) {
                    let weight: f64 = caps[1].parse().ok()?;
                    let count: u32 = caps[2].parse().ok()?;
                    let reps: u32 = caps[3].parse().ok()?;
                    return SetMatch::new(repeat_set(Some(weight), count, reps)?, 1);
                }

                let caps = WEIGHT_BY_COUNT.captures(first)?;
                let second_number: u32 = caps[2].parse().ok()?;

                if let Some(trailing) = second.and_then(|t| TRAILING_REPS.captures(t)) {
                    let weight: f64 = caps[1].parse().ok()?;
                    let reps: u32 = trailing[1].parse().ok()?;
                    return SetMatch::new(repeat_set(Some(weight), second_number, reps)?, 2);
                }

                if exercise.category == Category::Bodyweight {
                    // sets x reps, no load
                    let count: u32 = caps[1].parse().ok()?;
                    SetMatch::new(repeat_set(None, count, second_number)?, 1)
                } else {
                    let weight: f64 = caps[1].parse().ok()?;
                    SetMatch::new(vec![StrengthSet::weighted(weight, second_number)], 1)
                }
            }

            SetRule::WeightThenSetsReps => {
                let weight = parse_weight(first)?;
                let caps = SETS_BY_REPS.captures(second?)?;
                let count: u32 = caps[1].parse().ok()?;
                let reps: u32 = caps[2].parse().ok()?;
                SetMatch::new(repeat_set(Some(weight), count, reps)?, 2)
            }

            SetRule::WeightCommaReps => {
                let weight = parse_weight(first)?;
                let reps = parse_rep_list(second?)?;
                SetMatch::new(
                    reps.into_iter().map(|r| r.into_set(Some(weight))).collect(),
                    2,
                )
            }

            SetRule::BodyweightSingle => {
                if exercise.category != Category::Bodyweight || !BARE_COUNT.is_match(first) {
                    return None;
                }
                let reps: u32 = first.parse().ok()?;
                SetMatch::new(vec![StrengthSet::bodyweight(reps)], 1)
            }
        }
    }
}

/// Sets, RPE and notes read from a strength-style payload
#[derive(Clone, Debug, PartialEq)]
pub struct SetExtraction {
    pub rule: SetRule,
    pub sets: Vec<StrengthSet>,
    pub rpe: Option<u32>,
    pub notes: Option<String>,
}

/// Run the strength rules in priority order over the payload tokens
pub fn parse_sets(exercise: &ExerciseDef, tokens: &[&str]) -> Result<SetExtraction, ParseError> {
    let (rule, matched) = SET_RULES
        .iter()
        .find_map(|rule| rule.apply(exercise, tokens).map(|m| (*rule, m)))
        .ok_or_else(|| ParseError::UnparseableSetFormat(tokens.join(" ")))?;

    tracing::debug!(
        "Set rule '{}' matched {} token(s) for {}",
        rule.name(),
        matched.consumed,
        exercise.id
    );

    let (rpe, rest) = extract_rpe(&tokens[matched.consumed..]);
    let rest = rest.join(" ");
    let notes = match (matched.note, rest.is_empty()) {
        (Some(note), true) => Some(note.to_string()),
        (Some(note), false) => Some(format!("{}; {}", note, rest)),
        (None, true) => None,
        (None, false) => Some(rest),
    };

    Ok(SetExtraction {
        rule,
        sets: matched.sets,
        rpe,
        notes,
    })
}

/// Pull `rpe<N>` tokens out of the leftovers; the first one wins
pub fn extract_rpe<'a>(tokens: &[&'a str]) -> (Option<u32>, Vec<&'a str>) {
    let mut rpe = None;
    let mut rest = Vec::with_capacity(tokens.len());
    for token in tokens {
        match RPE_TOKEN.captures(token) {
            Some(_) if rpe.is_some() => {}
            // An out-of-range value stays in the notes
            Some(caps) => match caps[1].parse::<u32>() {
                Ok(value) => rpe = Some(value),
                Err(_) => rest.push(*token),
            },
            None => rest.push(*token),
        }
    }
    (rpe, rest)
}

// ============================================================================
// Cardio
// ============================================================================

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    re.captures(text).and_then(|caps| {
        caps.iter()
            .skip(1)
            .flatten()
            .next()
            .and_then(|m| m.as_str().parse().ok())
    })
}

/// Extract cardio metrics from free text; leftovers become notes
pub fn parse_cardio(modality: &str, payload: &str) -> (CardioSession, Option<String>) {
    let session = CardioSession {
        modality: modality.to_string(),
        duration_min: first_number(&DURATION, payload),
        speed_mph: first_number(&SPEED, payload),
        incline_percent: first_number(&INCLINE, payload),
        distance_miles: first_number(&DISTANCE, payload),
    };

    let mut remaining = payload.to_string();
    for re in [&*DURATION, &*SPEED, &*INCLINE, &*DISTANCE] {
        remaining = re.replace_all(&remaining, "").into_owned();
    }
    let notes = SEPARATORS.replace_all(&remaining, " ").trim().to_string();

    (session, Some(notes).filter(|n| !n.is_empty()))
}
