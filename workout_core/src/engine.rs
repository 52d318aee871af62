//! Parsing engine: turns one message into a workout record.
//!
//! Stages, in order, with no backtracking between them:
//! 1. Command prefix (`/log`, `/note`)
//! 2. Leading or trailing date modifier
//! 3. Exercise name (longest alias first)
//! 4. Timestamp and partition key
//! 5. Category grammar (strength-style sets or cardio metrics)
//! 6. Record assembly
//!
//! The engine is pure: no filesystem, clock or process access.

use crate::catalog::{Catalog, ExerciseDef, MAX_ALIAS_WORDS};
use crate::date::{DateModifier, DateResolver};
use crate::error::ParseError;
use crate::grammar;
use crate::types::{Category, Entry, Lift, PartitionKey, WeightUnit, WorkoutRecord};
use chrono::{DateTime, FixedOffset, TimeZone};
use once_cell::sync::Lazy;
use regex::Regex;

static LEADING_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(yesterday|today|\d{4}-\d{2}-\d{2})(?:\s*:\s*|\s+)").expect("valid regex")
});
static TRAILING_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+(\d{4}-\d{2}-\d{2})\s*$").expect("valid regex"));

const LOG_PREFIX: &str = "/log";
const NOTE_PREFIX: &str = "/note";

/// Whether messages must carry a `/log` or `/note` command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PrefixPolicy {
    /// Push-based chat messages: a command is mandatory
    Required,
    /// CLI input: a command is stripped when present, otherwise `/log` is implied
    #[default]
    Optional,
}

/// What the message asks to record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Log,
    Note,
}

/// A finished record and the partition it belongs in
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedMessage {
    pub record: WorkoutRecord,
    pub partition: PartitionKey,
}

/// `text` without `prefix`, if `prefix` is followed by whitespace or nothing
fn strip_command<'t>(text: &'t str, prefix: &str) -> Option<&'t str> {
    let rest = text.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

/// Split the command marker from the message body
pub fn split_command(message: &str, policy: PrefixPolicy) -> Result<(Command, &str), ParseError> {
    let text = message.trim_start();
    if let Some(rest) = strip_command(text, LOG_PREFIX) {
        return Ok((Command::Log, rest.trim()));
    }
    if let Some(rest) = strip_command(text, NOTE_PREFIX) {
        return Ok((Command::Note, rest.trim()));
    }
    match policy {
        PrefixPolicy::Required => Err(ParseError::InvalidPrefix),
        PrefixPolicy::Optional => Ok((Command::Log, text.trim())),
    }
}

/// Pull a date modifier off the start of `content`, or (logs only) an ISO
/// date off the end. The leading form wins.
pub fn split_date_modifier(
    content: &str,
    allow_trailing: bool,
) -> Result<(Option<DateModifier>, &str), ParseError> {
    if let Some(caps) = LEADING_DATE.captures(content) {
        let modifier = DateModifier::parse(&caps[1])?;
        let matched_len = caps.get(0).map_or(0, |m| m.end());
        return Ok((Some(modifier), content[matched_len..].trim()));
    }
    if allow_trailing {
        if let Some(caps) = TRAILING_DATE.captures(content) {
            let modifier = DateModifier::parse(&caps[1])?;
            let start = caps.get(0).map_or(content.len(), |m| m.start());
            return Ok((Some(modifier), content[..start].trim()));
        }
    }
    Ok((None, content))
}

/// Message parser bound to a catalog and a timezone
#[derive(Clone, Debug)]
pub struct Parser<'c> {
    catalog: &'c Catalog,
    dates: DateResolver,
    policy: PrefixPolicy,
}

impl<'c> Parser<'c> {
    pub fn new(catalog: &'c Catalog, offset: FixedOffset) -> Self {
        Self {
            catalog,
            dates: DateResolver::new(offset),
            policy: PrefixPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: PrefixPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn dates(&self) -> &DateResolver {
        &self.dates
    }

    /// Parse one message relative to `reference`
    ///
    /// `source` and the full `message` are copied onto the record verbatim.
    pub fn parse<Tz: TimeZone>(
        &self,
        message: &str,
        reference: &DateTime<Tz>,
        source: &str,
    ) -> Result<ParsedMessage, ParseError> {
        let (command, content) = split_command(message, self.policy)?;
        let (modifier, body) = split_date_modifier(content, command == Command::Log)?;

        let parsed = match command {
            Command::Note => self.parse_note(body, modifier, reference, source, message)?,
            Command::Log => self.parse_log(body, modifier, reference, source, message)?,
        };

        tracing::debug!(
            "Parsed {} entry for {} from {:?}",
            parsed.record.entry.kind(),
            parsed.partition,
            message
        );
        Ok(parsed)
    }

    fn parse_note<Tz: TimeZone>(
        &self,
        body: &str,
        modifier: Option<DateModifier>,
        reference: &DateTime<Tz>,
        source: &str,
        raw: &str,
    ) -> Result<ParsedMessage, ParseError> {
        if body.is_empty() {
            return Err(ParseError::MissingNote);
        }
        let (timestamp, partition) = self.dates.resolve_with_key(modifier, reference)?;
        Ok(ParsedMessage {
            record: WorkoutRecord {
                timestamp,
                entry: Entry::Note,
                rpe: None,
                notes: Some(body.to_string()),
                source: source.to_string(),
                raw: raw.to_string(),
            },
            partition,
        })
    }

    fn parse_log<Tz: TimeZone>(
        &self,
        body: &str,
        modifier: Option<DateModifier>,
        reference: &DateTime<Tz>,
        source: &str,
        raw: &str,
    ) -> Result<ParsedMessage, ParseError> {
        let tokens: Vec<&str> = body.split_whitespace().collect();
        let (exercise, consumed) = self.resolve_exercise(&tokens)?;
        let payload = &tokens[consumed..];

        let (timestamp, partition) = self.dates.resolve_with_key(modifier, reference)?;

        let (entry, rpe, notes) = match exercise.category {
            Category::Cardio => {
                let (session, notes) = grammar::parse_cardio(&exercise.id, &payload.join(" "));
                (Entry::Cardio(session), None, notes)
            }
            category => {
                let extraction = grammar::parse_sets(exercise, payload)?;
                let weighted = extraction.sets.iter().any(|s| s.weight.is_some());
                let lift = Lift {
                    exercise: exercise.id.clone(),
                    unit: weighted.then_some(WeightUnit::Lb),
                    sets: extraction.sets,
                };
                (Entry::lift(category, lift), extraction.rpe, extraction.notes)
            }
        };

        Ok(ParsedMessage {
            record: WorkoutRecord {
                timestamp,
                entry,
                rpe,
                notes,
                source: source.to_string(),
                raw: raw.to_string(),
            },
            partition,
        })
    }

    /// Longest alias match over the leading tokens
    fn resolve_exercise(&self, tokens: &[&str]) -> Result<(&'c ExerciseDef, usize), ParseError> {
        let first = tokens.first().ok_or(ParseError::MissingExercise)?;
        let longest = tokens.len().min(MAX_ALIAS_WORDS);
        (1..=longest)
            .rev()
            .find_map(|n| {
                self.catalog
                    .normalize(&tokens[..n].join(" "))
                    .map(|def| (def, n))
            })
            .ok_or_else(|| ParseError::UnknownExercise((*first).to_string()))
    }

    /// Parse a stored record's `raw` again, anchored at its own timestamp
    pub fn reparse(&self, record: &WorkoutRecord) -> Result<ParsedMessage, ParseError> {
        self.parse(&record.raw, &record.timestamp, &record.source)
    }
}
