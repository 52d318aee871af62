//! Date modifier resolution.
//!
//! All timestamps are localized to one fixed UTC offset and truncated to
//! whole seconds before they are stored.

use crate::error::ParseError;
use crate::types::PartitionKey;
use chrono::{DateTime, Duration, FixedOffset, NaiveDate, SubsecRound, TimeZone};

/// Relative or absolute day a message refers to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateModifier {
    Today,
    Yesterday,
    On(NaiveDate),
}

impl DateModifier {
    /// Parse `today`, `yesterday` (case-insensitive) or a `YYYY-MM-DD` literal
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let trimmed = value.trim();
        match trimmed.to_lowercase().as_str() {
            "today" => Ok(DateModifier::Today),
            "yesterday" => Ok(DateModifier::Yesterday),
            _ => parse_iso_date(trimmed).map(DateModifier::On),
        }
    }
}

/// Strict `YYYY-MM-DD`; calendar-invalid dates are rejected
fn parse_iso_date(value: &str) -> Result<NaiveDate, ParseError> {
    let well_formed = value.len() == 10
        && value
            .char_indices()
            .all(|(i, c)| if i == 4 || i == 7 { c == '-' } else { c.is_ascii_digit() });
    if !well_formed {
        return Err(ParseError::InvalidDateModifier(value.to_string()));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ParseError::InvalidDateModifier(value.to_string()))
}

/// Local midnight of `date`
fn local_midnight(date: NaiveDate, offset: &FixedOffset) -> Result<DateTime<FixedOffset>, ParseError> {
    date.and_hms_opt(0, 0, 0)
        .and_then(|naive| offset.from_local_datetime(&naive).single())
        .ok_or_else(|| ParseError::InvalidDateModifier(date.to_string()))
}

/// Resolves date modifiers against a reference instant in one fixed offset
#[derive(Clone, Copy, Debug)]
pub struct DateResolver {
    offset: FixedOffset,
}

impl DateResolver {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Localize `reference` and apply the modifier
    ///
    /// - none / `today`: reference unchanged
    /// - `yesterday`: one calendar day earlier, same time of day
    /// - `YYYY-MM-DD`: local midnight on that date
    pub fn resolve<Tz: TimeZone>(
        &self,
        modifier: Option<DateModifier>,
        reference: &DateTime<Tz>,
    ) -> Result<DateTime<FixedOffset>, ParseError> {
        let local = reference.with_timezone(&self.offset).trunc_subsecs(0);
        match modifier {
            None | Some(DateModifier::Today) => Ok(local),
            // A fixed offset has no DST gaps, so one day is exactly 24 hours
            Some(DateModifier::Yesterday) => Ok(local - Duration::days(1)),
            Some(DateModifier::On(date)) => local_midnight(date, &self.offset),
        }
    }

    /// Resolve and derive the partition key in one step
    pub fn resolve_with_key<Tz: TimeZone>(
        &self,
        modifier: Option<DateModifier>,
        reference: &DateTime<Tz>,
    ) -> Result<(DateTime<FixedOffset>, PartitionKey), ParseError> {
        let resolved = self.resolve(modifier, reference)?;
        let key = PartitionKey::from_datetime(&resolved);
        Ok((resolved, key))
    }

    /// Move `now` onto another calendar day, keeping the local time of day
    ///
    /// Backs the CLI `--date YYYY-MM-DD` override.
    pub fn override_date<Tz: TimeZone>(
        &self,
        date: &str,
        now: &DateTime<Tz>,
    ) -> Result<DateTime<FixedOffset>, ParseError> {
        let date = parse_iso_date(date.trim())?;
        let local = now.with_timezone(&self.offset).trunc_subsecs(0);
        self.offset
            .from_local_datetime(&date.and_time(local.time()))
            .single()
            .ok_or_else(|| ParseError::InvalidDateModifier(date.to_string()))
    }
}
