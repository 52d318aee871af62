//! Flat CSV export of stored records.
//!
//! One row per strength set, one per cardio session and one per note.

use crate::store::JsonlStore;
use crate::{Entry, Result, WorkoutRecord};
use chrono::NaiveDate;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// A row in the CSV output
#[derive(Debug, Default, serde::Serialize)]
struct CsvRow {
    date: String,
    ts: String,
    #[serde(rename = "type")]
    kind: &'static str,
    exercise: String,
    set: Option<usize>,
    weight: Option<f64>,
    unit: Option<&'static str>,
    reps: Option<u32>,
    failed: Option<bool>,
    duration_min: Option<f64>,
    speed_mph: Option<f64>,
    incline_percent: Option<f64>,
    distance_miles: Option<f64>,
    rpe: Option<u32>,
    notes: Option<String>,
    source: String,
}

fn rows_for(record: &WorkoutRecord) -> Vec<CsvRow> {
    let base = || CsvRow {
        date: record.timestamp.date_naive().to_string(),
        ts: record.timestamp.to_rfc3339(),
        kind: record.entry.kind(),
        exercise: record.entry.name().unwrap_or_default().to_string(),
        rpe: record.rpe,
        notes: record.notes.clone(),
        source: record.source.clone(),
        ..Default::default()
    };

    match &record.entry {
        Entry::Note => vec![base()],
        Entry::Cardio(session) => vec![CsvRow {
            duration_min: session.duration_min,
            speed_mph: session.speed_mph,
            incline_percent: session.incline_percent,
            distance_miles: session.distance_miles,
            ..base()
        }],
        Entry::Strength(lift) | Entry::Bodyweight(lift) | Entry::Machine(lift) => lift
            .sets
            .iter()
            .enumerate()
            .map(|(i, set)| CsvRow {
                set: Some(i + 1),
                weight: set.weight,
                unit: lift.unit.map(|u| u.as_str()),
                reps: Some(set.reps),
                failed: Some(set.failed),
                ..base()
            })
            .collect(),
    }
}

/// Write `records` as CSV with a header row, returning the number of rows
pub fn write_csv<W: Write>(records: &[WorkoutRecord], out: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new().has_headers(true).from_writer(out);
    let mut rows = 0;

    for record in records {
        for row in rows_for(record) {
            writer.serialize(row)?;
            rows += 1;
        }
    }

    writer.flush()?;
    Ok(rows)
}

/// Export every record dated `from..=to` to a new CSV file at `output`
pub fn export_range(
    store: &JsonlStore,
    from: NaiveDate,
    to: NaiveDate,
    output: &Path,
) -> Result<usize> {
    let records = store.load_range(from, to)?;

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(output)?;
    let rows = write_csv(&records, &file)?;
    file.sync_all()?;

    tracing::info!(
        "Exported {} records as {} rows to {:?}",
        records.len(),
        rows,
        output
    );
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CardioSession, Lift, StrengthSet, WeightUnit};
    use chrono::DateTime;

    fn record(entry: Entry, rpe: Option<u32>, notes: Option<&str>) -> WorkoutRecord {
        WorkoutRecord {
            timestamp: DateTime::parse_from_rfc3339("2026-02-16T10:30:00-08:00").unwrap(),
            entry,
            rpe,
            notes: notes.map(str::to_string),
            source: "cli".into(),
            raw: String::new(),
        }
    }

    #[test]
    fn test_rows_per_set_cardio_and_note() {
        let records = vec![
            record(
                Entry::Strength(Lift {
                    exercise: "deadlift".into(),
                    unit: Some(WeightUnit::Lb),
                    sets: vec![
                        StrengthSet::weighted(405.0, 2),
                        StrengthSet::failed(Some(405.0)),
                    ],
                }),
                Some(9),
                None,
            ),
            record(
                Entry::Cardio(CardioSession {
                    modality: "treadmill".into(),
                    duration_min: Some(10.0),
                    speed_mph: Some(3.2),
                    ..Default::default()
                }),
                None,
                None,
            ),
            record(Entry::Note, None, Some("rest day")),
        ];

        let mut out = Vec::new();
        let rows = write_csv(&records, &mut out).unwrap();
        assert_eq!(rows, 4);

        let csv = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "date,ts,type,exercise,set,weight,unit,reps,failed,duration_min,speed_mph,incline_percent,distance_miles,rpe,notes,source"
        );
        assert_eq!(
            lines[1],
            "2026-02-16,2026-02-16T10:30:00-08:00,strength,deadlift,1,405.0,lb,2,false,,,,,9,,cli"
        );
        assert_eq!(
            lines[2],
            "2026-02-16,2026-02-16T10:30:00-08:00,strength,deadlift,2,405.0,lb,0,true,,,,,9,,cli"
        );
        assert_eq!(
            lines[3],
            "2026-02-16,2026-02-16T10:30:00-08:00,cardio,treadmill,,,,,,10.0,3.2,,,,,cli"
        );
        assert_eq!(
            lines[4],
            "2026-02-16,2026-02-16T10:30:00-08:00,note,,,,,,,,,,,,rest day,cli"
        );
    }

    #[test]
    fn test_export_range_writes_file() {
        use crate::store::RecordSink;

        let temp_dir = tempfile::tempdir().unwrap();
        let mut store = JsonlStore::new(temp_dir.path().join("db"));
        let note = record(Entry::Note, None, Some("rest day"));
        store.append(&note, &note.partition_key()).unwrap();

        let output = temp_dir.path().join("out").join("log.csv");
        let day = NaiveDate::from_ymd_opt(2026, 2, 16).unwrap();
        assert_eq!(export_range(&store, day, day, &output).unwrap(), 1);
        assert_eq!(std::fs::read_to_string(&output).unwrap().lines().count(), 2);

        let next = day.succ_opt().unwrap();
        assert_eq!(export_range(&store, next, next, &output).unwrap(), 0);
    }
}
