use chrono::{Duration, NaiveDate, Utc};
use clap::{Args, Parser as ClapParser, Subcommand};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use workout_core::date::DateModifier;
use workout_core::engine::{split_command, Command as EngineCommand};
use workout_core::export::export_range;
use workout_core::formatter::format_record;
use workout_core::verify::verify_store;
use workout_core::*;

#[derive(ClapParser)]
#[command(name = "workout-logger")]
#[command(about = "Parse free-text workout logs into a JSONL store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override record store directory
    #[arg(long, global = true, env = "WORKOUT_LOGGER_DB")]
    db_dir: Option<PathBuf>,

    /// Override state directory (processed message ids)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Flags shared by the writing commands
#[derive(Args)]
struct WriteOptions {
    /// Parse and print without saving
    #[arg(long)]
    dry_run: bool,

    /// Log on another day (YYYY-MM-DD), keeping the current time
    #[arg(long)]
    date: Option<String>,

    /// Skip git commit even if enabled in config
    #[arg(long)]
    no_commit: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log a workout, e.g. `log squat 315x5x3 rpe8`
    Log {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Source tag stored on the record
        #[arg(long, default_value = "cli")]
        source: String,

        #[command(flatten)]
        options: WriteOptions,
    },

    /// Log a free-text note
    Note {
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,

        /// Source tag stored on the record
        #[arg(long, default_value = "cli")]
        source: String,

        #[command(flatten)]
        options: WriteOptions,
    },

    /// Ingest one chat message (must start with /log or /note)
    Ingest {
        /// Delivery id used to skip repeated messages
        #[arg(long)]
        message_id: String,

        message: String,

        /// Source tag stored on the record
        #[arg(long, default_value = "telegram")]
        source: String,

        #[command(flatten)]
        options: WriteOptions,
    },

    /// Re-parse every stored record and report mismatches
    Verify,

    /// Print records for a date range
    Show {
        /// Last day to show (YYYY-MM-DD, today or yesterday)
        #[arg(long)]
        date: Option<String>,

        /// Number of days ending at --date
        #[arg(long, default_value_t = 1)]
        days: u32,
    },

    /// Format JSONL records read from stdin
    Format,

    /// Export records to CSV
    Export {
        /// CSV file to write
        #[arg(long, short)]
        output: PathBuf,

        /// First day to include
        #[arg(long)]
        from: Option<String>,

        /// Last day to include
        #[arg(long)]
        to: Option<String>,
    },
}

/// Resolved configuration for one invocation
struct App {
    config: Config,
    catalog: Catalog,
    offset: chrono::FixedOffset,
    db_dir: PathBuf,
    state_dir: PathBuf,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let config = Config::load()?;
        let offset = config.utc_offset()?;

        let catalog = Catalog::with_custom(&config.exercises.custom);
        let errors = catalog.validate();
        if !errors.is_empty() {
            eprintln!("Catalog validation errors:");
            for error in &errors {
                eprintln!("  - {}", error);
            }
            return Err(Error::CatalogValidation("Invalid catalog".into()));
        }

        let db_dir = cli.db_dir.clone().unwrap_or_else(|| config.data.db_dir.clone());
        let state_dir = cli
            .state_dir
            .clone()
            .unwrap_or_else(|| config.data.state_dir.clone());

        Ok(Self {
            config,
            catalog,
            offset,
            db_dir,
            state_dir,
        })
    }

    fn parser(&self, policy: PrefixPolicy) -> workout_core::Parser<'_> {
        workout_core::Parser::new(&self.catalog, self.offset).with_policy(policy)
    }

    fn store(&self) -> JsonlStore {
        JsonlStore::new(&self.db_dir)
    }

    /// `today`, `yesterday` or `YYYY-MM-DD` as a local calendar day
    fn day(&self, value: Option<&str>) -> Result<NaiveDate> {
        let modifier = value.map(DateModifier::parse).transpose()?;
        let resolved = self.parser(PrefixPolicy::Optional)
            .dates()
            .resolve(modifier, &Utc::now())?;
        Ok(resolved.date_naive())
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.verbose {
        workout_core::logging::init_with_level("debug");
    } else {
        workout_core::logging::init();
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("❌ {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let app = App::new(&cli)?;

    match cli.command {
        Commands::Log {
            message,
            source,
            options,
        } => cmd_write(&app, &message.join(" "), &source, None, PrefixPolicy::Optional, &options),
        Commands::Note {
            message,
            source,
            options,
        } => {
            let text = message.join(" ");
            let text = match split_command(&text, PrefixPolicy::Optional) {
                Ok((EngineCommand::Note, _)) => text,
                _ => format!("/note {}", text),
            };
            cmd_write(&app, &text, &source, None, PrefixPolicy::Required, &options)
        }
        Commands::Ingest {
            message_id,
            message,
            source,
            options,
        } => cmd_write(
            &app,
            &message,
            &source,
            Some(&message_id),
            PrefixPolicy::Required,
            &options,
        ),
        Commands::Verify => cmd_verify(&app),
        Commands::Show { date, days } => cmd_show(&app, date.as_deref(), days),
        Commands::Format => cmd_format(),
        Commands::Export { output, from, to } => {
            cmd_export(&app, output, from.as_deref(), to.as_deref())
        }
    }
}

fn cmd_write(
    app: &App,
    message: &str,
    source: &str,
    message_id: Option<&str>,
    policy: PrefixPolicy,
    options: &WriteOptions,
) -> Result<()> {
    let parser = app.parser(policy);
    let reference = match &options.date {
        Some(date) => parser.dates().override_date(date, &Utc::now())?,
        None => parser.dates().resolve(None, &Utc::now())?,
    };

    let mut ingestor = Ingestor::new(parser, app.store()).dry_run(options.dry_run);

    if !options.no_commit && app.config.git.auto_commit {
        ingestor = ingestor.with_versioner(GitVersioner::new(app.config.git.auto_push));
    }
    if message_id.is_some() {
        ingestor = ingestor.with_ledger(ProcessedMessages::open_in(&app.state_dir)?);
    }

    match ingestor.ingest(message, &reference, source, message_id)? {
        IngestOutcome::Duplicate { message_id } => {
            println!("Message {} already processed, skipping", message_id);
        }
        IngestOutcome::DryRun { record, path } => {
            println!("{}", serde_json::to_string_pretty(&record)?);
            println!("\nDry run: would save to {}", path.display());
        }
        IngestOutcome::Logged {
            record,
            path,
            committed,
        } => {
            println!("{}", format_record(&record));
            println!("✓ Logged to {}", path.display());
            if committed {
                println!("✓ Committed");
            }
        }
    }
    Ok(())
}

fn cmd_verify(app: &App) -> Result<()> {
    let report = verify_store(&app.store(), &app.parser(PrefixPolicy::Optional))?;

    println!(
        "Checked {} records in {} files",
        report.checked, report.files
    );
    if report.is_clean() {
        println!("✓ All records match their raw text");
        return Ok(());
    }

    for mismatch in &report.mismatches {
        println!("  ✗ {}", mismatch);
    }
    Err(Error::RecordMismatch {
        count: report.mismatches.len(),
    })
}

fn cmd_show(app: &App, date: Option<&str>, days: u32) -> Result<()> {
    let to = app.day(date)?;
    let from = Duration::try_days(i64::from(days.max(1)) - 1)
        .and_then(|span| to.checked_sub_signed(span))
        .ok_or_else(|| Error::Other(format!("--days {} reaches before the earliest date", days)))?;
    let records = app.store().load_range(from, to)?;

    if records.is_empty() {
        println!("No records between {} and {}", from, to);
        return Ok(());
    }
    for record in &records {
        println!("{}", format_record(record));
    }
    Ok(())
}

fn cmd_format() -> Result<()> {
    let stdin = io::stdin();
    for (line_num, line) in stdin.lock().lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WorkoutRecord>(&line) {
            Ok(record) => println!("{}", format_record(&record)),
            Err(e) => tracing::warn!("Skipping line {}: {}", line_num + 1, e),
        }
    }
    Ok(())
}

fn cmd_export(app: &App, output: PathBuf, from: Option<&str>, to: Option<&str>) -> Result<()> {
    let from = match from {
        Some(value) => app.day(Some(value))?,
        None => NaiveDate::MIN,
    };
    let to = match to {
        Some(value) => app.day(Some(value))?,
        None => NaiveDate::MAX,
    };

    let rows = export_range(&app.store(), from, to, &output)?;
    println!("✓ Exported {} rows to {}", rows, output.display());
    Ok(())
}
