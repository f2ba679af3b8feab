use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::glob;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use cueback_core::{BackupDocument, Report, build_dmx_state, map_fixture_channels};

/// Fallback channel count for fixtures whose personality did not decode.
const DEFAULT_CHANNEL_COUNT: usize = 4;

#[derive(Parser, Debug)]
#[command(name = "cueback")]
#[command(version)]
#[command(
    about = "Inspector for lighting-console XML backup files.",
    long_about = None,
    after_help = "Examples:\n  cueback backup inspect backup.xml -o report.json\n  cueback backup inspect backup.xml --stdout --pretty\n  cueback backup inspect backup.xml -o report.json --list-fixtures"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on console backup XML files.
    Backup {
        #[command(subcommand)]
        command: BackupCommands,
    },
}

#[derive(Subcommand, Debug)]
enum BackupCommands {
    /// Decode a backup file and generate a versioned JSON report.
    #[command(
        after_help = "Examples:\n  cueback backup inspect backup.xml -o report.json\n  cueback backup inspect backup.xml --stdout --pretty\n  cueback backup inspect backup.xml -o report.json --list-channels"
    )]
    Inspect {
        /// Path to a backup .xml file
        input: PathBuf,

        /// Output report path (JSON)
        #[arg(short = 'o', long, required_unless_present = "stdout")]
        report: Option<PathBuf>,

        /// Write JSON report to stdout
        #[arg(long, conflicts_with = "report")]
        stdout: bool,

        /// Pretty-print JSON output
        #[arg(long, conflicts_with = "compact")]
        pretty: bool,

        /// Compact JSON output (default)
        #[arg(long)]
        compact: bool,

        /// Suppress non-error output
        #[arg(long)]
        quiet: bool,

        /// Exit with a non-zero code if any embedded payload failed to decode
        #[arg(long)]
        strict: bool,

        /// List patched fixtures and their decoded trait IDs
        #[arg(long)]
        list_fixtures: bool,

        /// List resolved channel values for each fixture playback's first cue
        #[arg(long)]
        list_channels: bool,

        /// Hex-dump the first frame of every fixture playback cue
        #[arg(long)]
        dump_frames: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Backup { command } => match command {
            BackupCommands::Inspect {
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_fixtures,
                list_channels,
                dump_frames,
            } => cmd_backup_inspect(
                input,
                report,
                stdout,
                pretty,
                compact,
                quiet,
                strict,
                list_fixtures,
                list_channels,
                dump_frames,
            ),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(err.to_string(), None)
    }
}

fn cmd_backup_inspect(
    input: PathBuf,
    report: Option<PathBuf>,
    stdout: bool,
    pretty: bool,
    compact: bool,
    quiet: bool,
    strict: bool,
    list_fixtures: bool,
    list_channels: bool,
    dump_frames: bool,
) -> Result<(), CliError> {
    let resolved_input = resolve_input_path(&input)?;
    validate_input_file(&resolved_input)?;
    let input_abs = fs::canonicalize(&resolved_input)
        .with_context(|| format!("Failed to resolve input path: {}", resolved_input.display()))?;
    let report = if stdout {
        None
    } else {
        Some(report.ok_or_else(|| {
            CliError::new(
                "missing output path",
                Some("use -o/--report or --stdout".to_string()),
            )
        })?)
    };

    if let Some(report_path) = report.as_ref() {
        let report_abs = report_path
            .parent()
            .map(|parent| {
                if parent.as_os_str().is_empty() {
                    fs::canonicalize(".")
                } else {
                    fs::canonicalize(parent)
                }
            })
            .transpose()
            .with_context(|| format!("Failed to resolve output path: {}", report_path.display()))?;
        if let Some(report_dir) = report_abs {
            let report_target = report_dir.join(
                report_path
                    .file_name()
                    .ok_or_else(|| anyhow::anyhow!("Invalid report path"))?,
            );
            if report_target == input_abs {
                return Err(CliError::new(
                    format!(
                        "report path must differ from input: {}",
                        report_path.display()
                    ),
                    Some("choose a different output path".to_string()),
                ));
            }
        }
    }

    let meta = fs::metadata(&resolved_input)
        .with_context(|| format!("Failed to read input file: {}", resolved_input.display()))?;

    if !meta.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a backup .xml file".to_string()),
        ));
    }

    let backup =
        cueback_core::parse_backup_file(&resolved_input).context("backup decode failed")?;
    let mut rep = cueback_core::make_report(
        &resolved_input.display().to_string(),
        meta.len(),
        backup,
    );
    if let Some(ts) = file_mtime_rfc3339(&meta) {
        rep.generated_at = ts;
    }
    let json = serialize_report(&rep, pretty, compact)?;

    if stdout {
        print!("{}", json);
        print_listings(&rep, quiet, list_fixtures, list_channels, dump_frames);
        if strict && has_decode_failures(&rep.backup) {
            return Err(CliError::new(
                "payload decode failures detected",
                Some("use --list-fixtures to inspect".to_string()),
            ));
        }
        return Ok(());
    }

    let report = report.expect("report required when not using stdout");
    if let Some(parent) = report.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }

    fs::write(&report, json)
        .with_context(|| format!("Failed to write report: {}", report.display()))?;

    print_listings(&rep, quiet, list_fixtures, list_channels, dump_frames);
    if !quiet {
        eprintln!("OK: report written -> {}", report.display());
    }
    if strict && has_decode_failures(&rep.backup) {
        return Err(CliError::new(
            "payload decode failures detected",
            Some("use --list-fixtures to inspect".to_string()),
        ));
    }
    Ok(())
}

fn serialize_report(rep: &Report, pretty: bool, compact: bool) -> Result<String, CliError> {
    if pretty && compact {
        return Err(CliError::new(
            "cannot use --pretty and --compact together",
            Some("choose one output format".to_string()),
        ));
    }
    if pretty {
        serde_json::to_string_pretty(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    } else {
        serde_json::to_string(rep)
            .context("JSON serialization failed")
            .map_err(Into::into)
    }
}

fn print_listings(
    rep: &Report,
    quiet: bool,
    list_fixtures: bool,
    list_channels: bool,
    dump_frames: bool,
) {
    if quiet {
        return;
    }
    if list_fixtures {
        print_fixtures(&rep.backup);
    }
    if list_channels {
        print_channels(&rep.backup);
    }
    if dump_frames {
        print_frame_dumps(&rep.backup);
    }
}

fn has_decode_failures(backup: &BackupDocument) -> bool {
    let personality_failed = backup
        .patch
        .iter()
        .any(|fixture| !fixture.personality.is_empty() && fixture.decoded_personality.is_none());
    let frame_failed = backup
        .fixture_playbacks
        .iter()
        .flat_map(|playback| &playback.cues)
        .flat_map(|cue| cue.frames.iter().chain(&cue.frame_fx))
        .any(|payload| payload.decoded.is_none());
    personality_failed || frame_failed
}

fn print_fixtures(backup: &BackupDocument) {
    eprintln!("Fixtures:");
    for fixture in &backup.patch {
        match fixture.decoded_personality.as_ref() {
            Some(personality) => eprintln!(
                "  {} \"{}\" @{} ({} ch) traits: {}",
                fixture.index,
                fixture.label,
                u32::from(fixture.address) + 1,
                personality.channel_count,
                personality.format_trait_ids()
            ),
            None => eprintln!(
                "  {} \"{}\" @{} (no personality)",
                fixture.index,
                fixture.label,
                u32::from(fixture.address) + 1
            ),
        }
    }
}

fn print_channels(backup: &BackupDocument) {
    for playback in &backup.fixture_playbacks {
        let Some(cue) = playback.cues.first() else {
            continue;
        };
        let frame_texts: Vec<String> = cue
            .frames
            .iter()
            .map(|payload| payload.data.clone())
            .collect();
        let state = build_dmx_state(&frame_texts);
        let mapped = map_fixture_channels(&state, &backup.patch, DEFAULT_CHANNEL_COUNT);

        eprintln!(
            "Channels for playback {} \"{}\" cue {}:",
            playback.index, playback.label, cue.index
        );
        if mapped.is_empty() {
            eprintln!("  (all fixtures dark)");
            continue;
        }
        for fixture in mapped {
            let values = fixture
                .channels
                .iter()
                .map(|channel| format!("{}={}", channel.name, channel.value))
                .collect::<Vec<_>>()
                .join(" ");
            eprintln!(
                "  {} \"{}\" @{}: {}",
                fixture.fixture_index, fixture.label, fixture.start_address, values
            );
        }
    }
}

fn print_frame_dumps(backup: &BackupDocument) {
    for playback in &backup.fixture_playbacks {
        for cue in &playback.cues {
            let Some(payload) = cue.frames.first() else {
                continue;
            };
            eprintln!(
                "Frame dump, playback {} cue {}:",
                playback.index, cue.index
            );
            match cueback_core::payload_hex_dump(&payload.data) {
                Some(dump) => {
                    for line in dump.lines() {
                        eprintln!("  {}", line);
                    }
                }
                None => eprintln!("  (payload is not valid base64)"),
            }
        }
    }
}

fn file_mtime_rfc3339(meta: &fs::Metadata) -> Option<String> {
    let modified = meta.modified().ok()?;
    OffsetDateTime::from(modified).format(&Rfc3339).ok()
}

fn validate_input_file(input: &PathBuf) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a backup .xml file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "xml" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a backup .xml file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &PathBuf) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.clone());
    }

    let mut matches = Vec::new();
    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    if matches.is_empty() {
        return Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected a backup .xml file".to_string()),
        ));
    }
    if matches.len() > 1 {
        let hint = "pass a single backup file, or run once per file".to_string();
        let mut message = format!(
            "multiple files match pattern '{}' ({} matches)",
            pattern,
            matches.len()
        );
        let listed = matches.iter().take(3).collect::<Vec<_>>();
        if !listed.is_empty() {
            let mut details = String::new();
            details.push_str("; matches: ");
            details.push_str(
                &listed
                    .into_iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            );
            if matches.len() > 3 {
                details.push_str(", ...");
            }
            message.push_str(&details);
        }
        return Err(CliError::new(message, Some(hint)));
    }

    Ok(matches.remove(0))
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
