mod batch;
mod config;
mod error;
mod parser;
mod serialiser;
mod shift;
mod srt;

use crate::batch::BatchOpts;
use crate::shift::{Rounding, ShiftOpts};

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser as ClapParser, Subcommand, ValueEnum};
use env_logger::{Builder, Env};
use log::{info, warn};

fn main() {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("An error occurred: {}", err);
        for cause in err.chain().skip(1) {
            eprintln!("    {}", cause);
        }
        std::process::exit(1);
    }
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "warn,subshift=debug" } else { "warn" };
    Builder::from_env(Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Stderr)
        .init();
}

#[derive(ClapParser)]
#[command(about = "Shift the timing of SRT subtitles by a fixed offset", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
    #[arg(short, long, global = true, help = "Log what is being done to stderr.")]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoundingArg {
    /// Round to the nearest millisecond.
    Nearest,
    /// Truncate the shifted time toward zero.
    Truncate,
}

impl From<RoundingArg> for Rounding {
    fn from(arg: RoundingArg) -> Self {
        match arg {
            RoundingArg::Nearest => Rounding::Nearest,
            RoundingArg::Truncate => Rounding::Truncate,
        }
    }
}

#[derive(Args)]
struct ShiftArgs {
    #[arg(
        long,
        value_enum,
        default_value_t = RoundingArg::Nearest,
        help = "How fractional milliseconds in the offset are handled."
    )]
    rounding: RoundingArg,
    #[arg(
        long,
        help = "Keep any text following the second timestamp of a timing line \
                instead of dropping it."
    )]
    keep_trailing: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Shift a single subtitle file.
    File {
        #[arg(
            value_name = "INPUT",
            help = "The file to read from, or '-' for standard input."
        )]
        input: PathBuf,
        #[arg(
            value_name = "OUTPUT",
            help = "The file to write to, or '-' for standard output. May be the input file."
        )]
        output: PathBuf,
        #[arg(
            value_name = "OFFSET",
            allow_negative_numbers = true,
            help = "Seconds to add to every timestamp, e.g. 2.5 or -1.2."
        )]
        offset: String,
        #[command(flatten)]
        tuning: ShiftArgs,
    },
    /// Shift every .srt file in a folder.
    Batch {
        #[arg(
            short,
            long,
            value_name = "DIR",
            default_value = ".",
            help = "The folder holding input/, output/ and offset.txt."
        )]
        dir: PathBuf,
        #[arg(long, value_name = "DIR", help = "Read subtitles from here instead of DIR/input.")]
        input_dir: Option<PathBuf>,
        #[arg(long, value_name = "DIR", help = "Write subtitles here instead of DIR/output.")]
        output_dir: Option<PathBuf>,
        #[arg(
            long,
            value_name = "FILE",
            help = "Read the offset from here instead of DIR/offset.txt."
        )]
        offset_file: Option<PathBuf>,
        #[arg(
            long,
            value_name = "SECONDS",
            allow_negative_numbers = true,
            help = "Use this offset and ignore the offset file."
        )]
        offset: Option<String>,
        #[command(flatten)]
        tuning: ShiftArgs,
    },
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::File {
            input,
            output,
            offset,
            tuning,
        } => {
            let secs = parser::parse_offset(&offset)?;
            let opts = ShiftOpts::new(secs, tuning.rounding.into(), tuning.keep_trailing);
            let report = shift::shift_file(&input, &output, &opts)
                .with_context(|| format!("Failed to shift SRT file: '{}'", input.display()))?;
            info!(
                "Shifted {} timing lines by {} seconds",
                report.timing_lines, secs
            );
        }
        Command::Batch {
            dir,
            input_dir,
            output_dir,
            offset_file,
            offset,
            tuning,
        } => {
            let defaults = BatchOpts::in_dir(&dir);
            let opts = BatchOpts {
                input_dir: input_dir.unwrap_or(defaults.input_dir),
                output_dir: output_dir.unwrap_or(defaults.output_dir),
                offset_file: offset_file.unwrap_or(defaults.offset_file),
                offset,
                rounding: tuning.rounding.into(),
                keep_trailing: tuning.keep_trailing,
            };
            let report = batch::run_batch(&opts)?;
            info!(
                "Shifted {} files by {} seconds",
                report.outcomes.len() - report.failures(),
                report.offset_secs
            );
            for outcome in report.outcomes.iter().filter(|o| o.result.is_err()) {
                warn!("Skipped '{}'", outcome.name);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_defaults_to_nearest() {
        let cli = Cli::try_parse_from(["subshift", "file", "in.srt", "out.srt", "-3.0"]).unwrap();

        match cli.command {
            Command::File { offset, tuning, .. } => {
                assert_eq!(offset, "-3.0");
                assert_eq!(Rounding::from(tuning.rounding), Rounding::Nearest);
                assert!(!tuning.keep_trailing);
            }
            Command::Batch { .. } => panic!("expected the file command"),
        }
    }

    #[test]
    fn rounding_flag_selects_truncation() {
        let cli = Cli::try_parse_from(["subshift", "batch", "--rounding", "truncate"]).unwrap();

        match cli.command {
            Command::Batch { dir, tuning, .. } => {
                assert_eq!(dir, PathBuf::from("."));
                assert_eq!(Rounding::from(tuning.rounding), Rounding::Truncate);
            }
            Command::File { .. } => panic!("expected the batch command"),
        }
    }

    #[test]
    fn missing_positionals_are_rejected() {
        assert!(Cli::try_parse_from(["subshift", "file", "in.srt", "out.srt"]).is_err());
    }
}
