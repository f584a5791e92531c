use crate::error::ShiftError;
use crate::parser::{classify_line, parse_timestamp};
use crate::serialiser::format_timestamp;
use crate::srt::Line;

use std::borrow::Cow;
use std::fs::{self, File, Permissions};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use log::debug;
use tempfile::NamedTempFile;

/// How a fractional offset is brought down to whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rounding {
    /// Round half away from zero.
    #[default]
    Nearest,
    /// Truncate the shifted total toward zero. Since totals are clamped at
    /// zero, this floors the offset.
    Truncate,
}

/// A signed offset in whole milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Offset {
    millis: i64,
}

impl Offset {
    pub fn from_secs(secs: f64, rounding: Rounding) -> Self {
        // Offsets are resolved to microseconds first, then to milliseconds.
        let micros = (secs * 1_000_000.0).round() as i64;
        let millis = match rounding {
            Rounding::Nearest if micros < 0 => micros.saturating_sub(500) / 1000,
            Rounding::Nearest => micros.saturating_add(500) / 1000,
            Rounding::Truncate => micros.div_euclid(1000),
        };
        Offset { millis }
    }

    pub fn as_millis(&self) -> i64 {
        self.millis
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftOpts {
    pub offset: Offset,
    /// Re-append whatever followed the second timestamp on a timing line.
    pub keep_trailing: bool,
}

impl ShiftOpts {
    pub fn new(secs: f64, rounding: Rounding, keep_trailing: bool) -> Self {
        Self {
            offset: Offset::from_secs(secs, rounding),
            keep_trailing,
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ShiftReport {
    pub lines: usize,
    pub timing_lines: usize,
}

/// Adds `offset` to `ts`, clamping at zero.
pub fn shift(ts: Duration, offset: Offset) -> Duration {
    let millis = i64::try_from(ts.as_millis()).unwrap_or(i64::MAX);
    let shifted = millis.saturating_add(offset.millis);
    Duration::from_millis(u64::try_from(shifted).unwrap_or(0))
}

/// Shifts a single line. Opaque lines come back borrowed and untouched;
/// timing lines are rebuilt and always end in `\n`.
pub fn process_line<'a>(line: &'a str, opts: &ShiftOpts) -> Result<Cow<'a, str>, ShiftError> {
    let timing = match classify_line(line) {
        Line::Opaque(text) => return Ok(Cow::Borrowed(text)),
        Line::Timing(timing) => timing,
    };

    let start = shift(parse_timestamp(timing.start)?, opts.offset);
    let end = shift(parse_timestamp(timing.end)?, opts.offset);

    let mut out = format!("{} --> {}", format_timestamp(start), format_timestamp(end));
    if opts.keep_trailing {
        out.push_str(timing.trailing);
    }
    out.push('\n');
    Ok(Cow::Owned(out))
}

/// Streams `reader` into `writer` line by line. A byte-order mark at the very
/// start of the input is dropped.
pub fn shift_stream<R: BufRead, W: Write>(
    mut reader: R,
    mut writer: W,
    opts: &ShiftOpts,
) -> Result<ShiftReport> {
    let mut report = ShiftReport::default();
    let mut line = String::new();

    loop {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .with_context(|| format!("Failed to read line {}", report.lines + 1))?;
        if read == 0 {
            break;
        }
        report.lines += 1;

        let text = if report.lines == 1 {
            line.strip_prefix('\u{FEFF}').unwrap_or(&line)
        } else {
            &line
        };
        let out = process_line(text, opts)
            .with_context(|| format!("Invalid timing line on line {}", report.lines))?;
        if let Cow::Owned(_) = out {
            report.timing_lines += 1;
        }
        writer
            .write_all(out.as_bytes())
            .context("Failed to write output")?;
    }

    writer.flush().context("Failed to write output")?;
    Ok(report)
}

/// Shifts `input` into `output`; `-` stands for stdin or stdout. Nothing is
/// written to `output` unless the whole input was processed.
pub fn shift_file(input: &Path, output: &Path, opts: &ShiftOpts) -> Result<ShiftReport> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(io::stdin().lock())
    } else {
        if !input.exists() {
            return Err(ShiftError::MissingInput {
                path: input.to_path_buf(),
                hint: "Input file not found".to_string(),
            }
            .into());
        }
        let file = File::open(input)
            .with_context(|| format!("Failed to open input file: '{}'", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let report = if output == Path::new("-") {
        let mut buffer = Vec::new();
        let report = shift_stream(reader, &mut buffer, opts)?;
        io::stdout()
            .lock()
            .write_all(&buffer)
            .context("Failed to write to stdout")?;
        report
    } else {
        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir).with_context(|| {
            format!("Failed to create temporary file in '{}'", dir.display())
        })?;
        let report = shift_stream(reader, BufWriter::new(tmp.as_file_mut()), opts)?;
        if let Some(perms) = output_permissions(input, output) {
            tmp.as_file().set_permissions(perms).with_context(|| {
                format!("Failed to set permissions of output file: '{}'", output.display())
            })?;
        }
        tmp.persist(output)
            .map_err(|err| err.error)
            .with_context(|| format!("Failed to write output file: '{}'", output.display()))?;
        report
    };

    debug!(
        "Shifted {} timing lines out of {} in '{}' by {} ms",
        report.timing_lines,
        report.lines,
        input.display(),
        opts.offset.as_millis()
    );
    Ok(report)
}

/// Temporary files are created private; the output takes the input's mode
/// instead, or that of the file it replaces when reading from stdin.
fn output_permissions(input: &Path, output: &Path) -> Option<Permissions> {
    let source = if input == Path::new("-") { output } else { input };
    match fs::metadata(source) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => default_permissions(),
    }
}

#[cfg(unix)]
fn default_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn default_permissions() -> Option<Permissions> {
    None
}
