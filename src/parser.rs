use crate::error::ShiftError;
use crate::srt::{Line, TimingLine};

use std::time::Duration;

use nom::bytes::complete::{tag, take_while1, take_while_m_n};
use nom::combinator::{all_consuming, map_res, verify};
use nom::error::{context, convert_error, VerboseError};
use nom::{Err, IResult};
use once_cell::sync::Lazy;
use regex::Regex;

// ASCII classes only: `\d` would also accept non-ASCII digits.
static TIMING_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^([0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3}) --> ([0-9]{2}:[0-9]{2}:[0-9]{2},[0-9]{3})(.*)",
    )
    .expect("timing line pattern is valid")
});

// Keeps the millisecond total within a u64.
const MAX_HOURS: u64 = u64::MAX / (60 * 60 * 1000) - 1;

/// Decides whether `line` is a timing line. The match is anchored at the start
/// of the line; anything after the second timestamp ends up in `trailing`.
pub fn classify_line(line: &str) -> Line<'_> {
    match TIMING_LINE.captures(line) {
        Some(caps) => {
            let (start, end, trailing) = match (caps.get(1), caps.get(2), caps.get(3)) {
                (Some(s), Some(e), Some(t)) => (s.as_str(), e.as_str(), t.as_str()),
                _ => return Line::Opaque(line),
            };
            Line::Timing(TimingLine {
                start,
                end,
                trailing: trailing.strip_suffix('\r').unwrap_or(trailing),
            })
        }
        None => Line::Opaque(line),
    }
}

/// Parses a strict `HH:MM:SS,mmm` timestamp. Minutes and seconds above 59 are
/// rejected; hours take at least two digits, so timestamps past 99 hours
/// written by `format_timestamp` read back.
pub fn parse_timestamp(input: &str) -> Result<Duration, ShiftError> {
    match all_consuming(timestamp)(input) {
        Ok((_, ts)) => Ok(ts),
        Err(Err::Error(err)) | Err(Err::Failure(err)) => Err(ShiftError::Format(format!(
            "Invalid timestamp '{}':\n{}",
            input,
            convert_error(input, err)
        ))),
        Err(Err::Incomplete(_)) => {
            unreachable!("Incomplete data received by non-streaming parser.")
        }
    }
}

/// Reads an offset in seconds, e.g. `2.5` or `-1.2`.
pub fn parse_offset(text: &str) -> Result<f64, ShiftError> {
    let trimmed = text.trim_start_matches('\u{FEFF}').trim();
    match trimmed.parse::<f64>() {
        Ok(secs) if secs.is_finite() => Ok(secs),
        _ => Err(ShiftError::Config(format!(
            "Invalid offset value '{}'. Must be a number (e.g. 2.5 or -1.2).",
            trimmed
        ))),
    }
}

fn digits<'a>(
    count: usize,
) -> impl FnMut(&'a str) -> IResult<&'a str, u64, VerboseError<&'a str>> {
    map_res(
        take_while_m_n(count, count, |c: char| c.is_ascii_digit()),
        |s: &str| s.parse::<u64>(),
    )
}

fn hours(input: &str) -> IResult<&str, u64, VerboseError<&str>> {
    let field = verify(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
        s.len() >= 2
    });
    verify(map_res(field, |s: &str| s.parse::<u64>()), |h: &u64| {
        *h <= MAX_HOURS
    })(input)
}

fn sexagesimal(input: &str) -> IResult<&str, u64, VerboseError<&str>> {
    verify(digits(2), |v: &u64| *v < 60)(input)
}

fn timestamp(input: &str) -> IResult<&str, Duration, VerboseError<&str>> {
    let (input, hours) = context("hours", hours)(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, minutes) = context("minutes", sexagesimal)(input)?;
    let (input, _) = tag(":")(input)?;
    let (input, seconds) = context("seconds", sexagesimal)(input)?;
    let (input, _) = tag(",")(input)?;
    let (input, millis) = context("milliseconds", digits(3))(input)?;

    Ok((
        input,
        Duration::from_millis(
            millis + seconds * 1000 + minutes * 60 * 1000 + hours * 60 * 60 * 1000,
        ),
    ))
}
