//! Human-friendly duration values as they appear in option strings.

use thiserror::Error;

/// The input did not look like a duration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized duration {input:?}")]
pub struct InvalidDuration {
    pub input: String,
}

/// Parse a duration option value.
///
/// Accepts `<n>s`, `<n>m`, `<n>h`, `<n>d`, or a bare integer meaning
/// seconds. The empty string, `"off"` and `"never"` clear the value and
/// yield `None`.
pub fn parse_duration(input: &str) -> Result<Option<time::Duration>, InvalidDuration> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("off") || trimmed.eq_ignore_ascii_case("never")
    {
        return Ok(None);
    }

    let err = || InvalidDuration {
        input: input.to_string(),
    };

    let (digits, unit) = match trimmed.find(|c: char| !c.is_ascii_digit()) {
        Some(split) => trimmed.split_at(split),
        None => (trimmed, ""),
    };

    let value: i64 = digits.parse().map_err(|_| err())?;
    let seconds_per_unit = match unit {
        "" | "s" => 1,
        "m" => 60,
        "h" => 60 * 60,
        "d" => 60 * 60 * 24,
        _ => return Err(err()),
    };

    let seconds = value.checked_mul(seconds_per_unit).ok_or_else(err)?;
    Ok(Some(time::Duration::seconds(seconds)))
}
