//! Age field parsing.
use std::time::Duration;

use crate::error::AgeError;

/// Seconds per unit character.
const fn unit_seconds(unit: char) -> Option<f64> {
    match unit {
        's' => Some(1.0),
        'm' => Some(60.0),
        'h' => Some(3600.0),
        'd' => Some(86_400.0),
        'w' => Some(604_800.0),
        _ => None,
    }
}

/// Parse an age expression such as `10d`, `2w3d` or `1.5h`.
///
/// An empty string or one starting with `-` means "no age limit" and
/// yields `Ok(None)`.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use tmpfiles_cli::config::age::parse_age;
///
/// assert_eq!(parse_age("1d").unwrap(), Some(Duration::from_secs(86_400)));
/// assert_eq!(parse_age("2w3d").unwrap(), Some(Duration::from_secs(1_468_800)));
/// assert_eq!(parse_age("-").unwrap(), None);
/// assert!(parse_age("5x").is_err());
/// ```
///
/// # Errors
///
/// Returns [`AgeError`] when a number is missing, a unit is not one of
/// `s m h d w`, or the total does not fit in a [`Duration`].  Callers
/// treat this as "due now" rather than aborting.
pub fn parse_age(text: &str) -> Result<Option<Duration>, AgeError> {
    if text.is_empty() || text.starts_with('-') {
        return Ok(None);
    }

    let mut total = 0.0_f64;
    let mut rest = text;
    while !rest.is_empty() {
        let offset = text.len() - rest.len();
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        let amount: f64 = number.parse().map_err(|_| AgeError::MissingNumber {
            text: text.to_string(),
            offset,
        })?;

        let mut chars = tail.chars();
        let unit = chars.next();
        let seconds = unit
            .and_then(unit_seconds)
            .ok_or_else(|| AgeError::UnknownUnit {
                text: text.to_string(),
                unit: unit.map(String::from).unwrap_or_default(),
            })?;
        total += amount * seconds;
        rest = chars.as_str();
    }

    Duration::try_from_secs_f64(total)
        .map(Some)
        .map_err(|_| AgeError::TooLarge {
            text: text.to_string(),
        })
}
