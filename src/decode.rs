//! Helpers for turning response lines into values.
//!
//! Value responses from the load are usually prefixed with a single `R`
//! marker (`R1.500`). Every decoder here strips it before parsing.

use crate::error::{DecodeError, InvalidArgument};

/// Marker character the load puts in front of most responses.
pub const RESPONSE_MARKER: char = 'R';

/// Number of leveled setpoints used by voltage cutoff battery discharge.
pub const LEVELS: usize = 3;

/// Strip the response marker and surrounding whitespace.
pub fn strip_marker(raw: &str) -> &str {
    let raw = raw.trim();
    raw.strip_prefix(RESPONSE_MARKER).unwrap_or(raw).trim()
}

pub fn parse_f64(raw: &str) -> Result<f64, DecodeError> {
    strip_marker(raw)
        .parse()
        .map_err(|_| DecodeError::new("a number", raw))
}

pub fn parse_u32(raw: &str) -> Result<u32, DecodeError> {
    strip_marker(raw)
        .parse()
        .map_err(|_| DecodeError::new("an integer", raw))
}

/// Parse a run of numbers separated by whitespace or commas.
pub fn parse_floats(raw: &str) -> Result<Vec<f64>, DecodeError> {
    strip_marker(raw)
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|field| !field.is_empty())
        .map(|field| {
            field
                .parse()
                .map_err(|_| DecodeError::new("a list of numbers", raw))
        })
        .collect()
}

/// Turn 1 to 3 values into exactly 3 by repeating the last one.
pub fn extend_levels(what: &'static str, values: &[f64]) -> Result<[f64; LEVELS], InvalidArgument> {
    let Some(&last) = values.last() else {
        return Err(level_count(what, 0));
    };
    if values.len() > LEVELS {
        return Err(level_count(what, values.len()));
    }

    let mut levels = [last; LEVELS];
    levels[..values.len()].copy_from_slice(values);
    Ok(levels)
}

/// Ensure a setpoint which has no leveled form got exactly one value.
pub fn single(what: &'static str, values: &[f64]) -> Result<f64, InvalidArgument> {
    match values {
        [value] => Ok(*value),
        _ => Err(InvalidArgument::Length {
            what,
            min: 1,
            max: 1,
            got: values.len(),
        }),
    }
}

fn level_count(what: &'static str, got: usize) -> InvalidArgument {
    InvalidArgument::Length {
        what,
        min: 1,
        max: LEVELS,
        got,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_is_optional() {
        assert_eq!(strip_marker("R1.250"), "1.250");
        assert_eq!(strip_marker("1.250"), "1.250");
        assert_eq!(strip_marker(" RCC \r"), "CC");
        assert_eq!(parse_f64("R0.000").unwrap(), 0.0);
        assert_eq!(parse_f64("12.5").unwrap(), 12.5);
        assert_eq!(parse_u32("R7").unwrap(), 7);
    }

    #[test]
    fn test_garbage_is_a_decode_error() {
        let err = parse_f64("Rexecu success").unwrap_err();
        assert_eq!(err.response, "Rexecu success");
        assert!(parse_u32("R1.5").is_err());
    }

    #[test]
    fn test_floats_split_on_space_or_comma() {
        assert_eq!(
            parse_floats("R0.010 1.000 0.010 0.010").unwrap(),
            vec![0.01, 1.0, 0.01, 0.01]
        );
        assert_eq!(parse_floats("1.5,2.5").unwrap(), vec![1.5, 2.5]);
        assert!(parse_floats("R1.0 x").is_err());
    }

    #[test]
    fn test_levels_repeat_last_value() {
        assert_eq!(extend_levels("current", &[1.25]).unwrap(), [1.25; 3]);
        assert_eq!(
            extend_levels("current", &[1.3, 0.97]).unwrap(),
            [1.3, 0.97, 0.97]
        );
        assert_eq!(
            extend_levels("current", &[2.0, 1.5, 1.1]).unwrap(),
            [2.0, 1.5, 1.1]
        );
    }

    #[test]
    fn test_levels_reject_bad_lengths() {
        assert!(matches!(
            extend_levels("current", &[]),
            Err(InvalidArgument::Length { got: 0, .. })
        ));
        assert!(matches!(
            extend_levels("current", &[4.0, 3.0, 2.0, 1.0]),
            Err(InvalidArgument::Length { got: 4, max: 3, .. })
        ));
    }

    #[test]
    fn test_single_needs_one_value() {
        assert_eq!(single("time", &[5.0]).unwrap(), 5.0);
        assert!(single("time", &[5.0, 6.0]).is_err());
    }
}
