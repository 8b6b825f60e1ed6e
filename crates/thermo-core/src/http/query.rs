//! Total (never failing) query string parsing.

use core::num::IntErrorKind;

use crate::config::PointsBounds;

/// Key/value view over a raw query string such as `points=60&x=1`.
///
/// No percent-decoding is done; keys and values are returned as they appear.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryParams<'a> {
    raw: &'a str,
}

impl<'a> QueryParams<'a> {
    pub const fn new(raw: &'a str) -> Self {
        Self { raw }
    }

    /// Every `key=value` pair in order. A pair without `=` has an empty value;
    /// empty segments are skipped.
    pub fn iter(self) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.raw
            .split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| pair.split_once('=').unwrap_or((pair, "")))
    }

    /// Value of the first pair named `key`.
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Resolve the `points` parameter against `bounds`.
///
/// Missing or non-numeric values use the default; numbers are clamped to
/// `[min, max]`, including ones too large or too small to represent.
pub fn parse_points(query: &QueryParams<'_>, bounds: &PointsBounds) -> usize {
    let Some(raw) = query.get("points") else {
        return bounds.default;
    };
    match raw.parse::<i64>() {
        Ok(value) if value < 0 => bounds.min,
        Ok(value) => bounds.clamp(usize::try_from(value).unwrap_or(usize::MAX)),
        Err(error) => match error.kind() {
            IntErrorKind::PosOverflow => bounds.max,
            IntErrorKind::NegOverflow => bounds.min,
            _ => bounds.default,
        },
    }
}
