//! Observation years and bank sides

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Year token of one channel observation.
///
/// Tokens are kept verbatim (`"2010"`, `"2010b"`, `"201007"`) because they
/// name periods in the output; the numeric year is taken from the first four
/// characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Year(String);

impl Year {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Integer value of the first four characters, if they parse.
    pub fn numeric(&self) -> Option<i32> {
        let head: String = self.0.chars().take(4).collect();
        head.trim().parse().ok()
    }
}

impl Ord for Year {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            _ => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Year {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Year {
    fn from(token: &str) -> Self {
        Year::new(token)
    }
}

impl From<i32> for Year {
    fn from(year: i32) -> Self {
        Year::new(year.to_string())
    }
}

/// Bank side relative to the digitizing direction of a centerline
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Left => "LEFT",
            Side::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
