use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The optimizers a caller can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    /// One buy tick and one sell tick.
    Interval,
    /// One buy window and one sell window.
    OneCycle,
    /// Two independent cycles on either side of a split point.
    TwoCycles,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [Algorithm::Interval, Algorithm::OneCycle, Algorithm::TwoCycles];

    /// External selector name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Interval => "interval",
            Algorithm::OneCycle => "oneCycle",
            Algorithm::TwoCycles => "twoCycles",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown algorithm '{0}', expected one of: interval, oneCycle, twoCycles")]
pub struct UnknownAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnknownAlgorithm;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| UnknownAlgorithm(s.to_string()))
    }
}
