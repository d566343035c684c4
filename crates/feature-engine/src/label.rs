//! Fault labels

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Condition category of a DCRM waveform
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultType {
    /// Healthy contact resistance profile
    Normal,
    /// Short resistance ramp
    Spike,
    /// Sustained resistance offset
    Plateau,
    /// Localized high-frequency oscillation
    Unstable,
}

/// Returned when a string names no known fault type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown fault type: {0}")]
pub struct ParseFaultTypeError(pub String);

impl FaultType {
    /// Every label, in class-index order
    pub const ALL: [FaultType; 4] = [
        FaultType::Normal,
        FaultType::Spike,
        FaultType::Plateau,
        FaultType::Unstable,
    ];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultType::Normal => "normal",
            FaultType::Spike => "spike",
            FaultType::Plateau => "plateau",
            FaultType::Unstable => "unstable",
        }
    }

    /// Position in [`FaultType::ALL`]
    pub fn index(&self) -> usize {
        match self {
            FaultType::Normal => 0,
            FaultType::Spike => 1,
            FaultType::Plateau => 2,
            FaultType::Unstable => 3,
        }
    }
}

impl fmt::Display for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultType {
    type Err = ParseFaultTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "normal" => Ok(FaultType::Normal),
            "spike" => Ok(FaultType::Spike),
            "plateau" => Ok(FaultType::Plateau),
            "unstable" => Ok(FaultType::Unstable),
            _ => Err(ParseFaultTypeError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for fault in FaultType::ALL {
            assert_eq!(fault.as_str().parse::<FaultType>(), Ok(fault));
            assert_eq!(FaultType::ALL[fault.index()], fault);
        }
        assert_eq!(" Spike ".parse::<FaultType>(), Ok(FaultType::Spike));
    }

    #[test]
    fn test_unknown_label() {
        let err = "arcing".parse::<FaultType>().unwrap_err();
        assert_eq!(err.to_string(), "Unknown fault type: arcing");
    }
}
