use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The three processing stages driven by this tool. Each one maps to an
/// external shell script taking year, month and day as arguments.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    #[serde(rename(deserialize = "filesep"))]
    FileSeparation,
    #[serde(rename(deserialize = "hitconv"))]
    HitConversion,
    #[serde(rename(deserialize = "trackmatch"))]
    TrackMatching,
}

impl Stage {
    pub fn all() -> [Stage; 3] {
        [
            Stage::FileSeparation,
            Stage::HitConversion,
            Stage::TrackMatching,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Stage::FileSeparation => "filesep",
            Stage::HitConversion => "hitconv",
            Stage::TrackMatching => "trackmatch",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

impl FromStr for Stage {
    type Err = StageParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filesep" => Ok(Stage::FileSeparation),
            "hitconv" => Ok(Stage::HitConversion),
            "trackmatch" => Ok(Stage::TrackMatching),
            _ => Err(StageParseError),
        }
    }
}

#[derive(Debug)]
pub struct StageParseError;

impl fmt::Display for StageParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid stage, expected filesep, hitconv or trackmatch")
    }
}

impl std::error::Error for StageParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_str() {
        assert_eq!("filesep".parse::<Stage>().unwrap(), Stage::FileSeparation);
        assert_eq!("hitconv".parse::<Stage>().unwrap(), Stage::HitConversion);
        assert_eq!("trackmatch".parse::<Stage>().unwrap(), Stage::TrackMatching);
        assert!("tracking".parse::<Stage>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for stage in Stage::all() {
            assert_eq!(stage.to_string().parse::<Stage>().unwrap(), stage);
        }
    }
}
