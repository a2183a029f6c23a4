use serde::Deserialize;
use serde::Deserializer;
use serde::de::Error;

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::date_table::{DateSegment, DateTable};
use crate::dispatch::QueueSpec;

pub mod error;
pub use error::ConfigError;

pub mod stage;
pub use stage::{Stage, StageParseError};

/// Per-stage settings: the shell script to invoke once per day and an
/// optional batch-queue submission wrapper.
#[derive(Debug, Deserialize, Clone)]
pub struct StageConfig {
    pub script: String,
    #[serde(default)]
    pub queue: Option<QueueSpec>,
}

#[derive(Debug, Clone)]
pub struct Config {
    scripts_directory: PathBuf,
    table: DateTable,
    stages: HashMap<Stage, StageConfig>,
    base_dir: PathBuf,
}

// This impl deserializes a Config object from a deserializer, ensuring
// every date segment is a valid inclusive day range within its month and
// that at least one stage is configured. An absent or empty segment list
// falls back to the built-in operating calendar.
impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct ConfigHelper {
            scripts_directory: Option<String>,
            segments: Option<Vec<SegmentHelper>>,
            stages: HashMap<Stage, StageConfig>,
        }

        #[derive(Deserialize)]
        struct SegmentHelper {
            year: i32,
            month: u32,
            start_day: u32,
            end_day: u32,
        }

        // Deserialize into the helper struct
        let helper = ConfigHelper::deserialize(deserializer)?;

        let table = match helper.segments {
            Some(segments) if !segments.is_empty() => {
                let segments = segments
                    .into_iter()
                    .map(|s| {
                        DateSegment::new(s.year, s.month, s.start_day, s.end_day)
                            .map_err(|e| D::Error::custom(format!("Invalid segment: {}", e)))
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                DateTable::new(segments)
            }
            _ => DateTable::default(),
        };

        if helper.stages.is_empty() {
            return Err(D::Error::custom(ConfigError::NoStages));
        }

        Ok(Config {
            scripts_directory: PathBuf::from(helper.scripts_directory.unwrap_or_default()),
            table,
            stages: helper.stages,
            base_dir: PathBuf::from("."),
        })
    }
}

impl Config {
    pub fn new(table: DateTable, stages: HashMap<Stage, StageConfig>) -> Self {
        Self {
            scripts_directory: PathBuf::new(),
            table,
            stages,
            base_dir: PathBuf::from("."),
        }
    }

    /// Load a configuration file. Relative script locations are later
    /// resolved against the directory containing the file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let file = File::open(&path)?;
        let reader = BufReader::new(file);

        let mut config: Config = serde_json::from_reader(reader).map_err(ConfigError::from)?;

        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                config.base_dir = parent.to_path_buf();
            }
        }

        Ok(config)
    }

    pub fn table(&self) -> &DateTable {
        &self.table
    }

    pub fn stage(&self, stage: Stage) -> Option<&StageConfig> {
        self.stages.get(&stage)
    }

    /// Directory searched for stage scripts, anchored at the config
    /// file's location
    pub fn scripts_directory(&self) -> PathBuf {
        self.base_dir.join(&self.scripts_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_from_file() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("campaign.json");
        let mut file = File::create(&file_path).unwrap();

        let config_data = r#"
    {
        "scripts_directory": "shell",
        "segments": [
            { "year": 2019, "month": 11, "start_day": 7, "end_day": 30 },
            { "year": 2019, "month": 12, "start_day": 1, "end_day": 19 }
        ],
        "stages": {
            "filesep": { "script": "run_filesep.sh" },
            "trackmatch": { "script": "run_trackmatch.sh", "queue": { "program": "bsub", "queue": "s" } }
        }
    }
    "#;

        file.write_all(config_data.as_bytes()).unwrap();

        let config = Config::from_file(&file_path).unwrap();

        assert_eq!(config.table().len(), 2);
        assert_eq!(
            config.table().segment(0).unwrap().as_tuple(),
            (2019, 11, 7, 30)
        );

        let filesep = config.stage(Stage::FileSeparation).unwrap();
        assert_eq!(filesep.script, "run_filesep.sh");
        assert!(filesep.queue.is_none());

        let trackmatch = config.stage(Stage::TrackMatching).unwrap();
        assert_eq!(
            trackmatch.queue,
            Some(QueueSpec {
                program: "bsub".to_string(),
                queue: "s".to_string(),
            })
        );

        assert!(config.stage(Stage::HitConversion).is_none());

        assert_eq!(config.scripts_directory(), dir.path().join("shell"));
    }

    #[test]
    fn test_missing_segments_fall_back_to_default_table() {
        let config_data = r#"
    {
        "stages": {
            "hitconv": { "script": "run_hitconv.sh" }
        }
    }
    "#;

        let config: Config = serde_json::from_str(config_data).unwrap();

        assert_eq!(config.table(), &DateTable::default());
        assert_eq!(config.table().total_days(), 73);
    }

    #[test]
    fn test_rejects_invalid_segment() {
        let config_data = r#"
    {
        "segments": [
            { "year": 2019, "month": 11, "start_day": 30, "end_day": 7 }
        ],
        "stages": {
            "filesep": { "script": "run_filesep.sh" }
        }
    }
    "#;

        let result: Result<Config, _> = serde_json::from_str(config_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_empty_stages() {
        let config_data = r#"
    {
        "stages": {}
    }
    "#;

        let result: Result<Config, _> = serde_json::from_str(config_data);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_stage_name() {
        let config_data = r#"
    {
        "stages": {
            "tracking": { "script": "run.sh" }
        }
    }
    "#;

        let result: Result<Config, _> = serde_json::from_str(config_data);
        assert!(result.is_err());
    }
}
