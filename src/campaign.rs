use chrono::{Datelike, NaiveDate};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Config, ConfigError, Stage, StageConfig};
use crate::dispatch::{CommandRunner, DispatchCommand, QueueSpec};

/// Walks the date table and dispatches one subprocess per day, blocking
/// on each call before moving to the next. A failed day is recorded and
/// the loop keeps going.
pub struct CampaignRunner<'a> {
    config: &'a Config,
    runner: &'a dyn CommandRunner,
}

#[derive(Debug, Default)]
pub struct CampaignReport {
    pub dispatched: usize,
    pub succeeded: usize,
    pub failed: Vec<NaiveDate>,
}

impl CampaignReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

impl<'a> CampaignRunner<'a> {
    pub fn new(config: &'a Config, runner: &'a dyn CommandRunner) -> Self {
        CampaignRunner { config, runner }
    }

    pub fn run_stage(&self, stage: Stage) -> Result<CampaignReport, Box<dyn std::error::Error>> {
        let stage_config = self
            .config
            .stage(stage)
            .ok_or(ConfigError::MissingStage(stage))?;

        let script = self.resolve_script(stage_config);
        let table = self.config.table();

        println!(
            "Dispatching {} over {} date segments ({} days)",
            stage,
            table.len(),
            table.total_days()
        );

        let mut report = CampaignReport::default();

        for segment in table.iter() {
            for date in segment.days() {
                let command = day_command(&script, stage_config.queue.as_ref(), date);
                report.dispatched += 1;

                match self.runner.run(&command) {
                    Ok(status) if status.success() => {
                        report.succeeded += 1;
                        println!("✓ {} dispatched for {}", stage, date);
                    }
                    Ok(status) => {
                        tracing::warn!(
                            "{} failed for {} (exit code {:?})",
                            stage,
                            date,
                            status.code()
                        );
                        println!("✗ {} failed for {}", stage, date);
                        report.failed.push(date);
                    }
                    Err(e) => {
                        tracing::warn!("{} could not be dispatched for {}: {}", stage, date, e);
                        println!("✗ {} failed for {}", stage, date);
                        report.failed.push(date);
                    }
                }
            }
        }

        Ok(report)
    }

    /// Locate the stage script under the configured scripts directory.
    /// Falls back to a recursive search, then to the configured path
    /// as-is so that a missing script surfaces as per-day failures.
    fn resolve_script(&self, stage_config: &StageConfig) -> PathBuf {
        let scripts_dir = self.config.scripts_directory();

        // First try the direct path
        let direct = scripts_dir.join(&stage_config.script);
        if direct.exists() {
            return direct;
        }

        if let Some(found) = search_script_recursively(&scripts_dir, &stage_config.script) {
            return found;
        }

        tracing::warn!(
            "Script {} not found under {}",
            stage_config.script,
            scripts_dir.display()
        );
        direct
    }
}

/// Build the command for one day: `<script> <year> <month> <day>` with
/// decimal, non-zero-padded arguments, wrapped in the queue submission
/// command when one is configured.
fn day_command(script: &Path, queue: Option<&QueueSpec>, date: NaiveDate) -> DispatchCommand {
    let command = DispatchCommand::builder(&script.to_string_lossy())
        .arg(&date.year().to_string())
        .arg(&date.month().to_string())
        .arg(&date.day().to_string())
        .build();

    match queue {
        Some(queue) => queue.wrap(command),
        None => command,
    }
}

/// Search for a file by name recursively within a directory
fn search_script_recursively(base_dir: &Path, filename: &str) -> Option<PathBuf> {
    if !base_dir.exists() {
        return None;
    }

    for entry in WalkDir::new(base_dir).into_iter().filter_map(|e| e.ok()) {
        if entry.file_type().is_file()
            && let Some(file_name) = entry.path().file_name()
            && file_name.to_string_lossy() == filename
        {
            return Some(entry.path().to_path_buf());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{DispatchStatus, RecordingRunner};
    use std::collections::HashMap;

    fn test_config(stage: Stage, queue: Option<QueueSpec>) -> Config {
        let mut stages = HashMap::new();
        stages.insert(
            stage,
            StageConfig {
                script: "run_stage.sh".to_string(),
                queue,
            },
        );
        Config::new(crate::date_table::DateTable::default(), stages)
    }

    #[test]
    fn test_full_campaign_dispatches_73_days() {
        let config = test_config(Stage::FileSeparation, None);
        let runner = RecordingRunner::new();

        let report = CampaignRunner::new(&config, &runner)
            .run_stage(Stage::FileSeparation)
            .unwrap();

        assert_eq!(report.dispatched, 73);
        assert_eq!(report.succeeded, 73);
        assert!(report.all_succeeded());
        assert_eq!(runner.call_count(), 73);
    }

    #[test]
    fn test_command_arguments_are_unpadded() {
        let config = test_config(Stage::HitConversion, None);
        let runner = RecordingRunner::new();

        CampaignRunner::new(&config, &runner)
            .run_stage(Stage::HitConversion)
            .unwrap();

        let calls = runner.calls();
        assert_eq!(calls[0].args(), &["2019", "11", "7"]);
        assert_eq!(calls[23].args(), &["2019", "11", "30"]);
        assert_eq!(calls[24].args(), &["2019", "12", "1"]);
        assert_eq!(calls[72].args(), &["2020", "2", "12"]);
    }

    #[test]
    fn test_queue_submission_wraps_command() {
        let queue = QueueSpec {
            program: "bsub".to_string(),
            queue: "s".to_string(),
        };
        let config = test_config(Stage::TrackMatching, Some(queue));
        let runner = RecordingRunner::new();

        CampaignRunner::new(&config, &runner)
            .run_stage(Stage::TrackMatching)
            .unwrap();

        let first = &runner.calls()[0];
        assert_eq!(first.program(), "bsub");
        assert_eq!(first.args()[..2], ["-q".to_string(), "s".to_string()]);
        assert!(first.command_line().ends_with("run_stage.sh 2019 11 7"));
    }

    #[test]
    fn test_failed_day_does_not_stop_the_loop() {
        let config = test_config(Stage::FileSeparation, None);
        // Third day fails, everything else succeeds
        let runner = RecordingRunner::with_statuses([
            DispatchStatus::Success,
            DispatchStatus::Success,
            DispatchStatus::Failed(1),
        ]);

        let report = CampaignRunner::new(&config, &runner)
            .run_stage(Stage::FileSeparation)
            .unwrap();

        assert_eq!(report.dispatched, 73);
        assert_eq!(report.succeeded, 72);
        assert_eq!(
            report.failed,
            vec![NaiveDate::from_ymd_opt(2019, 11, 9).expect("Invalid date")]
        );
    }

    #[test]
    fn test_missing_stage_is_an_error() {
        let config = test_config(Stage::FileSeparation, None);
        let runner = RecordingRunner::new();

        let result = CampaignRunner::new(&config, &runner).run_stage(Stage::TrackMatching);
        assert!(result.is_err());
        assert_eq!(runner.call_count(), 0);
    }
}
