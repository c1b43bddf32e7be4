use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use evalgate_types::AggregateMetrics;

/// Experiment-tracking collaborator. One value, passed explicitly by the
/// orchestrator; a run is opened with `start_run` and must be closed with
/// `end_run` — use [`with_run`] to get that guarantee.
pub trait Tracker {
    fn start_run(&mut self, name: &str) -> Result<()>;
    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()>;
    fn log_metrics(&mut self, metrics: &AggregateMetrics) -> Result<()>;
    fn log_artifact(&mut self, path: &Path) -> Result<()>;
    fn end_run(&mut self) -> Result<()>;
}

/// Runs `f` inside a tracked run. The run is closed whether or not the body
/// succeeds; a body error takes precedence over a failure to close.
pub fn with_run<T>(
    tracker: &mut dyn Tracker,
    name: &str,
    f: impl FnOnce(&mut dyn Tracker) -> Result<T>,
) -> Result<T> {
    tracker.start_run(name)?;
    let outcome = f(tracker);
    let closed = tracker.end_run();
    let value = outcome?;
    closed?;
    Ok(value)
}

/// Accepts and discards everything, for untracked runs.
#[derive(Debug, Default)]
pub struct NoopTracker;

impl Tracker for NoopTracker {
    fn start_run(&mut self, _name: &str) -> Result<()> {
        Ok(())
    }
    fn log_params(&mut self, _params: &BTreeMap<String, String>) -> Result<()> {
        Ok(())
    }
    fn log_metrics(&mut self, _metrics: &AggregateMetrics) -> Result<()> {
        Ok(())
    }
    fn log_artifact(&mut self, _path: &Path) -> Result<()> {
        Ok(())
    }
    fn end_run(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(feature = "persistence")]
impl Tracker for evalgate_store::SqliteStore {
    fn start_run(&mut self, name: &str) -> Result<()> {
        self.create_run(name).map(|_| ())
    }
    fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()> {
        for (key, value) in params {
            self.log_param(key, value)?;
        }
        Ok(())
    }
    fn log_metrics(&mut self, metrics: &AggregateMetrics) -> Result<()> {
        for (name, value) in metrics {
            self.log_metric(name, *value)?;
        }
        Ok(())
    }
    fn log_artifact(&mut self, path: &Path) -> Result<()> {
        self.log_artifact_path(&path.display().to_string())
    }
    fn end_run(&mut self) -> Result<()> {
        self.finish_run()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingTracker {
        events: Vec<String>,
    }

    impl Tracker for RecordingTracker {
        fn start_run(&mut self, name: &str) -> Result<()> {
            self.events.push(format!("start:{name}"));
            Ok(())
        }
        fn log_params(&mut self, params: &BTreeMap<String, String>) -> Result<()> {
            self.events.push(format!("params:{}", params.len()));
            Ok(())
        }
        fn log_metrics(&mut self, metrics: &AggregateMetrics) -> Result<()> {
            self.events.push(format!("metrics:{}", metrics.len()));
            Ok(())
        }
        fn log_artifact(&mut self, path: &Path) -> Result<()> {
            self.events.push(format!("artifact:{}", path.display()));
            Ok(())
        }
        fn end_run(&mut self) -> Result<()> {
            self.events.push("end".to_string());
            Ok(())
        }
    }

    #[test]
    fn with_run_opens_and_closes_around_the_body() {
        let mut tracker = RecordingTracker::default();
        with_run(&mut tracker, "check_v1", |t| {
            t.log_metrics(&AggregateMetrics::from([("relevance".to_string(), 0.9)]))
        })
        .unwrap();
        assert_eq!(tracker.events, vec!["start:check_v1", "metrics:1", "end"]);
    }

    #[test]
    fn with_run_closes_the_run_even_when_the_body_errors() {
        let mut tracker = RecordingTracker::default();
        let result: Result<()> =
            with_run(&mut tracker, "check_v1", |_| anyhow::bail!("body failed"));
        assert!(result.is_err());
        assert_eq!(tracker.events.last().map(String::as_str), Some("end"));
    }
}
