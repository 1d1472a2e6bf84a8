// config.rs — CLI data layout configuration.
//
// AppConfig determines where the CLI stores its state: goal records and
// the event notification log. The `for_root()` constructor generates
// sensible defaults under a `.keepsake/` directory in the data root.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Configuration for the Keepsake CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory for Keepsake data.
    pub data_root: PathBuf,

    /// Directory for GoalStore (one JSON file per goal).
    pub goals_dir: PathBuf,

    /// Path to the event notification log.
    pub events_log: PathBuf,
}

impl AppConfig {
    /// Create a config with standard `.keepsake/` layout under a root.
    pub fn for_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let ks_dir = root.join(".keepsake");
        Self {
            data_root: root,
            goals_dir: ks_dir.join("goals"),
            events_log: ks_dir.join("events.jsonl"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn for_root_lays_out_dot_directory() {
        let config = AppConfig::for_root("/data/home");
        assert_eq!(config.goals_dir, PathBuf::from("/data/home/.keepsake/goals"));
        assert_eq!(
            config.events_log,
            PathBuf::from("/data/home/.keepsake/events.jsonl")
        );
    }
}
