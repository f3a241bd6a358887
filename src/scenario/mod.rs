//! Scenario definition: an ordered list of device actions and checkpoints.

pub mod runner;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::config::{Point, ScenarioConfig, seconds_to_duration};
use crate::harness::{HarnessError, HarnessResult};

pub use runner::ScenarioRunner;

/// One scripted step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Launch an activity of the scenario's package by its fully-qualified name
    StartActivity {
        activity: String,
        #[serde(default)]
        label: Option<String>,
    },

    /// Tap at pixel coordinates
    Touch {
        x: i32,
        y: i32,
        #[serde(default)]
        label: Option<String>,
    },

    /// Extra unconditional wait, on top of the automatic settle delay
    Wait { seconds: f64 },

    /// Capture the screen and verify it against its reference
    Checkpoint { title: String },
}

impl Step {
    pub fn start_activity(activity: impl Into<String>, label: &str) -> Self {
        Step::StartActivity {
            activity: activity.into(),
            label: Some(label.to_string()),
        }
    }

    pub fn touch(point: Point, label: &str) -> Self {
        Step::Touch {
            x: point.x,
            y: point.y,
            label: Some(label.to_string()),
        }
    }

    pub fn checkpoint(title: &str) -> Self {
        Step::Checkpoint {
            title: title.to_string(),
        }
    }

    /// Whether the step can change what is on screen (and so needs to settle)
    pub fn is_ui_mutating(&self) -> bool {
        matches!(self, Step::StartActivity { .. } | Step::Touch { .. })
    }

    /// Reject steps that cannot run or would produce unusable filenames
    pub fn validate(&self) -> HarnessResult<()> {
        match self {
            Step::StartActivity { activity, .. } if activity.trim().is_empty() => Err(
                HarnessError::Config("start_activity needs an activity name".to_string()),
            ),
            Step::Wait { seconds } => seconds_to_duration(*seconds, "wait seconds").map(|_| ()),
            Step::Checkpoint { title } if !is_valid_title(title) => Err(HarnessError::Config(
                format!("checkpoint title '{}' is not usable in a filename", title),
            )),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::StartActivity {
                label: Some(label), ..
            } => write!(f, "Starting activity {}", label),
            Step::StartActivity { activity, .. } => write!(f, "Starting activity {}", activity),
            Step::Touch {
                label: Some(label), ..
            } => write!(f, "{}", label),
            Step::Touch { x, y, .. } => write!(f, "Touching ({}, {})", x, y),
            Step::Wait { seconds } => write!(f, "Waiting {}s", seconds),
            Step::Checkpoint { title } => write!(f, "Checkpoint {}", title),
        }
    }
}

fn is_valid_title(title: &str) -> bool {
    !title.is_empty()
        && title
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// A complete scenario, run exactly once per invocation
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Package installed before the first step
    pub apk_path: PathBuf,

    /// Package identifier used to build component names
    pub package: String,

    /// Wait applied after every UI-mutating step
    pub settle_delay: Duration,

    pub steps: Vec<Step>,
}

impl Scenario {
    /// Build the scenario described by a configuration.
    ///
    /// Uses the configured step list when present, otherwise the built-in
    /// alarm scenario.
    pub fn from_config(config: &ScenarioConfig) -> Self {
        let steps = config
            .steps
            .clone()
            .unwrap_or_else(|| alarm_morning_steps(config));

        Self {
            apk_path: config.apk_path.clone(),
            package: config.package.clone(),
            settle_delay: config.settle_delay(),
            steps,
        }
    }

    /// Component name (`package/activity`) for an activity of this package
    pub fn component(&self, activity: &str) -> String {
        format!("{}/{}", self.package, activity)
    }

    /// Titles of all checkpoints, in order
    pub fn checkpoint_titles(&self) -> Vec<&str> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                Step::Checkpoint { title } => Some(title.as_str()),
                _ => None,
            })
            .collect()
    }
}

/// Calendar, menu, defaults, settings and ring screens, with returns in between
fn alarm_morning_steps(config: &ScenarioConfig) -> Vec<Step> {
    let touches = &config.touches;
    vec![
        Step::start_activity(&config.activities.calendar, "Calendar"),
        Step::checkpoint("calendar"),
        Step::touch(touches.menu, "Showing menu"),
        Step::checkpoint("menu"),
        Step::touch(touches.defaults, "Starting activity Defaults"),
        Step::checkpoint("defaults"),
        Step::touch(touches.back, "Going back"),
        Step::touch(touches.menu, "Showing menu"),
        Step::touch(touches.settings, "Starting activity Settings"),
        Step::checkpoint("settings"),
        Step::touch(touches.back, "Going back"),
        Step::start_activity(&config.activities.ring, "Ring"),
        Step::checkpoint("ring"),
        Step::touch(touches.dismiss, "Dismiss"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_builtin_scenario_checkpoints() {
        let scenario = Scenario::from_config(&ScenarioConfig::default());
        assert_eq!(
            scenario.checkpoint_titles(),
            vec!["calendar", "menu", "defaults", "settings", "ring"]
        );
        assert_eq!(scenario.settle_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_builtin_scenario_uses_configured_values() {
        let mut config = ScenarioConfig::default();
        config.touches.dismiss = Point::new(1, 2);
        config.activities.ring = "org.example.Ring".to_string();

        let scenario = Scenario::from_config(&config);
        assert_eq!(scenario.steps.last(), Some(&Step::touch(Point::new(1, 2), "Dismiss")));
        assert!(scenario.steps.contains(&Step::start_activity("org.example.Ring", "Ring")));
    }

    #[test]
    fn test_component_name() {
        let scenario = Scenario::from_config(&ScenarioConfig::default());
        assert_eq!(
            scenario.component("cz.jaro.alarmmorning.RingActivity"),
            "cz.jaro.alarmmorning/cz.jaro.alarmmorning.RingActivity"
        );
    }

    #[test]
    fn test_steps_from_toml() {
        let config = ScenarioConfig::parse(
            r#"
            [[steps]]
            action = "start_activity"
            activity = "org.example.Main"

            [[steps]]
            action = "touch"
            x = 10
            y = 20
            label = "Open drawer"

            [[steps]]
            action = "wait"
            seconds = 1.5

            [[steps]]
            action = "checkpoint"
            title = "drawer"
            "#,
        )
        .unwrap();

        let scenario = Scenario::from_config(&config);
        assert_eq!(
            scenario.steps,
            vec![
                Step::StartActivity {
                    activity: "org.example.Main".to_string(),
                    label: None,
                },
                Step::Touch {
                    x: 10,
                    y: 20,
                    label: Some("Open drawer".to_string()),
                },
                Step::Wait { seconds: 1.5 },
                Step::checkpoint("drawer"),
            ]
        );
    }

    #[test]
    fn test_invalid_steps_rejected() {
        assert!(Step::checkpoint("a/b").validate().is_err());
        assert!(Step::checkpoint("").validate().is_err());
        assert!(Step::Wait { seconds: -1.0 }.validate().is_err());
        assert!(Step::Wait { seconds: 1e30 }.validate().is_err());
        assert!(Step::Wait { seconds: f64::NAN }.validate().is_err());
        assert!(Step::start_activity(" ", "x").validate().is_err());
        assert!(Step::checkpoint("ring").validate().is_ok());
    }

    #[test]
    fn test_ui_mutating_steps() {
        assert!(Step::touch(Point::new(0, 0), "t").is_ui_mutating());
        assert!(Step::start_activity("a", "A").is_ui_mutating());
        assert!(!Step::checkpoint("c").is_ui_mutating());
        assert!(!Step::Wait { seconds: 1.0 }.is_ui_mutating());
    }

    #[test]
    fn test_step_display() {
        assert_eq!(Step::start_activity("x", "Ring").to_string(), "Starting activity Ring");
        assert_eq!(
            Step::Touch { x: 3, y: 4, label: None }.to_string(),
            "Touching (3, 4)"
        );
    }
}
