//! The timeline asset: an ordered list of cumulative consumption steps.
//!
//! The JSON layout is owned by the asset pipeline; field aliases accept the
//! names used by the published `plastikwelt_timeline.json`.

use std::fmt;

use serde::Deserialize;

use crate::error::{AssetError, Result};

/// Group assigned to steps that do not name a garment
pub const DEFAULT_GROUP: &str = "item";

/// Year or free-form era shown next to a step
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Era {
    Year(i64),
    Label(String),
}

impl fmt::Display for Era {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Era::Year(year) => write!(f, "{}", year),
            Era::Label(label) => f.write_str(label),
        }
    }
}

fn default_group() -> String {
    DEFAULT_GROUP.to_string()
}

/// One step of the timeline
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TimelineStep {
    /// Running total consumed up to and including this step
    #[serde(alias = "items_consumed", alias = "cumulativeQuantity")]
    pub cumulative_quantity: f64,
    #[serde(default)]
    pub label: String,
    /// Longer text used when `label` is blank
    #[serde(default)]
    pub description: Option<String>,
    /// Garment category introduced by this step
    #[serde(default = "default_group", alias = "groupKey", alias = "garment")]
    pub group_key: String,
    /// Mesh file for the garment shape, if any
    #[serde(default, alias = "shellFile", alias = "mesh")]
    pub shell_file: Option<String>,
    #[serde(default, alias = "year", alias = "age")]
    pub era: Option<Era>,
    #[serde(default, alias = "references", alias = "referenceUrl")]
    pub reference_url: Option<String>,
}

impl TimelineStep {
    pub fn new(cumulative_quantity: f64, group_key: impl Into<String>) -> Self {
        Self {
            cumulative_quantity,
            label: String::new(),
            description: None,
            group_key: group_key.into(),
            shell_file: None,
            era: None,
            reference_url: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Label shown in the overlay, falling back to the description
    pub fn display_label(&self) -> &str {
        if !self.label.is_empty() {
            return &self.label;
        }
        self.description.as_deref().unwrap_or("")
    }

    pub fn era(mut self, era: Era) -> Self {
        self.era = Some(era);
        self
    }

    pub fn shell_file(mut self, file: impl Into<String>) -> Self {
        self.shell_file = Some(file.into());
        self
    }

    pub fn reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = Some(url.into());
        self
    }
}

/// Immutable, validated timeline
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Timeline {
    steps: Vec<TimelineStep>,
}

impl Timeline {
    /// Build a timeline, rejecting negative, non-finite or decreasing quantities
    pub fn new(steps: Vec<TimelineStep>) -> Result<Self> {
        let mut previous = 0.0;
        for (index, step) in steps.iter().enumerate() {
            let value = step.cumulative_quantity;
            if !value.is_finite() || value < 0.0 {
                return Err(AssetError::InvalidQuantity { index });
            }
            if value < previous {
                return Err(AssetError::NonMonotonic {
                    index,
                    previous,
                    value,
                });
            }
            previous = value;
        }
        Ok(Self { steps })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let steps: Vec<TimelineStep> = serde_json::from_str(json)?;
        Self::new(steps)
    }

    /// Decode the timeline, degrading to an empty one on any error.
    ///
    /// An empty timeline disables step navigation but keeps the silhouette
    /// on screen.
    pub fn load_or_empty(json: &str) -> Self {
        match Self::from_json(json) {
            Ok(timeline) => {
                log::info!("Timeline loaded: {} steps", timeline.len());
                timeline
            }
            Err(err) => {
                log::error!("Failed to load timeline, continuing without steps: {}", err);
                Self::empty()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[TimelineStep] {
        &self.steps
    }

    /// Step at `level`; negative and past-the-end levels have no step
    pub fn get(&self, level: i32) -> Option<&TimelineStep> {
        usize::try_from(level).ok().and_then(|i| self.steps.get(i))
    }

    /// The last step's cumulative value, zero for an empty timeline
    pub fn total_quantity(&self) -> f64 {
        self.steps.last().map_or(0.0, |s| s.cumulative_quantity)
    }

    /// Cumulative quantity at `level`; zero before the first step, the total
    /// past the last one
    pub fn quantity(&self, level: i32) -> f64 {
        if level < 0 {
            return 0.0;
        }
        match self.get(level) {
            Some(step) => step.cumulative_quantity,
            None => self.total_quantity(),
        }
    }

    /// Fraction of the total consumed at `level`, guarded against a zero total
    pub fn percent(&self, level: i32) -> f32 {
        let total = self.total_quantity();
        if total <= 0.0 {
            return 0.0;
        }
        (self.quantity(level) / total) as f32
    }

    /// Number of particles among `count` that are consumed by `level`
    pub fn cutoff(&self, level: i32, count: usize) -> usize {
        let total = self.total_quantity();
        if total <= 0.0 {
            return 0;
        }
        // Multiply before dividing so exact ratios stay exact
        let cut = (count as f64 * self.quantity(level) / total).floor() as usize;
        cut.min(count)
    }

    /// Distinct group keys in order of first appearance
    pub fn group_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !keys.contains(&step.group_key.as_str()) {
                keys.push(&step.group_key);
            }
        }
        keys
    }

    /// First step that introduces `group_key`
    pub fn first_step_of(&self, group_key: &str) -> Option<usize> {
        self.steps.iter().position(|s| s.group_key == group_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Timeline {
        Timeline::new(vec![
            TimelineStep::new(10.0, "tee"),
            TimelineStep::new(30.0, "pants"),
            TimelineStep::new(100.0, "sneaks"),
        ])
        .unwrap()
    }

    #[test]
    fn test_percent_and_total() {
        let timeline = fixture();
        assert_eq!(timeline.total_quantity(), 100.0);
        assert!((timeline.percent(1) - 0.3).abs() < 1e-6);
        assert_eq!(timeline.percent(-1), 0.0);
        assert_eq!(timeline.percent(3), 1.0);
    }

    #[test]
    fn test_cutoff_is_exact() {
        let timeline = fixture();
        assert_eq!(timeline.cutoff(0, 100), 10);
        assert_eq!(timeline.cutoff(1, 100), 30);
        assert_eq!(timeline.cutoff(2, 100), 100);
        assert_eq!(timeline.cutoff(-1, 100), 0);
    }

    #[test]
    fn test_empty_timeline_has_zero_percent() {
        let timeline = Timeline::empty();
        assert_eq!(timeline.total_quantity(), 0.0);
        assert_eq!(timeline.percent(0), 0.0);
        assert_eq!(timeline.cutoff(0, 50), 0);
    }

    #[test]
    fn test_zero_total_has_zero_percent() {
        let timeline = Timeline::new(vec![TimelineStep::new(0.0, "tee")]).unwrap();
        assert_eq!(timeline.percent(0), 0.0);
    }

    #[test]
    fn test_rejects_decreasing_quantities() {
        let err = Timeline::new(vec![
            TimelineStep::new(20.0, "tee"),
            TimelineStep::new(10.0, "tee"),
        ])
        .unwrap_err();
        assert!(matches!(err, AssetError::NonMonotonic { index: 1, .. }));
    }

    #[test]
    fn test_from_json_with_source_field_names() {
        let json = r#"[
            {"items_consumed": 12, "label": "of tees", "garment": "tee",
             "year": 2004, "references": "https://example.org/a"},
            {"items_consumed": 40, "description": "of jeans", "groupKey": "pants",
             "age": "teens", "shellFile": "pants.glb"}
        ]"#;
        let timeline = Timeline::from_json(json).unwrap();
        assert_eq!(timeline.len(), 2);
        let first = timeline.get(0).unwrap();
        assert_eq!(first.group_key, "tee");
        assert_eq!(first.era, Some(Era::Year(2004)));
        assert_eq!(first.reference_url.as_deref(), Some("https://example.org/a"));
        let second = timeline.get(1).unwrap();
        assert_eq!(second.label, "");
        assert_eq!(second.display_label(), "of jeans");
        assert_eq!(second.era.as_ref().map(|e| e.to_string()).as_deref(), Some("teens"));
        assert_eq!(second.shell_file.as_deref(), Some("pants.glb"));
    }

    #[test]
    fn test_missing_group_defaults() {
        let timeline = Timeline::from_json(r#"[{"items_consumed": 5}]"#).unwrap();
        assert_eq!(timeline.get(0).unwrap().group_key, DEFAULT_GROUP);
    }

    #[test]
    fn test_load_or_empty_degrades() {
        assert!(Timeline::load_or_empty("{not json").is_empty());
        assert!(Timeline::load_or_empty(r#"[{"items_consumed": -3}]"#).is_empty());
    }

    #[test]
    fn test_group_keys_in_first_appearance_order() {
        let timeline = Timeline::new(vec![
            TimelineStep::new(1.0, "tee"),
            TimelineStep::new(2.0, "pants"),
            TimelineStep::new(3.0, "tee"),
        ])
        .unwrap();
        assert_eq!(timeline.group_keys(), vec!["tee", "pants"]);
        assert_eq!(timeline.first_step_of("tee"), Some(0));
        assert_eq!(timeline.first_step_of("pants"), Some(1));
        assert_eq!(timeline.first_step_of("sweat"), None);
    }
}
