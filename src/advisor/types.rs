//! Advisor request and response types.

use crate::genome::Constraints;
use crate::hardware::{HardwareClass, UnknownHardware};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A request could not be turned into a plan.
#[derive(Debug, thiserror::Error)]
pub enum AdvisorError {
    #[error("unknown task type: {0:?}")]
    UnknownTaskType(String),
    #[error("unknown dataset size: {0:?}")]
    UnknownDatasetSize(String),
    #[error(transparent)]
    UnknownHardware(#[from] UnknownHardware),
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
    #[error("malformed advisor JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Learning task the model is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskType {
    #[serde(rename = "Image Classification")]
    ImageClassification,
    #[serde(rename = "Object Detection")]
    ObjectDetection,
    #[serde(rename = "NLP (text)")]
    Nlp,
    #[serde(rename = "Tabular")]
    Tabular,
    #[serde(rename = "Time Series")]
    TimeSeries,
}

impl TaskType {
    pub const ALL: [TaskType; 5] = [
        TaskType::ImageClassification,
        TaskType::ObjectDetection,
        TaskType::Nlp,
        TaskType::Tabular,
        TaskType::TimeSeries,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TaskType::ImageClassification => "Image Classification",
            TaskType::ObjectDetection => "Object Detection",
            TaskType::Nlp => "NLP (text)",
            TaskType::Tabular => "Tabular",
            TaskType::TimeSeries => "Time Series",
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TaskType {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TaskType::ALL
            .into_iter()
            .find(|t| t.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AdvisorError::UnknownTaskType(s.to_string()))
    }
}

/// Dataset size bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DatasetSize {
    #[serde(rename = "Small (<10k)")]
    Small,
    #[serde(rename = "Medium (10k-100k)")]
    Medium,
    #[serde(rename = "Large (>100k)")]
    Large,
}

impl DatasetSize {
    pub const ALL: [DatasetSize; 3] = [DatasetSize::Small, DatasetSize::Medium, DatasetSize::Large];

    pub fn label(self) -> &'static str {
        match self {
            DatasetSize::Small => "Small (<10k)",
            DatasetSize::Medium => "Medium (10k-100k)",
            DatasetSize::Large => "Large (>100k)",
        }
    }

    /// Bucket for a sample count: below 10k, up to 100k, above.
    pub fn from_samples(samples: u64) -> Self {
        match samples {
            0..=9_999 => DatasetSize::Small,
            10_000..=100_000 => DatasetSize::Medium,
            _ => DatasetSize::Large,
        }
    }
}

impl fmt::Display for DatasetSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DatasetSize {
    type Err = AdvisorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        DatasetSize::ALL
            .into_iter()
            .find(|d| d.label().eq_ignore_ascii_case(s) || format!("{d:?}").eq_ignore_ascii_case(s))
            .ok_or_else(|| AdvisorError::UnknownDatasetSize(s.to_string()))
    }
}

/// Relative importance of accuracy, latency and model size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Priority {
    pub accuracy: f64,
    pub latency: f64,
    pub size: f64,
}

impl Priority {
    pub fn new(accuracy: f64, latency: f64, size: f64) -> Self {
        Self {
            accuracy,
            latency,
            size,
        }
    }

    /// Rescales the weights to sum to 1.
    ///
    /// Rejects negative or non-finite weights and an all-zero vector.
    pub fn normalized(&self) -> Result<Priority, AdvisorError> {
        let weights = [self.accuracy, self.latency, self.size];
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(AdvisorError::InvalidPriority(format!(
                "weights must be finite and non-negative, got {weights:?}"
            )));
        }
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return Err(AdvisorError::InvalidPriority("all weights are zero".into()));
        }
        Ok(Priority::new(
            self.accuracy / total,
            self.latency / total,
            self.size / total,
        ))
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::new(0.4, 0.3, 0.3)
    }
}

/// Advisor input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requirements {
    pub task_type: TaskType,
    pub dataset_size: DatasetSize,
    #[serde(default)]
    pub priority: Priority,
    pub target_hardware: HardwareClass,
    #[serde(default)]
    pub constraints: Constraints,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub special_requirements: Option<String>,
}

impl Requirements {
    pub fn new(task_type: TaskType, dataset_size: DatasetSize, target_hardware: HardwareClass) -> Self {
        Self {
            task_type,
            dataset_size,
            priority: Priority::default(),
            target_hardware,
            constraints: Constraints::none(),
            special_requirements: None,
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_constraints(mut self, constraints: Constraints) -> Self {
        self.constraints = constraints;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingRecipe {
    pub epochs: String,
    pub batch_size: String,
    pub learning_rate: String,
    pub optimizer: String,
    pub schedule: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompressionStep {
    pub technique: String,
    pub description: String,
    pub impact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    pub runtime: String,
    pub batch_size: String,
    pub estimated_latency: String,
}

/// Advisor output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub base_architecture: String,
    pub modifications: Vec<String>,
    pub data_strategy: Vec<String>,
    pub training_recipe: TrainingRecipe,
    pub compression: Vec<CompressionStep>,
    pub deployment: Deployment,
    pub confidence: f64,
    pub justification: String,
    /// Names of the rules that contributed to the plan, in table order.
    pub applied_rules: Vec<String>,
    /// Hard constraints the baseline is expected to exceed.
    pub constraint_notes: Vec<String>,
}
