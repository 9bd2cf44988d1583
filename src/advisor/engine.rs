//! Rule evaluation and plan assembly.

use super::rules::{Effect, RuleContext, RuleTable, PRUNING, QUANTIZATION};
use super::types::{
    AdvisorError, CompressionStep, Deployment, Plan, Requirements, TrainingRecipe,
};
use log::debug;

/// Tunable constants of the advisor. Every cutoff the rules use lives here.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisorThresholds {
    /// Size priority above which compression is recommended on any hardware.
    pub size_compression_cutoff: f64,
    pub confidence_base: f64,
    /// Subtracted per hard constraint the baseline exceeds.
    pub violation_penalty: f64,
    /// Subtracted when no rule chose a base architecture.
    pub fallback_penalty: f64,
    pub confidence_min: f64,
    pub confidence_max: f64,
    pub fallback_architecture: &'static str,
}

impl Default for AdvisorThresholds {
    fn default() -> Self {
        Self {
            size_compression_cutoff: 0.5,
            confidence_base: 0.9,
            violation_penalty: 0.1,
            fallback_penalty: 0.05,
            confidence_min: 0.5,
            confidence_max: 0.95,
            fallback_architecture: "MobileNetV3",
        }
    }
}

/// Nominal size of a base architecture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Footprint {
    /// Millions of parameters.
    pub params: f64,
    /// Millions of FLOPs per inference.
    pub flops: f64,
}

/// Published reference sizes of the base architectures.
pub fn footprint(architecture: &str) -> Option<Footprint> {
    let (params, flops) = match architecture {
        "ResNet50" => (25.6, 4100.0),
        "MobileNetV3" => (5.4, 219.0),
        "EfficientNet-lite" => (4.7, 407.0),
        "BERT-tiny" => (4.4, 1200.0),
        _ => return None,
    };
    Some(Footprint { params, flops })
}

/// Upper bound in milliseconds of an estimated-latency label.
fn latency_upper_bound(estimate: &str) -> Option<f64> {
    estimate
        .trim_end_matches("ms")
        .rsplit(|c: char| c == '-' || c == '<' || c.is_whitespace())
        .find(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Slots filled while walking the rule table.
#[derive(Default)]
struct Draft {
    base: Option<&'static str>,
    modifications: Vec<String>,
    data_strategy: Vec<String>,
    epochs: Option<&'static str>,
    training_batch: Option<&'static str>,
    learning_rate: Option<&'static str>,
    optimizer: Option<&'static str>,
    schedule: Option<&'static str>,
    compression: Vec<CompressionStep>,
    runtime: Option<&'static str>,
    deployment_batch: Option<&'static str>,
    latency: Option<&'static str>,
}

fn set_once(slot: &mut Option<&'static str>, value: &'static str) -> bool {
    if slot.is_none() {
        *slot = Some(value);
        true
    } else {
        false
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) -> bool {
    if list.iter().any(|v| v == value) {
        false
    } else {
        list.push(value.to_string());
        true
    }
}

fn push_compression(list: &mut Vec<CompressionStep>, effect: &Effect) -> bool {
    let Effect::Compression {
        technique,
        description,
        impact,
    } = effect
    else {
        return false;
    };
    if list.iter().any(|s| s.technique == *technique) {
        return false;
    }
    list.push(CompressionStep {
        technique: technique.to_string(),
        description: description.to_string(),
        impact: impact.to_string(),
    });
    true
}

impl Draft {
    fn apply(&mut self, effect: &Effect) -> bool {
        match effect {
            Effect::BaseArchitecture(v) => set_once(&mut self.base, *v),
            Effect::Modification(v) => push_unique(&mut self.modifications, v),
            Effect::DataStrategy(v) => push_unique(&mut self.data_strategy, v),
            Effect::Epochs(v) => set_once(&mut self.epochs, *v),
            Effect::TrainingBatchSize(v) => set_once(&mut self.training_batch, *v),
            Effect::LearningRate(v) => set_once(&mut self.learning_rate, *v),
            Effect::Optimizer(v) => set_once(&mut self.optimizer, *v),
            Effect::Schedule(v) => set_once(&mut self.schedule, *v),
            Effect::Compression { .. } => push_compression(&mut self.compression, effect),
            Effect::Runtime(v) => set_once(&mut self.runtime, *v),
            Effect::DeploymentBatchSize(v) => set_once(&mut self.deployment_batch, *v),
            Effect::EstimatedLatency(v) => set_once(&mut self.latency, *v),
        }
    }
}

/// Rule-based architecture recommender.
///
/// Stateless apart from its rule table; never touches the search.
///
/// ```
/// use u_nas::advisor::{AdvisorEngine, DatasetSize, Priority, Requirements, TaskType};
/// use u_nas::hardware::HardwareClass;
///
/// let request = Requirements::new(
///     TaskType::ImageClassification,
///     DatasetSize::Small,
///     HardwareClass::MobileArm,
/// )
/// .with_priority(Priority::new(0.6, 0.3, 0.1));
///
/// let plan = AdvisorEngine::new().advise(&request).unwrap();
/// assert_eq!(plan.base_architecture, "EfficientNet-lite");
/// assert!(plan.data_strategy.iter().any(|s| s.contains("transfer learning")));
/// assert!(!plan.compression.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct AdvisorEngine {
    thresholds: AdvisorThresholds,
    rules: RuleTable,
}

impl Default for AdvisorEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorEngine {
    pub fn new() -> Self {
        Self::with_thresholds(AdvisorThresholds::default())
    }

    pub fn with_thresholds(thresholds: AdvisorThresholds) -> Self {
        let rules = RuleTable::standard(thresholds.size_compression_cutoff);
        Self { thresholds, rules }
    }

    /// Replaces the rule table.
    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn thresholds(&self) -> &AdvisorThresholds {
        &self.thresholds
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn advise(&self, requirements: &Requirements) -> Result<Plan, AdvisorError> {
        let ctx = RuleContext {
            task_type: requirements.task_type,
            dataset_size: requirements.dataset_size,
            priority: requirements.priority.normalized()?,
            hardware: requirements.target_hardware,
        };

        let mut draft = Draft::default();
        let mut applied_rules = Vec::new();
        for rule in self.rules.matching(&ctx) {
            let mut contributed = false;
            for effect in &rule.then {
                contributed |= draft.apply(effect);
            }
            if contributed {
                applied_rules.push(rule.name.to_string());
            }
        }
        debug!("advisor rules fired: {applied_rules:?}");

        let fallback = draft.base.is_none();
        let base = draft.base.unwrap_or(self.thresholds.fallback_architecture);
        let latency = draft.latency.unwrap_or("50-150ms");

        let mut constraint_notes = Vec::new();
        let constraints = &requirements.constraints;
        if let Some(fp) = footprint(base) {
            if let Some(max) = constraints.max_params.filter(|&max| fp.params > max) {
                constraint_notes.push(format!(
                    "{base} has about {}M parameters, above the {max}M limit; prune or narrow the network",
                    fp.params
                ));
                push_compression(&mut draft.compression, &PRUNING);
            }
            if let Some(max) = constraints.max_flops.filter(|&max| fp.flops > max) {
                constraint_notes.push(format!(
                    "{base} needs about {}M FLOPs, above the {max}M limit; reduce input resolution or depth",
                    fp.flops
                ));
                push_compression(&mut draft.compression, &PRUNING);
            }
        }
        if let (Some(max), Some(bound)) = (constraints.max_latency, latency_upper_bound(latency)) {
            if bound > max {
                constraint_notes.push(format!(
                    "estimated latency {latency} may exceed the {max}ms limit; quantize and add early exits"
                ));
                push_compression(&mut draft.compression, &QUANTIZATION);
            }
        }

        let t = &self.thresholds;
        let mut confidence = t.confidence_base - t.violation_penalty * constraint_notes.len() as f64;
        if fallback {
            confidence -= t.fallback_penalty;
        }
        let confidence = confidence.clamp(t.confidence_min, t.confidence_max);

        let mut justification = format!(
            "Based on your {} target and {} dataset, {base} offers the best accuracy-efficiency tradeoff. \
             The suggested modifications optimize for your stated priorities while maintaining deployability.",
            requirements.target_hardware, requirements.dataset_size
        );
        if !constraint_notes.is_empty() {
            justification.push_str(" Some hard constraints are tighter than the baseline; see the constraint notes.");
        }

        Ok(Plan {
            base_architecture: base.to_string(),
            modifications: draft.modifications,
            data_strategy: draft.data_strategy,
            training_recipe: TrainingRecipe {
                epochs: draft.epochs.unwrap_or("20-30").to_string(),
                batch_size: draft.training_batch.unwrap_or("16-32").to_string(),
                learning_rate: draft.learning_rate.unwrap_or_default().to_string(),
                optimizer: draft.optimizer.unwrap_or_default().to_string(),
                schedule: draft.schedule.unwrap_or_default().to_string(),
            },
            compression: draft.compression,
            deployment: Deployment {
                runtime: draft.runtime.unwrap_or_default().to_string(),
                batch_size: draft.deployment_batch.unwrap_or("1").to_string(),
                estimated_latency: latency.to_string(),
            },
            confidence,
            justification,
            applied_rules,
            constraint_notes,
        })
    }

    /// JSON request in, pretty JSON plan out.
    pub fn advise_json(&self, request: &str) -> Result<String, AdvisorError> {
        let requirements: Requirements = serde_json::from_str(request)?;
        let plan = self.advise(&requirements)?;
        Ok(serde_json::to_string_pretty(&plan)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::{DatasetSize, Priority, TaskType};
    use crate::genome::Constraints;
    use crate::hardware::HardwareClass;

    fn request(hw: HardwareClass, task: TaskType, data: DatasetSize, p: Priority) -> Requirements {
        Requirements::new(task, data, hw).with_priority(p)
    }

    #[test]
    fn test_mobile_image_classification_small() {
        let plan = AdvisorEngine::new()
            .advise(&request(
                HardwareClass::MobileArm,
                TaskType::ImageClassification,
                DatasetSize::Small,
                Priority::new(0.6, 0.3, 0.1),
            ))
            .unwrap();
        assert_eq!(plan.base_architecture, "EfficientNet-lite");
        assert_eq!(plan.data_strategy[0], "Use transfer learning with ImageNet pretrained weights");
        let techniques: Vec<&str> = plan.compression.iter().map(|c| c.technique.as_str()).collect();
        assert_eq!(techniques, vec!["Quantization", "Pruning"]);
        assert_eq!(plan.modifications[0], "Increase depth by 20%");
        assert_eq!(plan.training_recipe.epochs, "50-100");
        assert_eq!(plan.training_recipe.batch_size, "16-32");
        assert_eq!(plan.deployment.runtime, "TFLite or ONNX Runtime");
        assert_eq!(plan.deployment.batch_size, "1");
        assert_eq!(plan.deployment.estimated_latency, "50-150ms");
        assert!((plan.confidence - 0.9).abs() < 1e-12);
        assert!(plan.justification.starts_with("Based on your Mobile (ARM) target and Small (<10k) dataset"));
    }

    #[test]
    fn test_gpu_nlp_large_dataset() {
        let plan = AdvisorEngine::new()
            .advise(&request(
                HardwareClass::CloudGpu,
                TaskType::Nlp,
                DatasetSize::Large,
                Priority::new(0.3, 0.5, 0.2),
            ))
            .unwrap();
        assert_eq!(plan.base_architecture, "BERT-tiny");
        assert_eq!(plan.modifications.len(), 3);
        assert_eq!(plan.training_recipe.batch_size, "64-128");
        assert_eq!(plan.training_recipe.optimizer, "AdamW");
        // No size pressure on a GPU: only distillation.
        let techniques: Vec<&str> = plan.compression.iter().map(|c| c.technique.as_str()).collect();
        assert_eq!(techniques, vec!["Knowledge Distillation"]);
        assert_eq!(plan.deployment.runtime, "TorchScript or ONNX");
        assert_eq!(plan.deployment.estimated_latency, "< 50ms");
        assert!(plan.applied_rules.contains(&"base-bert-tiny".to_string()));
        assert!(!plan.applied_rules.contains(&"base-resnet50".to_string()));
    }

    #[test]
    fn test_unnormalized_priority_is_rescaled() {
        let engine = AdvisorEngine::new();
        let a = engine
            .advise(&request(HardwareClass::CloudGpu, TaskType::Tabular, DatasetSize::Medium, Priority::new(2.0, 2.0, 6.0)))
            .unwrap();
        // size = 0.6 after normalization, above the 0.5 cutoff
        assert_eq!(a.compression.len(), 2);
        assert!(engine
            .advise(&request(HardwareClass::CloudGpu, TaskType::Tabular, DatasetSize::Medium, Priority::new(0.0, 0.0, 0.0)))
            .is_err());
    }

    #[test]
    fn test_constraints_lower_confidence_and_force_pruning() {
        let req = request(
            HardwareClass::CloudGpu,
            TaskType::ImageClassification,
            DatasetSize::Medium,
            Priority::new(0.7, 0.2, 0.1),
        )
        .with_constraints(Constraints::none().with_max_params(10.0).with_max_latency(30.0));
        let plan = AdvisorEngine::new().advise(&req).unwrap();
        assert_eq!(plan.base_architecture, "ResNet50");
        assert_eq!(plan.constraint_notes.len(), 2);
        assert!((plan.confidence - 0.7).abs() < 1e-12);
        let techniques: Vec<&str> = plan.compression.iter().map(|c| c.technique.as_str()).collect();
        assert_eq!(techniques, vec!["Pruning", "Quantization"]);
    }

    #[test]
    fn test_fallback_without_base_rule() {
        let engine = AdvisorEngine::new().with_rules(RuleTable { rules: Vec::new() });
        let plan = engine
            .advise(&request(HardwareClass::EdgeCpu, TaskType::Tabular, DatasetSize::Small, Priority::default()))
            .unwrap();
        assert_eq!(plan.base_architecture, "MobileNetV3");
        assert!((plan.confidence - 0.85).abs() < 1e-12);
        assert!(plan.applied_rules.is_empty());
    }

    #[test]
    fn test_json_round_trip() {
        let json = AdvisorEngine::new()
            .advise_json(
                r#"{"taskType":"Tabular","datasetSize":"Large (>100k)",
                    "priority":{"accuracy":0.5,"latency":0.3,"size":0.2},
                    "targetHardware":"Raspberry Pi"}"#,
            )
            .unwrap();
        let plan: Plan = serde_json::from_str(&json).unwrap();
        assert_eq!(plan.base_architecture, "EfficientNet-lite");
        assert_eq!(plan.compression.len(), 3);
        assert!(json.contains("\"trainingRecipe\""));

        let err = AdvisorEngine::new().advise_json(r#"{"taskType":"Speech"}"#);
        assert!(matches!(err, Err(AdvisorError::Json(_))));
    }

    #[test]
    fn test_latency_bound_parsing() {
        assert_eq!(latency_upper_bound("50-150ms"), Some(150.0));
        assert_eq!(latency_upper_bound("< 50ms"), Some(50.0));
        assert_eq!(latency_upper_bound("fast"), None);
    }
}
