//! Declarative advisor rules.
//!
//! A [`Rule`] is a list of [`Condition`]s (all must hold) and a list of
//! [`Effect`]s. The engine walks the [`RuleTable`] in order:
//!
//! - single-valued slots (base architecture, epochs, runtime, ...) keep the
//!   value of the **first** rule that sets them;
//! - list slots (modifications, data strategy, compression) accumulate the
//!   values of **every** matching rule, without duplicates.
//!
//! Changing advisor behavior means editing [`RuleTable::standard`].

use super::types::{DatasetSize, Priority, TaskType};
use crate::hardware::HardwareClass;

/// Facts a rule can test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleContext {
    pub task_type: TaskType,
    pub dataset_size: DatasetSize,
    /// Normalized priority.
    pub priority: Priority,
    pub hardware: HardwareClass,
}

/// A predicate over a [`RuleContext`].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Always,
    HardwareIs(HardwareClass),
    TaskIs(TaskType),
    DatasetIs(DatasetSize),
    /// Matches when the hardware's high-resource flag equals the value.
    HighResource(bool),
    /// `priority.accuracy > priority.latency`
    AccuracyOverLatency,
    /// `priority.latency > priority.accuracy`
    LatencyOverAccuracy,
    /// `priority.size > threshold`
    SizeAbove(f64),
    AnyOf(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn holds(&self, ctx: &RuleContext) -> bool {
        match self {
            Condition::Always => true,
            Condition::HardwareIs(h) => ctx.hardware == *h,
            Condition::TaskIs(t) => ctx.task_type == *t,
            Condition::DatasetIs(d) => ctx.dataset_size == *d,
            Condition::HighResource(flag) => ctx.hardware.is_high_resource() == *flag,
            Condition::AccuracyOverLatency => ctx.priority.accuracy > ctx.priority.latency,
            Condition::LatencyOverAccuracy => ctx.priority.latency > ctx.priority.accuracy,
            Condition::SizeAbove(threshold) => ctx.priority.size > *threshold,
            Condition::AnyOf(conds) => conds.iter().any(|c| c.holds(ctx)),
            Condition::Not(cond) => !cond.holds(ctx),
        }
    }
}

/// What a matching rule contributes to the plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    BaseArchitecture(&'static str),
    Modification(&'static str),
    DataStrategy(&'static str),
    Epochs(&'static str),
    TrainingBatchSize(&'static str),
    LearningRate(&'static str),
    Optimizer(&'static str),
    Schedule(&'static str),
    Compression {
        technique: &'static str,
        description: &'static str,
        impact: &'static str,
    },
    Runtime(&'static str),
    DeploymentBatchSize(&'static str),
    EstimatedLatency(&'static str),
}

pub const QUANTIZATION: Effect = Effect::Compression {
    technique: "Quantization",
    description: "INT8 post-training quantization",
    impact: "-50% model size, -2% accuracy, +30% speed",
};

pub const PRUNING: Effect = Effect::Compression {
    technique: "Pruning",
    description: "Structured pruning with 30% sparsity",
    impact: "-30% parameters, -1% accuracy, +15% speed",
};

pub const DISTILLATION: Effect = Effect::Compression {
    technique: "Knowledge Distillation",
    description: "Distill from larger teacher model",
    impact: "-40% parameters, -1.5% accuracy vs teacher",
};

#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: &'static str,
    pub when: Vec<Condition>,
    pub then: Vec<Effect>,
}

impl Rule {
    pub fn new(name: &'static str, when: Vec<Condition>, then: Vec<Effect>) -> Self {
        Self { name, when, then }
    }

    pub fn matches(&self, ctx: &RuleContext) -> bool {
        self.when.iter().all(|c| c.holds(ctx))
    }
}

/// Ordered rule list.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    pub rules: Vec<Rule>,
}

impl RuleTable {
    /// The standard advisor rules.
    ///
    /// `size_cutoff` is the size-priority above which compression is
    /// recommended even on high-resource hardware.
    pub fn standard(size_cutoff: f64) -> Self {
        use Condition::*;
        use Effect::*;

        let rules = vec![
            // Base architecture by (hardware, task).
            Rule::new(
                "base-efficientnet-lite",
                vec![AnyOf(vec![
                    HardwareIs(HardwareClass::MobileArm),
                    HardwareIs(HardwareClass::RaspberryPi),
                ])],
                vec![BaseArchitecture("EfficientNet-lite")],
            ),
            Rule::new(
                "base-mobilenet-v3",
                vec![HardwareIs(HardwareClass::EdgeCpu)],
                vec![BaseArchitecture("MobileNetV3")],
            ),
            Rule::new(
                "base-bert-tiny",
                vec![HardwareIs(HardwareClass::CloudGpu), TaskIs(TaskType::Nlp)],
                vec![BaseArchitecture("BERT-tiny")],
            ),
            Rule::new(
                "base-resnet50",
                vec![HardwareIs(HardwareClass::CloudGpu)],
                vec![BaseArchitecture("ResNet50")],
            ),
            // Modifications by priority.
            Rule::new(
                "deepen-for-accuracy",
                vec![AccuracyOverLatency],
                vec![
                    Modification("Increase depth by 20%"),
                    Modification("Use larger kernel sizes (5x5 instead of 3x3)"),
                ],
            ),
            Rule::new(
                "widen-for-latency",
                vec![Not(Box::new(AccuracyOverLatency))],
                vec![
                    Modification("Reduce depth, increase width"),
                    Modification("Use depthwise separable convolutions"),
                    Modification("Implement early exit layers"),
                ],
            ),
            // Data strategy and epochs by dataset size.
            Rule::new(
                "small-dataset",
                vec![DatasetIs(DatasetSize::Small)],
                vec![
                    DataStrategy("Use transfer learning with ImageNet pretrained weights"),
                    DataStrategy("Aggressive data augmentation (rotation, flip, color jitter)"),
                    DataStrategy("Consider few-shot learning approaches"),
                    Epochs("50-100"),
                ],
            ),
            Rule::new(
                "medium-dataset",
                vec![DatasetIs(DatasetSize::Medium)],
                vec![
                    DataStrategy("Fine-tune with moderate augmentation"),
                    DataStrategy("Use mixup/cutmix for regularization"),
                    Epochs("30-50"),
                ],
            ),
            Rule::new(
                "large-dataset",
                vec![DatasetIs(DatasetSize::Large)],
                vec![
                    DataStrategy("Train from scratch with standard augmentation"),
                    DataStrategy("Implement progressive resizing"),
                    Epochs("20-30"),
                ],
            ),
            // Training recipe.
            Rule::new(
                "gpu-training-batch",
                vec![HighResource(true)],
                vec![TrainingBatchSize("64-128")],
            ),
            Rule::new(
                "recipe-defaults",
                vec![Always],
                vec![
                    TrainingBatchSize("16-32"),
                    LearningRate("1e-3 with cosine annealing"),
                    Optimizer("AdamW"),
                    Schedule("Warmup for 5% of steps, then cosine decay"),
                ],
            ),
            // Compression.
            Rule::new(
                "compress-for-size-or-device",
                vec![AnyOf(vec![SizeAbove(size_cutoff), HighResource(false)])],
                vec![QUANTIZATION, PRUNING],
            ),
            Rule::new(
                "distill-large-dataset",
                vec![DatasetIs(DatasetSize::Large)],
                vec![DISTILLATION],
            ),
            // Deployment.
            Rule::new(
                "deploy-server",
                vec![HighResource(true)],
                vec![Runtime("TorchScript or ONNX"), DeploymentBatchSize("32-64")],
            ),
            Rule::new(
                "deploy-on-device",
                vec![HighResource(false)],
                vec![Runtime("TFLite or ONNX Runtime"), DeploymentBatchSize("1")],
            ),
            Rule::new(
                "latency-critical",
                vec![LatencyOverAccuracy],
                vec![EstimatedLatency("< 50ms")],
            ),
            Rule::new(
                "latency-relaxed",
                vec![Always],
                vec![EstimatedLatency("50-150ms")],
            ),
        ];
        Self { rules }
    }

    /// Rules matching `ctx`, in table order.
    pub fn matching<'a>(&'a self, ctx: &'a RuleContext) -> impl Iterator<Item = &'a Rule> + 'a {
        self.rules.iter().filter(move |r| r.matches(ctx))
    }
}
