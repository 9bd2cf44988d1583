//! Target hardware classes.
//!
//! Shared by the search (which restricts the operation catalog and FLOPs
//! budget per class) and the advisor (which keys its rule table on it).

use crate::genome::Operation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deployment target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareClass {
    #[serde(rename = "Cloud GPU")]
    CloudGpu,
    #[serde(rename = "Edge CPU")]
    EdgeCpu,
    #[serde(rename = "Mobile (ARM)")]
    MobileArm,
    #[serde(rename = "Raspberry Pi")]
    RaspberryPi,
}

/// Search restrictions for one hardware class.
#[derive(Debug, Clone, PartialEq)]
pub struct HardwareProfile {
    /// FLOPs ceiling in millions.
    pub max_flops: f64,
    pub allowed_operations: &'static [Operation],
}

const GPU_OPS: &[Operation] = &[
    Operation::Conv1x1,
    Operation::DilConv3x3,
    Operation::SepConv3x3,
    Operation::Skip,
];
const CPU_OPS: &[Operation] = &[Operation::Conv1x1, Operation::SepConv3x3, Operation::Skip];
const MOBILE_OPS: &[Operation] = &[Operation::SepConv3x3, Operation::AvgPool, Operation::Skip];
const PI_OPS: &[Operation] = &[Operation::SepConv3x3, Operation::AvgPool];

impl HardwareClass {
    pub const ALL: [HardwareClass; 4] = [
        HardwareClass::CloudGpu,
        HardwareClass::EdgeCpu,
        HardwareClass::MobileArm,
        HardwareClass::RaspberryPi,
    ];

    /// Display label, as accepted by [`FromStr`].
    pub fn label(self) -> &'static str {
        match self {
            HardwareClass::CloudGpu => "Cloud GPU",
            HardwareClass::EdgeCpu => "Edge CPU",
            HardwareClass::MobileArm => "Mobile (ARM)",
            HardwareClass::RaspberryPi => "Raspberry Pi",
        }
    }

    /// Only the cloud GPU class counts as high-resource.
    pub fn is_high_resource(self) -> bool {
        self == HardwareClass::CloudGpu
    }

    pub fn profile(self) -> HardwareProfile {
        match self {
            HardwareClass::CloudGpu => HardwareProfile {
                max_flops: 1000.0,
                allowed_operations: GPU_OPS,
            },
            HardwareClass::EdgeCpu => HardwareProfile {
                max_flops: 500.0,
                allowed_operations: CPU_OPS,
            },
            HardwareClass::MobileArm => HardwareProfile {
                max_flops: 100.0,
                allowed_operations: MOBILE_OPS,
            },
            HardwareClass::RaspberryPi => HardwareProfile {
                max_flops: 50.0,
                allowed_operations: PI_OPS,
            },
        }
    }
}

impl fmt::Display for HardwareClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error for an unrecognized hardware label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown hardware class: {0:?}")]
pub struct UnknownHardware(pub String);

impl FromStr for HardwareClass {
    type Err = UnknownHardware;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HardwareClass::ALL
            .into_iter()
            .find(|h| h.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownHardware(s.to_string()))
    }
}
