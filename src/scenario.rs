use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScenarioError {
    #[error("invalid parameter {name}={value}: must be finite and non-negative")]
    InvalidParameter { name: &'static str, value: f64 },
}

/// Idealised rip layout, all lengths in metres.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RipGeometry {
    /// Swimmer starting distance offshore.
    pub l: f64,
    /// Rip channel length.
    pub lr: f64,
    /// Rip channel width.
    pub wr: f64,
    /// Feeder channel width.
    pub wf: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowField {
    /// Rip channel current speed [m/s].
    pub vr: f64,
    /// Feeder channel current speed [m/s].
    pub vf: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwimmerProfile {
    /// Escape speed [m/s]. Zero is accepted here and surfaces as a division by zero.
    pub ve: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyParams {
    /// Distance swum parallel to shore in the parallel strategy [m].
    pub lx: f64,
}

/// One fully specified rip current and swimmer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub geometry: RipGeometry,
    pub flow: FlowField,
    pub swimmer: SwimmerProfile,
    pub params: StrategyParams,
}

impl Scenario {
    /// Reject negative or non-finite inputs, reporting the first offender.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        let fields = [
            ("l", self.geometry.l),
            ("lr", self.geometry.lr),
            ("wr", self.geometry.wr),
            ("wf", self.geometry.wf),
            ("vr", self.flow.vr),
            ("vf", self.flow.vf),
            ("ve", self.swimmer.ve),
            ("lx", self.params.lx),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ScenarioError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }

    /// Whether the lateral swim clears the rip channel (`lx >= wr/2`).
    pub fn clears_rip_laterally(&self) -> bool {
        self.params.lx >= self.geometry.wr / 2.0
    }
}

#[cfg(test)]
pub(crate) fn reference_scenario() -> Scenario {
    Scenario {
        geometry: RipGeometry {
            l: 115.0,
            lr: 55.0,
            wr: 50.0,
            wf: 60.0,
        },
        flow: FlowField { vr: 1.0, vf: 1.5 },
        swimmer: SwimmerProfile { ve: 0.25 },
        params: StrategyParams { lx: 60.0 },
    }
}
