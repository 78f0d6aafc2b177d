//! Work, transit time and power of the four rip current escape strategies.
//!
//! Work omits the constant drag prefactor `0.5 * rho * C_D * A`, so values are
//! only meaningful relative to each other.

pub mod compare;

use crate::scenario::Scenario;
use serde::{Deserialize, Serialize};
use std::{f64::consts::SQRT_2, fmt};

/// Result of evaluating one formula for one scenario.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum Outcome {
    Valid(f64),
    /// Scenario lies outside the strategy's geometric validity region.
    OutOfDomain,
    DivisionByZero,
    InvalidParameter,
}

impl Outcome {
    /// Tag a computed value, treating overflow to infinity or NaN as a vanishing denominator.
    pub fn finite(value: f64) -> Outcome {
        if value.is_finite() {
            Outcome::Valid(value)
        } else {
            Outcome::DivisionByZero
        }
    }

    pub fn value(self) -> Option<f64> {
        match self {
            Outcome::Valid(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_valid(self) -> bool {
        matches!(self, Outcome::Valid(_))
    }

    /// Short label used in tables and console output in place of a number.
    pub fn marker(self) -> &'static str {
        match self {
            Outcome::Valid(_) => "valid",
            Outcome::OutOfDomain => "out-of-domain",
            Outcome::DivisionByZero => "div-by-zero",
            Outcome::InvalidParameter => "invalid",
        }
    }

    /// Divide two outcomes. The left tag wins when both are non-valid.
    pub fn divide(self, denominator: Outcome) -> Outcome {
        match (self, denominator) {
            (Outcome::Valid(_), Outcome::Valid(d)) if d == 0.0 => Outcome::DivisionByZero,
            (Outcome::Valid(n), Outcome::Valid(d)) => Outcome::finite(n / d),
            (Outcome::Valid(_), other) => other,
            (other, _) => other,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Valid(value) => write!(f, "{value}"),
            other => f.write_str(other.marker()),
        }
    }
}

/// Upper bound applied to the float strategy's starting distance.
///
/// The batch sweep bounded `l <= wf + lr`; the single-case evaluator did not.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FloatBound {
    Strict,
    Lenient,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPolicy {
    pub float_bound: FloatBound,
    /// Require `lx >= wr/2` for the parallel strategy.
    pub lateral_clearance: bool,
}

impl DomainPolicy {
    pub fn sweep() -> Self {
        Self {
            float_bound: FloatBound::Strict,
            lateral_clearance: false,
        }
    }

    pub fn single_case() -> Self {
        Self {
            float_bound: FloatBound::Lenient,
            lateral_clearance: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    /// 1: swim straight back to shore against the rip.
    Direct,
    /// 2: swim parallel to shore for `lx`, then straight in.
    Parallel,
    /// 3: swim at 45 degrees to the rip.
    Diagonal,
    /// 4: float and drift with the circulation.
    Float,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Direct,
        Strategy::Parallel,
        Strategy::Diagonal,
        Strategy::Float,
    ];

    pub fn number(self) -> usize {
        match self {
            Strategy::Direct => 1,
            Strategy::Parallel => 2,
            Strategy::Diagonal => 3,
            Strategy::Float => 4,
        }
    }

    pub fn in_domain(self, scenario: &Scenario, policy: DomainPolicy) -> bool {
        let g = &scenario.geometry;
        let upper = g.l <= g.wf + g.lr;
        match self {
            Strategy::Direct => g.l >= g.wf && upper,
            Strategy::Parallel => {
                g.l >= g.wf
                    && upper
                    && (!policy.lateral_clearance || scenario.clears_rip_laterally())
            }
            Strategy::Diagonal => g.l >= g.wf + 0.5 * g.wr && upper,
            Strategy::Float => match policy.float_bound {
                FloatBound::Strict => g.l >= g.wf && upper,
                FloatBound::Lenient => g.l >= g.wf,
            },
        }
    }

    pub fn work(self, scenario: &Scenario, policy: DomainPolicy) -> Outcome {
        if let Some(rejected) = precheck(scenario) {
            return rejected;
        }
        if !self.in_domain(scenario, policy) {
            return Outcome::OutOfDomain;
        }

        let Scenario {
            geometry: g,
            flow,
            swimmer,
            params,
        } = *scenario;
        let (ve, vr, vf) = (swimmer.ve, flow.vr, flow.vf);
        let ve2 = ve * ve;

        let work = match self {
            Strategy::Direct => {
                // powi(3) rounds differently from pow(x, 3.0) and shifts table digits.
                let rip = (ve + vr).powf(3.0) * ((g.l - g.wf) / ve);
                let feeder = (ve + vf).powf(3.0) * (g.wf / ve);
                rip + feeder
            }
            Strategy::Parallel => {
                let rip = (ve2 + vr * vr).powf(1.5) * (g.wr / (2.0 * ve));
                let lateral = ve2 * (params.lx - g.wr / 2.0);
                let shoreward = ve2 * (g.l - g.wf);
                let feeder = (ve2 + vf * vf).powf(1.5) * (g.wf / ve);
                rip + lateral + shoreward + feeder
            }
            Strategy::Diagonal => {
                let half_ve2 = ve2 / 2.0;
                let rip_speed = ve * SQRT_2 / 2.0 + vr;
                let rip = (half_ve2 + rip_speed * rip_speed).powf(1.5)
                    * (g.wr * SQRT_2 / (2.0 * ve));
                let middle = ve2 * (2.0 * (g.l - g.wf - g.wr / 2.0) / SQRT_2);
                let feeder_speed = ve * SQRT_2 / 2.0 + vf;
                let feeder = (feeder_speed * feeder_speed + half_ve2).powf(1.5)
                    * (2.0 * g.wf / (ve * SQRT_2));
                rip + middle + feeder
            }
            // Independent of l.
            Strategy::Float => 2.0 * ve2 * g.lr + (ve2 + vf * vf).powf(1.5) * (g.wf / ve),
        };
        Outcome::finite(work)
    }

    /// Time to reach shore. Not restricted to the strategy's domain.
    pub fn transit_time(self, scenario: &Scenario) -> Outcome {
        if let Some(rejected) = precheck(scenario) {
            return rejected;
        }
        let g = &scenario.geometry;
        let ve = scenario.swimmer.ve;
        let time = match self {
            Strategy::Direct => g.l / ve,
            Strategy::Parallel => (scenario.params.lx + g.l) / ve,
            Strategy::Diagonal => SQRT_2 * g.l / ve,
            Strategy::Float => (2.0 * g.lr + g.wf) / ve,
        };
        Outcome::finite(time)
    }

    pub fn power(self, scenario: &Scenario, policy: DomainPolicy) -> Outcome {
        self.work(scenario, policy)
            .divide(self.transit_time(scenario))
    }

    pub fn evaluate(self, scenario: &Scenario, policy: DomainPolicy) -> StrategyOutcome {
        StrategyOutcome {
            work: self.work(scenario, policy),
            power: self.power(scenario, policy),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "strategy {}", self.number())
    }
}

fn precheck(scenario: &Scenario) -> Option<Outcome> {
    if scenario.validate().is_err() {
        return Some(Outcome::InvalidParameter);
    }
    if scenario.swimmer.ve == 0.0 {
        return Some(Outcome::DivisionByZero);
    }
    None
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StrategyOutcome {
    pub work: Outcome,
    pub power: Outcome,
}

/// Evaluate all four strategies in order.
pub fn evaluate_all(scenario: &Scenario, policy: DomainPolicy) -> [StrategyOutcome; 4] {
    Strategy::ALL.map(|strategy| strategy.evaluate(scenario, policy))
}
