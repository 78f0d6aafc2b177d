use super::{DomainPolicy, Outcome, Strategy, StrategyOutcome, evaluate_all};
use crate::scenario::Scenario;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Why a ratio against the direct strategy could not be computed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Serialize)]
pub enum RatioCause {
    #[error("{strategy} {}", .outcome.marker())]
    Strategy { strategy: Strategy, outcome: Outcome },
    #[error("{strategy} evaluates to zero")]
    ZeroDenominator { strategy: Strategy },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Quantity {
    Work,
    Power,
}

impl Quantity {
    fn symbol(self) -> char {
        match self {
            Quantity::Work => 'W',
            Quantity::Power => 'P',
        }
    }

    fn pick(self, outcome: &StrategyOutcome) -> Outcome {
        match self {
            Quantity::Work => outcome.work,
            Quantity::Power => outcome.power,
        }
    }
}

/// `X1 / Xi` for one quantity and one competing strategy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Ratio {
    pub quantity: Quantity,
    pub against: Strategy,
    pub outcome: Outcome,
    pub cause: Option<RatioCause>,
}

impl Ratio {
    fn between(
        quantity: Quantity,
        baseline: Outcome,
        against: Strategy,
        other: Outcome,
    ) -> Self {
        let cause = if !baseline.is_valid() {
            Some(RatioCause::Strategy {
                strategy: Strategy::Direct,
                outcome: baseline,
            })
        } else if !other.is_valid() {
            Some(RatioCause::Strategy {
                strategy: against,
                outcome: other,
            })
        } else if other.value() == Some(0.0) {
            Some(RatioCause::ZeroDenominator { strategy: against })
        } else {
            None
        };
        Self {
            quantity,
            against,
            outcome: baseline.divide(other),
            cause,
        }
    }

    pub fn label(&self) -> String {
        let s = self.quantity.symbol();
        format!("{s}1/{s}{}", self.against.number())
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.quantity.symbol();
        write!(
            f,
            "Ratio of {s}1 to {s}{} is: ",
            self.against.number()
        )?;
        match (self.outcome, self.cause) {
            (Outcome::Valid(value), _) => write!(f, "{value}"),
            (_, Some(cause)) => write!(f, "undefined ({cause})"),
            (outcome, None) => write!(f, "undefined ({})", outcome.marker()),
        }
    }
}

/// Works, powers and the six ratios of one scenario.
#[derive(Clone, Debug, Serialize)]
pub struct Comparison {
    pub scenario: Scenario,
    pub policy: DomainPolicy,
    pub strategies: [StrategyOutcome; 4],
    pub ratios: Vec<Ratio>,
}

impl Comparison {
    pub fn evaluate(scenario: Scenario, policy: DomainPolicy) -> Self {
        let strategies = evaluate_all(&scenario, policy);
        let mut ratios = Vec::with_capacity(6);
        for quantity in [Quantity::Work, Quantity::Power] {
            let baseline = quantity.pick(&strategies[0]);
            for (idx, &against) in Strategy::ALL.iter().enumerate().skip(1) {
                ratios.push(Ratio::between(
                    quantity,
                    baseline,
                    against,
                    quantity.pick(&strategies[idx]),
                ));
            }
        }
        Self {
            scenario,
            policy,
            strategies,
            ratios,
        }
    }

    #[cfg(test)]
    pub(crate) fn ratio(&self, label: &str) -> Option<&Ratio> {
        self.ratios.iter().find(|ratio| ratio.label() == label)
    }

    pub fn undefined(&self) -> impl Iterator<Item = &Ratio> {
        self.ratios.iter().filter(|ratio| !ratio.outcome.is_valid())
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, ratio) in self.ratios.iter().enumerate() {
            if idx == 3 {
                writeln!(f)?;
            }
            writeln!(f, "{ratio}")?;
        }
        Ok(())
    }
}
