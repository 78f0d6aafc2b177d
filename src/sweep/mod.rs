pub mod report;

use crate::{
    scenario::{FlowField, RipGeometry, Scenario, StrategyParams, SwimmerProfile},
    strategy::{DomainPolicy, Outcome, Strategy, StrategyOutcome, evaluate_all},
};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("parameter axis `{0}` has no values; the sweep would be empty")]
    EmptyAxis(&'static str),
}

/// Nesting order of the sweep, outermost first.
pub const AXES: [&str; 8] = ["l", "wf", "vr", "vf", "ve", "wr", "lr", "lx_multiplier"];

/// Candidate values for every swept parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParameterGrid {
    pub l: Vec<f64>,
    pub wf: Vec<f64>,
    pub vr: Vec<f64>,
    pub vf: Vec<f64>,
    pub ve: Vec<f64>,
    pub wr: Vec<f64>,
    pub lr: Vec<f64>,
    /// Lateral swim distance expressed in rip widths (`lx = multiplier * wr`).
    pub lx_multiplier: Vec<f64>,
}

impl Default for ParameterGrid {
    fn default() -> Self {
        let mut l: Vec<f64> = (5..=20).map(|step| f64::from(step) * 5.0).collect();
        l.extend([150.0, 200.0, 250.0, 400.0]);
        Self {
            l,
            wf: vec![25.0, 75.0],
            vr: vec![0.2, 2.5],
            vf: vec![0.25, 1.0],
            ve: vec![0.1, 1.0],
            wr: vec![10.0, 50.0],
            lr: vec![25.0, 50.0, 75.0, 100.0, 200.0, 400.0],
            lx_multiplier: vec![1.0, 1.5, 2.0],
        }
    }
}

/// One combination of the cross-product, before evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPoint {
    /// 1-based position in canonical nested order.
    pub sequence: u64,
    pub scenario: Scenario,
    pub lx_multiplier: f64,
}

impl ParameterGrid {
    fn axes(&self) -> [&[f64]; 8] {
        [
            &self.l,
            &self.wf,
            &self.vr,
            &self.vf,
            &self.ve,
            &self.wr,
            &self.lr,
            &self.lx_multiplier,
        ]
    }

    pub fn len(&self) -> usize {
        self.axes().iter().map(|axis| axis.len()).product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn check(&self) -> Result<(), GridError> {
        for (name, axis) in AXES.iter().zip(self.axes()) {
            if axis.is_empty() {
                return Err(GridError::EmptyAxis(*name));
            }
        }
        Ok(())
    }

    /// Decode a 0-based index; the last axis varies fastest.
    pub fn point_at(&self, index: usize) -> GridPoint {
        let axes = self.axes();
        let mut picked = [0.0; 8];
        let mut rest = index;
        for (slot, axis) in picked.iter_mut().zip(axes.iter()).rev() {
            *slot = axis[rest % axis.len()];
            rest /= axis.len();
        }
        let [l, wf, vr, vf, ve, wr, lr, lx_multiplier] = picked;
        GridPoint {
            sequence: index as u64 + 1,
            scenario: Scenario {
                geometry: RipGeometry { l, lr, wr, wf },
                flow: FlowField { vr, vf },
                swimmer: SwimmerProfile { ve },
                params: StrategyParams {
                    lx: lx_multiplier * wr,
                },
            },
            lx_multiplier,
        }
    }

    /// Lazily walk the cross-product in canonical order.
    pub fn points(&self) -> impl ExactSizeIterator<Item = GridPoint> + '_ {
        (0..self.len()).map(move |index| self.point_at(index))
    }
}

/// Evaluated combination: one row of every output table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SweepRecord {
    pub sequence: u64,
    pub scenario: Scenario,
    pub lx_multiplier: f64,
    /// Normalised coordinate `l / wf`.
    pub x: Outcome,
    pub strategies: [StrategyOutcome; 4],
}

impl SweepRecord {
    pub fn outcome(&self, strategy: Strategy) -> StrategyOutcome {
        self.strategies[strategy.number() - 1]
    }
}

impl GridPoint {
    pub fn evaluate(&self, policy: DomainPolicy) -> SweepRecord {
        let g = &self.scenario.geometry;
        let x = if self.scenario.validate().is_err() {
            Outcome::InvalidParameter
        } else {
            Outcome::Valid(g.l).divide(Outcome::Valid(g.wf))
        };
        SweepRecord {
            sequence: self.sequence,
            scenario: self.scenario,
            lx_multiplier: self.lx_multiplier,
            x,
            strategies: evaluate_all(&self.scenario, policy),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SweepOptions {
    pub policy: DomainPolicy,
    pub parallel: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            policy: DomainPolicy::sweep(),
            parallel: false,
        }
    }
}

/// Evaluate every combination of `grid`, in canonical order.
pub fn run_sweep(grid: &ParameterGrid, options: SweepOptions) -> Vec<SweepRecord> {
    let combinations = grid.len();
    info!(
        combinations,
        parallel = options.parallel,
        float_bound = ?options.policy.float_bound,
        lateral_clearance = options.policy.lateral_clearance,
        "starting sweep"
    );
    if grid.is_empty() {
        warn!("parameter grid is empty; nothing to evaluate");
    }
    let start = Instant::now();

    let records = if options.parallel {
        let mut records: Vec<SweepRecord> = (0..combinations)
            .into_par_iter()
            .map(|index| grid.point_at(index).evaluate(options.policy))
            .collect();
        records.sort_by_key(|record| record.sequence);
        records
    } else {
        grid.points()
            .map(|point| point.evaluate(options.policy))
            .collect()
    };

    debug!(
        first = ?records.first().map(|record| record.sequence),
        last = ?records.last().map(|record| record.sequence),
        "sweep sequence range"
    );
    info!(
        records = records.len(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "sweep evaluated"
    );
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collapsed_grid() -> ParameterGrid {
        ParameterGrid {
            l: vec![25.0, 30.0],
            wf: vec![25.0, 75.0],
            vr: vec![0.2],
            vf: vec![0.25],
            ve: vec![1.0],
            wr: vec![10.0],
            lr: vec![25.0],
            lx_multiplier: vec![1.0],
        }
    }

    #[test]
    fn reference_grid_size() {
        let grid = ParameterGrid::default();
        assert_eq!(grid.l.len(), 20);
        assert_eq!(grid.len(), 20 * 2 * 2 * 2 * 2 * 2 * 6 * 3);
        assert!(grid.check().is_ok());
    }

    #[test]
    fn sweep_produces_one_record_per_combination() {
        let records = run_sweep(&collapsed_grid(), SweepOptions::default());
        assert_eq!(records.len(), 4);
        let sequences: Vec<u64> = records.iter().map(|r| r.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4]);
    }

    #[test]
    fn outer_axis_varies_slowest() {
        let grid = collapsed_grid();
        let visited: Vec<(f64, f64)> = grid
            .points()
            .map(|p| (p.scenario.geometry.l, p.scenario.geometry.wf))
            .collect();
        assert_eq!(
            visited,
            vec![(25.0, 25.0), (25.0, 75.0), (30.0, 25.0), (30.0, 75.0)]
        );
    }

    #[test]
    fn innermost_axis_is_lateral_multiplier() {
        let grid = ParameterGrid::default();
        let first: Vec<GridPoint> = grid.points().take(4).collect();
        assert_eq!(first[0].lx_multiplier, 1.0);
        assert_eq!(first[1].lx_multiplier, 1.5);
        assert_eq!(first[2].lx_multiplier, 2.0);
        assert_eq!(first[3].lx_multiplier, 1.0);
        assert_eq!(first[3].scenario.geometry.lr, 50.0);
        assert_eq!(first[1].scenario.params.lx, 1.5 * first[1].scenario.geometry.wr);
    }

    #[test]
    fn collapsed_sweep_records_domains() {
        let records = run_sweep(&collapsed_grid(), SweepOptions::default());

        // l == wf sits on the direct strategy's lower bound.
        let on_bound = &records[0];
        assert_eq!(on_bound.x, Outcome::Valid(1.0));
        assert_eq!(
            on_bound.outcome(Strategy::Direct).work,
            Outcome::Valid(1.25f64.powi(3) * 25.0)
        );
        assert_eq!(
            on_bound.outcome(Strategy::Diagonal).work,
            Outcome::OutOfDomain
        );

        for record in [&records[1], &records[3]] {
            for strategy in Strategy::ALL {
                assert_eq!(record.outcome(strategy).work, Outcome::OutOfDomain);
                assert_eq!(record.outcome(strategy).power, Outcome::OutOfDomain);
            }
        }

        let inside = &records[2];
        assert_eq!(inside.x, Outcome::Valid(30.0 / 25.0));
        assert!(Strategy::ALL
            .iter()
            .all(|&strategy| inside.outcome(strategy).work.is_valid()));
    }

    #[test]
    fn parallel_sweep_matches_sequential() {
        let grid = ParameterGrid::default();
        let sequential = run_sweep(&grid, SweepOptions::default());
        let parallel = run_sweep(
            &grid,
            SweepOptions {
                parallel: true,
                ..SweepOptions::default()
            },
        );
        assert_eq!(sequential.len(), grid.len());
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn degenerate_values_do_not_abort_sweep() {
        let mut grid = collapsed_grid();
        grid.wf = vec![0.0];
        grid.ve = vec![0.0, 1.0];
        let records = run_sweep(&grid, SweepOptions::default());
        assert_eq!(records.len(), 4);

        let stalled = &records[0];
        assert_eq!(stalled.x, Outcome::DivisionByZero);
        assert_eq!(stalled.outcome(Strategy::Direct).work, Outcome::DivisionByZero);

        // wf = 0 only breaks the x coordinate; l = 25 is inside [0, 25].
        let moving = &records[1];
        assert_eq!(moving.x, Outcome::DivisionByZero);
        assert!(moving.outcome(Strategy::Direct).work.is_valid());
    }

    #[test]
    fn negative_values_are_recorded_as_invalid() {
        let mut grid = collapsed_grid();
        grid.vr = vec![-0.2];
        let records = run_sweep(&grid, SweepOptions::default());
        assert_eq!(records.len(), 4);
        for record in &records {
            assert_eq!(record.x, Outcome::InvalidParameter);
            assert_eq!(
                record.outcome(Strategy::Float).work,
                Outcome::InvalidParameter
            );
        }
    }

    #[test]
    fn empty_axis_is_reported() {
        let mut grid = collapsed_grid();
        grid.lr.clear();
        assert!(grid.is_empty());
        assert_eq!(grid.check(), Err(GridError::EmptyAxis("lr")));
        assert!(run_sweep(&grid, SweepOptions::default()).is_empty());
    }
}
