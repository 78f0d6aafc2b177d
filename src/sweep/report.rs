use super::{ParameterGrid, SweepRecord};
use crate::strategy::{DomainPolicy, Outcome, Strategy};
use anyhow::{Context, Result};
use serde::Serialize;
use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use tracing::{debug, info};

const FIELD_WIDTH: usize = 14;
const PRECISION: usize = 3;

/// Fixed-width field: a number with 3 decimals, or the outcome's marker.
pub fn format_field(outcome: Outcome) -> String {
    match outcome {
        Outcome::Valid(value) => format!(
            "{:>width$.prec$}",
            value,
            width = FIELD_WIDTH,
            prec = PRECISION
        ),
        other => format!("{:>width$}", other.marker(), width = FIELD_WIDTH),
    }
}

fn format_number(value: f64) -> String {
    format_field(Outcome::Valid(value))
}

/// Writes the flat `.dat` tables of a sweep into one directory.
#[derive(Clone, Debug)]
pub struct TableWriter {
    directory: PathBuf,
}

impl TableWriter {
    pub fn create(directory: &Path) -> Result<Self> {
        fs::create_dir_all(directory)
            .with_context(|| format!("create output directory {}", directory.display()))?;
        Ok(Self {
            directory: directory.to_path_buf(),
        })
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// `work1.dat`..`work4.dat` then `power1.dat`..`power4.dat`, rows `[x, value]`.
    pub fn write_tables(&self, records: &[SweepRecord]) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(8);
        for (prefix, pick) in [
            ("work", record_work as Picker),
            ("power", record_power as Picker),
        ] {
            for strategy in Strategy::ALL {
                let path = self
                    .directory
                    .join(format!("{prefix}{}.dat", strategy.number()));
                self.write_rows(&path, records, |record| {
                    format!("{}{}", format_field(record.x), format_field(pick(record, strategy)))
                })?;
                info!(table = %path.display(), rows = records.len(), "table written");
                written.push(path);
            }
        }
        Ok(written)
    }

    /// `parameters.dat`: sequence, l, ve, vr, vf, wf, wr, lr, lx multiplier.
    pub fn write_parameters(&self, records: &[SweepRecord]) -> Result<PathBuf> {
        let path = self.directory.join("parameters.dat");
        self.write_rows(&path, records, |record| {
            let s = &record.scenario;
            [
                record.sequence as f64,
                s.geometry.l,
                s.swimmer.ve,
                s.flow.vr,
                s.flow.vf,
                s.geometry.wf,
                s.geometry.wr,
                s.geometry.lr,
                record.lx_multiplier,
            ]
            .into_iter()
            .map(format_number)
            .collect()
        })?;
        info!(table = %path.display(), rows = records.len(), "parameter table written");
        Ok(path)
    }

    fn write_rows<F>(&self, path: &Path, records: &[SweepRecord], mut row: F) -> Result<()>
    where
        F: FnMut(&SweepRecord) -> String,
    {
        let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
        let mut out = BufWriter::new(file);
        for record in records {
            writeln!(out, "{}", row(record))
                .with_context(|| format!("write {}", path.display()))?;
        }
        out.flush()
            .with_context(|| format!("flush {}", path.display()))?;
        debug!(path = %path.display(), "table flushed");
        Ok(())
    }
}

type Picker = fn(&SweepRecord, Strategy) -> Outcome;

fn record_work(record: &SweepRecord, strategy: Strategy) -> Outcome {
    record.outcome(strategy).work
}

fn record_power(record: &SweepRecord, strategy: Strategy) -> Outcome {
    record.outcome(strategy).power
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub valid: usize,
    pub out_of_domain: usize,
    pub division_by_zero: usize,
    pub invalid_parameter: usize,
}

impl OutcomeTally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Valid(_) => self.valid += 1,
            Outcome::OutOfDomain => self.out_of_domain += 1,
            Outcome::DivisionByZero => self.division_by_zero += 1,
            Outcome::InvalidParameter => self.invalid_parameter += 1,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StrategyTally {
    pub strategy: Strategy,
    pub work: OutcomeTally,
    pub power: OutcomeTally,
}

/// Machine-readable description of a finished sweep.
#[derive(Debug, Clone, Serialize)]
pub struct SweepSummary {
    pub generated_at: u64,
    pub records: usize,
    pub policy: DomainPolicy,
    pub grid: ParameterGrid,
    pub x_coordinate: OutcomeTally,
    pub strategies: Vec<StrategyTally>,
}

impl SweepSummary {
    pub fn build(grid: &ParameterGrid, policy: DomainPolicy, records: &[SweepRecord]) -> Self {
        let mut x_coordinate = OutcomeTally::default();
        let mut strategies: Vec<StrategyTally> = Strategy::ALL
            .into_iter()
            .map(|strategy| StrategyTally {
                strategy,
                work: OutcomeTally::default(),
                power: OutcomeTally::default(),
            })
            .collect();

        for record in records {
            x_coordinate.record(record.x);
            for (tally, outcome) in strategies.iter_mut().zip(record.strategies) {
                tally.work.record(outcome.work);
                tally.power.record(outcome.power);
            }
        }

        let generated_at = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_secs())
            .unwrap_or(0);

        Self {
            generated_at,
            records: records.len(),
            policy,
            grid: grid.clone(),
            x_coordinate,
            strategies,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = fs::File::create(path).with_context(|| format!("write {}", path.display()))?;
        serde_json::to_writer_pretty(file, self)
            .with_context(|| format!("serialize {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sweep::{SweepOptions, run_sweep};
    use std::fs::read_to_string;
    use tempfile::tempdir;

    fn small_grid() -> ParameterGrid {
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
    fn fields_are_fourteen_wide() {
        assert_eq!(format_field(Outcome::Valid(1.0)), "         1.000");
        assert_eq!(format_field(Outcome::Valid(-2.5)), "        -2.500");
        assert_eq!(format_field(Outcome::Valid(48.828125)), "        48.828");
        assert_eq!(format_field(Outcome::OutOfDomain), " out-of-domain");
        assert_eq!(format_field(Outcome::DivisionByZero), "   div-by-zero");
        assert_eq!(format_field(Outcome::InvalidParameter), "       invalid");
    }

    #[test]
    fn writes_eight_tables_with_one_row_per_record() {
        let dir = tempdir().unwrap();
        let writer = TableWriter::create(&dir.path().join("out")).unwrap();
        let records = run_sweep(&small_grid(), SweepOptions::default());
        let written = writer.write_tables(&records).unwrap();

        let names: Vec<String> = written
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(
            names,
            [
                "work1.dat",
                "work2.dat",
                "work3.dat",
                "work4.dat",
                "power1.dat",
                "power2.dat",
                "power3.dat",
                "power4.dat"
            ]
        );

        let work1 = read_to_string(writer.directory().join("work1.dat")).unwrap();
        let lines: Vec<&str> = work1.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "         1.000        48.828");
        assert_eq!(lines[1], "         0.333 out-of-domain");
        assert!(lines.iter().all(|line| line.len() == 2 * FIELD_WIDTH));

        let work3 = read_to_string(writer.directory().join("work3.dat")).unwrap();
        assert!(work3.lines().next().unwrap().ends_with("out-of-domain"));
    }

    #[test]
    fn direct_power_row_matches_reference_table() {
        let grid = ParameterGrid {
            l: vec![90.0],
            wf: vec![25.0],
            vr: vec![2.5],
            vf: vec![1.0],
            ve: vec![0.1],
            wr: vec![10.0],
            lr: vec![75.0],
            lx_multiplier: vec![1.0],
        };
        let dir = tempdir().unwrap();
        let writer = TableWriter::create(dir.path()).unwrap();
        let records = run_sweep(&grid, SweepOptions::default());
        writer.write_tables(&records).unwrap();

        let power1 = read_to_string(writer.directory().join("power1.dat")).unwrap();
        assert_eq!(power1, "         3.600        13.063\n");
        let work1 = read_to_string(writer.directory().join("work1.dat")).unwrap();
        assert_eq!(work1, "         3.600     11757.150\n");
    }

    #[test]
    fn parameter_table_lists_sequence_then_inputs() {
        let dir = tempdir().unwrap();
        let writer = TableWriter::create(dir.path()).unwrap();
        let records = run_sweep(&small_grid(), SweepOptions::default());
        let path = writer.write_parameters(&records).unwrap();
        let text = read_to_string(path).unwrap();
        let first = text.lines().next().unwrap();
        let cols: Vec<f64> = first
            .split_whitespace()
            .map(|c| c.parse().unwrap())
            .collect();
        assert_eq!(cols, vec![1.0, 25.0, 1.0, 0.2, 0.25, 25.0, 10.0, 25.0, 1.0]);
        assert_eq!(text.lines().count(), 4);
    }

    #[test]
    fn summary_counts_outcomes_per_strategy() {
        let dir = tempdir().unwrap();
        let grid = small_grid();
        let records = run_sweep(&grid, SweepOptions::default());
        let summary = SweepSummary::build(&grid, DomainPolicy::sweep(), &records);
        assert_eq!(summary.records, 4);
        assert_eq!(summary.x_coordinate.valid, 4);

        let direct = &summary.strategies[0];
        assert_eq!(direct.work.valid, 2);
        assert_eq!(direct.work.out_of_domain, 2);
        let diagonal = &summary.strategies[2];
        assert_eq!(diagonal.work.valid, 1);
        assert_eq!(diagonal.work.out_of_domain, 3);

        let path = dir.path().join("summary.json");
        summary.save(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["records"], 4);
        assert_eq!(json["policy"]["float_bound"], "strict");
        assert_eq!(json["strategies"][2]["strategy"], "Diagonal");
    }
}
