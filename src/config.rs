use crate::{
    scenario::{FlowField, RipGeometry, Scenario, StrategyParams, SwimmerProfile},
    strategy::{DomainPolicy, FloatBound},
    sweep::ParameterGrid,
};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use tracing::warn;

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub sweep: SweepConfig,
    pub single: SingleCaseConfig,
    pub policies: PoliciesConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig::default(),
            sweep: SweepConfig::default(),
            single: SingleCaseConfig::default(),
            policies: PoliciesConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Some("info".into()),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub output_directory: PathBuf,
    pub parallel: bool,
    pub write_parameters: bool,
    pub write_summary: bool,
    pub grid: ParameterGrid,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            output_directory: PathBuf::from("output"),
            parallel: false,
            write_parameters: true,
            write_summary: true,
            grid: ParameterGrid::default(),
        }
    }
}

/// Scalars for the single-case evaluator. Defaults are the worked example.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SingleCaseConfig {
    pub l: f64,
    pub lr: f64,
    pub lx: f64,
    pub ve: f64,
    pub vr: f64,
    pub vf: f64,
    pub wf: f64,
    pub wr: f64,
}

impl Default for SingleCaseConfig {
    fn default() -> Self {
        Self {
            l: 115.0,
            lr: 55.0,
            lx: 60.0,
            ve: 0.25,
            vr: 1.0,
            vf: 1.5,
            wf: 60.0,
            wr: 50.0,
        }
    }
}

impl SingleCaseConfig {
    pub fn scenario(&self) -> Scenario {
        Scenario {
            geometry: RipGeometry {
                l: self.l,
                lr: self.lr,
                wr: self.wr,
                wf: self.wf,
            },
            flow: FlowField {
                vr: self.vr,
                vf: self.vf,
            },
            swimmer: SwimmerProfile { ve: self.ve },
            params: StrategyParams { lx: self.lx },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PoliciesConfig {
    pub sweep_float_bound: FloatBound,
    pub single_float_bound: FloatBound,
    pub lateral_clearance: bool,
}

impl Default for PoliciesConfig {
    fn default() -> Self {
        let sweep = DomainPolicy::sweep();
        Self {
            sweep_float_bound: sweep.float_bound,
            single_float_bound: DomainPolicy::single_case().float_bound,
            lateral_clearance: sweep.lateral_clearance,
        }
    }
}

impl PoliciesConfig {
    pub fn sweep_policy(&self) -> DomainPolicy {
        DomainPolicy {
            float_bound: self.sweep_float_bound,
            lateral_clearance: self.lateral_clearance,
        }
    }

    pub fn single_case_policy(&self) -> DomainPolicy {
        DomainPolicy {
            float_bound: self.single_float_bound,
            lateral_clearance: self.lateral_clearance,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            let cwd = env::current_dir().context("determine current directory")?;
            cwd.join("config").join("default.toml")
        };

        if !config_path.exists() {
            warn!(path = ?config_path, "config file not found; using defaults");
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(&config_path)
            .with_context(|| format!("read config {}", config_path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("parse config {}", config_path.display()))?;
        Ok(config)
    }
}
