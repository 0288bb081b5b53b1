//! Crossbar Configuration.
//!
//! The simulator is driven by a read-only `Config` loaded once from a JSON or
//! TOML file. It is split into four sections mirroring the hardware:
//!
//! * `general`: diagnostics.
//! * `xbar`: array geometry, weight slicing, mapping mode and device conductances.
//! * `adc`: readout quantizer.
//! * `read_disturb`: reliability model and mitigation policy.
//!
//! Missing fields fall back to the defaults below, so a minimal file only has
//! to name the array dimensions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::common::{Result, XbarError};

const DEFAULT_I_BIT: u32 = 8;
const DEFAULT_HRS: f32 = 1e-5;
const DEFAULT_LRS: f32 = 1e-4;

const DEFAULT_ADC_RESOLUTION: u32 = 8;
const DEFAULT_ADC_ALPHA: f32 = 1.0;

const DEFAULT_V_READ: f32 = 0.2;
const DEFAULT_TEMPERATURE: f32 = 300.0;
const DEFAULT_RD_TOLERANCE: f64 = 0.01;

const MAX_INPUT_BITS: u32 = 16;
const MAX_WEIGHT_BITS: u32 = 16;
const MAX_ADC_RESOLUTION: u32 = 24;

/// Encoding of signed operands into device conductances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum MappingMode {
    /// Differential inputs and weights, one crossbar, two read cycles per bit.
    #[serde(rename = "I_DIFF_W_DIFF_1XB")]
    IDiffWDiff1xb,
    /// Differential inputs and weights, two crossbars, one read cycle per bit.
    #[serde(rename = "I_DIFF_W_DIFF_2XB")]
    IDiffWDiff2xb,
    /// Inputs shifted to the positive range, differential weights.
    #[serde(rename = "I_OFFS_W_DIFF")]
    IOffsWDiff,
    /// Inputs read as two's complement, differential weights.
    #[serde(rename = "I_TC_W_DIFF")]
    ITcWDiff,
    /// Unsigned inputs, differential weights.
    #[serde(rename = "I_UINT_W_DIFF")]
    IUintWDiff,
    /// Unsigned inputs, weights stored with an offset in a single array.
    #[serde(rename = "I_UINT_W_OFFS")]
    IUintWOffs,
    /// Ternary inputs and weights, differential pair per weight.
    #[serde(rename = "TNN_I_DIFF_W_DIFF")]
    TnnIDiffWDiff,
    /// Ternary inputs, weights as a two-bit two's complement code.
    #[serde(rename = "TNN_I_DIFF_W_TC")]
    TnnIDiffWTc,
    /// Ternary inputs, weights as a two-bit offset code.
    #[serde(rename = "TNN_I_DIFF_W_OFFS")]
    TnnIDiffWOffs,
}

impl MappingMode {
    /// All modes, in declaration order.
    pub const ALL: [MappingMode; 9] = [
        MappingMode::IDiffWDiff1xb,
        MappingMode::IDiffWDiff2xb,
        MappingMode::IOffsWDiff,
        MappingMode::ITcWDiff,
        MappingMode::IUintWDiff,
        MappingMode::IUintWOffs,
        MappingMode::TnnIDiffWDiff,
        MappingMode::TnnIDiffWTc,
        MappingMode::TnnIDiffWOffs,
    ];

    /// Returns the configuration-file name of the mode.
    pub fn as_str(self) -> &'static str {
        match self {
            MappingMode::IDiffWDiff1xb => "I_DIFF_W_DIFF_1XB",
            MappingMode::IDiffWDiff2xb => "I_DIFF_W_DIFF_2XB",
            MappingMode::IOffsWDiff => "I_OFFS_W_DIFF",
            MappingMode::ITcWDiff => "I_TC_W_DIFF",
            MappingMode::IUintWDiff => "I_UINT_W_DIFF",
            MappingMode::IUintWOffs => "I_UINT_W_OFFS",
            MappingMode::TnnIDiffWDiff => "TNN_I_DIFF_W_DIFF",
            MappingMode::TnnIDiffWTc => "TNN_I_DIFF_W_TC",
            MappingMode::TnnIDiffWOffs => "TNN_I_DIFF_W_OFFS",
        }
    }

    /// Returns true for the ternary (TNN) modes.
    pub fn is_ternary(self) -> bool {
        matches!(
            self,
            MappingMode::TnnIDiffWDiff | MappingMode::TnnIDiffWTc | MappingMode::TnnIDiffWOffs
        )
    }
}

impl fmt::Display for MappingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Readout quantizer flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum AdcKind {
    /// Range symmetric around zero, for differential currents.
    #[serde(rename = "SYM_RANGE_ADC")]
    SymRange,
    /// Range from zero to the largest positive current.
    #[serde(rename = "POS_RANGE_ADC")]
    PosRange,
    /// Infinite resolution, passes currents through.
    #[serde(rename = "INF_ADC")]
    Inf,
}

/// How degraded conductances are corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum MitigationStrategy {
    /// Simulate degradation only.
    #[serde(rename = "OFF")]
    Off,
    /// Periodic refresh of the whole array, triggered from global counters.
    #[serde(rename = "SOFTWARE")]
    Software,
    /// Per-cell refresh driven by per-cell read counters.
    #[serde(rename = "CELL_BASED")]
    CellBased,
}

/// Complete simulator configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    pub xbar: XbarConfig,
    #[serde(default)]
    pub adc: AdcConfig,
    #[serde(default)]
    pub read_disturb: ReadDisturbConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Print the mapping summary when the crossbar is dropped.
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct XbarConfig {
    /// Rows of the logical weight matrix.
    pub m: usize,
    /// Columns of the logical weight matrix (crossbar inputs).
    pub n: usize,

    /// Bit widths of the weight slices, most significant slice first.
    #[serde(default = "default_split")]
    pub split: Vec<u32>,

    #[serde(default = "default_i_bit")]
    pub i_bit: u32,

    #[serde(default = "default_m_mode")]
    pub m_mode: MappingMode,

    /// Skip the analog path and compute MVMs exactly.
    #[serde(default)]
    pub digital_only: bool,

    /// High-resistance-state conductance.
    #[serde(default = "default_hrs")]
    pub hrs: f32,

    /// Low-resistance-state conductance.
    #[serde(default = "default_lrs")]
    pub lrs: f32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdcConfig {
    #[serde(default = "default_adc_kind")]
    pub kind: AdcKind,

    #[serde(default = "default_adc_resolution")]
    pub resolution: u32,

    /// Scale of the ADC input range relative to the largest possible current.
    #[serde(default = "default_adc_alpha")]
    pub alpha: f32,
}

impl Default for AdcConfig {
    fn default() -> Self {
        Self {
            kind: default_adc_kind(),
            resolution: default_adc_resolution(),
            alpha: default_adc_alpha(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReadDisturbConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Read voltage in volts.
    #[serde(default = "default_v_read")]
    pub v_read: f32,

    /// Device temperature in kelvin.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Conductances are degraded every `update_freq` consecutive MVMs.
    #[serde(default = "default_update_freq")]
    pub update_freq: u64,

    #[serde(default = "default_mitigation")]
    pub mitigation: MitigationStrategy,

    /// Tolerated relative conductance loss before a refresh.
    #[serde(default = "default_rd_tolerance")]
    pub tolerance: f64,
}

impl Default for ReadDisturbConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            v_read: default_v_read(),
            temperature: default_temperature(),
            update_freq: default_update_freq(),
            mitigation: default_mitigation(),
            tolerance: default_rd_tolerance(),
        }
    }
}

fn default_split() -> Vec<u32> {
    vec![2, 2, 2, 2]
}

fn default_i_bit() -> u32 {
    DEFAULT_I_BIT
}

fn default_m_mode() -> MappingMode {
    MappingMode::ITcWDiff
}

fn default_hrs() -> f32 {
    DEFAULT_HRS
}

fn default_lrs() -> f32 {
    DEFAULT_LRS
}

fn default_adc_kind() -> AdcKind {
    AdcKind::SymRange
}

fn default_adc_resolution() -> u32 {
    DEFAULT_ADC_RESOLUTION
}

fn default_adc_alpha() -> f32 {
    DEFAULT_ADC_ALPHA
}

fn default_v_read() -> f32 {
    DEFAULT_V_READ
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_update_freq() -> u64 {
    1
}

fn default_mitigation() -> MitigationStrategy {
    MitigationStrategy::Off
}

fn default_rd_tolerance() -> f64 {
    DEFAULT_RD_TOLERANCE
}

impl Config {
    /// Creates a configuration with default settings for an `m` x `n` array.
    pub fn new(m: usize, n: usize, m_mode: MappingMode) -> Self {
        Self {
            general: GeneralConfig::default(),
            xbar: XbarConfig {
                m,
                n,
                split: default_split(),
                i_bit: DEFAULT_I_BIT,
                m_mode,
                digital_only: false,
                hrs: DEFAULT_HRS,
                lrs: DEFAULT_LRS,
            },
            adc: AdcConfig::default(),
            read_disturb: ReadDisturbConfig::default(),
        }
    }

    /// Loads and validates a configuration file.
    ///
    /// Files ending in `.json` are parsed with `serde_json`, everything else
    /// as TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| XbarError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config: Config = if is_json {
            serde_json::from_str(&content).map_err(|e| XbarError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| XbarError::Parse {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks every field against its legal range.
    pub fn validate(&self) -> Result<()> {
        let x = &self.xbar;
        if x.m == 0 || x.n == 0 {
            return Err(XbarError::InvalidConfig(format!(
                "array dimensions must be positive, got {}x{}",
                x.m, x.n
            )));
        }
        if x.i_bit == 0 || x.i_bit > MAX_INPUT_BITS {
            return Err(XbarError::InvalidConfig(format!(
                "i_bit must be in 1..={}, got {}",
                MAX_INPUT_BITS, x.i_bit
            )));
        }
        if x.split.is_empty() {
            return Err(XbarError::InvalidConfig("split must not be empty".into()));
        }
        if x.split.iter().any(|&b| b == 0 || b > MAX_WEIGHT_BITS) {
            return Err(XbarError::InvalidConfig(format!(
                "split widths must be in 1..={}, got {:?}",
                MAX_WEIGHT_BITS, x.split
            )));
        }
        if self.w_bit() > MAX_WEIGHT_BITS {
            return Err(XbarError::InvalidConfig(format!(
                "split {:?} exceeds {} weight bits",
                x.split, MAX_WEIGHT_BITS
            )));
        }
        if self.accumulator_bound() > i32::MAX as u128 {
            return Err(XbarError::InvalidConfig(format!(
                "{} columns of {}-bit weights and {}-bit inputs overflow a 32-bit result",
                x.n,
                self.w_bit(),
                x.i_bit
            )));
        }
        if !(x.hrs >= 0.0 && x.hrs < x.lrs) {
            return Err(XbarError::InvalidConfig(format!(
                "conductances must satisfy 0 <= hrs < lrs, got hrs={} lrs={}",
                x.hrs, x.lrs
            )));
        }

        if self.adc.resolution == 0 || self.adc.resolution > MAX_ADC_RESOLUTION {
            return Err(XbarError::InvalidConfig(format!(
                "adc resolution must be in 1..={}, got {}",
                MAX_ADC_RESOLUTION, self.adc.resolution
            )));
        }
        if !(self.adc.alpha > 0.0) {
            return Err(XbarError::InvalidConfig(format!(
                "adc alpha must be positive, got {}",
                self.adc.alpha
            )));
        }

        let rd = &self.read_disturb;
        if rd.update_freq == 0 {
            return Err(XbarError::InvalidConfig(
                "read_disturb update_freq must be at least 1".into(),
            ));
        }
        if !(rd.tolerance > 0.0 && rd.tolerance < 1.0) {
            return Err(XbarError::InvalidConfig(format!(
                "read_disturb tolerance must be in (0, 1), got {}",
                rd.tolerance
            )));
        }
        if rd.enabled && !(rd.v_read > 0.0 && rd.temperature > 0.0) {
            return Err(XbarError::InvalidConfig(format!(
                "read voltage and temperature must be positive, got {} V / {} K",
                rd.v_read, rd.temperature
            )));
        }

        let required_split: Option<&[u32]> = match x.m_mode {
            MappingMode::TnnIDiffWDiff => Some(&[1]),
            MappingMode::TnnIDiffWTc | MappingMode::TnnIDiffWOffs => Some(&[1, 1]),
            _ => None,
        };
        if let Some(required) = required_split {
            if x.split.as_slice() != required {
                return Err(XbarError::UnsupportedConfig {
                    mode: x.m_mode,
                    reason: format!("split must be {:?}, got {:?}", required, x.split),
                });
            }
        }

        Ok(())
    }

    /// Largest magnitude a row sum can reach inside the MVM kernels.
    ///
    /// Offset and unsigned encodings accumulate codes up to `2^W` against
    /// inputs up to `2^I_BIT` before their corrections are applied, so the
    /// bound is taken over the codes rather than the signed values.
    fn accumulator_bound(&self) -> u128 {
        let input: u128 = if self.xbar.m_mode.is_ternary() {
            1
        } else {
            1 << self.xbar.i_bit
        };
        let weight: u128 = 1 << self.w_bit();
        self.xbar.n as u128 * input * weight
    }

    /// Total weight bit width (sum of the slice widths).
    pub fn w_bit(&self) -> u32 {
        self.xbar.split.iter().sum()
    }

    /// Left shift of every slice; the last slice holds the least significant bits.
    pub fn shifts(&self) -> Vec<u32> {
        let split = &self.xbar.split;
        let mut shift = vec![0; split.len()];
        let mut acc = 0;
        for s in (0..split.len()).rev() {
            shift[s] = acc;
            acc += split[s];
        }
        shift
    }

    /// Conductance difference between two adjacent levels of every slice.
    pub fn i_step_sizes(&self) -> Vec<f32> {
        let i_mm = self.xbar.lrs - self.xbar.hrs;
        self.xbar
            .split
            .iter()
            .map(|&b| i_mm / ((1u32 << b) - 1) as f32)
            .collect()
    }

    /// Physical rows of each conductance array (`m * split.len()`).
    pub fn physical_rows(&self) -> usize {
        self.xbar.m * self.xbar.split.len()
    }
}
