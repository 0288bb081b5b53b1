//! Crossbar Orchestration.
//!
//! The `Crossbar` owns a `Mapper` and, when enabled, a `ReadDisturb` model.
//! A `write` programs the arrays and records which cells went through a
//! set/reset cycle; an `mvm` evaluates the product and then applies the
//! configured mitigation strategy:
//!
//! * `OFF`: degrade conductances every `update_freq` consecutive MVMs.
//! * `SOFTWARE`: degrade as above, then reprogram the whole array when the
//!   `RefreshPolicy` asks for it.
//! * `CELL_BASED`: count reads per cell and, every `update_freq` MVMs,
//!   degrade and reprogram only the cells that drifted too far.

/// Analytic read disturb model and per-cell wear counters.
pub mod read_disturb;
/// Software refresh triggers.
pub mod refresh;

pub use read_disturb::ReadDisturb;
pub use refresh::{FixedInterval, RefreshPolicy, WorstCaseDrift};

use ndarray::Array2;
use tracing::{debug, info};

use crate::common::{Result, XbarError};
use crate::config::{Config, MappingMode, MitigationStrategy};
use crate::mapping::Mapper;
use crate::stats::XbarStats;

/// Simulated analog crossbar.
pub struct Crossbar {
    mapper: Mapper,
    rd_model: Option<ReadDisturb>,
    refresh_policy: Box<dyn RefreshPolicy>,
    mitigation: MitigationStrategy,
    update_freq: u64,
    tolerance: f64,
    digital_only: bool,
    verbose: bool,
    i_bit: u32,
    slices: usize,
    stats: XbarStats,
}

impl Crossbar {
    /// Creates a crossbar with all cells in HRS.
    ///
    /// # Arguments
    ///
    /// * `config` - Simulator configuration; validated before use.
    ///
    /// # Returns
    ///
    /// The crossbar, or the validation error of the configuration.
    pub fn new(config: &Config) -> Result<Self> {
        let mapper = Mapper::new(config)?;
        let rd = &config.read_disturb;
        let rd_model = rd.enabled.then(|| ReadDisturb::from_config(config));

        debug!(
            mode = %config.xbar.m_mode,
            m = config.xbar.m,
            n = config.xbar.n,
            read_disturb = rd.enabled,
            "crossbar created"
        );

        Ok(Self {
            mapper,
            rd_model,
            refresh_policy: Box::new(WorstCaseDrift::new(rd.tolerance)),
            mitigation: rd.mitigation,
            update_freq: rd.update_freq,
            tolerance: rd.tolerance,
            digital_only: config.xbar.digital_only,
            verbose: config.general.verbose,
            i_bit: config.xbar.i_bit,
            slices: config.xbar.split.len(),
            stats: XbarStats::default(),
        })
    }

    /// Replaces the software refresh trigger.
    pub fn with_refresh_policy(mut self, policy: Box<dyn RefreshPolicy>) -> Self {
        self.refresh_policy = policy;
        self
    }

    /// Programs `matrix` into the crossbar.
    ///
    /// With read disturb enabled, every cell whose level drops from set to
    /// HRS is charged one set/reset cycle. The cell-based strategy also
    /// clears all per-cell read counters.
    ///
    /// # Arguments
    ///
    /// * `matrix` - Row-major `m` x `n` weights.
    /// * `m` - Rows, must match the configuration.
    /// * `n` - Columns, must match the configuration.
    pub fn write(&mut self, matrix: &[i32], m: usize, n: usize) -> Result<()> {
        match self.rd_model.as_mut() {
            Some(rd) => {
                let prev_p = self.mapper.gd_p().clone();
                let prev_m = self.mapper.gd_m().clone();

                self.mapper.digital_write(matrix, m, n)?;

                let update_p = reset_transitions(&prev_p, self.mapper.gd_p());
                let update_m = reset_transitions(&prev_m, self.mapper.gd_m());
                rd.update_cycles(&update_p, &update_m);

                if self.mitigation == MitigationStrategy::CellBased {
                    rd.reset_all_consecutive_reads();
                }
            }
            None => self.mapper.digital_write(matrix, m, n)?,
        }

        self.stats.writes += 1;
        self.stats.consecutive_mvms = 0;

        if !self.digital_only {
            self.mapper.analog_write();
        }

        debug!(writes = self.stats.writes, "crossbar written");
        Ok(())
    }

    /// Multiplies the stored matrix with `vector` and adds the product to `result`.
    ///
    /// # Arguments
    ///
    /// * `result` - Accumulator of length `m`.
    /// * `vector` - Input of length `n`.
    /// * `m` - Rows, must match the configuration.
    /// * `n` - Columns, must match the configuration.
    pub fn mvm(&mut self, result: &mut [i32], vector: &[i32], m: usize, n: usize) -> Result<()> {
        if self.digital_only {
            self.mapper.digital_mvm(result, vector, m, n)?;
            self.count_mvm();
            return Ok(());
        }

        self.mapper.analog_mvm(result, vector, m, n)?;
        self.count_mvm();

        if self.rd_model.is_some() {
            match self.mitigation {
                MitigationStrategy::Off => self.simulate_read_disturb(),
                MitigationStrategy::Software => self.software_refresh(),
                MitigationStrategy::CellBased => self.cell_based_refresh(),
            }
        }
        Ok(())
    }

    fn count_mvm(&mut self) {
        self.stats.mvms += 1;
        self.stats.consecutive_mvms += 1;
        debug!(
            mvms = self.stats.mvms,
            consecutive = self.stats.consecutive_mvms,
            "mvm"
        );
    }

    fn update_due(&self) -> bool {
        self.stats.consecutive_mvms % self.update_freq == 0
    }

    fn simulate_read_disturb(&mut self) {
        if !self.update_due() {
            return;
        }
        if let Some(rd) = self.rd_model.as_ref() {
            self.mapper
                .rd_update_conductance(rd, self.stats.consecutive_mvms);
        }
    }

    fn software_refresh(&mut self) {
        if !self.update_due() {
            return;
        }
        let Some(rd) = self.rd_model.as_mut() else {
            return;
        };

        let reads = self.stats.consecutive_mvms;
        self.mapper.rd_update_conductance(rd, reads);

        let programming_events = self.stats.writes + self.stats.refreshes;
        if !self
            .refresh_policy
            .needs_refresh(rd, reads, programming_events)
        {
            return;
        }

        let (update_p, update_m) = self.mapper.set_masks();
        let cells = update_p.iter().chain(update_m.iter()).filter(|&&b| b).count() as u64;
        rd.update_cycles(&update_p, &update_m);

        self.stats.refreshes += 1;
        self.stats.refreshed_cells += cells;
        self.stats.consecutive_mvms = 0;
        self.mapper.analog_write();

        info!(
            refreshes = self.stats.refreshes,
            cells,
            after_mvms = reads,
            "software refresh"
        );
    }

    fn cell_based_refresh(&mut self) {
        let due = self.update_due();
        let Some(rd) = self.rd_model.as_mut() else {
            return;
        };

        rd.update_consecutive_reads();
        if !due {
            return;
        }

        self.mapper.rd_update_conductance_per_cell(rd);
        let refreshed = self.mapper.rd_cell_based_refresh(rd, self.tolerance);
        self.stats.refreshed_cells += refreshed;

        if refreshed > 0 {
            info!(
                cells = refreshed,
                total = self.stats.refreshed_cells,
                "cell based refresh"
            );
        }
    }

    pub fn mode(&self) -> MappingMode {
        self.mapper.mode()
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn stats(&self) -> &XbarStats {
        &self.stats
    }

    pub fn gd_p(&self) -> &Array2<i32> {
        self.mapper.gd_p()
    }

    pub fn gd_m(&self) -> &Array2<i32> {
        self.mapper.gd_m()
    }

    pub fn ia_p(&self) -> &Array2<f32> {
        self.mapper.ia_p()
    }

    pub fn ia_m(&self) -> &Array2<f32> {
        self.mapper.ia_m()
    }

    /// The read disturb model, if enabled.
    pub fn read_disturb(&self) -> Option<&ReadDisturb> {
        self.rd_model.as_ref()
    }

    fn rd(&self) -> Result<&ReadDisturb> {
        self.rd_model.as_ref().ok_or(XbarError::ReadDisturbDisabled)
    }

    pub fn cycles_p(&self) -> Result<&Array2<u64>> {
        Ok(self.rd()?.cycles_p())
    }

    pub fn cycles_m(&self) -> Result<&Array2<u64>> {
        Ok(self.rd()?.cycles_m())
    }

    pub fn consecutive_reads_p(&self) -> Result<&Array2<u64>> {
        Ok(self.rd()?.consecutive_reads_p())
    }

    pub fn consecutive_reads_m(&self) -> Result<&Array2<u64>> {
        Ok(self.rd()?.consecutive_reads_m())
    }

    /// Whether the read disturb model has been evaluated outside its fitted range.
    pub fn rd_out_of_bounds(&self) -> Result<bool> {
        Ok(self.rd()?.run_out_of_bounds())
    }

    pub fn write_count(&self) -> u64 {
        self.stats.writes
    }

    pub fn mvm_count(&self) -> u64 {
        self.stats.mvms
    }

    pub fn consecutive_mvm_count(&self) -> u64 {
        self.stats.consecutive_mvms
    }

    pub fn refresh_count(&self) -> u64 {
        self.stats.refreshes
    }

    pub fn refreshed_cell_count(&self) -> u64 {
        self.stats.refreshed_cells
    }
}

impl Drop for Crossbar {
    fn drop(&mut self) {
        if self.verbose {
            self.stats.print(self.mapper.mode(), self.i_bit, self.slices);
        }
    }
}

/// Cells that were set before and sit in HRS after a write.
fn reset_transitions(prev: &Array2<i32>, curr: &Array2<i32>) -> Array2<bool> {
    let mut update = Array2::from_elem(prev.dim(), false);
    ndarray::Zip::from(&mut update)
        .and(prev)
        .and(curr)
        .for_each(|u, &p, &c| *u = p > 0 && c == 0);
    update
}
