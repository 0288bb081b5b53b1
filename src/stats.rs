//! Crossbar statistics collection and reporting.
//!
//! Tracks write, MVM and refresh activity of a crossbar and derives the
//! hardware cost of the selected mapping mode (array programming events,
//! conversion cycles and cells per stored value).

use crate::config::MappingMode;

/// Lifetime counters of one crossbar.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct XbarStats {
    pub writes: u64,
    pub mvms: u64,
    /// MVMs since the last write or software refresh.
    pub consecutive_mvms: u64,
    /// Software refreshes of the whole array.
    pub refreshes: u64,
    /// Cells reprogrammed by either refresh strategy.
    pub refreshed_cells: u64,
}

/// Hardware cost of a workload under one mapping mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeCost {
    /// Array programming operations.
    pub num_write: u64,
    /// Crossbar read cycles summed over all arrays.
    pub num_mvm_total: u64,
    /// Read cycles that have to run one after another.
    pub num_mvm_sequential: u64,
    /// Physical cells holding one logical value.
    pub cells_per_value: u32,
}

impl ModeCost {
    /// Looks up the cost of `stats` under `mode`.
    ///
    /// # Arguments
    ///
    /// * `mode` - Mapping mode of the crossbar.
    /// * `stats` - Counters accumulated so far.
    /// * `i_bit` - Input bit width.
    /// * `slices` - Number of weight slices.
    pub fn for_mode(mode: MappingMode, stats: &XbarStats, i_bit: u32, slices: usize) -> Self {
        let w = stats.writes;
        let mvm = stats.mvms;
        let bits = i_bit as u64;
        let slices = slices as u32;

        let (num_write, num_mvm_total, num_mvm_sequential, cells_factor) = match mode {
            MappingMode::IDiffWDiff1xb => (w, mvm * bits, mvm * 2 * bits, 2),
            MappingMode::IDiffWDiff2xb => (w * 2, mvm * 2 * bits, mvm * bits, 4),
            MappingMode::IOffsWDiff | MappingMode::ITcWDiff | MappingMode::IUintWDiff => {
                (w, mvm * bits, mvm * bits, 2)
            }
            MappingMode::IUintWOffs => (w, mvm * bits, mvm * bits, 1),
            MappingMode::TnnIDiffWDiff => (w, mvm, mvm, 2),
            MappingMode::TnnIDiffWTc | MappingMode::TnnIDiffWOffs => (w, mvm * 4, mvm * 4, 1),
        };

        Self {
            num_write,
            num_mvm_total,
            num_mvm_sequential,
            cells_per_value: slices * cells_factor,
        }
    }
}

impl XbarStats {
    /// Prints a formatted summary of the crossbar activity.
    ///
    /// Shows the raw counters followed by the cost of the workload under the
    /// given mapping mode.
    pub fn print(&self, mode: MappingMode, i_bit: u32, slices: usize) {
        let cost = ModeCost::for_mode(mode, self, i_bit, slices);

        println!("\n==========================================================");
        println!("CROSSBAR STATISTICS");
        println!("==========================================================");
        println!("mapping_mode             {}", mode);
        println!("xbar.writes              {}", self.writes);
        println!("xbar.mvms                {}", self.mvms);
        println!("----------------------------------------------------------");
        println!("READ DISTURB");
        println!("  refresh.xbar           {}", self.refreshes);
        println!("  refresh.cells          {}", self.refreshed_cells);
        println!("----------------------------------------------------------");
        println!("MAPPING COST");
        println!("  num_write              {}", cost.num_write);
        println!("  num_mvm_total          {}", cost.num_mvm_total);
        println!("  num_mvm_sequential     {}", cost.num_mvm_sequential);
        println!("  cells_per_value        {}", cost.cells_per_value);
        println!("==========================================================");
    }
}
