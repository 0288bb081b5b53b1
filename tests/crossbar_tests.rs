//! Integration tests for the crossbar write/MVM lifecycle.

use cim_crossbar::common::XbarError;
use cim_crossbar::config::{AdcKind, Config, MappingMode, MitigationStrategy};
use cim_crossbar::stats::{ModeCost, XbarStats};
use cim_crossbar::xbar::{Crossbar, FixedInterval};

/// Ternary pattern with three set cells in `gd_p` and one in `gd_m`.
const TNN_MATRIX: [i32; 6] = [1, -1, 0, 0, 1, 1];

/// Creates a 2x3 ternary crossbar, optionally with read disturb.
fn create_tnn_config(mitigation: Option<MitigationStrategy>) -> Config {
    let mut config = Config::new(2, 3, MappingMode::TnnIDiffWDiff);
    config.xbar.split = vec![1];
    config.adc.kind = AdcKind::Inf;
    if let Some(strategy) = mitigation {
        config.read_disturb.enabled = true;
        config.read_disturb.mitigation = strategy;
        config.read_disturb.v_read = 0.8;
        config.read_disturb.update_freq = 1;
        config.read_disturb.tolerance = 0.01;
    }
    config
}

/// Pristine current of a set single-bit cell.
fn set_current(config: &Config) -> f32 {
    config.xbar.hrs + (config.xbar.lrs - config.xbar.hrs)
}

/// Tests that write and MVM counters advance by one per call.
#[test]
fn test_counters_monotonic() {
    let config = create_tnn_config(None);
    let mut xbar = Crossbar::new(&config).unwrap();

    for i in 1..=3 {
        xbar.write(&TNN_MATRIX, 2, 3).unwrap();
        assert_eq!(xbar.write_count(), i);
        assert_eq!(xbar.consecutive_mvm_count(), 0);

        for j in 1..=4 {
            let mut result = vec![0; 2];
            xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
            assert_eq!(xbar.mvm_count(), (i - 1) * 4 + j);
            assert_eq!(xbar.consecutive_mvm_count(), j);
        }
    }
    assert_eq!(xbar.refresh_count(), 0);
    assert_eq!(xbar.refreshed_cell_count(), 0);
}

/// Tests the result of a ternary MVM through the crossbar.
#[test]
fn test_mvm_result() {
    let config = create_tnn_config(None);
    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();

    let mut result = vec![0; 2];
    xbar.mvm(&mut result, &[1, 1, -1], 2, 3).unwrap();
    assert_eq!(result, vec![0, 0]);

    let mut result = vec![0; 2];
    xbar.mvm(&mut result, &[1, -1, 1], 2, 3).unwrap();
    assert_eq!(result, vec![2, 0]);
}

/// Tests that rejected calls leave counters and state untouched.
#[test]
fn test_failed_calls_do_not_count() {
    let config = create_tnn_config(None);
    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();

    let err = xbar.write(&[2, 0, 0, 0, 0, 0], 2, 3).unwrap_err();
    assert!(err.is_domain_violation());
    assert_eq!(xbar.write_count(), 1);
    assert_eq!(xbar.gd_p()[[0, 0]], 1);

    let mut result = vec![0; 2];
    let err = xbar.mvm(&mut result, &[0, 0, 0], 3, 3).unwrap_err();
    assert!(matches!(err, XbarError::DimensionMismatch { .. }));
    let err = xbar.mvm(&mut result, &[0, 2, 0], 2, 3).unwrap_err();
    assert!(err.is_domain_violation());
    assert_eq!(xbar.mvm_count(), 0);
}

/// Tests that the digital-only mode skips the analog arrays.
#[test]
fn test_digital_only_mode() {
    let mut config = Config::new(2, 2, MappingMode::ITcWDiff);
    config.xbar.digital_only = true;
    let hrs = config.xbar.hrs;

    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&[-100, 50, 127, -128], 2, 2).unwrap();
    assert!(xbar.ia_p().iter().all(|&ia| ia == hrs));
    assert!(xbar.ia_m().iter().all(|&ia| ia == hrs));

    let mut result = vec![0; 2];
    xbar.mvm(&mut result, &[3, -2], 2, 2).unwrap();
    assert_eq!(result, vec![-400, 637]);
}

/// Tests that wear accessors report a disabled model.
#[test]
fn test_read_disturb_accessors_disabled() {
    let config = create_tnn_config(None);
    let xbar = Crossbar::new(&config).unwrap();

    assert!(xbar.read_disturb().is_none());
    assert!(matches!(xbar.cycles_p(), Err(XbarError::ReadDisturbDisabled)));
    assert!(matches!(xbar.consecutive_reads_m(), Err(XbarError::ReadDisturbDisabled)));
    assert!(matches!(xbar.rd_out_of_bounds(), Err(XbarError::ReadDisturbDisabled)));
}

/// Tests that a cycle is counted exactly when a set cell returns to HRS.
#[test]
fn test_cycle_accounting_on_write() {
    let config = create_tnn_config(Some(MitigationStrategy::Off));
    let mut xbar = Crossbar::new(&config).unwrap();

    xbar.write(&TNN_MATRIX, 2, 3).unwrap();
    assert!(xbar.cycles_p().unwrap().iter().all(|&c| c == 0));
    assert!(xbar.cycles_m().unwrap().iter().all(|&c| c == 0));

    xbar.write(&[0, -1, 1, 0, 0, 1], 2, 3).unwrap();
    let cycles_p = xbar.cycles_p().unwrap();
    assert_eq!(cycles_p.row(0).to_vec(), vec![1, 0, 0]);
    assert_eq!(cycles_p.row(1).to_vec(), vec![0, 1, 0]);
    assert!(xbar.cycles_m().unwrap().iter().all(|&c| c == 0));

    xbar.write(&[0, -1, 1, 0, 0, 1], 2, 3).unwrap();
    assert_eq!(xbar.cycles_p().unwrap().iter().sum::<u64>(), 2);

    xbar.write(&[0; 6], 2, 3).unwrap();
    let cycles_p = xbar.cycles_p().unwrap();
    assert_eq!(cycles_p.row(0).to_vec(), vec![1, 0, 1]);
    assert_eq!(cycles_p.row(1).to_vec(), vec![0, 1, 1]);
    assert_eq!(xbar.cycles_m().unwrap()[[0, 1]], 1);
}

/// Tests cycle accounting of multi-level cells.
#[test]
fn test_cycle_accounting_multilevel() {
    let mut config = Config::new(1, 3, MappingMode::IUintWDiff);
    config.xbar.split = vec![8];
    config.read_disturb.enabled = true;

    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&[5, 5, 5], 1, 3).unwrap();
    xbar.write(&[0, 3, -5], 1, 3).unwrap();

    let cycles_p = xbar.cycles_p().unwrap();
    assert_eq!(cycles_p.row(0).to_vec(), vec![1, 0, 1]);
    assert!(xbar.cycles_m().unwrap().iter().all(|&c| c == 0));
}

/// Tests that MVMs never touch cycle counters with mitigation off.
#[test]
fn test_mitigation_off_keeps_cycles() {
    let config = create_tnn_config(Some(MitigationStrategy::Off));
    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();
    xbar.write(&[0, -1, 1, 0, 0, 1], 2, 3).unwrap();
    let before_p = xbar.cycles_p().unwrap().clone();
    let before_m = xbar.cycles_m().unwrap().clone();

    let mut result = vec![0; 2];
    for _ in 0..50 {
        xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    }
    assert_eq!(xbar.cycles_p().unwrap(), &before_p);
    assert_eq!(xbar.cycles_m().unwrap(), &before_m);
    assert_eq!(xbar.refresh_count(), 0);
    assert_eq!(xbar.refreshed_cell_count(), 0);
}

/// Tests that degradation lowers set cells towards HRS without passing it.
#[test]
fn test_mitigation_off_degrades_conductance() {
    let config = create_tnn_config(Some(MitigationStrategy::Off));
    let hrs = config.xbar.hrs;
    let lrs = config.xbar.lrs;
    let set = set_current(&config);
    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();
    assert_eq!(xbar.ia_p()[[0, 0]], set);

    let mut result = vec![0; 2];
    for _ in 0..5 {
        xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    }
    let degraded = xbar.ia_p()[[0, 0]];
    assert!(degraded < lrs);
    assert!(degraded > hrs);
    assert!(xbar.ia_m()[[0, 1]] < lrs);
    assert_eq!(xbar.ia_p()[[0, 2]], hrs);

    for _ in 0..400 {
        xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    }
    assert_eq!(xbar.ia_p()[[0, 0]], hrs);
    assert!(xbar.ia_p().iter().all(|&ia| ia >= hrs));
    assert!(xbar.rd_out_of_bounds().unwrap());

    xbar.write(&TNN_MATRIX, 2, 3).unwrap();
    assert_eq!(xbar.ia_p()[[0, 0]], set);
}

/// Tests the default software refresh trigger.
#[test]
fn test_software_refresh_worst_case_drift() {
    let config = create_tnn_config(Some(MitigationStrategy::Software));
    let set = set_current(&config);
    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();

    let mut result = vec![0; 2];
    for _ in 0..7 {
        xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    }
    assert_eq!(xbar.refresh_count(), 0);
    assert_eq!(xbar.consecutive_mvm_count(), 7);

    xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    assert_eq!(xbar.refresh_count(), 1);
    assert_eq!(xbar.consecutive_mvm_count(), 0);
    assert_eq!(xbar.refreshed_cell_count(), 4);
    assert_eq!(xbar.ia_p()[[0, 0]], set);

    let cycles_p = xbar.cycles_p().unwrap();
    assert_eq!(cycles_p.row(0).to_vec(), vec![1, 0, 0]);
    assert_eq!(cycles_p.row(1).to_vec(), vec![0, 1, 1]);
    assert_eq!(xbar.cycles_m().unwrap()[[0, 1]], 1);

    // The second refresh follows sooner since the array has been programmed twice.
    for _ in 0..5 {
        xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    }
    assert_eq!(xbar.refresh_count(), 1);
    xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    assert_eq!(xbar.refresh_count(), 2);
    assert_eq!(xbar.refreshed_cell_count(), 8);
    assert_eq!(xbar.mvm_count(), 14);
    assert_eq!(xbar.write_count(), 1);
}

/// Tests swapping in a custom refresh policy.
#[test]
fn test_software_refresh_custom_policy() {
    let config = create_tnn_config(Some(MitigationStrategy::Software));
    let mut xbar = Crossbar::new(&config)
        .unwrap()
        .with_refresh_policy(Box::new(FixedInterval { mvms: 3 }));
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();

    let mut result = vec![0; 2];
    for _ in 0..7 {
        xbar.mvm(&mut result, &[1, 0, 1], 2, 3).unwrap();
    }
    assert_eq!(xbar.refresh_count(), 2);
    assert_eq!(xbar.consecutive_mvm_count(), 1);

    xbar.write(&TNN_MATRIX, 2, 3).unwrap();
    assert_eq!(xbar.consecutive_mvm_count(), 0);
}

/// Tests that the update frequency gates software refresh checks.
#[test]
fn test_software_refresh_update_frequency() {
    let mut config = create_tnn_config(Some(MitigationStrategy::Software));
    config.read_disturb.update_freq = 4;
    let mut xbar = Crossbar::new(&config)
        .unwrap()
        .with_refresh_policy(Box::new(FixedInterval { mvms: 1 }));
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();

    let mut result = vec![0; 2];
    for _ in 0..3 {
        xbar.mvm(&mut result, &[1, 0, 1], 2, 3).unwrap();
    }
    assert_eq!(xbar.refresh_count(), 0);
    xbar.mvm(&mut result, &[1, 0, 1], 2, 3).unwrap();
    assert_eq!(xbar.refresh_count(), 1);
}

/// Tests per-cell read counting and refresh.
#[test]
fn test_cell_based_refresh() {
    let config = create_tnn_config(Some(MitigationStrategy::CellBased));
    let set = set_current(&config);
    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();

    let mut result = vec![0; 2];
    for _ in 0..7 {
        xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    }
    assert!(xbar.consecutive_reads_p().unwrap().iter().all(|&r| r == 7));
    assert_eq!(xbar.refreshed_cell_count(), 0);

    xbar.mvm(&mut result, &[1, 1, 1], 2, 3).unwrap();
    assert_eq!(xbar.refreshed_cell_count(), 4);
    assert_eq!(xbar.refresh_count(), 0);

    // Refreshed cells start over, cells in HRS keep counting.
    let reads_p = xbar.consecutive_reads_p().unwrap();
    assert_eq!(reads_p[[0, 0]], 0);
    assert_eq!(reads_p[[0, 2]], 8);
    assert_eq!(xbar.consecutive_reads_m().unwrap()[[0, 1]], 0);
    assert_eq!(xbar.cycles_p().unwrap()[[0, 0]], 1);
    assert_eq!(xbar.cycles_p().unwrap()[[0, 2]], 0);
    assert_eq!(xbar.ia_p()[[0, 0]], set);

    xbar.write(&TNN_MATRIX, 2, 3).unwrap();
    assert!(xbar.consecutive_reads_p().unwrap().iter().all(|&r| r == 0));
    assert!(xbar.consecutive_reads_m().unwrap().iter().all(|&r| r == 0));
}

/// Tests the per-mode cost table.
#[test]
fn test_mode_cost_table() {
    let stats = XbarStats {
        writes: 3,
        mvms: 10,
        ..XbarStats::default()
    };

    let cost = ModeCost::for_mode(MappingMode::IDiffWDiff1xb, &stats, 8, 4);
    assert_eq!(
        (cost.num_write, cost.num_mvm_total, cost.num_mvm_sequential, cost.cells_per_value),
        (3, 80, 160, 8)
    );

    let cost = ModeCost::for_mode(MappingMode::IDiffWDiff2xb, &stats, 8, 4);
    assert_eq!(
        (cost.num_write, cost.num_mvm_total, cost.num_mvm_sequential, cost.cells_per_value),
        (6, 160, 80, 16)
    );

    let cost = ModeCost::for_mode(MappingMode::ITcWDiff, &stats, 8, 1);
    assert_eq!(
        (cost.num_write, cost.num_mvm_total, cost.num_mvm_sequential, cost.cells_per_value),
        (3, 80, 80, 2)
    );

    let cost = ModeCost::for_mode(MappingMode::IUintWOffs, &stats, 4, 2);
    assert_eq!(
        (cost.num_write, cost.num_mvm_total, cost.num_mvm_sequential, cost.cells_per_value),
        (3, 40, 40, 2)
    );
}

/// Tests that the crossbar stats mirror the accessors.
#[test]
fn test_stats_snapshot() {
    let config = create_tnn_config(None);
    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&TNN_MATRIX, 2, 3).unwrap();
    let mut result = vec![0; 2];
    xbar.mvm(&mut result, &[0, 0, 1], 2, 3).unwrap();

    let stats = *xbar.stats();
    assert_eq!(stats.writes, xbar.write_count());
    assert_eq!(stats.mvms, xbar.mvm_count());
    assert_eq!(stats.consecutive_mvms, 1);
    assert_eq!(xbar.mode(), MappingMode::TnnIDiffWDiff);
}
