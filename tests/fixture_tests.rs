//! End-to-end tests against the published reference scenarios.

use cim_crossbar::config::Config;
use cim_crossbar::sim::{run_workload, Workload};
use cim_crossbar::xbar::Crossbar;
use std::path::PathBuf;

fn repo_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(relative)
}

/// Runs one write and one MVM through a crossbar built from a shipped config.
fn run_fixture(config: &str, matrix: &[i32], vector: &[i32]) -> Vec<i32> {
    let config = Config::from_file(repo_path(config)).unwrap();
    let (m, n) = (config.xbar.m, config.xbar.n);

    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(matrix, m, n).unwrap();

    let mut result = vec![0; m];
    xbar.mvm(&mut result, vector, m, n).unwrap();
    result
}

/// Tests the symmetric ADC scenario with differential inputs.
#[test]
fn test_sym_adc_fixture() {
    #[rustfmt::skip]
    let matrix = [
        -128, -128, -128, -128, -128,
        127, 127, 127, 127, 127,
        -12, 88, 65, 0, -99,
    ];
    let vector = [-1, -1, -1, -1, -1];

    let result = run_fixture("configs/analog/SYM_ADC_1.json", &matrix, &vector);
    assert_eq!(result, vec![643, -637, -40]);
}

/// Tests the positive-only ADC scenario with offset weights.
#[test]
fn test_pos_adc_fixture() {
    #[rustfmt::skip]
    let matrix = [
        127, 127, 127, 127, 127,
        -128, -128, -128, -128, -128,
        0, 0, 0, 0, 0,
    ];
    let vector = [1, 1, 1, 1, 1];

    let result = run_fixture("configs/analog/POS_ADC_1.json", &matrix, &vector);
    assert_eq!(result, vec![635, -637, -1]);
}

/// Tests that the quantization error stays within a few LSBs of the exact product.
#[test]
fn test_sym_adc_close_to_exact() {
    let config = Config::from_file(repo_path("configs/analog/SYM_ADC_1.json")).unwrap();
    let mut exact_config = config.clone();
    exact_config.xbar.digital_only = true;

    #[rustfmt::skip]
    let matrix = [
        -128, -128, -128, -128, -128,
        127, 127, 127, 127, 127,
        -12, 88, 65, 0, -99,
    ];
    let vector = [-1, -1, -1, -1, -1];

    let mut analog = Crossbar::new(&config).unwrap();
    let mut digital = Crossbar::new(&exact_config).unwrap();
    analog.write(&matrix, 3, 5).unwrap();
    digital.write(&matrix, 3, 5).unwrap();

    let mut a = vec![0; 3];
    let mut d = vec![0; 3];
    analog.mvm(&mut a, &vector, 3, 5).unwrap();
    digital.mvm(&mut d, &vector, 3, 5).unwrap();

    assert_eq!(d, vec![640, -635, -42]);
    for (x, y) in a.iter().zip(&d) {
        assert!((x - y).abs() <= 4, "analog {} vs exact {}", x, y);
    }
}

/// Tests the workload runner on the shipped workload file.
#[test]
fn test_workload_runner() {
    let config = Config::from_file(repo_path("configs/analog/SYM_ADC_1.json")).unwrap();
    let workload = Workload::from_file(repo_path("workloads/fixture_3x5.json")).unwrap();
    assert_eq!((workload.rows(), workload.cols()), (3, 5));

    let mut xbar = Crossbar::new(&config).unwrap();
    let result = run_workload(&mut xbar, &workload, 3).unwrap();

    assert_eq!(result, vec![643, -637, -40]);
    assert_eq!(xbar.write_count(), 1);
    assert_eq!(xbar.mvm_count(), 3);
}

/// Tests the digital-only ternary configuration.
#[test]
fn test_tnn_digital_config() {
    let config = Config::from_file(repo_path("configs/digital/TNN_OFFS.json")).unwrap();
    let (m, n) = (config.xbar.m, config.xbar.n);
    let matrix: Vec<i32> = (0..m * n).map(|i| (i as i32 % 3) - 1).collect();
    let vector: Vec<i32> = (0..n).map(|i| 1 - (i as i32 % 3)).collect();

    let mut xbar = Crossbar::new(&config).unwrap();
    xbar.write(&matrix, m, n).unwrap();
    let mut result = vec![0; m];
    xbar.mvm(&mut result, &vector, m, n).unwrap();

    for row in 0..m {
        let expected: i32 = (0..n).map(|col| matrix[row * n + col] * vector[col]).sum();
        assert_eq!(result[row], expected);
    }
}
