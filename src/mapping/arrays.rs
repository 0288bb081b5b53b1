//! Conductance State.
//!
//! `CellArrays` owns the two integer conductance-level matrices (`gd_p`,
//! `gd_m`) and their analog counterparts (`ia_p`, `ia_m`). Logical weight row
//! `m` occupies physical rows `m * S .. m * S + S`, where `S` is the number of
//! weight slices and slice 0 carries the most significant bits.

use ndarray::Array2;

use crate::config::Config;

/// Selects one of the two conductance arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// The `gd_p` / `ia_p` array.
    Plus,
    /// The `gd_m` / `ia_m` array.
    Minus,
}

/// Integer conductance levels and analog cell currents of one crossbar.
#[derive(Debug, Clone)]
pub struct CellArrays {
    gd_p: Array2<i32>,
    gd_m: Array2<i32>,
    ia_p: Array2<f32>,
    ia_m: Array2<f32>,
    split: Vec<u32>,
    shifts: Vec<u32>,
    i_step: Vec<f32>,
    hrs: f32,
    m: usize,
    n: usize,
}

impl CellArrays {
    /// Allocates zeroed arrays for the configured geometry.
    pub fn new(config: &Config) -> Self {
        let rows = config.physical_rows();
        let n = config.xbar.n;
        let hrs = config.xbar.hrs;
        Self {
            gd_p: Array2::zeros((rows, n)),
            gd_m: Array2::zeros((rows, n)),
            ia_p: Array2::from_elem((rows, n), hrs),
            ia_m: Array2::from_elem((rows, n), hrs),
            split: config.xbar.split.clone(),
            shifts: config.shifts(),
            i_step: config.i_step_sizes(),
            hrs,
            m: config.xbar.m,
            n,
        }
    }

    pub fn rows(&self) -> usize {
        self.m
    }

    pub fn cols(&self) -> usize {
        self.n
    }

    /// Number of weight slices per logical value.
    pub fn slices(&self) -> usize {
        self.split.len()
    }

    /// Physical row holding slice `s` of logical row `m`.
    #[inline]
    pub fn row(&self, m: usize, s: usize) -> usize {
        m * self.split.len() + s
    }

    #[inline]
    pub fn shift(&self, s: usize) -> u32 {
        self.shifts[s]
    }

    #[inline]
    pub fn i_step(&self, s: usize) -> f32 {
        self.i_step[s]
    }

    pub fn hrs(&self) -> f32 {
        self.hrs
    }

    pub fn gd_p(&self) -> &Array2<i32> {
        &self.gd_p
    }

    pub fn gd_m(&self) -> &Array2<i32> {
        &self.gd_m
    }

    pub fn ia_p(&self) -> &Array2<f32> {
        &self.ia_p
    }

    pub fn ia_m(&self) -> &Array2<f32> {
        &self.ia_m
    }

    pub fn gd(&self, polarity: Polarity) -> &Array2<i32> {
        match polarity {
            Polarity::Plus => &self.gd_p,
            Polarity::Minus => &self.gd_m,
        }
    }

    /// Writes `|w|` into `gd_p` for positive and into `gd_m` for negative weights.
    ///
    /// The magnitude is cut into slices according to the split, the other
    /// array of the pair is cleared.
    pub fn write_magnitude(&mut self, matrix: &[i32]) {
        for m in 0..self.m {
            for n in 0..self.n {
                let w = matrix[m * self.n + n];
                let mag = w.unsigned_abs();
                for s in 0..self.split.len() {
                    let r = self.row(m, s);
                    let level = self.slice_bits(mag, s);
                    if w >= 0 {
                        self.gd_p[[r, n]] = level;
                        self.gd_m[[r, n]] = 0;
                    } else {
                        self.gd_p[[r, n]] = 0;
                        self.gd_m[[r, n]] = level;
                    }
                }
            }
        }
    }

    /// Writes an unsigned code of every weight into `gd_p` only.
    ///
    /// # Arguments
    ///
    /// * `matrix` - Row-major weights.
    /// * `encode` - Maps a weight onto its non-negative code.
    pub fn write_code<F>(&mut self, matrix: &[i32], encode: F)
    where
        F: Fn(i32) -> u32,
    {
        for m in 0..self.m {
            for n in 0..self.n {
                let code = encode(matrix[m * self.n + n]);
                for s in 0..self.split.len() {
                    let r = self.row(m, s);
                    self.gd_p[[r, n]] = self.slice_bits(code, s);
                    self.gd_m[[r, n]] = 0;
                }
            }
        }
    }

    fn slice_bits(&self, value: u32, s: usize) -> i32 {
        ((value >> self.shifts[s]) & ((1u32 << self.split[s]) - 1)) as i32
    }

    /// Reassembles the sliced level of one array with shift-and-add.
    pub fn sliced_value(&self, polarity: Polarity, m: usize, n: usize) -> i32 {
        let gd = self.gd(polarity);
        (0..self.split.len())
            .map(|s| gd[[self.row(m, s), n]] << self.shifts[s])
            .sum()
    }

    /// `Σ_n (gd_p - gd_m)(m, n) · v(n)`, reassembled over all slices.
    pub fn signed_dot(&self, m: usize, vector: &[i32]) -> i64 {
        let mut acc = 0i64;
        for s in 0..self.split.len() {
            let r = self.row(m, s);
            let mut part = 0i64;
            for (n, &v) in vector.iter().enumerate() {
                part += (self.gd_p[[r, n]] - self.gd_m[[r, n]]) as i64 * v as i64;
            }
            acc += part << self.shifts[s];
        }
        acc
    }

    /// `Σ_n gd_p(m, n) · v(n)`, reassembled over all slices.
    pub fn plus_dot(&self, m: usize, vector: &[i32]) -> i64 {
        let mut acc = 0i64;
        for s in 0..self.split.len() {
            let r = self.row(m, s);
            let mut part = 0i64;
            for (n, &v) in vector.iter().enumerate() {
                part += self.gd_p[[r, n]] as i64 * v as i64;
            }
            acc += part << self.shifts[s];
        }
        acc
    }

    /// Pristine analog current of a cell at `level` in physical row `r`.
    #[inline]
    pub fn pristine(&self, r: usize, level: i32) -> f32 {
        self.hrs + level as f32 * self.i_step[r % self.split.len()]
    }

    /// Derives `ia_p` and `ia_m` from the current conductance levels.
    pub fn analog_write(&mut self) {
        let (rows, cols) = self.gd_p.dim();
        for r in 0..rows {
            for c in 0..cols {
                self.ia_p[[r, c]] = self.pristine(r, self.gd_p[[r, c]]);
                self.ia_m[[r, c]] = self.pristine(r, self.gd_m[[r, c]]);
            }
        }
    }

    /// Sets a degraded cell current, never below HRS.
    ///
    /// The scale always applies to the pristine current so repeated updates do
    /// not compound.
    pub fn degrade_cell(&mut self, polarity: Polarity, r: usize, c: usize, scale: f64) {
        let level = self.gd(polarity)[[r, c]];
        let value = (self.pristine(r, level) as f64 * scale) as f32;
        let value = value.max(self.hrs);
        match polarity {
            Polarity::Plus => self.ia_p[[r, c]] = value,
            Polarity::Minus => self.ia_m[[r, c]] = value,
        }
    }

    /// Restores the pristine current of a single cell.
    pub fn restore_cell(&mut self, polarity: Polarity, r: usize, c: usize) {
        let level = self.gd(polarity)[[r, c]];
        let value = self.pristine(r, level);
        match polarity {
            Polarity::Plus => self.ia_p[[r, c]] = value,
            Polarity::Minus => self.ia_m[[r, c]] = value,
        }
    }

    /// Marks every cell of an array that is currently programmed above HRS.
    pub fn set_mask(&self, polarity: Polarity) -> Array2<bool> {
        self.gd(polarity).mapv(|level| level > 0)
    }
}
