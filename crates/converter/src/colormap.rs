//! Colormap lookup tables.
//!
//! Each table holds RGB samples at evenly spaced positions in [0, 1]. Lookup clamps
//! the position into range and interpolates linearly per channel between the two
//! bracketing samples.

use std::sync::LazyLock;

use contracts::{ColormapKind, Rgb};

use crate::{ConvertError, Result};

/// Samples per built-in table
pub const DEFAULT_RESOLUTION: usize = 256;

/// Smallest resolution `sample_fn` will build
pub const MIN_RESOLUTION: usize = 64;

/// Ordered RGB samples over [0, 1]
#[derive(Debug, Clone, PartialEq)]
pub struct ColormapTable {
    entries: Vec<Rgb>,
}

impl ColormapTable {
    /// Build a table from explicit samples (at least two).
    pub fn from_entries(entries: Vec<Rgb>) -> Result<Self> {
        if entries.len() < 2 {
            return Err(ConvertError::InvalidColormap(format!(
                "need at least 2 entries, got {}",
                entries.len()
            )));
        }
        Ok(Self { entries })
    }

    /// Sample `f` at `resolution` evenly spaced positions.
    ///
    /// Resolutions below `MIN_RESOLUTION` are raised to it.
    pub fn sample_fn(resolution: usize, f: impl Fn(f64) -> Rgb) -> Self {
        let n = resolution.max(MIN_RESOLUTION);
        let last = (n - 1) as f64;
        let entries = (0..n).map(|i| f(i as f64 / last)).collect();
        Self { entries }
    }

    pub fn entries(&self) -> &[Rgb] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Color at `position`, clamped to [0, 1] (NaN -> 0).
    #[inline]
    pub fn sample(&self, position: f64) -> Rgb {
        let p = if position.is_nan() {
            0.0
        } else {
            position.clamp(0.0, 1.0)
        };

        let last = self.entries.len() - 1;
        let scaled = p * last as f64;
        let lower = (scaled.floor() as usize).min(last - 1);
        let frac = (scaled - lower as f64) as f32;

        let a = self.entries[lower];
        let b = self.entries[lower + 1];
        [
            a[0] + (b[0] - a[0]) * frac,
            a[1] + (b[1] - a[1]) * frac,
            a[2] + (b[2] - a[2]) * frac,
        ]
    }

    /// First sample (color of position 0)
    pub fn first(&self) -> Rgb {
        self.entries[0]
    }

    /// Last sample (color of position 1)
    pub fn last(&self) -> Rgb {
        self.entries[self.entries.len() - 1]
    }
}

/// Built-in table for `kind`
pub fn colormap(kind: ColormapKind) -> &'static ColormapTable {
    match kind {
        ColormapKind::Plasma => &PLASMA,
        ColormapKind::Winter => &WINTER,
    }
}

static PLASMA: LazyLock<ColormapTable> =
    LazyLock::new(|| ColormapTable::sample_fn(DEFAULT_RESOLUTION, plasma));

static WINTER: LazyLock<ColormapTable> =
    LazyLock::new(|| ColormapTable::sample_fn(DEFAULT_RESOLUTION, winter));

/// matplotlib "plasma", degree-6 polynomial fit.
///
/// Coefficients from Matt Zucker's CC0 fit (<https://www.shadertoy.com/view/WlfXRN>).
fn plasma(t: f64) -> Rgb {
    const C0: [f64; 3] = [0.05873234392399702, 0.02333670892565664, 0.5433401826748754];
    const C1: [f64; 3] = [2.176514634195958, 0.2383834171260182, 0.7539604599784036];
    const C2: [f64; 3] = [-2.689460476458034, -7.455851135738909, 3.110799939717086];
    const C3: [f64; 3] = [6.130348345893603, 42.3461881477227, -28.51885465332158];
    const C4: [f64; 3] = [-11.10743619062271, -82.66631109428045, 60.13984767418263];
    const C5: [f64; 3] = [10.02306557647065, 71.41361770095349, -54.07218655560067];
    const C6: [f64; 3] = [-3.658713842777788, -22.93153465461149, 18.19190778539828];

    let channel = |i: usize| {
        let c = C0[i]
            + t * (C1[i] + t * (C2[i] + t * (C3[i] + t * (C4[i] + t * (C5[i] + t * C6[i])))));
        c.clamp(0.0, 1.0) as f32
    };
    [channel(0), channel(1), channel(2)]
}

/// matplotlib "winter": blue to green
fn winter(t: f64) -> Rgb {
    [0.0, t as f32, (1.0 - 0.5 * t) as f32]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Rgb, b: Rgb, tol: f32) {
        for i in 0..3 {
            assert!((a[i] - b[i]).abs() <= tol, "{a:?} vs {b:?}");
        }
    }

    #[test]
    fn builtin_tables_have_default_resolution() {
        assert_eq!(colormap(ColormapKind::Plasma).len(), DEFAULT_RESOLUTION);
        assert_eq!(colormap(ColormapKind::Winter).len(), DEFAULT_RESOLUTION);
    }

    #[test]
    fn builtin_tables_are_shared() {
        let a = colormap(ColormapKind::Plasma) as *const ColormapTable;
        let b = colormap(ColormapKind::Plasma) as *const ColormapTable;
        assert_eq!(a, b);
    }

    #[test]
    fn resolution_is_raised_to_minimum() {
        let table = ColormapTable::sample_fn(8, winter);
        assert_eq!(table.len(), MIN_RESOLUTION);
    }

    #[test]
    fn plasma_endpoints_match_matplotlib() {
        let table = colormap(ColormapKind::Plasma);
        // matplotlib plasma(0) = (0.050, 0.030, 0.528), plasma(1) = (0.940, 0.975, 0.131)
        assert_close(table.first(), [0.050, 0.030, 0.528], 0.025);
        assert_close(table.last(), [0.940, 0.975, 0.131], 0.025);
    }

    #[test]
    fn winter_endpoints() {
        let table = colormap(ColormapKind::Winter);
        assert_close(table.first(), [0.0, 0.0, 1.0], 1e-6);
        assert_close(table.last(), [0.0, 1.0, 0.5], 1e-6);
    }

    #[test]
    fn entries_stay_in_unit_range() {
        for kind in [ColormapKind::Plasma, ColormapKind::Winter] {
            for c in colormap(kind).entries() {
                assert!(c.iter().all(|v| (0.0..=1.0).contains(v)), "{kind:?}: {c:?}");
            }
        }
    }

    #[test]
    fn sample_clamps_out_of_domain() {
        let table = colormap(ColormapKind::Plasma);
        assert_eq!(table.sample(-5.0), table.first());
        assert_eq!(table.sample(42.0), table.last());
        assert_eq!(table.sample(f64::NAN), table.first());
        assert_eq!(table.sample(0.0), table.first());
        assert_eq!(table.sample(1.0), table.last());
    }

    #[test]
    fn sample_interpolates_between_entries() {
        let table = ColormapTable::from_entries(vec![[0.0, 0.0, 0.0], [1.0, 0.5, 0.0]]).unwrap();
        assert_close(table.sample(0.25), [0.25, 0.125, 0.0], 1e-6);
        assert_close(table.sample(0.5), [0.5, 0.25, 0.0], 1e-6);
    }

    #[test]
    fn sample_hits_entries_exactly() {
        let table = colormap(ColormapKind::Winter);
        let last = (table.len() - 1) as f64;
        for i in [0usize, 1, 17, 128, 254] {
            assert_close(table.sample(i as f64 / last), table.entries()[i], 1e-5);
        }
    }

    #[test]
    fn interpolation_is_continuous_within_segment() {
        let table = colormap(ColormapKind::Plasma);
        let last = (table.len() - 1) as f64;
        let segment = 100usize;
        let a = table.entries()[segment];
        let b = table.entries()[segment + 1];

        let p0 = (segment as f64 + 0.2) / last;
        let dp = 0.3 / last;
        let c0 = table.sample(p0);
        let c1 = table.sample(p0 + dp);

        for i in 0..3 {
            let gradient = (b[i] - a[i]).abs() as f64 * last;
            let delta = (c1[i] - c0[i]).abs() as f64;
            assert!(delta <= gradient * dp + 1e-6, "channel {i}: {delta} > {}", gradient * dp);
        }
    }

    #[test]
    fn from_entries_rejects_single_entry() {
        assert!(matches!(
            ColormapTable::from_entries(vec![[0.0; 3]]),
            Err(ConvertError::InvalidColormap(_))
        ));
    }
}
