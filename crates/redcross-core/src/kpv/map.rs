use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::consts::{FIT_OFFSET_LOWER_BOUND, PEAK_KP_WINDOW, PEAK_VREST_WINDOW};
use crate::error::{RedcrossError, Result};
use crate::stats;

use super::fit::{fit_gaussian, FitBounds, GaussianFit};
use super::peak::{PeakDescriptor, PeakQuery, PeakReport, Slice, SliceAxis};

/// Stacked CCF values over a Kp x Vrest grid.
///
/// Holds no reference to the ephemeris it was built from, so it can be
/// serialized as a self-contained snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KpvMap {
    kp_vec: Array1<f64>,
    vrest_vec: Array1<f64>,
    /// Shape `(n_kp, n_vrest)`.
    ccf_map: Array2<f64>,
    /// |Vrest| above this threshold is background.
    bkg: f64,
    peak: Option<PeakDescriptor>,
}

impl KpvMap {
    pub fn new(
        kp_vec: Array1<f64>,
        vrest_vec: Array1<f64>,
        ccf_map: Array2<f64>,
        bkg: f64,
    ) -> Result<Self> {
        if ccf_map.dim() != (kp_vec.len(), vrest_vec.len()) {
            return Err(RedcrossError::ShapeMismatch {
                expected: format!("({}, {})", kp_vec.len(), vrest_vec.len()),
                actual: format!("{:?}", ccf_map.dim()),
            });
        }
        if kp_vec.is_empty() || vrest_vec.is_empty() {
            return Err(RedcrossError::Configuration(format!(
                "empty Kp-Vsys grid ({} Kp x {} Vrest)",
                kp_vec.len(),
                vrest_vec.len()
            )));
        }
        if !vrest_vec.iter().any(|v| v.abs() > bkg) {
            return Err(RedcrossError::Configuration(format!(
                "no Vrest beyond the background threshold {bkg} km/s"
            )));
        }
        Ok(Self {
            kp_vec,
            vrest_vec,
            ccf_map,
            bkg,
            peak: None,
        })
    }

    pub fn kp_vec(&self) -> &Array1<f64> {
        &self.kp_vec
    }

    pub fn vrest_vec(&self) -> &Array1<f64> {
        &self.vrest_vec
    }

    pub fn ccf_map(&self) -> &Array2<f64> {
        &self.ccf_map
    }

    pub fn bkg(&self) -> f64 {
        self.bkg
    }

    /// Last peak found by [`KpvMap::locate_peak`].
    pub fn peak(&self) -> Option<&PeakDescriptor> {
        self.peak.as_ref()
    }

    fn background(&self) -> Vec<f64> {
        let columns: Vec<usize> = (0..self.vrest_vec.len())
            .filter(|&k| self.vrest_vec[k].abs() > self.bkg)
            .collect();
        self.ccf_map.select(Axis(1), &columns).iter().copied().collect()
    }

    /// Standard deviation of the background region.
    pub fn noise(&self) -> f64 {
        stats::std_dev(&self.background())
    }

    /// Median of the background region.
    pub fn baseline(&self) -> f64 {
        stats::median(&self.background())
    }

    /// `(ccf_map - baseline) / noise`, recomputed on every call.
    pub fn snr(&self) -> Result<Array2<f64>> {
        let bkg = self.background();
        let noise = stats::std_dev(&bkg);
        if noise.is_nan() || noise <= 0.0 {
            return Err(RedcrossError::DegenerateInput(
                "Kp-Vsys background has no spread".into(),
            ));
        }
        Ok((&self.ccf_map - stats::median(&bkg)) / noise)
    }

    /// Raw map value at the grid point nearest to `(vrest, kp)`.
    pub fn value_at(&self, vrest: f64, kp: f64) -> Result<f64> {
        let (ih, iv) = self.nearest(vrest, kp)?;
        Ok(self.ccf_map[[ih, iv]])
    }

    fn nearest(&self, vrest: f64, kp: f64) -> Result<(usize, usize)> {
        let kp_vec = self.kp_vec.to_vec();
        let vrest_vec = self.vrest_vec.to_vec();
        match (
            stats::nearest_index(&kp_vec, kp),
            stats::nearest_index(&vrest_vec, vrest),
        ) {
            (Some(ih), Some(iv)) => Ok((ih, iv)),
            _ => Err(RedcrossError::Configuration(
                "Kp-Vsys map has an empty grid".into(),
            )),
        }
    }

    /// Global SNR maximum without any search window.
    pub fn snr_max(&self) -> Result<PeakDescriptor> {
        let snr = self.snr()?;
        let flat = snr.as_slice().map(|s| s.to_vec()).unwrap_or_else(|| snr.iter().copied().collect());
        let best = stats::argmax(&flat).ok_or(RedcrossError::EmptySequence)?;
        let (ih, iv) = (best / snr.ncols(), best % snr.ncols());
        Ok(self.descriptor(&snr, ih, iv))
    }

    /// Locate the peak according to `query` and remember it.
    pub fn locate_peak(&mut self, query: PeakQuery) -> Result<PeakDescriptor> {
        let snr = self.snr()?;
        let vrest_window: Vec<usize> = (0..self.vrest_vec.len())
            .filter(|&k| self.vrest_vec[k].abs() < PEAK_VREST_WINDOW)
            .collect();

        let (ih, iv) = match query {
            PeakQuery::Auto => {
                let kp_mean = self.kp_vec.mean().unwrap_or(0.0);
                let kp_window: Vec<usize> = (0..self.kp_vec.len())
                    .filter(|&i| (self.kp_vec[i] - kp_mean).abs() < PEAK_KP_WINDOW)
                    .collect();
                // Same as clamping every cell outside the window to the surface minimum.
                let mut best: Option<(usize, usize, f64)> = None;
                for &i in &kp_window {
                    for &k in &vrest_window {
                        let v = snr[[i, k]];
                        if v.is_nan() {
                            continue;
                        }
                        if best.map_or(true, |(_, _, b)| v > b) {
                            best = Some((i, k, v));
                        }
                    }
                }
                let (i, k, _) = best.ok_or_else(|| {
                    RedcrossError::Configuration("peak search window contains no grid points".into())
                })?;
                (i, k)
            }
            PeakQuery::Kp(kp) => {
                let (ih, _) = self.nearest(0.0, kp)?;
                let row: Vec<f64> = vrest_window.iter().map(|&k| snr[[ih, k]]).collect();
                let best = stats::argmax(&row).ok_or_else(|| {
                    RedcrossError::Configuration("peak search window contains no grid points".into())
                })?;
                (ih, vrest_window[best])
            }
            PeakQuery::Position { vrest, kp } => self.nearest(vrest, kp)?,
        };

        let peak = self.descriptor(&snr, ih, iv);
        self.peak = Some(peak);
        Ok(peak)
    }

    fn descriptor(&self, snr: &Array2<f64>, ih: usize, iv: usize) -> PeakDescriptor {
        PeakDescriptor {
            vrest: self.vrest_vec[iv],
            kp: self.kp_vec[ih],
            snr: snr[[ih, iv]],
            kp_index: ih,
            vrest_index: iv,
        }
    }

    /// 1-D SNR cut through `peak`, optionally with a Gaussian fit over the
    /// central third of the cut.
    pub fn slice(&self, axis: SliceAxis, peak: &PeakDescriptor, fit: bool) -> Result<Slice> {
        let snr = self.snr()?;
        let (x, y) = match axis {
            SliceAxis::Horizontal => (self.vrest_vec.clone(), snr.row(peak.kp_index).to_owned()),
            SliceAxis::Vertical => (self.kp_vec.clone(), snr.column(peak.vrest_index).to_owned()),
        };
        let fit = fit.then(|| {
            let result = fit_central_third(&x.to_vec(), &y.to_vec());
            if let Err(ref e) = result {
                warn!(axis = %axis, error = %e, "Slice fit unavailable");
            }
            result
        });
        Ok(Slice { axis, x, y, fit })
    }

    /// Locate the peak (reusing the last one if present) and fit both slices.
    pub fn fit_peak(&mut self) -> Result<PeakReport> {
        let peak = match self.peak {
            Some(p) => p,
            None => self.locate_peak(PeakQuery::Auto)?,
        };
        let horizontal = self.slice(SliceAxis::Horizontal, &peak, true)?;
        let vertical = self.slice(SliceAxis::Vertical, &peak, true)?;
        let report = PeakReport {
            peak,
            horizontal,
            vertical,
        };
        info!(
            vrest = peak.vrest,
            kp = peak.kp,
            snr = peak.snr,
            vrest_fit = report.vrest_fit().map(|f| f.center),
            kp_fit = report.kp_fit().map(|f| f.center),
            "Peak characterized"
        );
        Ok(report)
    }

    /// Sum of the baseline-subtracted maps, on the axes of the first map.
    pub fn merge(maps: &[KpvMap]) -> Result<KpvMap> {
        let first = maps.first().ok_or(RedcrossError::EmptySequence)?;
        let mut merged = Array2::<f64>::zeros(first.ccf_map.dim());
        for (i, map) in maps.iter().enumerate() {
            if map.ccf_map.dim() != first.ccf_map.dim()
                || map.kp_vec != first.kp_vec
                || map.vrest_vec != first.vrest_vec
            {
                return Err(RedcrossError::GridMismatch(format!(
                    "map {i} does not share the Kp-Vsys grid of map 0"
                )));
            }
            merged += &(&map.ccf_map - map.baseline());
        }
        KpvMap::new(first.kp_vec.clone(), first.vrest_vec.clone(), merged, first.bkg)
    }
}

fn fit_central_third(x: &[f64], y: &[f64]) -> Result<GaussianFit> {
    let b = x.len() / 3;
    let (xs, ys) = (&x[b..x.len() - b], &y[b..y.len() - b]);
    let (x_min, x_max) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let bounds = FitBounds {
        lower: [0.0, x_min, f64::EPSILON, FIT_OFFSET_LOWER_BOUND],
        upper: [f64::INFINITY, x_max, f64::INFINITY, f64::INFINITY],
    };
    fit_gaussian(xs, ys, &bounds)
}
