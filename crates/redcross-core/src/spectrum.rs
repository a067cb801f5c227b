use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{RedcrossError, Result};
use crate::filters::high_pass_gaussian;
use crate::stats;

/// Rest frame in which velocities of a series (or of a CCF map) are expressed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RestFrame {
    /// Observatory frame, before barycentric correction.
    #[default]
    Telluric,
    Barycentric,
    Stellar,
    Planet,
}

impl std::fmt::Display for RestFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Telluric => write!(f, "telluric"),
            Self::Barycentric => write!(f, "barycentric"),
            Self::Stellar => write!(f, "stellar"),
            Self::Planet => write!(f, "planet"),
        }
    }
}

/// A time series of spectra for one spectral order.
///
/// Flux has shape `(n_obs, n_pix)`; every frame shares the wavelength axis.
/// Missing wavelength entries are encoded as NaN.
#[derive(Clone, Debug)]
pub struct SpectralSeries {
    flux: Array2<f64>,
    flux_err: Option<Array2<f64>>,
    wave: Array1<f64>,
    pub frame: RestFrame,
}

impl SpectralSeries {
    pub fn new(flux: Array2<f64>, wave: Array1<f64>) -> Result<Self> {
        if flux.nrows() == 0 {
            return Err(RedcrossError::EmptySequence);
        }
        if flux.ncols() != wave.len() {
            return Err(RedcrossError::ShapeMismatch {
                expected: format!("{} pixels", wave.len()),
                actual: format!("{} pixels per frame", flux.ncols()),
            });
        }
        Ok(Self {
            flux,
            flux_err: None,
            wave,
            frame: RestFrame::default(),
        })
    }

    /// Attach per-pixel flux uncertainties of the same shape as the flux.
    pub fn with_flux_err(mut self, flux_err: Array2<f64>) -> Result<Self> {
        if flux_err.dim() != self.flux.dim() {
            return Err(RedcrossError::ShapeMismatch {
                expected: format!("{:?}", self.flux.dim()),
                actual: format!("{:?}", flux_err.dim()),
            });
        }
        self.flux_err = Some(flux_err);
        Ok(self)
    }

    pub fn with_frame(mut self, frame: RestFrame) -> Self {
        self.frame = frame;
        self
    }

    /// Copy of this series with replaced flux, keeping axis, errors and frame.
    pub fn with_flux(&self, flux: Array2<f64>) -> Result<Self> {
        if flux.dim() != self.flux.dim() {
            return Err(RedcrossError::ShapeMismatch {
                expected: format!("{:?}", self.flux.dim()),
                actual: format!("{:?}", flux.dim()),
            });
        }
        Ok(Self {
            flux,
            flux_err: self.flux_err.clone(),
            wave: self.wave.clone(),
            frame: self.frame,
        })
    }

    pub fn n_obs(&self) -> usize {
        self.flux.nrows()
    }

    pub fn n_pix(&self) -> usize {
        self.flux.ncols()
    }

    pub fn flux(&self) -> &Array2<f64> {
        &self.flux
    }

    pub fn flux_err(&self) -> Option<&Array2<f64>> {
        self.flux_err.as_ref()
    }

    pub fn wave(&self) -> &Array1<f64> {
        &self.wave
    }

    /// Divide every pixel by its median across frames.
    pub fn normalise(&self) -> Result<Self> {
        let mut flux = self.flux.clone();
        for (pix, mut column) in flux.axis_iter_mut(Axis(1)).enumerate() {
            let med = stats::median(&column.to_vec());
            if med == 0.0 || !med.is_finite() {
                return Err(RedcrossError::DegenerateInput(format!(
                    "pixel {pix} has a zero or missing median flux"
                )));
            }
            column /= med;
        }
        self.with_flux(flux)
    }
}

/// A 1-D reference spectrum: wavelength axis and flux.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Template {
    wave: Array1<f64>,
    flux: Array1<f64>,
}

impl Template {
    pub fn new(wave: Array1<f64>, flux: Array1<f64>) -> Result<Self> {
        if wave.len() != flux.len() {
            return Err(RedcrossError::ShapeMismatch {
                expected: format!("{} flux values", wave.len()),
                actual: format!("{}", flux.len()),
            });
        }
        if wave.len() < 2 {
            return Err(RedcrossError::DegenerateInput(
                "template needs at least two samples".into(),
            ));
        }
        if wave.iter().chain(flux.iter()).any(|v| !v.is_finite()) {
            return Err(RedcrossError::DegenerateInput(
                "template contains missing values".into(),
            ));
        }
        if wave.windows(2).into_iter().any(|w| w[1] <= w[0]) {
            return Err(RedcrossError::DegenerateInput(
                "template wavelengths are not strictly increasing".into(),
            ));
        }
        Ok(Self { wave, flux })
    }

    pub fn wave(&self) -> &Array1<f64> {
        &self.wave
    }

    pub fn flux(&self) -> &Array1<f64> {
        &self.flux
    }

    pub fn len(&self) -> usize {
        self.wave.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wave.is_empty()
    }

    /// Keep samples within `[min - eps*(max-min), max + eps*(max-min)]`.
    pub fn crop(&self, min: f64, max: f64, eps: f64) -> Result<Self> {
        let margin = eps * (max - min);
        let (lo, hi) = (min - margin, max + margin);
        let keep: Vec<usize> = (0..self.len())
            .filter(|&i| self.wave[i] >= lo && self.wave[i] <= hi)
            .collect();
        if keep.len() < 2 {
            return Err(RedcrossError::Configuration(format!(
                "template has {} samples inside [{lo:.4}, {hi:.4}]",
                keep.len()
            )));
        }
        Self::new(self.wave.select(Axis(0), &keep), self.flux.select(Axis(0), &keep))
    }

    /// Subtract a Gaussian low-pass of `window` samples from the flux.
    pub fn high_pass_gaussian(&self, window: f64) -> Self {
        let flux = high_pass_gaussian(&self.flux.to_vec(), window);
        Self {
            wave: self.wave.clone(),
            flux: Array1::from(flux),
        }
    }

    /// Copy with the mean flux removed.
    pub fn centered(&self) -> Self {
        let mean = self.flux.mean().unwrap_or(0.0);
        Self {
            wave: self.wave.clone(),
            flux: &self.flux - mean,
        }
    }
}
