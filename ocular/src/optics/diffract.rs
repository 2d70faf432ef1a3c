//! Cached diffraction filter
//!
//! Regenerating an Airy kernel is far more expensive than convolving with
//! it, and the aperture rarely changes between frames, so the kernel, the
//! auxiliary Gaussian and the edge mask are kept until the aperture does.

use super::KernelSource;
use crate::error::{EngineError, Result};
use crate::numeric::signal::{convolve2d, Boundary};
use ndarray::{Array2, ArrayView2};
use tracing::debug;

/// Scale applied to every diffracted plane
pub const DEFAULT_ATTENUATION: f64 = 0.95;

struct CachedKernel {
    aperture: f64,
    kernel: Array2<f64>,
    /// Half extents (rows/2, cols/2)
    half: (usize, usize),
    /// Width of the zeroed border band
    band: usize,
    mask: Option<Array2<f64>>,
}

impl CachedKernel {
    fn mask_for(&mut self, shape: (usize, usize)) -> &Array2<f64> {
        let band = self.band;
        let mask = self.mask.get_or_insert_with(|| edge_mask(shape, band));
        if mask.dim() != shape {
            *mask = edge_mask(shape, band);
        }
        mask
    }
}

/// Ones with a zeroed border band of width `band`
fn edge_mask(shape: (usize, usize), band: usize) -> Array2<f64> {
    let (h, w) = shape;
    Array2::from_shape_fn(shape, |(i, j)| {
        let inside = i >= band && j >= band && i + band < h && j + band < w;
        if inside { 1.0 } else { 0.0 }
    })
}

/// Diffraction filter with a one-entry kernel cache keyed by aperture
pub struct Diffractor {
    source: Box<dyn KernelSource>,
    attenuation: f64,
    cache: Option<CachedKernel>,
    gaussian: Option<(f64, Array2<f64>)>,
}

impl Diffractor {
    pub fn new(source: Box<dyn KernelSource>, attenuation: f64) -> Self {
        Diffractor {
            source,
            attenuation,
            cache: None,
            gaussian: None,
        }
    }

    /// Capture margin required by the cached kernel; `(0, 0)` before any
    /// diffraction.
    pub fn margin(&self) -> (usize, usize) {
        self.cache.as_ref().map_or((0, 0), |c| c.half)
    }

    pub fn cached_aperture(&self) -> Option<f64> {
        self.cache.as_ref().map(|c| c.aperture)
    }

    fn regenerate(&mut self, aperture: f64, wavelength: f64) -> Result<()> {
        debug!(aperture, wavelength, "generating diffraction kernel");
        let mut kernel = self.source.airy(0.0, 0.0, wavelength, aperture);
        let sum = kernel.sum();
        if !sum.is_finite() || sum == 0.0 {
            return Err(EngineError::numeric(format!(
                "kernel for aperture {aperture} cannot be normalized"
            )));
        }
        kernel /= sum;

        let (rows, cols) = kernel.dim();
        let half = (rows / 2, cols / 2);
        let band = half.0 / 4;
        self.gaussian = Some((wavelength, self.source.gaussian(wavelength)));
        self.cache = Some(CachedKernel {
            aperture,
            kernel,
            half,
            band,
            mask: None,
        });
        Ok(())
    }

    /// Convolve `plane` with the Airy kernel for `aperture`, attenuate and
    /// mask the border.
    pub fn diffract(
        &mut self,
        plane: ArrayView2<'_, f64>,
        aperture: f64,
        wavelength: f64,
        mode: Boundary,
    ) -> Result<Array2<f64>> {
        if !aperture.is_finite() || aperture <= 0.0 {
            return Err(EngineError::numeric(format!("invalid aperture: {aperture}")));
        }
        if self.cached_aperture() != Some(aperture) {
            self.regenerate(aperture, wavelength)?;
        }
        let attenuation = self.attenuation;
        let Some(cache) = self.cache.as_mut() else {
            return Err(EngineError::numeric("no diffraction kernel"));
        };

        let mut out = convolve2d(plane, cache.kernel.view(), mode);
        out *= attenuation;
        let mask = cache.mask_for(out.dim());
        out *= mask;
        Ok(out)
    }

    /// Auxiliary smoothing kernel, regenerated when the wavelength changes
    pub fn gaussian(&mut self, wavelength: f64) -> &Array2<f64> {
        let source = &mut self.source;
        let entry = self
            .gaussian
            .get_or_insert_with(|| (wavelength, source.gaussian(wavelength)));
        if entry.0 != wavelength {
            debug!(wavelength, "regenerating gaussian kernel");
            *entry = (wavelength, source.gaussian(wavelength));
        }
        &entry.1
    }
}
