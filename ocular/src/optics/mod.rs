//! Optical kernels and the cached diffraction filter

mod airy;
mod diffract;

pub use airy::{kernel_radius, pickets, HumanEye, FOCAL_LENGTH, MAX_KERNEL_RADIUS};
pub use diffract::{Diffractor, DEFAULT_ATTENUATION};

use ndarray::Array2;

/// Source of convolution kernels for the diffraction filter
pub trait KernelSource {
    /// Airy point-spread kernel for a sub-pixel offset `(dx, dy)` in meters,
    /// a wavelength and an aperture diameter in meters.
    fn airy(&mut self, dx: f64, dy: f64, wavelength: f64, aperture: f64) -> Array2<f64>;

    /// Smoothing kernel for a wavelength in meters
    fn gaussian(&mut self, wavelength: f64) -> Array2<f64>;
}
