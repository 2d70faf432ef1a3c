//! Airy and Gaussian kernels for a human eye model

use super::KernelSource;
use ndarray::Array2;
use std::f64::consts::PI;

/// Focal length of the eye in meters
pub const FOCAL_LENGTH: f64 = 17e-3;

/// Largest kernel radius in pixels, whatever the aperture
pub const MAX_KERNEL_RADIUS: usize = 256;

/// Third zero of `2·J1(u)/u`; kernels are cut there
const THIRD_ZERO: f64 = 10.173_471_1;

/// Pixel pitch in meters
const MICRON: f64 = 1e-6;

/// Gaussian radius in pixels at 534 nm
const GAUSS_RADIUS: f64 = 3.0;
const GAUSS_REFERENCE_WAVELENGTH: f64 = 534e-9;
const GAUSS_SUM: f64 = 0.95;

/// Kernel radius in pixels: `ceil(u₃ · 1e6 · w · f / (π a))`
pub fn kernel_radius(wavelength: f64, aperture: f64) -> usize {
    let r = (THIRD_ZERO * 1e6 * wavelength * FOCAL_LENGTH) / (PI * aperture);
    if !r.is_finite() || r <= 0.0 {
        return MAX_KERNEL_RADIUS;
    }
    (r.ceil() as usize).min(MAX_KERNEL_RADIUS)
}

/// Evenly spaced sub-pixel offsets in `(-0.5, 0.5)`, as an `n × n` grid
/// with `n = 1 + 2·radial`.
pub fn pickets(radial: usize) -> Vec<(f64, f64)> {
    let seq: Vec<f64> = if radial == 0 {
        vec![0.0]
    } else {
        let n = 1 + 2 * radial;
        let div = 2.0 + 1.0 / radial as f64;
        (0..n)
            .map(|i| (-1.0 + 2.0 * i as f64 / (n - 1) as f64) / div)
            .collect()
    };
    seq.iter()
        .flat_map(|&x| seq.iter().map(move |&y| (x, y)))
        .collect()
}

/// Amplitude of the Airy pattern at radius `r` meters
fn wave(r: f64, aperture: f64, wavelength: f64) -> f64 {
    let u = (PI * r * aperture) / (wavelength * FOCAL_LENGTH);
    if u == 0.0 { 1.0 } else { 2.0 * libm::j1(u) / u }
}

/// Kernel generator for the human eye
#[derive(Debug, Clone)]
pub struct HumanEye {
    /// Sub-pixel sampling, see [`pickets`]
    offsets: Vec<(f64, f64)>,
}

impl HumanEye {
    pub fn new() -> Self {
        HumanEye { offsets: pickets(1) }
    }
}

impl Default for HumanEye {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelSource for HumanEye {
    fn airy(&mut self, dx: f64, dy: f64, wavelength: f64, aperture: f64) -> Array2<f64> {
        let radius = kernel_radius(wavelength, aperture);
        // one pixel of slack for the sub-pixel offset
        let r1 = radius + 1;
        let edge = 1 + 2 * r1;
        let cutoff = radius as f64 * MICRON;

        let mut accum = Array2::<f64>::zeros((edge, edge));
        for &(ex, ey) in &self.offsets {
            let (ex, ey) = (ex * MICRON, ey * MICRON);
            for ((row, col), cell) in accum.indexed_iter_mut() {
                let x = MICRON * (row as f64 - r1 as f64);
                let y = MICRON * (col as f64 - r1 as f64);
                let r = ((x + dx + ex).powi(2) + (y + dy + ey).powi(2)).sqrt();
                if r <= cutoff {
                    *cell += wave(r, aperture, wavelength);
                }
            }
        }

        let norm = accum.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            accum /= norm;
        }
        accum
    }

    fn gaussian(&mut self, wavelength: f64) -> Array2<f64> {
        let r = GAUSS_RADIUS * wavelength / GAUSS_REFERENCE_WAVELENGTH;
        let r = if r.is_finite() && r > 0.0 { r } else { GAUSS_RADIUS };
        let half = (r.ceil() as usize).min(MAX_KERNEL_RADIUS);
        let edge = 1 + 2 * half;
        // 1/255 at the rim: the threshold of light detection
        let coeff = 255f64.ln();

        let mut accum = Array2::from_shape_fn((edge, edge), |(row, col)| {
            let dr = row as f64 - half as f64;
            let dc = col as f64 - half as f64;
            let d = (dr * dr + dc * dc).sqrt();
            if d > r { 0.0 } else { (-coeff * (d / r).powi(2)).exp() }
        });
        let sum = accum.sum();
        if sum > 0.0 {
            accum *= GAUSS_SUM / sum;
        }
        accum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_radius() {
        assert_eq!(kernel_radius(534e-9, 7e-3), 5);
        assert_eq!(kernel_radius(534e-9, 1e-3), 30);
        assert_eq!(kernel_radius(534e-9, 0.0), MAX_KERNEL_RADIUS);
    }

    #[test]
    fn test_pickets_even_spacing() {
        assert_eq!(pickets(0), vec![(0.0, 0.0)]);
        let p = pickets(1);
        assert_eq!(p.len(), 9);
        let xs: Vec<f64> = p.iter().step_by(3).map(|(x, _)| *x).collect();
        assert!((xs[0] + 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(xs[1], 0.0);
        assert!((xs[2] - 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_airy_shape_and_peak() {
        let mut eye = HumanEye::new();
        let k = eye.airy(0.0, 0.0, 534e-9, 7e-3);
        // radius 5, one pixel slack
        assert_eq!(k.dim(), (13, 13));
        let center = k[[6, 6]];
        assert!(k.iter().all(|&x| x <= center));
        let norm: f64 = k.iter().map(|x| x * x).sum();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_airy_is_symmetric_when_centered() {
        let mut eye = HumanEye::new();
        let k = eye.airy(0.0, 0.0, 564e-9, 5e-3);
        let n = k.nrows();
        for i in 0..n {
            for j in 0..n {
                assert!((k[[i, j]] - k[[n - 1 - i, n - 1 - j]]).abs() < 1e-12);
                assert!((k[[i, j]] - k[[j, i]]).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_gaussian_sum_and_shape() {
        let mut eye = HumanEye::new();
        let g = eye.gaussian(534e-9);
        assert_eq!(g.dim(), (7, 7));
        assert!((g.sum() - 0.95).abs() < 1e-12);
        assert_eq!(g[[0, 0]], 0.0);
    }
}
