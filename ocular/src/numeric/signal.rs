//! 2D signal operations: convolution and affine resampling

use crate::error::{EngineError, Result};
use ndarray::{s, Array2, ArrayD, ArrayView2, Axis, Ix2, Ix3};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Output extent of a convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Boundary {
    /// Every point of overlap
    Full,
    /// Same size as the input, centered on the full result
    #[default]
    Same,
    /// Only points where the kernel lies entirely inside the input
    Valid,
}

impl FromStr for Boundary {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "full" => Ok(Boundary::Full),
            "same" => Ok(Boundary::Same),
            "valid" => Ok(Boundary::Valid),
            other => Err(EngineError::numeric(format!("unknown boundary mode: {other}"))),
        }
    }
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Boundary::Full => "full",
            Boundary::Same => "same",
            Boundary::Valid => "valid",
        };
        write!(f, "{name}")
    }
}

/// Direct 2D convolution, scipy `convolve` semantics for each mode
pub fn convolve2d(input: ArrayView2<'_, f64>, kernel: ArrayView2<'_, f64>, mode: Boundary) -> Array2<f64> {
    let (h, w) = input.dim();
    let (kh, kw) = kernel.dim();
    if h == 0 || w == 0 || kh == 0 || kw == 0 {
        return Array2::zeros((0, 0));
    }

    let mut full = Array2::<f64>::zeros((h + kh - 1, w + kw - 1));
    for ((i, j), &x) in input.indexed_iter() {
        if x == 0.0 {
            continue;
        }
        let mut window = full.slice_mut(s![i..i + kh, j..j + kw]);
        window.zip_mut_with(&kernel, |out, &k| *out += x * k);
    }

    match mode {
        Boundary::Full => full,
        Boundary::Same => {
            let r0 = (kh - 1) / 2;
            let c0 = (kw - 1) / 2;
            full.slice(s![r0..r0 + h, c0..c0 + w]).to_owned()
        }
        Boundary::Valid => {
            let r0 = h.min(kh) - 1;
            let c0 = w.min(kw) - 1;
            let rows = h.max(kh) - h.min(kh) + 1;
            let cols = w.max(kw) - w.min(kw) + 1;
            full.slice(s![r0..r0 + rows, c0..c0 + cols]).to_owned()
        }
    }
}

/// Resample `input` so that `output[o] = input[matrix · o + offset]`.
///
/// Order-1 (bilinear) interpolation; coordinates outside the input read 0.
pub fn affine_transform(input: ArrayView2<'_, f64>, matrix: [[f64; 2]; 2], offset: [f64; 2]) -> Array2<f64> {
    let (h, w) = input.dim();
    Array2::from_shape_fn((h, w), |(i, j)| {
        let (i, j) = (i as f64, j as f64);
        let r = matrix[0][0] * i + matrix[0][1] * j + offset[0];
        let c = matrix[1][0] * i + matrix[1][1] * j + offset[1];
        bilinear(&input, r, c)
    })
}

fn bilinear(input: &ArrayView2<'_, f64>, r: f64, c: f64) -> f64 {
    let (h, w) = input.dim();
    if h == 0 || w == 0 || r < 0.0 || c < 0.0 || r > (h - 1) as f64 || c > (w - 1) as f64 {
        return 0.0;
    }
    let r0 = r.floor() as usize;
    let c0 = c.floor() as usize;
    let r1 = (r0 + 1).min(h - 1);
    let c1 = (c0 + 1).min(w - 1);
    let fr = r - r0 as f64;
    let fc = c - c0 as f64;
    let top = input[[r0, c0]] * (1.0 - fc) + input[[r0, c1]] * fc;
    let bottom = input[[r1, c0]] * (1.0 - fc) + input[[r1, c1]] * fc;
    top * (1.0 - fr) + bottom * fr
}

/// Apply a plane operation to a 2D array, or to each plane of a 3D array
pub fn map_planes<F>(array: &ArrayD<f64>, mut f: F) -> Result<ArrayD<f64>>
where
    F: FnMut(ArrayView2<'_, f64>) -> Result<Array2<f64>>,
{
    match array.ndim() {
        2 => {
            let plane = array
                .view()
                .into_dimensionality::<Ix2>()
                .map_err(|e| EngineError::numeric(e.to_string()))?;
            Ok(f(plane)?.into_dyn())
        }
        3 => {
            let cube = array
                .view()
                .into_dimensionality::<Ix3>()
                .map_err(|e| EngineError::numeric(e.to_string()))?;
            let planes = cube
                .axis_iter(Axis(0))
                .map(&mut f)
                .collect::<Result<Vec<_>>>()?;
            stack_planes(&planes).map(|a| a.into_dyn())
        }
        n => Err(EngineError::type_mismatch(
            "2D or 3D array",
            &format!("{n}D array"),
        )),
    }
}

/// Stack equally shaped planes along a new leading axis
pub fn stack_planes(planes: &[Array2<f64>]) -> Result<ndarray::Array3<f64>> {
    let views: Vec<_> = planes.iter().map(|p| p.view()).collect();
    ndarray::stack(Axis(0), &views).map_err(|e| EngineError::numeric(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_boundary_parse() {
        assert_eq!("same".parse::<Boundary>().unwrap(), Boundary::Same);
        assert_eq!("full".parse::<Boundary>().unwrap(), Boundary::Full);
        assert!("wrap".parse::<Boundary>().is_err());
        assert_eq!(Boundary::Valid.to_string(), "valid");
    }

    #[test]
    fn test_convolve_full_shape_and_values() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let k = array![[1.0, 1.0]];
        let out = convolve2d(a.view(), k.view(), Boundary::Full);
        assert_eq!(out, array![[1.0, 3.0, 2.0], [3.0, 7.0, 4.0]]);
    }

    #[test]
    fn test_convolve_same_with_identity_kernel() {
        let a = array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let k = array![[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]];
        let out = convolve2d(a.view(), k.view(), Boundary::Same);
        assert_eq!(out, a);
    }

    #[test]
    fn test_convolve_valid_shape() {
        let a = Array2::<f64>::ones((5, 4));
        let k = Array2::<f64>::ones((3, 3));
        let out = convolve2d(a.view(), k.view(), Boundary::Valid);
        assert_eq!(out.dim(), (3, 2));
        assert!(out.iter().all(|&x| x == 9.0));
    }

    #[test]
    fn test_convolve_same_preserves_sum_away_from_edges() {
        let mut a = Array2::<f64>::zeros((7, 7));
        a[[3, 3]] = 1.0;
        let k = Array2::<f64>::from_elem((3, 3), 1.0 / 9.0);
        let out = convolve2d(a.view(), k.view(), Boundary::Same);
        assert!((out.sum() - 1.0).abs() < 1e-12);
        assert!((out[[2, 2]] - 1.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_affine_identity() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let out = affine_transform(a.view(), [[1.0, 0.0], [0.0, 1.0]], [0.0, 0.0]);
        assert_eq!(out, a);
    }

    #[test]
    fn test_affine_shift_reads_zero_outside() {
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        let out = affine_transform(a.view(), [[1.0, 0.0], [0.0, 1.0]], [1.0, 0.0]);
        assert_eq!(out, array![[3.0, 4.0], [0.0, 0.0]]);
    }

    #[test]
    fn test_affine_interpolates() {
        let a = array![[0.0, 2.0]];
        let out = affine_transform(a.view(), [[1.0, 0.0], [0.0, 0.5]], [0.0, 0.0]);
        assert_eq!(out, array![[0.0, 1.0]]);
    }

    #[test]
    fn test_map_planes_3d() {
        let cube = ndarray::Array3::<f64>::ones((3, 2, 2)).into_dyn();
        let out = map_planes(&cube, |p| Ok(p.mapv(|x| x * 2.0))).unwrap();
        assert_eq!(out.shape(), &[3, 2, 2]);
        assert!(out.iter().all(|&x| x == 2.0));
    }

    #[test]
    fn test_map_planes_rejects_1d() {
        let line = ndarray::Array1::<f64>::ones(4).into_dyn();
        assert!(map_planes(&line, |p| Ok(p.to_owned())).is_err());
    }
}
