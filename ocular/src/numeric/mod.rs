//! Numeric library
//!
//! Elementwise functions over [`Value::Scalar`] and [`Value::Array`]
//! operands, reductions, and the 2D signal operations in [`signal`].
//! Name tables are static: the registry is built from [`UNARY`],
//! [`BINARY`], [`REDUCTIONS`] and [`constants::CONSTANTS`].

pub mod constants;
pub mod signal;

use crate::error::{EngineError, Result};
use crate::value::Value;
use ndarray::{ArrayD, Zip};

pub type UnaryFn = fn(f64) -> f64;
pub type BinaryFn = fn(f64, f64) -> f64;
pub type ReduceFn = fn(&[f64]) -> f64;

/// Functions of one parameter, applied elementwise
pub const UNARY: &[(&str, UnaryFn)] = &[
    ("nan_to_num", nan_to_num),
    ("sin", f64::sin),
    ("cos", f64::cos),
    ("tan", f64::tan),
    ("arcsin", f64::asin),
    ("arccos", f64::acos),
    ("arctan", f64::atan),
    ("sinh", f64::sinh),
    ("cosh", f64::cosh),
    ("tanh", f64::tanh),
    ("arcsinh", f64::asinh),
    ("arccosh", f64::acosh),
    ("degrees", f64::to_degrees),
    ("radians", f64::to_radians),
    ("deg2rad", f64::to_radians),
    ("rad2deg", f64::to_degrees),
    ("around", libm::rint),
    ("round_", libm::rint),
    ("rint", libm::rint),
    ("fix", libm::trunc),
    ("floor", libm::floor),
    ("ceil", libm::ceil),
    ("trunc", libm::trunc),
    ("exp", libm::exp),
    ("expm1", libm::expm1),
    ("exp2", libm::exp2),
    ("log", libm::log),
    ("log10", libm::log10),
    ("log2", libm::log2),
    ("log1p", libm::log1p),
    ("i0", bessel_i0),
    ("sinc", sinc),
    ("negative", negative),
    ("sqrt", libm::sqrt),
    ("square", square),
    ("absolute", libm::fabs),
    ("fabs", libm::fabs),
    ("sign", sign),
];

/// Functions of two parameters, applied elementwise with broadcasting
pub const BINARY: &[(&str, BinaryFn)] = &[
    ("hypot", libm::hypot),
    ("logaddexp", logaddexp),
    ("logaddexp2", logaddexp2),
    ("copysign", libm::copysign),
    ("add", add),
    ("multiply", multiply),
    ("divide", divide),
    ("power", libm::pow),
    ("subtract", subtract),
    ("true_divide", divide),
    ("floor_divide", floor_divide),
    ("fmod", libm::fmod),
    ("mod", floor_mod),
    ("remainder", floor_mod),
    ("maximum", maximum),
    ("minimum", minimum),
];

/// Statistics that collapse an operand to one scalar
pub const REDUCTIONS: &[(&str, ReduceFn)] = &[
    ("amin", amin),
    ("amax", amax),
    ("nanmax", nanmax),
    ("nanmin", nanmin),
    ("mean", mean),
    ("median", median),
    ("std", std_dev),
    ("var", variance),
];

pub fn unary(name: &str) -> Option<UnaryFn> {
    UNARY.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

pub fn binary(name: &str) -> Option<BinaryFn> {
    BINARY.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

pub fn reduction(name: &str) -> Option<ReduceFn> {
    REDUCTIONS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

/// Apply `f` to every element of a numeric operand
pub fn apply_unary(value: Value, f: UnaryFn) -> Result<Value> {
    match value {
        Value::Scalar(x) => Ok(Value::Scalar(f(x))),
        Value::Array(a) => Ok(Value::Array(a.mapv(f))),
        other => Err(EngineError::type_mismatch("scalar or array", other.type_name())),
    }
}

/// Apply `f(left, right)` elementwise, broadcasting scalars and compatible shapes
pub fn apply_binary(left: Value, right: Value, f: BinaryFn) -> Result<Value> {
    match (left, right) {
        (Value::Scalar(a), Value::Scalar(b)) => Ok(Value::Scalar(f(a, b))),
        (Value::Array(a), Value::Scalar(b)) => Ok(Value::Array(a.mapv(|x| f(x, b)))),
        (Value::Scalar(a), Value::Array(b)) => Ok(Value::Array(b.mapv(|y| f(a, y)))),
        (Value::Array(a), Value::Array(b)) => zip_arrays(&a, &b, f).map(Value::Array),
        (l, r) => {
            let got = if l.is_numeric() { r.type_name() } else { l.type_name() };
            Err(EngineError::type_mismatch("scalar or array", got))
        }
    }
}

/// Collapse a numeric operand to a scalar
pub fn apply_reduce(value: Value, f: ReduceFn) -> Result<Value> {
    match value {
        Value::Scalar(x) => Ok(Value::Scalar(f(&[x]))),
        Value::Array(a) => {
            if a.is_empty() {
                return Err(EngineError::numeric("reduction of an empty array"));
            }
            let data: Vec<f64> = a.iter().copied().collect();
            Ok(Value::Scalar(f(&data)))
        }
        other => Err(EngineError::type_mismatch("scalar or array", other.type_name())),
    }
}

fn zip_arrays(a: &ArrayD<f64>, b: &ArrayD<f64>, f: BinaryFn) -> Result<ArrayD<f64>> {
    if a.shape() == b.shape() {
        return Ok(Zip::from(a).and(b).map_collect(|&x, &y| f(x, y)));
    }
    if let Some(bv) = b.broadcast(a.shape()) {
        return Ok(Zip::from(a).and(bv).map_collect(|&x, &y| f(x, y)));
    }
    if let Some(av) = a.broadcast(b.shape()) {
        return Ok(Zip::from(av).and(b).map_collect(|&x, &y| f(x, y)));
    }
    Err(EngineError::shape_mismatch(a.shape(), b.shape()))
}

fn nan_to_num(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else if x == f64::INFINITY {
        f64::MAX
    } else if x == f64::NEG_INFINITY {
        f64::MIN
    } else {
        x
    }
}

/// Modified Bessel function of the first kind, order zero
fn bessel_i0(x: f64) -> f64 {
    let q = (x / 2.0) * (x / 2.0);
    let mut term = 1.0;
    let mut sum = 1.0;
    let mut k = 1.0;
    while term > sum * 1e-17 {
        term *= q / (k * k);
        sum += term;
        k += 1.0;
        if k > 500.0 {
            break;
        }
    }
    sum
}

fn sinc(x: f64) -> f64 {
    if x == 0.0 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        libm::sin(px) / px
    }
}

fn negative(x: f64) -> f64 {
    -x
}

fn square(x: f64) -> f64 {
    x * x
}

fn sign(x: f64) -> f64 {
    if x.is_nan() {
        f64::NAN
    } else if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn add(a: f64, b: f64) -> f64 {
    a + b
}

fn subtract(a: f64, b: f64) -> f64 {
    a - b
}

fn multiply(a: f64, b: f64) -> f64 {
    a * b
}

fn divide(a: f64, b: f64) -> f64 {
    a / b
}

fn floor_divide(a: f64, b: f64) -> f64 {
    libm::floor(a / b)
}

/// Remainder carrying the sign of the divisor
fn floor_mod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return f64::NAN;
    }
    let r = libm::fmod(a, b);
    if r != 0.0 && (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

fn logaddexp(a: f64, b: f64) -> f64 {
    let m = a.max(b);
    if m == f64::NEG_INFINITY {
        return m;
    }
    m + libm::log1p(libm::exp(-(a - b).abs()))
}

fn logaddexp2(a: f64, b: f64) -> f64 {
    let m = a.max(b);
    if m == f64::NEG_INFINITY {
        return m;
    }
    m + libm::log1p(libm::exp2(-(a - b).abs())) / std::f64::consts::LN_2
}

fn maximum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.max(b)
    }
}

fn minimum(a: f64, b: f64) -> f64 {
    if a.is_nan() || b.is_nan() {
        f64::NAN
    } else {
        a.min(b)
    }
}

fn amin(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::INFINITY, minimum)
}

fn amax(data: &[f64]) -> f64 {
    data.iter().copied().fold(f64::NEG_INFINITY, maximum)
}

fn nanmin(data: &[f64]) -> f64 {
    data.iter()
        .copied()
        .filter(|x| !x.is_nan())
        .reduce(f64::min)
        .unwrap_or(f64::NAN)
}

fn nanmax(data: &[f64]) -> f64 {
    data.iter()
        .copied()
        .filter(|x| !x.is_nan())
        .reduce(f64::max)
        .unwrap_or(f64::NAN)
}

fn mean(data: &[f64]) -> f64 {
    data.iter().sum::<f64>() / data.len() as f64
}

fn median(data: &[f64]) -> f64 {
    let mut sorted = data.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

fn variance(data: &[f64]) -> f64 {
    let m = mean(data);
    data.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / data.len() as f64
}

fn std_dev(data: &[f64]) -> f64 {
    libm::sqrt(variance(data))
}
