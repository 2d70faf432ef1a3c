//! Function registry
//!
//! Maps full instruction text to zero-argument operations on the engine.
//! Built once from the numeric name tables and the explicit built-ins;
//! immutable afterwards.

use crate::engine::Engine;
use crate::error::{EngineError, Result};
use crate::numeric::{self, constants, signal, BinaryFn, ReduceFn, UnaryFn};
use crate::value::Value;
use ndarray::Ix2;
use std::collections::BTreeMap;

/// Built-in operation type
pub type BuiltinFn = fn(&mut Engine) -> Result<()>;

/// One registry entry
#[derive(Debug, Clone, Copy)]
pub enum Entry {
    /// Operates on the engine directly
    Builtin(BuiltinFn, &'static str),
    /// Pushes a fixed value
    Constant(f64),
    /// Pops one operand, pushes the elementwise result
    Unary(UnaryFn),
    /// Pops one operand, pushes a scalar
    Reduce(ReduceFn),
    /// Pops right then left, pushes `f(left, right)`
    Binary(BinaryFn),
}

impl Entry {
    pub fn invoke(self, engine: &mut Engine) -> Result<()> {
        match self {
            Entry::Builtin(f, _) => f(engine),
            Entry::Constant(x) => {
                engine.stack_mut().push(x);
                Ok(())
            }
            Entry::Unary(f) => {
                let operand = engine.stack_mut().pop()?;
                let result = numeric::apply_unary(operand, f)?;
                engine.stack_mut().push(result);
                Ok(())
            }
            Entry::Reduce(f) => {
                let operand = engine.stack_mut().pop()?;
                let result = numeric::apply_reduce(operand, f)?;
                engine.stack_mut().push(result);
                Ok(())
            }
            Entry::Binary(f) => {
                let stack = engine.stack_mut();
                if stack.len() < 2 {
                    return Err(EngineError::stack_underflow(format!(
                        "binary operation needs 2 operands, stack has {}",
                        stack.len()
                    )));
                }
                let right = stack.pop()?;
                let left = stack.pop()?;
                let result = numeric::apply_binary(left, right, f)?;
                engine.stack_mut().push(result);
                Ok(())
            }
        }
    }

    /// Number of operands consumed
    pub fn arity(&self) -> usize {
        match self {
            Entry::Builtin(..) | Entry::Constant(_) => 0,
            Entry::Unary(_) | Entry::Reduce(_) => 1,
            Entry::Binary(_) => 2,
        }
    }

    /// One-line description for the help listing
    pub fn describe(&self) -> String {
        match self {
            Entry::Builtin(_, doc) => format!("direct keyword: {doc}"),
            Entry::Constant(x) => format!("constant ({x:e})"),
            Entry::Unary(_) => "numeric suite (1 arg)".to_string(),
            Entry::Reduce(_) => "numeric suite (1 arg, reduces to scalar)".to_string(),
            Entry::Binary(_) => "numeric suite (2 args)".to_string(),
        }
    }
}

/// Name → operation table
#[derive(Debug, Clone)]
pub struct FunctionRegistry {
    entries: BTreeMap<&'static str, Entry>,
}

impl FunctionRegistry {
    /// The standard table: constants, numeric wrappers, then built-ins
    pub fn standard() -> Self {
        let mut registry = FunctionRegistry {
            entries: BTreeMap::new(),
        };
        registry.register_numeric();
        registry.register_builtins();
        registry
    }

    fn register_numeric(&mut self) {
        for &(name, value) in constants::CONSTANTS {
            self.entries.insert(name, Entry::Constant(value));
        }
        for &(name, f) in numeric::UNARY {
            self.entries.insert(name, Entry::Unary(f));
        }
        for &(name, f) in numeric::REDUCTIONS {
            self.entries.insert(name, Entry::Reduce(f));
        }
        for &(name, f) in numeric::BINARY {
            self.entries.insert(name, Entry::Binary(f));
        }
    }

    fn register_builtins(&mut self) {
        self.entries.insert("show", Entry::Builtin(builtin_show, "show the top of the stack"));
        self.entries.insert(
            "zoom",
            Entry::Builtin(builtin_zoom, "pop coefficient and array, zoom about the center"),
        );
        self.entries.insert(
            "diffract",
            Entry::Builtin(builtin_diffract, "pop aperture and plane, apply the Airy kernel"),
        );
        self.entries.insert(
            "average",
            Entry::Builtin(builtin_average, "blur the top array with the Gaussian kernel"),
        );
        self.entries.insert("negate", Entry::Builtin(builtin_negate, "invert the sign of the top"));
        self.entries.insert(
            "normalize",
            Entry::Builtin(builtin_normalize, "scale the top so its maximum is 1.0"),
        );
        self.entries.insert("clear", Entry::Builtin(builtin_clear, "reset stack, symbols and flags"));
        self.entries.insert("help", Entry::Builtin(builtin_help, "list keys and keywords"));
    }

    pub fn get(&self, name: &str) -> Option<Entry> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in name order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Entry)> + '_ {
        self.entries.iter().map(|(name, entry)| (*name, *entry))
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

// ============================================================================
// Built-in operations
// ============================================================================

fn builtin_show(engine: &mut Engine) -> Result<()> {
    let text = engine.stack().peek()?.to_string();
    engine.emit(text)
}

fn builtin_zoom(engine: &mut Engine) -> Result<()> {
    let coeff = engine.stack_mut().pop_scalar()?;
    let source = engine.stack_mut().pop_array()?;
    let zoomed = signal::map_planes(&source, |plane| {
        let (x, y) = plane.dim();
        let matrix = [[coeff, 0.0], [0.0, coeff]];
        let offset = [x as f64 * (1.0 - coeff) / 2.0, y as f64 * (1.0 - coeff) / 2.0];
        Ok(signal::affine_transform(plane, matrix, offset))
    })?;
    engine.stack_mut().push(zoomed);
    Ok(())
}

fn builtin_diffract(engine: &mut Engine) -> Result<()> {
    let aperture = engine.stack_mut().pop_scalar()?;
    let source = engine.stack_mut().pop_array()?;
    let shape = source.shape().to_vec();
    let plane = source
        .into_dimensionality::<Ix2>()
        .map_err(|_| EngineError::type_mismatch("2D array", &format!("{}D array", shape.len())))?;
    let wavelength = engine.red_wavelength();
    let mode = engine.boundary()?;
    let out = engine
        .diffractor_mut()
        .diffract(plane.view(), aperture, wavelength, mode)?;
    engine.stack_mut().push(out.into_dyn());
    Ok(())
}

fn builtin_average(engine: &mut Engine) -> Result<()> {
    let source = engine.stack_mut().pop_array()?;
    let wavelength = engine.red_wavelength();
    let kernel = engine.diffractor_mut().gaussian(wavelength).clone();
    let blurred = signal::map_planes(&source, |plane| {
        Ok(signal::convolve2d(plane, kernel.view(), signal::Boundary::Same))
    })?;
    engine.stack_mut().push(blurred);
    Ok(())
}

fn builtin_negate(engine: &mut Engine) -> Result<()> {
    let operand = engine.stack_mut().pop()?;
    let result = numeric::apply_unary(operand, |x| -x)?;
    engine.stack_mut().push(result);
    Ok(())
}

fn builtin_normalize(engine: &mut Engine) -> Result<()> {
    let operand = engine.stack_mut().pop()?;
    let max = match &operand {
        Value::Scalar(x) => *x,
        Value::Array(a) => a.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        other => return Err(EngineError::type_mismatch("scalar or array", other.type_name())),
    };
    let divisor = if max == 0.0 { 1.0 } else { max };
    let result = numeric::apply_binary(operand, Value::Scalar(divisor), |x, m| x / m)?;
    engine.stack_mut().push(result);
    Ok(())
}

fn builtin_clear(engine: &mut Engine) -> Result<()> {
    engine.clear();
    Ok(())
}

fn builtin_help(engine: &mut Engine) -> Result<()> {
    engine.help()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2, ArrayD};

    fn registry() -> FunctionRegistry {
        FunctionRegistry::standard()
    }

    #[test]
    fn test_registry_has_every_table() {
        let r = registry();
        for name in ["pi", "golden", "kibi", "yotta", "sqrt", "mean", "hypot", "show", "diffract"] {
            assert!(r.contains(name), "missing {name}");
        }
        assert!(!r.contains("nonexistent"));
        assert!(matches!(r.get("pi"), Some(Entry::Constant(_))));
        assert!(matches!(r.get("sqrt"), Some(Entry::Unary(_))));
        assert!(matches!(r.get("median"), Some(Entry::Reduce(_))));
        assert!(matches!(r.get("power"), Some(Entry::Binary(_))));
        assert!(matches!(r.get("zoom"), Some(Entry::Builtin(..))));
    }

    #[test]
    fn test_arity() {
        let r = registry();
        assert_eq!(r.get("e").unwrap().arity(), 0);
        assert_eq!(r.get("sin").unwrap().arity(), 1);
        assert_eq!(r.get("amax").unwrap().arity(), 1);
        assert_eq!(r.get("subtract").unwrap().arity(), 2);
    }

    #[test]
    fn test_constant_pushes() {
        let mut engine = Engine::default();
        registry().get("pi").unwrap().invoke(&mut engine).unwrap();
        assert_eq!(engine.stack().peek().unwrap(), &Value::Scalar(std::f64::consts::PI));
    }

    #[test]
    fn test_binary_left_is_second_popped() {
        let mut engine = Engine::default();
        engine.stack_mut().push(10.0);
        engine.stack_mut().push(4.0);
        registry().get("subtract").unwrap().invoke(&mut engine).unwrap();
        assert_eq!(engine.stack_mut().pop_scalar().unwrap(), 6.0);
    }

    #[test]
    fn test_binary_underflow_leaves_stack() {
        let mut engine = Engine::default();
        engine.stack_mut().push(1.0);
        let err = registry().get("add").unwrap().invoke(&mut engine).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::StackUnderflow);
        assert_eq!(engine.stack().len(), 1);
    }

    #[test]
    fn test_negate_and_normalize() {
        let mut engine = Engine::default();
        engine.stack_mut().push(array![[1.0, -2.0], [4.0, 0.0]].into_dyn());
        builtin_normalize(&mut engine).unwrap();
        builtin_negate(&mut engine).unwrap();
        let out = engine.stack_mut().pop_array().unwrap();
        assert_eq!(out, array![[-0.25, 0.5], [-1.0, -0.0]].into_dyn());
    }

    #[test]
    fn test_normalize_zero_max() {
        let mut engine = Engine::default();
        engine.stack_mut().push(ArrayD::<f64>::zeros(ndarray::IxDyn(&[2, 2])));
        builtin_normalize(&mut engine).unwrap();
        let out = engine.stack_mut().pop_array().unwrap();
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_normalize_rejects_label() {
        let mut engine = Engine::default();
        engine.stack_mut().push(Value::Label("x".into()));
        let err = builtin_normalize(&mut engine).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_zoom_identity_coefficient() {
        let mut engine = Engine::default();
        let a = array![[1.0, 2.0], [3.0, 4.0]];
        engine.stack_mut().push(a.clone().into_dyn());
        engine.stack_mut().push(1.0);
        builtin_zoom(&mut engine).unwrap();
        assert_eq!(engine.stack_mut().pop_array().unwrap(), a.into_dyn());
    }

    #[test]
    fn test_zoom_per_plane() {
        let mut engine = Engine::default();
        engine.stack_mut().push(ndarray::Array3::<f64>::ones((3, 4, 4)).into_dyn());
        engine.stack_mut().push(0.5);
        builtin_zoom(&mut engine).unwrap();
        let out = engine.stack_mut().pop_array().unwrap();
        assert_eq!(out.shape(), &[3, 4, 4]);
    }

    #[test]
    fn test_diffract_requires_2d() {
        let mut engine = Engine::default();
        engine.stack_mut().push(ndarray::Array1::<f64>::ones(5).into_dyn());
        engine.stack_mut().push(7e-3);
        let err = builtin_diffract(&mut engine).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TypeMismatch);
    }

    #[test]
    fn test_average_keeps_shape() {
        let mut engine = Engine::default();
        let mut plane = Array2::<f64>::zeros((15, 15));
        plane[[7, 7]] = 1.0;
        engine.stack_mut().push(plane.into_dyn());
        builtin_average(&mut engine).unwrap();
        let out = engine.stack_mut().pop_array().unwrap();
        assert_eq!(out.shape(), &[15, 15]);
        assert!((out.sum() - 0.95).abs() < 1e-9);
    }

    #[test]
    fn test_every_wrapper_accepts_ones() {
        let r = registry();
        let mut engine = Engine::default();
        for (name, entry) in r.iter() {
            if matches!(entry, Entry::Builtin(..)) {
                continue;
            }
            for _ in 0..entry.arity() {
                engine.stack_mut().push(Array2::<f64>::ones((2, 2)).into_dyn());
            }
            entry.invoke(&mut engine).unwrap_or_else(|e| panic!("{name}: {e}"));
            assert_eq!(engine.stack().len(), 1, "{name}");
            engine.stack_mut().clear();
        }
    }
}
