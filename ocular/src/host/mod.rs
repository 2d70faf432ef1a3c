//! Per-frame host integration
//!
//! The capture loop calls [`Host::call`] once per frame. A size query
//! returns the capture margin the cached kernel needs; a frame is exposed
//! to the configured program through the symbol table and the program's
//! target planes `Rt Gt Bt` come back as the output.

use crate::config::Config;
use crate::engine::{Engine, Fault};
use crate::numeric::signal::stack_planes;
use crate::value::Value;
use ndarray::{s, Array2, Array3, Axis, Ix2};
use tracing::{debug, warn};

/// Plane index symbols
const PLANE_INDICES: [(&str, f64); 3] = [("R", 0.0), ("G", 1.0), ("B", 2.0)];

const SOURCE_PLANES: [&str; 3] = ["Rs", "Gs", "Bs"];

const TARGET_PLANES: [&str; 3] = ["Rt", "Gt", "Bt"];

/// Wavelengths in meters: infrared, red, green, blue, ultraviolet
const WAVELENGTHS: [(&str, f64); 5] = [
    ("Iw", 750e-9),
    ("Rw", 564e-9),
    ("Gw", 534e-9),
    ("Bw", 420e-9),
    ("Uw", 390e-9),
];

#[derive(Debug, Clone, PartialEq)]
pub enum HostInput {
    SizeQuery,
    /// Planes × rows × columns
    Frame(Array3<f64>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum HostOutput {
    /// Kernel half extents
    Margin(usize, usize),
    Frame(Array3<f64>),
}

pub struct Host {
    engine: Engine,
    program: String,
    crop: bool,
    /// Program text seen on the previous frame
    last_text: Option<String>,
    faults: Vec<Fault>,
}

impl Host {
    pub fn new(engine: Engine, program: impl Into<String>, crop: bool) -> Self {
        Host {
            engine,
            program: program.into(),
            crop,
            last_text: None,
            faults: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Engine::new(config), config.engine.program.clone(), config.optics.crop)
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut Engine {
        &mut self.engine
    }

    /// Faults raised by the most recent frame
    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    pub fn call(&mut self, input: HostInput) -> HostOutput {
        match input {
            HostInput::SizeQuery => {
                let (x, y) = self.engine.margin();
                HostOutput::Margin(x, y)
            }
            HostInput::Frame(source) => HostOutput::Frame(self.process(source)),
        }
    }

    fn process(&mut self, source: Array3<f64>) -> Array3<f64> {
        self.faults.clear();
        let (w, x, y) = source.dim();
        if w != SOURCE_PLANES.len() {
            warn!(planes = w, "frame must have 3 planes, passing it through");
            return source;
        }
        self.inject(&source);

        let (path, text) = match self.engine.loader().read(&self.program) {
            Ok(found) => found,
            Err(e) => {
                warn!("{e}, passing frame through");
                return source;
            }
        };
        let changed = self.last_text.as_deref() != Some(text.as_str());
        self.engine.set_first(changed);
        debug!(path = %path.display(), changed, "running frame program");
        let report = self.engine.run_source(&self.program, &text);
        self.last_text = Some(text);
        self.faults = report.faults;

        let Some(target) = self.assemble_target((x, y)) else {
            return source;
        };
        self.engine.symbols_mut().store("target", target.clone().into_dyn());
        if self.crop { self.cropped(target) } else { target }
    }

    /// Bind the per-frame constants and drop stale targets
    fn inject(&mut self, source: &Array3<f64>) {
        let (w, x, y) = source.dim();
        let symbols = self.engine.symbols_mut();
        for (name, index) in PLANE_INDICES {
            symbols.store(name, index);
        }
        for (name, plane) in SOURCE_PLANES.iter().zip(source.axis_iter(Axis(0))) {
            symbols.store(*name, plane.to_owned().into_dyn());
        }
        symbols.store("W", w as f64);
        symbols.store("X", x as f64);
        symbols.store("Y", y as f64);
        for (name, wavelength) in WAVELENGTHS {
            symbols.store(name, wavelength);
        }
        for name in TARGET_PLANES {
            symbols.remove(name);
        }
        symbols.remove("target");
    }

    /// `Rt Gt Bt` stacked, when all three are 2D arrays of one shape
    fn assemble_target(&self, source_dim: (usize, usize)) -> Option<Array3<f64>> {
        let mut planes: Vec<Array2<f64>> = Vec::with_capacity(TARGET_PLANES.len());
        for name in TARGET_PLANES {
            let plane = match self.engine.symbols().get(name) {
                Some(Value::Array(a)) => a.clone().into_dimensionality::<Ix2>().ok(),
                _ => None,
            };
            let Some(plane) = plane else {
                warn!(plane = name, "target plane missing or not 2D, passing frame through");
                return None;
            };
            planes.push(plane);
        }
        if planes.iter().any(|p| p.dim() != planes[0].dim()) {
            warn!("target planes differ in shape, passing frame through");
            return None;
        }
        if planes[0].dim() != source_dim {
            debug!(?source_dim, target = ?planes[0].dim(), "target shape differs from source");
        }
        stack_planes(&planes).ok()
    }

    fn cropped(&self, target: Array3<f64>) -> Array3<f64> {
        let (dx, dy) = self.engine.margin();
        let (_, rows, cols) = target.dim();
        if 2 * dx >= rows || 2 * dy >= cols {
            warn!(dx, dy, rows, cols, "margin exceeds target, not cropping");
            return target;
        }
        target.slice(s![.., dx..rows - dx, dy..cols - dy]).to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn host_in(dir: &Path, program: &str, crop: bool) -> Host {
        let mut config = Config::default();
        config.engine.search_path = vec![dir.to_path_buf()];
        config.optics.crop = crop;
        let engine = Engine::new(&config).with_console(Box::new(std::io::sink()));
        Host::new(engine, program, crop)
    }

    fn frame(n: usize) -> Array3<f64> {
        let mut f = Array3::<f64>::zeros((3, n, n));
        for p in 0..3 {
            f[[p, n / 2, n / 2]] = 1.0;
        }
        f
    }

    #[test]
    fn test_size_query_before_diffraction() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        assert_eq!(host.call(HostInput::SizeQuery), HostOutput::Margin(0, 0));
    }

    #[test]
    fn test_missing_program_passes_frame_through() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        let input = frame(5);
        assert_eq!(host.call(HostInput::Frame(input.clone())), HostOutput::Frame(input));
    }

    #[test]
    fn test_constants_injected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("capture.rpn"), "# nothing\n").unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        host.call(HostInput::Frame(frame(5)));
        let symbols = host.engine().symbols();
        assert_eq!(symbols.get("X"), Some(&Value::Scalar(5.0)));
        assert_eq!(symbols.get("W"), Some(&Value::Scalar(3.0)));
        assert_eq!(symbols.get("B"), Some(&Value::Scalar(2.0)));
        assert_eq!(symbols.get("Uw"), Some(&Value::Scalar(390e-9)));
        assert!(matches!(symbols.get("Gs"), Some(Value::Array(a)) if a.shape() == &[5, 5]));
    }

    #[test]
    fn test_targets_returned() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("capture.rpn"),
            "(Rs,2,*,@Rt)\n(Gs,@Gt)\n(Bs,negate,@Bt)\n",
        )
        .unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        let HostOutput::Frame(out) = host.call(HostInput::Frame(frame(5))) else {
            panic!("expected a frame");
        };
        assert!(host.faults().is_empty(), "{:?}", host.faults());
        assert_eq!(out[[0, 2, 2]], 2.0);
        assert_eq!(out[[1, 2, 2]], 1.0);
        assert_eq!(out[[2, 2, 2]], -1.0);
    }

    #[test]
    fn test_stale_targets_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.rpn");
        std::fs::write(&path, "(Rs,@Rt)\n(Gs,@Gt)\n(Bs,@Bt)\n").unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        let input = frame(5);
        host.call(HostInput::Frame(input.clone()));
        std::fs::write(&path, "(Rs,2,*,@Rt)\n").unwrap();
        // one target only: the frame passes through unchanged
        assert_eq!(host.call(HostInput::Frame(input.clone())), HostOutput::Frame(input));
    }

    #[test]
    fn test_mismatched_targets_pass_through() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("capture.rpn"),
            "(Rs,@Rt)\n(Gs,@Gt)\n([[1,2]],@Bt)\n",
        )
        .unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        let input = frame(5);
        assert_eq!(host.call(HostInput::Frame(input.clone())), HostOutput::Frame(input));
    }

    #[test]
    fn test_print_only_when_program_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.rpn");
        std::fs::write(&path, "\"hello\n").unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        host.call(HostInput::Frame(frame(3)));
        assert!(host.engine().first());
        host.call(HostInput::Frame(frame(3)));
        assert!(!host.engine().first());
        std::fs::write(&path, "\"changed\n").unwrap();
        host.call(HostInput::Frame(frame(3)));
        assert!(host.engine().first());
    }

    #[test]
    fn test_diffraction_sets_margin_and_crops() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("capture.rpn"),
            "(Rs,7e-3,diffract,@Rt)\n(Gs,7e-3,diffract,@Gt)\n(Bs,7e-3,diffract,@Bt)\n",
        )
        .unwrap();
        let mut host = host_in(dir.path(), "capture", true);
        let HostOutput::Frame(out) = host.call(HostInput::Frame(frame(31))) else {
            panic!("expected a frame");
        };
        let HostOutput::Margin(dx, dy) = host.call(HostInput::SizeQuery) else {
            panic!("expected a margin");
        };
        assert!(dx > 0 && dx == dy);
        assert_eq!(out.dim(), (3, 31 - 2 * dx, 31 - 2 * dy));
    }

    #[test]
    fn test_two_dimensional_frame_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = host_in(dir.path(), "capture", false);
        let input = Array3::<f64>::zeros((1, 4, 4));
        assert_eq!(host.call(HostInput::Frame(input.clone())), HostOutput::Frame(input));
    }
}
