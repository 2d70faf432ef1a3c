//! ocular: stack-based instruction engine for live optical filtering
//!
//! Programs are sequences of short RPN instructions dispatched through an
//! ordered grammar; the host integration point runs a program once per
//! captured frame and returns the diffracted color planes.

pub mod config;
pub mod engine;
pub mod error;
pub mod grammar;
pub mod host;
pub mod numeric;
pub mod optics;
pub mod registry;
pub mod repl;
pub mod stack;
pub mod symbol;
pub mod value;

pub use config::Config;
pub use engine::{Engine, Fault, Report};
pub use error::{EngineError, ErrorKind, Result};
pub use host::{Host, HostInput, HostOutput};
pub use value::Value;
