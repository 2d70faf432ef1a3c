//! ocular CLI

use clap::{Parser, Subcommand};
use ndarray::{s, Array3, Axis};
use ocular::registry::Entry;
use ocular::{Config, Engine, Host, HostInput, HostOutput, Report};
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ocular", version, about = "Stack-based instruction engine for optical filtering")]
struct Cli {
    /// Configuration file (default: ./ocular.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging for the engine
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive calculator (the default)
    Repl,
    /// Interpret a program file
    Run {
        /// Program file
        file: PathBuf,
    },
    /// Drive the host with synthetic point-source frames
    Frame {
        /// Program run on every frame (overrides the configuration)
        #[arg(long)]
        program: Option<String>,
        /// Frame radius; frames are (3, 2N+1, 2N+1)
        #[arg(long, default_value_t = 32)]
        radius: usize,
        /// Number of frames
        #[arg(long, default_value_t = 1)]
        frames: usize,
    },
    /// Exercise every registry wrapper and a short command sequence
    Selftest,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = Config::load(cli.config.as_deref())
        .map_err(|e| -> Box<dyn std::error::Error> { Box::new(e) })
        .and_then(|config| match cli.command.unwrap_or(Command::Repl) {
            Command::Repl => repl(&config),
            Command::Run { file } => run_file(&config, &file),
            Command::Frame {
                program,
                radius,
                frames,
            } => frame(&config, program, radius, frames),
            Command::Selftest => selftest(&config),
        });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("info,ocular=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn repl(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new(config);
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        ocular::repl::Repl::new(engine)?.run()?;
    } else {
        ocular::repl::run_piped(&mut engine, stdin.lock())?;
    }
    Ok(())
}

fn run_file(config: &Config, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let mut engine = Engine::new(config);
    let report = engine.run_source(&path.display().to_string(), &text);
    finish(&report)
}

fn frame(
    config: &Config,
    program: Option<String>,
    radius: usize,
    frames: usize,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = config.clone();
    if let Some(program) = program {
        config.engine.program = program;
    }
    let mut host = Host::from_config(&config);
    let edge = 1 + 2 * radius;
    let mut source = Array3::<f64>::zeros((3, edge, edge));
    source.slice_mut(s![.., radius, radius]).fill(1.0);

    for n in 1..=frames {
        let HostOutput::Frame(out) = host.call(HostInput::Frame(source.clone())) else {
            return Err("host returned no frame".into());
        };
        let sums: Vec<String> = out.axis_iter(Axis(0)).map(|p| format!("{:.6}", p.sum())).collect();
        println!("frame {n}: shape {:?} sums [{}]", out.shape(), sums.join(", "));
        for fault in host.faults() {
            eprintln!("{fault}");
        }
    }
    if let HostOutput::Margin(x, y) = host.call(HostInput::SizeQuery) {
        println!("margin: ({x}, {y})");
    }
    Ok(())
}

fn selftest(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut engine = Engine::new(config);
    let mut failures = 0;
    let entries: Vec<(&'static str, Entry)> = engine.registry().iter().collect();
    for (name, entry) in entries {
        if matches!(entry, Entry::Builtin(..)) {
            continue;
        }
        for _ in 0..entry.arity() {
            engine.stack_mut().push(ndarray::Array2::<f64>::ones((2, 2)).into_dyn());
        }
        if let Err(e) = entry.invoke(&mut engine) {
            eprintln!("{name}: {e}");
            failures += 1;
        }
        engine.clear();
    }

    let report = engine.interpret("# A comment.\n4\nsqrt\nshow");
    failures += report.faults.len();
    for fault in &report.faults {
        eprintln!("{fault}");
    }
    if failures > 0 {
        return Err(format!("selftest: {failures} failure(s)").into());
    }
    println!("selftest: ok");
    Ok(())
}

fn finish(report: &Report) -> Result<(), Box<dyn std::error::Error>> {
    for fault in &report.faults {
        eprintln!("{fault}");
    }
    if report.is_clean() {
        Ok(())
    } else {
        Err(format!("{} instruction(s) failed", report.faults.len()).into())
    }
}
