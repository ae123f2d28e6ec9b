//! Memory-bus test harness CLI.
//!
//! This binary runs a manifest of test cases against a core model. It performs:
//! 1. **Parameters:** Positional bus parameters parsed strictly; a bad value exits with status 1.
//! 2. **Inputs:** Reads the manifest, then builds the scripted bus-functional model.
//! 3. **Run:** Drives every manifest case, optionally recording a VCD waveform.
//!
//! Fatal errors are printed as `ERROR: ...` on stderr and exit with the error's class status.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tbsim_core::config::parse_numeric;
use tbsim_core::core::{BfmScript, BusFunctionalModel};
use tbsim_core::sim::{VcdTracer, load_manifest};
use tbsim_core::{HarnessConfig, HarnessError, TestSequencer};

#[derive(Parser, Debug)]
#[command(
    name = "tbsim",
    author,
    version,
    about = "Cycle-accurate memory-bus test harness",
    long_about = "Run every test case of a manifest against a core model.\n\nEach manifest line is:\n  program reference ref_start ref_end dump dump_start dump_end\n\nExamples:\n  tbsim tests.lst 32 1048576 2 5 --core-script core.json\n  tbsim tests.lst 32 1048576 2 5 wave.vcd --core-script core.json --stats"
)]
struct Cli {
    /// Test manifest, one case per line.
    manifest: PathBuf,

    /// Bus word width in bits (8, 16, 32 or 64).
    #[arg(value_name = "MEM_W")]
    mem_w: String,

    /// Memory size in bytes.
    #[arg(value_name = "MEM_SZ")]
    mem_sz: String,

    /// Response latency in cycles.
    #[arg(value_name = "MEM_LATENCY")]
    mem_latency: String,

    /// Cycles simulated after the completion sentinel.
    #[arg(value_name = "EXTRA_CYCLES")]
    extra_cycles: String,

    /// Optional VCD waveform output.
    waveform: Option<PathBuf>,

    /// JSON script for the bus-functional core model.
    #[arg(long, value_name = "JSON")]
    core_script: PathBuf,

    /// Cycles the core is held in reset before each case.
    #[arg(long, value_name = "N")]
    reset_cycles: Option<String>,

    /// Abandon a case that has not completed after this many cycles.
    #[arg(long, value_name = "N")]
    cycle_limit: Option<String>,

    /// Print run statistics on exit.
    #[arg(long)]
    stats: bool,
}

impl Cli {
    /// Builds and validates the harness configuration from the raw arguments.
    fn config(&self) -> Result<HarnessConfig, HarnessError> {
        let mut config = HarnessConfig {
            mem_width: narrow("MEM_W", parse_numeric("MEM_W", &self.mem_w)?)?,
            mem_size: narrow("MEM_SZ", parse_numeric("MEM_SZ", &self.mem_sz)?)?,
            mem_latency: narrow(
                "MEM_LATENCY",
                parse_numeric("MEM_LATENCY", &self.mem_latency)?,
            )?,
            extra_cycles: parse_numeric("EXTRA_CYCLES", &self.extra_cycles)?,
            waveform: self.waveform.clone(),
            ..HarnessConfig::default()
        };
        if let Some(text) = &self.reset_cycles {
            config.reset_cycles = parse_numeric("RESET_CYCLES", text)?;
        }
        if let Some(text) = &self.cycle_limit {
            config.cycle_limit = Some(parse_numeric("CYCLE_LIMIT", text)?);
        }
        config.validate()?;
        Ok(config)
    }
}

fn narrow<T: TryFrom<u64>>(name: &'static str, value: u64) -> Result<T, HarnessError> {
    T::try_from(value).map_err(|_| HarnessError::Config {
        name,
        reason: format!("{value} is out of range"),
    })
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<(), HarnessError> {
    let config = cli.config()?;
    let cases = load_manifest(&cli.manifest)?;
    info!(path = %cli.manifest.display(), cases = cases.len(), "manifest loaded");
    let script = BfmScript::load(&cli.core_script)?;
    info!(
        ops = script.ops.len(),
        mem_w = config.mem_width,
        mem_sz = config.mem_size,
        latency = config.mem_latency,
        extra = config.extra_cycles,
        "configuration"
    );

    let mut sequencer = TestSequencer::new(BusFunctionalModel::new(script), config.clone())?;
    if let Some(path) = &config.waveform {
        sequencer = sequencer.with_tracer(Box::new(VcdTracer::create(path)?));
    }

    let summary = sequencer.run_cases(&cases)?;
    if cli.stats {
        sequencer.stats().print();
    }
    let _ = sequencer.finish()?;
    info!(
        completed = summary.completed().count(),
        skipped = summary.skipped(),
        "all test cases processed"
    );
    Ok(())
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let status = u8::from(e.use_stderr());
            let _ = e.print();
            return ExitCode::from(status);
        }
    };

    init_logging();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::from(u8::try_from(e.exit_code()).unwrap_or(1))
        }
    }
}
