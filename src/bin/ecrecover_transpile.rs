// Reads a zkASM ecrecover trace and prints the equivalent Rust test bodies.
// Output: stdout (or --output FILE). Logs go to stderr.

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use zkasm_vectors::block_scanner::scan_text;
use zkasm_vectors::test_emitter::{
    summarize_blocks, write_tests, AddressOrder, EmitOptions, OutputLayout, RecoveryIdPolicy,
};
use zkasm_vectors::vector_params::{DEFAULT_FUNCTION, DEFAULT_INPUT};
use zkasm_vectors::TranspileResult;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Layout {
    /// ecrecover(&sig, &hash, mode) with byte arrays
    Bytes,
    /// ecrecover(&hash, v, &r, &s, mode) with u64 limbs
    Limbs,
}

#[derive(Parser)]
#[command(name = "ecrecover_transpile")]
#[command(version)]
#[command(about = "Turn ecrecover zkASM test traces into Rust assertions")]
struct Cli {
    /// zkASM trace to read
    #[arg(default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Write generated code here instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the recovery function in the generated calls
    #[arg(long, default_value = DEFAULT_FUNCTION)]
    function: String,

    /// Argument layout of the generated calls
    #[arg(long, value_enum, default_value = "bytes")]
    layout: Layout,

    /// Emit the expected address byte-reversed
    #[arg(long)]
    reverse_address: bool,

    /// Reject recovery ids other than 27/28
    #[arg(long)]
    strict_recovery_id: bool,

    /// Print the extracted blocks instead of tests
    #[arg(long)]
    list_blocks: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn emit_options(&self) -> EmitOptions {
        EmitOptions {
            function_name: self.function.clone(),
            layout: match self.layout {
                Layout::Bytes => OutputLayout::Bytes,
                Layout::Limbs => OutputLayout::Limbs,
            },
            address_order: if self.reverse_address {
                AddressOrder::Reversed
            } else {
                AddressOrder::BigEndian
            },
            recovery_id: if self.strict_recovery_id {
                RecoveryIdPolicy::Strict
            } else {
                RecoveryIdPolicy::PassThrough
            },
        }
    }
}

fn run(cli: &Cli) -> TranspileResult<()> {
    let txt = fs::read_to_string(&cli.input)?;
    let blocks = scan_text(&txt);
    info!(input = %cli.input.display(), blocks = blocks.len(), "extracted test blocks");

    let mut sink: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(fs::File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    if cli.list_blocks {
        for row in summarize_blocks(&blocks)? {
            writeln!(sink, "{}", row)?;
        }
    } else {
        write_tests(&blocks, &cli.emit_options(), &mut sink)?;
    }
    sink.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        "zkasm_vectors=debug,ecrecover_transpile=debug,info"
    } else {
        "zkasm_vectors=info,ecrecover_transpile=info,warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
