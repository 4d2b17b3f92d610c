//! piglit-compress - inspect and convert compressed piglit results
//!
//! Resolves the active compression mode the same way a piglit run does
//! (`PIGLIT_COMPRESSION`, then `[core] compression` in `piglit.conf`, then the
//! built-in default) and converts result files between modes.

mod display;
mod json_output;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use piglit_backends::{FileBackend, JsonBackend, TextBackend, TESTS_DIR};
use piglit_compression::{resolve_mode, Compression, CompressionRegistry, ModeInputs};
use piglit_config::{ConfigLoader, PiglitConfig};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};

/// piglit-compress - inspect and convert compressed piglit results
#[derive(Parser)]
#[command(
    name = "piglit-compress",
    version = env!("CARGO_PKG_VERSION"),
    about = "Inspect and convert compressed piglit results",
    long_about = "piglit-compress resolves the compression mode used for piglit result files\n\
                  and compresses, decompresses or combines results with it."
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Quiet mode - errors only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Configuration file path (defaults to the piglit.conf search path)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active compression mode and where it came from
    Mode {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// List registered compression modes
    Modes {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Compress a file
    Compress {
        /// Input file
        input: PathBuf,
        /// Output file (defaults to the input plus the mode suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Mode to use instead of the active one
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// Decompress a file
    Decompress {
        /// Input file
        input: PathBuf,
        /// Output file (defaults to the input without its mode suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Mode to use instead of detecting it from the suffix
        #[arg(short, long)]
        mode: Option<String>,
    },
    /// Combine per-test files in a results directory into the results file
    Combine {
        /// Results directory
        dir: PathBuf,
        /// Per-test file format
        #[arg(short, long, value_enum, default_value = "text")]
        format: FormatArg,
        /// Mode to use instead of the active one
        #[arg(short, long)]
        mode: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(err) = init_logging(cli.debug, cli.quiet) {
        display::display_error(&err);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            display::display_error(&err);
            ExitCode::from(exit_status(&err))
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    info!("piglit-compress v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ConfigLoader::load(cli.config.as_deref()).context("failed to load configuration")?;
    let registry = Arc::new(CompressionRegistry::with_builtin());

    match cli.command {
        Commands::Mode { json } => mode_command(&registry, &config, json),
        Commands::Modes { json } => modes_command(&registry, &config, json),
        Commands::Compress {
            input,
            output,
            mode,
        } => {
            let compression = select_compression(&registry, &config, mode.as_deref())?;
            compress_command(&compression, &input, output)
        }
        Commands::Decompress {
            input,
            output,
            mode,
        } => decompress_command(&registry, &input, output, mode.as_deref()),
        Commands::Combine { dir, format, mode } => {
            let compression = select_compression(&registry, &config, mode.as_deref())?;
            combine_command(compression, dir, format)
        }
    }
}

fn init_logging(debug: bool, quiet: bool) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(level))?;

    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialize logging: {e}"))?;

    Ok(())
}

/// Critical errors (an unusable configured mode) exit with 2, everything else with 1
fn exit_status(err: &anyhow::Error) -> u8 {
    let fatal = err
        .chain()
        .filter_map(|e| e.downcast_ref::<piglit_types::Error>())
        .any(piglit_types::Error::is_fatal);
    if fatal {
        2
    } else {
        1
    }
}

fn select_compression(
    registry: &Arc<CompressionRegistry>,
    config: &PiglitConfig,
    mode: Option<&str>,
) -> Result<Compression> {
    let compression = match mode {
        Some(mode) => Compression::new(Arc::clone(registry), mode)?,
        None => Compression::from_process(Arc::clone(registry), config)?,
    };
    Ok(compression)
}

fn mode_command(registry: &CompressionRegistry, config: &PiglitConfig, json: bool) -> Result<()> {
    let inputs = ModeInputs::from_process(config);
    let resolved = resolve_mode(registry, &inputs)?;

    if json {
        let output = json_output::ModeJson::new(&resolved, &inputs);
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        display::display_mode(&resolved);
    }
    Ok(())
}

fn modes_command(registry: &CompressionRegistry, config: &PiglitConfig, json: bool) -> Result<()> {
    if json {
        let entries = json_output::mode_entries(registry);
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    let active = match resolve_mode(registry, &ModeInputs::from_process(config)) {
        Ok(resolved) => Some(resolved.mode),
        Err(err) => {
            warn!("{}", err);
            None
        }
    };
    display::display_modes(registry.modes(), active.as_ref());
    Ok(())
}

fn compress_command(compression: &Compression, input: &Path, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| compression.final_path(input));
    if output == input {
        bail!(
            "mode '{}' adds no suffix; pass --output to avoid overwriting {}",
            compression.mode(),
            input.display()
        );
    }

    let mut source =
        File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let registry = compression.registry();
    registry
        .with_compressor(compression.mode().as_str(), &output, |writer| {
            io::copy(&mut source, writer)?;
            Ok(())
        })
        .with_context(|| format!("failed to compress {}", input.display()))?;

    let size = std::fs::metadata(&output)?.len();
    display::display_written("Compressed to", &output, size);
    Ok(())
}

fn decompress_command(
    registry: &CompressionRegistry,
    input: &Path,
    output: Option<PathBuf>,
    mode: Option<&str>,
) -> Result<()> {
    let mode = match mode {
        Some(mode) => registry.mode(mode)?.clone(),
        None => registry.mode_for_path(input),
    };
    let output = match output {
        Some(output) => output,
        None => default_decompress_output(input, mode.suffix().as_deref())?,
    };

    let mut reader = registry
        .open_read(mode.as_str(), input)
        .with_context(|| format!("failed to open {}", input.display()))?;
    let mut writer = BufWriter::new(
        File::create(&output).with_context(|| format!("failed to create {}", output.display()))?,
    );
    let bytes = io::copy(&mut reader, &mut writer)
        .with_context(|| format!("failed to decompress {}", input.display()))?;
    writer.flush()?;

    display::display_written("Decompressed to", &output, bytes);
    Ok(())
}

fn default_decompress_output(input: &Path, suffix: Option<&str>) -> Result<PathBuf> {
    let name = input.to_string_lossy();
    match suffix.and_then(|suffix| name.strip_suffix(suffix)) {
        Some(stripped) if !stripped.is_empty() => Ok(PathBuf::from(stripped)),
        _ => bail!(
            "cannot derive an output name for {}; pass --output",
            input.display()
        ),
    }
}

fn combine_command(compression: Compression, dir: PathBuf, format: FormatArg) -> Result<()> {
    if !dir.join(TESTS_DIR).is_dir() {
        bail!("{} has no {}/ directory to combine", dir.display(), TESTS_DIR);
    }

    let path = match format {
        FormatArg::Text => TextBackend::new(dir, compression).finalize()?,
        FormatArg::Json => JsonBackend::new(dir, compression).finalize()?,
    };

    let size = std::fs::metadata(&path)?.len();
    display::display_written("Combined into", &path, size);
    Ok(())
}
