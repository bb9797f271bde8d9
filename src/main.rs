use clap::Parser;
use lineport::config::{Config, ConfigLoader, OutputFormat};
use lineport::engine::Port;
use lineport::error::{AppError, AppResult};
use lineport::monitor::{self, LinePrinter};
use lineport::port::SerialTransport;
use std::path::PathBuf;

// Command-line arguments
#[derive(Parser, Debug)]
#[command(
    version,
    about = "Watch a line-oriented serial device and print each CR/LF terminated line.",
    long_about = "Polls a serial device with a fixed time budget per tick, reconnects with backoff when the device drops, and prints every complete line it assembles."
)]
struct Args {
    /// Serial device path, e.g. /dev/ttyUSB0 or COM3. Overrides port.device.
    device: Option<String>,

    /// Baud rate. Overrides port.speed.
    #[arg(short, long)]
    baud: Option<u32>,

    /// Port name used in logs and JSON output.
    #[arg(short, long)]
    name: Option<String>,

    /// Time budget per poll, in milliseconds.
    #[arg(long)]
    budget_ms: Option<u64>,

    /// Pause between polls, in milliseconds.
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Configuration file. Defaults to the standard search path.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log every completed line at debug level.
    #[arg(long)]
    trace: bool,

    /// Print lines as JSON objects.
    #[arg(long)]
    json: bool,

    /// Exit after this many lines.
    #[arg(long)]
    max_lines: Option<u64>,
}

/// Load the file config, layer CLI flags on top, then validate the result.
fn load_config(args: &Args) -> AppResult<Config> {
    let mut config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)?.into_config(),
        None => ConfigLoader::load()?.into_config(),
    };

    if let Some(device) = &args.device {
        config.port.device = Some(device.clone());
    }
    if let Some(baud) = args.baud {
        config.port.speed = baud;
    }
    if let Some(name) = &args.name {
        config.port.name = name.clone();
    }
    if let Some(budget) = args.budget_ms {
        config.monitor.budget_ms = budget;
    }
    if let Some(tick) = args.tick_ms {
        config.monitor.tick_ms = tick;
    }
    if args.trace {
        config.port.trace = true;
    }
    if args.json {
        config.monitor.output = OutputFormat::Json;
    }

    config.validate()?;
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args)?;
    lineport::logging::init(&config.logging).map_err(AppError::from)?;

    let device = config.port.device.clone().ok_or(AppError::MissingDevice)?;
    let transport = SerialTransport::new(device, config.port.framing).with_read_timeout(config.port.read_timeout());

    let printer = LinePrinter::new(config.port.name.as_str(), config.monitor.output, std::io::stdout().lock());
    let mut port = Port::with_settings(&config.port.name, transport, config.port.settings());
    port.set_listener(&printer);

    let max_lines = args.max_lines;
    monitor::run(&mut port, &config.monitor, || match max_lines {
        Some(max) => printer.lines() < max,
        None => true,
    });

    Ok(())
}
