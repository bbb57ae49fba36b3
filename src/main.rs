use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use nvstatus::{
    DriverVersion, NvApi, NvApiConfig, NvApiSource, NvError, NvStatus, Offline, SessionSource,
    StatusChecker, VendorSession, known_statuses,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "nvstatus",
    version,
    about = "Describe and check NVIDIA NvAPI status codes"
)]
struct Cli {
    #[arg(
        long,
        global = true,
        help = "NvAPI library to load (overrides NVAPI_LIBRARY)"
    )]
    library: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        help = "Describe statuses from the built-in table instead of the driver"
    )]
    offline: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the description of a status code
    Describe {
        #[arg(allow_negative_numbers = true)]
        status: NvStatus,
    },
    /// Fail with a descriptive message unless the status is NVAPI_OK
    Check {
        #[arg(allow_negative_numbers = true)]
        status: NvStatus,
        #[arg(long, default_value = "")]
        context: String,
    },
    /// List the status codes known without a driver
    Codes,
    /// Print the NvAPI interface and driver versions
    Version,
}

#[derive(Debug, Serialize)]
struct StatusReport {
    code: NvStatus,
    name: Option<&'static str>,
    description: String,
}

#[derive(Debug, Serialize)]
struct VersionReport {
    interface: String,
    driver: DriverVersion,
    display: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.library {
        Some(path) => NvApiConfig::from_env().with_library(path),
        None => NvApiConfig::from_env(),
    };

    match cli.command {
        Commands::Codes => print_json(&known_statuses()),
        Commands::Version => {
            require_driver(cli.offline)?;
            print_version(&config)
        }
        command if cli.offline => run(Offline, command),
        command => run(NvApiSource::new(config), command),
    }
}

fn run<S: SessionSource>(source: S, command: Commands) -> Result<()> {
    match command {
        Commands::Describe { status } => print_json(&describe_status(&source, status)?),
        Commands::Check { status, context } => {
            println!("{}", check_status(source, status, &context)?);
            Ok(())
        }
        Commands::Codes | Commands::Version => unreachable!(),
    }
}

fn describe_status<S: SessionSource>(
    source: &S,
    status: NvStatus,
) -> Result<StatusReport, NvError> {
    let session = source.open()?;
    Ok(StatusReport {
        code: status,
        name: status.name(),
        description: session.describe(status)?,
    })
}

fn check_status<S: SessionSource>(
    source: S,
    status: NvStatus,
    context: &str,
) -> Result<&'static str, NvError> {
    StatusChecker::new(source).check(status, context)?;
    Ok("ok")
}

fn require_driver(offline: bool) -> Result<()> {
    if offline {
        bail!("driver versions are not available with --offline");
    }
    Ok(())
}

fn print_version(config: &NvApiConfig) -> Result<()> {
    let session = NvApi::open(config)?;
    let driver = session.driver_version()?;
    let report = VersionReport {
        interface: session.interface_version()?,
        display: driver.to_string(),
        driver,
    };
    print_json(&report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
