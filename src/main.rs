use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};
use thiserror::Error;

use talsim_sos_bridge::config::{Config, ConfigError};
use talsim_sos_bridge::document::SimulationDocument;
use talsim_sos_bridge::extract::ParameterExtractor;
use talsim_sos_bridge::logging::{self, LogLevel, Stage};
use talsim_sos_bridge::model::ConversionError;
use talsim_sos_bridge::request;
use talsim_sos_bridge::submit::{SubmissionError, Submitter};
use talsim_sos_bridge::transport::{ReqwestTransport, TransportError};

/// Publish a Talsim simulation result to a transactional SOS
#[derive(Debug, Parser)]
#[command(name = "talsim-sos", version)]
struct Cli {
    /// Minimum level written to the console and log file
    #[arg(long, global = true, default_value = "info", value_name = "LEVEL")]
    log_level: LogLevel,

    /// Also append log output to this file
    #[arg(long, global = true, value_name = "PATH")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register the sensor and insert every observation
    Submit(SubmitArgs),
    /// Write all requests to disk without contacting the service
    Render(RenderArgs),
}

#[derive(Debug, Args)]
struct InputArgs {
    /// TalsimResult XML file
    #[arg(short, long, value_name = "PATH")]
    input: PathBuf,

    /// TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: PathBuf,
}

#[derive(Debug, Args)]
struct SubmitArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Override [service] url from the configuration
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Write the JSON run report here instead of stdout
    #[arg(long, value_name = "PATH")]
    report: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct RenderArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Directory receiving insert_sensor.xml and series_<i>_event_<j>.xml
    #[arg(short, long, value_name = "DIR")]
    out_dir: PathBuf,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("cannot access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot serialize run report: {0}")]
    Report(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> CliError + '_ {
    move |source| CliError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn main() {
    let cli = Cli::parse();

    let log_file = cli.log_file.as_ref().and_then(|p| p.to_str());
    if let Err(e) = logging::init_logger(cli.log_level, log_file, true) {
        eprintln!("Failed to open log file: {}", e);
        process::exit(1);
    }

    let result = match &cli.command {
        Command::Submit(args) => submit(args),
        Command::Render(args) => render(args),
    };

    if let Err(error) = result {
        logging::error(Stage::System, None, &error.to_string());
        process::exit(1);
    }
}

fn load_document(path: &Path) -> Result<SimulationDocument, CliError> {
    let xml = fs::read_to_string(path).map_err(io_error(path))?;
    let doc = SimulationDocument::parse(&xml)?;
    logging::info(
        Stage::Document,
        None,
        &format!("Parsed {} ({} series)", path.display(), doc.series().len()),
    );
    Ok(doc)
}

fn submit(args: &SubmitArgs) -> Result<(), CliError> {
    let config = Config::load(&args.input.config)?;
    let templates = config.load_templates()?;
    let token = config.resolve_token()?;
    let doc = load_document(&args.input.input)?;

    let url = args.url.clone().unwrap_or_else(|| config.service.url.clone());
    let transport = ReqwestTransport::new(config.service.timeout())?;
    let submitter = Submitter::new(
        transport,
        url,
        config.request_headers(token),
        templates,
        ParameterExtractor::new(config.constants.clone()),
    );

    let report = submitter.run(&doc)?;
    let json = serde_json::to_string_pretty(&report)?;
    match &args.report {
        Some(path) => fs::write(path, json).map_err(io_error(path))?,
        None => println!("{}", json),
    }
    Ok(())
}

fn render(args: &RenderArgs) -> Result<(), CliError> {
    let config = Config::load(&args.input.config)?;
    let templates = config.load_templates()?;
    let doc = load_document(&args.input.input)?;
    let extractor = ParameterExtractor::new(config.constants.clone());

    let out_dir = &args.out_dir;
    fs::create_dir_all(out_dir).map_err(io_error(out_dir))?;

    let sensor = request::build_sensor_request(&extractor, &doc, &templates.insert_sensor)?;
    write_request(&out_dir.join("insert_sensor.xml"), &sensor)?;

    let mut written = 1;
    for series in doc.series() {
        let requests = request::build_observation_requests_for_series(
            &extractor,
            &doc,
            &series,
            &templates.insert_observation,
        )?;
        for (event, body) in requests.iter().enumerate() {
            let name = format!("series_{}_event_{}.xml", series.index, event);
            write_request(&out_dir.join(name), body)?;
            written += 1;
        }
    }

    logging::info(
        Stage::System,
        None,
        &format!("Wrote {} requests to {}", written, out_dir.display()),
    );
    Ok(())
}

fn write_request(path: &Path, body: &str) -> Result<(), CliError> {
    fs::write(path, body).map_err(io_error(path))
}
