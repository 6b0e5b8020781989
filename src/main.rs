//! Cellgraph - a headless spreadsheet calculator

mod config;
mod error;

use anyhow::{Context, Result};
use cellgraph_core::Spreadsheet;
use error::CliError;
use std::env;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::EnvFilter;

fn print_usage() {
    eprintln!("Usage: cellgraph [OPTIONS] [FILE]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  [FILE]                    Spreadsheet file to open (.ss)");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --set <NAME=CONTENT>  Set a cell (can be repeated)");
    eprintln!("  --check <NAME=CONTENT>    Check whether an edit would be accepted (can be repeated)");
    eprintln!("  -o, --output <FILE>       Save the spreadsheet after all edits");
    eprintln!("  --version-tag <TAG>       Document version tag");
    eprintln!("  --config <FILE>           Load settings from this TOML file");
    eprintln!("  --no-config               Ignore the user config file");
    eprintln!("  -v, --verbose             Log debug output to stderr");
    eprintln!("  -h, --help                Print help");
}

/// One cell edit from the command line, applied in order.
#[derive(Debug, PartialEq, Eq)]
enum Edit {
    Set { name: String, content: String },
    Check { name: String, content: String },
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Options {
    help: bool,
    file: Option<PathBuf>,
    edits: Vec<Edit>,
    output: Option<PathBuf>,
    version_tag: Option<String>,
    config_file: Option<PathBuf>,
    no_config: bool,
    verbose: bool,
}

fn split_assignment(arg: &str) -> std::result::Result<(String, String), CliError> {
    match arg.split_once('=') {
        Some((name, content)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), content.to_string()))
        }
        _ => Err(CliError::InvalidAssignment(arg.to_string())),
    }
}

fn parse_args(args: &[String]) -> std::result::Result<Options, CliError> {
    let mut options = Options::default();

    let mut i = 1;
    while i < args.len() {
        let arg = args[i].as_str();
        let mut value = || {
            i += 1;
            args.get(i).cloned().ok_or_else(|| CliError::MissingValue {
                flag: arg.to_string(),
            })
        };
        match arg {
            "-h" | "--help" => {
                options.help = true;
                return Ok(options);
            }
            "-s" | "--set" => {
                let (name, content) = split_assignment(&value()?)?;
                options.edits.push(Edit::Set { name, content });
            }
            "--check" => {
                let (name, content) = split_assignment(&value()?)?;
                options.edits.push(Edit::Check { name, content });
            }
            "-o" | "--output" => options.output = Some(PathBuf::from(value()?)),
            "--version-tag" => options.version_tag = Some(value()?),
            "--config" => options.config_file = Some(PathBuf::from(value()?)),
            "--no-config" => options.no_config = true,
            "-v" | "--verbose" => options.verbose = true,
            arg if arg.starts_with('-') => return Err(CliError::UnknownOption(arg.to_string())),
            arg => {
                if options.file.is_some() {
                    return Err(CliError::UnexpectedArgument(arg.to_string()));
                }
                options.file = Some(PathBuf::from(arg));
            }
        }
        i += 1;
    }

    Ok(options)
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(options: Options) -> Result<()> {
    let (config, warnings) = if options.no_config {
        (config::Config::default(), Vec::new())
    } else {
        config::load_config(options.config_file.as_deref())
    };
    for warning in warnings {
        eprintln!("Warning: {}", warning);
    }

    let version = options
        .version_tag
        .unwrap_or_else(|| config.version().to_string());
    let rules = config.name_rules();
    debug!(version = %version, file = ?options.file, edits = options.edits.len(), "starting");

    let mut sheet = match &options.file {
        Some(path) if path.exists() => Spreadsheet::open(path, rules, &version)
            .with_context(|| format!("cannot open {}", path.display()))?,
        _ => Spreadsheet::with_rules(rules, version),
    };

    for edit in &options.edits {
        match edit {
            Edit::Set { name, content } => {
                let order = sheet
                    .set_contents(name, content)
                    .with_context(|| format!("cannot set {name}"))?;
                println!("{}: recalculated {}", order[0], order.join(", "));
            }
            Edit::Check { name, content } => match sheet.check_contents(name, content) {
                Ok(()) => println!("check {name}: ok"),
                Err(e) => println!("check {name}: {e}"),
            },
        }
    }

    if let Some(output) = &options.output {
        let written = sheet
            .save(output)
            .with_context(|| format!("cannot save {}", output.display()))?;
        println!("Saved to {}", written.display());
    }

    for name in sheet.non_empty_names() {
        let contents = sheet.get_contents(name)?;
        let value = sheet.get_value(name)?;
        println!("{name}\t{contents}\t{value}");
    }

    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();

    let options = match parse_args(&args) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("Error: {}", e);
            print_usage();
            std::process::exit(1);
        }
    };
    if options.help {
        print_usage();
        return;
    }

    init_logging(options.verbose);

    if let Err(e) = run(options) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
