use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{error, info};

use stash_dupes::config::{self, Config, StashConfig};
use stash_dupes::export::{default_file_name, export_report, ExportFormat};
use stash_dupes::stash::StashClient;
use stash_dupes::{find_duplicates, logging, Error, Strategy};

enum Command {
    Summary,
    Settings {
        endpoint: Option<String>,
        api_key: Option<String>,
    },
    Strategies,
    Duplicates {
        selector: String,
        format: ExportFormat,
        output: Option<PathBuf>,
    },
}

struct Cli {
    config_path: Option<PathBuf>,
    command: Command,
}

fn parse_args() -> Cli {
    let args: Vec<String> = std::env::args().collect();
    let mut config_path = None;
    let mut positional: Vec<String> = Vec::new();
    let mut endpoint = None;
    let mut api_key = None;
    let mut format = ExportFormat::default();
    let mut output = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("stash-dupes {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            "--config" | "-c" => {
                config_path = Some(PathBuf::from(require_value(&args, i)));
                i += 1;
            }
            "--endpoint" | "-e" => {
                endpoint = Some(require_value(&args, i).to_string());
                i += 1;
            }
            "--api-key" | "-k" => {
                api_key = Some(require_value(&args, i).to_string());
                i += 1;
            }
            "--format" | "-f" => {
                let value = require_value(&args, i);
                format = ExportFormat::parse(value).unwrap_or_else(|| {
                    eprintln!("Error: unknown format '{}' (expected text, json or csv)", value);
                    std::process::exit(2);
                });
                i += 1;
            }
            "--output" | "-o" => {
                output = Some(PathBuf::from(require_value(&args, i)));
                i += 1;
            }
            arg if arg.starts_with('-') => {
                eprintln!("Unknown argument: {}", arg);
                print_help();
                std::process::exit(2);
            }
            arg => positional.push(arg.to_string()),
        }
        i += 1;
    }

    let command = match positional.first().map(String::as_str) {
        None | Some("summary") => Command::Summary,
        Some("settings") => Command::Settings { endpoint, api_key },
        Some("strategies") => Command::Strategies,
        Some("duplicates") => match positional.get(1) {
            Some(selector) => Command::Duplicates {
                selector: selector.clone(),
                format,
                output,
            },
            None => {
                eprintln!("Error: duplicates requires a type (stashid, name, oshash, phash)");
                std::process::exit(2);
            }
        },
        Some(other) => {
            eprintln!("Unknown command: {}", other);
            print_help();
            std::process::exit(2);
        }
    };

    Cli {
        config_path,
        command,
    }
}

fn require_value(args: &[String], i: usize) -> &str {
    match args.get(i + 1) {
        Some(value) => value,
        None => {
            eprintln!("Error: {} requires a value", args[i]);
            std::process::exit(2);
        }
    }
}

fn print_help() {
    println!(
        r#"stash-dupes - find duplicate scenes in a Stash library

USAGE:
    stash-dupes [OPTIONS] [COMMAND]

COMMANDS:
    summary                     Show the number of scenes (default)
    settings                    Show the current Stash connection settings
    settings --endpoint URL [--api-key KEY]
                                Save the Stash connection settings
    strategies                  List duplicate types
    duplicates TYPE             List duplicate groups (stashid, name, oshash, phash)

OPTIONS:
    --config, -c PATH   Path to config file
    --format, -f FMT    Output format for duplicates: text, json, csv (default: text)
    --output, -o PATH   Write duplicates to a file instead of stdout
                        (a directory gets duplicates-TYPE.EXT)
    --version, -V       Show version
    --help, -h          Show this help message

ENVIRONMENT:
    STASH_DUPES_CONFIG  Path to config file (overrides default location)
    STASH_DUPES_LOG     Log level (trace, debug, info, warn, error)

Config file location: $XDG_CONFIG_HOME/stash-dupes/config.toml"#
    );
}

fn main() {
    let cli = parse_args();

    let _ = logging::init(None);

    if let Err(e) = run(cli) {
        let code = match e.downcast_ref::<Error>() {
            Some(Error::Unconfigured) => {
                eprintln!(
                    "Stash is not configured yet. Run `stash-dupes settings --endpoint URL` first."
                );
                2
            }
            Some(err) if err.is_usage() => {
                eprintln!("Error: {}", err);
                2
            }
            _ => {
                error!("{:#}", e);
                eprintln!("Error fetching data: {:#}", e);
                1
            }
        };
        std::process::exit(code);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path.unwrap_or_else(Config::config_path);
    let config = config::load(&config_path)?;

    match cli.command {
        Command::Summary => summary(&config),
        Command::Settings { endpoint: None, api_key: None } => {
            show_settings(&config, &config_path);
            Ok(())
        }
        Command::Settings { endpoint, api_key } => {
            update_settings(config, &config_path, endpoint, api_key)
        }
        Command::Strategies => {
            for strategy in Strategy::ALL {
                println!("{:<8} {}", strategy.slug(), strategy.label());
            }
            Ok(())
        }
        Command::Duplicates {
            selector,
            format,
            output,
        } => duplicates(&config, &selector, format, output),
    }
}

fn summary(config: &Config) -> Result<()> {
    let client = StashClient::new(config.require_stash()?);
    let catalog = client.fetch_scenes()?;

    println!("Stash: {}", client.endpoint());
    println!("Scenes: {}", catalog.count);
    println!();
    println!("Find duplicates with `stash-dupes duplicates TYPE`:");
    for strategy in Strategy::ALL {
        println!("  {:<8} {}", strategy.slug(), strategy.label());
    }
    Ok(())
}

fn show_settings(config: &Config, path: &std::path::Path) {
    println!("Config file: {}", path.display());
    println!("Endpoint:    {}", config.stash.endpoint);
    println!(
        "API key:     {}",
        if config.stash.api_key.is_some() { "(set)" } else { "(none)" }
    );
    if !config.stash.is_configured() {
        println!();
        println!("Not configured. Set the endpoint with `stash-dupes settings --endpoint URL`.");
    }
}

fn update_settings(
    mut config: Config,
    path: &std::path::Path,
    endpoint: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let endpoint = endpoint.unwrap_or_else(|| config.stash.endpoint.clone());
    // Keep the stored key unless a new one (possibly empty, to clear it) is given
    let api_key = api_key.or_else(|| config.stash.api_key.clone());
    config.stash = StashConfig::new(&endpoint, api_key.as_deref());

    config::save(path, &config)?;
    println!("Settings saved to {}", path.display());
    Ok(())
}

fn duplicates(
    config: &Config,
    selector: &str,
    format: ExportFormat,
    output: Option<PathBuf>,
) -> Result<()> {
    // Reject unknown types before touching the network
    let strategy: Strategy = selector.parse()?;
    let stash = config.require_stash()?;

    let catalog = StashClient::new(stash).fetch_scenes()?;
    let report = find_duplicates(&catalog.scenes, strategy);

    match output {
        Some(path) => {
            let path = if path.is_dir() {
                path.join(default_file_name(strategy, format))
            } else {
                path
            };
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            let mut writer = BufWriter::new(file);
            let written = export_report(&report, format, &mut writer)?;
            writer.flush()?;
            info!("Wrote {} groups to {:?}", report.group_count, path);
            println!(
                "Wrote {} groups ({} scenes) to {}",
                report.group_count,
                written,
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            let written = export_report(&report, format, &mut lock)?;
            lock.flush()?;
            info!("Printed {} grouped scenes", written);
        }
    }

    Ok(())
}
