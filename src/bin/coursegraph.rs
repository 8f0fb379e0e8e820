//! Command-line interface for coursegraph
//!
//! Compiles a vault of authored curriculum documents into one JSON document
//! (`modules`, `courses`, `errors`) on stdout or into a file.
//!
//! Usage:
//!   coursegraph `<vault>` [--output `<file>`] [--check-urls]  - Compile a vault directory
//!   coursegraph --stdin-map                                   - Compile a {path: text} JSON map from stdin
//!
//! The exit code is 0 whenever the input was readable, even with a
//! non-empty `errors` array; callers decide publishability by inspecting
//! diagnostic severities themselves.

use clap::{Arg, ArgAction, Command};
use coursegraph::compile::config::{self, CoursegraphConfig};
use coursegraph::compile::diagnostics::Diagnostics;
use coursegraph::compile::{linkcheck, pipeline, vault};
use std::path::Path;
use std::process::exit;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("coursegraph")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Compile a curriculum vault into resolved JSON plus diagnostics")
        .arg_required_else_help(true)
        .arg(
            Arg::new("vault")
                .help("Path to the vault root directory")
                .required_unless_present("stdin-map")
                .index(1),
        )
        .arg(
            Arg::new("output")
                .long("output")
                .short('o')
                .help("Write the compiled JSON to this file instead of stdout"),
        )
        .arg(
            Arg::new("stdin-map")
                .long("stdin-map")
                .help("Read a {path: text} JSON object from stdin instead of walking a directory")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("check-urls")
                .long("check-urls")
                .help("Probe outbound URLs for reachability after compiling")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .help("TOML configuration file layered over the built-in defaults"),
        )
        .get_matches();

    let config = load_config(matches.get_one::<String>("config"));

    let mut vault_diags = Diagnostics::new();
    let files = if matches.get_flag("stdin-map") {
        vault::read_file_map(std::io::stdin()).unwrap_or_else(|err| {
            eprintln!("Input error: {}", err);
            exit(1);
        })
    } else {
        let root = matches
            .get_one::<String>("vault")
            .expect("vault is required unless reading stdin");
        vault::read_vault(Path::new(root), &config.vault.extension, &mut vault_diags)
            .unwrap_or_else(|err| {
                eprintln!("Input error: {}", err);
                exit(1);
            })
    };

    let (mut output, url_records) = pipeline::compile_with_diagnostics(&files, vault_diags);

    if matches.get_flag("check-urls") {
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|err| {
            eprintln!("Failed to start async runtime: {}", err);
            exit(1);
        });
        let warnings = runtime.block_on(async {
            let (tx, rx) = tokio::sync::watch::channel(false);
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    let _ = tx.send(true);
                }
            });
            linkcheck::check_urls(url_records, &config.linkcheck, rx).await
        });
        output.errors.extend(warnings);
    }

    let json = output.to_json();
    match matches.get_one::<String>("output") {
        Some(path) => {
            if let Err(err) = std::fs::write(path, &json) {
                eprintln!("Failed to write {}: {}", path, err);
                exit(1);
            }
        }
        None => print!("{}", json),
    }
}

fn load_config(path: Option<&String>) -> CoursegraphConfig {
    let loader = match path {
        Some(path) => config::Loader::new().with_file(path),
        None => config::Loader::new(),
    };
    loader.build().unwrap_or_else(|err| {
        eprintln!("Configuration error: {}", err);
        exit(1);
    })
}
