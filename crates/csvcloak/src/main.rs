mod commands;
mod config;

use anyhow::Result;
use clap::{Arg, Command};
use std::{path::Path, str::FromStr};
use tracing::{subscriber::set_global_default, Level};

fn main() -> Result<()> {
    let matches = Command::new("csvcloak")
        .version("0.1.0")
        .about("Partitions CSV datasets into k-anonymous groups")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .takes_value(true)
                .default_value("./csvcloak.toml")
                .help("Path to the config file to use"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbosity")
                .takes_value(true)
                .default_value("INFO")
                .help("Sets the level of verbosity"),
        )
        .subcommand(
            Command::new("partition")
                .about("Writes the partition of every row as CSV (default)"),
        )
        .subcommand(
            Command::new("inspect").about("Prints kind and span of the configured columns"),
        )
        .get_matches();

    let tracing_level = Level::from_str(
        matches
            .value_of("verbosity")
            .expect("Missing value for 'verbosity' argument"),
    )?;

    let collector = tracing_subscriber::fmt()
        .with_max_level(tracing_level)
        .with_writer(std::io::stderr)
        .finish();

    set_global_default(collector)?;

    let config_file_path = Path::new(
        matches
            .value_of("config")
            .expect("Missing value for 'config' argument"),
    );

    let config_file_path = std::env::current_dir()?.join(config_file_path);

    match matches.subcommand() {
        Some(("inspect", _)) => commands::inspect::execute(&config_file_path),
        _ => commands::default::execute(&config_file_path),
    }
}
