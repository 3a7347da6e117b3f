mod cli;
mod commands;
mod config;
mod error;
mod facts;
mod inventory;
mod output;
mod sqlite;
mod vcenter;

use clap::Parser;
use cli::{Cli, Commands};
use commands::{
    handle_facts_command,
    handle_module_command,
    handle_sqlite_command,
    module_invocation,
    run_module,
};
use facts::FactKind;
use output::print_error;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

fn main() {
    init_tracing();

    let argv: Vec<std::ffi::OsString> = std::env::args_os().collect();
    let result = match module_invocation(&argv) {
        Some((kind, args_file)) => run_module(kind, args_file.as_deref()),
        None => run_cli(Cli::parse()),
    };

    if let Err(e) = result {
        print_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run_cli(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Vm(args) => handle_facts_command(FactKind::Vm, args),
        Commands::Cluster(args) => handle_facts_command(FactKind::Cluster, args),
        Commands::Datastore(args) => handle_facts_command(FactKind::Datastore, args),
        Commands::DatastoreCluster(args) => handle_facts_command(FactKind::DatastoreCluster, args),
        Commands::Vlan(args) => handle_facts_command(FactKind::Vlan, args),
        Commands::Sqlite { path, table, format } => handle_sqlite_command(path, table, format),
        Commands::Module { kind, args_file } => handle_module_command(kind, args_file),
    }
}

// stdout carries only result documents
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
