use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "vcenter-facts")]
#[command(about = "Collect vCenter inventory facts and SQLite rows for Ansible")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Collect virtual machine facts
    Vm(VcenterArgs),

    /// Collect host cluster facts
    Cluster(VcenterArgs),

    /// Collect datastore facts, largest first
    Datastore(VcenterArgs),

    /// Collect datastore cluster facts with member datastores
    DatastoreCluster(VcenterArgs),

    /// Collect the networks visible to each cluster
    Vlan(VcenterArgs),

    /// Fetch every row of a table from a local SQLite file
    Sqlite {
        /// Path to the SQLite database file
        #[arg(short, long)]
        path: PathBuf,

        /// Table to read
        #[arg(short, long)]
        table: String,

        /// Output format (json, yaml, or pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },

    /// Run as an Ansible binary module
    Module {
        /// Module kind (vm, cluster, datastore, datastore-cluster, vlan, sqlite)
        #[arg(short, long)]
        kind: String,

        /// JSON arguments file written by Ansible
        args_file: PathBuf,
    },
}

#[derive(Args)]
pub struct VcenterArgs {
    /// vCenter hostname or address
    #[arg(long, env = "VCENTER_HOST")]
    pub vcenter: Option<String>,

    /// Login user
    #[arg(short, long, env = "VCENTER_USERNAME")]
    pub username: Option<String>,

    /// Login password
    #[arg(short, long, env = "VCENTER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Skip TLS certificate verification
    #[arg(long, env = "VCENTER_DISABLE_SSL_VERIFICATION")]
    pub disable_ssl_verification: bool,

    /// Request timeout in seconds
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// YAML config file (defaults to the per-user config directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format (json, yaml, or pretty)
    #[arg(short, long, default_value = "pretty")]
    pub format: String,
}
