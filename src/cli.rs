// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shopstack")]
#[command(about = "Provision per-tenant storefront stacks on Docker or Podman")]
#[command(version)]
pub struct Cli {
    /// Configuration file (default: shopstack.yml in the current directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the provisioning HTTP API
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },

    /// Provision one store and print its details
    Provision {
        /// Administrator email for the new store
        #[arg(long)]
        email: String,

        /// Administrator password for the new store
        #[arg(long)]
        password: String,

        /// Emit JSON lines instead of text
        #[arg(long, conflicts_with = "quiet")]
        json: bool,

        /// Print only the store URL
        #[arg(short, long)]
        quiet: bool,
    },

    /// Stop and remove a tenant's containers
    Teardown {
        /// Tenant id, e.g. tenant3
        tenant: String,
    },

    /// Write a shopstack.yml with default settings
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
