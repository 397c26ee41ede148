//! CLI argument parsing with clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_PATH;
use crate::session::SessionInput;

#[derive(Parser)]
#[command(name = "partneracl")]
#[command(author, version, about = "Partner whitelist manager for SAP Web Dispatcher and SAProuter")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH, global = true)]
    pub config: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug output)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Whitelist source IPs for a partner (prompts for anything missing)
    Add(AddArgs),

    /// Show partner blocks from both tables
    List {
        /// Only this certification id
        #[arg(long)]
        cert_id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check both tables for inconsistencies
    Check {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a SID from the router reference rows
    Lookup {
        /// System id, e.g. ABC
        sid: String,
    },

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show version
    Version,
}

#[derive(Args, Debug, Default)]
pub struct AddArgs {
    /// Partner certification id (digits)
    #[arg(long)]
    pub cert_id: Option<String>,

    /// Partner name, used only when the certification id is new
    #[arg(long)]
    pub partner_name: Option<String>,

    /// Source IP or CIDR (repeatable)
    #[arg(long = "ip", value_name = "IP")]
    pub ips: Vec<String>,

    /// SID to open a route to (repeatable)
    #[arg(long = "sid", value_name = "SID")]
    pub sids: Vec<String>,

    /// Employee id of the operator, e.g. D123456
    #[arg(long)]
    pub employee_id: Option<String>,

    /// Name of the person who requested the change
    #[arg(long)]
    pub requested_by: Option<String>,

    /// Partner contact email
    #[arg(long)]
    pub email: Option<String>,

    /// Only add router entries
    #[arg(long)]
    pub router_only: bool,

    /// Do not run the router reload command
    #[arg(long)]
    pub no_reload: bool,
}

impl From<AddArgs> for SessionInput {
    fn from(args: AddArgs) -> Self {
        Self {
            certification_id: args.cert_id,
            partner_name: args.partner_name,
            ips: args.ips,
            sids: args.sids,
            employee_id: args.employee_id,
            requested_by: args.requested_by,
            email: args.email,
            router_only: args.router_only,
            no_reload: args.no_reload,
        }
    }
}
