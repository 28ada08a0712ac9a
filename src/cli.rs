use clap::{Parser, Subcommand};
use std::path::PathBuf;

use cms_stack::application::dto::OutputFormat;
use cms_stack::config::ContextOverride;

/// Synthesize and deploy the AWS stack hosting a Strapi CMS
#[derive(Parser, Debug)]
#[command(name = "cms-stack")]
#[command(version)]
#[command(about = "Synthesize and deploy the AWS stack hosting a Strapi CMS", long_about = None)]
pub struct Cli {
    /// Path to the context file (defaults to ./cms-stack.context.yml when present)
    #[arg(long, global = true, value_name = "PATH")]
    pub context: Option<PathBuf>,

    /// Override a context value, e.g. -c applicationName=acme
    /// Can be specified multiple times; lists are comma-separated
    #[arg(short = 'c', long = "set", global = true, value_name = "KEY=VALUE")]
    pub overrides: Vec<ContextOverride>,

    /// Enable debug logging (RUST_LOG takes precedence when set)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the CloudFormation template
    Synth {
        /// Output format: json or yaml
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,

        /// Output file path (if not specified, outputs to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not call Route 53; requires hostedZoneId in the context
        #[arg(long)]
        no_lookups: bool,
    },

    /// Create or update the stack and wait for it to settle
    Deploy {
        /// Stack name (defaults to <ApplicationName>Stack)
        #[arg(long)]
        stack_name: Option<String>,

        /// AWS region (defaults to the SDK region chain)
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,

        /// Seconds between two status polls
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u64).range(1..=300))]
        poll_interval: u64,

        /// Do not call Route 53; requires hostedZoneId in the context
        #[arg(long)]
        no_lookups: bool,
    },

    /// Print the database connection resolved from the environment (password redacted)
    DbConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
