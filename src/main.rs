mod cli;

use anyhow::Context;
use aws_config::SdkConfig;
use cli::{Cli, Command};
use cms_stack::adapters::outbound::aws::{
    load_sdk_config, CloudFormationDeployer, Route53HostedZoneLookup,
};
use cms_stack::adapters::outbound::console::StderrProgressReporter;
use cms_stack::adapters::outbound::filesystem::StdoutPresenter;
use cms_stack::adapters::outbound::StaticHostedZoneLookup;
use cms_stack::application::dto::{DeployOutcome, DeployRequest, SynthRequest};
use cms_stack::application::factories::{FormatterFactory, PresenterFactory, PresenterType};
use cms_stack::application::use_cases::{DeployStackUseCase, SynthesizeStackUseCase};
use cms_stack::config::resolve_context;
use cms_stack::ports::outbound::{HostedZoneLookup, OutputPresenter};
use cms_stack::provisioning::domain::{DatabaseConnectionConfig, DeploymentContext};
use cms_stack::shared::error::{ExitCode, StackError};
use cms_stack::shared::Result;
use std::collections::HashMap;
use std::process;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let result = tokio::select! {
        result = run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\n⚠️  Interrupted. A submitted stack operation keeps running in CloudFormation.");
            process::exit(ExitCode::ApplicationError.as_i32());
        }
    };

    if let Err(e) = result {
        eprintln!("\n❌ An error occurred:\n");
        eprintln!("{}", e);

        for cause in e.chain().skip(1) {
            eprintln!("\nCaused by: {}", cause);
        }

        eprintln!();
        let exit_code = e
            .downcast_ref::<StackError>()
            .map(StackError::exit_code)
            .unwrap_or(ExitCode::ApplicationError);
        process::exit(exit_code.as_i32());
    }
}

/// Diagnostics go to stderr; stdout is reserved for the template.
fn init_tracing(verbose: bool) {
    let default_directive = if verbose { "cms_stack=debug" } else { "cms_stack=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directive.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let Cli {
        context: context_path,
        overrides,
        command,
        ..
    } = cli;
    let load_context = || -> Result<DeploymentContext> {
        let cwd = std::env::current_dir().context("Failed to read the current directory")?;
        resolve_context(context_path.as_deref(), &cwd, &overrides)
    };

    match command {
        Command::Synth {
            format,
            output,
            no_lookups,
        } => {
            let context = load_context()?;
            let lookup = hosted_zone_lookup(&context, no_lookups, None).await?;
            let use_case = SynthesizeStackUseCase::new(lookup, StderrProgressReporter::new());
            let response = use_case.execute(SynthRequest::new(context)).await?;

            eprintln!("{}", FormatterFactory::progress_message(format));
            let rendered = FormatterFactory::create(format).format(&response.template)?;
            PresenterFactory::create(PresenterType::from(output)).present(&rendered)?;
        }
        Command::Deploy {
            stack_name,
            region,
            poll_interval,
            no_lookups,
        } => {
            let context = load_context()?;
            let sdk_config = load_sdk_config(region.as_deref()).await;
            let lookup = hosted_zone_lookup(&context, no_lookups, Some(&sdk_config)).await?;
            let request = DeployRequest::new(
                context,
                stack_name,
                Duration::from_secs(poll_interval),
            )?;

            let use_case = DeployStackUseCase::new(
                lookup,
                CloudFormationDeployer::new(&sdk_config),
                StderrProgressReporter::new(),
            );
            let response = use_case.execute(request).await?;
            tracing::info!(
                stack = %response.stack_name,
                unchanged = response.outcome == DeployOutcome::Unchanged,
                "deploy finished"
            );
        }
        Command::DbConfig => {
            let env: HashMap<String, String> = std::env::vars().collect();
            let config = DatabaseConnectionConfig::from_env(&env)?;
            let rendered = serde_json::to_string_pretty(&config.to_redacted_json())
                .context("Failed to render database configuration")?;
            StdoutPresenter::new().present(&rendered)?;
        }
    }

    Ok(())
}

/// Picks the zone source: a configured `hostedZoneId` wins over a Route 53
/// lookup, and `--no-lookups` requires one.
async fn hosted_zone_lookup(
    context: &DeploymentContext,
    no_lookups: bool,
    sdk_config: Option<&SdkConfig>,
) -> Result<Box<dyn HostedZoneLookup>> {
    if let Some(zone_id) = &context.hosted_zone_id {
        return Ok(Box::new(StaticHostedZoneLookup::new(zone_id.clone())));
    }
    if no_lookups {
        return Err(StackError::MissingContext {
            key: "hostedZoneId".to_string(),
        }
        .into());
    }
    let config = match sdk_config {
        Some(config) => config.clone(),
        None => load_sdk_config(None).await,
    };
    Ok(Box::new(Route53HostedZoneLookup::new(&config)))
}
