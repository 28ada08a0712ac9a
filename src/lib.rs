//! cms-stack - CloudFormation stack for a Strapi CMS on AWS
//!
//! This library composes the network, database, certificate, container
//! service and DNS records that host a Strapi CMS into one CloudFormation
//! template, and deploys it. It follows hexagonal architecture and
//! Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`provisioning`): Template model, constructs and policies
//! - **Application Layer** (`application`): Use cases, DTOs and factories
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): AWS, filesystem and console implementations
//! - **Configuration** (`config`): Context file loading and overrides
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use cms_stack::prelude::*;
//!
//! # async fn run() -> Result<()> {
//! let context = DeploymentContext::new(
//!     ApplicationName::new("acme")?,
//!     DomainName::new("hostedZoneDomainName", "example.com")?,
//!     None,
//!     vec!["88.121.146.23/32".parse()?],
//!     "strapi/strapi:latest",
//! )?;
//!
//! let use_case = SynthesizeStackUseCase::new(
//!     StaticHostedZoneLookup::new("Z0123ABC"),
//!     StderrProgressReporter::new(),
//! );
//! let response = use_case.execute(SynthRequest::new(context)).await?;
//!
//! let output = JsonFormatter::new().format(&response.template)?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod config;
pub mod ports;
pub mod provisioning;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::aws::{CloudFormationDeployer, Route53HostedZoneLookup};
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
    pub use crate::adapters::outbound::formatters::{JsonFormatter, YamlFormatter};
    pub use crate::adapters::outbound::StaticHostedZoneLookup;
    pub use crate::application::dto::{
        DeployOutcome, DeployRequest, DeployResponse, OutputFormat, SynthRequest, SynthResponse,
    };
    pub use crate::application::use_cases::{DeployStackUseCase, SynthesizeStackUseCase};
    pub use crate::ports::outbound::{
        HostedZoneLookup, OutputPresenter, ProgressReporter, StackDeployer, TemplateFormatter,
    };
    pub use crate::provisioning::domain::{
        ApplicationName, DeploymentContext, DomainName, HostedZone, IpCidr,
    };
    pub use crate::provisioning::services::StackComposer;
    pub use crate::provisioning::template::Template;
    pub use crate::shared::Result;
}
