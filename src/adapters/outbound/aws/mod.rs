//! AWS adapters backed by the official SDK.

mod cloudformation_deployer;
mod route53_lookup;

pub use cloudformation_deployer::CloudFormationDeployer;
pub use route53_lookup::Route53HostedZoneLookup;

use aws_config::meta::region::RegionProviderChain;
use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads the shared SDK configuration.
///
/// An explicit region wins; otherwise the default provider chain is used
/// (`AWS_REGION`, profile, instance metadata).
pub async fn load_sdk_config(region: Option<&str>) -> SdkConfig {
    let region_provider =
        RegionProviderChain::first_try(region.map(|r| Region::new(r.to_string())))
            .or_default_provider();
    let config = aws_config::defaults(BehaviorVersion::latest())
        .region(region_provider)
        .load()
        .await;
    tracing::debug!(region = ?config.region(), "loaded AWS configuration");
    config
}
