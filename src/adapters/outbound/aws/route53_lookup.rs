use crate::ports::outbound::HostedZoneLookup;
use crate::provisioning::domain::{DomainName, HostedZone};
use crate::shared::error::StackError;
use crate::shared::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_route53::error::DisplayErrorContext;
use aws_sdk_route53::Client;

/// ListHostedZonesByName returns zones in name order starting at the
/// requested name, so a small page is enough to find an exact match.
const LOOKUP_PAGE_SIZE: i32 = 10;

/// Route53HostedZoneLookup adapter resolving zones through the Route 53 API
pub struct Route53HostedZoneLookup {
    client: Client,
}

impl Route53HostedZoneLookup {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl HostedZoneLookup for Route53HostedZoneLookup {
    async fn find_public_zone(&self, domain: &DomainName) -> Result<HostedZone> {
        let dns_name = format!("{}.", domain);
        tracing::debug!(dns_name = %dns_name, "listing hosted zones by name");

        let response = self
            .client
            .list_hosted_zones_by_name()
            .dns_name(&dns_name)
            .max_items(LOOKUP_PAGE_SIZE)
            .send()
            .await
            .map_err(|e| StackError::HostedZoneNotFound {
                domain: domain.to_string(),
                details: format!("Route 53 lookup failed: {}", DisplayErrorContext(&e)),
            })?;

        let zone = response.hosted_zones().iter().find(|zone| {
            zone.name().eq_ignore_ascii_case(&dns_name)
                && !zone.config().map(|c| c.private_zone()).unwrap_or(false)
        });

        match zone {
            Some(zone) => {
                tracing::info!(zone_id = zone.id(), domain = %domain, "found hosted zone");
                HostedZone::new(zone.id(), domain.clone())
            }
            None => Err(StackError::HostedZoneNotFound {
                domain: domain.to_string(),
                details: "no public hosted zone with that exact name".to_string(),
            }
            .into()),
        }
    }
}
