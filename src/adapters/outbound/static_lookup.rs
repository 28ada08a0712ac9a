use crate::ports::outbound::HostedZoneLookup;
use crate::provisioning::domain::{DomainName, HostedZone};
use crate::shared::Result;
use async_trait::async_trait;

/// StaticHostedZoneLookup adapter for a zone ID known up front
///
/// Used when the context carries `hostedZoneId`, so synthesis needs no
/// AWS credentials.
pub struct StaticHostedZoneLookup {
    zone_id: String,
}

impl StaticHostedZoneLookup {
    pub fn new(zone_id: impl Into<String>) -> Self {
        Self {
            zone_id: zone_id.into(),
        }
    }
}

#[async_trait]
impl HostedZoneLookup for StaticHostedZoneLookup {
    async fn find_public_zone(&self, domain: &DomainName) -> Result<HostedZone> {
        tracing::debug!(zone_id = %self.zone_id, domain = %domain, "using configured hosted zone");
        HostedZone::new(&self.zone_id, domain.clone())
    }
}
