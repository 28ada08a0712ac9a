use crate::provisioning::domain::{DomainName, HostedZone};
use crate::shared::Result;
use async_trait::async_trait;

/// HostedZoneLookup port for resolving an existing public hosted zone
///
/// The zone is never created by the stack; it has to exist before the
/// template can reference it for DNS validation and alias records.
#[async_trait]
pub trait HostedZoneLookup: Send + Sync {
    /// Finds the public hosted zone whose name is exactly `domain`
    ///
    /// # Errors
    /// Returns `StackError::HostedZoneNotFound` if no such zone exists or
    /// the lookup itself fails
    async fn find_public_zone(&self, domain: &DomainName) -> Result<HostedZone>;
}

#[async_trait]
impl<T: HostedZoneLookup + ?Sized> HostedZoneLookup for Box<T> {
    async fn find_public_zone(&self, domain: &DomainName) -> Result<HostedZone> {
        (**self).find_public_zone(domain).await
    }
}
