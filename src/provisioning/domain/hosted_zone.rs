use super::context::DomainName;
use crate::shared::error::StackError;
use crate::shared::Result;

/// A pre-existing public Route 53 hosted zone
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedZone {
    id: String,
    name: DomainName,
}

impl HostedZone {
    /// Creates a hosted zone reference.
    ///
    /// Accepts both the bare ID (`Z0123ABC`) and the API form
    /// (`/hostedzone/Z0123ABC`).
    pub fn new(id: &str, name: DomainName) -> Result<Self> {
        let id = id.trim().trim_start_matches("/hostedzone/");
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(StackError::InvalidContext {
                key: "hostedZoneId".to_string(),
                reason: format!("'{}' is not a Route 53 hosted zone ID", id),
            }
            .into());
        }
        Ok(Self {
            id: id.to_string(),
            name,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &DomainName {
        &self.name
    }
}
