use crate::provisioning::domain::{DeploymentContext, HostedZone};
use crate::provisioning::template::Template;

/// SynthRequest - request DTO for the synthesize use case
#[derive(Debug, Clone)]
pub struct SynthRequest {
    pub context: DeploymentContext,
}

impl SynthRequest {
    pub fn new(context: DeploymentContext) -> Self {
        Self { context }
    }
}

/// SynthResponse - the composed template and the zone it was built against
#[derive(Debug, Clone)]
pub struct SynthResponse {
    pub template: Template,
    pub hosted_zone: HostedZone,
}
