use crate::application::dto::{SynthRequest, SynthResponse};
use crate::ports::outbound::{HostedZoneLookup, ProgressReporter};
use crate::provisioning::services::StackComposer;
use crate::shared::Result;

/// SynthesizeStackUseCase - resolves the hosted zone and composes the template
///
/// # Type Parameters
/// * `HZ` - HostedZoneLookup implementation
/// * `PR` - ProgressReporter implementation
pub struct SynthesizeStackUseCase<HZ, PR> {
    hosted_zone_lookup: HZ,
    progress_reporter: PR,
}

impl<HZ, PR> SynthesizeStackUseCase<HZ, PR>
where
    HZ: HostedZoneLookup,
    PR: ProgressReporter,
{
    pub fn new(hosted_zone_lookup: HZ, progress_reporter: PR) -> Self {
        Self {
            hosted_zone_lookup,
            progress_reporter,
        }
    }

    pub(crate) fn progress_reporter(&self) -> &PR {
        &self.progress_reporter
    }

    /// Executes the synthesis
    ///
    /// # Errors
    /// Returns an error if the hosted zone cannot be found or the template
    /// cannot be composed
    pub async fn execute(&self, request: SynthRequest) -> Result<SynthResponse> {
        let context = &request.context;

        self.progress_reporter.report(&format!(
            "🔎 Looking up hosted zone: {}",
            context.hosted_zone_domain_name
        ));
        let hosted_zone = self
            .hosted_zone_lookup
            .find_public_zone(&context.hosted_zone_domain_name)
            .await?;
        self.progress_reporter
            .report(&format!("✅ Using hosted zone {}", hosted_zone.id()));

        if context.authorized_admin_cidrs.is_empty() {
            self.progress_reporter.report_error(
                "⚠️  Warning: authorizedIPsForAdminAccess is empty. Every request to the admin panel will be answered with 403.",
            );
        }

        self.progress_reporter.report(&format!(
            "🏗️  Composing stack for {} (https://{})",
            context.application_name, context.domain_name
        ));
        let template = StackComposer::compose(context, &hosted_zone)?;
        self.progress_reporter.report(&format!(
            "✅ Composed {} resource(s)",
            template.resources().len()
        ));

        Ok(SynthResponse {
            template,
            hosted_zone,
        })
    }
}

#[cfg(test)]
mod tests;
