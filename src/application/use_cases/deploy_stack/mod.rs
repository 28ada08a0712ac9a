use super::synthesize_stack::SynthesizeStackUseCase;
use crate::application::dto::{DeployOutcome, DeployRequest, DeployResponse, SynthRequest};
use crate::application::factories::FormatterFactory;
use crate::ports::outbound::{
    HostedZoneLookup, ProgressReporter, StackDeployer, StackOperation, StackStatus,
};
use crate::shared::error::StackError;
use crate::shared::Result;

/// Largest template CloudFormation accepts inline as `TemplateBody`
pub const MAX_TEMPLATE_BODY_BYTES: usize = 51_200;

/// DeployStackUseCase - synthesizes the template, submits it and waits
/// for CloudFormation to settle
///
/// # Type Parameters
/// * `HZ` - HostedZoneLookup implementation
/// * `SD` - StackDeployer implementation
/// * `PR` - ProgressReporter implementation
pub struct DeployStackUseCase<HZ, SD, PR> {
    synthesizer: SynthesizeStackUseCase<HZ, PR>,
    stack_deployer: SD,
}

impl<HZ, SD, PR> DeployStackUseCase<HZ, SD, PR>
where
    HZ: HostedZoneLookup,
    SD: StackDeployer,
    PR: ProgressReporter,
{
    pub fn new(hosted_zone_lookup: HZ, stack_deployer: SD, progress_reporter: PR) -> Self {
        Self {
            synthesizer: SynthesizeStackUseCase::new(hosted_zone_lookup, progress_reporter),
            stack_deployer,
        }
    }

    fn reporter(&self) -> &PR {
        self.synthesizer.progress_reporter()
    }

    /// Executes the deployment
    ///
    /// # Returns
    /// The outcome and stack outputs. "Nothing to update" is a success with
    /// `DeployOutcome::Unchanged`.
    ///
    /// # Errors
    /// Returns `StackError::DeploymentFailed` if CloudFormation rejects the
    /// submission or the stack ends in a failed or rolled back state
    pub async fn execute(&self, request: DeployRequest) -> Result<DeployResponse> {
        let stack_name = request.stack_name.as_str();
        let synth = self
            .synthesizer
            .execute(SynthRequest::new(request.context.clone()))
            .await?;

        let body = FormatterFactory::for_deploy().format(&synth.template)?;
        if body.len() > MAX_TEMPLATE_BODY_BYTES {
            return Err(StackError::TemplateError {
                details: format!(
                    "template body is {} bytes, above the {} byte limit for inline templates",
                    body.len(),
                    MAX_TEMPLATE_BODY_BYTES
                ),
            }
            .into());
        }

        self.reporter()
            .report(&format!("🚀 Submitting stack {}", stack_name));
        tracing::info!(stack = stack_name, bytes = body.len(), "submitting template");

        let submitted = self
            .stack_deployer
            .submit(stack_name, &body)
            .await
            .map_err(|e| StackError::DeploymentFailed {
                stack_name: stack_name.to_string(),
                status: "REJECTED".to_string(),
                reason: format!("{:#}", e),
            })?;

        let console_url = self.stack_deployer.console_url(stack_name);
        if let Some(url) = &console_url {
            self.reporter().report(&format!("🔗 {}", url));
        }

        let (outcome, final_status) = match submitted {
            None => {
                self.reporter().report_completion(&format!(
                    "✅ Stack {} is already up to date",
                    stack_name
                ));
                (DeployOutcome::Unchanged, None)
            }
            Some(operation) => {
                let status = self.wait_for_terminal(&request).await?;
                if status.is_failure() {
                    self.reporter().report_error(&format!(
                        "❌ Stack {} ended in {}",
                        stack_name, status.status
                    ));
                    return Err(StackError::DeploymentFailed {
                        stack_name: stack_name.to_string(),
                        status: status.status,
                        reason: status
                            .reason
                            .unwrap_or_else(|| "no reason reported".to_string()),
                    }
                    .into());
                }
                self.reporter().report_completion(&format!(
                    "✅ Stack {} deployed: {}",
                    stack_name, status.status
                ));
                let outcome = match operation {
                    StackOperation::Create => DeployOutcome::Created,
                    StackOperation::Update => DeployOutcome::Updated,
                };
                (outcome, Some(status.status))
            }
        };

        let outputs = self.stack_deployer.outputs(stack_name).await?;
        for output in &outputs {
            self.reporter()
                .report(&format!("   {}: {}", output.key, output.value));
        }

        Ok(DeployResponse {
            stack_name: request.stack_name.clone(),
            outcome,
            final_status,
            outputs,
            console_url,
        })
    }

    /// Polls `describe` until the stack reaches a terminal status
    async fn wait_for_terminal(&self, request: &DeployRequest) -> Result<StackStatus> {
        let stack_name = request.stack_name.as_str();
        let mut last_status: Option<String> = None;

        loop {
            let status = self.stack_deployer.describe(stack_name).await?;

            if last_status.as_deref() != Some(status.status.as_str()) {
                tracing::info!(stack = stack_name, status = %status.status, "stack status changed");
                last_status = Some(status.status.clone());
            }
            self.reporter().report_status(&format!(
                "[{}] {} {}",
                chrono::Local::now().format("%H:%M:%S"),
                stack_name,
                status.status
            ));

            if status.is_terminal() {
                return Ok(status);
            }
            tokio::time::sleep(request.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests;
