use crate::ports::outbound::StackOutput;
use crate::provisioning::domain::DeploymentContext;
use crate::shared::error::StackError;
use crate::shared::Result;
use std::time::Duration;

/// Longest stack name CloudFormation accepts
const MAX_STACK_NAME_LEN: usize = 128;

/// Default delay between two `DescribeStacks` calls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// DeployRequest - request DTO for the deploy use case
#[derive(Debug, Clone)]
pub struct DeployRequest {
    pub context: DeploymentContext,
    pub stack_name: String,
    pub poll_interval: Duration,
}

impl DeployRequest {
    /// Creates a deploy request.
    ///
    /// Without an explicit name the stack is called `<ApplicationName>Stack`
    /// (`acme` deploys `AcmeStack`).
    ///
    /// # Errors
    /// Returns `StackError::InvalidContext` if the name is not a valid
    /// CloudFormation stack name
    pub fn new(
        context: DeploymentContext,
        stack_name: Option<String>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let stack_name = stack_name
            .unwrap_or_else(|| format!("{}Stack", context.application_name.pascal_case()));
        validate_stack_name(&stack_name)?;
        Ok(Self {
            context,
            stack_name,
            poll_interval,
        })
    }
}

fn validate_stack_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = name.len() <= MAX_STACK_NAME_LEN
        && chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
    if !valid {
        return Err(StackError::InvalidContext {
            key: "stackName".to_string(),
            reason: format!(
                "'{}' must start with a letter, contain only letters, digits and hyphens, and be at most {} characters",
                name, MAX_STACK_NAME_LEN
            ),
        }
        .into());
    }
    Ok(())
}

/// What the deployment did to the stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    Created,
    Updated,
    /// CloudFormation found nothing to change
    Unchanged,
}

/// DeployResponse - result of a finished deployment
#[derive(Debug, Clone)]
pub struct DeployResponse {
    pub stack_name: String,
    pub outcome: DeployOutcome,
    pub final_status: Option<String>,
    pub outputs: Vec<StackOutput>,
    pub console_url: Option<String>,
}
