use crate::ports::outbound::{StackDeployer, StackOperation, StackOutput, StackStatus};
use crate::shared::Result;
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudformation::types::{Capability, Stack};
use aws_sdk_cloudformation::Client;
use uuid::Uuid;

const NO_UPDATES_MESSAGE: &str = "No updates are to be performed";

/// CloudFormationDeployer adapter creating and updating stacks through the
/// CloudFormation API
pub struct CloudFormationDeployer {
    client: Client,
    region: Option<String>,
}

impl CloudFormationDeployer {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
            region: config.region().map(|r| r.to_string()),
        }
    }

    /// Returns the stack, or `None` when CloudFormation reports it does not exist
    async fn find_stack(&self, stack_name: &str) -> Result<Option<Stack>> {
        match self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
        {
            Ok(response) => Ok(response.stacks().first().cloned()),
            Err(e) if e.message().is_some_and(|m| m.contains("does not exist")) => Ok(None),
            Err(e) => Err(anyhow::anyhow!(
                "DescribeStacks failed for {}: {}",
                stack_name,
                DisplayErrorContext(&e)
            )),
        }
    }

    async fn create(&self, stack_name: &str, template_body: &str) -> Result<StackOperation> {
        let token = Uuid::new_v4().to_string();
        tracing::info!(stack = stack_name, token = %token, "creating stack");
        self.client
            .create_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam)
            .client_request_token(token)
            .send()
            .await
            .map_err(|e| {
                anyhow::anyhow!(
                    "CreateStack failed for {}: {}",
                    stack_name,
                    DisplayErrorContext(&e)
                )
            })?;
        Ok(StackOperation::Create)
    }

    async fn update(&self, stack_name: &str, template_body: &str) -> Result<Option<StackOperation>> {
        let token = Uuid::new_v4().to_string();
        tracing::info!(stack = stack_name, token = %token, "updating stack");
        match self
            .client
            .update_stack()
            .stack_name(stack_name)
            .template_body(template_body)
            .capabilities(Capability::CapabilityIam)
            .client_request_token(token)
            .send()
            .await
        {
            Ok(_) => Ok(Some(StackOperation::Update)),
            Err(e) if e.message().is_some_and(|m| m.contains(NO_UPDATES_MESSAGE)) => {
                tracing::info!(stack = stack_name, "stack is already up to date");
                Ok(None)
            }
            Err(e) => Err(anyhow::anyhow!(
                "UpdateStack failed for {}: {}",
                stack_name,
                DisplayErrorContext(&e)
            )),
        }
    }
}

#[async_trait]
impl StackDeployer for CloudFormationDeployer {
    async fn submit(&self, stack_name: &str, template_body: &str) -> Result<Option<StackOperation>> {
        match self.find_stack(stack_name).await? {
            Some(_) => self.update(stack_name, template_body).await,
            None => self.create(stack_name, template_body).await.map(Some),
        }
    }

    async fn describe(&self, stack_name: &str) -> Result<StackStatus> {
        let stack = self
            .find_stack(stack_name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Stack {} does not exist", stack_name))?;
        let status = stack
            .stack_status()
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "UNKNOWN".to_string());
        Ok(StackStatus::new(
            status,
            stack.stack_status_reason().map(str::to_string),
        ))
    }

    async fn outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>> {
        let stack = self
            .find_stack(stack_name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Stack {} does not exist", stack_name))?;
        Ok(stack
            .outputs()
            .iter()
            .filter_map(|output| {
                Some(StackOutput {
                    key: output.output_key()?.to_string(),
                    value: output.output_value()?.to_string(),
                })
            })
            .collect())
    }

    fn console_url(&self, stack_name: &str) -> Option<String> {
        let region = self.region.as_deref()?;
        Some(format!(
            "https://{region}.console.aws.amazon.com/cloudformation/home?region={region}#/stacks?filteringText={}",
            urlencoding::encode(stack_name)
        ))
    }
}
