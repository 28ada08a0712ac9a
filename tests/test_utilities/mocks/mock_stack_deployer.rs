use async_trait::async_trait;
use cms_stack::ports::outbound::{StackOperation, StackOutput, StackStatus};
use cms_stack::prelude::*;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock StackDeployer replaying scripted statuses
#[derive(Clone)]
pub struct MockStackDeployer {
    operation: Option<StackOperation>,
    statuses: Arc<Mutex<VecDeque<StackStatus>>>,
    outputs: Vec<StackOutput>,
    pub submitted: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockStackDeployer {
    /// A deployer whose submission CloudFormation reports as a no-op
    pub fn unchanged() -> Self {
        Self::with_operation(None)
    }

    pub fn with_operation(operation: Option<StackOperation>) -> Self {
        Self {
            operation,
            statuses: Arc::new(Mutex::new(VecDeque::new())),
            outputs: Vec::new(),
            submitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn then_status(self, status: &str, reason: Option<&str>) -> Self {
        self.statuses
            .lock()
            .unwrap()
            .push_back(StackStatus::new(status, reason.map(str::to_string)));
        self
    }

    pub fn with_output(mut self, key: &str, value: &str) -> Self {
        self.outputs.push(StackOutput {
            key: key.to_string(),
            value: value.to_string(),
        });
        self
    }

    pub fn submitted_body(&self) -> Option<String> {
        self.submitted
            .lock()
            .unwrap()
            .last()
            .map(|(_, body)| body.clone())
    }
}

#[async_trait]
impl StackDeployer for MockStackDeployer {
    async fn submit(&self, stack_name: &str, template_body: &str) -> Result<Option<StackOperation>> {
        self.submitted
            .lock()
            .unwrap()
            .push((stack_name.to_string(), template_body.to_string()));
        Ok(self.operation)
    }

    async fn describe(&self, stack_name: &str) -> Result<StackStatus> {
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted status left for {}", stack_name))
    }

    async fn outputs(&self, _stack_name: &str) -> Result<Vec<StackOutput>> {
        Ok(self.outputs.clone())
    }

    fn console_url(&self, stack_name: &str) -> Option<String> {
        Some(format!("https://console.example/stacks/{}", stack_name))
    }
}
