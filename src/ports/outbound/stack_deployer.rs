use crate::shared::Result;
use async_trait::async_trait;

/// Which change was submitted to CloudFormation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOperation {
    Create,
    Update,
}

/// Snapshot of a stack as reported by `DescribeStacks`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackStatus {
    pub status: String,
    pub reason: Option<String>,
}

impl StackStatus {
    pub fn new(status: impl Into<String>, reason: Option<String>) -> Self {
        Self {
            status: status.into(),
            reason,
        }
    }

    /// `*_COMPLETE` or `*_FAILED`, excluding cleanup phases
    pub fn is_terminal(&self) -> bool {
        !self.status.ends_with("_IN_PROGRESS")
            && (self.status.ends_with("_COMPLETE") || self.status.ends_with("_FAILED"))
    }

    /// Terminal states that leave the requested template undeployed
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && (self.status.contains("ROLLBACK") || self.status.ends_with("_FAILED"))
    }
}

/// A stack output value after deployment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

/// StackDeployer port for creating or updating a CloudFormation stack
#[async_trait]
pub trait StackDeployer: Send + Sync {
    /// Submits the template, creating the stack if it does not exist.
    ///
    /// # Returns
    /// The submitted operation, or `None` when CloudFormation reports that
    /// there is nothing to update
    async fn submit(&self, stack_name: &str, template_body: &str) -> Result<Option<StackOperation>>;

    /// Reads the current status of the stack
    async fn describe(&self, stack_name: &str) -> Result<StackStatus>;

    /// Reads the stack outputs
    async fn outputs(&self, stack_name: &str) -> Result<Vec<StackOutput>>;

    /// Link to the stack in the provider console, when one can be built
    fn console_url(&self, _stack_name: &str) -> Option<String> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_statuses() {
        assert!(StackStatus::new("CREATE_COMPLETE", None).is_terminal());
        assert!(!StackStatus::new("CREATE_COMPLETE", None).is_failure());
        assert!(StackStatus::new("UPDATE_ROLLBACK_COMPLETE", None).is_failure());
        assert!(StackStatus::new("ROLLBACK_COMPLETE", None).is_failure());
        assert!(StackStatus::new("CREATE_FAILED", None).is_failure());
        assert!(!StackStatus::new("UPDATE_IN_PROGRESS", None).is_terminal());
        assert!(!StackStatus::new("UPDATE_COMPLETE_CLEANUP_IN_PROGRESS", None).is_terminal());
    }
}
