use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes let CI pipelines tell a rejected context apart from a
/// deployment that CloudFormation rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Template synthesized, or stack deployed / already up to date
    Success = 0,
    /// CloudFormation reported a failed or rolled back stack operation
    DeploymentFailed = 1,
    /// Invalid command-line arguments (clap parsing errors)
    InvalidArguments = 2,
    /// Configuration or application error (missing context, lookup failure, file I/O, ...)
    ApplicationError = 3,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::DeploymentFailed => write!(f, "Deployment Failed (1)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
        }
    }
}

/// Application-specific errors for stack synthesis and deployment.
#[derive(Debug, Error)]
pub enum StackError {
    #[error("Missing required context value: {key}\n\n💡 Hint: Set '{key}' in the context file or pass -c {key}=<value>")]
    MissingContext { key: String },

    #[error("Invalid context value for {key}: {reason}")]
    InvalidContext { key: String, reason: String },

    #[error("Invalid CIDR block '{value}': {reason}")]
    InvalidCidr { value: String, reason: String },

    #[error("Hosted zone not found for domain: {domain}\nDetails: {details}\n\n💡 Hint: The hosted zone must already exist. Create it in Route 53 or set 'hostedZoneId' in the context")]
    HostedZoneNotFound { domain: String, details: String },

    #[error("Failed to build template: {details}")]
    TemplateError { details: String },

    #[error("Stack {stack_name} ended in status {status}\nReason: {reason}\n\n💡 Hint: Inspect the stack events in the CloudFormation console for the failing resource")]
    DeploymentFailed {
        stack_name: String,
        status: String,
        reason: String,
    },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the directory exists and you have write permissions")]
    FileWriteError { path: PathBuf, details: String },
}

impl StackError {
    /// Maps an error to the process exit code reported by the CLI.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            StackError::DeploymentFailed { .. } => ExitCode::DeploymentFailed,
            _ => ExitCode::ApplicationError,
        }
    }
}
