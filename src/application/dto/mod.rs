/// Data Transfer Objects for application layer
///
/// DTOs are used to transfer data between the application layer
/// and adapters, keeping the provisioning core isolated.
mod deploy;
mod output_format;
mod synth;

pub use deploy::{DeployOutcome, DeployRequest, DeployResponse, DEFAULT_POLL_INTERVAL};
pub use output_format::OutputFormat;
pub use synth::{SynthRequest, SynthResponse};
