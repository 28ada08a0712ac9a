/// Use cases module containing application logic orchestration
mod deploy_stack;
mod synthesize_stack;

pub use deploy_stack::{DeployStackUseCase, MAX_TEMPLATE_BODY_BYTES};
pub use synthesize_stack::SynthesizeStackUseCase;
