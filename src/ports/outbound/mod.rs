/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (AWS APIs, file system, console).
pub mod hosted_zone_lookup;
pub mod output_presenter;
pub mod progress_reporter;
pub mod stack_deployer;
pub mod template_formatter;

pub use hosted_zone_lookup::HostedZoneLookup;
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
pub use stack_deployer::{StackDeployer, StackOperation, StackOutput, StackStatus};
pub use template_formatter::TemplateFormatter;
