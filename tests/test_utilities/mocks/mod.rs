/// Mock implementations for testing
mod mock_hosted_zone_lookup;
mod mock_progress_reporter;
mod mock_stack_deployer;

pub use mock_hosted_zone_lookup::MockHostedZoneLookup;
pub use mock_progress_reporter::MockProgressReporter;
pub use mock_stack_deployer::MockStackDeployer;
