/// Outbound adapters - Infrastructure implementations of outbound ports
pub mod aws;
pub mod console;
pub mod filesystem;
pub mod formatters;
mod static_lookup;

pub use static_lookup::StaticHostedZoneLookup;
