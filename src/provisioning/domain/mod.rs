pub mod cidr;
pub mod context;
pub mod environment;
pub mod hosted_zone;

pub use cidr::{IpCidr, Ipv4Cidr, Ipv6Cidr};
pub use context::{
    ApplicationName, DatabaseSettings, DeploymentContext, DomainName, NetworkSettings,
    ServiceSettings,
};
pub use environment::{DatabaseConnectionConfig, DatabaseCredentials};
pub use hosted_zone::HostedZone;
