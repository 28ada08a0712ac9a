//! Provisioners: pure functions from props to declared resources.
//!
//! Each construct returns the logical IDs later constructs need alongside
//! its [`Resources`](crate::provisioning::template::Resources).

pub mod certificate;
pub mod container_service;
pub mod database;
pub mod dns_record;
pub mod network;

pub use certificate::{Certificate, CertificateProps};
pub use container_service::{ContainerService, ContainerServiceProps};
pub use database::{Database, DatabaseProps};
pub use dns_record::{DnsRecordProps, DnsRecords};
pub use network::{Network, NetworkProps, SubnetTier};
