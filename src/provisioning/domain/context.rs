use super::cidr::{IpCidr, Ipv4Cidr, DEFAULT_VPC_CIDR};
use crate::shared::error::StackError;
use crate::shared::Result;
use std::fmt;

/// Aurora master usernames are limited to 16 characters
const MAX_APPLICATION_NAME_LENGTH: usize = 16;

/// DNS names are limited to 253 characters
const MAX_DOMAIN_NAME_LENGTH: usize = 253;

const MAX_LABEL_LENGTH: usize = 63;

/// NewType wrapper for the application name.
///
/// The name doubles as the database name, the database master username, the
/// default DNS label and the prefix of every secret name, so it must satisfy
/// all of them at once: a lowercase letter followed by lowercase letters or
/// digits, at most 16 characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ApplicationName(String);

impl ApplicationName {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let reject = |reason: &str| -> anyhow::Error {
            StackError::InvalidContext {
                key: "applicationName".to_string(),
                reason: format!("'{}' {}", name, reason),
            }
            .into()
        };

        if name.is_empty() {
            return Err(reject("must not be empty"));
        }
        if name.len() > MAX_APPLICATION_NAME_LENGTH {
            return Err(reject(&format!(
                "is longer than {} characters",
                MAX_APPLICATION_NAME_LENGTH
            )));
        }
        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(reject("must start with a lowercase letter"));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(reject(
                "may only contain lowercase letters and digits (it is also the database name and master username)",
            ));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the generated database credentials secret
    pub fn database_secret_name(&self) -> String {
        format!("{}-credentials", self.0)
    }

    /// Name of the generated application (JWT signing) secret
    pub fn application_secret_name(&self) -> String {
        format!("{}-strapi-secret", self.0)
    }

    /// PascalCase form used as a logical ID prefix, e.g. `acme` -> `Acme`
    pub fn pascal_case(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
            None => String::new(),
        }
    }
}

impl fmt::Display for ApplicationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// NewType wrapper for a fully qualified domain name (lowercase, no trailing dot)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainName(String);

impl DomainName {
    pub fn new(key: &str, name: impl Into<String>) -> Result<Self> {
        let raw = name.into();
        let name = raw.trim().trim_end_matches('.').to_ascii_lowercase();
        let reject = |reason: &str| -> anyhow::Error {
            StackError::InvalidContext {
                key: key.to_string(),
                reason: format!("'{}' {}", raw, reason),
            }
            .into()
        };

        if name.is_empty() {
            return Err(reject("must not be empty"));
        }
        if name.len() > MAX_DOMAIN_NAME_LENGTH {
            return Err(reject("is too long for a DNS name"));
        }
        for label in name.split('.') {
            if label.is_empty() || label.len() > MAX_LABEL_LENGTH {
                return Err(reject("has an empty or over-long label"));
            }
            if label.starts_with('-') || label.ends_with('-') {
                return Err(reject("has a label starting or ending with '-'"));
            }
            if !label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(reject("contains characters not allowed in a DNS name"));
            }
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this name equals `zone` or is a subdomain of it
    pub fn is_within(&self, zone: &DomainName) -> bool {
        self.0 == zone.0 || self.0.ends_with(&format!(".{}", zone.0))
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Network layout settings
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkSettings {
    pub cidr: Ipv4Cidr,
    pub max_azs: u8,
    pub nat_gateways: u8,
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            cidr: DEFAULT_VPC_CIDR,
            max_azs: 2,
            nat_gateways: 1,
        }
    }
}

impl NetworkSettings {
    pub fn validate(&self) -> Result<()> {
        if !(1..=6).contains(&self.max_azs) {
            return Err(invalid_setting(
                "network.maxAzs",
                format!("{} is outside 1..=6", self.max_azs),
            ));
        }
        if self.nat_gateways == 0 || self.nat_gateways > self.max_azs {
            return Err(invalid_setting(
                "network.natGateways",
                format!(
                    "{} must be between 1 and network.maxAzs ({}); the private tier needs egress",
                    self.nat_gateways, self.max_azs
                ),
            ));
        }
        Ok(())
    }
}

/// Aurora Serverless v2 settings
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseSettings {
    pub engine_version: String,
    pub min_capacity: f64,
    pub max_capacity: f64,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine_version: "13.6".to_string(),
            min_capacity: 0.5,
            max_capacity: 1.0,
        }
    }
}

impl DatabaseSettings {
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("database.minCapacity", self.min_capacity),
            ("database.maxCapacity", self.max_capacity),
        ] {
            if !(0.5..=128.0).contains(&value) || (value * 2.0).fract() != 0.0 {
                return Err(invalid_setting(
                    key,
                    format!("{} must be between 0.5 and 128 in steps of 0.5", value),
                ));
            }
        }
        if self.min_capacity > self.max_capacity {
            return Err(invalid_setting(
                "database.minCapacity",
                format!(
                    "{} is greater than database.maxCapacity ({})",
                    self.min_capacity, self.max_capacity
                ),
            ));
        }
        if self.engine_version.trim().is_empty() {
            return Err(invalid_setting(
                "database.engineVersion",
                "must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Container service settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub cpu: u32,
    pub memory_mib: u32,
    pub desired_count: u32,
    pub min_tasks: u32,
    pub max_tasks: u32,
    pub target_cpu_utilization: u32,
    pub health_check_path: String,
    pub redirect_http: bool,
    pub database_ssl: Option<bool>,
    pub log_retention_days: u32,
    pub admin_path_patterns: Vec<String>,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            cpu: 256,
            memory_mib: 512,
            desired_count: 1,
            min_tasks: 1,
            max_tasks: 2,
            target_cpu_utilization: 50,
            health_check_path: "/".to_string(),
            redirect_http: false,
            database_ssl: None,
            log_retention_days: 30,
            admin_path_patterns: vec!["/admin/*".to_string()],
        }
    }
}

/// Retention values accepted by CloudWatch Logs
const LOG_RETENTION_DAYS: &[u32] = &[
    1, 3, 5, 7, 14, 30, 60, 90, 120, 150, 180, 365, 400, 545, 731, 1096, 1827, 2192, 2557, 2922,
    3288, 3653,
];

impl ServiceSettings {
    pub fn validate(&self) -> Result<()> {
        if !fargate_size_supported(self.cpu, self.memory_mib) {
            return Err(invalid_setting(
                "service.memory",
                format!(
                    "{} MiB is not a valid Fargate memory size for {} CPU units",
                    self.memory_mib, self.cpu
                ),
            ));
        }
        if self.min_tasks == 0 || self.min_tasks > self.max_tasks {
            return Err(invalid_setting(
                "service.minTasks",
                format!(
                    "{} must be at least 1 and not above service.maxTasks ({})",
                    self.min_tasks, self.max_tasks
                ),
            ));
        }
        if !(self.min_tasks..=self.max_tasks).contains(&self.desired_count) {
            return Err(invalid_setting(
                "service.desiredCount",
                format!(
                    "{} is outside service.minTasks..=service.maxTasks ({}..={})",
                    self.desired_count, self.min_tasks, self.max_tasks
                ),
            ));
        }
        if !(1..=100).contains(&self.target_cpu_utilization) {
            return Err(invalid_setting(
                "service.targetCpuUtilization",
                format!("{} is outside 1..=100", self.target_cpu_utilization),
            ));
        }
        if !self.health_check_path.starts_with('/') {
            return Err(invalid_setting(
                "service.healthCheckPath",
                format!("'{}' must start with '/'", self.health_check_path),
            ));
        }
        if !LOG_RETENTION_DAYS.contains(&self.log_retention_days) {
            return Err(invalid_setting(
                "service.logRetentionDays",
                format!(
                    "{} is not a CloudWatch Logs retention period",
                    self.log_retention_days
                ),
            ));
        }
        if self.admin_path_patterns.is_empty() || self.admin_path_patterns.len() > 4 {
            return Err(invalid_setting(
                "service.adminPathPatterns",
                "needs between 1 and 4 patterns (a listener rule holds at most 5 condition values)"
                    .to_string(),
            ));
        }
        if let Some(pattern) = self
            .admin_path_patterns
            .iter()
            .find(|p| !p.starts_with('/') || p.len() > 128)
        {
            return Err(invalid_setting(
                "service.adminPathPatterns",
                format!("'{}' must start with '/' and be at most 128 characters", pattern),
            ));
        }
        Ok(())
    }
}

/// Valid Fargate task sizes (CPU units -> memory MiB)
fn fargate_size_supported(cpu: u32, memory_mib: u32) -> bool {
    match cpu {
        256 => matches!(memory_mib, 512 | 1024 | 2048),
        512 => (1024..=4096).contains(&memory_mib) && memory_mib % 1024 == 0,
        1024 => (2048..=8192).contains(&memory_mib) && memory_mib % 1024 == 0,
        2048 => (4096..=16384).contains(&memory_mib) && memory_mib % 1024 == 0,
        4096 => (8192..=30720).contains(&memory_mib) && memory_mib % 1024 == 0,
        _ => false,
    }
}

fn invalid_setting(key: &str, reason: String) -> anyhow::Error {
    StackError::InvalidContext {
        key: key.to_string(),
        reason,
    }
    .into()
}

/// Fully validated deployment parameters
///
/// Built once from the context file and overrides; every construct reads
/// from it and nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DeploymentContext {
    pub application_name: ApplicationName,
    pub hosted_zone_domain_name: DomainName,
    pub domain_name: DomainName,
    pub authorized_admin_cidrs: Vec<IpCidr>,
    pub container_image: String,
    pub hosted_zone_id: Option<String>,
    pub network: NetworkSettings,
    pub database: DatabaseSettings,
    pub service: ServiceSettings,
}

impl DeploymentContext {
    /// Builds a context with default settings.
    ///
    /// When `domain_name` is `None` it is derived as
    /// `<applicationName>.<hostedZoneDomainName>`.
    pub fn new(
        application_name: ApplicationName,
        hosted_zone_domain_name: DomainName,
        domain_name: Option<DomainName>,
        authorized_admin_cidrs: Vec<IpCidr>,
        container_image: impl Into<String>,
    ) -> Result<Self> {
        let domain_name = match domain_name {
            Some(name) => name,
            None => DomainName::new(
                "domainName",
                format!("{}.{}", application_name, hosted_zone_domain_name),
            )?,
        };

        let context = Self {
            application_name,
            hosted_zone_domain_name,
            domain_name,
            authorized_admin_cidrs,
            container_image: container_image.into(),
            hosted_zone_id: None,
            network: NetworkSettings::default(),
            database: DatabaseSettings::default(),
            service: ServiceSettings::default(),
        };
        context.validate()?;
        Ok(context)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.domain_name.is_within(&self.hosted_zone_domain_name) {
            return Err(invalid_setting(
                "domainName",
                format!(
                    "'{}' is not inside the hosted zone '{}'",
                    self.domain_name, self.hosted_zone_domain_name
                ),
            ));
        }
        if self.container_image.trim().is_empty() {
            return Err(StackError::MissingContext {
                key: "containerImage".to_string(),
            }
            .into());
        }
        self.network.validate()?;
        self.database.validate()?;
        self.service.validate()?;
        Ok(())
    }
}
