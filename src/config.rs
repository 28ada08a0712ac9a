//! Context file support for cms-stack.
//!
//! Deployment parameters come from a YAML `cms-stack.context.yml` file,
//! overridden by `-c key=value` pairs on the command line, and are validated
//! into a [`DeploymentContext`] before any resource is built.

use anyhow::Context;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::provisioning::domain::{
    ApplicationName, DeploymentContext, DomainName, IpCidr, Ipv4Cidr,
};
use crate::shared::error::StackError;
use crate::shared::security::{validate_file_size, validate_regular_file, MAX_CONTEXT_FILE_SIZE};
use crate::shared::Result;

pub const CONTEXT_FILENAME: &str = "cms-stack.context.yml";

/// Top-level context file schema.
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ContextFile {
    pub application_name: Option<String>,
    pub hosted_zone_domain_name: Option<String>,
    pub domain_name: Option<String>,
    #[serde(rename = "authorizedIPsForAdminAccess")]
    pub authorized_ips_for_admin_access: Option<Vec<String>>,
    pub container_image: Option<String>,
    pub hosted_zone_id: Option<String>,
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub database: DatabaseSection,
    #[serde(default)]
    pub service: ServiceSection,
    /// Captures unknown fields for warnings.
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NetworkSection {
    pub cidr: Option<String>,
    pub max_azs: Option<u8>,
    pub nat_gateways: Option<u8>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseSection {
    pub engine_version: Option<String>,
    pub min_capacity: Option<f64>,
    pub max_capacity: Option<f64>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSection {
    pub cpu: Option<u32>,
    pub memory: Option<u32>,
    pub desired_count: Option<u32>,
    pub min_tasks: Option<u32>,
    pub max_tasks: Option<u32>,
    pub target_cpu_utilization: Option<u32>,
    pub health_check_path: Option<String>,
    pub redirect_http: Option<bool>,
    pub database_ssl: Option<bool>,
    pub log_retention_days: Option<u32>,
    pub admin_path_patterns: Option<Vec<String>>,
    #[serde(flatten)]
    pub unknown_fields: HashMap<String, serde_yaml_ng::Value>,
}

/// A single `-c key=value` override from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextOverride {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for ContextOverride {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Ok(Self {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Err(format!(
                "Invalid context override: '{}'. Expected key=value (e.g. applicationName=acme)",
                s
            )),
        }
    }
}

/// Load a context file from an explicit path. Returns an error if the file is not found.
pub fn load_context_from_path(path: &Path) -> Result<ContextFile> {
    validate_regular_file(path, "context file").map_err(|e| StackError::FileReadError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;
    let size = std::fs::metadata(path)
        .map_err(|e| StackError::FileReadError {
            path: path.to_path_buf(),
            details: e.to_string(),
        })?
        .len();
    validate_file_size(size, path, MAX_CONTEXT_FILE_SIZE)?;

    let content = std::fs::read_to_string(path).map_err(|e| StackError::FileReadError {
        path: path.to_path_buf(),
        details: e.to_string(),
    })?;

    let context: ContextFile = serde_yaml_ng::from_str(&content).with_context(|| {
        format!(
            "Failed to parse context file: {}\n\n💡 Hint: Ensure the file contains valid YAML syntax.",
            path.display()
        )
    })?;

    warn_unknown_fields(&context);
    tracing::debug!(path = %path.display(), "context file loaded");

    Ok(context)
}

/// Auto-discover the context file in a directory. Returns `None` silently if not found.
pub fn discover_context(dir: &Path) -> Result<Option<ContextFile>> {
    let context_path = dir.join(CONTEXT_FILENAME);

    if !context_path.exists() {
        return Ok(None);
    }

    let context = load_context_from_path(&context_path)?;
    Ok(Some(context))
}

/// Warn about unknown fields in the context file.
fn warn_unknown_fields(context: &ContextFile) {
    let sections = [
        ("", &context.unknown_fields),
        ("network.", &context.network.unknown_fields),
        ("database.", &context.database.unknown_fields),
        ("service.", &context.service.unknown_fields),
    ];
    for (prefix, fields) in sections {
        let mut keys: Vec<&String> = fields.keys().collect();
        keys.sort();
        for key in keys {
            eprintln!(
                "⚠️  Warning: Unknown context field '{}{}' will be ignored.",
                prefix, key
            );
        }
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse::<T>().map_err(|_| {
        StackError::InvalidContext {
            key: key.to_string(),
            reason: format!("'{}' has the wrong type", value),
        }
        .into()
    })
}

/// Comma-separated list; an empty value is an empty list
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

impl ContextFile {
    /// Applies one command-line override on top of the file values.
    ///
    /// # Errors
    /// Returns an error for unknown keys or values of the wrong type
    pub fn apply_override(&mut self, o: &ContextOverride) -> Result<()> {
        let key = o.key.as_str();
        let value = o.value.as_str();
        match key {
            "applicationName" => self.application_name = Some(value.to_string()),
            "hostedZoneDomainName" => self.hosted_zone_domain_name = Some(value.to_string()),
            "domainName" => self.domain_name = Some(value.to_string()),
            "authorizedIPsForAdminAccess" => {
                self.authorized_ips_for_admin_access = Some(parse_list(value))
            }
            "containerImage" => self.container_image = Some(value.to_string()),
            "hostedZoneId" => self.hosted_zone_id = Some(value.to_string()),
            "network.cidr" => self.network.cidr = Some(value.to_string()),
            "network.maxAzs" => self.network.max_azs = Some(parse_value(key, value)?),
            "network.natGateways" => self.network.nat_gateways = Some(parse_value(key, value)?),
            "database.engineVersion" => self.database.engine_version = Some(value.to_string()),
            "database.minCapacity" => self.database.min_capacity = Some(parse_value(key, value)?),
            "database.maxCapacity" => self.database.max_capacity = Some(parse_value(key, value)?),
            "service.cpu" => self.service.cpu = Some(parse_value(key, value)?),
            "service.memory" => self.service.memory = Some(parse_value(key, value)?),
            "service.desiredCount" => self.service.desired_count = Some(parse_value(key, value)?),
            "service.minTasks" => self.service.min_tasks = Some(parse_value(key, value)?),
            "service.maxTasks" => self.service.max_tasks = Some(parse_value(key, value)?),
            "service.targetCpuUtilization" => {
                self.service.target_cpu_utilization = Some(parse_value(key, value)?)
            }
            "service.healthCheckPath" => self.service.health_check_path = Some(value.to_string()),
            "service.redirectHttp" => self.service.redirect_http = Some(parse_value(key, value)?),
            "service.databaseSsl" => self.service.database_ssl = Some(parse_value(key, value)?),
            "service.logRetentionDays" => {
                self.service.log_retention_days = Some(parse_value(key, value)?)
            }
            "service.adminPathPatterns" => {
                self.service.admin_path_patterns = Some(parse_list(value))
            }
            _ => {
                return Err(StackError::InvalidContext {
                    key: key.to_string(),
                    reason: "unknown context key".to_string(),
                }
                .into())
            }
        }
        Ok(())
    }

    /// Validates the merged values into a [`DeploymentContext`].
    ///
    /// # Errors
    /// Returns `StackError::MissingContext` for absent required keys and
    /// `StackError::InvalidContext` / `InvalidCidr` for malformed values
    pub fn into_deployment_context(self) -> Result<DeploymentContext> {
        let application_name = ApplicationName::new(required("applicationName", self.application_name)?)?;
        let hosted_zone_domain_name = DomainName::new(
            "hostedZoneDomainName",
            required("hostedZoneDomainName", self.hosted_zone_domain_name)?,
        )?;
        let domain_name = self
            .domain_name
            .filter(|d| !d.trim().is_empty())
            .map(|d| DomainName::new("domainName", d))
            .transpose()?;
        let authorized_admin_cidrs = self
            .authorized_ips_for_admin_access
            .ok_or_else(|| StackError::MissingContext {
                key: "authorizedIPsForAdminAccess".to_string(),
            })?
            .iter()
            .map(|c| c.parse::<IpCidr>())
            .collect::<Result<Vec<_>>>()?;
        let container_image = required("containerImage", self.container_image)?;

        let mut context = DeploymentContext::new(
            application_name,
            hosted_zone_domain_name,
            domain_name,
            authorized_admin_cidrs,
            container_image,
        )?;

        context.hosted_zone_id = self.hosted_zone_id.filter(|id| !id.trim().is_empty());

        let network = &mut context.network;
        if let Some(cidr) = self.network.cidr {
            network.cidr = cidr.parse::<Ipv4Cidr>()?;
        }
        if let Some(v) = self.network.max_azs {
            network.max_azs = v;
        }
        if let Some(v) = self.network.nat_gateways {
            network.nat_gateways = v;
        }

        let database = &mut context.database;
        if let Some(v) = self.database.engine_version {
            database.engine_version = v;
        }
        if let Some(v) = self.database.min_capacity {
            database.min_capacity = v;
        }
        if let Some(v) = self.database.max_capacity {
            database.max_capacity = v;
        }

        let service = &mut context.service;
        let s = self.service;
        if let Some(v) = s.cpu {
            service.cpu = v;
        }
        if let Some(v) = s.memory {
            service.memory_mib = v;
        }
        if let Some(v) = s.desired_count {
            service.desired_count = v;
        }
        if let Some(v) = s.min_tasks {
            service.min_tasks = v;
        }
        if let Some(v) = s.max_tasks {
            service.max_tasks = v;
        }
        if let Some(v) = s.target_cpu_utilization {
            service.target_cpu_utilization = v;
        }
        if let Some(v) = s.health_check_path {
            service.health_check_path = v;
        }
        if let Some(v) = s.redirect_http {
            service.redirect_http = v;
        }
        service.database_ssl = s.database_ssl;
        if let Some(v) = s.log_retention_days {
            service.log_retention_days = v;
        }
        if let Some(v) = s.admin_path_patterns {
            service.admin_path_patterns = v;
        }

        context.validate()?;
        Ok(context)
    }
}

fn required(key: &str, value: Option<String>) -> Result<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| {
            StackError::MissingContext {
                key: key.to_string(),
            }
            .into()
        })
}

/// Loads the context (explicit path or discovery in `dir`), applies the
/// overrides and validates the result.
pub fn resolve_context(
    explicit_path: Option<&Path>,
    dir: &Path,
    overrides: &[ContextOverride],
) -> Result<DeploymentContext> {
    let mut file = match explicit_path {
        Some(path) => load_context_from_path(path)?,
        None => discover_context(dir)?.unwrap_or_default(),
    };
    for o in overrides {
        file.apply_override(o)?;
    }
    file.into_deployment_context()
}
