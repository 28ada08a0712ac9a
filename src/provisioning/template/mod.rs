//! CloudFormation template model.
//!
//! Constructs produce [`Resources`]; the composer merges them into a
//! [`Template`] which serializes to a CloudFormation document.

mod expr;

pub use expr::{collect_references, Expr};

use crate::shared::error::StackError;
use crate::shared::Result;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Borrow;
use std::collections::{BTreeMap, BTreeSet};

/// CloudFormation caps logical IDs at 255 characters
const MAX_LOGICAL_ID_LENGTH: usize = 255;

const TEMPLATE_FORMAT_VERSION: &str = "2010-09-09";

/// NewType wrapper for a CloudFormation logical ID (alphanumeric only)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogicalId(String);

impl LogicalId {
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() {
            anyhow::bail!("Logical ID cannot be empty");
        }
        if id.len() > MAX_LOGICAL_ID_LENGTH {
            anyhow::bail!(
                "Logical ID is too long ({} bytes). Maximum allowed: {} bytes",
                id.len(),
                MAX_LOGICAL_ID_LENGTH
            );
        }
        if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
            anyhow::bail!("Logical ID '{}' must be alphanumeric", id);
        }
        Ok(Self(id))
    }

    /// Builds `<scope><name>`, e.g. `Network` + `PublicSubnet1`
    pub fn scoped(scope: &str, name: &str) -> Result<Self> {
        Self::new(format!("{}{}", scope, name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for LogicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for LogicalId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Serialize for LogicalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// What CloudFormation does with a resource when it is deleted or replaced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DeletionPolicy {
    Delete,
    Retain,
    Snapshot,
}

/// A single entry of the template's `Resources` section
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    #[serde(rename = "Type")]
    resource_type: String,
    #[serde(rename = "DependsOn", skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<LogicalId>,
    #[serde(rename = "DeletionPolicy", skip_serializing_if = "Option::is_none")]
    deletion_policy: Option<DeletionPolicy>,
    #[serde(rename = "UpdateReplacePolicy", skip_serializing_if = "Option::is_none")]
    update_replace_policy: Option<DeletionPolicy>,
    #[serde(rename = "Properties", skip_serializing_if = "Map::is_empty")]
    properties: Map<String, Value>,
}

impl Resource {
    /// Creates a resource from any serializable properties struct
    ///
    /// # Errors
    /// Returns an error if the properties do not serialize to a JSON object
    pub fn new<P: Serialize>(resource_type: &str, properties: &P) -> Result<Self> {
        let properties = match serde_json::to_value(properties)? {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => {
                return Err(StackError::TemplateError {
                    details: format!(
                        "Properties of {} must be an object, got {}",
                        resource_type, other
                    ),
                }
                .into())
            }
        };

        Ok(Self {
            resource_type: resource_type.to_string(),
            depends_on: Vec::new(),
            deletion_policy: None,
            update_replace_policy: None,
            properties,
        })
    }

    pub fn depends_on(mut self, id: &LogicalId) -> Self {
        if !self.depends_on.contains(id) {
            self.depends_on.push(id.clone());
        }
        self
    }

    /// Sets both DeletionPolicy and UpdateReplacePolicy
    pub fn with_removal_policy(mut self, policy: DeletionPolicy) -> Self {
        self.deletion_policy = Some(policy);
        self.update_replace_policy = Some(policy);
        self
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties.get(name)
    }

    pub fn dependencies(&self) -> &[LogicalId] {
        &self.depends_on
    }

    pub fn deletion_policy(&self) -> Option<DeletionPolicy> {
        self.deletion_policy
    }
}

/// Ordered collection of resources keyed by logical ID
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources(BTreeMap<LogicalId, Resource>);

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resource, rejecting duplicate logical IDs
    pub fn insert(&mut self, id: LogicalId, resource: Resource) -> Result<()> {
        if self.0.contains_key(&id) {
            return Err(StackError::TemplateError {
                details: format!("Duplicate logical ID: {}", id),
            }
            .into());
        }
        self.0.insert(id, resource);
        Ok(())
    }

    pub fn merge(&mut self, other: Resources) -> Result<()> {
        for (id, resource) in other.0 {
            self.insert(id, resource)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Resource> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&LogicalId, &Resource)> {
        self.0.iter()
    }

    /// All resources of one CloudFormation type, in logical ID order
    pub fn of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = (&'a LogicalId, &'a Resource)> + 'a {
        self.0
            .iter()
            .filter(move |(_, r)| r.resource_type == resource_type)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Resources {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (id, resource) in &self.0 {
            map.serialize_entry(id.as_str(), resource)?;
        }
        map.end()
    }
}

/// A resource tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    /// The `Name` tag shown in the AWS console
    pub fn name(value: impl Into<String>) -> Self {
        Self {
            key: "Name".to_string(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Output {
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(rename = "Value")]
    value: Expr,
}

impl Output {
    pub fn new(value: Expr) -> Self {
        Self {
            description: None,
            value,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }
}

/// A complete CloudFormation template
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Template {
    #[serde(rename = "AWSTemplateFormatVersion")]
    format_version: &'static str,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Resources")]
    resources: Resources,
    #[serde(rename = "Outputs", skip_serializing_if = "BTreeMap::is_empty")]
    outputs: BTreeMap<String, Output>,
}

impl Template {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            format_version: TEMPLATE_FORMAT_VERSION,
            description: description.into(),
            resources: Resources::new(),
            outputs: BTreeMap::new(),
        }
    }

    pub fn add_resources(&mut self, resources: Resources) -> Result<()> {
        self.resources.merge(resources)
    }

    pub fn add_output(&mut self, id: &LogicalId, output: Output) -> Result<()> {
        if self.outputs.contains_key(id.as_str()) {
            return Err(StackError::TemplateError {
                details: format!("Duplicate output: {}", id),
            }
            .into());
        }
        self.outputs.insert(id.as_str().to_string(), output);
        Ok(())
    }

    pub fn resources(&self) -> &Resources {
        &self.resources
    }

    pub fn outputs(&self) -> &BTreeMap<String, Output> {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&Output> {
        self.outputs.get(name)
    }

    /// Checks that every `Ref`, `Fn::GetAtt`, `Fn::Sub` placeholder and
    /// `DependsOn` entry names a resource defined in this template.
    ///
    /// # Errors
    /// Returns `StackError::TemplateError` listing every dangling reference
    pub fn validate_references(&self) -> Result<()> {
        let mut dangling = BTreeSet::new();

        for (id, resource) in self.resources.iter() {
            let mut refs = Vec::new();
            collect_references(&Value::Object(resource.properties.clone()), &mut refs);
            refs.extend(resource.depends_on.iter().map(|d| d.as_str().to_string()));
            for target in refs {
                if !self.resources.contains(&target) {
                    dangling.insert(format!("{} -> {}", id, target));
                }
            }
        }

        for (name, output) in &self.outputs {
            let mut refs = Vec::new();
            collect_references(&output.value.to_json(), &mut refs);
            for target in refs {
                if !self.resources.contains(&target) {
                    dangling.insert(format!("Output {} -> {}", name, target));
                }
            }
        }

        if dangling.is_empty() {
            Ok(())
        } else {
            Err(StackError::TemplateError {
                details: format!(
                    "Unresolved references: {}",
                    dangling.into_iter().collect::<Vec<_>>().join(", ")
                ),
            }
            .into())
        }
    }
}
