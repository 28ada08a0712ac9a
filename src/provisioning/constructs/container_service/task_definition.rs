use super::secrets::{ApplicationSecrets, SecretPurpose};
use crate::provisioning::constructs::database::Database;
use crate::provisioning::domain::environment::{
    CONTAINER_PORT, DATABASE_CLIENT, DATABASE_CLIENT_POSTGRES, DATABASE_CREDENTIALS,
    DATABASE_HOST, DATABASE_NAME, DATABASE_PASSWORD, DATABASE_PORT, DATABASE_SSL,
    DATABASE_USERNAME, HOST, PORT,
};
use crate::provisioning::domain::ServiceSettings;
use crate::provisioning::template::{Expr, LogicalId, Resources};
use crate::shared::error::StackError;
use crate::shared::Result;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

const POLICY_VERSION: &str = "2012-10-17";

/// An environment variable filled from Secrets Manager when the task starts
#[derive(Debug, Clone, PartialEq)]
pub struct ContainerSecret {
    pub name: &'static str,
    pub secret: LogicalId,
    /// Single JSON key of the secret, or the whole secret string when `None`
    pub json_key: Option<&'static str>,
}

impl ContainerSecret {
    /// The `ValueFrom` of the container definition.
    ///
    /// A JSON key is addressed as `<arn>:<key>::` (latest version).
    pub fn value_from(&self) -> Expr {
        match self.json_key {
            None => Expr::reference(&self.secret),
            Some(key) => Expr::Join(
                String::new(),
                vec![Expr::reference(&self.secret), Expr::str(format!(":{}::", key))],
            ),
        }
    }
}

/// Everything the container receives through its environment
#[derive(Debug, Clone)]
pub struct ContainerEnvironment {
    pub variables: BTreeMap<&'static str, Expr>,
    /// Sorted by variable name
    pub secrets: Vec<ContainerSecret>,
}

impl ContainerEnvironment {
    /// Secrets the execution role must be able to read: the distinct
    /// secrets behind [`Self::secrets`], in logical ID order
    pub fn secret_ids(&self) -> Vec<LogicalId> {
        let mut ids: Vec<LogicalId> = self.secrets.iter().map(|s| s.secret.clone()).collect();
        ids.sort();
        ids.dedup();
        ids
    }

    pub(super) fn variables_json(&self) -> Vec<Value> {
        self.variables
            .iter()
            .map(|(name, value)| json!({ "Name": name, "Value": value }))
            .collect()
    }

    pub(super) fn secrets_json(&self) -> Vec<Value> {
        self.secrets
            .iter()
            .map(|s| json!({ "Name": s.name, "ValueFrom": s.value_from() }))
            .collect()
    }
}

/// Builds the environment contract read by the CMS at startup.
///
/// # Errors
/// Returns an error if a referenced secret is not declared by the database
/// or the application secrets
pub fn container_environment(
    database: &Database,
    app_secrets: &ApplicationSecrets,
    settings: &ServiceSettings,
) -> Result<ContainerEnvironment> {
    ensure_declared(&database.resources, &database.secret, "database credentials")?;

    let mut variables = BTreeMap::new();
    variables.insert(DATABASE_CLIENT, Expr::str(DATABASE_CLIENT_POSTGRES));
    variables.insert(DATABASE_HOST, database.endpoint_address());
    variables.insert(DATABASE_PORT, database.endpoint_port());
    variables.insert(DATABASE_NAME, Expr::str(database.database_name.clone()));
    variables.insert(HOST, Expr::str("0.0.0.0"));
    variables.insert(PORT, Expr::str(CONTAINER_PORT.to_string()));
    if let Some(ssl) = settings.database_ssl {
        variables.insert(DATABASE_SSL, Expr::str(ssl.to_string()));
    }

    let mut secrets = vec![
        ContainerSecret {
            name: DATABASE_CREDENTIALS,
            secret: database.secret.clone(),
            json_key: None,
        },
        ContainerSecret {
            name: DATABASE_USERNAME,
            secret: database.secret.clone(),
            json_key: Some("username"),
        },
        ContainerSecret {
            name: DATABASE_PASSWORD,
            secret: database.secret.clone(),
            json_key: Some("password"),
        },
    ];
    for purpose in SecretPurpose::ALL {
        let secret = app_secrets
            .get(purpose)
            .ok_or_else(|| StackError::TemplateError {
                details: format!("No application secret declared for {}", purpose.env_name()),
            })?;
        ensure_declared(&app_secrets.resources, &secret.id, purpose.env_name())?;
        secrets.push(ContainerSecret {
            name: purpose.env_name(),
            secret: secret.id.clone(),
            json_key: None,
        });
    }
    secrets.sort_by(|a, b| a.name.cmp(b.name));

    Ok(ContainerEnvironment { variables, secrets })
}

fn ensure_declared(resources: &Resources, id: &LogicalId, what: &str) -> Result<()> {
    if resources.contains(id.as_str()) {
        Ok(())
    } else {
        Err(StackError::TemplateError {
            details: format!("Container references {} secret {} which is not declared", what, id),
        }
        .into())
    }
}

/// An image hosted in a private ECR repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EcrRepository {
    pub account: String,
    pub region: String,
    pub name: String,
}

/// Recognises `<account>.dkr.ecr.<region>.amazonaws.com/<repo>[:tag|@digest]`
pub fn ecr_repository(image: &str) -> Option<EcrRepository> {
    let (registry, path) = image.split_once('/')?;
    let mut parts = registry.split('.');
    let account = parts.next()?;
    if parts.next()? != "dkr" || parts.next()? != "ecr" {
        return None;
    }
    let region = parts.next()?;
    if !account.chars().all(|c| c.is_ascii_digit()) || account.len() != 12 {
        return None;
    }
    let name = path
        .split_once('@')
        .map(|(n, _)| n)
        .unwrap_or(path);
    let name = match name.rsplit_once(':') {
        Some((n, _)) => n,
        None => name,
    };
    Some(EcrRepository {
        account: account.to_string(),
        region: region.to_string(),
        name: name.to_string(),
    })
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Statement {
    effect: &'static str,
    action: Vec<&'static str>,
    resource: Vec<Expr>,
}

impl Statement {
    fn allow(action: Vec<&'static str>, resource: Vec<Expr>) -> Self {
        Self {
            effect: "Allow",
            action,
            resource,
        }
    }
}

/// Policy document of the task execution role: write logs, read exactly
/// the injected secrets and, for ECR images, pull the image.
pub fn execution_policy_document(
    log_group: &LogicalId,
    environment: &ContainerEnvironment,
    image: &str,
) -> Value {
    let mut statements = vec![
        Statement::allow(
            vec!["logs:CreateLogStream", "logs:PutLogEvents"],
            vec![Expr::get_att(log_group, "Arn")],
        ),
        Statement::allow(
            vec!["secretsmanager:GetSecretValue"],
            environment
                .secret_ids()
                .iter()
                .map(Expr::reference)
                .collect(),
        ),
    ];

    if let Some(repo) = ecr_repository(image) {
        statements.push(Statement::allow(
            vec!["ecr:GetAuthorizationToken"],
            vec![Expr::str("*")],
        ));
        statements.push(Statement::allow(
            vec![
                "ecr:BatchCheckLayerAvailability",
                "ecr:BatchGetImage",
                "ecr:GetDownloadUrlForLayer",
            ],
            vec![Expr::Sub(format!(
                "arn:${{AWS::Partition}}:ecr:{}:{}:repository/{}",
                repo.region, repo.account, repo.name
            ))],
        ));
    }

    json!({
        "Version": POLICY_VERSION,
        "Statement": statements,
    })
}

/// Trust policy letting ECS tasks assume a role
pub fn ecs_tasks_trust_policy() -> Value {
    json!({
        "Version": POLICY_VERSION,
        "Statement": [{
            "Effect": "Allow",
            "Principal": { "Service": "ecs-tasks.amazonaws.com" },
            "Action": "sts:AssumeRole",
        }],
    })
}
