use super::network::{Network, SubnetTier};
use crate::provisioning::domain::environment::DATABASE_PORT_NUMBER;
use crate::provisioning::domain::{ApplicationName, DatabaseSettings, Ipv4Cidr};
use crate::provisioning::template::{DeletionPolicy, Expr, LogicalId, Resource, Resources, Tag};
use crate::shared::Result;
use serde::Serialize;
use serde_json::json;

const SCOPE: &str = "Database";

const ENGINE: &str = "aurora-postgresql";
const INSTANCE_CLASS: &str = "db.serverless";

pub struct DatabaseProps<'a> {
    pub application_name: &'a ApplicationName,
    pub network: &'a Network,
    pub settings: &'a DatabaseSettings,
}

/// Output of the database construct
#[derive(Debug, Clone)]
pub struct Database {
    pub secret: LogicalId,
    pub cluster: LogicalId,
    pub security_group: LogicalId,
    pub database_name: String,
    /// Source ranges admitted on the database port
    pub ingress_cidrs: Vec<Ipv4Cidr>,
    pub resources: Resources,
}

impl Database {
    /// `Ref` of a Secrets Manager secret resolves to its ARN
    pub fn secret_arn(&self) -> Expr {
        Expr::reference(&self.secret)
    }

    pub fn endpoint_address(&self) -> Expr {
        Expr::get_att(&self.cluster, "Endpoint.Address")
    }

    pub fn endpoint_port(&self) -> Expr {
        Expr::get_att(&self.cluster, "Endpoint.Port")
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct GenerateSecretString {
    secret_string_template: String,
    generate_string_key: &'static str,
    exclude_punctuation: bool,
    include_space: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecretProperties {
    name: String,
    description: String,
    generate_secret_string: GenerateSecretString,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct IngressRule {
    ip_protocol: &'static str,
    from_port: u16,
    to_port: u16,
    cidr_ip: String,
    description: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ScalingConfiguration {
    min_capacity: f64,
    max_capacity: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ClusterProperties {
    engine: &'static str,
    engine_version: String,
    database_name: String,
    port: u16,
    master_username: Expr,
    master_user_password: Expr,
    #[serde(rename = "DBSubnetGroupName")]
    db_subnet_group_name: Expr,
    vpc_security_group_ids: Vec<Expr>,
    storage_encrypted: bool,
    copy_tags_to_snapshot: bool,
    serverless_v2_scaling_configuration: ScalingConfiguration,
}

/// Declares the credentials secret, security group, subnet group, Aurora
/// Serverless v2 cluster and its single writer instance.
///
/// The password is generated by Secrets Manager at deploy time and reaches
/// the cluster only through `{{resolve:secretsmanager:...}}` references.
pub fn provision(props: &DatabaseProps) -> Result<Database> {
    let app = props.application_name;
    let database_name = app.as_str().to_string();
    let mut resources = Resources::new();

    let secret = LogicalId::scoped(SCOPE, "CredentialsSecret")?;
    resources.insert(
        secret.clone(),
        Resource::new(
            "AWS::SecretsManager::Secret",
            &SecretProperties {
                name: app.database_secret_name(),
                description: format!("Database credentials for {}", app),
                generate_secret_string: GenerateSecretString {
                    secret_string_template: json!({ "username": app.as_str() }).to_string(),
                    generate_string_key: "password",
                    exclude_punctuation: true,
                    include_space: false,
                },
            },
        )?,
    )?;

    let ingress_cidrs = props.network.cidrs_in(SubnetTier::PrivateWithEgress);
    if ingress_cidrs.is_empty() {
        anyhow::bail!("Database ingress needs at least one private subnet");
    }
    let security_group = LogicalId::scoped(SCOPE, "SecurityGroup")?;
    resources.insert(
        security_group.clone(),
        Resource::new(
            "AWS::EC2::SecurityGroup",
            &json!({
                "GroupDescription": format!("{} database cluster", app),
                "VpcId": props.network.vpc_id(),
                "SecurityGroupIngress": ingress_cidrs
                    .iter()
                    .map(|cidr| IngressRule {
                        ip_protocol: "tcp",
                        from_port: DATABASE_PORT_NUMBER,
                        to_port: DATABASE_PORT_NUMBER,
                        cidr_ip: cidr.to_string(),
                        description: format!("PostgreSQL from private subnet {}", cidr),
                    })
                    .collect::<Vec<_>>(),
                "Tags": [Tag::name(format!("{}/database", app))],
            }),
        )?,
    )?;

    let subnet_group = LogicalId::scoped(SCOPE, "SubnetGroup")?;
    resources.insert(
        subnet_group.clone(),
        Resource::new(
            "AWS::RDS::DBSubnetGroup",
            &json!({
                "DBSubnetGroupDescription": format!("Isolated subnets for {} database", app),
                "SubnetIds": props.network.subnet_refs(SubnetTier::Isolated),
            }),
        )?,
    )?;

    let resolve = |key: &str| {
        Expr::Sub(format!(
            "{{{{resolve:secretsmanager:${{{}}}:SecretString:{}}}}}",
            secret, key
        ))
    };

    let cluster = LogicalId::scoped(SCOPE, "Cluster")?;
    resources.insert(
        cluster.clone(),
        Resource::new(
            "AWS::RDS::DBCluster",
            &ClusterProperties {
                engine: ENGINE,
                engine_version: props.settings.engine_version.clone(),
                database_name: database_name.clone(),
                port: DATABASE_PORT_NUMBER,
                master_username: resolve("username"),
                master_user_password: resolve("password"),
                db_subnet_group_name: Expr::reference(&subnet_group),
                vpc_security_group_ids: vec![Expr::get_att(&security_group, "GroupId")],
                storage_encrypted: true,
                copy_tags_to_snapshot: true,
                serverless_v2_scaling_configuration: ScalingConfiguration {
                    min_capacity: props.settings.min_capacity,
                    max_capacity: props.settings.max_capacity,
                },
            },
        )?
        .with_removal_policy(DeletionPolicy::Snapshot),
    )?;

    resources.insert(
        LogicalId::scoped(SCOPE, "Writer")?,
        Resource::new(
            "AWS::RDS::DBInstance",
            &json!({
                "Engine": ENGINE,
                "DBInstanceClass": INSTANCE_CLASS,
                "DBClusterIdentifier": Expr::reference(&cluster),
                "AutoMinorVersionUpgrade": true,
                "PubliclyAccessible": false,
            }),
        )?
        .with_removal_policy(DeletionPolicy::Delete),
    )?;

    // Adds host, port and engine to the secret once the cluster exists
    resources.insert(
        LogicalId::scoped(SCOPE, "SecretAttachment")?,
        Resource::new(
            "AWS::SecretsManager::SecretTargetAttachment",
            &json!({
                "SecretId": Expr::reference(&secret),
                "TargetId": Expr::reference(&cluster),
                "TargetType": "AWS::RDS::DBCluster",
            }),
        )?,
    )?;

    tracing::debug!(
        secret = %app.database_secret_name(),
        ingress_rules = ingress_cidrs.len(),
        resources = resources.len(),
        "database planned"
    );

    Ok(Database {
        secret,
        cluster,
        security_group,
        database_name,
        ingress_cidrs,
        resources,
    })
}
