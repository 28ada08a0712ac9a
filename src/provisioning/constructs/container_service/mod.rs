//! Load-balanced Fargate service running the CMS container.
//!
//! Declares the cluster, task definition, IAM roles, log group, load
//! balancer, admin listener rules, ECS service and its auto scaling.

mod load_balancer;
mod secrets;
mod task_definition;

#[cfg(test)]
mod tests;

pub use load_balancer::LoadBalancerIds;
pub use secrets::{ApplicationSecret, ApplicationSecrets, SecretPurpose};
pub use task_definition::{ecr_repository, ContainerEnvironment, ContainerSecret, EcrRepository};

use super::certificate::Certificate;
use super::database::Database;
use super::network::{Network, SubnetTier};
use crate::provisioning::domain::environment::CONTAINER_PORT;
use crate::provisioning::domain::{ApplicationName, IpCidr, ServiceSettings};
use crate::provisioning::policies::{AdminAccessPolicy, ListenerRulePlan};
use crate::provisioning::template::{DeletionPolicy, Expr, LogicalId, Resource, Resources, Tag};
use crate::shared::Result;
use serde_json::json;

const SCOPE: &str = "Service";

const AUTOSCALING_ROLE: &str = "arn:${AWS::Partition}:iam::${AWS::AccountId}:role/aws-service-role/ecs.application-autoscaling.amazonaws.com/AWSServiceRoleForApplicationAutoScaling_ECSService";

pub struct ContainerServiceProps<'a> {
    pub application_name: &'a ApplicationName,
    pub network: &'a Network,
    pub database: &'a Database,
    pub certificate: &'a Certificate,
    pub container_image: &'a str,
    pub authorized_admin_cidrs: &'a [IpCidr],
    pub settings: &'a ServiceSettings,
}

/// Output of the container service construct
#[derive(Debug, Clone)]
pub struct ContainerService {
    pub cluster: LogicalId,
    pub service: LogicalId,
    pub load_balancer: LoadBalancerIds,
    pub execution_policy: LogicalId,
    pub app_secrets: Vec<ApplicationSecret>,
    pub environment: ContainerEnvironment,
    pub listener_rules: Vec<ListenerRulePlan>,
    pub resources: Resources,
}

impl ContainerService {
    pub fn load_balancer_id(&self) -> &LogicalId {
        &self.load_balancer.load_balancer
    }

    pub fn load_balancer_dns_name(&self) -> Expr {
        Expr::get_att(&self.load_balancer.load_balancer, "DNSName")
    }
}

/// Declares the service and everything it needs to run behind the ALB.
///
/// # Errors
/// Returns an error if a referenced secret is missing, the admin policy
/// cannot be planned, or a logical ID collides
pub fn provision(props: &ContainerServiceProps) -> Result<ContainerService> {
    let app = props.application_name;
    let settings = props.settings;
    let mut resources = Resources::new();

    let app_secrets = ApplicationSecrets::provision(app)?;
    let environment =
        task_definition::container_environment(props.database, &app_secrets, settings)?;
    resources.merge(app_secrets.resources)?;

    let cluster = LogicalId::scoped(SCOPE, "Cluster")?;
    resources.insert(
        cluster.clone(),
        Resource::new(
            "AWS::ECS::Cluster",
            &json!({ "Tags": [Tag::name(format!("{}/cluster", app))] }),
        )?,
    )?;

    let log_group = LogicalId::scoped(SCOPE, "LogGroup")?;
    resources.insert(
        log_group.clone(),
        Resource::new(
            "AWS::Logs::LogGroup",
            &json!({ "RetentionInDays": settings.log_retention_days }),
        )?
        .with_removal_policy(DeletionPolicy::Retain),
    )?;

    let task_role = LogicalId::scoped(SCOPE, "TaskRole")?;
    let execution_role = LogicalId::scoped(SCOPE, "ExecutionRole")?;
    for role in [&task_role, &execution_role] {
        resources.insert(
            role.clone(),
            Resource::new(
                "AWS::IAM::Role",
                &json!({ "AssumeRolePolicyDocument": task_definition::ecs_tasks_trust_policy() }),
            )?,
        )?;
    }

    let execution_policy = LogicalId::scoped(SCOPE, "ExecutionRolePolicy")?;
    resources.insert(
        execution_policy.clone(),
        Resource::new(
            "AWS::IAM::Policy",
            &json!({
                "PolicyName": format!("{}-execution", app),
                "Roles": [Expr::reference(&execution_role)],
                "PolicyDocument": task_definition::execution_policy_document(
                    &log_group,
                    &environment,
                    props.container_image,
                ),
            }),
        )?,
    )?;

    let task = LogicalId::scoped(SCOPE, "TaskDefinition")?;
    resources.insert(
        task.clone(),
        Resource::new(
            "AWS::ECS::TaskDefinition",
            &json!({
                "Family": app.as_str(),
                "Cpu": settings.cpu.to_string(),
                "Memory": settings.memory_mib.to_string(),
                "NetworkMode": "awsvpc",
                "RequiresCompatibilities": ["FARGATE"],
                "ExecutionRoleArn": Expr::get_att(&execution_role, "Arn"),
                "TaskRoleArn": Expr::get_att(&task_role, "Arn"),
                "ContainerDefinitions": [{
                    "Name": app.as_str(),
                    "Image": props.container_image,
                    "Essential": true,
                    "PortMappings": [{ "ContainerPort": CONTAINER_PORT, "Protocol": "tcp" }],
                    "Environment": environment.variables_json(),
                    "Secrets": environment.secrets_json(),
                    "LogConfiguration": {
                        "LogDriver": "awslogs",
                        "Options": {
                            "awslogs-group": Expr::reference(&log_group),
                            "awslogs-region": Expr::Sub("${AWS::Region}".to_string()),
                            "awslogs-stream-prefix": app.as_str(),
                        },
                    },
                }],
            }),
        )?,
    )?;

    let lb = load_balancer::declare(
        &mut resources,
        SCOPE,
        app,
        props.network,
        props.certificate.arn(),
        settings,
    )?;

    let service_group = LogicalId::scoped(SCOPE, "SecurityGroup")?;
    resources.insert(
        service_group.clone(),
        Resource::new(
            "AWS::EC2::SecurityGroup",
            &json!({
                "GroupDescription": format!("{} service tasks", app),
                "VpcId": props.network.vpc_id(),
                "SecurityGroupIngress": [{
                    "IpProtocol": "tcp",
                    "FromPort": CONTAINER_PORT,
                    "ToPort": CONTAINER_PORT,
                    "SourceSecurityGroupId": Expr::get_att(&lb.security_group, "GroupId"),
                    "Description": "Load balancer to container",
                }],
                "Tags": [Tag::name(format!("{}/service", app))],
            }),
        )?,
    )?;

    if props.authorized_admin_cidrs.is_empty() {
        tracing::warn!(
            "authorizedIPsForAdminAccess is empty: the admin path will answer 403 to everyone"
        );
    }
    let listener_rules = AdminAccessPolicy::plan(
        props.authorized_admin_cidrs,
        &settings.admin_path_patterns,
    )?;
    load_balancer::declare_admin_rules(&mut resources, SCOPE, &lb, &listener_rules)?;

    let service = LogicalId::scoped(SCOPE, "FargateService")?;
    resources.insert(
        service.clone(),
        Resource::new(
            "AWS::ECS::Service",
            &json!({
                "Cluster": Expr::reference(&cluster),
                "LaunchType": "FARGATE",
                "TaskDefinition": Expr::reference(&task),
                "DesiredCount": settings.desired_count,
                "HealthCheckGracePeriodSeconds": 60,
                "DeploymentConfiguration": {
                    "MinimumHealthyPercent": 50,
                    "MaximumPercent": 200,
                },
                "NetworkConfiguration": {
                    "AwsvpcConfiguration": {
                        "AssignPublicIp": "DISABLED",
                        "Subnets": props.network.subnet_refs(SubnetTier::PrivateWithEgress),
                        "SecurityGroups": [Expr::get_att(&service_group, "GroupId")],
                    },
                },
                "LoadBalancers": [{
                    "ContainerName": app.as_str(),
                    "ContainerPort": CONTAINER_PORT,
                    "TargetGroupArn": Expr::reference(&lb.target_group),
                }],
            }),
        )?
        .depends_on(&lb.https_listener)
        .depends_on(&execution_policy),
    )?;

    let scaling_target = LogicalId::scoped(SCOPE, "ScalingTarget")?;
    resources.insert(
        scaling_target.clone(),
        Resource::new(
            "AWS::ApplicationAutoScaling::ScalableTarget",
            &json!({
                "MinCapacity": settings.min_tasks,
                "MaxCapacity": settings.max_tasks,
                "ResourceId": Expr::Join(
                    "/".to_string(),
                    vec![
                        Expr::str("service"),
                        Expr::reference(&cluster),
                        Expr::get_att(&service, "Name"),
                    ],
                ),
                "RoleARN": Expr::Sub(AUTOSCALING_ROLE.to_string()),
                "ScalableDimension": "ecs:service:DesiredCount",
                "ServiceNamespace": "ecs",
            }),
        )?,
    )?;
    resources.insert(
        LogicalId::scoped(SCOPE, "CpuScaling")?,
        Resource::new(
            "AWS::ApplicationAutoScaling::ScalingPolicy",
            &json!({
                "PolicyName": format!("{}-cpu-target-tracking", app),
                "PolicyType": "TargetTrackingScaling",
                "ScalingTargetId": Expr::reference(&scaling_target),
                "TargetTrackingScalingPolicyConfiguration": {
                    "PredefinedMetricSpecification": {
                        "PredefinedMetricType": "ECSServiceAverageCPUUtilization",
                    },
                    "TargetValue": settings.target_cpu_utilization,
                },
            }),
        )?,
    )?;

    tracing::debug!(
        image = props.container_image,
        listener_rules = listener_rules.len(),
        injected_secrets = environment.secrets.len(),
        resources = resources.len(),
        "container service planned"
    );

    Ok(ContainerService {
        cluster,
        service,
        load_balancer: lb,
        execution_policy,
        app_secrets: app_secrets.secrets,
        environment,
        listener_rules,
        resources,
    })
}
