use crate::provisioning::constructs::network::{Network, SubnetTier};
use crate::provisioning::domain::environment::CONTAINER_PORT;
use crate::provisioning::domain::{ApplicationName, IpCidr, ServiceSettings};
use crate::provisioning::policies::{ListenerRulePlan, RuleAction};
use crate::provisioning::template::{Expr, LogicalId, Resource, Resources, Tag};
use crate::shared::Result;
use serde_json::{json, Value};

const HTTPS_PORT: u16 = 443;
const HTTP_PORT: u16 = 80;

/// Logical IDs of the load balancing resources
#[derive(Debug, Clone)]
pub struct LoadBalancerIds {
    pub load_balancer: LogicalId,
    pub security_group: LogicalId,
    pub target_group: LogicalId,
    pub https_listener: LogicalId,
    pub redirect_listener: Option<LogicalId>,
}

fn open_ingress(port: u16, description: &str) -> [Value; 2] {
    [
        json!({
            "IpProtocol": "tcp",
            "FromPort": port,
            "ToPort": port,
            "CidrIp": "0.0.0.0/0",
            "Description": description,
        }),
        json!({
            "IpProtocol": "tcp",
            "FromPort": port,
            "ToPort": port,
            "CidrIpv6": "::/0",
            "Description": description,
        }),
    ]
}

/// Declares the internet-facing ALB, its security group, the IP target group
/// and the listeners.
pub fn declare(
    resources: &mut Resources,
    scope: &str,
    application_name: &ApplicationName,
    network: &Network,
    certificate_arn: Expr,
    settings: &ServiceSettings,
) -> Result<LoadBalancerIds> {
    let mut ingress: Vec<Value> = open_ingress(HTTPS_PORT, "HTTPS from anywhere").to_vec();
    if settings.redirect_http {
        ingress.extend(open_ingress(HTTP_PORT, "HTTP redirect from anywhere"));
    }

    let security_group = LogicalId::scoped(scope, "LoadBalancerSecurityGroup")?;
    resources.insert(
        security_group.clone(),
        Resource::new(
            "AWS::EC2::SecurityGroup",
            &json!({
                "GroupDescription": format!("{} load balancer", application_name),
                "VpcId": network.vpc_id(),
                "SecurityGroupIngress": ingress,
                "Tags": [Tag::name(format!("{}/load-balancer", application_name))],
            }),
        )?,
    )?;

    let load_balancer = LogicalId::scoped(scope, "LoadBalancer")?;
    let mut lb = Resource::new(
        "AWS::ElasticLoadBalancingV2::LoadBalancer",
        &json!({
            "Type": "application",
            "Scheme": "internet-facing",
            "Subnets": network.subnet_refs(SubnetTier::Public),
            "SecurityGroups": [Expr::get_att(&security_group, "GroupId")],
            "LoadBalancerAttributes": [
                { "Key": "deletion_protection.enabled", "Value": "false" },
            ],
        }),
    )?;
    for route in &network.internet_routes {
        lb = lb.depends_on(route);
    }
    resources.insert(load_balancer.clone(), lb)?;

    let target_group = LogicalId::scoped(scope, "TargetGroup")?;
    resources.insert(
        target_group.clone(),
        Resource::new(
            "AWS::ElasticLoadBalancingV2::TargetGroup",
            &json!({
                "Port": CONTAINER_PORT,
                "Protocol": "HTTP",
                "TargetType": "ip",
                "VpcId": network.vpc_id(),
                "HealthCheckPath": settings.health_check_path,
                "Matcher": { "HttpCode": "200" },
                "TargetGroupAttributes": [
                    { "Key": "deregistration_delay.timeout_seconds", "Value": "30" },
                ],
            }),
        )?,
    )?;

    let https_listener = LogicalId::scoped(scope, "HttpsListener")?;
    resources.insert(
        https_listener.clone(),
        Resource::new(
            "AWS::ElasticLoadBalancingV2::Listener",
            &json!({
                "LoadBalancerArn": Expr::reference(&load_balancer),
                "Port": HTTPS_PORT,
                "Protocol": "HTTPS",
                "Certificates": [{ "CertificateArn": certificate_arn }],
                "DefaultActions": [forward(&target_group)],
            }),
        )?,
    )?;

    let redirect_listener = if settings.redirect_http {
        let id = LogicalId::scoped(scope, "HttpRedirectListener")?;
        resources.insert(
            id.clone(),
            Resource::new(
                "AWS::ElasticLoadBalancingV2::Listener",
                &json!({
                    "LoadBalancerArn": Expr::reference(&load_balancer),
                    "Port": HTTP_PORT,
                    "Protocol": "HTTP",
                    "DefaultActions": [{
                        "Type": "redirect",
                        "RedirectConfig": {
                            "Protocol": "HTTPS",
                            "Port": HTTPS_PORT.to_string(),
                            "StatusCode": "HTTP_301",
                        },
                    }],
                }),
            )?,
        )?;
        Some(id)
    } else {
        None
    };

    Ok(LoadBalancerIds {
        load_balancer,
        security_group,
        target_group,
        https_listener,
        redirect_listener,
    })
}

fn forward(target_group: &LogicalId) -> Value {
    json!({
        "Type": "forward",
        "TargetGroupArn": Expr::reference(target_group),
    })
}

fn conditions(plan: &ListenerRulePlan) -> Vec<Value> {
    let mut conditions = vec![json!({
        "Field": "path-pattern",
        "PathPatternConfig": { "Values": plan.path_patterns },
    })];
    if !plan.source_ips.is_empty() {
        let values: Vec<String> = plan.source_ips.iter().map(IpCidr::to_string).collect();
        conditions.push(json!({
            "Field": "source-ip",
            "SourceIpConfig": { "Values": values },
        }));
    }
    conditions
}

/// Renders planned admin rules as listener rules on the HTTPS listener.
///
/// Allow rules are named `AdminAllowRule<n>` in priority order, the deny
/// rule `AdminDenyRule`.
pub fn declare_admin_rules(
    resources: &mut Resources,
    scope: &str,
    ids: &LoadBalancerIds,
    plans: &[ListenerRulePlan],
) -> Result<Vec<LogicalId>> {
    let mut declared = Vec::with_capacity(plans.len());
    let mut allow_index = 0;
    for plan in plans {
        let (name, action) = match &plan.action {
            RuleAction::Forward => {
                allow_index += 1;
                (format!("AdminAllowRule{}", allow_index), forward(&ids.target_group))
            }
            RuleAction::FixedResponse {
                status_code,
                content_type,
                body,
            } => (
                "AdminDenyRule".to_string(),
                json!({
                    "Type": "fixed-response",
                    "FixedResponseConfig": {
                        "StatusCode": status_code.to_string(),
                        "ContentType": content_type,
                        "MessageBody": body,
                    },
                }),
            ),
        };

        let id = LogicalId::scoped(scope, &name)?;
        resources.insert(
            id.clone(),
            Resource::new(
                "AWS::ElasticLoadBalancingV2::ListenerRule",
                &json!({
                    "ListenerArn": Expr::reference(&ids.https_listener),
                    "Priority": plan.priority,
                    "Conditions": conditions(plan),
                    "Actions": [action],
                }),
            )?,
        )?;
        declared.push(id);
    }
    Ok(declared)
}
