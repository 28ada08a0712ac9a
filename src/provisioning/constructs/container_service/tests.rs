use super::*;
use crate::provisioning::constructs::certificate::{self, CertificateProps};
use crate::provisioning::constructs::database::{self, DatabaseProps};
use crate::provisioning::constructs::network::{self, NetworkProps};
use crate::provisioning::domain::{DatabaseSettings, DomainName, HostedZone, NetworkSettings};
use pretty_assertions::assert_eq;
use serde_json::Value;

struct Fixture {
    app: ApplicationName,
    network: Network,
    database: Database,
    certificate: Certificate,
}

fn fixture() -> Fixture {
    let app = ApplicationName::new("acme").unwrap();
    let network = network::provision(&NetworkProps {
        name: "acme",
        settings: &NetworkSettings::default(),
    })
    .unwrap();
    let database = database::provision(&DatabaseProps {
        application_name: &app,
        network: &network,
        settings: &DatabaseSettings::default(),
    })
    .unwrap();
    let zone = HostedZone::new(
        "Z0123ABC",
        DomainName::new("hostedZoneDomainName", "example.com").unwrap(),
    )
    .unwrap();
    let certificate = certificate::provision(&CertificateProps {
        hosted_zone: &zone,
        domain_name: &DomainName::new("domainName", "acme.example.com").unwrap(),
    })
    .unwrap();
    Fixture {
        app,
        network,
        database,
        certificate,
    }
}

fn provision_with(
    fx: &Fixture,
    image: &str,
    cidrs: &[IpCidr],
    settings: &ServiceSettings,
) -> ContainerService {
    provision(&ContainerServiceProps {
        application_name: &fx.app,
        network: &fx.network,
        database: &fx.database,
        certificate: &fx.certificate,
        container_image: image,
        authorized_admin_cidrs: cidrs,
        settings,
    })
    .unwrap()
}

fn service(fx: &Fixture) -> ContainerService {
    provision_with(
        fx,
        "strapi/strapi:latest",
        &["88.121.146.23/32".parse().unwrap()],
        &ServiceSettings::default(),
    )
}

fn container(svc: &ContainerService) -> Value {
    svc.resources
        .get("ServiceTaskDefinition")
        .unwrap()
        .property("ContainerDefinitions")
        .unwrap()[0]
        .clone()
}

fn secrets_statement(svc: &ContainerService) -> Value {
    let policy = svc.resources.get("ServiceExecutionRolePolicy").unwrap();
    policy.property("PolicyDocument").unwrap()["Statement"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["Action"] == serde_json::json!(["secretsmanager:GetSecretValue"]))
        .cloned()
        .unwrap()
}

#[test]
fn test_secrets_statement_lists_exactly_injected_secrets() {
    let fx = fixture();
    let svc = service(&fx);

    let mut injected: Vec<String> = container(&svc)["Secrets"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| {
            let value_from = &s["ValueFrom"];
            match value_from.get("Ref") {
                Some(r) => r.as_str().unwrap().to_string(),
                None => value_from["Fn::Join"][1][0]["Ref"].as_str().unwrap().to_string(),
            }
        })
        .collect();
    injected.sort();
    injected.dedup();

    let granted: Vec<String> = secrets_statement(&svc)["Resource"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Ref"].as_str().unwrap().to_string())
        .collect();

    assert_eq!(granted, injected);
    assert_eq!(
        granted,
        vec![
            "ApplicationSecretAdminJwtSecret",
            "ApplicationSecretApiTokenSalt",
            "ApplicationSecretAppKeys",
            "ApplicationSecretJwtSecret",
            "DatabaseCredentialsSecret",
        ]
    );
}

#[test]
fn test_environment_contract() {
    let fx = fixture();
    let svc = service(&fx);
    let env = container(&svc)["Environment"].clone();
    let names: Vec<&str> = env
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["Name"].as_str().unwrap())
        .collect();

    assert_eq!(
        names,
        vec![
            "DATABASE_CLIENT",
            "DATABASE_HOST",
            "DATABASE_NAME",
            "DATABASE_PORT",
            "HOST",
            "PORT",
        ]
    );
    assert_eq!(env[0]["Value"], "postgres");
    assert_eq!(
        env[1]["Value"],
        serde_json::json!({"Fn::GetAtt": ["DatabaseCluster", "Endpoint.Address"]})
    );
    assert_eq!(env[2]["Value"], "acme");
    assert_eq!(env[5]["Value"], "1337");

    let secret_names: Vec<&str> = svc.environment.secrets.iter().map(|s| s.name).collect();
    assert_eq!(
        secret_names,
        vec![
            "ADMIN_JWT_SECRET",
            "API_TOKEN_SALT",
            "APP_KEYS",
            "DATABASE_CREDENTIALS",
            "DATABASE_PASSWORD",
            "DATABASE_USERNAME",
            "JWT_SECRET",
        ]
    );
}

#[test]
fn test_database_ssl_only_when_configured() {
    let fx = fixture();
    let settings = ServiceSettings {
        database_ssl: Some(true),
        ..ServiceSettings::default()
    };
    let svc = provision_with(&fx, "strapi/strapi:latest", &[], &settings);
    assert_eq!(
        svc.environment.variables.get("DATABASE_SSL").unwrap(),
        &Expr::str("true")
    );

    let svc = service(&fx);
    assert!(svc.environment.variables.get("DATABASE_SSL").is_none());
}

#[test]
fn test_admin_rules_forward_allow_list_then_deny() {
    let fx = fixture();
    let svc = service(&fx);

    let allow = svc.resources.get("ServiceAdminAllowRule1").unwrap();
    assert_eq!(allow.property("Priority").unwrap(), 10);
    assert_eq!(
        allow.property("Conditions").unwrap()[1]["SourceIpConfig"]["Values"],
        serde_json::json!(["88.121.146.23/32"])
    );
    assert_eq!(allow.property("Actions").unwrap()[0]["Type"], "forward");

    let deny = svc.resources.get("ServiceAdminDenyRule").unwrap();
    assert_eq!(deny.property("Priority").unwrap(), 20);
    let conditions = deny.property("Conditions").unwrap().as_array().unwrap();
    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0]["PathPatternConfig"]["Values"][0], "/admin/*");
    let action = &deny.property("Actions").unwrap()[0];
    assert_eq!(action["FixedResponseConfig"]["StatusCode"], "403");
    assert_eq!(action["FixedResponseConfig"]["ContentType"], "text/html");
    assert_eq!(
        action["FixedResponseConfig"]["MessageBody"],
        "Your ip address is not authorized"
    );
}

#[test]
fn test_empty_allow_list_declares_only_deny_rule() {
    let fx = fixture();
    let svc = provision_with(&fx, "strapi/strapi:latest", &[], &ServiceSettings::default());
    assert!(!svc.resources.contains("ServiceAdminAllowRule1"));
    assert!(svc.resources.contains("ServiceAdminDenyRule"));
}

#[test]
fn test_ecr_pull_statement_only_for_ecr_images() {
    let fx = fixture();
    let statements = |svc: &ContainerService| {
        svc.resources
            .get("ServiceExecutionRolePolicy")
            .unwrap()
            .property("PolicyDocument")
            .unwrap()["Statement"]
            .as_array()
            .unwrap()
            .len()
    };

    assert_eq!(statements(&service(&fx)), 2);
    let ecr = provision_with(
        &fx,
        "123456789012.dkr.ecr.eu-west-1.amazonaws.com/cms:1.0",
        &[],
        &ServiceSettings::default(),
    );
    assert_eq!(statements(&ecr), 4);
}

#[test]
fn test_service_runs_in_private_subnets_without_public_ip() {
    let fx = fixture();
    let svc = service(&fx);
    let service = svc.resources.get("ServiceFargateService").unwrap();
    let network = &service.property("NetworkConfiguration").unwrap()["AwsvpcConfiguration"];
    assert_eq!(network["AssignPublicIp"], "DISABLED");
    assert_eq!(
        network["Subnets"],
        serde_json::json!([{"Ref": "NetworkPrivateSubnet1"}, {"Ref": "NetworkPrivateSubnet2"}])
    );
    assert!(service
        .dependencies()
        .iter()
        .any(|d| d.as_str() == "ServiceHttpsListener"));
}

#[test]
fn test_load_balancer_and_listeners() {
    let fx = fixture();
    let svc = service(&fx);

    let lb = svc.resources.get("ServiceLoadBalancer").unwrap();
    assert_eq!(lb.property("Scheme").unwrap(), "internet-facing");
    assert_eq!(
        lb.property("Subnets").unwrap(),
        &serde_json::json!([{"Ref": "NetworkPublicSubnet1"}, {"Ref": "NetworkPublicSubnet2"}])
    );

    let listener = svc.resources.get("ServiceHttpsListener").unwrap();
    assert_eq!(listener.property("Port").unwrap(), 443);
    assert_eq!(
        listener.property("Certificates").unwrap()[0]["CertificateArn"],
        serde_json::json!({"Ref": "Certificate"})
    );
    assert!(svc.load_balancer.redirect_listener.is_none());

    let target_group = svc.resources.get("ServiceTargetGroup").unwrap();
    assert_eq!(target_group.property("Port").unwrap(), 1337);
    assert_eq!(target_group.property("TargetType").unwrap(), "ip");
}

#[test]
fn test_http_redirect_listener_when_enabled() {
    let fx = fixture();
    let settings = ServiceSettings {
        redirect_http: true,
        ..ServiceSettings::default()
    };
    let svc = provision_with(&fx, "strapi/strapi:latest", &[], &settings);
    let listener = svc.resources.get("ServiceHttpRedirectListener").unwrap();
    assert_eq!(listener.property("Port").unwrap(), 80);
    assert_eq!(
        listener.property("DefaultActions").unwrap()[0]["RedirectConfig"]["Protocol"],
        "HTTPS"
    );

    let group = svc
        .resources
        .get("ServiceLoadBalancerSecurityGroup")
        .unwrap();
    assert_eq!(
        group
            .property("SecurityGroupIngress")
            .unwrap()
            .as_array()
            .unwrap()
            .len(),
        4
    );
}

#[test]
fn test_autoscaling_defaults() {
    let fx = fixture();
    let svc = service(&fx);
    let target = svc.resources.get("ServiceScalingTarget").unwrap();
    assert_eq!(target.property("MinCapacity").unwrap(), 1);
    assert_eq!(target.property("MaxCapacity").unwrap(), 2);
    let policy = svc.resources.get("ServiceCpuScaling").unwrap();
    assert_eq!(
        policy.property("TargetTrackingScalingPolicyConfiguration").unwrap()["TargetValue"],
        50
    );
}

#[test]
fn test_missing_database_secret_is_rejected() {
    let mut fx = fixture();
    fx.database.secret = LogicalId::new("SomewhereElse").unwrap();
    let result = provision(&ContainerServiceProps {
        application_name: &fx.app,
        network: &fx.network,
        database: &fx.database,
        certificate: &fx.certificate,
        container_image: "strapi/strapi:latest",
        authorized_admin_cidrs: &[],
        settings: &ServiceSettings::default(),
    });
    let err = result.unwrap_err().to_string();
    assert!(err.contains("SomewhereElse"));
}
