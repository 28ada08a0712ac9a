use crate::provisioning::domain::{DomainName, HostedZone};
use crate::provisioning::template::{Expr, LogicalId, Resource, Resources, Tag};
use crate::shared::Result;
use serde::Serialize;

pub struct CertificateProps<'a> {
    pub hosted_zone: &'a HostedZone,
    pub domain_name: &'a DomainName,
}

/// Output of the certificate construct
#[derive(Debug, Clone)]
pub struct Certificate {
    pub id: LogicalId,
    pub domain_name: DomainName,
    pub resources: Resources,
}

impl Certificate {
    /// `Ref` of an ACM certificate resolves to its ARN
    pub fn arn(&self) -> Expr {
        Expr::reference(&self.id)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct DomainValidationOption {
    domain_name: String,
    hosted_zone_id: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct CertificateProperties {
    domain_name: String,
    validation_method: &'static str,
    domain_validation_options: Vec<DomainValidationOption>,
    tags: Vec<Tag>,
}

/// Declares a DNS-validated ACM certificate for one name.
///
/// With the hosted zone ID in `DomainValidationOptions`, CloudFormation
/// writes the validation CNAME into the zone and waits for issuance.
pub fn provision(props: &CertificateProps) -> Result<Certificate> {
    if !props.domain_name.is_within(props.hosted_zone.name()) {
        anyhow::bail!(
            "Certificate name {} is not inside hosted zone {}",
            props.domain_name,
            props.hosted_zone.name()
        );
    }

    let id = LogicalId::new("Certificate")?;
    let mut resources = Resources::new();
    resources.insert(
        id.clone(),
        Resource::new(
            "AWS::CertificateManager::Certificate",
            &CertificateProperties {
                domain_name: props.domain_name.to_string(),
                validation_method: "DNS",
                domain_validation_options: vec![DomainValidationOption {
                    domain_name: props.domain_name.to_string(),
                    hosted_zone_id: props.hosted_zone.id().to_string(),
                }],
                tags: vec![Tag::name(props.domain_name.to_string())],
            },
        )?,
    )?;

    tracing::debug!(domain = %props.domain_name, zone = props.hosted_zone.id(), "certificate planned");

    Ok(Certificate {
        id,
        domain_name: props.domain_name.clone(),
        resources,
    })
}
