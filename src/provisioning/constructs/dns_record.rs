use crate::provisioning::domain::{DomainName, HostedZone};
use crate::provisioning::template::{Expr, LogicalId, Resource, Resources};
use crate::shared::Result;
use serde::Serialize;

/// TTL declared for the site's records
pub const RECORD_TTL_SECONDS: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    A,
    Aaaa,
}

impl RecordType {
    fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }

    fn id_suffix(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "Aaaa",
        }
    }
}

/// Typed description of one alias record
#[derive(Debug, Clone, PartialEq)]
pub struct AliasRecord {
    pub id: LogicalId,
    pub record_type: RecordType,
    pub name: DomainName,
    pub ttl_seconds: u32,
}

pub struct DnsRecordProps<'a> {
    pub hosted_zone: &'a HostedZone,
    pub record_name: &'a DomainName,
    pub load_balancer: &'a LogicalId,
}

/// Output of the DNS record construct
#[derive(Debug, Clone)]
pub struct DnsRecords {
    pub records: Vec<AliasRecord>,
    pub resources: Resources,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AliasTarget {
    #[serde(rename = "DNSName")]
    dns_name: Expr,
    hosted_zone_id: Expr,
    evaluate_target_health: bool,
}

// No TTL: Route 53 takes it from the alias target and rejects an explicit one
#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RecordSetProperties {
    hosted_zone_id: String,
    name: String,
    #[serde(rename = "Type")]
    record_type: &'static str,
    alias_target: AliasTarget,
}

/// Declares A and AAAA alias records pointing the name at the load balancer's
/// `dualstack.` DNS name.
///
/// Record sets are keyed by name and type, so redeploying replaces them in
/// place.
pub fn provision(props: &DnsRecordProps) -> Result<DnsRecords> {
    if !props.record_name.is_within(props.hosted_zone.name()) {
        anyhow::bail!(
            "Record {} is not inside hosted zone {}",
            props.record_name,
            props.hosted_zone.name()
        );
    }

    let mut resources = Resources::new();
    let mut records = Vec::with_capacity(2);
    for record_type in [RecordType::A, RecordType::Aaaa] {
        let id = LogicalId::scoped("SiteRecord", record_type.id_suffix())?;
        resources.insert(
            id.clone(),
            Resource::new(
                "AWS::Route53::RecordSet",
                &RecordSetProperties {
                    hosted_zone_id: props.hosted_zone.id().to_string(),
                    name: format!("{}.", props.record_name),
                    record_type: record_type.as_str(),
                    alias_target: AliasTarget {
                        dns_name: Expr::Join(
                            String::new(),
                            vec![
                                Expr::str("dualstack."),
                                Expr::get_att(props.load_balancer, "DNSName"),
                            ],
                        ),
                        hosted_zone_id: Expr::get_att(
                            props.load_balancer,
                            "CanonicalHostedZoneID",
                        ),
                        evaluate_target_health: false,
                    },
                },
            )?,
        )?;
        records.push(AliasRecord {
            id,
            record_type,
            name: props.record_name.clone(),
            ttl_seconds: RECORD_TTL_SECONDS,
        });
    }

    Ok(DnsRecords { records, resources })
}
