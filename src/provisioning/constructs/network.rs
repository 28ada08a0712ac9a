use crate::provisioning::domain::{Ipv4Cidr, NetworkSettings};
use crate::provisioning::template::{Expr, LogicalId, Resource, Resources, Tag};
use crate::shared::Result;
use serde::Serialize;
use serde_json::json;

const SCOPE: &str = "Network";

/// The three subnet tiers of the VPC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetTier {
    /// Routes to the internet gateway; hosts the load balancer and NAT gateways
    Public,
    /// Routes out through a NAT gateway; hosts the container tasks
    PrivateWithEgress,
    /// No route out of the VPC; hosts the database
    Isolated,
}

impl SubnetTier {
    const ALL: [SubnetTier; 3] = [
        SubnetTier::Public,
        SubnetTier::PrivateWithEgress,
        SubnetTier::Isolated,
    ];

    fn id_prefix(self) -> &'static str {
        match self {
            SubnetTier::Public => "Public",
            SubnetTier::PrivateWithEgress => "Private",
            SubnetTier::Isolated => "Isolated",
        }
    }

    fn tag_label(self) -> &'static str {
        match self {
            SubnetTier::Public => "public-subnet",
            SubnetTier::PrivateWithEgress => "private-subnet",
            SubnetTier::Isolated => "isolated-subnet",
        }
    }
}

/// A planned subnet and the logical ID of its resource
#[derive(Debug, Clone, PartialEq)]
pub struct Subnet {
    pub id: LogicalId,
    pub tier: SubnetTier,
    pub cidr: Ipv4Cidr,
    pub az_index: usize,
}

pub struct NetworkProps<'a> {
    /// Prefix for `Name` tags
    pub name: &'a str,
    pub settings: &'a NetworkSettings,
}

/// Output of the network construct
#[derive(Debug, Clone)]
pub struct Network {
    pub vpc: LogicalId,
    pub subnets: Vec<Subnet>,
    /// Default routes of the public tier; internet-facing resources wait on them
    pub internet_routes: Vec<LogicalId>,
    pub resources: Resources,
}

impl Network {
    pub fn vpc_id(&self) -> Expr {
        Expr::reference(&self.vpc)
    }

    pub fn subnets_in(&self, tier: SubnetTier) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |s| s.tier == tier)
    }

    pub fn subnet_refs(&self, tier: SubnetTier) -> Vec<Expr> {
        self.subnets_in(tier)
            .map(|s| Expr::reference(&s.id))
            .collect()
    }

    pub fn cidrs_in(&self, tier: SubnetTier) -> Vec<Ipv4Cidr> {
        self.subnets_in(tier).map(|s| s.cidr).collect()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VpcProperties {
    cidr_block: String,
    enable_dns_hostnames: bool,
    enable_dns_support: bool,
    tags: Vec<Tag>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SubnetProperties {
    vpc_id: Expr,
    cidr_block: String,
    availability_zone: Expr,
    map_public_ip_on_launch: bool,
    tags: Vec<Tag>,
}

/// Plans and declares the VPC with public, private-with-egress and isolated
/// subnets in every availability zone.
///
/// # Errors
/// Returns an error if the address block is too small for `3 * maxAzs` subnets
pub fn provision(props: &NetworkProps) -> Result<Network> {
    let settings = props.settings;
    let azs = settings.max_azs as usize;
    let cidrs = settings.cidr.subdivide(SubnetTier::ALL.len() * azs)?;

    let mut resources = Resources::new();
    let vpc = LogicalId::scoped(SCOPE, "Vpc")?;
    resources.insert(
        vpc.clone(),
        Resource::new(
            "AWS::EC2::VPC",
            &VpcProperties {
                cidr_block: settings.cidr.to_string(),
                enable_dns_hostnames: true,
                enable_dns_support: true,
                tags: vec![Tag::name(format!("{}/vpc", props.name))],
            },
        )?,
    )?;

    let igw = LogicalId::scoped(SCOPE, "InternetGateway")?;
    resources.insert(
        igw.clone(),
        Resource::new(
            "AWS::EC2::InternetGateway",
            &json!({ "Tags": [Tag::name(format!("{}/igw", props.name))] }),
        )?,
    )?;
    let attachment = LogicalId::scoped(SCOPE, "GatewayAttachment")?;
    resources.insert(
        attachment.clone(),
        Resource::new(
            "AWS::EC2::VPCGatewayAttachment",
            &json!({
                "VpcId": Expr::reference(&vpc),
                "InternetGatewayId": Expr::reference(&igw),
            }),
        )?,
    )?;

    let mut subnets = Vec::with_capacity(cidrs.len());
    let mut cidr_iter = cidrs.into_iter();
    for tier in SubnetTier::ALL {
        for az_index in 0..azs {
            let cidr = cidr_iter
                .next()
                .ok_or_else(|| anyhow::anyhow!("Subnet plan ran out of CIDR blocks"))?;
            let id = LogicalId::scoped(
                SCOPE,
                &format!("{}Subnet{}", tier.id_prefix(), az_index + 1),
            )?;
            resources.insert(
                id.clone(),
                Resource::new(
                    "AWS::EC2::Subnet",
                    &SubnetProperties {
                        vpc_id: Expr::reference(&vpc),
                        cidr_block: cidr.to_string(),
                        availability_zone: Expr::availability_zone(az_index),
                        map_public_ip_on_launch: tier == SubnetTier::Public,
                        tags: vec![Tag::name(format!(
                            "{}/{}-{}",
                            props.name,
                            tier.tag_label(),
                            az_index + 1
                        ))],
                    },
                )?,
            )?;
            subnets.push(Subnet {
                id,
                tier,
                cidr,
                az_index,
            });
        }
    }

    // Route tables: one per subnet, associated with it
    let mut route_tables = Vec::with_capacity(subnets.len());
    for subnet in &subnets {
        let table = LogicalId::scoped(subnet.id.as_str(), "RouteTable")?;
        resources.insert(
            table.clone(),
            Resource::new(
                "AWS::EC2::RouteTable",
                &json!({ "VpcId": Expr::reference(&vpc) }),
            )?,
        )?;
        resources.insert(
            LogicalId::scoped(subnet.id.as_str(), "RouteTableAssociation")?,
            Resource::new(
                "AWS::EC2::SubnetRouteTableAssociation",
                &json!({
                    "RouteTableId": Expr::reference(&table),
                    "SubnetId": Expr::reference(&subnet.id),
                }),
            )?,
        )?;
        route_tables.push(table);
    }

    // Public default routes and NAT gateways
    let mut nat_gateways = Vec::new();
    let mut internet_routes = Vec::new();
    for (subnet, table) in subnets.iter().zip(&route_tables) {
        if subnet.tier != SubnetTier::Public {
            continue;
        }
        let route = LogicalId::scoped(subnet.id.as_str(), "DefaultRoute")?;
        resources.insert(
            route.clone(),
            Resource::new(
                "AWS::EC2::Route",
                &json!({
                    "RouteTableId": Expr::reference(table),
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "GatewayId": Expr::reference(&igw),
                }),
            )?
            .depends_on(&attachment),
        )?;
        internet_routes.push(route.clone());

        if subnet.az_index < settings.nat_gateways as usize {
            let eip = LogicalId::scoped(subnet.id.as_str(), "Eip")?;
            resources.insert(
                eip.clone(),
                Resource::new("AWS::EC2::EIP", &json!({ "Domain": "vpc" }))?,
            )?;
            let nat = LogicalId::scoped(subnet.id.as_str(), "NatGateway")?;
            resources.insert(
                nat.clone(),
                Resource::new(
                    "AWS::EC2::NatGateway",
                    &json!({
                        "SubnetId": Expr::reference(&subnet.id),
                        "AllocationId": Expr::get_att(&eip, "AllocationId"),
                        "Tags": [Tag::name(format!("{}/nat-{}", props.name, subnet.az_index + 1))],
                    }),
                )?
                .depends_on(&route),
            )?;
            nat_gateways.push(nat);
        }
    }

    // Private subnets leave through the NAT in their AZ, or the last one
    for (subnet, table) in subnets.iter().zip(&route_tables) {
        if subnet.tier != SubnetTier::PrivateWithEgress {
            continue;
        }
        let nat = nat_gateways
            .get(subnet.az_index)
            .or_else(|| nat_gateways.last())
            .ok_or_else(|| anyhow::anyhow!("Private subnets need at least one NAT gateway"))?;
        resources.insert(
            LogicalId::scoped(subnet.id.as_str(), "DefaultRoute")?,
            Resource::new(
                "AWS::EC2::Route",
                &json!({
                    "RouteTableId": Expr::reference(table),
                    "DestinationCidrBlock": "0.0.0.0/0",
                    "NatGatewayId": Expr::reference(nat),
                }),
            )?,
        )?;
    }

    tracing::debug!(
        subnets = subnets.len(),
        nat_gateways = nat_gateways.len(),
        resources = resources.len(),
        "network planned"
    );

    Ok(Network {
        vpc,
        subnets,
        internet_routes,
        resources,
    })
}
