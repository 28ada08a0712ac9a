use crate::provisioning::constructs::{
    certificate, container_service, database, dns_record, network, CertificateProps,
    ContainerServiceProps, DatabaseProps, DnsRecordProps, NetworkProps,
};
use crate::provisioning::domain::{DeploymentContext, HostedZone};
use crate::provisioning::template::{Expr, LogicalId, Output, Template};
use crate::shared::error::StackError;
use crate::shared::Result;

/// StackComposer service for assembling the complete stack
///
/// Builds the constructs in dependency order (network, database,
/// certificate, container service, DNS records). Each construct only sees
/// the outputs of those built before it.
pub struct StackComposer;

impl StackComposer {
    /// Composes the CloudFormation template for a validated context
    ///
    /// # Arguments
    /// * `context` - Validated deployment parameters
    /// * `hosted_zone` - The existing hosted zone of `hostedZoneDomainName`
    ///
    /// # Errors
    /// Returns an error if the hosted zone does not match the context, a
    /// construct rejects its props, or a reference is left dangling
    pub fn compose(context: &DeploymentContext, hosted_zone: &HostedZone) -> Result<Template> {
        if hosted_zone.name() != &context.hosted_zone_domain_name {
            return Err(StackError::HostedZoneNotFound {
                domain: context.hosted_zone_domain_name.to_string(),
                details: format!(
                    "lookup returned zone {} ({})",
                    hosted_zone.name(),
                    hosted_zone.id()
                ),
            }
            .into());
        }

        let app = &context.application_name;

        let network = network::provision(&NetworkProps {
            name: app.as_str(),
            settings: &context.network,
        })?;
        let database = database::provision(&DatabaseProps {
            application_name: app,
            network: &network,
            settings: &context.database,
        })?;
        let certificate = certificate::provision(&CertificateProps {
            hosted_zone,
            domain_name: &context.domain_name,
        })?;
        let service = container_service::provision(&ContainerServiceProps {
            application_name: app,
            network: &network,
            database: &database,
            certificate: &certificate,
            container_image: &context.container_image,
            authorized_admin_cidrs: &context.authorized_admin_cidrs,
            settings: &context.service,
        })?;
        let records = dns_record::provision(&DnsRecordProps {
            hosted_zone,
            record_name: &context.domain_name,
            load_balancer: service.load_balancer_id(),
        })?;

        let mut template = Template::new(format!(
            "CMS stack for {} served at https://{}",
            app, context.domain_name
        ));

        template.add_output(
            &LogicalId::new("LoadBalancerDnsName")?,
            Output::new(service.load_balancer_dns_name())
                .with_description("DNS name of the application load balancer"),
        )?;
        template.add_output(
            &LogicalId::new("SiteUrl")?,
            Output::new(Expr::str(format!("https://{}", context.domain_name)))
                .with_description("Public URL of the CMS"),
        )?;
        template.add_output(
            &LogicalId::new("DatabaseEndpoint")?,
            Output::new(database.endpoint_address())
                .with_description("Writer endpoint of the Aurora cluster"),
        )?;
        template.add_output(
            &LogicalId::new("DatabaseCredentialsSecretArn")?,
            Output::new(database.secret_arn())
                .with_description("Secrets Manager secret holding the database credentials"),
        )?;

        template.add_resources(network.resources)?;
        template.add_resources(database.resources)?;
        template.add_resources(certificate.resources)?;
        template.add_resources(service.resources)?;
        template.add_resources(records.resources)?;

        template.validate_references()?;

        tracing::info!(
            application = %app,
            domain = %context.domain_name,
            resources = template.resources().len(),
            "stack composed"
        );

        Ok(template)
    }
}
