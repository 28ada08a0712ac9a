use super::*;
use crate::provisioning::domain::{ApplicationName, DeploymentContext, DomainName, HostedZone};
use crate::shared::error::StackError;
use async_trait::async_trait;
use std::cell::RefCell;

struct MockHostedZoneLookup {
    zone_id: Option<&'static str>,
}

#[async_trait]
impl HostedZoneLookup for MockHostedZoneLookup {
    async fn find_public_zone(&self, domain: &DomainName) -> Result<HostedZone> {
        match self.zone_id {
            Some(id) => HostedZone::new(id, domain.clone()),
            None => Err(StackError::HostedZoneNotFound {
                domain: domain.to_string(),
                details: "no public hosted zone with that exact name".to_string(),
            }
            .into()),
        }
    }
}

#[derive(Default)]
struct MockProgressReporter {
    messages: RefCell<Vec<String>>,
    errors: RefCell<Vec<String>>,
}

impl ProgressReporter for MockProgressReporter {
    fn report(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }

    fn report_error(&self, message: &str) {
        self.errors.borrow_mut().push(message.to_string());
    }

    fn report_completion(&self, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

fn request(cidrs: &[&str]) -> SynthRequest {
    SynthRequest::new(
        DeploymentContext::new(
            ApplicationName::new("acme").unwrap(),
            DomainName::new("hostedZoneDomainName", "example.com").unwrap(),
            None,
            cidrs.iter().map(|c| c.parse().unwrap()).collect(),
            "strapi/strapi:latest",
        )
        .unwrap(),
    )
}

#[tokio::test]
async fn test_synthesize_with_found_zone() {
    let use_case = SynthesizeStackUseCase::new(
        MockHostedZoneLookup {
            zone_id: Some("Z0123ABC"),
        },
        MockProgressReporter::default(),
    );

    let response = use_case.execute(request(&["88.121.146.23/32"])).await.unwrap();

    assert_eq!(response.hosted_zone.id(), "Z0123ABC");
    assert!(response.template.resources().contains("Certificate"));
    let messages = use_case.progress_reporter().messages.borrow();
    assert!(messages[0].contains("example.com"));
    assert!(messages.iter().any(|m| m.contains("resource(s)")));
    assert!(use_case.progress_reporter().errors.borrow().is_empty());
}

#[tokio::test]
async fn test_synthesize_warns_on_empty_allow_list() {
    let use_case = SynthesizeStackUseCase::new(
        MockHostedZoneLookup {
            zone_id: Some("Z0123ABC"),
        },
        MockProgressReporter::default(),
    );

    let response = use_case.execute(request(&[])).await.unwrap();

    assert!(response.template.resources().contains("ServiceAdminDenyRule"));
    let errors = use_case.progress_reporter().errors.borrow();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("authorizedIPsForAdminAccess is empty"));
}

#[tokio::test]
async fn test_synthesize_fails_without_hosted_zone() {
    let use_case = SynthesizeStackUseCase::new(
        MockHostedZoneLookup { zone_id: None },
        MockProgressReporter::default(),
    );

    let err = use_case.execute(request(&[])).await.unwrap_err();
    let stack_error = err.downcast_ref::<StackError>().unwrap();
    assert!(matches!(stack_error, StackError::HostedZoneNotFound { .. }));
}
