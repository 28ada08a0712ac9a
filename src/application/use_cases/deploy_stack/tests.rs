use super::*;
use crate::ports::outbound::StackOutput;
use crate::provisioning::domain::{ApplicationName, DeploymentContext, DomainName, HostedZone};
use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

struct FixedZoneLookup;

#[async_trait]
impl HostedZoneLookup for FixedZoneLookup {
    async fn find_public_zone(&self, domain: &DomainName) -> Result<HostedZone> {
        HostedZone::new("Z0123ABC", domain.clone())
    }
}

#[derive(Default)]
struct RecordingReporter {
    statuses: RefCell<Vec<String>>,
    completions: RefCell<Vec<String>>,
}

impl ProgressReporter for RecordingReporter {
    fn report(&self, _message: &str) {}

    fn report_status(&self, message: &str) {
        self.statuses.borrow_mut().push(message.to_string());
    }

    fn report_error(&self, _message: &str) {}

    fn report_completion(&self, message: &str) {
        self.completions.borrow_mut().push(message.to_string());
    }
}

/// Replays a scripted sequence of stack statuses
struct ScriptedDeployer {
    submission: std::result::Result<Option<StackOperation>, String>,
    statuses: Mutex<VecDeque<StackStatus>>,
    submitted_bodies: Mutex<Vec<String>>,
}

impl ScriptedDeployer {
    fn new(submission: Option<StackOperation>, statuses: &[(&str, Option<&str>)]) -> Self {
        Self {
            submission: Ok(submission),
            statuses: Mutex::new(
                statuses
                    .iter()
                    .map(|(s, r)| StackStatus::new(*s, r.map(str::to_string)))
                    .collect(),
            ),
            submitted_bodies: Mutex::new(Vec::new()),
        }
    }

    fn rejecting(message: &str) -> Self {
        Self {
            submission: Err(message.to_string()),
            statuses: Mutex::new(VecDeque::new()),
            submitted_bodies: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl StackDeployer for ScriptedDeployer {
    async fn submit(&self, _stack_name: &str, template_body: &str) -> Result<Option<StackOperation>> {
        self.submitted_bodies
            .lock()
            .unwrap()
            .push(template_body.to_string());
        self.submission.clone().map_err(anyhow::Error::msg)
    }

    async fn describe(&self, _stack_name: &str) -> Result<StackStatus> {
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no more scripted statuses"))
    }

    async fn outputs(&self, _stack_name: &str) -> Result<Vec<StackOutput>> {
        Ok(vec![StackOutput {
            key: "SiteUrl".to_string(),
            value: "https://acme.example.com".to_string(),
        }])
    }
}

fn request() -> DeployRequest {
    let context = DeploymentContext::new(
        ApplicationName::new("acme").unwrap(),
        DomainName::new("hostedZoneDomainName", "example.com").unwrap(),
        None,
        vec!["88.121.146.23/32".parse().unwrap()],
        "strapi/strapi:latest",
    )
    .unwrap();
    DeployRequest::new(context, None, Duration::ZERO).unwrap()
}

#[tokio::test]
async fn test_create_waits_for_complete() {
    let deployer = ScriptedDeployer::new(
        Some(StackOperation::Create),
        &[
            ("CREATE_IN_PROGRESS", None),
            ("CREATE_IN_PROGRESS", None),
            ("CREATE_COMPLETE", None),
        ],
    );
    let use_case = DeployStackUseCase::new(FixedZoneLookup, deployer, RecordingReporter::default());

    let response = use_case.execute(request()).await.unwrap();

    assert_eq!(response.stack_name, "AcmeStack");
    assert_eq!(response.outcome, DeployOutcome::Created);
    assert_eq!(response.final_status.as_deref(), Some("CREATE_COMPLETE"));
    assert_eq!(response.outputs[0].key, "SiteUrl");
    assert_eq!(use_case.reporter().statuses.borrow().len(), 3);
    assert!(use_case.stack_deployer.statuses.lock().unwrap().is_empty());

    let bodies = use_case.stack_deployer.submitted_bodies.lock().unwrap();
    let body: serde_json::Value = serde_json::from_str(&bodies[0]).unwrap();
    assert_eq!(body["AWSTemplateFormatVersion"], "2010-09-09");
    assert!(!bodies[0].contains('\n'));
}

#[tokio::test]
async fn test_no_updates_is_success() {
    let deployer = ScriptedDeployer::new(None, &[]);
    let use_case = DeployStackUseCase::new(FixedZoneLookup, deployer, RecordingReporter::default());

    let response = use_case.execute(request()).await.unwrap();

    assert_eq!(response.outcome, DeployOutcome::Unchanged);
    assert!(response.final_status.is_none());
    assert!(use_case.reporter().statuses.borrow().is_empty());
    assert!(use_case.reporter().completions.borrow()[0].contains("already up to date"));
}

#[tokio::test]
async fn test_rollback_is_deployment_failure() {
    let deployer = ScriptedDeployer::new(
        Some(StackOperation::Update),
        &[
            ("UPDATE_IN_PROGRESS", None),
            ("UPDATE_ROLLBACK_IN_PROGRESS", Some("Resource ServiceFargateService failed")),
            ("UPDATE_ROLLBACK_COMPLETE", Some("Resource ServiceFargateService failed")),
        ],
    );
    let use_case = DeployStackUseCase::new(FixedZoneLookup, deployer, RecordingReporter::default());

    let err = use_case.execute(request()).await.unwrap_err();
    match err.downcast_ref::<StackError>().unwrap() {
        StackError::DeploymentFailed { status, reason, .. } => {
            assert_eq!(status, "UPDATE_ROLLBACK_COMPLETE");
            assert!(reason.contains("ServiceFargateService"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_rejected_submission_is_deployment_failure() {
    let deployer = ScriptedDeployer::rejecting("Stack AcmeStack is in ROLLBACK_COMPLETE state and can not be updated");
    let use_case = DeployStackUseCase::new(FixedZoneLookup, deployer, RecordingReporter::default());

    let err = use_case.execute(request()).await.unwrap_err();
    let stack_error = err.downcast_ref::<StackError>().unwrap();
    assert!(matches!(
        stack_error,
        StackError::DeploymentFailed { status, .. } if status == "REJECTED"
    ));
    assert_eq!(stack_error.exit_code(), crate::shared::error::ExitCode::DeploymentFailed);
}
