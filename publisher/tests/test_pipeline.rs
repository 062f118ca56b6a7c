//! Pipeline integration tests against scripted fake clients

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;

use drydock_publisher::config::{PollingPolicy, PublisherConfig};
use drydock_publisher::errors::PublishError;
use drydock_publisher::models::deployment::{DeploymentRun, DeploymentStatus};
use drydock_publisher::models::revision::{PutOutcome, RevisionLocator};
use drydock_publisher::pipeline::poll::wait_for_deployment;
use drydock_publisher::pipeline::{check, publish_with, resolve_target};
use drydock_publisher::remote::depot::ObjectStore;
use drydock_publisher::remote::drydock::DeployApi;

/// Object store fake recording every put
#[derive(Default)]
struct FakeDepot {
    puts: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl ObjectStore for FakeDepot {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        _file: &Path,
    ) -> Result<PutOutcome, PublishError> {
        self.puts
            .lock()
            .unwrap()
            .push((bucket.to_string(), key.to_string()));
        Ok(PutOutcome {
            e_tag: Some("etag-1".to_string()),
        })
    }
}

/// One scripted answer to a status read
type StatusRead = Result<Option<DeploymentRun>, String>;

/// Deployment service fake with scripted status reads
struct FakeDrydock {
    applications: Vec<String>,
    groups: Vec<String>,
    registered: Mutex<Vec<RevisionLocator>>,
    created: Mutex<Vec<String>>,
    status_reads: Mutex<Vec<StatusRead>>,
}

impl FakeDrydock {
    fn new(applications: &[&str], groups: &[&str]) -> Self {
        Self {
            applications: applications.iter().map(|s| s.to_string()).collect(),
            groups: groups.iter().map(|s| s.to_string()).collect(),
            registered: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            status_reads: Mutex::new(Vec::new()),
        }
    }

    fn script_reads(&self, reads: Vec<StatusRead>) {
        *self.status_reads.lock().unwrap() = reads;
    }
}

#[async_trait]
impl DeployApi for FakeDrydock {
    async fn list_applications(&self) -> Result<Vec<String>, PublishError> {
        Ok(self.applications.clone())
    }

    async fn list_deployment_groups(
        &self,
        _application: &str,
    ) -> Result<Vec<String>, PublishError> {
        Ok(self.groups.clone())
    }

    async fn register_revision(
        &self,
        _application: &str,
        locator: &RevisionLocator,
        _description: &str,
    ) -> Result<(), PublishError> {
        self.registered.lock().unwrap().push(locator.clone());
        Ok(())
    }

    async fn create_deployment(
        &self,
        application: &str,
        group: &str,
        _config_name: Option<&str>,
        _locator: &RevisionLocator,
        _description: &str,
    ) -> Result<String, PublishError> {
        self.created
            .lock()
            .unwrap()
            .push(format!("{}/{}", application, group));
        Ok("d-1".to_string())
    }

    async fn get_deployment(
        &self,
        _deployment_id: &str,
    ) -> Result<Option<DeploymentRun>, PublishError> {
        let mut reads = self.status_reads.lock().unwrap();
        let next = if reads.len() > 1 {
            reads.remove(0)
        } else {
            // Keep repeating the last scripted read
            reads.first().cloned().unwrap_or(Ok(None))
        };
        next.map_err(PublishError::ServiceError)
    }
}

fn run(status: DeploymentStatus, terminal: bool) -> DeploymentRun {
    DeploymentRun {
        deployment_id: "d-1".to_string(),
        status,
        start_time: Some(Utc::now()),
        complete_time: terminal.then(Utc::now),
        overview: None,
    }
}

fn config(json: serde_json::Value) -> PublisherConfig {
    let mut config: PublisherConfig = serde_json::from_value(json).unwrap();
    config.normalize();
    config.validate().unwrap();
    config
}

fn workspace() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("appspec.yml"), "hooks: {}").unwrap();
    std::fs::create_dir_all(dir.path().join("bin")).unwrap();
    std::fs::write(dir.path().join("bin/app"), "binary").unwrap();
    dir
}

fn no_cancel() -> BoxFuture<'static, ()> {
    futures::future::pending().boxed()
}

fn instant_sleep(_: Duration) -> futures::future::Ready<()> {
    futures::future::ready(())
}

#[tokio::test]
async fn test_create_and_wait_happy_path() {
    let depot = FakeDepot::default();
    let api = FakeDrydock::new(&["app1"], &["grp1"]);
    api.script_reads(vec![
        Ok(Some(run(DeploymentStatus::InProgress, false))),
        Ok(Some(run(DeploymentStatus::InProgress, false))),
        Ok(Some(run(DeploymentStatus::Succeeded, true))),
    ]);

    let config = config(serde_json::json!({
        "bucket": "b",
        "prefix": "releases/",
        "application_name": "app1",
        "deployment_group_name": "grp1",
        "region": "us-east-1",
        "project_name": "app1",
    }));
    let target = resolve_target(&config, &HashMap::new());
    let workspace = workspace();

    let result = publish_with(
        &depot,
        &api,
        &config,
        &target,
        workspace.path(),
        instant_sleep,
        no_cancel(),
    )
    .await;
    assert!(result.is_ok(), "unexpected failure: {:?}", result.err());

    let puts = depot.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].0, "b");
    assert!(puts[0].1.starts_with("releases/app1-"));
    assert!(!puts[0].1.contains("//"));

    assert_eq!(api.registered.lock().unwrap().len(), 1);
    assert_eq!(api.created.lock().unwrap().as_slice(), ["app1/grp1"]);
}

#[tokio::test]
async fn test_register_only_skips_deployment() {
    let depot = FakeDepot::default();
    let api = FakeDrydock::new(&["app1"], &["grp1"]);

    let config = config(serde_json::json!({
        "bucket": "b",
        "application_name": "app1",
        "deployment_group_name": "grp1",
        "region": "us-east-1",
        "deployment_method": "register_only",
    }));
    let target = resolve_target(&config, &HashMap::new());
    let workspace = workspace();

    let result = publish_with(
        &depot,
        &api,
        &config,
        &target,
        workspace.path(),
        instant_sleep,
        no_cancel(),
    )
    .await;
    assert!(result.is_ok());

    assert_eq!(api.registered.lock().unwrap().len(), 1);
    assert!(api.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_application_fails_before_packaging() {
    let depot = FakeDepot::default();
    let api = FakeDrydock::new(&["other-app"], &["grp1"]);

    let config = config(serde_json::json!({
        "bucket": "b",
        "application_name": "app1",
        "deployment_group_name": "grp1",
        "region": "us-east-1",
    }));
    let target = resolve_target(&config, &HashMap::new());
    let workspace = workspace();

    let result = publish_with(
        &depot,
        &api,
        &config,
        &target,
        workspace.path(),
        instant_sleep,
        no_cancel(),
    )
    .await;
    assert!(matches!(result, Err(PublishError::ApplicationNotFound(name)) if name == "app1"));

    // Nothing was packaged or uploaded
    assert!(depot.puts.lock().unwrap().is_empty());
    assert!(api.registered.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_deployment_group_fails() {
    let depot = FakeDepot::default();
    let api = FakeDrydock::new(&["app1"], &["other-grp"]);

    let config = config(serde_json::json!({
        "bucket": "b",
        "application_name": "app1",
        "deployment_group_name": "grp1",
        "region": "us-east-1",
    }));
    let target = resolve_target(&config, &HashMap::new());
    let workspace = workspace();

    let result = publish_with(
        &depot,
        &api,
        &config,
        &target,
        workspace.path(),
        instant_sleep,
        no_cancel(),
    )
    .await;
    assert!(matches!(
        result,
        Err(PublishError::DeploymentGroupNotFound(name)) if name == "grp1"
    ));
}

#[tokio::test]
async fn test_slashed_bucket_rejected_before_upload() {
    let depot = FakeDepot::default();
    let api = FakeDrydock::new(&["app1"], &["grp1"]);

    let config = config(serde_json::json!({
        "bucket": "b/sub",
        "application_name": "app1",
        "deployment_group_name": "grp1",
        "region": "us-east-1",
    }));
    let target = resolve_target(&config, &HashMap::new());
    let workspace = workspace();

    let result = publish_with(
        &depot,
        &api,
        &config,
        &target,
        workspace.path(),
        instant_sleep,
        no_cancel(),
    )
    .await;
    assert!(matches!(result, Err(PublishError::InvalidBucket(_))));
    assert!(depot.puts.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_created_deployment_without_waiting() {
    let depot = FakeDepot::default();
    let api = FakeDrydock::new(&["app1"], &["grp1"]);

    let config = config(serde_json::json!({
        "bucket": "b",
        "application_name": "app1",
        "deployment_group_name": "grp1",
        "region": "us-east-1",
        "wait_for_completion": false,
    }));
    let target = resolve_target(&config, &HashMap::new());
    let workspace = workspace();

    let result = publish_with(
        &depot,
        &api,
        &config,
        &target,
        workspace.path(),
        instant_sleep,
        no_cancel(),
    )
    .await;
    assert!(result.is_ok());
    assert_eq!(api.created.lock().unwrap().len(), 1);
    // No status read ever happened
    assert_eq!(api.status_reads.lock().unwrap().len(), 0);
}

fn policy(timeout_secs: u64) -> PollingPolicy {
    PollingPolicy {
        timeout_secs,
        interval_secs: 1,
    }
}

#[tokio::test]
async fn test_poller_reaches_succeeded() {
    let api = FakeDrydock::new(&[], &[]);
    api.script_reads(vec![
        Ok(Some(run(DeploymentStatus::InProgress, false))),
        Ok(Some(run(DeploymentStatus::InProgress, false))),
        Ok(Some(run(DeploymentStatus::Succeeded, true))),
    ]);

    let result = wait_for_deployment(&api, "d-1", &policy(900), instant_sleep, no_cancel()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_poller_reports_failed_terminal_status() {
    let api = FakeDrydock::new(&[], &[]);
    api.script_reads(vec![
        Ok(Some(run(DeploymentStatus::InProgress, false))),
        Ok(Some(run(DeploymentStatus::Stopped, true))),
    ]);

    let result = wait_for_deployment(&api, "d-1", &policy(900), instant_sleep, no_cancel()).await;
    assert!(matches!(result, Err(PublishError::DeploymentFailed(status)) if status == "stopped"));
}

#[tokio::test]
async fn test_poller_times_out_while_in_progress() {
    let api = FakeDrydock::new(&[], &[]);
    // Server-reported start time lies far enough in the past that the
    // polling budget is already spent
    let mut stale = run(DeploymentStatus::InProgress, false);
    stale.start_time = Some(Utc::now() - ChronoDuration::seconds(100));
    api.script_reads(vec![Ok(Some(stale))]);

    let result = wait_for_deployment(&api, "d-1", &policy(5), instant_sleep, no_cancel()).await;
    assert!(matches!(result, Err(PublishError::PollTimeout(5))));
}

#[tokio::test]
async fn test_poller_tolerates_transient_read_failures() {
    let api = FakeDrydock::new(&[], &[]);
    api.script_reads(vec![
        Ok(Some(run(DeploymentStatus::InProgress, false))),
        Err("gateway timeout".to_string()),
        Err("gateway timeout".to_string()),
        Ok(Some(run(DeploymentStatus::Succeeded, true))),
    ]);

    let result = wait_for_deployment(&api, "d-1", &policy(900), instant_sleep, no_cancel()).await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_poller_cancellation_is_not_a_deployment_failure() {
    let api = FakeDrydock::new(&[], &[]);
    api.script_reads(vec![Ok(Some(run(DeploymentStatus::InProgress, false)))]);

    // Cancel fires immediately; the sleep never resolves
    let cancel = futures::future::ready(()).boxed();
    let never_sleep = |_: Duration| futures::future::pending::<()>();

    let result = wait_for_deployment(&api, "d-1", &policy(900), never_sleep, cancel).await;
    assert!(matches!(result, Err(PublishError::Interrupted)));
}

#[tokio::test]
async fn test_check_probes_store_and_application_listing() {
    let depot = FakeDepot::default();
    let api = FakeDrydock::new(&["app1"], &[]);

    check::run_check(&depot, &api, "b", "app1").await.unwrap();

    let puts = depot.puts.lock().unwrap();
    assert_eq!(puts.len(), 1);
    assert!(puts[0].1.starts_with("tmp-"));
    assert!(puts[0].1.ends_with(".txt"));
    drop(puts);

    let missing = check::run_check(&depot, &api, "b", "app2").await;
    assert!(matches!(missing, Err(PublishError::ApplicationNotFound(_))));
}
