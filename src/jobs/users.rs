//! User management Job builder
//!
//! Built in two steps: [`build_users_job_shell`] names the Job, then
//! [`build_users_job_spec`] fills in the pod template from the shell's labels
//! and the cluster credentials. [`build_users_job`] does both.
//!
//! The root password is injected as a plain env var. Its confidentiality is
//! whatever the platform's env delivery gives; it is never logged here.

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PodSpec, PodTemplateSpec, SecretVolumeSource, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{LabelSelector, ObjectMeta};
use tracing::debug;

use super::labels::{job_labels, COMPONENT_USERS};
use super::request::{UsersCredentials, UsersJobRequest};
use super::{JobImages, RESTART_POLICY_NEVER};
use crate::error::{Error, Result};

pub const USERS_IMAGE: &str = "nonemax/users:latest";

pub const USERS_CONTAINER_NAME: &str = "pxcusers";

/// Secret holding the user definitions the utility applies.
pub const USERS_SECRET_NAME: &str = "secret-for-users";

const USERS_SECRET_VOLUME: &str = "userssecret";

pub const USERS_SECRET_MOUNT_PATH: &str = "/go/src/github.com/percona/pxcusers";

pub const USERS_BACKOFF_LIMIT: i32 = 1;

pub const ENV_CONNECTIONS: &str = "PXC_CONNS";
pub const ENV_ROOT_PASSWORD: &str = "PXC-ROOT-PASS";

// The utility image is republished under the same tag.
const PULL_ALWAYS: &str = "Always";

pub fn users_job_name(req: &UsersJobRequest) -> String {
    format!("{}-pxcusers-job.{}", req.cluster().name(), req.run_id())
}

/// Build the Job shell: metadata only, no spec.
pub fn build_users_job_shell(req: &UsersJobRequest) -> Job {
    let job_name = users_job_name(req);
    let labels = job_labels(req.cluster(), COMPONENT_USERS, &job_name);

    Job {
        metadata: ObjectMeta {
            name: Some(job_name),
            namespace: Some(req.namespace().to_string()),
            labels: Some(labels),
            owner_references: req.owner().map(|owner| vec![owner.clone()]),
            ..Default::default()
        },
        spec: None,
        status: None,
    }
}

/// Build the JobSpec for a shell from [`build_users_job_shell`].
///
/// The shell's labels become both the selector and the pod template labels.
///
/// # Errors
///
/// `MissingField` if the shell has no name, `MissingLabels` if it has no
/// labels, `SelectorMismatch` if the selector would not pick up the
/// template's pods.
pub fn build_users_job_spec(
    creds: &UsersCredentials,
    job: &Job,
    images: &JobImages,
) -> Result<JobSpec> {
    let job_name = job
        .metadata
        .name
        .clone()
        .ok_or(Error::MissingField("metadata.name"))?;
    let labels = job
        .metadata
        .labels
        .clone()
        .filter(|labels| !labels.is_empty())
        .ok_or_else(|| Error::MissingLabels(job_name.clone()))?;

    let container = Container {
        name: USERS_CONTAINER_NAME.to_string(),
        image: Some(images.users.clone()),
        image_pull_policy: Some(PULL_ALWAYS.to_string()),
        volume_mounts: Some(vec![VolumeMount {
            name: USERS_SECRET_VOLUME.to_string(),
            mount_path: USERS_SECRET_MOUNT_PATH.to_string(),
            read_only: Some(true),
            ..Default::default()
        }]),
        env: Some(vec![
            EnvVar {
                name: ENV_CONNECTIONS.to_string(),
                value: Some(creds.connection_string().to_string()),
                ..Default::default()
            },
            EnvVar {
                name: ENV_ROOT_PASSWORD.to_string(),
                value: Some(creds.root_password().expose().to_string()),
                ..Default::default()
            },
        ]),
        ..Default::default()
    };

    let spec = JobSpec {
        backoff_limit: Some(USERS_BACKOFF_LIMIT),
        manual_selector: Some(true),
        selector: Some(LabelSelector {
            match_labels: Some(labels.clone()),
            ..Default::default()
        }),
        template: PodTemplateSpec {
            metadata: Some(ObjectMeta {
                labels: Some(labels),
                ..Default::default()
            }),
            spec: Some(PodSpec {
                restart_policy: Some(RESTART_POLICY_NEVER.to_string()),
                containers: vec![container],
                volumes: Some(vec![Volume {
                    name: USERS_SECRET_VOLUME.to_string(),
                    secret: Some(SecretVolumeSource {
                        secret_name: Some(USERS_SECRET_NAME.to_string()),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
        },
        ..Default::default()
    };

    if !selector_matches_template(&spec) {
        return Err(Error::SelectorMismatch(job_name));
    }

    debug!(job = %job_name, "Built user management Job spec");
    Ok(spec)
}

/// Build the complete user management Job.
pub fn build_users_job(
    req: &UsersJobRequest,
    creds: &UsersCredentials,
    images: &JobImages,
) -> Result<Job> {
    let mut job = build_users_job_shell(req);
    job.spec = Some(build_users_job_spec(creds, &job, images)?);
    Ok(job)
}

/// Whether a JobSpec's selector picks up the pods of its own template.
///
/// Only `matchLabels` selectors are accepted; an empty selector selects
/// nothing useful and is rejected.
pub fn selector_matches_template(spec: &JobSpec) -> bool {
    let Some(selector) = spec.selector.as_ref() else {
        return false;
    };
    if selector
        .match_expressions
        .as_ref()
        .is_some_and(|exprs| !exprs.is_empty())
    {
        return false;
    }
    let Some(wanted) = selector.match_labels.as_ref().filter(|l| !l.is_empty()) else {
        return false;
    };

    match spec
        .template
        .metadata
        .as_ref()
        .and_then(|m| m.labels.as_ref())
    {
        Some(labels) => wanted.iter().all(|(k, v)| labels.get(k) == Some(v)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::crd::{PerconaXtraDBCluster, PerconaXtraDBClusterSpec, PxcSpec};
    use crate::jobs::labels::JOB_NAME_LABEL;

    fn request(run_id: &str) -> UsersJobRequest {
        UsersJobRequest::new("pxc1", "db", run_id).unwrap()
    }

    fn creds() -> UsersCredentials {
        UsersCredentials::new("pw", "host:3306").unwrap()
    }

    fn build(run_id: &str) -> Job {
        build_users_job(&request(run_id), &creds(), &JobImages::default()).unwrap()
    }

    // ── Shell ────────────────────────────────────────────────────────────────

    #[test]
    fn test_shell_has_metadata_only() {
        let shell = build_users_job_shell(&request("r1"));
        assert_eq!(shell.metadata.name.as_deref(), Some("pxc1-pxcusers-job.r1"));
        assert_eq!(shell.metadata.namespace.as_deref(), Some("db"));
        assert!(shell.spec.is_none());
    }

    #[test]
    fn test_distinct_runs_get_distinct_names() {
        let a = build_users_job_shell(&request("r1"));
        let b = build_users_job_shell(&request("r2"));
        assert_ne!(a.metadata.name, b.metadata.name);
        assert_ne!(a.metadata.name.as_deref(), Some("test"));
    }

    #[test]
    fn test_distinct_clusters_get_distinct_names() {
        let a = build_users_job_shell(&UsersJobRequest::new("pxc1", "db", "r1").unwrap());
        let b = build_users_job_shell(&UsersJobRequest::new("pxc2", "db", "r1").unwrap());
        assert_ne!(a.metadata.name, b.metadata.name);
    }

    // ── Spec ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_env_contains_exactly_connection_and_password() {
        let job = build("r1");
        let container = &job.spec.unwrap().template.spec.unwrap().containers[0];
        let env: BTreeMap<String, Option<String>> = container
            .env
            .clone()
            .unwrap()
            .into_iter()
            .map(|e| (e.name, e.value))
            .collect();

        let mut expected = BTreeMap::new();
        expected.insert("PXC_CONNS".to_string(), Some("host:3306".to_string()));
        expected.insert("PXC-ROOT-PASS".to_string(), Some("pw".to_string()));
        assert_eq!(env, expected);
    }

    #[test]
    fn test_secret_volume_mounted_read_only() {
        let job = build("r1");
        let spec = job.spec.unwrap().template.spec.unwrap();

        let volumes = spec.volumes.unwrap();
        assert_eq!(volumes.len(), 1);
        assert_eq!(
            volumes[0].secret.as_ref().unwrap().secret_name.as_deref(),
            Some(USERS_SECRET_NAME)
        );
        assert!(volumes[0].persistent_volume_claim.is_none());

        let mounts = spec.containers[0].volume_mounts.clone().unwrap();
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].name, volumes[0].name);
        assert_eq!(mounts[0].mount_path, USERS_SECRET_MOUNT_PATH);
        assert_eq!(mounts[0].read_only, Some(true));
    }

    #[test]
    fn test_container_image_and_pull_policy() {
        let job = build("r1");
        let container = &job.spec.unwrap().template.spec.unwrap().containers[0];
        assert_eq!(container.name, "pxcusers");
        assert_eq!(container.image.as_deref(), Some(USERS_IMAGE));
        assert_eq!(container.image_pull_policy.as_deref(), Some("Always"));
    }

    #[test]
    fn test_backoff_and_restart_policy() {
        for run_id in ["r1", "r2", "nightly"] {
            let spec = build(run_id).spec.unwrap();
            assert_eq!(spec.backoff_limit, Some(1));
            assert_eq!(
                spec.template.spec.unwrap().restart_policy.as_deref(),
                Some("Never")
            );
        }
    }

    #[test]
    fn test_selector_matches_template_labels() {
        let job = build("r1");
        let spec = job.spec.clone().unwrap();
        assert!(selector_matches_template(&spec));
        assert_eq!(spec.manual_selector, Some(true));

        let selector = spec.selector.unwrap().match_labels.unwrap();
        assert_eq!(Some(&selector), job.metadata.labels.as_ref());
        assert_eq!(selector[JOB_NAME_LABEL], "pxc1-pxcusers-job.r1");
    }

    #[test]
    fn test_selector_mismatch_is_detected() {
        let mut spec = build("r1").spec.unwrap();
        spec.template.metadata.as_mut().unwrap().labels = Some(BTreeMap::from([(
            JOB_NAME_LABEL.to_string(),
            "someone-else".to_string(),
        )]));
        assert!(!selector_matches_template(&spec));

        spec.selector = Some(LabelSelector::default());
        assert!(!selector_matches_template(&spec));

        spec.selector = None;
        assert!(!selector_matches_template(&spec));
    }

    #[test]
    fn test_spec_requires_shell_labels() {
        let mut shell = build_users_job_shell(&request("r1"));
        shell.metadata.labels = None;
        let err = build_users_job_spec(&creds(), &shell, &JobImages::default()).unwrap_err();
        assert!(matches!(err, Error::MissingLabels(name) if name == "pxc1-pxcusers-job.r1"));

        shell.metadata.name = None;
        let err = build_users_job_spec(&creds(), &shell, &JobImages::default()).unwrap_err();
        assert!(matches!(err, Error::MissingField("metadata.name")));
    }

    #[test]
    fn test_build_is_deterministic() {
        assert_eq!(build("r1"), build("r1"));
    }

    #[test]
    fn test_for_cluster_sets_owner() {
        let mut cluster = PerconaXtraDBCluster::new(
            "pxc1",
            PerconaXtraDBClusterSpec {
                pxc: PxcSpec {
                    size: 3,
                    image: "percona/percona-xtradb-cluster:5.7".to_string(),
                },
                secrets_name: "my-cluster-secrets".to_string(),
            },
        );
        cluster.metadata.namespace = Some("db".to_string());
        cluster.metadata.uid = Some("uid-pxc1".to_string());

        let req = UsersJobRequest::for_cluster(&cluster, "r1").unwrap();
        let job = build_users_job(&req, &creds(), &JobImages::default()).unwrap();
        assert_eq!(job.metadata.namespace.as_deref(), Some("db"));
        let owners = job.metadata.owner_references.unwrap();
        assert_eq!(owners[0].kind, "PerconaXtraDBCluster");
        assert_eq!(owners[0].uid, "uid-pxc1");
    }
}
