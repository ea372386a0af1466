//! Validated inputs for the job builders
//!
//! Builders never see raw strings: every request is checked here first, and
//! construction fails with all violations at once. Names that end up in the
//! descriptor follow the platform's naming rules, so an accepted request
//! always produces a Job the API server will admit.

use std::fmt;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::ResourceExt;

use super::backup::{backup_job_name, backup_volume_name};
use super::labels::owner_reference;
use super::users::users_job_name;
use crate::crd::{PerconaXtraDBBackup, PerconaXtraDBCluster};
use crate::error::{Error, Result};

/// Longest RFC 1123 label, also the limit for label values.
const MAX_LABEL_LEN: usize = 63;

/// Structured validation error for a job request
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestValidationError {
    pub field: String,
    pub message: String,
    pub how_to_fix: String,
}

impl RequestValidationError {
    pub fn new(
        field: impl Into<String>,
        message: impl Into<String>,
        how_to_fix: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            how_to_fix: how_to_fix.into(),
        }
    }
}

fn validate_label(field: &str, value: &str, errors: &mut Vec<RequestValidationError>) {
    if value.is_empty() {
        errors.push(RequestValidationError::new(
            field,
            "must not be empty",
            format!("Set `{field}` to a lowercase name such as `my-name`."),
        ));
        return;
    }

    if value.len() > MAX_LABEL_LEN {
        errors.push(RequestValidationError::new(
            field,
            format!("must be at most {MAX_LABEL_LEN} characters, got {}", value.len()),
            format!("Shorten `{field}`."),
        ));
    }

    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_ends = !value.starts_with('-') && !value.ends_with('-');
    if !valid_chars || !valid_ends {
        errors.push(RequestValidationError::new(
            field,
            format!("`{value}` is not a valid RFC 1123 label"),
            "Use lowercase letters, digits and '-', starting and ending with a letter or digit.",
        ));
    }
}

fn validate_derived(field: &str, derived: &str, errors: &mut Vec<RequestValidationError>) {
    if derived.len() > MAX_LABEL_LEN {
        errors.push(RequestValidationError::new(
            field,
            format!(
                "derived name `{derived}` is {} characters, limit is {MAX_LABEL_LEN}",
                derived.len()
            ),
            "Use shorter cluster or request names.",
        ));
    }
}

fn validate_non_empty(field: &str, value: &str, errors: &mut Vec<RequestValidationError>) {
    if value.is_empty() {
        errors.push(RequestValidationError::new(
            field,
            "must not be empty",
            format!("Provide a value for `{field}`."),
        ));
    }
}

fn finish<T>(value: T, errors: Vec<RequestValidationError>) -> Result<T> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(Error::InvalidRequest(errors))
    }
}

/// The database cluster a job runs against
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClusterIdentity {
    name: String,
    namespace: String,
}

impl ClusterIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Result<Self> {
        let mut errors = Vec::new();
        let identity = Self::checked(name.into(), namespace.into(), &mut errors);
        finish(identity, errors)
    }

    fn checked(name: String, namespace: String, errors: &mut Vec<RequestValidationError>) -> Self {
        validate_label("clusterName", &name, errors);
        validate_label("namespace", &namespace, errors);
        Self { name, namespace }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// One backup invocation against a cluster
#[derive(Clone, Debug, PartialEq)]
pub struct BackupRequest {
    cluster: ClusterIdentity,
    backup_name: String,
    owner: Option<OwnerReference>,
}

impl BackupRequest {
    pub fn new(
        cluster_name: impl Into<String>,
        backup_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self> {
        Self::checked(cluster_name.into(), backup_name.into(), namespace.into(), None)
    }

    /// Build the request from a PerconaXtraDBBackup, owned by that resource.
    pub fn from_resource(backup: &PerconaXtraDBBackup) -> Result<Self> {
        let namespace = backup.namespace().unwrap_or_else(|| "default".to_string());
        Self::checked(
            backup.spec.pxc_cluster.clone(),
            backup.name_any(),
            namespace,
            owner_reference(backup),
        )
    }

    fn checked(
        cluster_name: String,
        backup_name: String,
        namespace: String,
        owner: Option<OwnerReference>,
    ) -> Result<Self> {
        let mut errors = Vec::new();
        let cluster = ClusterIdentity::checked(cluster_name, namespace, &mut errors);
        validate_label("backupName", &backup_name, &mut errors);

        let request = Self {
            cluster,
            backup_name,
            owner,
        };
        if errors.is_empty() {
            validate_derived("volumeName", &backup_volume_name(&request), &mut errors);
            validate_derived("jobName", &backup_job_name(&request), &mut errors);
        }
        finish(request, errors)
    }

    pub fn cluster(&self) -> &ClusterIdentity {
        &self.cluster
    }

    pub fn cluster_name(&self) -> &str {
        self.cluster.name()
    }

    pub fn backup_name(&self) -> &str {
        &self.backup_name
    }

    pub fn namespace(&self) -> &str {
        self.cluster.namespace()
    }

    pub fn owner(&self) -> Option<&OwnerReference> {
        self.owner.as_ref()
    }
}

/// Root password of the cluster, only readable through [`RootPassword::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct RootPassword(String);

impl RootPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    /// The raw password, for env injection only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for RootPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RootPassword(<redacted>)")
    }
}

impl From<String> for RootPassword {
    fn from(password: String) -> Self {
        Self(password)
    }
}

impl From<&str> for RootPassword {
    fn from(password: &str) -> Self {
        Self(password.to_string())
    }
}

/// What the user provisioning utility needs to reach the cluster
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UsersCredentials {
    root_password: RootPassword,
    connection_string: String,
}

impl UsersCredentials {
    pub fn new(
        root_password: impl Into<RootPassword>,
        connection_string: impl Into<String>,
    ) -> Result<Self> {
        let root_password = root_password.into();
        let connection_string = connection_string.into();

        let mut errors = Vec::new();
        validate_non_empty("rootPassword", root_password.expose(), &mut errors);
        validate_non_empty("connectionString", &connection_string, &mut errors);

        finish(
            Self {
                root_password,
                connection_string,
            },
            errors,
        )
    }

    pub fn root_password(&self) -> &RootPassword {
        &self.root_password
    }

    pub fn connection_string(&self) -> &str {
        &self.connection_string
    }
}

/// One user provisioning run against a cluster
///
/// `run_id` tells runs against the same cluster apart; it becomes part of the
/// Job name.
#[derive(Clone, Debug, PartialEq)]
pub struct UsersJobRequest {
    cluster: ClusterIdentity,
    run_id: String,
    owner: Option<OwnerReference>,
}

impl UsersJobRequest {
    pub fn new(
        cluster_name: impl Into<String>,
        namespace: impl Into<String>,
        run_id: impl Into<String>,
    ) -> Result<Self> {
        Self::checked(cluster_name.into(), namespace.into(), run_id.into(), None)
    }

    /// Build the request for a PerconaXtraDBCluster, owned by that resource.
    pub fn for_cluster(cluster: &PerconaXtraDBCluster, run_id: impl Into<String>) -> Result<Self> {
        let namespace = cluster.namespace().unwrap_or_else(|| "default".to_string());
        Self::checked(
            cluster.name_any(),
            namespace,
            run_id.into(),
            owner_reference(cluster),
        )
    }

    fn checked(
        cluster_name: String,
        namespace: String,
        run_id: String,
        owner: Option<OwnerReference>,
    ) -> Result<Self> {
        let mut errors = Vec::new();
        let cluster = ClusterIdentity::checked(cluster_name, namespace, &mut errors);
        validate_label("runId", &run_id, &mut errors);

        let request = Self {
            cluster,
            run_id,
            owner,
        };
        if errors.is_empty() {
            validate_derived("jobName", &users_job_name(&request), &mut errors);
        }
        finish(request, errors)
    }

    pub fn cluster(&self) -> &ClusterIdentity {
        &self.cluster
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn namespace(&self) -> &str {
        self.cluster.namespace()
    }

    pub fn owner(&self) -> Option<&OwnerReference> {
        self.owner.as_ref()
    }
}
