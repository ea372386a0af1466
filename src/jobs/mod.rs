//! Job descriptor builders
//!
//! Every builder here is a pure function from a validated request to a
//! Kubernetes `Job`. Nothing in this module talks to the API server except
//! [`submit`], which hands a finished Job to the cluster.

pub mod backup;
pub mod labels;
pub mod render;
pub mod request;
pub mod submit;
pub mod users;


use serde::{Deserialize, Serialize};

pub use backup::{build_backup_job, build_backup_pvc, build_backup_pvc_for, VOLUME_NAME_POSTFIX};
pub use render::{to_yaml, write_manifests, Manifest};
pub use request::{
    BackupRequest, ClusterIdentity, RequestValidationError, RootPassword, UsersCredentials,
    UsersJobRequest,
};
pub use submit::{ensure_job, SubmitOutcome};
pub use users::{build_users_job, build_users_job_shell, build_users_job_spec};

/// Container images run by the job builders
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobImages {
    /// Image running the xtrabackup script
    #[serde(default = "default_backup_image")]
    pub backup: String,

    /// Image running the user provisioning utility
    #[serde(default = "default_users_image")]
    pub users: String,
}

impl Default for JobImages {
    fn default() -> Self {
        Self {
            backup: default_backup_image(),
            users: default_users_image(),
        }
    }
}

fn default_backup_image() -> String {
    backup::BACKUP_IMAGE.to_string()
}

fn default_users_image() -> String {
    users::USERS_IMAGE.to_string()
}

/// Jobs run once; a failed pod counts against the backoff limit instead of restarting.
pub(crate) const RESTART_POLICY_NEVER: &str = "Never";
