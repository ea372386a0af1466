//! PerconaXtraDBBackup Custom Resource Definition
//!
//! One PerconaXtraDBBackup is one backup invocation against a named cluster.
//! Its name identifies the backup instance and feeds every derived name of
//! the backup Job and its volume claim.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "pxc.percona.com",
    version = "v1alpha1",
    kind = "PerconaXtraDBBackup",
    namespaced,
    shortname = "pxc-backup",
    printcolumn = r#"{"name":"Cluster","type":"string","jsonPath":".spec.pxcCluster"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PerconaXtraDBBackupSpec {
    /// Name of the PerconaXtraDBCluster to back up
    pub pxc_cluster: String,

    /// Storage for the backup volume claim
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<BackupVolumeSpec>,
}

/// Storage requested for a backup's volume claim
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BackupVolumeSpec {
    #[serde(default = "default_backup_size")]
    pub size: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_class: Option<String>,
}

impl Default for BackupVolumeSpec {
    fn default() -> Self {
        Self {
            size: default_backup_size(),
            storage_class: None,
        }
    }
}

fn default_backup_size() -> String {
    "6Gi".to_string()
}
