//! PerconaXtraDBCluster Custom Resource Definition
//!
//! The job builders only take the cluster's name, namespace and uid from
//! this resource; the spec is a minimal schema owned by the cluster controller.

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Clone, Debug, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "pxc.percona.com",
    version = "v1alpha1",
    kind = "PerconaXtraDBCluster",
    namespaced,
    shortname = "pxc",
    printcolumn = r#"{"name":"Size","type":"integer","jsonPath":".spec.pxc.size"}"#,
    printcolumn = r#"{"name":"Age","type":"date","jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct PerconaXtraDBClusterSpec {
    pub pxc: PxcSpec,

    /// Secret holding the cluster's system user passwords
    #[serde(default = "default_secrets_name")]
    pub secrets_name: String,
}

/// PXC node group settings
#[derive(Clone, Debug, Deserialize, Serialize, JsonSchema, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PxcSpec {
    #[serde(default = "default_size")]
    pub size: i32,

    pub image: String,
}

fn default_size() -> i32 {
    3
}

fn default_secrets_name() -> String {
    "my-cluster-secrets".to_string()
}
