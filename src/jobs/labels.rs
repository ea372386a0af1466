//! Labels and owner references shared by all job descriptors

use std::collections::BTreeMap;

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::{Resource, ResourceExt};

use super::request::ClusterIdentity;

pub const COMPONENT_BACKUP: &str = "backup";
pub const COMPONENT_USERS: &str = "usermanager";

/// Label carrying the owning Job's name; unique per Job.
pub const JOB_NAME_LABEL: &str = "pxc.percona.com/job";

/// Get the standard labels for a cluster's job resources
pub fn standard_labels(cluster: &ClusterIdentity, component: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert(
        "app.kubernetes.io/name".to_string(),
        "percona-xtradb-cluster".to_string(),
    );
    labels.insert(
        "app.kubernetes.io/instance".to_string(),
        cluster.name().to_string(),
    );
    labels.insert(
        "app.kubernetes.io/component".to_string(),
        component.to_string(),
    );
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "percona-xtradb-cluster-operator".to_string(),
    );
    labels.insert("type".to_string(), component.to_string());
    labels.insert("cluster".to_string(), cluster.name().to_string());
    labels
}

/// Standard labels plus the Job's own name, used for selectors
pub fn job_labels(
    cluster: &ClusterIdentity,
    component: &str,
    job_name: &str,
) -> BTreeMap<String, String> {
    let mut labels = standard_labels(cluster, component);
    labels.insert(JOB_NAME_LABEL.to_string(), job_name.to_string());
    labels
}

/// Create an OwnerReference for garbage collection
///
/// Returns `None` for resources the API server has not assigned a uid yet.
pub fn owner_reference<K>(resource: &K) -> Option<OwnerReference>
where
    K: Resource<DynamicType = ()>,
{
    let uid = resource.meta().uid.clone()?;
    Some(OwnerReference {
        api_version: K::api_version(&()).to_string(),
        kind: K::kind(&()).to_string(),
        name: resource.name_any(),
        uid,
        controller: Some(true),
        block_owner_deletion: Some(true),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{PerconaXtraDBBackup, PerconaXtraDBBackupSpec};

    fn backup_resource(uid: Option<&str>) -> PerconaXtraDBBackup {
        let mut backup = PerconaXtraDBBackup::new(
            "b1",
            PerconaXtraDBBackupSpec {
                pxc_cluster: "pxc1".to_string(),
                volume: None,
            },
        );
        backup.metadata.uid = uid.map(str::to_string);
        backup
    }

    #[test]
    fn test_standard_labels() {
        let cluster = ClusterIdentity::new("pxc1", "db").unwrap();
        let labels = standard_labels(&cluster, COMPONENT_USERS);
        assert_eq!(labels["app.kubernetes.io/instance"], "pxc1");
        assert_eq!(labels["app.kubernetes.io/component"], "usermanager");
        assert_eq!(labels["type"], "usermanager");
        assert_eq!(labels["cluster"], "pxc1");
        assert!(!labels.contains_key(JOB_NAME_LABEL));
    }

    #[test]
    fn test_job_labels_include_job_name() {
        let cluster = ClusterIdentity::new("pxc1", "db").unwrap();
        let labels = job_labels(&cluster, COMPONENT_BACKUP, "pxc1-xtrabackup-job.b1");
        assert_eq!(labels[JOB_NAME_LABEL], "pxc1-xtrabackup-job.b1");
        assert_eq!(labels["type"], "backup");
    }

    #[test]
    fn test_owner_reference() {
        let owner = owner_reference(&backup_resource(Some("uid-1234"))).unwrap();
        assert_eq!(owner.api_version, "pxc.percona.com/v1alpha1");
        assert_eq!(owner.kind, "PerconaXtraDBBackup");
        assert_eq!(owner.name, "b1");
        assert_eq!(owner.uid, "uid-1234");
        assert_eq!(owner.controller, Some(true));
    }

    #[test]
    fn test_owner_reference_requires_uid() {
        assert!(owner_reference(&backup_resource(None)).is_none());
    }
}
