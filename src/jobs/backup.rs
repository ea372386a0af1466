//! Backup Job builder
//!
//! A backup runs `backup.sh` from the xtrabackup image against the cluster's
//! node group and streams the result onto a dedicated volume claim.
//!
//! ## Naming
//! - Job: `<cluster>-xtrabackup-job.<backup>`
//! - Pod volume: `<cluster>-backup-<backup>`
//! - Volume claim: `<cluster><VOLUME_NAME_POSTFIX>.<backup>`
//!
//! The claim name is how the Job finds the storage provisioned by
//! [`build_backup_pvc`], so both sides derive it from the same constant.

use std::collections::BTreeMap;

use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    Container, EnvVar, PersistentVolumeClaim, PersistentVolumeClaimSpec,
    PersistentVolumeClaimVolumeSource, PodSpec, PodTemplateSpec, Volume, VolumeMount,
    VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use tracing::debug;

use super::labels::{job_labels, standard_labels, COMPONENT_BACKUP};
use super::request::BackupRequest;
use super::{JobImages, RESTART_POLICY_NEVER};
use crate::crd::{BackupVolumeSpec, PerconaXtraDBBackup};
use crate::error::Result;

pub const BACKUP_IMAGE: &str = "perconalab/backupjob-openshift";

/// Suffix after the cluster name in every backup volume claim name.
pub const VOLUME_NAME_POSTFIX: &str = "-xb-backup";

pub const BACKUP_CONTAINER_NAME: &str = "xtrabackup";

pub const BACKUP_MOUNT_PATH: &str = "/backup";

/// Job-level retries before a backup is marked failed.
pub const BACKUP_BACKOFF_LIMIT: i32 = 4;

const BACKUP_COMMAND: [&str; 2] = ["bash", "/usr/bin/backup.sh"];

// ─── Name helpers ─────────────────────────────────────────────────────────────

/// Name of the backup volume inside the pod spec.
pub fn backup_volume_name(req: &BackupRequest) -> String {
    format!("{}-backup-{}", req.cluster_name(), req.backup_name())
}

/// Name of the PersistentVolumeClaim holding the backup.
pub fn backup_claim_name(req: &BackupRequest) -> String {
    format!(
        "{}{}.{}",
        req.cluster_name(),
        VOLUME_NAME_POSTFIX,
        req.backup_name()
    )
}

pub fn backup_job_name(req: &BackupRequest) -> String {
    format!("{}-xtrabackup-job.{}", req.cluster_name(), req.backup_name())
}

/// Service fronting the cluster's PXC pods, handed to the backup script.
pub fn node_group_name(cluster_name: &str) -> String {
    format!("{cluster_name}-pxc-nodes")
}

// ─── Builders ─────────────────────────────────────────────────────────────────

/// Build the backup Job.
///
/// One container, one volume claim mounted at `/backup`, never restarted in
/// place; the Job is retried up to [`BACKUP_BACKOFF_LIMIT`] times.
pub fn build_backup_job(req: &BackupRequest, images: &JobImages) -> Job {
    let job_name = backup_job_name(req);
    let volume_name = backup_volume_name(req);
    let labels = job_labels(req.cluster(), COMPONENT_BACKUP, &job_name);

    debug!(
        job = %job_name,
        claim = %backup_claim_name(req),
        "Building backup Job"
    );

    let container = Container {
        name: BACKUP_CONTAINER_NAME.to_string(),
        image: Some(images.backup.clone()),
        command: Some(BACKUP_COMMAND.iter().map(|s| s.to_string()).collect()),
        volume_mounts: Some(vec![VolumeMount {
            name: volume_name.clone(),
            mount_path: BACKUP_MOUNT_PATH.to_string(),
            ..Default::default()
        }]),
        env: Some(vec![EnvVar {
            name: "NODE_NAME".to_string(),
            value: Some(node_group_name(req.cluster_name())),
            ..Default::default()
        }]),
        ..Default::default()
    };

    let volume = Volume {
        name: volume_name,
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: backup_claim_name(req),
            read_only: None,
        }),
        ..Default::default()
    };

    Job {
        metadata: ObjectMeta {
            name: Some(job_name),
            namespace: Some(req.namespace().to_string()),
            labels: Some(labels.clone()),
            owner_references: req.owner().map(|owner| vec![owner.clone()]),
            ..Default::default()
        },
        spec: Some(JobSpec {
            backoff_limit: Some(BACKUP_BACKOFF_LIMIT),
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(labels),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    restart_policy: Some(RESTART_POLICY_NEVER.to_string()),
                    containers: vec![container],
                    volumes: Some(vec![volume]),
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: None,
    }
}

/// Build the PersistentVolumeClaim a backup Job writes into.
pub fn build_backup_pvc(req: &BackupRequest, volume: &BackupVolumeSpec) -> PersistentVolumeClaim {
    let mut requests = BTreeMap::new();
    requests.insert("storage".to_string(), Quantity(volume.size.clone()));

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(backup_claim_name(req)),
            namespace: Some(req.namespace().to_string()),
            labels: Some(standard_labels(req.cluster(), COMPONENT_BACKUP)),
            owner_references: req.owner().map(|owner| vec![owner.clone()]),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            storage_class_name: volume.storage_class.clone(),
            resources: Some(VolumeResourceRequirements {
                requests: Some(requests),
                ..Default::default()
            }),
            ..Default::default()
        }),
        status: None,
    }
}

/// Build the volume claim for a PerconaXtraDBBackup from its `spec.volume`.
///
/// A backup without a volume section gets the default size and storage class.
pub fn build_backup_pvc_for(backup: &PerconaXtraDBBackup) -> Result<PersistentVolumeClaim> {
    let req = BackupRequest::from_resource(backup)?;
    let volume = backup.spec.volume.clone().unwrap_or_default();
    Ok(build_backup_pvc(&req, &volume))
}
