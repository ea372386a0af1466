//! pxc-jobs: Batch Job descriptors for Percona XtraDB Cluster
//!
//! This crate maps cluster custom resources to complete Kubernetes Jobs for
//! backups (xtrabackup into a volume claim) and one-shot user management.
//! Builders are pure; submitting the result is optional and lives in
//! [`jobs::submit`].

pub mod crd;
pub mod error;
pub mod jobs;

pub use crate::error::{Error, Result};
pub use crate::jobs::JobImages;
