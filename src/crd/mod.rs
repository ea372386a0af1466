//! Custom Resource Definitions for Percona XtraDB Cluster
//!
//! The job builders are fed from these resources.

mod backup;
mod cluster;


pub use backup::{BackupVolumeSpec, PerconaXtraDBBackup, PerconaXtraDBBackupSpec};
pub use cluster::{PerconaXtraDBCluster, PerconaXtraDBClusterSpec, PxcSpec};
