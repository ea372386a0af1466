use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, Subcommand};
use k8s_openapi::api::batch::v1::Job;
use pxc_jobs::crd::BackupVolumeSpec;
use pxc_jobs::jobs::{
    build_backup_job, build_backup_pvc, build_users_job, ensure_job, BackupRequest, Manifest,
    RootPassword, UsersCredentials, UsersJobRequest,
};
use pxc_jobs::JobImages;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build the xtrabackup Job for one backup
    Backup(BackupArgs),
    /// Build the user management Job for a cluster
    Users(UsersArgs),
    /// Show version information
    Version,
}

#[derive(ClapArgs, Debug)]
struct ImageArgs {
    /// Image running the backup script
    #[arg(long, env = "PXC_BACKUP_IMAGE", default_value = pxc_jobs::jobs::backup::BACKUP_IMAGE)]
    backup_image: String,

    /// Image running the user provisioning utility
    #[arg(long, env = "PXC_USERS_IMAGE", default_value = pxc_jobs::jobs::users::USERS_IMAGE)]
    users_image: String,
}

impl From<ImageArgs> for JobImages {
    fn from(args: ImageArgs) -> Self {
        Self {
            backup: args.backup_image,
            users: args.users_image,
        }
    }
}

#[derive(ClapArgs, Debug)]
struct OutputArgs {
    /// Write the manifest to this file instead of stdout
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Submit the Job to the cluster (skipped if it already exists)
    #[arg(long)]
    apply: bool,
}

#[derive(ClapArgs, Debug)]
struct BackupArgs {
    /// Cluster to back up
    #[arg(long)]
    cluster: String,

    /// Backup instance name
    #[arg(long)]
    backup: String,

    #[arg(long, env = "PXC_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Also print the volume claim the backup writes into
    #[arg(long)]
    with_pvc: bool,

    #[arg(long, default_value = "6Gi")]
    volume_size: String,

    #[arg(long)]
    storage_class: Option<String>,

    #[command(flatten)]
    images: ImageArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(ClapArgs, Debug)]
struct UsersArgs {
    #[arg(long)]
    cluster: String,

    #[arg(long, env = "PXC_NAMESPACE", default_value = "default")]
    namespace: String,

    /// Distinguishes runs against the same cluster
    #[arg(long)]
    run_id: String,

    /// Connection descriptor handed to the utility
    #[arg(long, env = "PXC_CONNECTION_STRING")]
    connection_string: String,

    /// Root password, read from the environment only
    #[arg(long, env = "PXC_ROOT_PASSWORD", hide = true, hide_env_values = true)]
    root_password: RootPassword,

    #[command(flatten)]
    images: ImageArgs,

    #[command(flatten)]
    output: OutputArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let env_filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();
    // stdout carries the manifest, logs go to stderr
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();

    match args.command {
        Commands::Version => {
            println!("pxc-jobs v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Backup(backup_args) => run_backup(backup_args).await,
        Commands::Users(users_args) => run_users(users_args).await,
    }
}

async fn run_backup(args: BackupArgs) -> anyhow::Result<()> {
    let request = BackupRequest::new(&args.cluster, &args.backup, &args.namespace)
        .context("invalid backup request")?;
    let job = build_backup_job(&request, &args.images.into());

    let mut manifest = Manifest::default();
    if args.with_pvc {
        let volume = BackupVolumeSpec {
            size: args.volume_size,
            storage_class: args.storage_class,
        };
        manifest.push(&build_backup_pvc(&request, &volume))?;
    }
    manifest.push(&job)?;
    emit(&manifest, args.output.output.as_deref())?;

    if args.output.apply {
        submit(&job).await?;
    }
    Ok(())
}

async fn run_users(args: UsersArgs) -> anyhow::Result<()> {
    let request = UsersJobRequest::new(&args.cluster, &args.namespace, &args.run_id)
        .context("invalid user management request")?;
    let creds = UsersCredentials::new(args.root_password, args.connection_string)
        .context("invalid cluster credentials")?;
    let job = build_users_job(&request, &creds, &args.images.into())?;

    let mut manifest = Manifest::default();
    manifest.push(&job)?;
    emit(&manifest, args.output.output.as_deref())?;

    if args.output.apply {
        submit(&job).await?;
    }
    Ok(())
}

fn emit(manifest: &Manifest, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            manifest
                .write_to(path)
                .with_context(|| format!("writing {}", path.display()))?;
            info!("Manifest written to {}", path.display());
        }
        None => print!("{}", manifest.render()),
    }
    Ok(())
}

async fn submit(job: &Job) -> anyhow::Result<()> {
    let client = kube::Client::try_default()
        .await
        .context("connecting to Kubernetes")?;
    let outcome = ensure_job(&client, job).await?;
    info!(
        "Job {} submitted: {:?}",
        job.metadata.name.as_deref().unwrap_or_default(),
        outcome
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn users_args() -> Args {
        Args::try_parse_from([
            "pxc-jobs",
            "users",
            "--cluster",
            "pxc1",
            "--run-id",
            "r1",
            "--connection-string",
            "host:3306",
            "--root-password",
            "hunter2",
        ])
        .unwrap()
    }

    #[test]
    fn test_root_password_redacted_in_debug() {
        let args = users_args();
        assert!(!format!("{args:?}").contains("hunter2"));
        match args.command {
            Commands::Users(users) => assert_eq!(users.root_password.expose(), "hunter2"),
            other => panic!("expected users command, got {other:?}"),
        }
    }

    #[test]
    fn test_root_password_hidden_from_help() {
        let mut cmd = Args::command();
        let users = cmd.find_subcommand_mut("users").unwrap();
        let help = users.render_help().to_string();
        assert!(!help.contains("root-password"));
        assert!(help.contains("connection-string"));
    }
}
