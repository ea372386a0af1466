//! Idempotent Job submission
//!
//! Hands a built descriptor to the API server. A Job that already exists is
//! left as it is: Jobs are immutable once their pods are running, and the
//! derived names make "same name" mean "same request". Completion is not
//! watched here.

use k8s_openapi::api::batch::v1::Job;
use kube::api::{Api, PostParams};
use kube::Client;
use tracing::{debug, info, instrument};

use crate::error::{Error, Result};

/// What [`ensure_job`] did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    Created,
    AlreadyExists,
}

/// Idempotently create a Job.
#[instrument(skip(client, job), fields(name = job.metadata.name.as_deref(), namespace = job.metadata.namespace.as_deref()))]
pub async fn ensure_job(client: &Client, job: &Job) -> Result<SubmitOutcome> {
    let name = job
        .metadata
        .name
        .as_deref()
        .ok_or(Error::MissingField("metadata.name"))?;
    let namespace = job
        .metadata
        .namespace
        .as_deref()
        .ok_or(Error::MissingField("metadata.namespace"))?;
    let api: Api<Job> = Api::namespaced(client.clone(), namespace);

    match api.get(name).await {
        Ok(_) => {
            debug!("Job {} already exists, skipping", name);
            Ok(SubmitOutcome::AlreadyExists)
        }
        Err(kube::Error::Api(e)) if e.code == 404 => {
            info!("Creating Job {}", name);
            match api.create(&PostParams::default(), job).await {
                Ok(_) => Ok(SubmitOutcome::Created),
                // another writer created it after our GET
                Err(kube::Error::Api(e)) if e.code == 409 => {
                    debug!("Job {} created concurrently, skipping", name);
                    Ok(SubmitOutcome::AlreadyExists)
                }
                Err(e) => Err(Error::KubeError(e)),
            }
        }
        Err(e) => Err(Error::KubeError(e)),
    }
}
