//! YAML rendering of job descriptors

use std::path::Path;

use k8s_openapi::api::batch::v1::Job;
use serde::Serialize;

use crate::error::Result;

/// Render a resource as a YAML document, `apiVersion` and `kind` included.
pub fn to_yaml<K: Serialize>(resource: &K) -> Result<String> {
    Ok(serde_yaml::to_string(resource)?)
}

/// Multi-document YAML manifest
#[derive(Clone, Debug, Default)]
pub struct Manifest {
    docs: Vec<String>,
}

impl Manifest {
    pub fn push<K: Serialize>(&mut self, resource: &K) -> Result<()> {
        self.docs.push(to_yaml(resource)?);
        Ok(())
    }

    pub fn render(&self) -> String {
        self.docs.join("---\n")
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.render())?;
        Ok(())
    }
}

/// Write Jobs to `path` as a multi-document YAML manifest.
pub fn write_manifests(path: &Path, jobs: &[Job]) -> Result<()> {
    let mut manifest = Manifest::default();
    for job in jobs {
        manifest.push(job)?;
    }
    manifest.write_to(path)
}
