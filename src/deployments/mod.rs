//! Deployment records and their normalization.
//!
//! Deployments are retrieved from the orchestration backend by an external
//! collaborator behind [`DeploymentSource`]. This crate ships sources for
//! JSON exports (file or stdin) and for in-memory lists; it never talks to
//! the backend itself.

mod name;

use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub use name::{relevant_tags, DeploymentName, RELEVANT_TAG_MARKERS};

/// A deployment as exported by the orchestration backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub id: String,
    #[serde(default)]
    pub created: String,
    #[serde(default)]
    pub updated: String,
    #[serde(default)]
    pub flow_id: String,
}

/// A deployment with its name split into components.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub name: String,
    pub project_name: String,
    pub branch: String,
    pub flow_name: String,
    pub env: String,
    pub tags: Vec<String>,
    pub id: String,
    pub created: String,
    pub updated: String,
    pub flow_id: String,
}

impl DeploymentInfo {
    /// Normalize a raw record, or `None` if its name does not follow the
    /// naming convention.
    pub fn from_record(record: &DeploymentRecord) -> Option<Self> {
        let parsed = DeploymentName::parse(&record.name)?;
        Some(Self {
            name: record.name.clone(),
            project_name: parsed.project_name,
            branch: parsed.branch,
            flow_name: parsed.flow_name,
            env: parsed.env,
            tags: relevant_tags(&record.tags),
            id: record.id.clone(),
            created: record.created.clone(),
            updated: record.updated.clone(),
            flow_id: record.flow_id.clone(),
        })
    }
}

/// Anything that can produce the current list of deployments.
pub trait DeploymentSource {
    fn fetch(&self) -> Result<Vec<DeploymentRecord>>;
}

/// Deployments already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDeployments(pub Vec<DeploymentRecord>);

impl DeploymentSource for StaticDeployments {
    fn fetch(&self) -> Result<Vec<DeploymentRecord>> {
        Ok(self.0.clone())
    }
}

/// A JSON array of deployment records read from a file, or stdin for `-`.
#[derive(Debug, Clone)]
pub struct JsonDeployments {
    path: PathBuf,
}

impl JsonDeployments {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn read_input(&self) -> Result<String> {
        if self.path.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read deployments from stdin")?;
            Ok(buf)
        } else {
            std::fs::read_to_string(&self.path)
                .with_context(|| format!("Failed to read deployments file: {}", self.path.display()))
        }
    }
}

impl DeploymentSource for JsonDeployments {
    fn fetch(&self) -> Result<Vec<DeploymentRecord>> {
        let text = self.read_input()?;
        parse_records(&text)
            .with_context(|| format!("Invalid deployments JSON in {}", self.path.display()))
    }
}

/// Parse a JSON array of deployment records.
pub fn parse_records(text: &str) -> Result<Vec<DeploymentRecord>> {
    serde_json::from_str(text).context("Failed to parse deployment records")
}

/// Fetch deployments and normalize them, skipping malformed names.
pub fn discover_deployments(source: &dyn DeploymentSource) -> Result<Vec<DeploymentInfo>> {
    let records = source.fetch()?;
    let mut deployments = Vec::with_capacity(records.len());

    for record in &records {
        match DeploymentInfo::from_record(record) {
            Some(info) => {
                tracing::debug!(
                    project = %info.project_name,
                    flow = %info.flow_name,
                    branch = %info.branch,
                    env = %info.env,
                    "added deployment"
                );
                deployments.push(info);
            }
            None => {
                tracing::warn!(name = %record.name, "skipping deployment with insufficient name parts");
            }
        }
    }

    tracing::info!(count = deployments.len(), total = records.len(), "deployments discovered");
    Ok(deployments)
}
