//! Cross-reference of discovered flows with their deployments.
//!
//! A deployment belongs to a flow when its normalized `flow_name` equals
//! the flow's display `name`. Deployments are grouped by branch, then by
//! environment; both levels are sorted for stable output.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use crate::deployments::DeploymentInfo;
use crate::types::{FlowMap, FlowRecord};

/// env -> deployments
pub type EnvGroups = BTreeMap<String, Vec<DeploymentInfo>>;

/// One flow with its deployments, `branch -> env -> [deployment]`.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogEntry {
    #[serde(flatten)]
    pub flow: FlowRecord,
    pub deployments: BTreeMap<String, EnvGroups>,
}

impl CatalogEntry {
    pub fn deployment_count(&self) -> usize {
        self.deployments
            .values()
            .flat_map(|envs| envs.values())
            .map(Vec::len)
            .sum()
    }
}

/// Attach deployments to every flow. Flows without deployments are kept.
pub fn build_catalog(flows: &FlowMap, deployments: &[DeploymentInfo]) -> IndexMap<String, CatalogEntry> {
    let mut by_flow: BTreeMap<&str, Vec<&DeploymentInfo>> = BTreeMap::new();
    for deployment in deployments {
        by_flow
            .entry(deployment.flow_name.as_str())
            .or_default()
            .push(deployment);
    }

    flows
        .iter()
        .map(|(id, flow)| {
            let mut grouped: BTreeMap<String, EnvGroups> = BTreeMap::new();
            for deployment in by_flow.get(flow.name.as_str()).into_iter().flatten() {
                grouped
                    .entry(deployment.branch.clone())
                    .or_default()
                    .entry(deployment.env.clone())
                    .or_default()
                    .push((*deployment).clone());
            }
            let entry = CatalogEntry {
                flow: flow.clone(),
                deployments: grouped,
            };
            tracing::debug!(flow = %flow.name, deployments = entry.deployment_count(), "catalogued flow");
            (id.clone(), entry)
        })
        .collect()
}
