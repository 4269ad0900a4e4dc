//! Structured deployment names.
//!
//! Deployments follow the naming convention
//! `{project}--{branch}--...--{flow}--{env}`: at least four `--`
//! separated parts, the first two fixed, the last two fixed, anything in
//! between ignored.

const SEPARATOR: &str = "--";
const MIN_PARTS: usize = 4;

/// Tag substrings worth surfacing; everything else is noise.
pub const RELEVANT_TAG_MARKERS: &[&str] = &["COMMIT_HASH", "PACKAGE_VERSION"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentName {
    pub project_name: String,
    pub branch: String,
    /// Flow component with hyphens normalized to underscores
    pub flow_name: String,
    pub env: String,
}

impl DeploymentName {
    /// Split a deployment name into its components, or `None` if it has
    /// fewer than four parts.
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split(SEPARATOR).collect();
        if parts.len() < MIN_PARTS {
            return None;
        }

        let n = parts.len();
        Some(Self {
            project_name: parts[0].to_string(),
            branch: parts[1].to_string(),
            flow_name: parts[n - 2].replace('-', "_"),
            env: parts[n - 1].to_string(),
        })
    }
}

/// Keep only tags carrying a commit hash or package version.
pub fn relevant_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    tags.iter()
        .map(<S as AsRef<str>>::as_ref)
        .filter(|tag| RELEVANT_TAG_MARKERS.iter().any(|m| tag.contains(m)))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_four_parts() {
        let name = DeploymentName::parse("acme--main--daily-report--prod").unwrap();
        assert_eq!(name.project_name, "acme");
        assert_eq!(name.branch, "main");
        assert_eq!(name.flow_name, "daily_report");
        assert_eq!(name.env, "prod");
    }

    #[test]
    fn test_parse_extra_middle_parts() {
        let name = DeploymentName::parse("acme--feature-x--extra--etl--dev").unwrap();
        assert_eq!(name.branch, "feature-x");
        assert_eq!(name.flow_name, "etl");
        assert_eq!(name.env, "dev");
    }

    #[test]
    fn test_parse_too_few_parts() {
        assert!(DeploymentName::parse("acme--main--etl").is_none());
        assert!(DeploymentName::parse("plain").is_none());
    }

    #[test]
    fn test_relevant_tags() {
        let tags = ["COMMIT_HASH=abc123", "team-data", "PACKAGE_VERSION=1.2.0", "auto"];
        assert_eq!(
            relevant_tags(&tags),
            vec!["COMMIT_HASH=abc123".to_string(), "PACKAGE_VERSION=1.2.0".to_string()]
        );
    }
}
