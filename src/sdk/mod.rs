//! Named SDK objects invocable from the command line.
//!
//! A provider is registered under a well-known name and produces a JSON
//! document when called. Callers look providers up by that name only;
//! registering the same name twice is an error, so a lookup is never
//! ambiguous.

mod version;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use indexmap::IndexMap;
use serde_json::Value;

use crate::scanner::FlowScanner;

pub use version::{error_file_path, version_info, write_version_file, ErrorReport, VersionReport};

/// A zero-argument provider of structured data.
pub trait SdkObject: Send + Sync {
    fn call(&self) -> Result<Value>;
}

impl<F> SdkObject for F
where
    F: Fn() -> Result<Value> + Send + Sync,
{
    fn call(&self) -> Result<Value> {
        self()
    }
}

#[derive(Default)]
pub struct ObjectRegistry {
    objects: IndexMap<String, Box<dyn SdkObject>>,
}

impl ObjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, object: impl SdkObject + 'static) -> Result<()> {
        let name = name.into();
        if self.objects.contains_key(&name) {
            bail!("SDK object '{}' is already registered", name);
        }
        self.objects.insert(name, Box::new(object));
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.objects.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Result<&dyn SdkObject> {
        match self.objects.get(name) {
            Some(object) => Ok(object.as_ref()),
            None => {
                let available: Vec<&str> = self.names().collect();
                bail!(
                    "No SDK object named '{}' (available: {})",
                    name,
                    if available.is_empty() { "none".to_string() } else { available.join(", ") }
                )
            }
        }
    }

    pub fn invoke(&self, name: &str) -> Result<Value> {
        tracing::info!(object = name, "calling SDK object");
        self.get(name)?
            .call()
            .with_context(|| format!("SDK object '{}' failed", name))
    }

    /// Call `name` and write its JSON result to `output`.
    pub fn invoke_to_file(&self, name: &str, output: &Path) -> Result<()> {
        let value = self.invoke(name)?;
        let json = serde_json::to_string(&value).context("Failed to serialize SDK object output")?;
        std::fs::write(output, json)
            .with_context(|| format!("Failed to write output file: {}", output.display()))?;
        tracing::info!(path = %output.display(), "output saved");
        Ok(())
    }
}

/// Registry with the providers shipped by this crate:
/// - `flow_details`: the flows found under `flows_root`
/// - `version`: the crate version report
pub fn builtin_registry(flows_root: PathBuf) -> Result<ObjectRegistry> {
    let mut registry = ObjectRegistry::new();

    let flow_details = move || -> Result<Value> {
        let outcome = FlowScanner::for_root(&flows_root).scan_directory(&flows_root)?;
        Ok(serde_json::to_value(outcome.flows)?)
    };
    let version = || -> Result<Value> { Ok(serde_json::to_value(version_info())?) };

    registry.register("flow_details", flow_details)?;
    registry.register("version", version)?;
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_invoke() -> Result<()> {
        let mut registry = ObjectRegistry::new();
        registry.register("answer", || -> Result<Value> { Ok(json!({"value": 42})) })?;
        assert_eq!(registry.invoke("answer")?, json!({"value": 42}));
        Ok(())
    }

    #[test]
    fn test_duplicate_registration_rejected() -> Result<()> {
        let mut registry = ObjectRegistry::new();
        registry.register("x", || -> Result<Value> { Ok(Value::Null) })?;
        assert!(registry.register("x", || -> Result<Value> { Ok(Value::Null) }).is_err());
        Ok(())
    }

    #[test]
    fn test_unknown_name_lists_available() -> Result<()> {
        let registry = builtin_registry(PathBuf::from("."))?;
        let err = registry.invoke("missing").unwrap_err().to_string();
        assert!(err.contains("flow_details"));
        assert!(err.contains("version"));
        Ok(())
    }

    #[test]
    fn test_builtin_names_in_registration_order() -> Result<()> {
        let registry = builtin_registry(PathBuf::from("."))?;
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["flow_details", "version"]);
        Ok(())
    }

    #[test]
    fn test_invoke_to_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("etl.py"), "@flow()\ndef etl():\n    pass\n")?;
        let output = dir.path().join("out.json");

        let registry = builtin_registry(dir.path().to_path_buf())?;
        registry.invoke_to_file("flow_details", &output)?;

        let written: Value = serde_json::from_str(&std::fs::read_to_string(&output)?)?;
        let flows = written.as_object().unwrap();
        assert_eq!(flows.len(), 1);
        assert_eq!(flows.values().next().unwrap()["name"], "etl");
        Ok(())
    }

    #[test]
    fn test_failing_object_propagates() -> Result<()> {
        let registry = builtin_registry(PathBuf::from("/nonexistent/flows"))?;
        assert!(registry.invoke("flow_details").is_err());
        Ok(())
    }
}
