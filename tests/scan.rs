//! Directory-level scanning over real file trees.

use std::fs;
use std::path::Path;

use anyhow::Result;
use flowscan::{scan_directory, Config, FlowKind, FlowScanner, ScanError};
use tempfile::TempDir;

fn write(dir: &Path, rel: &str, content: &str) -> Result<()> {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

const ETL: &str = r#"
from prefect import flow


@flow(name="nightly-etl", description="Load the warehouse")
def run_etl():
    """Ignored in favour of the keyword."""
    pass


class Pipelines:
    @flow()
    def refresh(self):
        """Refresh caches."""


@flow(retries=3)
async def backfill():
    pass
"#;

#[test]
fn test_invalid_file_is_skipped() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "good.py", "@flow()\ndef ok():\n    pass\n")?;
    write(dir.path(), "bad.py", "@flow()\ndef broken(:\n    pass\n")?;

    let outcome = FlowScanner::new(Config::default()).scan_directory(dir.path())?;
    assert_eq!(outcome.flows.len(), 1);
    assert_eq!(outcome.files_scanned, 2);
    assert_eq!(outcome.skipped.len(), 1);
    assert!(matches!(outcome.skipped[0], ScanError::FileParse { .. }));
    assert!(outcome.skipped[0].is_per_file());
    assert_eq!(outcome.skipped[0].path(), dir.path().join("bad.py"));

    let record = outcome.flows.values().next().unwrap();
    assert_eq!(record.original_name, "ok");
    assert_eq!(record.module_name, "good");
    Ok(())
}

#[test]
fn test_unreadable_file_is_skipped() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "good.py", "@flow()\ndef ok():\n    pass\n")?;
    fs::write(dir.path().join("latin1.py"), [0x23u8, 0x20, 0xe9, 0xff, 0x0a])?;

    let outcome = FlowScanner::new(Config::default()).scan_directory(dir.path())?;
    assert_eq!(outcome.flows.len(), 1);
    assert!(matches!(outcome.skipped[0], ScanError::FileRead { .. }));
    Ok(())
}

#[test]
fn test_missing_root() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");

    let err = scan_directory(&missing).unwrap_err();
    assert!(matches!(err, ScanError::RootNotFound { .. }));
}

#[cfg(unix)]
#[test]
fn test_unreadable_root_is_not_an_empty_scan() -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new()?;
    let root = dir.path().join("flows");
    write(&root, "a.py", "@flow()\ndef a():\n    pass\n")?;
    fs::set_permissions(&root, fs::Permissions::from_mode(0o000))?;

    let still_listable = fs::read_dir(&root).is_ok();
    let result = scan_directory(&root);
    fs::set_permissions(&root, fs::Permissions::from_mode(0o755))?;
    if still_listable {
        // Running as root: mode 000 is not enforced
        return Ok(());
    }

    let err = result.unwrap_err();
    assert!(matches!(err, ScanError::RootUnreadable { .. }));
    assert_eq!(err.path(), root);
    assert!(!err.is_per_file());
    Ok(())
}

#[test]
fn test_file_root_is_not_a_directory() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "single.py", "@flow()\ndef a():\n    pass\n")?;

    let err = scan_directory(&dir.path().join("single.py")).unwrap_err();
    assert!(matches!(err, ScanError::RootNotFound { .. }));
    Ok(())
}

#[test]
fn test_empty_directory() -> Result<()> {
    let dir = TempDir::new()?;
    assert!(scan_directory(dir.path())?.is_empty());

    write(dir.path(), "README.md", "@flow()\n")?;
    write(dir.path(), "plain.py", "def helper():\n    return 1\n")?;
    assert!(scan_directory(dir.path())?.is_empty());
    Ok(())
}

#[test]
fn test_records_carry_provenance() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "pipelines/etl.py", ETL)?;

    let flows = scan_directory(dir.path())?;
    assert_eq!(flows.len(), 3);

    let expected_file = dir.path().join("pipelines/etl.py");
    for record in flows.values() {
        assert_eq!(record.module_name, "etl");
        assert_eq!(Path::new(&record.source_file), expected_file);
    }

    let etl = flows.values().find(|r| r.original_name == "nightly-etl").unwrap();
    assert_eq!(etl.name, "nightly_etl");
    assert_eq!(etl.description, "Load the warehouse");
    assert_eq!(etl.kind, FlowKind::Function);

    let refresh = flows.values().find(|r| r.original_name == "refresh").unwrap();
    assert_eq!(refresh.kind, FlowKind::Method);
    assert_eq!(refresh.enclosing_class.as_deref(), Some("Pipelines"));
    assert_eq!(refresh.description, "Refresh caches.");

    let backfill = flows.values().find(|r| r.original_name == "backfill").unwrap();
    assert!(backfill.is_async);
    assert_eq!(backfill.enclosing_class, None);
    Ok(())
}

#[test]
fn test_qualified_marker_matches_like_bare() -> Result<()> {
    let bare = TempDir::new()?;
    write(bare.path(), "m.py", "@flow(name=\"x\")\ndef f():\n    pass\n")?;
    let qualified = TempDir::new()?;
    write(qualified.path(), "m.py", "@prefect.flow(name=\"x\")\ndef f():\n    pass\n")?;

    let a = scan_directory(bare.path())?;
    let b = scan_directory(qualified.path())?;
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);

    let (ra, rb) = (&a[0], &b[0]);
    assert_eq!(ra.original_name, rb.original_name);
    assert_eq!(ra.kind, rb.kind);
    assert_eq!(ra.description, rb.description);
    Ok(())
}

#[test]
fn test_scan_is_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    write(dir.path(), "a/etl.py", ETL)?;
    write(dir.path(), "b/more.py", "@flow()\ndef more():\n    pass\n")?;

    let first = scan_directory(dir.path())?;
    let second = scan_directory(dir.path())?;
    assert_eq!(first, second);
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        second.keys().collect::<Vec<_>>()
    );
    Ok(())
}

#[test]
fn test_parallel_matches_sequential() -> Result<()> {
    let dir = TempDir::new()?;
    for i in 0..20 {
        write(
            dir.path(),
            &format!("pkg{}/flows_{:02}.py", i % 4, i),
            &format!("@flow()\ndef shared():\n    pass\n\n@flow()\ndef unique_{}():\n    pass\n", i),
        )?;
    }

    let parallel = FlowScanner::new(Config::default()).scan_directory(dir.path())?;
    let sequential = FlowScanner::new(Config {
        parallel: false,
        ..Default::default()
    })
    .scan_directory(dir.path())?;

    assert_eq!(parallel.flows, sequential.flows);
    assert_eq!(parallel.collisions, sequential.collisions);
    Ok(())
}

#[test]
fn test_collision_keeps_later_path() -> Result<()> {
    let dir = TempDir::new()?;
    let source = "@flow()\ndef shared():\n    pass\n";
    write(dir.path(), "a.py", source)?;
    write(dir.path(), "b.py", source)?;

    let outcome = FlowScanner::new(Config::default()).scan_directory(dir.path())?;
    assert_eq!(outcome.flows.len(), 1);
    assert_eq!(outcome.collisions.len(), 1);

    let survivor = outcome.flows.values().next().unwrap();
    assert_eq!(survivor.module_name, "b");
    Ok(())
}

#[test]
fn test_config_file_sets_marker_and_excludes() -> Result<()> {
    let dir = TempDir::new()?;
    write(
        dir.path(),
        "flowscan.toml",
        "marker = \"pipeline\"\nexclude = [\"vendored/**\"]\n",
    )?;
    write(dir.path(), "jobs.py", "@pipeline()\ndef job():\n    pass\n\n@flow()\ndef other():\n    pass\n")?;
    write(dir.path(), "vendored/lib.py", "@pipeline()\ndef hidden():\n    pass\n")?;

    let flows = scan_directory(dir.path())?;
    assert_eq!(flows.len(), 1);
    assert_eq!(flows[0].original_name, "job");
    Ok(())
}
