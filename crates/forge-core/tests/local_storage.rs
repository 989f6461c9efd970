use forge_core::storage::StorageRole;
use forge_core::{StorageConfig, StorageSpec};

#[test]
fn local_target_roundtrips_under_root() {
    let dir = tempfile::tempdir().unwrap();
    let root = format!("file://{}", dir.path().join("target").display());
    let cfg = StorageConfig::resolve(Some(StorageSpec::new("LocalFileSystem", root.clone())), None, None).unwrap();

    cfg.target.write("ds/time/0.json", b"[1]").unwrap();
    cfg.target.write("ds/time/1.json", b"[2]").unwrap();

    assert!(dir.path().join("target/ds/time/1.json").exists());
    assert_eq!(cfg.target.list("ds").unwrap(), vec!["ds/time/0.json".to_string(), "ds/time/1.json".to_string()]);
    assert_eq!(cfg.handle(StorageRole::Target).url("ds"), format!("{root}/ds"));
}

#[test]
fn handles_survive_serialization_for_remote_shipping() {
    let cfg = StorageConfig::resolve(Some(StorageSpec::new("memory", "memory://ship/")), None, None).unwrap();
    let payload = serde_json::to_value(&cfg).unwrap();
    assert_eq!(payload["target"]["spec"]["fsspec_class"], "memory");
    let back: StorageConfig = serde_json::from_value(payload).unwrap();
    assert_eq!(back, cfg);
}
