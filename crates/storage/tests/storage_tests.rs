//! Filesystem catalog and delivery registry against real directory trees.

use std::path::PathBuf;

use storage::{
    DeliveryRegistry, FilesystemCatalog, ProductCatalog, ProductRef, StorageError,
    YamlDeliveryRegistry,
};
use tokio_test::{assert_err, assert_ok};

fn daily(day: u32) -> ProductRef {
    ProductRef::new(
        "HIRS_CTP_DAILY",
        "HIRS/noaa-19/2015/CTP_DAILY",
        format!("ctp.daily.noaa-19.d201504{:02}.nc", day),
    )
}

#[tokio::test]
async fn test_catalog_sees_written_products() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FilesystemCatalog::new(dir.path());

    let stored = daily(17);
    let path = catalog.path(&stored);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, b"ctp").unwrap();

    assert!(assert_ok!(catalog.exists(&stored).await));
    assert!(!assert_ok!(catalog.exists(&daily(18)).await));
}

#[tokio::test]
async fn test_catalog_ignores_directories() {
    let dir = tempfile::tempdir().unwrap();
    let catalog = FilesystemCatalog::new(dir.path());

    let product = daily(1);
    std::fs::create_dir_all(catalog.path(&product)).unwrap();

    assert!(!assert_ok!(catalog.exists(&product).await));
}

#[tokio::test]
async fn test_registry_file_resolves_relative_paths() {
    let dir = tempfile::tempdir().unwrap();
    let registry_file = dir.path().join("deliveries.yaml");
    std::fs::write(
        &registry_file,
        r#"
deliveries:
  - name: hirs_ctp_monthly
    delivery_id: 20180803-1
    path: hirs_ctp_monthly/20180803-1
    version: v20180803
  - name: hirs_ctp_monthly
    delivery_id: 20150915-1
    path: /opt/legacy/hirs_ctp_monthly
    version: v20150915
"#,
    )
    .unwrap();

    let registry = assert_ok!(YamlDeliveryRegistry::load(&registry_file));
    assert_eq!(registry.len(), 2);

    let current = assert_ok!(registry.lookup("hirs_ctp_monthly", "20180803-1").await);
    assert_eq!(current.path, dir.path().join("hirs_ctp_monthly/20180803-1"));
    assert_eq!(current.version, "v20180803");

    let legacy = assert_ok!(registry.lookup("hirs_ctp_monthly", "20150915-1").await);
    assert_eq!(legacy.path, PathBuf::from("/opt/legacy/hirs_ctp_monthly"));

    let missing = assert_err!(registry.lookup("hirs_ctp_daily", "20180803-1").await);
    assert!(matches!(missing, StorageError::UnknownDelivery { .. }));
}

#[test]
fn test_missing_registry_file() {
    let err = assert_err!(YamlDeliveryRegistry::load(std::path::Path::new(
        "/nonexistent/deliveries.yaml"
    )));
    assert!(err.to_string().contains("/nonexistent/deliveries.yaml"));
}
