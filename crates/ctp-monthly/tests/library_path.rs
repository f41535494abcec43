//! The averaging tool inherits the caller's library search path.
//!
//! Kept in its own test binary: it sets a process-wide environment variable.

use std::sync::Arc;

use ctp_monthly::{
    Computation, DailyComputation, ExecutableLocator, HirsCtpDaily, HirsCtpMonthly, RunOptions,
    LIBRARY_PATH_VAR,
};
use hirs_common::Satellite;
use test_utils::{
    daily_contexts, date, install_package, monthly_context, temp_test_dir, RecordingCatalog,
    RECORDING_AVERAGER,
};
use tokio_test::assert_ok;

const PREEXISTING: &str = "/opt/preexisting/lib:/usr/local/netcdf/lib";

#[cfg(unix)]
#[tokio::test]
async fn test_library_path_keeps_existing_entries() {
    std::env::set_var(LIBRARY_PATH_VAR, PREEXISTING);

    let dir = temp_test_dir();
    let catalog = Arc::new(RecordingCatalog::new(dir.path().join("catalog")));
    let package_dir = dir.path().join("packages/v20150915");
    let work_root = dir.path().join("work");
    std::fs::create_dir_all(&work_root).unwrap();
    install_package(&package_dir, RECORDING_AVERAGER);

    let daily = HirsCtpDaily::with_cutoff(date(2100, 1, 1));
    let first = daily_contexts(Satellite::MetopB, 2017, 6)
        .into_iter()
        .next()
        .unwrap();
    catalog.add_with_file(&daily.output_product(&first), b"2017-06-01\n");

    let job = HirsCtpMonthly::new(
        catalog,
        Arc::new(daily),
        ExecutableLocator::package_root(dir.path().join("packages")),
    )
    .with_options(RunOptions {
        work_root,
        ..Default::default()
    });

    let june = monthly_context(Satellite::MetopB, 2017, 6);
    let inputs = assert_ok!(job.build_task(&june).await);
    let outputs = assert_ok!(job.run_task(&inputs, &june).await);

    let seen = std::fs::read_to_string(outputs.out.parent().unwrap().join("ld_library_path.txt"))
        .unwrap();
    assert_eq!(
        seen,
        format!("{}:{}", package_dir.join("lib").display(), PREEXISTING)
    );
}
