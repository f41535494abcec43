//! Fake executables for tests.
//!
//! Shell scripts stand in for the averaging tool so that staging, manifest
//! and environment handling can be checked without the real binary.

use std::path::{Path, PathBuf};

/// File name the averaging tool is installed under.
pub const AVERAGING_TOOL: &str = "create_monthly_daynight_ctps.exe";

/// Records its arguments, the manifest and `LD_LIBRARY_PATH` into the working
/// directory, then writes the concatenated daily files as the output.
pub const RECORDING_AVERAGER: &str = r#"#!/bin/sh
printf '%s\n' "$@" > args.txt
cp "$1" manifest_seen.txt
printf '%s' "$LD_LIBRARY_PATH" > ld_library_path.txt
while read -r f; do cat "$f"; done < "$1" > "$2"
"#;

/// Exits successfully without writing anything.
pub const SILENT_AVERAGER: &str = "#!/bin/sh\nexit 0\n";

/// A script that exits with `code`.
pub fn failing_script(code: i32) -> String {
    format!("#!/bin/sh\necho 'averaging failed' >&2\nexit {}\n", code)
}

/// Write an executable script at `dir/name`.
pub fn write_executable(dir: &Path, name: &str, body: &str) -> PathBuf {
    std::fs::create_dir_all(dir).expect("Failed to create script directory");
    let path = dir.join(name);
    std::fs::write(&path, body).expect("Failed to write script");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
            .expect("Failed to make script executable");
    }
    path
}

/// Install a fake package at `package_dir` with `bin/<AVERAGING_TOOL>` and an
/// empty `lib/`.
pub fn install_package(package_dir: &Path, body: &str) -> PathBuf {
    std::fs::create_dir_all(package_dir.join("lib")).expect("Failed to create lib dir");
    write_executable(&package_dir.join("bin"), AVERAGING_TOOL, body)
}
