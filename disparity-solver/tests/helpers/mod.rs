//! Helpers to run the solver binary in integration tests.
#![allow(
    dead_code,
    reason = "is used in integration tests but unable to find a way to silence these warnings"
)]

use std::ffi::OsStr;
use std::fs::File;
use std::path::Path;
use std::path::PathBuf;
use std::process::Command;
use std::process::ExitStatus;
use std::process::Stdio;
use std::time::Duration;

use disparity_solver::pgm_format;
use disparity_solver::pgm_format::PgmImage;
use wait_timeout::ChildExt;

const TEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug)]
pub(crate) struct SolverRun {
    pub(crate) status: ExitStatus,
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

/// A fresh directory for the files of a single test.
pub(crate) fn test_directory(name: &str) -> PathBuf {
    let directory = Path::new(env!("CARGO_TARGET_TMPDIR")).join(name);
    if directory.exists() {
        std::fs::remove_dir_all(&directory).expect("Failed to clear the test directory.");
    }
    std::fs::create_dir_all(&directory).expect("Failed to create the test directory.");
    directory
}

pub(crate) fn write_file(path: impl AsRef<Path>, content: &str) {
    std::fs::write(path, content).expect("Failed to write the test input.");
}

pub(crate) fn path_arg(path: &Path) -> &str {
    path.to_str().expect("Test paths are valid UTF-8.")
}

pub(crate) fn read_image(path: impl AsRef<Path>) -> PgmImage {
    let file = File::open(path).expect("Failed to open the disparity map.");
    pgm_format::decode(file).expect("The disparity map is a valid PGM image.")
}

pub(crate) fn run_solver(
    directory: impl AsRef<Path>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> SolverRun {
    let directory = directory.as_ref();
    let solver = PathBuf::from(env!("CARGO_BIN_EXE_disparity-solver"));

    let log_file_path = directory.join("solver.log");
    let err_file_path = directory.join("solver.err");

    let mut child = Command::new(solver)
        .args(args)
        .stdout(File::create(&log_file_path).expect("Failed to create log file."))
        .stderr(File::create(&err_file_path).expect("Failed to create error file."))
        .stdin(Stdio::null())
        .spawn()
        .expect("Failed to run solver.");

    let status = match child.wait_timeout(TEST_TIMEOUT) {
        Ok(None) => panic!("solver took more than {} seconds", TEST_TIMEOUT.as_secs()),
        Ok(Some(status)) => status,
        Err(e) => panic!("error starting solver: {e}"),
    };

    SolverRun {
        status,
        stdout: std::fs::read_to_string(log_file_path).expect("Failed to read the log file."),
        stderr: std::fs::read_to_string(err_file_path).expect("Failed to read the error file."),
    }
}
