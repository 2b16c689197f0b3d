use std::path::PathBuf;
use std::process::ExitStatus;

use assert_cmd::Command;
use multiprojects_lib::jsonl::save_snapshot;
use tempfile::TempDir;

use super::fixtures;

pub struct MpiWorkspace {
    pub temp_dir: TempDir,
    pub root: PathBuf,
}

impl MpiWorkspace {
    #[must_use]
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir");
        let root = temp_dir.path().join(".mpi");
        Self { temp_dir, root }
    }

    /// Workspace pre-populated with the shared tracker fixture.
    #[must_use]
    pub fn seeded() -> Self {
        let workspace = Self::new();
        std::fs::create_dir_all(&workspace.root).expect("workspace dir");
        save_snapshot(&workspace.root.join("data.json"), &fixtures::tracker())
            .expect("seed snapshot");
        workspace
    }

    pub fn write_config(&self, yaml: &str) {
        std::fs::create_dir_all(&self.root).expect("workspace dir");
        std::fs::write(self.root.join("config.yaml"), yaml).expect("write config");
    }

    #[must_use]
    pub fn journal_lines(&self) -> Vec<String> {
        std::fs::read_to_string(self.root.join("journal.jsonl"))
            .unwrap_or_default()
            .lines()
            .filter(|l| !l.trim().is_empty())
            .map(ToString::to_string)
            .collect()
    }
}

pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

pub fn run_mpi<I, S>(workspace: &MpiWorkspace, args: I, label: &str) -> CmdOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<std::ffi::OsStr>,
{
    let mut cmd = Command::cargo_bin("mpi").expect("mpi binary");
    cmd.current_dir(workspace.temp_dir.path())
        .arg("--workspace")
        .arg(&workspace.root)
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("MPI_WORKSPACE")
        .env_remove("MPI_NOTIFIABLE_PERMISSION")
        .env_remove("MPI_DETAIL_ORDER");

    let output = cmd.output().expect("run mpi");
    let result = CmdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    };
    if !result.status.success() {
        eprintln!("[{label}] mpi failed:\n{}", result.stderr);
    }
    result
}
