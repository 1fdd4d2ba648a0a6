use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// TestHarness provides an isolated project directory and runs the govgate
/// binary against it. The directory is removed on drop.
pub struct TestHarness {
    pub dir: TempDir,
    pub govgate_binary: PathBuf,
}

impl TestHarness {
    /// Creates an empty project with a `.govgate/` directory.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(temp_dir.path().join(".govgate")).expect("Failed to create .govgate dir");

        TestHarness {
            dir: temp_dir,
            govgate_binary: PathBuf::from(env!("CARGO_BIN_EXE_govgate")),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the project root, creating parent directories.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path().join(relative)).expect("Failed to read file")
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path().join(relative).exists()
    }

    /// Run govgate with `args` inside the project directory.
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(&self.govgate_binary)
            .args(args)
            .current_dir(self.path())
            .env("NO_COLOR", "1")
            .env_remove("GOVGATE_LOG")
            .env_remove("GOVGATE_QUIET")
            .output()
            .expect("Failed to run govgate")
    }

    /// Run `govgate validate` with extra args and return the output.
    pub fn validate(&self, args: &[&str]) -> Output {
        let mut full = vec!["validate"];
        full.extend_from_slice(args);
        self.run(&full)
    }

    /// Parse the JSON report artifact at the default location.
    pub fn report(&self) -> serde_json::Value {
        serde_json::from_str(&self.read(".govgate/report.json")).expect("Report is not valid JSON")
    }
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

pub fn exit_code(output: &Output) -> i32 {
    output.status.code().expect("govgate was killed by a signal")
}
