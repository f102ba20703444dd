use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use tempfile::TempDir;
use toolchest::Toolbox;

// TOOLCHEST_HOME is process-wide; serialize the tests that set it.
static HOME_LOCK: Mutex<()> = Mutex::new(());

pub struct IntegrationHarness {
    home: TempDir,
    _guard: MutexGuard<'static, ()>,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let guard = HOME_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let home = TempDir::new().expect("failed to create temp home");
        env::set_var("TOOLCHEST_HOME", home.path());
        Self {
            home,
            _guard: guard,
        }
    }

    pub fn home_path(&self) -> &Path {
        self.home.path()
    }

    pub fn toolbox(&self) -> Toolbox {
        Toolbox::open().expect("failed to open toolbox")
    }

    /// Drops a fake tool file into a directory under the storage root.
    pub fn write_tool(&self, dir: &Path, file_name: &str) -> PathBuf {
        fs::create_dir_all(dir).expect("failed to create tool directory");
        let path = dir.join(file_name);
        fs::write(&path, b"tool bytes").expect("failed to write tool file");
        path
    }
}

mod catalog_scan;
mod record_store;
mod usage_tracking;
