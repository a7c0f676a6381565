use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{ensure, Context, Result};
use itertools::Itertools;
use tracing::info;

/// Generated files, keyed by their path relative to the target directory.
#[derive(Debug, Default)]
pub struct FileSet(BTreeMap<PathBuf, Vec<u8>>);

impl FileSet {
    pub fn new() -> FileSet {
        FileSet::default()
    }

    pub fn entry(&mut self, path: impl Into<PathBuf>) -> &mut Vec<u8> {
        self.0.entry(path.into()).or_default()
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.0.get(path.as_ref()).map(Vec::as_slice)
    }

    /// Files of this set that are already present in `target_dir`.
    pub fn existing_in<'a>(&'a self, target_dir: &'a Path) -> impl Iterator<Item = &'a Path> {
        self.0
            .keys()
            .map(PathBuf::as_path)
            .filter(move |path| target_dir.join(path).exists())
    }

    /// Write all files. Nothing is written when any file already exists and
    /// `force` is not set.
    pub fn write(&self, target_dir: &Path, force: bool) -> Result<()> {
        if !force {
            let existing = self
                .existing_in(target_dir)
                .map(|path| path.to_string_lossy())
                .join(", ");
            ensure!(
                existing.is_empty(),
                "Generated file(s) already present in `{}`: {existing}\nPass `--force` to replace them.",
                target_dir.to_string_lossy()
            );
        }

        for (path, content) in &self.0 {
            let full_path = target_dir.join(path);
            write_file(&full_path, content)?;
            info!("Wrote {}", full_path.to_string_lossy());
        }

        Ok(())
    }
}

fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Cannot create directory `{}`", dir.to_string_lossy()))?;
    }

    fs::write(path, content).wrap_err_with(|| format!("Cannot write `{}`", path.to_string_lossy()))
}
