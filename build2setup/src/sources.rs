use std::fmt::Display;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{debug, warn};

use crate::extension::{ExtensionKind, Language};

/// Directory with the C++ sources, relative to the library directory.
pub const CSRC_DIR: &str = "csrc";

/// Directory with the SYCL kernels, relative to [`CSRC_DIR`].
pub const SYCL_DIR: &str = "sycl";

/// Collect the extension sources of `library` under the package `root`.
///
/// `<library>/csrc/*.cpp` is always collected, `<library>/csrc/sycl/*.sycl`
/// only for the SYCL front-end. Paths are returned relative to `root`, the
/// C++ sources first, each group sorted. Missing directories contribute no
/// sources.
pub fn collect_sources(root: &Path, library: &str, kind: ExtensionKind) -> Vec<PathBuf> {
    let csrc = Path::new(library).join(CSRC_DIR);

    let mut sources = glob_sources(root, &csrc, Language::Cxx);
    if kind == ExtensionKind::Sycl {
        sources.extend(glob_sources(root, &csrc.join(SYCL_DIR), Language::Sycl));
    }

    sources
}

fn glob_sources(root: &Path, dir: &Path, language: Language) -> Vec<PathBuf> {
    let full_dir = root.join(dir);
    let pattern = format!(
        "{}/*.{}",
        Pattern::escape(&full_dir.to_string_lossy()),
        language.file_extension()
    );

    let entries = match glob::glob(&pattern) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Invalid source pattern `{pattern}`: {e}");
            return Vec::new();
        }
    };

    let sources = keep_sources(root, entries);

    debug!(
        "Found {} {language} source(s) in {}",
        sources.len(),
        full_dir.to_string_lossy()
    );

    sources
}

/// Keep the regular files among glob `entries`, relative to `root` and
/// sorted. Entries that cannot be read are skipped.
fn keep_sources<E: Display>(
    root: &Path,
    entries: impl IntoIterator<Item = Result<PathBuf, E>>,
) -> Vec<PathBuf> {
    let mut sources = entries
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable source: {e}");
                None
            }
        })
        .filter(|path| path.is_file())
        .map(|path| {
            let relative = path.strip_prefix(root).map(Path::to_path_buf);
            relative.unwrap_or(path)
        })
        .collect::<Vec<_>>();
    sources.sort();
    sources
}
