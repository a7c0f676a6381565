use std::path::Path;
use std::process::{Command, ExitStatus};

use eyre::{Context, Result};
use tracing::info;

/// Run `python setup.py <args>` in `package_root`.
///
/// Output of the build is passed through unchanged. The exit status is
/// returned to the caller, spawning failures are errors.
pub fn run_setup(python: &str, package_root: &Path, args: &[String]) -> Result<ExitStatus> {
    info!(
        "Running `{python} setup.py {}` in {}",
        args.join(" "),
        package_root.to_string_lossy()
    );

    Command::new(python)
        .arg("setup.py")
        .args(args)
        .current_dir(package_root)
        .status()
        .wrap_err_with(|| format!("Cannot run `{python}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_interpreter_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_setup("/nonexistent/python", dir.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/python"));
    }

    #[cfg(unix)]
    #[test]
    fn exit_status_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let args = vec!["build_ext".to_owned()];
        assert!(run_setup("true", dir.path(), &args).unwrap().success());
        assert!(!run_setup("false", dir.path(), &args).unwrap().success());
    }
}
