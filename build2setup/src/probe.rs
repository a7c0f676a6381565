use std::process::{Command, Stdio};

use clap::ValueEnum;
use tracing::{debug, info};

/// Asks torch itself, the same signal the extension build uses.
const XPU_PROBE: &str = "import sys, torch; sys.exit(0 if torch.xpu.is_available() else 1)";

/// How accelerator availability is decided.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum XpuMode {
    /// Ask the Python interpreter whether torch sees an XPU.
    #[default]
    Auto,
    /// Assume an XPU is available.
    On,
    /// Assume no XPU is available.
    Off,
}

/// Decide whether the SYCL front-end should be used.
///
/// Never fails: a missing interpreter, a missing torch or any other probe
/// failure counts as "no accelerator".
pub fn xpu_available(mode: XpuMode, python: &str) -> bool {
    let available = match mode {
        XpuMode::On => true,
        XpuMode::Off => false,
        XpuMode::Auto => torch_xpu_available(python),
    };

    info!(
        "XPU {} ({mode:?})",
        if available { "available" } else { "not available" }
    );

    available
}

fn torch_xpu_available(python: &str) -> bool {
    match Command::new(python)
        .args(["-c", XPU_PROBE])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
    {
        Ok(status) => {
            debug!("`{python}` XPU probe exited with {status}");
            status.success()
        }
        Err(e) => {
            debug!("Cannot run `{python}` for XPU probe: {e}");
            false
        }
    }
}
