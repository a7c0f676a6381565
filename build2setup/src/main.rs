use std::path::{Path, PathBuf};
use std::process::ExitCode;

use build2setup::{
    config::Build,
    configure,
    delegate::run_setup,
    package_root,
    probe::{xpu_available, XpuMode},
    setup::{template_env, write_setup},
    Configuration,
};
use clap::{Args, Parser, Subcommand};
use eyre::{ensure, Context, Result};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate setup.py and pyproject.toml for the extension build.
    GenerateSetup {
        #[arg(name = "BUILD_TOML")]
        build_toml: PathBuf,

        /// The directory to write the generated files to
        /// (directory of `BUILD_TOML` when absent).
        #[arg(name = "TARGET_DIR")]
        target_dir: Option<PathBuf>,

        /// Force-overwrite existing files.
        #[arg(short, long)]
        force: bool,

        #[command(flatten)]
        probe: ProbeArgs,
    },

    /// Print the extension module descriptor as JSON.
    Describe {
        #[arg(name = "BUILD_TOML")]
        build_toml: PathBuf,

        #[command(flatten)]
        probe: ProbeArgs,
    },

    /// Regenerate setup.py next to `BUILD_TOML` and run it.
    Build {
        #[arg(name = "BUILD_TOML")]
        build_toml: PathBuf,

        #[command(flatten)]
        probe: ProbeArgs,

        /// Arguments passed to setup.py.
        #[arg(name = "SETUP_ARGS", last = true, default_values = ["build_ext", "--inplace"])]
        setup_args: Vec<String>,
    },

    /// Validate the build.toml file.
    Validate {
        #[arg(name = "BUILD_TOML")]
        build_toml: PathBuf,
    },
}

#[derive(Args, Debug)]
struct ProbeArgs {
    /// Whether to build the SYCL kernels.
    #[arg(long, value_enum, env = "BUILD2SETUP_XPU", default_value_t = XpuMode::Auto)]
    xpu: XpuMode,

    /// Python interpreter used for probing and building.
    #[arg(long, env = "PYTHON", default_value = "python3")]
    python: String,
}

impl ProbeArgs {
    fn use_sycl(&self) -> bool {
        xpu_available(self.xpu, &self.python)
    }
}

fn main() -> Result<ExitCode> {
    init_logging();

    let args = Cli::parse();
    match args.command {
        Commands::GenerateSetup {
            build_toml,
            target_dir,
            force,
            probe,
        } => generate_setup(build_toml, target_dir, force, &probe).map(|_| ExitCode::SUCCESS),
        Commands::Describe { build_toml, probe } => {
            describe(build_toml, &probe).map(|_| ExitCode::SUCCESS)
        }
        Commands::Build {
            build_toml,
            probe,
            setup_args,
        } => build(build_toml, &probe, &setup_args),
        Commands::Validate { build_toml } => validate(build_toml).map(|_| ExitCode::SUCCESS),
    }
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_env("BUILD2SETUP_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn generate_setup(
    build_toml: PathBuf,
    target_dir: Option<PathBuf>,
    force: bool,
    probe: &ProbeArgs,
) -> Result<Configuration> {
    let target_dir = target_dir_or_package_root(&build_toml, target_dir)?;

    let configuration = configure(&build_toml, probe.use_sycl())?;

    // Out-of-tree setup.py: sources and packages are found in the package
    // root, not next to the generated file.
    let package_dir = (!same_dir(&target_dir, &configuration.package_root))
        .then_some(configuration.package_root.as_path());
    let descriptor = match package_dir {
        Some(root) => configuration.descriptor.clone().rooted_at(root),
        None => configuration.descriptor.clone(),
    };

    let file_set = write_setup(
        &template_env(),
        &configuration.build.general,
        &descriptor,
        package_dir,
    )?;
    file_set.write(&target_dir, force)?;

    Ok(configuration)
}

fn describe(build_toml: PathBuf, probe: &ProbeArgs) -> Result<()> {
    let configuration = configure(&build_toml, probe.use_sycl())?;
    let json = configuration
        .descriptor
        .to_json()
        .wrap_err("Cannot serialize extension module descriptor")?;
    println!("{json}");
    Ok(())
}

fn build(build_toml: PathBuf, probe: &ProbeArgs, setup_args: &[String]) -> Result<ExitCode> {
    let configuration = generate_setup(build_toml, None, true, probe)?;

    let status = run_setup(&probe.python, &configuration.package_root, setup_args)?;
    if status.success() {
        info!("Build of {} finished", configuration.descriptor.name());
        return Ok(ExitCode::SUCCESS);
    }

    error!("setup.py failed with {status}");
    let code = status
        .code()
        .and_then(|code| u8::try_from(code).ok())
        .filter(|&code| code != 0)
        .unwrap_or(1);
    Ok(ExitCode::from(code))
}

/// Use `target_dir` when given, the package root otherwise.
fn target_dir_or_package_root(build_toml: &Path, target_dir: Option<PathBuf>) -> Result<PathBuf> {
    let Some(target_dir) = target_dir else {
        return package_root(build_toml);
    };

    ensure!(
        target_dir.is_dir(),
        "`{}` is not a directory",
        target_dir.to_string_lossy()
    );
    Ok(target_dir)
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

fn validate(build_toml: PathBuf) -> Result<()> {
    Build::load(&build_toml)?;
    info!("{} is valid", build_toml.to_string_lossy());
    Ok(())
}
