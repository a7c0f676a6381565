use std::path::{Path, PathBuf};

use eyre::{bail, Context, Result};
use tracing::info;

pub mod config;
pub mod delegate;
pub mod descriptor;
pub mod extension;
pub mod fileset;
pub mod probe;
pub mod setup;
pub mod sources;
pub mod version;

use config::Build;
use descriptor::ModuleDescriptor;
use extension::select_extension;
use sources::collect_sources;

/// A loaded build configuration together with the extension module it
/// describes.
#[derive(Debug)]
pub struct Configuration {
    pub build: Build,
    /// Directory containing `build.toml`, sources are relative to it.
    pub package_root: PathBuf,
    pub descriptor: ModuleDescriptor,
}

/// Load `build_toml` and assemble the module descriptor for the given
/// accelerator availability.
pub fn configure(build_toml: impl AsRef<Path>, use_sycl: bool) -> Result<Configuration> {
    let build_toml = build_toml.as_ref();
    let build = Build::load(build_toml)?;
    let package_root = package_root(build_toml)?;

    let (kind, extra_compile_args) = select_extension(use_sycl, &build.extension);
    info!("Using {} front-end", kind.class_name());

    let sources = collect_sources(&package_root, &build.general.python_name(), kind);
    info!("Collected {} source(s)", sources.len());

    let descriptor = ModuleDescriptor::new(
        build.general.module_name(),
        kind,
        sources,
        extra_compile_args,
    )
    .wrap_err("Cannot create extension module descriptor")?;

    Ok(Configuration {
        build,
        package_root,
        descriptor,
    })
}

/// Directory containing `build_toml`, as an absolute path.
pub fn package_root(build_toml: impl AsRef<Path>) -> Result<PathBuf> {
    let build_toml = build_toml.as_ref();
    let absolute = std::path::absolute(build_toml)?;
    match absolute.parent() {
        Some(parent) => Ok(parent.to_owned()),
        None => bail!(
            "Cannot get parent path of `{}`",
            build_toml.to_string_lossy()
        ),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn package() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::write(
            root.join("build.toml"),
            "[general]\nname = \"extension-cpp\"\n",
        )
        .unwrap();
        for path in [
            "extension_cpp/csrc/a.cpp",
            "extension_cpp/csrc/b.cpp",
            "extension_cpp/csrc/sycl/k.sycl",
        ] {
            let path = root.join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "").unwrap();
        }
        dir
    }

    #[test]
    fn configure_without_accelerator() {
        let dir = package();
        let configuration = configure(dir.path().join("build.toml"), false).unwrap();
        let descriptor = &configuration.descriptor;

        assert_eq!(configuration.package_root, dir.path());
        assert_eq!(descriptor.name(), "extension_cpp._C");
        assert_eq!(descriptor.kind(), extension::ExtensionKind::Cpp);
        assert_eq!(
            descriptor.sources(),
            &[
                PathBuf::from("extension_cpp/csrc/a.cpp"),
                PathBuf::from("extension_cpp/csrc/b.cpp"),
            ]
        );
    }

    #[test]
    fn configure_with_accelerator() {
        let dir = package();
        let configuration = configure(dir.path().join("build.toml"), true).unwrap();
        assert_eq!(
            configuration.descriptor.sources().last(),
            Some(&PathBuf::from("extension_cpp/csrc/sycl/k.sycl"))
        );
    }

    #[test]
    fn configure_is_idempotent() {
        let dir = package();
        let build_toml = dir.path().join("build.toml");
        for use_sycl in [false, true] {
            let first = configure(&build_toml, use_sycl).unwrap().descriptor;
            let second = configure(&build_toml, use_sycl).unwrap().descriptor;
            assert_eq!(first.to_json().unwrap(), second.to_json().unwrap());
        }
    }

    #[test]
    fn package_root_is_absolute_parent() {
        let dir = package();
        let root = package_root(dir.path().join("build.toml")).unwrap();
        assert_eq!(root, dir.path());
        assert!(root.is_absolute());
    }

    #[test]
    fn missing_config() {
        let dir = tempfile::tempdir().unwrap();
        assert!(configure(dir.path().join("build.toml"), false).is_err());
    }
}
