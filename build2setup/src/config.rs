use std::{fs, path::Path};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::version::Version;

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Build {
    pub general: General,

    #[serde(default)]
    pub extension: ExtensionConfig,
}

impl Build {
    /// Read, parse and validate a `build.toml`.
    pub fn load(build_toml: impl AsRef<Path>) -> Result<Self> {
        let build_toml = build_toml.as_ref();
        let toml_data = fs::read_to_string(build_toml)
            .wrap_err_with(|| format!("Cannot read from {}", build_toml.to_string_lossy()))?;

        let build: Build = toml::from_str(&toml_data)
            .wrap_err_with(|| format!("Cannot parse TOML in {}", build_toml.to_string_lossy()))?;

        build.validate().wrap_err_with(|| {
            format!("Invalid build configuration in {}", build_toml.to_string_lossy())
        })?;

        Ok(build)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.general.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }

        let python_name = self.general.python_name();
        if !is_python_identifier(&python_name) {
            return Err(ConfigError::InvalidPythonName { name: python_name });
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct General {
    pub name: String,
    pub version: Option<Version>,
    pub description: Option<String>,
}

impl General {
    /// Name of the library as a Python package.
    pub fn python_name(&self) -> String {
        self.name.replace("-", "_")
    }

    /// Dotted name of the compiled extension module inside the package.
    pub fn module_name(&self) -> String {
        format!("{}._C", self.python_name())
    }

    pub fn version(&self) -> Version {
        self.version.clone().unwrap_or_default()
    }
}

/// Per-language compile flag overrides.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct ExtensionConfig {
    pub cxx_flags: Option<Vec<String>>,
    pub sycl_flags: Option<Vec<String>>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("`general.name` must not be empty")]
    EmptyName,
    #[error("`{name}` is not a valid Python package name")]
    InvalidPythonName { name: String },
}

/// Reserved words, these cannot be imported as package names.
const PYTHON_KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if",
    "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try",
    "while", "with", "yield",
];

fn is_python_identifier(name: &str) -> bool {
    if PYTHON_KEYWORDS.contains(&name) {
        return false;
    }

    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_data: &str) -> Result<Build, toml::de::Error> {
        toml::from_str(toml_data)
    }

    #[test]
    fn minimal_config() {
        let build = parse("[general]\nname = \"extension-cpp\"\n").unwrap();
        assert_eq!(build.general.python_name(), "extension_cpp");
        assert_eq!(build.general.module_name(), "extension_cpp._C");
        assert_eq!(build.general.version().to_string(), "0.1.0");
        assert!(build.extension.cxx_flags.is_none());
        assert_eq!(build.validate(), Ok(()));
    }

    #[test]
    fn flag_overrides() {
        let build = parse(
            r#"
            [general]
            name = "extension_cpp"
            version = "1.2.0"

            [extension]
            cxx-flags = ["-O3", "-Wall"]
            "#,
        )
        .unwrap();
        assert_eq!(
            build.extension.cxx_flags.as_deref(),
            Some(&["-O3".to_owned(), "-Wall".to_owned()][..])
        );
        assert!(build.extension.sycl_flags.is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(parse("[general]\nname = \"x\"\nbackends = [\"xpu\"]\n").is_err());
        assert!(parse("[general]\nname = \"x\"\n[extension]\nhip-flags = []\n").is_err());
    }

    #[test]
    fn invalid_names() {
        let build = parse("[general]\nname = \"\"\n").unwrap();
        assert_eq!(build.validate(), Err(ConfigError::EmptyName));

        let build = parse("[general]\nname = \"1ext\"\n").unwrap();
        assert_eq!(
            build.validate(),
            Err(ConfigError::InvalidPythonName {
                name: "1ext".to_owned()
            })
        );

        let build = parse("[general]\nname = \"ext.cpp\"\n").unwrap();
        assert!(build.validate().is_err());
    }

    #[test]
    fn keywords_are_not_package_names() {
        for name in ["class", "import", "None"] {
            let build = parse(&format!("[general]\nname = \"{name}\"\n")).unwrap();
            assert_eq!(
                build.validate(),
                Err(ConfigError::InvalidPythonName {
                    name: name.to_owned()
                })
            );
        }

        // Keywords only match whole names.
        let build = parse("[general]\nname = \"classy\"\n").unwrap();
        assert_eq!(build.validate(), Ok(()));
    }
}
