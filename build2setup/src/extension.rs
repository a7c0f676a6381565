use std::{collections::BTreeMap, fmt::Display};

use serde::Serialize;

use crate::config::ExtensionConfig;

/// Compiler front-end used to build the extension module.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtensionKind {
    /// Standard C++ extension (`CppExtension`).
    Cpp,
    /// Accelerator-kernel extension (`SyclExtension`).
    Sycl,
}

impl ExtensionKind {
    pub fn select(use_sycl: bool) -> Self {
        if use_sycl {
            ExtensionKind::Sycl
        } else {
            ExtensionKind::Cpp
        }
    }

    /// Name of the `torch.utils.cpp_extension` class for this front-end.
    pub fn class_name(&self) -> &'static str {
        match self {
            ExtensionKind::Cpp => "CppExtension",
            ExtensionKind::Sycl => "SyclExtension",
        }
    }

    /// Source languages this front-end can compile.
    pub fn languages(&self) -> &'static [Language] {
        match self {
            ExtensionKind::Cpp => &[Language::Cxx],
            ExtensionKind::Sycl => &[Language::Cxx, Language::Sycl],
        }
    }
}

impl Display for ExtensionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtensionKind::Cpp => write!(f, "cpp"),
            ExtensionKind::Sycl => write!(f, "sycl"),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Cxx,
    Sycl,
}

impl Language {
    /// File extension of sources in this language.
    pub fn file_extension(&self) -> &'static str {
        match self {
            Language::Cxx => "cpp",
            Language::Sycl => "sycl",
        }
    }
}

impl Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Cxx => write!(f, "cxx"),
            Language::Sycl => write!(f, "sycl"),
        }
    }
}

/// Extra compile flags keyed by language, as passed to
/// `extra_compile_args`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CompileArgs(BTreeMap<Language, Vec<String>>);

impl CompileArgs {
    pub fn get(&self, language: Language) -> Option<&[String]> {
        self.0.get(&language).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Language, &[String])> {
        self.0.iter().map(|(language, flags)| (*language, flags.as_slice()))
    }
}

impl Default for CompileArgs {
    fn default() -> Self {
        CompileArgs(BTreeMap::from([
            (Language::Cxx, vec!["-g".to_owned()]),
            (Language::Sycl, vec!["-O2".to_owned()]),
        ]))
    }
}

/// Pick the front-end for the given accelerator availability together with
/// the compile flags for every language.
///
/// Both `cxx` and `sycl` flags are always present, also when the standard
/// front-end is selected and the `sycl` entry goes unused.
pub fn select_extension(use_sycl: bool, config: &ExtensionConfig) -> (ExtensionKind, CompileArgs) {
    let mut args = CompileArgs::default();
    if let Some(flags) = &config.cxx_flags {
        args.0.insert(Language::Cxx, flags.clone());
    }
    if let Some(flags) = &config.sycl_flags {
        args.0.insert(Language::Sycl, flags.clone());
    }

    (ExtensionKind::select(use_sycl), args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_front_end() {
        let config = ExtensionConfig::default();
        for use_sycl in [false, true] {
            let (kind, args) = select_extension(use_sycl, &config);
            assert_eq!(kind == ExtensionKind::Sycl, use_sycl);
            for language in kind.languages() {
                assert!(args.get(*language).is_some(), "missing flags for {language}");
            }
        }
    }

    #[test]
    fn default_flags() {
        let (kind, args) = select_extension(false, &ExtensionConfig::default());
        assert_eq!(kind, ExtensionKind::Cpp);
        assert_eq!(args.get(Language::Cxx), Some(&["-g".to_owned()][..]));
        assert_eq!(args.get(Language::Sycl), Some(&["-O2".to_owned()][..]));
    }

    #[test]
    fn configured_flags_replace_defaults() {
        let config = ExtensionConfig {
            cxx_flags: None,
            sycl_flags: Some(vec!["-O3".to_owned(), "-fsycl".to_owned()]),
        };
        let (kind, args) = select_extension(true, &config);
        assert_eq!(kind.class_name(), "SyclExtension");
        assert_eq!(args.get(Language::Cxx), Some(&["-g".to_owned()][..]));
        assert_eq!(
            args.get(Language::Sycl),
            Some(&["-O3".to_owned(), "-fsycl".to_owned()][..])
        );
    }

    #[test]
    fn serializes_by_language_name() {
        let json = serde_json::to_string(&CompileArgs::default()).unwrap();
        assert_eq!(json, r#"{"cxx":["-g"],"sycl":["-O2"]}"#);
    }
}
