use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use serde::Serialize;
use thiserror::Error;

use crate::extension::{CompileArgs, ExtensionKind};

/// Everything the packaging delegate needs to build the extension module.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct ModuleDescriptor {
    name: String,
    kind: ExtensionKind,
    sources: Vec<PathBuf>,
    extra_compile_args: CompileArgs,
    use_xpu: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Extension module name must not be empty")]
    EmptyName,
    #[error("Sources `{first}` and `{second}` compile to the same object file")]
    ObjectConflict { first: String, second: String },
}

impl ModuleDescriptor {
    pub fn new(
        name: impl Into<String>,
        kind: ExtensionKind,
        sources: Vec<PathBuf>,
        extra_compile_args: CompileArgs,
    ) -> Result<Self, DescriptorError> {
        let name = name.into();
        if name.is_empty() {
            return Err(DescriptorError::EmptyName);
        }

        check_object_conflicts(&sources)?;

        Ok(ModuleDescriptor {
            name,
            kind,
            sources,
            extra_compile_args,
            // The build command always gets XPU support, the front-end
            // decides whether kernels are compiled.
            use_xpu: true,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ExtensionKind {
        self.kind
    }

    pub fn sources(&self) -> &[PathBuf] {
        &self.sources
    }

    pub fn extra_compile_args(&self) -> &CompileArgs {
        &self.extra_compile_args
    }

    pub fn use_xpu(&self) -> bool {
        self.use_xpu
    }

    /// Prefix relative source paths with `root`, for builds that do not
    /// run from the package root.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        for source in &mut self.sources {
            if source.is_relative() {
                *source = root.join(&*source);
            }
        }
        self
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

fn check_object_conflicts(sources: &[PathBuf]) -> Result<(), DescriptorError> {
    let mut objects: HashMap<PathBuf, &Path> = HashMap::new();
    for source in sources {
        if let Some(first) = objects.insert(source.with_extension("o"), source) {
            return Err(DescriptorError::ObjectConflict {
                first: first.to_string_lossy().into_owned(),
                second: source.to_string_lossy().into_owned(),
            });
        }
    }
    Ok(())
}
