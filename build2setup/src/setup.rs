use std::path::Path;

use eyre::{Context, Result};
use itertools::Itertools;
use minijinja::{context, Environment};

use crate::{config::General, descriptor::ModuleDescriptor, fileset::FileSet};

/// Template environment with the embedded `setup.py`/`pyproject.toml`
/// templates.
pub fn template_env() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_trim_blocks(true);
    env.set_keep_trailing_newline(true);
    minijinja_embed::load_templates!(&mut env);
    env
}

/// Render the files that hand `descriptor` to the torch extension builder.
///
/// `package_dir` is the package root when the files are written elsewhere,
/// Python packages are then looked up there instead of next to `setup.py`.
pub fn write_setup(
    env: &Environment,
    general: &General,
    descriptor: &ModuleDescriptor,
    package_dir: Option<&Path>,
) -> Result<FileSet> {
    let mut file_set = FileSet::default();

    write_setup_py(env, general, descriptor, package_dir, &mut file_set)?;
    write_pyproject_toml(env, &mut file_set)?;

    Ok(file_set)
}

fn write_setup_py(
    env: &Environment,
    general: &General,
    descriptor: &ModuleDescriptor,
    package_dir: Option<&Path>,
    file_set: &mut FileSet,
) -> Result<()> {
    // Easier to do in Rust than Jinja.
    let sources = descriptor
        .sources()
        .iter()
        .map(|src| python_str(&src.to_string_lossy()).map(|src| format!("{:16}{src},", "")))
        .collect::<Result<Vec<_>>>()?
        .join("\n");

    let compile_args = descriptor
        .extra_compile_args()
        .iter()
        .map(|(language, flags)| -> Result<String> {
            let flags = itertools::process_results(
                flags.iter().map(|flag| python_str(flag)),
                |mut iter| iter.join(", "),
            )?;
            Ok(format!(
                "{:16}{}: [{flags}],",
                "",
                python_str(&language.to_string())?,
            ))
        })
        .collect::<Result<Vec<_>>>()?
        .join("\n");

    let description = general.description.as_deref().map(python_str).transpose()?;
    let package_dir = package_dir
        .map(|dir| python_str(&dir.to_string_lossy()))
        .transpose()?;

    let writer = file_set.entry("setup.py");
    env.get_template("setup.py")
        .wrap_err("Cannot get setup.py template")?
        .render_to_write(
            context! {
                compile_args => compile_args,
                description => description,
                extension_class => descriptor.kind().class_name(),
                module_name => python_str(descriptor.name())?,
                name => python_str(&general.python_name())?,
                package_dir => package_dir,
                sources => sources,
                use_xpu => if descriptor.use_xpu() { "True" } else { "False" },
                version => python_str(&general.version().to_string())?,
            },
            writer,
        )
        .wrap_err("Cannot render setup.py template")?;

    Ok(())
}

fn write_pyproject_toml(env: &Environment, file_set: &mut FileSet) -> Result<()> {
    let writer = file_set.entry("pyproject.toml");

    env.get_template("pyproject.toml")
        .wrap_err("Cannot get pyproject.toml template")?
        .render_to_write(context! {}, writer)
        .wrap_err("Cannot render pyproject.toml template")?;

    Ok(())
}

/// Quote `s` as a Python string literal. JSON string syntax is a subset of
/// Python's.
fn python_str(s: &str) -> Result<String> {
    serde_json::to_string(s).wrap_err("Cannot quote string")
}
