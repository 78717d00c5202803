//! `dashc build`: generate a one-line invocation.

use anyhow::Context;
use std::path::{Path, PathBuf};

use dashc_build::shell::DEFAULT_SHEBANG;
use dashc_build::{generate, BuildError, ConfigFile, Contents, Embed, GenerateOptions, Generated};

use crate::output::StyledOutput;

pub struct BuildArgs {
    pub source: PathBuf,
    pub entrypoint: Option<String>,
    pub compression: Option<String>,
    pub level: Option<i64>,
    pub output: Option<PathBuf>,
    pub plain: bool,
    pub shebang: Option<String>,
    pub python: Option<String>,
    pub no_check: bool,
    pub config: Option<PathBuf>,
}

pub fn execute(args: BuildArgs, out: &mut StyledOutput) -> anyhow::Result<()> {
    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let config = ConfigFile::discover(args.config.as_deref(), &cwd)
        .map_err(BuildError::from)?
        .map(|(_, config)| config)
        .unwrap_or_default();

    let options = options(&args, &config)?;
    let generated = generate(&args.source, &options)?;
    let shebang = args.shebang.clone().or(config.build.shebang.clone());

    match &args.output {
        Some(path) => {
            let shebang = shebang.as_deref().unwrap_or(DEFAULT_SHEBANG);
            write_script(path, &generated.script(shebang))?;
            out.success(&format!(
                "Wrote {} ({})",
                path.display(),
                summary(&generated)
            ));
        }
        None => match shebang {
            Some(shebang) => out.raw(&generated.script(&shebang)),
            None => out.raw(&format!("{}\n", generated.line)),
        },
    }
    Ok(())
}

/// Configuration file values, overridden by flags.
fn options(args: &BuildArgs, config: &ConfigFile) -> anyhow::Result<GenerateOptions> {
    let mut options = GenerateOptions::from_config(&config.build)?;
    if let Some(entrypoint) = &args.entrypoint {
        options.entrypoint = Some(entrypoint.clone());
    }
    if let Some(method) = &args.compression {
        options.archive.method = method.parse()?;
    }
    if args.level.is_some() {
        options.archive.level = args.level;
    }
    if args.plain {
        options.embed = Embed::Plain;
    }
    if let Some(python) = &args.python {
        options.python = python.clone();
    }
    if args.no_check {
        options.check = false;
    }
    Ok(options)
}

fn summary(generated: &Generated) -> String {
    match &generated.contents {
        Contents::SingleFile { name } => {
            format!("{}, {} bytes", name, generated.line.len())
        }
        Contents::Directory {
            resolution, files, ..
        } => format!(
            "entry {}, {} files, {} bytes",
            resolution.entry,
            files.len(),
            generated.line.len()
        ),
    }
}

fn write_script(path: &Path, script: &str) -> anyhow::Result<()> {
    std::fs::write(path, script)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to make {} executable", path.display()))?;
    }
    Ok(())
}
