//! `dashc inspect`: show what a generated line contains.

use anyhow::Context;
use std::io::Read;

use dashc_build::{inspect, Embed, Inspected};
use dashc_runtime::EntryPoint;

use crate::output::StyledOutput;

pub fn execute(file: &str, out: &mut StyledOutput) -> anyhow::Result<()> {
    let text = if file == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        text
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))?
    };

    let report = inspect(&text)?;

    out.field("python", &report.python);
    out.field(
        "embed",
        match report.embed {
            Embed::Compressed => "compressed",
            Embed::Plain => "plain",
        },
    );
    out.field("program", &format!("{} bytes", report.program_len));

    match &report.contents {
        Inspected::SingleFile { name, source } => {
            out.field("mode", "single file");
            out.field("file", name);
            out.field("source", &format!("{} bytes", source.len()));
        }
        Inspected::Directory {
            entry,
            packages,
            modules,
            files,
            archive_size,
            ..
        } => {
            out.field("mode", "directory");
            let kind = match entry {
                EntryPoint::RunModule(_) => "run module",
                EntryPoint::CallFunction { .. } => "call function",
            };
            out.field("entry", &format!("{} ({})", entry, kind));
            out.field(
                "archive",
                &format!("{} files, {} bytes", files.len(), archive_size),
            );
            out.field("packages", &list(packages));
            out.field("modules", &list(modules));
        }
    }
    Ok(())
}

fn list(names: &[String]) -> String {
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}
