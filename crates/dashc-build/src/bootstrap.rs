//! Directory-mode bootstrap program
//!
//! The bootstrap is the text the host interpreter runs for an archived
//! directory: it decodes the payload, installs the archive importer at the
//! front of `sys.meta_path` and dispatches to the entry point.

use dashc_runtime::{EntryPoint, ExitStatus};

use crate::literal;

const TEMPLATE: &str = include_str!("../templates/archive_bootstrap.py");

/// Virtual filename the bootstrap is compiled under.
pub const BOOTSTRAP_NAME: &str = "<dashc>";

/// Assignment line holding the payload in a rendered bootstrap.
pub(crate) const PAYLOAD_ASSIGNMENT: &str = "_PAYLOAD = ";

/// Assignment line holding the entry point in a rendered bootstrap.
pub(crate) const ENTRY_ASSIGNMENT: &str = "_ENTRY = ";

/// Render the bootstrap for `payload` (codec output) and `entry`.
pub fn render(payload: &str, entry: &EntryPoint) -> String {
    TEMPLATE
        .replace("{{payload}}", payload)
        .replace("{{entry}}", &entry_tuple(entry))
        .replace("{{exit_failure}}", &ExitStatus::FAILURE.code().to_string())
        .replace(
            "{{exit_data_corruption}}",
            &ExitStatus::DATA_CORRUPTION.code().to_string(),
        )
        .replace(
            "{{exit_resolver_inconsistency}}",
            &ExitStatus::RESOLVER_INCONSISTENCY.code().to_string(),
        )
}

/// `("run", "pkg", None)` or `("call", "pkg.cli", "main")`
fn entry_tuple(entry: &EntryPoint) -> String {
    match entry {
        EntryPoint::RunModule(module) => {
            format!("(\"run\", {}, None)", literal::quote(module))
        }
        EntryPoint::CallFunction { module, function } => format!(
            "(\"call\", {}, {})",
            literal::quote(module),
            literal::quote(function)
        ),
    }
}

/// Parse the entry tuple back out of a rendered bootstrap line.
pub(crate) fn parse_entry_tuple(text: &str) -> Option<EntryPoint> {
    let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (kind, rest) = literal::parse_prefix(inner.trim_start())?;
    let rest = rest.trim_start().strip_prefix(',')?.trim_start();
    let (module, rest) = literal::parse_prefix(rest)?;
    let rest = rest.trim_start().strip_prefix(',')?.trim();
    match kind.as_str() {
        "run" if rest == "None" => Some(EntryPoint::RunModule(module)),
        "call" => {
            let (function, tail) = literal::parse_prefix(rest)?;
            if !tail.trim().is_empty() {
                return None;
            }
            Some(EntryPoint::call_function(module, function))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_every_placeholder() {
        let text = render("QUJD", &EntryPoint::run_module("mypkg"));
        assert!(!text.contains("{{"));
        assert!(text.contains("_PAYLOAD = \"QUJD\""));
        assert!(text.contains("_ENTRY = (\"run\", \"mypkg\", None)"));
        assert!(text.contains("_EXIT_DATA_CORRUPTION = 65"));
        assert!(text.contains("_EXIT_RESOLVER_INCONSISTENCY = 70"));
    }

    #[test]
    fn test_entry_tuple_parses_back() {
        for entry in [
            EntryPoint::run_module("mypkg"),
            EntryPoint::call_function("app.cli", "main"),
        ] {
            assert_eq!(parse_entry_tuple(&entry_tuple(&entry)), Some(entry));
        }
        assert_eq!(parse_entry_tuple("(\"run\", \"x\")"), None);
        assert_eq!(parse_entry_tuple("[]"), None);
    }

    #[test]
    fn test_template_is_plain_ascii() {
        assert!(TEMPLATE.is_ascii());
        assert!(!TEMPLATE.contains('\t'));
    }
}
