//! Runtime error types.

/// Errors raised while decoding a payload, resolving modules, or running
/// the entry point.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    /// Payload decode or decompress failure
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// A classified name has no backing archive entry
    #[error("Resolver inconsistency: '{name}' is classified but '{path}' is missing from the archive")]
    ResolverInconsistency { name: String, path: String },

    /// No handler in the chain knows this name
    #[error("No module named '{0}'")]
    ModuleNotFound(String),

    /// A dotted name was imported through a parent that is not a package
    #[error("No module named '{name}': '{parent}' is not a package")]
    NotAPackage { name: String, parent: String },

    /// A package asked for a data file it does not contain
    #[error("Resource '{resource}' not found in package '{package}'")]
    ResourceNotFound { package: String, resource: String },

    /// The embedded entry point could not be resolved
    #[error("Entry point missing: {target} ({reason})")]
    EntrypointMissing { target: String, reason: String },

    /// A failure raised by the wrapped program itself
    #[error("{kind}: {message}")]
    Application { kind: String, message: String },
}

impl RuntimeError {
    /// Build an application error the way a host reports an uncaught exception.
    pub fn application(kind: impl Into<String>, message: impl Into<String>) -> Self {
        RuntimeError::Application {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Build an entry-point diagnostic naming the module and, if any, the function.
    pub fn entrypoint_missing(module: &str, function: Option<&str>, reason: impl Into<String>) -> Self {
        let target = match function {
            Some(function) => format!("{}:{}", module, function),
            None => module.to_string(),
        };
        RuntimeError::EntrypointMissing {
            target,
            reason: reason.into(),
        }
    }

    /// Whether the error must abort the program regardless of who observes it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RuntimeError::DataCorruption(_) | RuntimeError::ResolverInconsistency { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entrypoint_missing_names_both() {
        let err = RuntimeError::entrypoint_missing(
            "app.cli",
            Some("main"),
            "module has no attribute 'main'",
        );
        let text = err.to_string();
        assert!(text.contains("app.cli:main"));
        assert!(text.contains("no attribute"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(RuntimeError::DataCorruption("x".into()).is_fatal());
        assert!(RuntimeError::ResolverInconsistency {
            name: "a".into(),
            path: "a.py".into()
        }
        .is_fatal());
        assert!(!RuntimeError::ModuleNotFound("a".into()).is_fatal());
        assert!(!RuntimeError::application("ValueError", "boom").is_fatal());
    }
}
