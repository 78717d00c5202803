//! Entry-point descriptors
//!
//! Textual forms:
//! - `dotted.module` runs a module (or a package's `__main__`) as the main program
//! - `dotted.module:function` imports the module and calls the function

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::modpath;

/// Errors that can occur while parsing an entry-point descriptor
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EntryParseError {
    #[error("entry point is empty")]
    Empty,

    #[error("entry point '{0}' has more than one ':'")]
    TooManyColons(String),

    #[error("'{segment}' in entry point '{text}' is not an identifier")]
    InvalidSegment { text: String, segment: String },
}

/// What the generated program does once the resolver is installed
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryPoint {
    /// Execute a module (or a package's `__main__`) with main-program identity
    RunModule(String),

    /// Import a module and call a zero-argument function in it
    CallFunction { module: String, function: String },
}

impl EntryPoint {
    pub fn run_module(module: impl Into<String>) -> Self {
        EntryPoint::RunModule(module.into())
    }

    pub fn call_function(module: impl Into<String>, function: impl Into<String>) -> Self {
        EntryPoint::CallFunction {
            module: module.into(),
            function: function.into(),
        }
    }

    /// Dotted module the entry point lives in
    pub fn module(&self) -> &str {
        match self {
            EntryPoint::RunModule(module) => module,
            EntryPoint::CallFunction { module, .. } => module,
        }
    }

    /// Function name, for `CallFunction`
    pub fn function(&self) -> Option<&str> {
        match self {
            EntryPoint::RunModule(_) => None,
            EntryPoint::CallFunction { function, .. } => Some(function),
        }
    }
}

impl FromStr for EntryPoint {
    type Err = EntryParseError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EntryParseError::Empty);
        }

        let mut parts = text.split(':');
        let module = parts.next().unwrap_or_default();
        let function = parts.next();
        if parts.next().is_some() {
            return Err(EntryParseError::TooManyColons(text.to_string()));
        }

        let invalid = |segment: &str| EntryParseError::InvalidSegment {
            text: text.to_string(),
            segment: segment.to_string(),
        };

        if let Some(bad) = module.split('.').find(|s| !modpath::is_identifier(s)) {
            return Err(invalid(bad));
        }

        match function {
            None => Ok(EntryPoint::RunModule(module.to_string())),
            Some(function) if modpath::is_identifier(function) => {
                Ok(EntryPoint::call_function(module, function))
            }
            Some(function) => Err(invalid(function)),
        }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryPoint::RunModule(module) => write!(f, "{}", module),
            EntryPoint::CallFunction { module, function } => write!(f, "{}:{}", module, function),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_module() {
        let entry: EntryPoint = "app.cli".parse().unwrap();
        assert_eq!(entry, EntryPoint::run_module("app.cli"));
        assert_eq!(entry.function(), None);
        assert_eq!(entry.to_string(), "app.cli");
    }

    #[test]
    fn test_parse_call_function() {
        let entry: EntryPoint = "app.cli:main".parse().unwrap();
        assert_eq!(entry, EntryPoint::call_function("app.cli", "main"));
        assert_eq!(entry.module(), "app.cli");
        assert_eq!(entry.function(), Some("main"));
        assert_eq!(entry.to_string(), "app.cli:main");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!("".parse::<EntryPoint>(), Err(EntryParseError::Empty));
        assert!(matches!(
            "a:b:c".parse::<EntryPoint>(),
            Err(EntryParseError::TooManyColons(_))
        ));
        assert!(matches!(
            "a..b".parse::<EntryPoint>(),
            Err(EntryParseError::InvalidSegment { .. })
        ));
        assert!(matches!(
            "my-app".parse::<EntryPoint>(),
            Err(EntryParseError::InvalidSegment { .. })
        ));
        assert!(matches!(
            "app:".parse::<EntryPoint>(),
            Err(EntryParseError::InvalidSegment { .. })
        ));
        assert!(matches!(
            ":main".parse::<EntryPoint>(),
            Err(EntryParseError::InvalidSegment { .. })
        ));
    }
}
