//! Module namespaces and the values stored in them

use std::collections::BTreeMap;
use std::fmt;

use crate::chain::ModuleSpec;
use crate::modpath::MAIN_MODULE;

/// A value bound in a module namespace.
///
/// Only the shapes the dispatcher cares about are distinguished; anything
/// else a host produces is an opaque `Object`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Str(String),
    /// Reference to an imported module by dotted name
    Module(String),
    /// Host-defined callable
    Function(String),
    Object(String),
}

impl Value {
    /// Integer view of integer-like values (integers and booleans).
    pub fn as_exit_code(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Bool(b) => Some(*b as i64),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "str",
            Value::Module(_) => "module",
            Value::Function(_) => "function",
            Value::Object(_) => "object",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(i) => write!(f, "{}", i),
            Value::Str(s) => write!(f, "{}", s),
            Value::Module(name) => write!(f, "<module '{}'>", name),
            Value::Function(name) => write!(f, "<function {}>", name),
            Value::Object(repr) => write!(f, "{}", repr),
        }
    }
}

/// An executed (or executing) module namespace.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    /// Dotted name the module was resolved under
    pub name: String,
    /// Name the module sees itself as (`__main__` when run as the main program)
    pub identity: String,
    /// Declared file identity (archive-relative path for archived modules)
    pub file: String,
    /// Search root for nested imports, set only for packages
    pub search_root: Option<String>,
    attrs: BTreeMap<String, Value>,
}

impl Module {
    /// Fresh namespace for `spec`, seen by its own code as `identity`.
    pub fn from_spec(spec: &ModuleSpec, identity: impl Into<String>) -> Self {
        Self {
            name: spec.name.clone(),
            identity: identity.into(),
            file: spec.origin.clone(),
            search_root: spec.search_root.clone(),
            attrs: BTreeMap::new(),
        }
    }

    pub fn is_package(&self) -> bool {
        self.search_root.is_some()
    }

    pub fn is_main(&self) -> bool {
        self.identity == MAIN_MODULE
    }

    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.attrs.get(attr)
    }

    pub fn set(&mut self, attr: impl Into<String>, value: Value) {
        self.attrs.insert(attr.into(), value);
    }

    pub fn attrs(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attrs.iter().map(|(k, v)| (k.as_str(), v))
    }
}
