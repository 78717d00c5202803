//! Scripted host shared by integration tests
//!
//! Understands a tiny line language that also happens to be valid Python
//! for the cases tests care about:
//!
//! ```text
//! import a.b            import through the resolution chain
//! print('text')         record output
//! print(__name__)       record the module identity
//! NAME = 3              bind an integer
//! def NAME(): return 3  define a function returning an int, None, or True/False
//! def NAME(): raise ValueError('boom')
//! raise ValueError('boom')
//! ```

#![allow(dead_code)]

use std::collections::HashMap;

use dashc_runtime::{Host, Importer, Module, RuntimeError, Value};

#[derive(Debug, Clone)]
enum Body {
    Return(Value),
    Raise(RuntimeError),
}

#[derive(Debug, Default)]
pub struct ScriptHost {
    pub output: Vec<String>,
    functions: HashMap<String, Body>,
}

impl ScriptHost {
    pub fn new() -> Self {
        Self::default()
    }
}

fn literal(text: &str) -> Option<Value> {
    let text = text.trim();
    match text {
        "None" => return Some(Value::None),
        "True" => return Some(Value::Bool(true)),
        "False" => return Some(Value::Bool(false)),
        _ => {}
    }
    if let Ok(i) = text.parse::<i64>() {
        return Some(Value::Int(i));
    }
    let quoted = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')));
    quoted.map(|s| Value::Str(s.to_string()))
}

/// `ValueError('boom')` -> application error
fn raised(text: &str) -> RuntimeError {
    let text = text.trim();
    match text.split_once('(') {
        Some((kind, rest)) => {
            let message = rest.trim_end_matches(')');
            let message = match literal(message) {
                Some(Value::Str(s)) => s,
                _ => message.to_string(),
            };
            RuntimeError::application(kind.trim(), message)
        }
        None => RuntimeError::application(text, ""),
    }
}

impl Host for ScriptHost {
    fn exec_module(
        &mut self,
        module: &mut Module,
        source: &[u8],
        imports: &mut Importer,
    ) -> Result<(), RuntimeError> {
        let source = String::from_utf8_lossy(source).into_owned();
        for line in source.lines().map(str::trim) {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(target) = line.strip_prefix("import ") {
                imports.import(target.trim(), self)?;
            } else if let Some(arg) = line
                .strip_prefix("print(")
                .and_then(|rest| rest.strip_suffix(')'))
            {
                let text = match arg.trim() {
                    "__name__" => module.identity.clone(),
                    "__file__" => module.file.clone(),
                    other => match literal(other) {
                        Some(value) => value.to_string(),
                        None => match module.get(other) {
                            Some(value) => value.to_string(),
                            None => {
                                return Err(RuntimeError::application(
                                    "NameError",
                                    format!("name '{}' is not defined", other),
                                ))
                            }
                        },
                    },
                };
                self.output.push(text);
            } else if let Some(rest) = line.strip_prefix("def ") {
                let (name, body) = rest
                    .split_once("():")
                    .ok_or_else(|| RuntimeError::application("SyntaxError", line))?;
                let body = body.trim();
                let body = if let Some(value) = body.strip_prefix("return") {
                    let value = if value.trim().is_empty() { "None" } else { value };
                    Body::Return(
                        literal(value)
                            .ok_or_else(|| RuntimeError::application("SyntaxError", line))?,
                    )
                } else if let Some(exc) = body.strip_prefix("raise ") {
                    Body::Raise(raised(exc))
                } else {
                    return Err(RuntimeError::application("SyntaxError", line));
                };
                let qualified = format!("{}.{}", module.name, name.trim());
                self.functions.insert(qualified.clone(), body);
                module.set(name.trim(), Value::Function(qualified));
            } else if let Some(exc) = line.strip_prefix("raise ") {
                return Err(raised(exc));
            } else if let Some((name, value)) = line.split_once('=') {
                let value = literal(value)
                    .ok_or_else(|| RuntimeError::application("SyntaxError", line))?;
                module.set(name.trim(), value);
            } else {
                return Err(RuntimeError::application("SyntaxError", line));
            }
        }
        Ok(())
    }

    fn call(&mut self, callee: &Value, _imports: &mut Importer) -> Result<Value, RuntimeError> {
        let Value::Function(name) = callee else {
            return Err(RuntimeError::application(
                "TypeError",
                format!("'{}' object is not callable", callee.type_name()),
            ));
        };
        match self.functions.get(name) {
            Some(Body::Return(value)) => Ok(value.clone()),
            Some(Body::Raise(err)) => Err(err.clone()),
            None => Err(RuntimeError::application(
                "NameError",
                format!("name '{}' is not defined", name),
            )),
        }
    }
}

/// Zip container holding `files`, in the given order.
pub fn archive(files: &[(&str, &str)]) -> Vec<u8> {
    use std::io::Write;

    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);
    for (path, source) in files {
        writer.start_file(*path, options).unwrap();
        writer.write_all(source.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Encoded payload for `files`.
pub fn payload(files: &[(&str, &str)]) -> String {
    dashc_runtime::codec::encode(&archive(files)).unwrap()
}
