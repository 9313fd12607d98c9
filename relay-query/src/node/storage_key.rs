use std::fmt;

use apollo_compiler::Node;
use apollo_compiler::ast;
use itertools::Itertools;

/// The canonical identity of a field: its schema name followed by its arguments sorted by name,
/// e.g. `comments(first:"10",orderby:"toplevel")`.
///
/// Argument order never matters, names are case-sensitive, and a field without arguments is
/// keyed by its bare name. Two fields merge iff their storage keys are equal, which keeps
/// differently-filtered connections apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey(String);

impl StorageKey {
    pub(crate) fn new(name: &str, arguments: &[Node<ast::Argument>]) -> Self {
        if arguments.is_empty() {
            return Self(name.to_owned());
        }
        let mut key = String::from(name);
        key.push('(');
        let sorted = arguments
            .iter()
            .sorted_by(|a, b| a.name.as_str().cmp(b.name.as_str()));
        for (index, argument) in sorted.enumerate() {
            if index > 0 {
                key.push(',');
            }
            key.push_str(argument.name.as_str());
            key.push(':');
            write_value(&mut key, &argument.value, true);
        }
        key.push(')');
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Serializes an argument value as GraphQL. With `canonical`, input object fields are sorted by
/// name and no whitespace is written, so that equal values always serialize identically.
pub(crate) fn write_value(out: &mut String, value: &ast::Value, canonical: bool) {
    let separator = if canonical { "," } else { ", " };
    match value {
        ast::Value::Null => out.push_str("null"),
        ast::Value::Enum(name) => out.push_str(name.as_str()),
        ast::Value::Variable(name) => {
            out.push('$');
            out.push_str(name.as_str());
        }
        ast::Value::String(string) => write_string(out, string),
        ast::Value::Float(float) => out.push_str(&float.to_string()),
        ast::Value::Int(int) => out.push_str(&int.to_string()),
        ast::Value::Boolean(boolean) => out.push_str(if *boolean { "true" } else { "false" }),
        ast::Value::List(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push_str(separator);
                }
                write_value(out, item, canonical);
            }
            out.push(']');
        }
        ast::Value::Object(fields) => {
            out.push('{');
            let fields: Vec<_> = if canonical {
                fields
                    .iter()
                    .sorted_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()))
                    .collect()
            } else {
                fields.iter().collect()
            };
            for (index, (name, field_value)) in fields.into_iter().enumerate() {
                if index > 0 {
                    out.push_str(separator);
                }
                out.push_str(name.as_str());
                out.push_str(if canonical { ":" } else { ": " });
                write_value(out, field_value, canonical);
            }
            out.push('}');
        }
    }
}

fn write_string(out: &mut String, string: &str) {
    out.push('"');
    for c in string.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Serializes a value the way call-filter signatures spell it: strings without quotes, lists
/// as comma-separated items.
pub(crate) fn write_call_value(out: &mut String, value: &ast::Value) {
    match value {
        ast::Value::String(string) => out.push_str(string),
        ast::Value::List(items) => {
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_call_value(out, item);
            }
        }
        other => write_value(out, other, true),
    }
}
