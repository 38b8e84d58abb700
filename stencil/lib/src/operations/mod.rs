//! The fixed operation set and the per-step pipeline logic.
//!
//! Argument resolution happens in the render pass (reference arguments need
//! the pass's sources); this module sees already-resolved argument values
//! and owns shape validation and the transforms themselves.

mod case;
mod length;

pub use case::CaseStyle;

use rand::Rng;

use crate::error::{RenderError, Result};
use crate::expression::OperationCall;
use crate::value::Value;

/// A recognised pipeline operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `prefix(s)`
    Prefix,
    /// `join(sep)`
    Join,
    /// `case_*()`
    Case(CaseStyle),
    /// `max_length(n, suffix?)`
    MaxLength,
    /// `join_while(sep, max)`
    JoinWhile,
    /// `random()`
    Random,
    /// `attr(name)`
    Attr,
    /// `or(fallback)`
    Or,
}

impl Operation {
    /// Looks up the operation for `call` and checks its qualifier and arity.
    ///
    /// ## Errors
    ///
    /// - `UnknownOperation` if the name is not in the operation set, or it
    ///   carries `each:` but the operation has no element-wise form
    /// - `InvalidArgument` if the argument count is out of range
    pub fn resolve(call: &OperationCall) -> Result<Self> {
        let op = match call.name.as_str() {
            "prefix" => Operation::Prefix,
            "join" => Operation::Join,
            "max_length" => Operation::MaxLength,
            "join_while" => Operation::JoinWhile,
            "random" => Operation::Random,
            "attr" => Operation::Attr,
            "or" => Operation::Or,
            name => CaseStyle::from_operation(name).map(Operation::Case).ok_or_else(|| {
                RenderError::UnknownOperation {
                    name: call.display_name(),
                }
            })?,
        };

        if call.each_wise && !op.supports_each() {
            return Err(RenderError::UnknownOperation {
                name: call.display_name(),
            });
        }

        let (min, max) = op.arity();
        let given = call.args.len();
        if given < min || given > max {
            let expected = if min == max {
                format!("{min}")
            } else {
                format!("{min} to {max}")
            };
            return Err(RenderError::invalid_argument(
                call.display_name(),
                format!("expected {expected} argument(s), got {given}"),
            ));
        }

        Ok(op)
    }

    /// Whether an `each:` form exists.
    pub fn supports_each(self) -> bool {
        matches!(
            self,
            Operation::Prefix | Operation::Case(_) | Operation::MaxLength
        )
    }

    fn arity(self) -> (usize, usize) {
        match self {
            Operation::Prefix | Operation::Join | Operation::Attr | Operation::Or => (1, 1),
            Operation::Case(_) | Operation::Random => (0, 0),
            Operation::MaxLength => (1, 2),
            Operation::JoinWhile => (2, 2),
        }
    }
}

/// Per-pass settings the operations depend on.
pub(crate) struct OperationEnv<'a, R: ?Sized> {
    pub rng: &'a mut R,
    pub attr_tolerant: bool,
}

/// Applies one resolved operation to `input`.
///
/// `args` are the call's arguments after reference resolution, in order.
pub(crate) fn apply<R: Rng + ?Sized>(
    op: Operation,
    call: &OperationCall,
    input: Value,
    args: Vec<Value>,
    env: &mut OperationEnv<'_, R>,
) -> Result<Value> {
    let name = call.display_name();
    let context = format!("operation '{name}'");
    let mut args = Arguments::new(&name, args);

    match op {
        Operation::Prefix => {
            let prefix = args.string("prefix")?;
            map_strings(input, call.each_wise, &context, |s| Ok(format!("{prefix}{s}")))
        }
        Operation::Case(style) => {
            map_strings(input, call.each_wise, &context, |s| Ok(style.apply(&s)))
        }
        Operation::MaxLength => {
            let max = args.count("n")?;
            let suffix = args.optional_string("suffix")?.unwrap_or_default();
            if max < suffix.chars().count() {
                return Err(RenderError::invalid_argument(
                    &name,
                    format!("n ({max}) is shorter than the suffix '{suffix}'"),
                ));
            }
            map_strings(input, call.each_wise, &context, |s| {
                length::truncate_at_word(&s, max, &suffix).ok_or_else(|| {
                    RenderError::invalid_argument(&name, "n is shorter than the suffix")
                })
            })
        }
        Operation::Join => {
            let separator = args.string("separator")?;
            Ok(Value::String(element_strings(input, &context)?.join(&separator)))
        }
        Operation::JoinWhile => {
            let separator = args.string("separator")?;
            let max = args.count("max total")?;
            let items = element_strings(input, &context)?;
            Ok(Value::String(length::join_while(&items, &separator, max)))
        }
        Operation::Random => match input {
            Value::List(mut items) => {
                if items.is_empty() {
                    return Err(RenderError::EmptyArray { context });
                }
                let index = env.rng.gen_range(0..items.len());
                Ok(items.swap_remove(index))
            }
            other => Err(RenderError::type_mismatch(context, "list", other.kind())),
        },
        Operation::Attr => {
            let key = args.string("name")?;
            project(input, &key, env.attr_tolerant, &context)
        }
        Operation::Or => {
            let fallback = args.value("fallback")?;
            Ok(if input.is_blank() { fallback } else { input })
        }
    }
}

/// Applies `f` to a String, or with `each:` to every String in a List.
fn map_strings<F>(input: Value, each_wise: bool, context: &str, mut f: F) -> Result<Value>
where
    F: FnMut(String) -> Result<String>,
{
    match (input, each_wise) {
        (Value::String(s), false) => Ok(Value::String(f(s)?)),
        (Value::List(items), true) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(Value::String(f(s)?)),
                other => Err(RenderError::type_mismatch(
                    format!("{context} element"),
                    "string",
                    other.kind(),
                )),
            })
            .collect::<Result<Vec<_>>>()
            .map(Value::List),
        (other, false) => Err(RenderError::type_mismatch(context, "string", other.kind())),
        (other, true) => Err(RenderError::type_mismatch(context, "list", other.kind())),
    }
}

/// String forms of a List's scalar elements.
fn element_strings(input: Value, context: &str) -> Result<Vec<String>> {
    match input {
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.scalar_string().ok_or_else(|| {
                    RenderError::type_mismatch(format!("{context} element"), "scalar", item.kind())
                })
            })
            .collect(),
        other => Err(RenderError::type_mismatch(context, "list", other.kind())),
    }
}

fn project(input: Value, key: &str, tolerant: bool, context: &str) -> Result<Value> {
    let not_found = || RenderError::PathNotFound {
        segment: key.to_string(),
        context: context.to_string(),
    };

    match input {
        Value::Object(mut fields) => fields.shift_remove(key).ok_or_else(not_found),
        Value::List(items) => {
            let mut projected = Vec::with_capacity(items.len());
            for item in items {
                let mut fields = match item {
                    Value::Object(fields) => fields,
                    other => {
                        return Err(RenderError::type_mismatch(
                            format!("{context} element"),
                            "object",
                            other.kind(),
                        ));
                    }
                };
                match fields.shift_remove(key) {
                    Some(value) => projected.push(value),
                    None if tolerant => continue,
                    None => return Err(not_found()),
                }
            }
            Ok(Value::List(projected))
        }
        other => Err(RenderError::type_mismatch(context, "list or object", other.kind())),
    }
}

/// Positional access to resolved arguments with typed conversions.
struct Arguments<'a> {
    operation: &'a str,
    values: std::vec::IntoIter<Value>,
}

impl<'a> Arguments<'a> {
    fn new(operation: &'a str, values: Vec<Value>) -> Self {
        Self {
            operation,
            values: values.into_iter(),
        }
    }

    fn value(&mut self, what: &str) -> Result<Value> {
        self.values.next().ok_or_else(|| {
            RenderError::invalid_argument(self.operation, format!("missing {what} argument"))
        })
    }

    fn string(&mut self, what: &str) -> Result<String> {
        let value = self.value(what)?;
        self.stringify(what, value)
    }

    fn optional_string(&mut self, what: &str) -> Result<Option<String>> {
        match self.values.next() {
            Some(value) => self.stringify(what, value).map(Some),
            None => Ok(None),
        }
    }

    fn count(&mut self, what: &str) -> Result<usize> {
        let text = self.string(what)?;
        text.trim().parse().map_err(|_| {
            RenderError::invalid_argument(
                self.operation,
                format!("{what} must be a non-negative integer, got '{text}'"),
            )
        })
    }

    fn stringify(&self, what: &str, value: Value) -> Result<String> {
        value.scalar_string().ok_or_else(|| {
            RenderError::type_mismatch(
                format!("{what} argument of '{}'", self.operation),
                "scalar",
                value.kind(),
            )
        })
    }
}
