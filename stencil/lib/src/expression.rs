//! Placeholder content parsing.
//!
//! The content between a placeholder's delimiters looks like
//!
//! ```text
//! json.stories[0].tags | each:case_pascal() | each:prefix '#' | join(' ')
//! ```
//!
//! i.e. a namespace, a path, and a `|`-separated operation chain. Operation
//! arguments may be parenthesized or bare, quoted or unquoted, and unquoted
//! arguments that start with a namespace prefix are references to other
//! values in the same render pass.

use std::fmt;

use crate::error::{RenderError, Result};
use crate::path::Path;

const EACH_QUALIFIER: &str = "each:";

/// The source category of a placeholder's root value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Environment variables from the bindings.
    Env,
    /// Builtin values derived from the pass's fixed instant.
    Builtin,
    /// The shared JSON context.
    Json,
    /// Alias of [`Namespace::Json`].
    Api,
}

impl Namespace {
    /// All namespaces, in prefix-matching order.
    pub const ALL: [Namespace; 4] = [
        Namespace::Env,
        Namespace::Builtin,
        Namespace::Json,
        Namespace::Api,
    ];

    /// The namespace keyword as written in templates.
    pub fn as_str(self) -> &'static str {
        match self {
            Namespace::Env => "env",
            Namespace::Builtin => "builtin",
            Namespace::Json => "json",
            Namespace::Api => "api",
        }
    }

    /// True for namespaces backed by the JSON context.
    pub fn uses_json_context(self) -> bool {
        matches!(self, Namespace::Json | Namespace::Api)
    }

    /// Splits `text` into a namespace and the path after `<namespace>.`.
    ///
    /// Returns `None` if `text` does not start with a known namespace
    /// followed by a dot.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_lib::Namespace;
    ///
    /// assert_eq!(
    ///     Namespace::split("json.stories[0]"),
    ///     Some((Namespace::Json, "stories[0]"))
    /// );
    /// assert_eq!(Namespace::split("jsonish.x"), None);
    /// assert_eq!(Namespace::split("unknown.VAR"), None);
    /// ```
    pub fn split(text: &str) -> Option<(Namespace, &str)> {
        Self::ALL.into_iter().find_map(|ns| {
            text.strip_prefix(ns.as_str())
                .and_then(|rest| rest.strip_prefix('.'))
                .map(|path| (ns, path))
        })
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A namespace-qualified path, e.g. `json.stories[0].title` or `env.NAME`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Where the root value comes from.
    pub namespace: Namespace,
    /// The path evaluated against that root.
    pub path: Path,
}

impl Reference {
    fn parse(namespace: Namespace, path: &str) -> Result<Self> {
        Ok(Self {
            namespace,
            path: Path::parse(path)?,
        })
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.path)
    }
}

/// A single operation argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Argument {
    /// A quoted string or bare word, used verbatim.
    Literal(String),
    /// A value resolved from the current render pass.
    Reference(Reference),
}

/// One `|`-separated step of an operation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationCall {
    /// The operation name without any `each:` qualifier.
    pub name: String,
    /// Whether the name carried the `each:` qualifier.
    pub each_wise: bool,
    /// Arguments in call order.
    pub args: Vec<Argument>,
}

impl OperationCall {
    /// The name as written, including the `each:` qualifier.
    pub fn display_name(&self) -> String {
        if self.each_wise {
            format!("{EACH_QUALIFIER}{}", self.name)
        } else {
            self.name.clone()
        }
    }
}

/// The decoded content of one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExpression {
    /// The root value's source and path.
    pub reference: Reference,
    /// Operations applied to the resolved value, in order.
    pub operations: Vec<OperationCall>,
}

impl ParsedExpression {
    /// Parses placeholder content (the text between the delimiters).
    ///
    /// Returns `Ok(None)` when the content does not start with a known
    /// namespace; such spans are not placeholders and are left untouched.
    ///
    /// ## Errors
    ///
    /// - `InvalidPath` for a malformed path
    /// - `UnknownOperation` for an empty or non-identifier operation name
    /// - `InvalidArgument` for unterminated quotes or parentheses
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_lib::{Argument, Namespace, ParsedExpression};
    ///
    /// let expr = ParsedExpression::parse("json.genres | each:prefix('#') | join ' '")
    ///     .unwrap()
    ///     .unwrap();
    /// assert_eq!(expr.reference.namespace, Namespace::Json);
    /// assert_eq!(expr.operations.len(), 2);
    /// assert!(expr.operations[0].each_wise);
    /// assert_eq!(expr.operations[1].args, vec![Argument::Literal(" ".into())]);
    /// ```
    pub fn parse(content: &str) -> Result<Option<Self>> {
        let mut parts = split_pipes(content).into_iter();
        let head = parts.next().unwrap_or_default().trim().replace("\\|", "|");

        let Some((namespace, path)) = Namespace::split(&head) else {
            return Ok(None);
        };
        let reference = Reference::parse(namespace, path)?;

        let operations = parts
            .map(|part| parse_operation(part.trim()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(Self {
            reference,
            operations,
        }))
    }
}

impl fmt::Display for ParsedExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference)?;
        for op in &self.operations {
            write!(f, " | {}", op.display_name())?;
        }
        Ok(())
    }
}

/// Returns true if `content` would be parsed as a placeholder.
pub(crate) fn is_expression(content: &str) -> bool {
    Namespace::split(content.trim_start()).is_some()
}

/// Whether `c` starts a quoted argument given the preceding character.
///
/// Quotes only open at the start of a token, so apostrophes inside bare
/// words (`O'Brien`) stay literal.
pub(crate) fn opens_quote(prev: Option<char>, c: char) -> bool {
    matches!(c, '\'' | '"')
        && prev.is_none_or(|p| p.is_whitespace() || matches!(p, '(' | ',' | '|'))
}

/// Splits on `|` outside quotes. Backslash escapes are skipped over but kept.
fn split_pipes(content: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut prev = None;
    let mut start = 0;

    for (i, c) in content.char_indices() {
        if escaped {
            escaped = false;
        } else {
            match quote {
                Some(q) if c == q => quote = None,
                _ if c == '\\' => escaped = true,
                Some(_) => {}
                None if c == '|' => {
                    parts.push(&content[start..i]);
                    start = i + 1;
                }
                None if opens_quote(prev, c) => quote = Some(c),
                None => {}
            }
        }
        prev = Some(c);
    }
    parts.push(&content[start..]);
    parts
}

fn parse_operation(text: &str) -> Result<OperationCall> {
    let (each_wise, rest) = match text.strip_prefix(EACH_QUALIFIER) {
        Some(rest) => (true, rest.trim_start()),
        None => (false, text),
    };

    let name_end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    let name = &rest[..name_end];
    if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(RenderError::UnknownOperation {
            name: text.to_string(),
        });
    }

    let call_name = if each_wise {
        format!("{EACH_QUALIFIER}{name}")
    } else {
        name.to_string()
    };

    let remainder = rest[name_end..].trim_start();
    let args = match remainder.strip_prefix('(') {
        Some(inner) => {
            let mut parser = ArgParser::new(inner, &call_name, true);
            let args = parser.parse()?;
            let trailing = parser.remaining().trim();
            if !trailing.is_empty() {
                return Err(RenderError::invalid_argument(
                    &call_name,
                    format!("unexpected text after ')': {trailing}"),
                ));
            }
            args
        }
        None => ArgParser::new(remainder, &call_name, false).parse()?,
    };

    Ok(OperationCall {
        name: name.to_string(),
        each_wise,
        args,
    })
}

/// Cursor over an argument list, either `a, b)` (parenthesized) or `a b`.
struct ArgParser<'a> {
    input: &'a str,
    pos: usize,
    operation: &'a str,
    parenthesized: bool,
}

impl<'a> ArgParser<'a> {
    fn new(input: &'a str, operation: &'a str, parenthesized: bool) -> Self {
        Self {
            input,
            pos: 0,
            operation,
            parenthesized,
        }
    }

    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn error(&self, message: impl Into<String>) -> RenderError {
        RenderError::invalid_argument(self.operation, message)
    }

    fn parse(&mut self) -> Result<Vec<Argument>> {
        let mut args = Vec::new();
        loop {
            while matches!(self.peek(), Some(c) if c.is_whitespace() || c == ',') {
                self.bump();
            }
            match self.peek() {
                None if self.parenthesized => return Err(self.error("missing ')'")),
                None => return Ok(args),
                Some(')') if self.parenthesized => {
                    self.bump();
                    return Ok(args);
                }
                Some(q @ ('\'' | '"')) => {
                    self.bump();
                    args.push(Argument::Literal(self.quoted(q)?));
                }
                Some(_) => args.push(self.bare()?),
            }
        }
    }

    fn quoted(&mut self, quote: char) -> Result<String> {
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(self.error("unterminated quoted argument")),
                Some('\\') => match self.bump() {
                    Some(c) => out.push(c),
                    None => return Err(self.error("unterminated quoted argument")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
            }
        }
    }

    fn bare(&mut self) -> Result<Argument> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == ',' || (self.parenthesized && c == ')') {
                break;
            }
            self.bump();
        }
        let token = &self.input[start..self.pos];
        match Namespace::split(token) {
            Some((namespace, path)) => Ok(Argument::Reference(Reference::parse(namespace, path)?)),
            None => Ok(Argument::Literal(token.to_string())),
        }
    }
}
