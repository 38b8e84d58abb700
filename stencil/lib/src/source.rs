//! Root value resolution for the `env` and `builtin` namespaces.
//!
//! `json`/`api` roots come from the pass's [`JsonContext`](crate::JsonContext)
//! and are resolved in the render module.

use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::config::Bindings;
use crate::error::{RenderError, Result};
use crate::path::{Path, Segment};
use crate::value::Value;

/// Values available under `builtin.*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    /// `CURR_DATE`, formatted `YYYY-MM-DD`.
    CurrDate,
    /// `CURR_TIME`, formatted `HH:MM:SS`.
    CurrTime,
    /// `CURR_DATETIME`, formatted `YYYY-MM-DD HH:MM:SS`.
    CurrDatetime,
}

impl Builtin {
    fn format_str(self) -> &'static str {
        match self {
            Builtin::CurrDate => "%Y-%m-%d",
            Builtin::CurrTime => "%H:%M:%S",
            Builtin::CurrDatetime => "%Y-%m-%d %H:%M:%S",
        }
    }

    /// Formats the builtin for the given local instant.
    pub fn format(self, now: &DateTime<FixedOffset>) -> String {
        now.format(self.format_str()).to_string()
    }
}

impl FromStr for Builtin {
    type Err = RenderError;

    fn from_str(name: &str) -> Result<Self> {
        match name {
            "CURR_DATE" => Ok(Builtin::CurrDate),
            "CURR_TIME" => Ok(Builtin::CurrTime),
            "CURR_DATETIME" => Ok(Builtin::CurrDatetime),
            _ => Err(RenderError::UnknownBuiltin {
                name: name.to_string(),
            }),
        }
    }
}

/// Resolves `env.NAME` against the bindings' environment map.
pub(crate) fn resolve_env(bindings: &Bindings, path: &Path) -> Result<Value> {
    let name = single_name(path, "env")?;
    bindings
        .env
        .get(name)
        .map(|value| Value::String(value.clone()))
        .ok_or_else(|| RenderError::MissingVariable {
            name: name.to_string(),
        })
}

/// Resolves `builtin.NAME` using the pass's fixed instant and time zone.
pub(crate) fn resolve_builtin(bindings: &Bindings, path: &Path) -> Result<Value> {
    let builtin: Builtin = single_name(path, "builtin")?.parse()?;
    let local = bindings.now.with_timezone(&bindings.time_zone);
    Ok(Value::String(builtin.format(&local)))
}

fn single_name<'p>(path: &'p Path, namespace: &str) -> Result<&'p str> {
    match path.segments() {
        [Segment::Key(name)] => Ok(name.as_str()),
        _ => Err(RenderError::InvalidPath {
            path: format!("{namespace}.{path}"),
            message: format!("{namespace} expects a single name"),
        }),
    }
}
