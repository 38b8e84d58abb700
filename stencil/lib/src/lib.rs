//! Placeholder templating for generated text.
//!
//! Templates embed placeholders such as
//! `@{json.stories[0].tags | each:case_pascal | each:prefix('#') | join(' ')}`
//! in otherwise literal text. Each placeholder names a source namespace and
//! a path, followed by an optional chain of operations.
//!
//! ## Namespaces
//!
//! - `env.NAME` - a value from [`Bindings::env`]
//! - `builtin.CURR_DATE` / `CURR_TIME` / `CURR_DATETIME` - see [`Builtin`]
//! - `json.path` / `api.path` - the pass's [`JsonContext`]
//!
//! ## Rendering
//!
//! - [`render`] / [`render_many`] - one-shot rendering with defaults
//! - [`Renderer`] - rendering with a [`RenderConfig`] and custom [`JsonFetcher`]
//! - [`RenderPass`] - several templates sharing one JSON context
//!
//! ## Model
//!
//! - [`Value`] - the shape-checked value threaded through operations
//! - [`Path`] / [`Segment`] - `a.b[0][RANDOM]` paths
//! - [`ParsedExpression`] - a decoded placeholder
//! - [`Operation`] / [`CaseStyle`] - the fixed operation set
//!
//! ## Parsing Utilities
//!
//! - [`parse_time_zone`] - parse `UTC`, `UTC+2`, `UTC-05:30`, `+01:00`
//! - [`parse_delimiter`] - parse `at` / `dollar`

mod config;
mod context;
mod error;
mod expression;
mod operations;
mod path;
mod render;
mod scanner;
mod source;
mod value;

pub use config::{
    Bindings, CONTENT_JSON_VAR, DEFAULT_FETCH_TIMEOUT, Delimiter, RenderConfig, TIME_ZONE_VAR,
    parse_delimiter, parse_time_zone,
};
pub use context::{FetchError, HttpFetcher, JsonContext, JsonFetcher, JsonSource};
pub use error::{RenderError, Result};
pub use expression::{Argument, Namespace, OperationCall, ParsedExpression, Reference};
pub use operations::{CaseStyle, Operation};
pub use path::{Path, Segment};
pub use render::{RenderPass, Renderer, render, render_many};
pub use source::Builtin;
pub use value::Value;
