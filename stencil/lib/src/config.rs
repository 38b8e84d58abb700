//! Render configuration and per-pass bindings.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use tracing::warn;

use crate::context::JsonSource;

/// Environment variable holding the JSON source (`<url> | <narrow path>`).
pub const CONTENT_JSON_VAR: &str = "CONTENT_JSON";

/// Environment variable holding the time zone for `builtin.*` values.
pub const TIME_ZONE_VAR: &str = "TIME_ZONE";

/// Default timeout for the HTTP JSON fetch.
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// The placeholder opener; the closer is always `}`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delimiter {
    /// `@{...}`
    #[default]
    At,
    /// `${...}`
    Dollar,
}

impl Delimiter {
    /// The opening sequence, e.g. `"@{"`.
    pub fn opener(self) -> &'static str {
        match self {
            Delimiter::At => "@{",
            Delimiter::Dollar => "${",
        }
    }
}

impl fmt::Display for Delimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.opener())
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        parse_delimiter(value)
    }
}

/// Parses a delimiter name.
///
/// Accepts `at`/`@`/`@{` and `dollar`/`$`/`${`, case-insensitively.
pub fn parse_delimiter(value: &str) -> Result<Delimiter, String> {
    match value.trim().to_lowercase().as_str() {
        "at" | "@" | "@{" => Ok(Delimiter::At),
        "dollar" | "$" | "${" => Ok(Delimiter::Dollar),
        other => Err(format!("unknown delimiter '{other}' (expected 'at' or 'dollar')")),
    }
}

/// Parses a time zone string into a fixed UTC offset.
///
/// ## Supported Formats
///
/// - `UTC` (any case)
/// - Whole-hour offsets: `UTC+5`, `UTC-3`
/// - Hour/minute offsets: `UTC+05:30`, `+02:00`, `-0930`
///
/// ## Errors
///
/// Returns an error string if the value is not one of the above or the
/// offset is out of range.
///
/// ## Examples
///
/// ```
/// use stencil_lib::parse_time_zone;
///
/// assert_eq!(parse_time_zone("UTC").unwrap().local_minus_utc(), 0);
/// assert_eq!(parse_time_zone("UTC+5").unwrap().local_minus_utc(), 5 * 3600);
/// assert_eq!(parse_time_zone("utc-03:30").unwrap().local_minus_utc(), -(3 * 3600 + 1800));
/// ```
pub fn parse_time_zone(value: &str) -> Result<FixedOffset, String> {
    let normalized = value.trim().to_uppercase().replace(' ', "");
    let offset = normalized.strip_prefix("UTC").unwrap_or(&normalized);

    if offset.is_empty() {
        return if normalized.is_empty() {
            Err("time zone cannot be empty".to_string())
        } else {
            Ok(utc())
        };
    }

    let (sign, digits) = if let Some(rest) = offset.strip_prefix('+') {
        (1, rest)
    } else if let Some(rest) = offset.strip_prefix('-') {
        (-1, rest)
    } else {
        return Err(format!("expected time zone like UTC or UTC+5, got '{value}'"));
    };

    let (hours, minutes) = match digits.split_once(':') {
        Some((h, m)) => (h, m),
        None if digits.len() == 4 && digits.is_ascii() => digits.split_at(2),
        None => (digits, "0"),
    };

    let hours: i32 = hours
        .parse()
        .map_err(|_| format!("invalid hour offset in '{value}'"))?;
    let minutes: i32 = minutes
        .parse()
        .map_err(|_| format!("invalid minute offset in '{value}'"))?;

    if hours > 23 || minutes > 59 {
        return Err(format!("offset out of range in '{value}'"));
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| format!("offset out of range in '{value}'"))
}

fn utc() -> FixedOffset {
    Utc.fix()
}

/// The inputs of one render pass.
///
/// All `builtin.*` placeholders in a pass agree on `now`; all `json.*` and
/// `api.*` placeholders share one fetch of `json_source`.
///
/// ## Examples
///
/// ```
/// use chrono::Utc;
/// use stencil_lib::Bindings;
///
/// let bindings = Bindings::new(Utc::now())
///     .var("NAME", "stencil")
///     .json_source("https://example.com/data.json | stories[RANDOM]".parse().unwrap());
/// assert_eq!(bindings.env["NAME"], "stencil");
/// ```
#[derive(Debug, Clone)]
pub struct Bindings {
    /// Values for `env.NAME`.
    pub env: HashMap<String, String>,
    /// The pass's fixed instant.
    pub now: DateTime<Utc>,
    /// Offset applied to `now` when formatting builtins.
    pub time_zone: FixedOffset,
    /// Where `json.*`/`api.*` values come from, if anywhere.
    pub json_source: Option<JsonSource>,
}

impl Bindings {
    /// Creates bindings with an empty environment, UTC, and no JSON source.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            env: HashMap::new(),
            now,
            time_zone: utc(),
            json_source: None,
        }
    }

    /// Replaces the environment map.
    pub fn env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Sets a single environment value.
    pub fn var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(name.into(), value.into());
        self
    }

    /// Sets the time zone used for builtins.
    pub fn time_zone(mut self, time_zone: FixedOffset) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Sets the JSON source.
    pub fn json_source(mut self, source: JsonSource) -> Self {
        self.json_source = Some(source);
        self
    }

    /// Loads bindings from the process environment.
    ///
    /// - every process variable with a UTF-8 name and value becomes an
    ///   `env.*` value; others are skipped with a warning
    /// - `now` is the current instant
    /// - `TIME_ZONE` selects the builtin time zone (unrecognised values fall
    ///   back to UTC with a warning)
    /// - `CONTENT_JSON`, when set and non-blank, is parsed as a [`JsonSource`]
    ///
    /// ## Errors
    ///
    /// Returns an error string if `CONTENT_JSON` is set but malformed.
    pub fn from_process_env() -> Result<Self, String> {
        Self::from_env_map(env_map(std::env::vars_os()), Utc::now())
    }

    /// Loads bindings from the process environment with an explicit JSON
    /// source. `CONTENT_JSON` is not consulted, so a malformed value there
    /// cannot fail the load.
    pub fn from_process_env_with_source(source: JsonSource) -> Self {
        Self::from_env_vars(env_map(std::env::vars_os()), Utc::now()).json_source(source)
    }

    /// Like [`Bindings::from_process_env`] but over an explicit map and instant.
    pub fn from_env_map(env: HashMap<String, String>, now: DateTime<Utc>) -> Result<Self, String> {
        let json_source = match env.get(CONTENT_JSON_VAR) {
            Some(raw) if !raw.trim().is_empty() => Some(raw.parse::<JsonSource>()?),
            _ => None,
        };

        Ok(Self {
            json_source,
            ..Self::from_env_vars(env, now)
        })
    }

    fn from_env_vars(env: HashMap<String, String>, now: DateTime<Utc>) -> Self {
        let time_zone = match env.get(TIME_ZONE_VAR) {
            Some(raw) => parse_time_zone(raw).unwrap_or_else(|error| {
                warn!(time_zone = %raw, %error, "unrecognised time zone, defaulting to UTC");
                utc()
            }),
            None => utc(),
        };

        Self {
            env,
            now,
            time_zone,
            json_source: None,
        }
    }
}

/// Collects variables into a map, skipping any whose name or value is not UTF-8.
fn env_map<I>(vars: I) -> HashMap<String, String>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(name, value)| match (name.into_string(), value.into_string()) {
            (Ok(name), Ok(value)) => Some((name, value)),
            (name, _) => {
                let name = name.unwrap_or_else(|raw| raw.to_string_lossy().into_owned());
                warn!(%name, "skipping environment variable that is not valid UTF-8");
                None
            }
        })
        .collect()
}

/// Engine-wide rendering options.
///
/// ## Examples
///
/// ```
/// use stencil_lib::{Delimiter, RenderConfig};
///
/// let config = RenderConfig::new()
///     .delimiter(Delimiter::Dollar)
///     .attr_tolerant(true)
///     .seed(42);
/// assert_eq!(config.delimiter, Delimiter::Dollar);
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Placeholder opener.
    pub delimiter: Delimiter,
    /// Whether `attr(name)` over a list skips objects lacking `name`.
    pub attr_tolerant: bool,
    /// Seed for reproducible random choices; entropy when `None`.
    pub seed: Option<u64>,
    /// Timeout for the JSON source request.
    pub fetch_timeout: Duration,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::default(),
            attr_tolerant: false,
            seed: None,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

impl RenderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the placeholder delimiter.
    pub fn delimiter(mut self, delimiter: Delimiter) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Make `attr(name)` skip list elements lacking `name`.
    pub fn attr_tolerant(mut self, tolerant: bool) -> Self {
        self.attr_tolerant = tolerant;
        self
    }

    /// Seed every random choice.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Set the JSON fetch timeout.
    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }
}
