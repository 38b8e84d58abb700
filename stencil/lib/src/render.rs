//! Template rendering: one pass over one or more templates sharing a
//! single JSON context, RNG and instant.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, instrument};

use crate::config::{Bindings, RenderConfig};
use crate::context::{HttpFetcher, JsonContext, JsonFetcher};
use crate::error::{RenderError, Result};
use crate::expression::{Argument, Namespace, ParsedExpression, Reference};
use crate::operations::{self, Operation, OperationEnv};
use crate::scanner::{Token, scan};
use crate::source;
use crate::value::Value;

/// Renders templates with a fixed configuration and JSON fetcher.
///
/// ## Examples
///
/// ```no_run
/// use chrono::Utc;
/// use stencil_lib::{Bindings, Delimiter, RenderConfig, Renderer};
///
/// # async fn run() -> stencil_lib::Result<()> {
/// let renderer = Renderer::new(RenderConfig::new().delimiter(Delimiter::Dollar));
/// let bindings = Bindings::new(Utc::now()).var("NAME", "world");
/// let text = renderer.render("Hello ${env.NAME | case_title}", &bindings).await?;
/// assert_eq!(text, "Hello World");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Renderer<F = HttpFetcher> {
    config: RenderConfig,
    fetcher: F,
}

impl Renderer<HttpFetcher> {
    /// Creates a renderer that fetches JSON over HTTP with the configured timeout.
    pub fn new(config: RenderConfig) -> Self {
        let fetcher = HttpFetcher::new(config.fetch_timeout);
        Self { config, fetcher }
    }
}

impl Default for Renderer<HttpFetcher> {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl<F: JsonFetcher> Renderer<F> {
    /// Creates a renderer with a custom JSON fetcher.
    pub fn with_fetcher(config: RenderConfig, fetcher: F) -> Self {
        Self { config, fetcher }
    }

    /// The renderer's configuration.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Starts a render pass.
    ///
    /// Every template rendered through the returned pass shares one JSON
    /// context (fetched on first use) and one random number generator.
    pub fn pass<'a>(&'a self, bindings: &'a Bindings) -> RenderPass<'a, F> {
        let rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        RenderPass {
            renderer: self,
            bindings,
            context: None,
            rng,
        }
    }

    /// Renders a single template in its own pass.
    pub async fn render(&self, template: &str, bindings: &Bindings) -> Result<String> {
        self.pass(bindings).render(template).await
    }

    /// Renders several templates in one shared pass.
    ///
    /// Fails on the first template that fails; no partial results are returned.
    pub async fn render_many<I, S>(&self, templates: I, bindings: &Bindings) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut pass = self.pass(bindings);
        let mut rendered = Vec::new();
        for template in templates {
            rendered.push(pass.render(template.as_ref()).await?);
        }
        Ok(rendered)
    }
}

/// State for one render pass.
///
/// Created by [`Renderer::pass`]. The JSON context is loaded lazily on the
/// first `json.*`/`api.*` reference and reused afterwards, so a narrowing
/// `[RANDOM]` is chosen once per pass.
#[derive(Debug)]
pub struct RenderPass<'a, F = HttpFetcher> {
    renderer: &'a Renderer<F>,
    bindings: &'a Bindings,
    context: Option<JsonContext>,
    rng: StdRng,
}

impl<F: JsonFetcher> RenderPass<'_, F> {
    /// Substitutes every placeholder in `template`.
    ///
    /// ## Errors
    ///
    /// Any [`RenderError`] raised while parsing a placeholder, resolving its
    /// value, or applying its operations. Nothing is returned for a template
    /// that fails part-way.
    #[instrument(
        name = "render",
        skip_all,
        fields(
            delimiter = %self.renderer.config.delimiter,
            template_len = template.len()
        )
    )]
    pub async fn render(&mut self, template: &str) -> Result<String> {
        let mut output = String::with_capacity(template.len());

        for token in scan(template, self.renderer.config.delimiter) {
            match token {
                Token::Literal(text) => output.push_str(text),
                Token::Placeholder { raw, content } => {
                    let Some(expression) = ParsedExpression::parse(content)? else {
                        output.push_str(raw);
                        continue;
                    };
                    let value = self.evaluate(&expression).await?;
                    let text = value.into_output(&format!("placeholder '{expression}'"))?;
                    debug!(placeholder = raw, value = %text, "resolved placeholder");
                    output.push_str(&text);
                }
            }
        }

        Ok(output)
    }

    /// Resolves an expression's reference and applies its operations.
    pub async fn evaluate(&mut self, expression: &ParsedExpression) -> Result<Value> {
        let ops = expression
            .operations
            .iter()
            .map(Operation::resolve)
            .collect::<Result<Vec<_>>>()?;
        let mut value = self.resolve(&expression.reference).await?;

        for (call, op) in expression.operations.iter().zip(ops) {
            if op == Operation::Or && !value.is_blank() {
                continue;
            }

            let mut args = Vec::with_capacity(call.args.len());
            for arg in &call.args {
                args.push(match arg {
                    Argument::Literal(text) => Value::String(text.clone()),
                    Argument::Reference(reference) => self.resolve(reference).await?,
                });
            }

            let mut env = OperationEnv {
                rng: &mut self.rng,
                attr_tolerant: self.renderer.config.attr_tolerant,
            };
            value = operations::apply(op, call, value, args, &mut env)?;
        }

        Ok(value)
    }

    /// Resolves a reference (namespace and path, no operations).
    pub async fn resolve(&mut self, reference: &Reference) -> Result<Value> {
        match reference.namespace {
            Namespace::Env => source::resolve_env(self.bindings, &reference.path),
            Namespace::Builtin => source::resolve_builtin(self.bindings, &reference.path),
            Namespace::Json | Namespace::Api => {
                self.ensure_context(reference.namespace).await?;
                match &self.context {
                    Some(context) => reference.path.evaluate(context.root(), &mut self.rng),
                    None => Err(RenderError::MissingJsonSource {
                        namespace: reference.namespace.to_string(),
                    }),
                }
            }
        }
    }

    /// The pass's JSON context, if one has been loaded.
    pub fn context(&self) -> Option<&JsonContext> {
        self.context.as_ref()
    }

    async fn ensure_context(&mut self, namespace: Namespace) -> Result<()> {
        if self.context.is_some() {
            return Ok(());
        }
        let source = self
            .bindings
            .json_source
            .as_ref()
            .ok_or_else(|| RenderError::MissingJsonSource {
                namespace: namespace.to_string(),
            })?;
        let context = JsonContext::load(source, &self.renderer.fetcher, &mut self.rng).await?;
        self.context = Some(context);
        Ok(())
    }
}

/// Renders `template` with the default configuration.
pub async fn render(template: &str, bindings: &Bindings) -> Result<String> {
    Renderer::default().render(template, bindings).await
}

/// Renders `templates` in one shared pass with the default configuration.
pub async fn render_many<I, S>(templates: I, bindings: &Bindings) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    Renderer::default().render_many(templates, bindings).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Delimiter;
    use crate::context::{FetchError, JsonSource};
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_test::traced_test;
    use url::Url;

    /// Serves a fixed document and counts fetches.
    struct StaticFetcher {
        document: serde_json::Value,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(document: serde_json::Value) -> Self {
            Self {
                document,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl JsonFetcher for StaticFetcher {
        async fn fetch(&self, _url: &Url) -> std::result::Result<serde_json::Value, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.document.clone())
        }
    }

    fn bindings(source: Option<&str>) -> Bindings {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap();
        let mut bindings = Bindings::new(now)
            .var("NAME", "ada lovelace")
            .var("EMPTY", "");
        if let Some(source) = source {
            bindings = bindings.json_source(source.parse::<JsonSource>().unwrap());
        }
        bindings
    }

    fn renderer(document: serde_json::Value) -> Renderer<StaticFetcher> {
        Renderer::with_fetcher(
            RenderConfig::new().delimiter(Delimiter::Dollar).seed(42),
            StaticFetcher::new(document),
        )
    }

    #[tokio::test]
    async fn env_and_builtin_placeholders() {
        let r = renderer(json!({}));
        let out = r
            .render(
                "${env.NAME | case_title} on ${builtin.CURR_DATE} at ${builtin.CURR_TIME}",
                &bindings(None),
            )
            .await
            .unwrap();
        assert_eq!(out, "Ada Lovelace on 2024-03-01 at 09:05:00");
    }

    #[tokio::test]
    async fn json_without_source_is_missing_json_source() {
        let r = renderer(json!({"a": 1}));
        let err = r.render("${api.a}", &bindings(None)).await.unwrap_err();
        assert!(matches!(err, RenderError::MissingJsonSource { ref namespace } if namespace == "api"));
    }

    #[tokio::test]
    async fn context_is_fetched_once_per_pass() {
        let r = renderer(json!({"title": "T", "tags": ["a", "b"]}));
        let b = bindings(Some("https://example.com/doc.json"));
        let out = r
            .render_many(["${json.title}", "${api.tags | join(',')} ${json.title}"], &b)
            .await
            .unwrap();
        assert_eq!(out, ["T", "a,b T"]);
        assert_eq!(r.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn env_only_templates_never_fetch() {
        let r = renderer(json!({}));
        let b = bindings(Some("https://example.com/doc.json"));
        r.render("${env.NAME}", &b).await.unwrap();
        assert_eq!(r.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn or_is_lazy_and_coalesces() {
        let r = renderer(json!({"title": "From JSON"}));
        // No JSON source: a resolved `or` argument would fail.
        let out = r
            .render("${env.NAME | or(json.title)}", &bindings(None))
            .await
            .unwrap();
        assert_eq!(out, "ada lovelace");

        let b = bindings(Some("https://example.com/doc.json"));
        let out = r
            .render("${env.EMPTY | or(json.title) | or('unused')}", &b)
            .await
            .unwrap();
        assert_eq!(out, "From JSON");
    }

    #[tokio::test]
    async fn reference_arguments_share_the_context() {
        let r = renderer(json!({
            "series": "Aesop: ",
            "sep": " / ",
            "fables": ["The Fox", "The Crow"]
        }));
        let b = bindings(Some("https://example.com/doc.json"));
        let out = r
            .render("${json.fables | each:prefix json.series | join(json.sep)}", &b)
            .await
            .unwrap();
        assert_eq!(out, "Aesop: The Fox / Aesop: The Crow");
        assert_eq!(r.fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_operation_fails_before_fetching() {
        let r = renderer(json!({"x": "y"}));
        let b = bindings(Some("https://example.com/doc.json"));
        let err = r.render("${json.x | bogus}", &b).await.unwrap_err();
        assert!(matches!(err, RenderError::UnknownOperation { ref name } if name == "bogus"));
        assert_eq!(r.fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn apostrophe_in_bare_argument_is_evaluated() {
        let r = renderer(json!({}));
        let out = r
            .render("${env.EMPTY | or(O'Brien)} done", &bindings(None))
            .await
            .unwrap();
        assert_eq!(out, "O'Brien done");
    }

    #[tokio::test]
    async fn unterminated_quote_in_placeholder_is_an_error() {
        let r = renderer(json!({}));
        let err = r
            .render("${env.EMPTY | or('abc)} done", &bindings(None))
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn list_output_is_type_mismatch() {
        let r = renderer(json!({"tags": ["a"]}));
        let b = bindings(Some("https://example.com/doc.json"));
        let err = r.render("${json.tags}", &b).await.unwrap_err();
        assert!(matches!(
            err,
            RenderError::TypeMismatch { expected: "scalar", found: "list", .. }
        ));
    }

    #[tokio::test]
    async fn seeded_passes_are_reproducible() {
        let doc = json!({"items": ["a", "b", "c", "d", "e", "f", "g", "h"]});
        let b = bindings(Some("https://example.com/doc.json"));
        let template = "${json.items[RANDOM]} ${json.items | random}";
        let first = renderer(doc.clone()).render(template, &b).await.unwrap();
        let second = renderer(doc).render(template, &b).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn numbers_and_bools_stringify() {
        let r = renderer(json!({"count": 3, "ratio": 2.0, "ok": true, "none": null}));
        let b = bindings(Some("https://example.com/doc.json"));
        let out = r
            .render("${json.count}|${json.ratio}|${json.ok}|${json.none}|", &b)
            .await
            .unwrap();
        assert_eq!(out, "3|2|true||");
    }

    #[tokio::test]
    #[traced_test]
    async fn logs_resolved_placeholders() {
        let r = renderer(json!({}));
        r.render("${env.NAME}", &bindings(None)).await.unwrap();
        assert!(logs_contain("resolved placeholder"));
    }
}
