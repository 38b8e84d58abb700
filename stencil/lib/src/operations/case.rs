//! Case conversions for the `case_*` operations.

/// A case conversion style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseStyle {
    /// `Hello World` - each whitespace-delimited word capitalized.
    Title,
    /// `Hello world` - first letter upper, the rest lower.
    Sentence,
    /// `HELLO WORLD`
    Upper,
    /// `hello world`
    Lower,
    /// `HelloWorld`
    Pascal,
    /// `hello-world`
    Kebab,
    /// `hello_world`
    Snake,
}

impl CaseStyle {
    /// Maps an operation name such as `case_pascal` to its style.
    pub fn from_operation(name: &str) -> Option<Self> {
        let style = match name.strip_prefix("case_")? {
            "title" => CaseStyle::Title,
            "sentence" => CaseStyle::Sentence,
            "upper" => CaseStyle::Upper,
            "lower" => CaseStyle::Lower,
            "pascal" => CaseStyle::Pascal,
            "kebab" => CaseStyle::Kebab,
            "snake" => CaseStyle::Snake,
            _ => return None,
        };
        Some(style)
    }

    /// Converts `text` to this style.
    ///
    /// ## Examples
    ///
    /// ```
    /// use stencil_lib::CaseStyle;
    ///
    /// assert_eq!(CaseStyle::Pascal.apply("ancient mythology"), "AncientMythology");
    /// assert_eq!(CaseStyle::Kebab.apply("FooBar baz"), "foo-bar-baz");
    /// assert_eq!(CaseStyle::Sentence.apply("hello WORLD"), "Hello world");
    /// ```
    pub fn apply(self, text: &str) -> String {
        match self {
            CaseStyle::Upper => text.to_uppercase(),
            CaseStyle::Lower => text.to_lowercase(),
            CaseStyle::Title => title_case(text),
            CaseStyle::Sentence => sentence_case(text),
            CaseStyle::Pascal => split_words(text).iter().map(|w| capitalize(w)).collect(),
            CaseStyle::Kebab => join_lower(text, "-"),
            CaseStyle::Snake => join_lower(text, "_"),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.as_str().to_lowercase().chars()).collect(),
        None => String::new(),
    }
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            at_word_start = true;
            out.push(c);
        } else if at_word_start {
            at_word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn sentence_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut seen_letter = false;
    for c in text.chars() {
        if !seen_letter && c.is_alphabetic() {
            seen_letter = true;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

fn join_lower(text: &str, separator: &str) -> String {
    split_words(text)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(separator)
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || c == '-' || c == '_'
}

/// Splits on whitespace, `-`, `_`, and case boundaries (`fooBar`, `HTMLParser`).
fn split_words(text: &str) -> Vec<String> {
    let mut words = Vec::new();
    for chunk in text.split(is_separator).filter(|c| !c.is_empty()) {
        let chars: Vec<char> = chunk.chars().collect();
        let mut current = String::new();
        for (i, &c) in chars.iter().enumerate() {
            if i > 0 && !current.is_empty() {
                let prev = chars[i - 1];
                let next = chars.get(i + 1).copied();
                let lower_to_upper =
                    (prev.is_lowercase() || prev.is_ascii_digit()) && c.is_uppercase();
                let acronym_end = prev.is_uppercase()
                    && c.is_uppercase()
                    && next.is_some_and(char::is_lowercase);
                if lower_to_upper || acronym_end {
                    words.push(std::mem::take(&mut current));
                }
            }
            current.push(c);
        }
        if !current.is_empty() {
            words.push(current);
        }
    }
    words
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_style_on_hello_world() {
        let cases = [
            (CaseStyle::Pascal, "HelloWorld"),
            (CaseStyle::Kebab, "hello-world"),
            (CaseStyle::Snake, "hello_world"),
            (CaseStyle::Upper, "HELLO WORLD"),
            (CaseStyle::Lower, "hello world"),
            (CaseStyle::Title, "Hello World"),
            (CaseStyle::Sentence, "Hello world"),
        ];
        for (style, expected) in cases {
            assert_eq!(style.apply("hello world"), expected, "{style:?}");
        }
    }

    #[test]
    fn split_words_handles_separators_and_case_boundaries() {
        assert_eq!(split_words("test-case_item"), ["test", "case", "item"]);
        assert_eq!(split_words("FooBar"), ["Foo", "Bar"]);
        assert_eq!(split_words("HTMLParser v2Beta"), ["HTML", "Parser", "v2", "Beta"]);
        assert_eq!(split_words("  spaced   out  "), ["spaced", "out"]);
        assert!(split_words("--").is_empty());
    }

    #[test]
    fn pascal_kebab_snake_from_mixed_input() {
        assert_eq!(CaseStyle::Pascal.apply("foo bar baz"), "FooBarBaz");
        assert_eq!(CaseStyle::Pascal.apply("test-case_item"), "TestCaseItem");
        assert_eq!(CaseStyle::Kebab.apply("test_case_item"), "test-case-item");
        assert_eq!(CaseStyle::Snake.apply("FooBar"), "foo_bar");
        assert_eq!(CaseStyle::Snake.apply("test-case-item"), "test_case_item");
    }

    #[test]
    fn title_preserves_whitespace() {
        assert_eq!(CaseStyle::Title.apply("hELLO  wide\tworld"), "Hello  Wide\tWorld");
    }

    #[test]
    fn sentence_skips_leading_punctuation() {
        assert_eq!(CaseStyle::Sentence.apply("\"QUOTED\" Text"), "\"Quoted\" text");
    }

    #[test]
    fn from_operation_names() {
        assert_eq!(CaseStyle::from_operation("case_title"), Some(CaseStyle::Title));
        assert_eq!(CaseStyle::from_operation("case_snake"), Some(CaseStyle::Snake));
        assert_eq!(CaseStyle::from_operation("case_camel"), None);
        assert_eq!(CaseStyle::from_operation("title"), None);
    }
}
