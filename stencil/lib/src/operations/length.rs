//! Length-bounded string operations. All lengths count characters.

/// Truncates `text` so the result, suffix included, is at most `max` chars.
///
/// Text that already fits is returned unchanged. Otherwise leading
/// whitespace is dropped and the cut falls on
/// the last word boundary that leaves room for `suffix`; a single word too
/// long to fit is hard-cut. Returns `None` when `max` is smaller than the
/// suffix itself.
pub(crate) fn truncate_at_word(text: &str, max: usize, suffix: &str) -> Option<String> {
    let suffix_len = suffix.chars().count();
    if max < suffix_len {
        return None;
    }
    if text.chars().count() <= max {
        return Some(text.to_string());
    }
    let text = text.trim_start();
    if text.chars().count() <= max {
        return Some(text.to_string());
    }

    let limit = max - suffix_len;
    let cut = text
        .char_indices()
        .nth(limit)
        .map_or(text.len(), |(i, _)| i);
    let head = &text[..cut];
    let at_boundary = text[cut..].chars().next().is_none_or(char::is_whitespace);

    let kept = if at_boundary {
        head.trim_end()
    } else {
        match head.rfind(char::is_whitespace) {
            Some(space) if !head[..space].trim_end().is_empty() => head[..space].trim_end(),
            _ => head,
        }
    };

    Some(format!("{kept}{suffix}"))
}

/// Joins a prefix of `items` with `separator`, stopping before the first
/// element that would push the total past `max` chars.
pub(crate) fn join_while(items: &[String], separator: &str, max: usize) -> String {
    let separator_len = separator.chars().count();
    let mut out = String::new();
    let mut total = 0;

    for (i, item) in items.iter().enumerate() {
        let added = item.chars().count() + if i == 0 { 0 } else { separator_len };
        if total + added > max {
            break;
        }
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(item);
        total += added;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn short_text_is_unchanged() {
        assert_eq!(truncate_at_word("Short", 10, "...").unwrap(), "Short");
        assert_eq!(truncate_at_word("exactly10!", 10, "...").unwrap(), "exactly10!");
    }

    #[test]
    fn truncates_on_word_boundary() {
        let text = "This is a very long description that needs to be truncated";
        assert_eq!(truncate_at_word(text, 20, "...").unwrap(), "This is a very...");
        assert_eq!(
            truncate_at_word("This is a longer description", 10, "...").unwrap(),
            "This is..."
        );
        assert_eq!(
            truncate_at_word("Medium length text", 10, "...").unwrap(),
            "Medium..."
        );
    }

    #[test]
    fn boundary_cuts_drop_partial_words() {
        assert_eq!(truncate_at_word("abc defgh", 6, "").unwrap(), "abc");
        assert_eq!(truncate_at_word("abc def ghi", 7, "").unwrap(), "abc def");
    }

    #[test]
    fn single_long_word_is_hard_cut() {
        assert_eq!(
            truncate_at_word("Supercalifragilistic", 8, "...").unwrap(),
            "Super..."
        );
    }

    #[test]
    fn leading_whitespace_is_dropped_before_cutting() {
        assert_eq!(truncate_at_word("     abcdefgh", 5, "").unwrap(), "abcde");
        assert_eq!(truncate_at_word("   hi there", 6, "").unwrap(), "hi");
        assert_eq!(truncate_at_word("   hi there", 8, "").unwrap(), "hi there");
        assert_eq!(truncate_at_word("  lengthy", 5, "..").unwrap(), "len..");
    }

    #[test]
    fn suffix_longer_than_max_is_rejected() {
        assert!(truncate_at_word("anything at all", 2, "...").is_none());
        assert_eq!(truncate_at_word("anything", 3, "...").unwrap(), "...");
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(truncate_at_word("héllo wörld", 11, "").unwrap(), "héllo wörld");
        assert_eq!(truncate_at_word("héllo wörld", 9, "…").unwrap(), "héllo…");
    }

    #[test]
    fn join_while_stops_at_first_overflow() {
        let items = strings(&["one", "two", "three", "four", "five"]);
        assert_eq!(join_while(&items, " ", 12), "one two");
        assert_eq!(join_while(&items, ", ", 100), "one, two, three, four, five");
    }

    #[test]
    fn join_while_is_greedy_not_best_fit() {
        let items = strings(&["aaaa", "bbbbbbbbbb", "c"]);
        assert_eq!(join_while(&items, " ", 8), "aaaa");
    }

    #[test]
    fn join_while_empty_when_first_does_not_fit() {
        let items = strings(&["toolongforthis", "a"]);
        assert_eq!(join_while(&items, " ", 5), "");
        assert_eq!(join_while(&[], " ", 5), "");
    }

    proptest! {
        #[test]
        fn truncation_never_exceeds_max(
            words in prop::collection::vec("[a-zé]{1,12}", 0..12),
            max in 3usize..60,
        ) {
            let text = words.join(" ");
            let out = truncate_at_word(&text, max, "...").unwrap();
            prop_assert!(out.chars().count() <= max);
            if text.chars().count() <= max {
                prop_assert_eq!(out, text);
            }
        }

        #[test]
        fn join_while_never_exceeds_max(
            items in prop::collection::vec("[a-z]{0,8}", 0..10),
            max in 0usize..40,
        ) {
            let out = join_while(&items, ", ", max);
            prop_assert!(out.chars().count() <= max);
        }

        #[test]
        fn join_while_stops_exactly_at_first_overflow(
            items in prop::collection::vec("[a-z]{0,8}", 0..10),
            max in 0usize..40,
        ) {
            let sep = ", ";
            let out = join_while(&items, sep, max);
            let joined = |k: usize| items[..k].join(sep);
            let kept = (0..=items.len())
                .take_while(|&k| joined(k).chars().count() <= max)
                .last()
                .unwrap_or(0);
            prop_assert_eq!(&out, &joined(kept));
            if kept < items.len() {
                let sep_len = if kept == 0 { 0 } else { sep.len() };
                prop_assert!(out.chars().count() + sep_len + items[kept].chars().count() > max);
            }
        }
    }
}
