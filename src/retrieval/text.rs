//! Text normalization, tokenization, and token estimation shared by the retrieval tools.

use std::collections::BTreeSet;

/// Rough token estimate used across retrieval: `ceil(chars / 4)`.
pub fn estimate_tokens(text: &str) -> usize {
    text.chars().count().div_ceil(4)
}

/// Lowercase and collapse whitespace runs into single spaces.
pub fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Split a query into lowercase alphanumeric tokens, deduplicated in first-seen order.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut tokens = Vec::new();
    for raw in text.split(|c: char| !c.is_alphanumeric()) {
        if raw.is_empty() {
            continue;
        }
        let token = raw.to_lowercase();
        if seen.insert(token.clone()) {
            tokens.push(token);
        }
    }
    tokens
}

/// Take at most `max_chars` characters. Returns the prefix and whether anything was cut.
pub fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => (text[..end].to_string(), true),
        None => (text.to_string(), false),
    }
}

/// Truncate to `max_chars` characters, appending `"..."` if anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let (head, truncated) = truncate_chars(text, max_chars);
    if truncated {
        format!("{head}...")
    } else {
        head
    }
}

/// Character index in `text` of the earliest case-insensitive occurrence of any needle.
///
/// Needles must already be lowercase. Offsets refer to `text` itself, not its lowercased
/// form, whose length can differ.
pub fn find_first_char_index(text: &str, needles: &[String]) -> Option<usize> {
    let mut lowered = String::with_capacity(text.len());
    // (byte offset in `lowered`, char index in `text`) for each source char
    let mut origins = Vec::with_capacity(text.len());
    for (char_idx, c) in text.chars().enumerate() {
        origins.push((lowered.len(), char_idx));
        lowered.extend(c.to_lowercase());
    }

    let hit = needles
        .iter()
        .filter(|n| !n.is_empty())
        .filter_map(|n| lowered.find(n.as_str()))
        .min()?;
    let pos = origins.partition_point(|(byte, _)| *byte <= hit);
    origins.get(pos.checked_sub(1)?).map(|(_, char_idx)| *char_idx)
}

/// Forms a display name (title or trigger key) can be referenced by: the normalized name
/// plus its space, hyphen, and underscore variants.
pub fn name_forms(name: &str) -> BTreeSet<String> {
    let mut forms = BTreeSet::new();
    push_separator_variants(&normalize_text(name), &mut forms);
    forms
}

/// Forms a raw `[[...]]` reference can resolve through.
///
/// Drops the `|alias` and `#heading` parts, then yields the full normalized text and its
/// last path segment (without a `.md` suffix), each with separator variants.
pub fn reference_forms(raw: &str) -> BTreeSet<String> {
    let mut forms = BTreeSet::new();
    let target = raw.split('|').next().unwrap_or_default();
    let target = target.split('#').next().unwrap_or_default();
    let full = normalize_text(target);
    if full.is_empty() {
        return forms;
    }

    let full = full.strip_suffix(".md").unwrap_or(&full).trim().to_string();
    let basename = full.rsplit('/').next().unwrap_or_default().trim().to_string();

    push_separator_variants(&full, &mut forms);
    push_separator_variants(&basename, &mut forms);
    forms
}

fn push_separator_variants(form: &str, out: &mut BTreeSet<String>) {
    if form.is_empty() {
        return;
    }
    out.insert(form.to_string());
    let spaced = normalize_text(&form.replace(['-', '_'], " "));
    if spaced.is_empty() {
        return;
    }
    out.insert(spaced.replace(' ', "-"));
    out.insert(spaced.replace(' ', "_"));
    out.insert(spaced);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        // characters, not bytes
        assert_eq!(estimate_tokens("ééééé"), 2);
    }

    #[test]
    fn first_char_index_counts_source_chars() {
        let needles = vec!["keep".to_string(), "river".to_string()];
        assert_eq!(find_first_char_index("The River Keep", &needles), Some(4));
        // "İ" lowercases to two chars
        assert_eq!(find_first_char_index("İİkeep", &needles), Some(2));
        assert_eq!(find_first_char_index("nothing here", &needles), None);
        assert_eq!(find_first_char_index("abc", &[]), None);
    }

    #[test]
    fn tokenize_dedups_and_lowercases() {
        assert_eq!(
            tokenize("Who is ALICE? alice, of the Iron-Keep"),
            vec!["who", "is", "alice", "of", "the", "iron", "keep"]
        );
        assert!(tokenize("  ?!  ").is_empty());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé".to_string(), true));
        assert_eq!(truncate_chars("hi", 5), ("hi".to_string(), false));
        assert_eq!(excerpt("abcdef", 3), "abc...");
    }

    #[test]
    fn reference_forms_strip_alias_heading_and_path() {
        let forms = reference_forms("Places/Iron_Keep.md#Gate|the keep");
        assert!(forms.contains("places/iron_keep"));
        assert!(forms.contains("iron_keep"));
        assert!(forms.contains("iron keep"));
        assert!(forms.contains("iron-keep"));
        assert!(!forms.iter().any(|f| f.contains("gate")));
        assert!(reference_forms("|alias only").is_empty());
    }

    #[test]
    fn name_forms_cover_separator_variants() {
        let forms = name_forms("Alice  Smith");
        assert!(forms.contains("alice smith"));
        assert!(forms.contains("alice-smith"));
        assert!(forms.contains("alice_smith"));
    }
}
