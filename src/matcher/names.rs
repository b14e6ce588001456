//! Name normalisation shared by the matcher and the refinement loop.

use crate::schema::FieldDescriptor;

const STOPWORDS: &[&str] = &[
    "a", "an", "the", "of", "for", "by", "to", "in", "on", "at", "and", "or", "with", "from",
];

/// Lowercases and strips everything that is not an ASCII letter or digit.
///
/// `user_id`, `userId` and `User-ID` all normalise to `userid`.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// Splits a name into lowercase word tokens.
///
/// camelCase and acronym boundaries split, a trailing `ids` becomes `id`, and
/// stopwords are dropped.
pub fn tokenize_name(name: &str) -> Vec<String> {
    let mut tokens: Vec<String> = split_words(name)
        .into_iter()
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .collect();
    if let Some(last) = tokens.last_mut() {
        if last == "ids" {
            *last = "id".to_string();
        }
    }
    tokens
}

fn split_words(name: &str) -> Vec<String> {
    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }
        if c.is_ascii_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            // fooBar | HTTPStatus -> HTTP Status
            if prev.is_ascii_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_ascii_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c.to_ascii_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Entity names a field like `cartId`, `order_item_id` or `cartid` points at.
///
/// Returns the concatenation of every word before the trailing `id` and, when
/// different, the single word right before it. Empty when the name has no such shape.
pub fn entity_candidates(name: &str) -> Vec<String> {
    let tokens = tokenize_name(name);
    let mut candidates = Vec::new();

    match tokens.split_last() {
        Some((last, rest)) if last == "id" && !rest.is_empty() => {
            candidates.push(rest.concat());
            if rest.len() > 1 {
                candidates.push(rest[rest.len() - 1].clone());
            }
        }
        Some((last, [])) if last.len() > 2 && last.ends_with("id") => {
            candidates.push(last[..last.len() - 2].to_string());
        }
        _ => {}
    }
    candidates
}

/// Whether `name` refers to `entity` through an `<entity>Id` shape.
pub fn refers_to_entity(name: &str, entity: &str) -> bool {
    let entity = normalize_name(entity);
    !entity.is_empty() && entity_candidates(name).contains(&entity)
}

/// Equal primitive type; when both sides declare a format, formats must match too.
pub fn types_compatible(a: &FieldDescriptor, b: &FieldDescriptor) -> bool {
    if a.field_type != b.field_type {
        return false;
    }
    match (&a.format, &b.format) {
        (Some(fa), Some(fb)) => fa == fb,
        _ => true,
    }
}

/// Whether a normalized name looks like it carries a credential token.
pub fn is_token_like(name: &str) -> bool {
    normalize_name(name).contains("token")
}
