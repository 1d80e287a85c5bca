//! Heading text to URL fragment slugs

/// Fallback used when a heading produces an empty slug
pub const FALLBACK_SLUG: &str = "section";

/// Turn heading text into a URL-safe slug
///
/// Lowercases and trims, spells `&` as `and`, drops everything that is not an
/// ASCII word character, hyphen or whitespace, then turns whitespace runs
/// into single hyphens and squeezes repeated hyphens.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spelled = lowered.trim().replace('&', " and ");

    let mut slug = String::with_capacity(spelled.len());
    let mut pending_space = false;
    for c in spelled.chars() {
        if c.is_whitespace() {
            pending_space = true;
            continue;
        }
        if !(c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            continue;
        }
        if pending_space {
            push_hyphen(&mut slug);
            pending_space = false;
        }
        if c == '-' {
            push_hyphen(&mut slug);
        } else {
            slug.push(c);
        }
    }
    if pending_space {
        push_hyphen(&mut slug);
    }

    slug
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}
