//! Redis-style glob matching for `KEYS` patterns.
//!
//! Supports `*`, `?`, `[abc]`, `[a-z]`, `[^abc]` and `\` escapes.

/// Returns true if `text` matches the glob `pattern`.
///
/// Runs in `O(pattern * text)` time: only the most recent `*` is ever
/// retried, because every other token consumes exactly one byte.
pub fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Pattern position just after the last `*`, and the text position it resumes at.
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if pattern.get(p) == Some(&b'*') {
            p += 1;
            star = Some((p, t));
            continue;
        }
        if let Some(next) = step(pattern, p, text[t]) {
            p = next;
            t += 1;
            continue;
        }
        match star {
            Some((resume, consumed)) => {
                star = Some((resume, consumed + 1));
                p = resume;
                t = consumed + 1;
            }
            None => return false,
        }
    }
    pattern[p..].iter().all(|&b| b == b'*')
}

/// Matches the single-byte token at `p` against `ch`, returning the position
/// of the next token.
fn step(pattern: &[u8], p: usize, ch: u8) -> Option<usize> {
    match &pattern[p..] {
        [] => None,
        [b'?', ..] => Some(p + 1),
        [b'\\', escaped, ..] => (*escaped == ch).then_some(p + 2),
        [b'[', class @ ..] => match class_end(class) {
            Some(end) => class_match(&class[..end], ch).then_some(p + end + 2),
            None => (ch == b'[').then_some(p + 1),
        },
        [literal, ..] => (*literal == ch).then_some(p + 1),
    }
}

/// Index of the `]` closing a character class, honoring `\` escapes.
fn class_end(class: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < class.len() {
        match class[i] {
            b'\\' => i += 2,
            b']' => return Some(i),
            _ => i += 1,
        }
    }
    None
}

fn class_match(class: &[u8], ch: u8) -> bool {
    let (negate, class) = match class.first() {
        Some(b'^') => (true, &class[1..]),
        _ => (false, class),
    };
    let mut i = 0;
    let mut found = false;
    while i < class.len() {
        if class[i] == b'\\' && i + 1 < class.len() {
            found |= class[i + 1] == ch;
            i += 2;
        } else if i + 2 < class.len() && class[i + 1] == b'-' {
            let (lo, hi) = if class[i] <= class[i + 2] {
                (class[i], class[i + 2])
            } else {
                (class[i + 2], class[i])
            };
            found |= (lo..=hi).contains(&ch);
            i += 3;
        } else {
            found |= class[i] == ch;
            i += 1;
        }
    }
    if negate { !found } else { found }
}

#[cfg(test)]
mod tests {
    use super::glob_match;

    fn matches(pattern: &str, text: &str) -> bool {
        glob_match(pattern.as_bytes(), text.as_bytes())
    }

    #[test]
    fn star_matches_any_suffix() {
        assert!(matches("ic*", "icao"));
        assert!(matches("ic*", "icao:more"));
        assert!(matches("ic*", "ic"));
        assert!(!matches("ic*", "itu"));
        assert!(matches("*", ""));
        assert!(matches("*:more", "icao:more"));
    }

    #[test]
    fn question_matches_one_byte() {
        assert!(matches("it?", "itu"));
        assert!(!matches("it?", "it"));
        assert!(!matches("it?", "itus"));
    }

    #[test]
    fn classes_and_ranges() {
        assert!(matches("h[ae]llo", "hello"));
        assert!(!matches("h[ae]llo", "hillo"));
        assert!(matches("h[^e]llo", "hallo"));
        assert!(!matches("h[^e]llo", "hello"));
        assert!(matches("key[0-9]", "key7"));
        assert!(matches("key[9-0]", "key7"));
        assert!(!matches("key[0-9]", "keyx"));
    }

    #[test]
    fn escapes_are_literal() {
        assert!(matches(r"a\*b", "a*b"));
        assert!(!matches(r"a\*b", "axb"));
        assert!(matches(r"[\]]", "]"));
    }

    #[test]
    fn many_stars_fail_fast() {
        let text = "a".repeat(4096);
        assert!(!matches("*a*a*a*a*a*a*a*a*a*a*a*a*b", &text));
        assert!(matches("*a*a*a*a*a*a*a*a*a*a*a*a*", &text));
        assert!(matches("a**?*a", &text));
    }

    #[test]
    fn star_backtracks_past_partial_matches() {
        assert!(matches("*abc", "ababc"));
        assert!(matches("a*b?d", "axbxbcd"));
        assert!(!matches("a*b?d", "axbxbc"));
        assert!(matches(r"*\*", "icao*"));
        assert!(matches("trailing\\", "trailing\\"));
    }

    #[test]
    fn unterminated_class_is_literal() {
        assert!(matches("a[b", "a[b"));
        assert!(!matches("a[b", "ab"));
    }
}
