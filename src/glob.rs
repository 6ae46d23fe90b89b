//! Glob matching over raw bytes, used by `KEYS`, `PSUBSCRIBE` and
//! `PUBSUB CHANNELS`.
//!
//! Supported syntax:
//!
//! * `*` matches any sequence of bytes, including the empty one
//! * `?` matches exactly one byte
//! * `[abc]`, `[a-z]` match one byte from the class, `[^abc]` negates it
//! * `\x` matches `x` literally

/// Returns `true` when `subject` matches `pattern` in its entirety.
pub fn glob_match(pattern: &[u8], subject: &[u8]) -> bool {
    let mut p = 0;
    let mut s = 0;
    // Position to resume from after the most recent `*`: (pattern, subject).
    let mut backtrack: Option<(usize, usize)> = None;

    while s < subject.len() {
        if p < pattern.len() {
            match pattern[p] {
                b'*' => {
                    // Collapse runs of stars.
                    while p < pattern.len() && pattern[p] == b'*' {
                        p += 1;
                    }
                    if p == pattern.len() {
                        return true;
                    }
                    backtrack = Some((p, s));
                    continue;
                }
                b'?' => {
                    p += 1;
                    s += 1;
                    continue;
                }
                b'[' => {
                    if let Some((matched, next)) = match_class(pattern, p, subject[s]) {
                        if matched {
                            p = next;
                            s += 1;
                            continue;
                        }
                    } else if subject[s] == b'[' {
                        // Unterminated class, take the bracket literally.
                        p += 1;
                        s += 1;
                        continue;
                    }
                }
                b'\\' if p + 1 < pattern.len() => {
                    if pattern[p + 1] == subject[s] {
                        p += 2;
                        s += 1;
                        continue;
                    }
                }
                literal => {
                    if literal == subject[s] {
                        p += 1;
                        s += 1;
                        continue;
                    }
                }
            }
        }

        match backtrack {
            Some((star_p, star_s)) => {
                p = star_p;
                s = star_s + 1;
                backtrack = Some((star_p, s));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

/// Matches `byte` against the class opening at `pattern[start] == b'['`.
///
/// Returns whether it matched and the pattern offset after the closing `]`,
/// or `None` when the class is never closed.
fn match_class(pattern: &[u8], start: usize, byte: u8) -> Option<(bool, usize)> {
    let mut i = start + 1;
    let negate = pattern.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }

    let mut matched = false;
    let mut first = true;

    loop {
        let current = *pattern.get(i)?;

        if current == b']' && !first {
            return Some((matched != negate, i + 1));
        }
        first = false;

        if current == b'\\' {
            let escaped = *pattern.get(i + 1)?;
            if escaped == byte {
                matched = true;
            }
            i += 2;
            continue;
        }

        if pattern.get(i + 1) == Some(&b'-') && pattern.get(i + 2).is_some_and(|&b| b != b']') {
            let mut low = current;
            let mut high = pattern[i + 2];
            if low > high {
                std::mem::swap(&mut low, &mut high);
            }
            if (low..=high).contains(&byte) {
                matched = true;
            }
            i += 3;
            continue;
        }

        if current == byte {
            matched = true;
        }
        i += 1;
    }
}
