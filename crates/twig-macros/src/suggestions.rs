//! Closest-match suggestions for misspelled option keys.

/// Levenshtein distance between two strings: the minimum number of
/// single-character insertions, deletions or substitutions.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            current[j + 1] = (previous[j + 1] + 1) // deletion
                .min(current[j] + 1) // insertion
                .min(previous[j] + cost); // substitution
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// The valid name closest to `unknown`, if any is within distance 2.
pub fn find_closest(unknown: &str, valid: &[&str]) -> Option<String> {
    valid
        .iter()
        .map(|&name| (name, levenshtein_distance(unknown, name)))
        .filter(|(_, d)| *d <= 2)
        .min_by_key(|(_, d)| *d)
        .map(|(name, _)| name.to_string())
}

/// Error message for an option key `view!` does not recognize.
pub fn format_unknown_option_error(tag: &str, unknown: &str, valid: &[&str]) -> String {
    let mut msg = format!("unknown option `{}` on `{}`", unknown, tag);

    if let Some(suggestion) = find_closest(unknown, valid) {
        msg.push_str(&format!("\n\nDid you mean `{}`?", suggestion));
    }

    msg.push_str("\n\nValid options are: ");
    msg.push_str(&valid.join(", "));
    msg.push_str(", or `on<event>` for a handler");
    msg
}
