/// Levenshtein distance over Unicode scalar values with unit costs for
/// insertion, deletion and substitution. Two-row dynamic programming.
pub fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut cur = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        cur[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let substitute = prev[j] + usize::from(ca != cb);
            let delete = prev[j + 1] + 1;
            let insert = cur[j] + 1;
            cur[j + 1] = substitute.min(delete).min(insert);
        }
        std::mem::swap(&mut prev, &mut cur);
    }
    prev[b.len()]
}

/// `1 − distance / max(len)`; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_examples() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("same", "same"), 0);
    }

    #[test]
    fn counts_chars_not_bytes() {
        assert_eq!(edit_distance("café", "cafe"), 1);
        assert_eq!(edit_distance("naïve", "naive"), 1);
        assert!((similarity("café", "cafe") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn similarity_identity_and_empty() {
        assert_eq!(similarity("", ""), 1.0);
        for s in ["a", "Taken.", "West of House", "ü"] {
            assert_eq!(similarity(s, s), 1.0);
        }
        assert_eq!(similarity("", "abc"), 0.0);
    }

    #[test]
    fn similarity_symmetric() {
        let pairs = [
            ("Taken.", "Dropped."),
            ("You can't go that way.", "You cannot go that way."),
            ("", "x"),
            ("abc", "cba"),
        ];
        for (a, b) in pairs {
            assert_eq!(similarity(a, b), similarity(b, a), "{a:?} {b:?}");
            assert!((0.0..=1.0).contains(&similarity(a, b)));
        }
    }
}
