//! Edit distance and normalized similarity.

/// Levenshtein distance over Unicode scalar values.
///
/// Shared prefix and suffix are stripped first; the remaining core uses a
/// single DP row sized to the shorter string.
pub fn edit_distance(a: &str, b: &str) -> usize {
    if a == b {
        return 0;
    }

    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let (a, b) = (&a[prefix..], &b[prefix..]);

    let suffix = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (a, b) = (&a[..a.len() - suffix], &b[..b.len() - suffix]);

    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if short.is_empty() {
        return long.len();
    }

    let mut row: Vec<usize> = (0..=short.len()).collect();
    for (i, &lc) in long.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, &sc) in short.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(lc != sc);
            row[j + 1] = (above + 1).min(row[j] + 1).min(substitution);
            diagonal = above;
        }
    }

    row[short.len()]
}

/// `1 - distance / max(len)`, in `[0, 1]`.
///
/// Identical strings (including two empty ones) score 1; exactly one empty
/// string scores 0.
pub fn similarity(a: &str, b: &str) -> f32 {
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let longest = len_a.max(len_b) as f32;
    let distance = edit_distance(a, b) as f32;
    (1.0 - distance / longest).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "a",
        "kitten",
        "sitting",
        "the quick brown fox",
        "the quack brown box",
        "over the lazy dog",
        "мир",
        "мираж",
        "flaw",
        "lawn",
    ];

    #[test]
    fn test_known_distances() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("flaw", "lawn"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("abc", ""), 3);
        assert_eq!(edit_distance("same", "same"), 0);
        assert_eq!(edit_distance("prefix_a_suffix", "prefix_bb_suffix"), 2);
    }

    #[test]
    fn test_distance_counts_chars_not_bytes() {
        assert_eq!(edit_distance("мир", "мираж"), 2);
        assert_eq!(edit_distance("café", "cafe"), 1);
    }

    #[test]
    fn test_distance_is_symmetric() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(edit_distance(a, b), edit_distance(b, a), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn test_similarity_bounds() {
        for a in SAMPLES {
            for b in SAMPLES {
                let s = similarity(a, b);
                assert!((0.0..=1.0).contains(&s), "{a:?} vs {b:?} -> {s}");
            }
        }
    }

    #[test]
    fn test_similarity_identity_and_empty() {
        for a in SAMPLES {
            assert_eq!(similarity(a, a), 1.0);
        }
        assert_eq!(similarity("", "nonempty"), 0.0);
        assert_eq!(similarity("nonempty", ""), 0.0);
    }

    #[test]
    fn test_similarity_ratio() {
        // distance 3 over max length 7
        let s = similarity("kitten", "sitting");
        assert!((s - (1.0 - 3.0 / 7.0)).abs() < 1e-6);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }
}
