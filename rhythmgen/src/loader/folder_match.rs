// Typo-tolerant lookup of sample folders ("snare" vs "snares", "hihat" vs
// "hi-hats"). Similarity is the Ratcliff/Obershelp ratio 2*M/T, where M
// counts characters in matching blocks and T is the combined length, so
// 1.0 means identical and 0.0 means nothing in common.

pub const FUZZY_CUTOFF: f64 = 0.8;

/// Longest common block as `(start_in_a, start_in_b, len)`. Among equally
/// long blocks the one starting earliest in `a`, then in `b`, wins.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    // run lengths of matches ending at (i, j), kept one row at a time
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut cur = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca != cb {
                continue;
            }
            let k = prev[j] + 1;
            cur[j + 1] = k;
            if k > best.2 {
                best = (i + 1 - k, j + 1 - k, k);
            }
        }
        prev = cur;
    }
    best
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, k) = longest_block(a, b);
    if k == 0 {
        return 0;
    }
    k + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + k..], &b[j + k..])
}

pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * matching_chars(&a, &b) as f64 / total as f64
}

/// Best candidate at or above `cutoff`, compared case-insensitively. Ties
/// go to the alphabetically first name so results don't depend on
/// directory listing order.
pub fn closest_match<'a>(query: &str, candidates: &'a [String], cutoff: f64) -> Option<&'a str> {
    let query = query.to_lowercase();
    let mut best: Option<(&'a str, f64)> = None;
    for cand in candidates {
        let score = similarity(&query, &cand.to_lowercase());
        if score < cutoff {
            continue;
        }
        best = match best {
            Some((name, s)) if s > score || (s == score && name <= cand.as_str()) => Some((name, s)),
            _ => Some((cand.as_str(), score)),
        };
    }
    best.map(|(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_blocks_are_counted_recursively() {
        let chars = |s: &str| s.chars().collect::<Vec<_>>();
        assert_eq!(longest_block(&chars("hihats"), &chars("hi-hat")), (2, 3, 3));
        assert_eq!(matching_chars(&chars("hihats"), &chars("hi-hat")), 5);
        assert_eq!(matching_chars(&chars("abc"), &chars("")), 0);
        assert_eq!(similarity("", ""), 1.0);
    }

    #[test]
    fn plural_is_close_enough() {
        assert!((similarity("kick", "kicks") - 8.0 / 9.0).abs() < 1e-9);
        assert!(similarity("snare", "bass") < FUZZY_CUTOFF);
    }

    #[test]
    fn separators_do_not_break_matching() {
        assert!((similarity("hihats", "hi-hat") - 10.0 / 12.0).abs() < 1e-9);
        let dirs = vec!["hi-hat".to_string()];
        assert_eq!(closest_match("hihats", &dirs, FUZZY_CUTOFF), Some("hi-hat"));
        let dirs = vec!["hi_hat".to_string()];
        assert_eq!(closest_match("hihat", &dirs, FUZZY_CUTOFF), Some("hi_hat"));
    }

    #[test]
    fn short_prefix_is_rejected() {
        assert!((similarity("percs", "percussion") - 10.0 / 15.0).abs() < 1e-9);
        let dirs = vec!["percussion".to_string()];
        assert_eq!(closest_match("percs", &dirs, FUZZY_CUTOFF), None);
    }

    #[test]
    fn closest_match_respects_cutoff() {
        let dirs = vec!["Snares".to_string(), "bass".to_string()];
        assert_eq!(closest_match("snare", &dirs, FUZZY_CUTOFF), Some("Snares"));
        assert_eq!(closest_match("guitar", &dirs, FUZZY_CUTOFF), None);
    }

    #[test]
    fn closest_match_prefers_higher_score_then_name() {
        let dirs = vec!["hihatz".to_string(), "hihats".to_string(), "hihat".to_string()];
        assert_eq!(closest_match("hihats", &dirs, FUZZY_CUTOFF), Some("hihats"));
        let ties = vec!["kickz".to_string(), "kicka".to_string()];
        assert_eq!(closest_match("kicks", &ties, FUZZY_CUTOFF), Some("kicka"));
    }
}
