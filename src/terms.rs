//! Known academic term codes.
//!
//! Term codes are fixed-width numeric strings assigned by the registrar.
//! Codes ending in 2 are fall terms and codes ending in 4 are spring terms;
//! e.g. `1262` is fall 2025 and `1254` is spring 2025. The pattern has held
//! for decades, but verify a new code against the listings API before
//! appending it here.

/// Every term the listings API knows about, newest first.
pub const TERMS: &[&str] = &[
    "1262", "1254", "1252", "1244", "1242", "1234", "1232", "1224", "1222",
    "1214", "1212", "1204", "1202", "1194", "1192", "1184", "1182", "1174",
];

/// Terms whose evaluation results have not been published yet.
const EVALS_PENDING: &[&str] = &["1262", "1254"];

/// Terms with evaluation results available on the evaluation site.
pub fn eval_terms() -> Vec<&'static str> {
    TERMS
        .iter()
        .copied()
        .filter(|t| !EVALS_PENDING.contains(t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eval_terms_excludes_pending() {
        let terms = eval_terms();
        assert!(!terms.contains(&"1262"));
        assert!(!terms.contains(&"1254"));
        assert_eq!(terms.len(), TERMS.len() - 2);
    }

    #[test]
    fn test_eval_terms_preserves_order() {
        let terms = eval_terms();
        assert_eq!(terms.first(), Some(&"1252"));
        assert_eq!(terms.last(), Some(&"1174"));
    }
}
