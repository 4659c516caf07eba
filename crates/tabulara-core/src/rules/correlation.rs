//! Order-independent duplicate pairing keys

/// Keys identifying an unordered pair of documents in a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairKeys {
    pub left: String,
    pub right: String,
    /// `left::right`
    pub pair_key: String,
    /// `session_id:left:right`
    pub deterministic_key: String,
}

/// Derive pairing keys; swapping `a` and `b` yields identical keys
pub fn correlate(session_id: &str, a: &str, b: &str) -> PairKeys {
    let (left, right) = if a <= b { (a, b) } else { (b, a) };
    PairKeys {
        left: left.to_string(),
        right: right.to_string(),
        pair_key: format!("{}::{}", left, right),
        deterministic_key: format!("{}:{}:{}", session_id, left, right),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_sort_lexicographically() {
        let keys = correlate("s1", "s1:b2", "s1:b1");
        assert_eq!(keys.left, "s1:b1");
        assert_eq!(keys.pair_key, "s1:b1::s1:b2");
        assert_eq!(keys.deterministic_key, "s1:s1:b1:s1:b2");
    }

    #[test]
    fn test_swapped_arguments_collide() {
        assert_eq!(correlate("s", "x", "y"), correlate("s", "y", "x"));
    }
}
