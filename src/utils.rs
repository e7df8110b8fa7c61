/// Compare the header token with the configured one without short-circuiting
/// on the first differing byte. An empty expected token matches nothing.
pub fn verify_token(expected: &str, received: &[u8]) -> bool {
    let expected = expected.as_bytes();
    if expected.is_empty() || expected.len() != received.len() {
        return false;
    }
    expected
        .iter()
        .zip(received)
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_token() {
        assert!(verify_token("abc123", b"abc123"));
        assert!(!verify_token("abc123", b"wrong"));
        assert!(!verify_token("abc123", b"abc124"));
        assert!(!verify_token("abc123", b"abc1234"));
        assert!(!verify_token("abc123", b""));
    }

    #[test]
    fn empty_token_never_verifies() {
        assert!(!verify_token("", b""));
        assert!(!verify_token("", b"abc123"));
    }
}
