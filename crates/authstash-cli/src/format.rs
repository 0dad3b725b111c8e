/// Number of trailing characters left visible when masking a token
const VISIBLE_TOKEN_CHARS: usize = 4;

/// Mask a token for display, keeping only its last few characters
pub fn mask_token(token: &str) -> String {
    let len = token.chars().count();
    if len <= VISIBLE_TOKEN_CHARS * 2 {
        // Too short to reveal any of it
        return "*".repeat(len.max(1));
    }
    let tail: String = token.chars().skip(len - VISIBLE_TOKEN_CHARS).collect();
    format!("{}{}", "*".repeat(len - VISIBLE_TOKEN_CHARS), tail)
}

/// Format an optional token, masked unless `reveal` is set
pub fn format_token(token: Option<&str>, reveal: bool) -> String {
    match token {
        Some(t) if reveal => t.to_string(),
        Some(t) => mask_token(t),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("abcdefghijkl"), "********ijkl");
        assert_eq!(mask_token("short"), "*****");
        assert_eq!(mask_token(""), "*");
    }

    #[test]
    fn test_format_token() {
        assert_eq!(format_token(Some("abcdefghijkl"), true), "abcdefghijkl");
        assert_eq!(format_token(Some("abcdefghijkl"), false), "********ijkl");
        assert_eq!(format_token(None, false), "-");
    }
}
