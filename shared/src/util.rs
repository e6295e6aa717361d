/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Normalize a restaurant slug taken from a URL path segment.
///
/// Slugs are compared case-insensitively and never carry surrounding
/// slashes or whitespace.
pub fn normalize_slug(raw: &str) -> String {
    raw.trim().trim_matches('/').to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_slug() {
        assert_eq!(normalize_slug("/Spice-House/"), "spice-house");
        assert_eq!(normalize_slug("  cafe "), "cafe");
        assert_eq!(normalize_slug(""), "");
    }
}
