use ammonia;

/// Clean user-supplied HTML using the ammonia library.
///
/// Whitelist-based: safe tags (like <b>, <p>) stay, dangerous tags (like
/// <script>, <iframe>) are removed along with event-handler attributes.
/// Applied to feed posts and contact descriptions before they are stored.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scripts() {
        let cleaned = clean_html("<p>Resolved!</p><script>alert(1)</script>");
        assert_eq!(cleaned, "<p>Resolved!</p>");
    }

    #[test]
    fn test_strips_event_handlers() {
        let cleaned = clean_html(r#"<b onclick="steal()">bold</b>"#);
        assert_eq!(cleaned, "<b>bold</b>");
    }
}
