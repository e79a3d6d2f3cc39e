//! Utility functions shared by the bot crates.

/// Truncate a string to at most `max_chars` characters, appending "..." if truncated.
///
/// Works on character boundaries, so multi-byte UTF-8 input is safe.
pub fn truncate_with_ellipsis(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => {
            let truncated = &s[..idx];
            format!("{}...", truncated.trim_end())
        }
        None => s.to_string(),
    }
}

/// Mask a bot token for logging, keeping only the bot id prefix.
///
/// Telegram tokens look like `<bot id>:<secret>`; anything else is fully masked.
pub fn mask_token(token: &str) -> String {
    match token.split_once(':') {
        Some((id, _)) if !id.is_empty() => format!("{id}:***"),
        _ => "***".to_string(),
    }
}

/// Split a message into chunks of at most `max_chars` characters.
///
/// Prefers to break at paragraph, line, sentence and word boundaries.
pub fn split_message(message: &str, max_chars: usize) -> Vec<String> {
    if message.chars().count() <= max_chars {
        return vec![message.to_string()];
    }

    let mut chunks = Vec::new();
    let mut remaining = message;

    while !remaining.is_empty() {
        let limit = match remaining.char_indices().nth(max_chars) {
            Some((idx, _)) => idx,
            None => {
                chunks.push(remaining.to_string());
                break;
            }
        };

        let chunk = &remaining[..limit];
        let split_pos = chunk
            .rfind("\n\n")
            .or_else(|| chunk.rfind('\n'))
            .or_else(|| chunk.rfind(". ").map(|p| p + 1))
            .or_else(|| chunk.rfind(' '))
            .unwrap_or(limit);

        let actual_split = if split_pos == 0 { limit } else { split_pos };

        chunks.push(remaining[..actual_split].to_string());
        remaining = remaining[actual_split..].trim_start();
    }

    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_with_ellipsis() {
        assert_eq!(truncate_with_ellipsis("hello", 10), "hello");
        assert_eq!(truncate_with_ellipsis("hello world", 5), "hello...");
        assert_eq!(truncate_with_ellipsis("ωωωω", 2), "ωω...");
        assert_eq!(truncate_with_ellipsis("", 10), "");
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("123456:ABC-DEF"), "123456:***");
        assert_eq!(mask_token("no-colon"), "***");
        assert_eq!(mask_token(":secret"), "***");
    }

    #[test]
    fn test_split_message_short() {
        let result = split_message("Hello, World!", 4096);
        assert_eq!(result, vec!["Hello, World!".to_string()]);
    }

    #[test]
    fn test_split_message_long() {
        let msg = "x".repeat(5000);
        let result = split_message(&msg, 4096);
        assert_eq!(result.len(), 2);
        assert_eq!(result[0].len(), 4096);
        assert_eq!(result[1].len(), 904);
    }

    #[test]
    fn test_split_message_prefers_newline() {
        let msg = format!("{}\n{}", "a".repeat(6), "b".repeat(6));
        let result = split_message(&msg, 10);
        assert_eq!(result, vec!["aaaaaa".to_string(), "bbbbbb".to_string()]);
    }
}
