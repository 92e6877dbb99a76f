/// One external input event fed into a flow machine.
#[derive(Debug, Clone)]
pub enum SessionInput {
    /// A plain text reply from the member.
    Text(String),
    /// An uploaded file.
    File { name: String, bytes: Vec<u8> },
    /// The current step's window elapsed with no reply.
    Timeout,
}

/// Listing preview length, in characters.
pub const PREVIEW_LEN: usize = 40;

/// First [`PREVIEW_LEN`] characters of a message body, ellipsized beyond.
///
/// Shown next to each index in the selection prompt so members can tell
/// their pending messages apart.
pub fn preview(content: &str) -> String {
    if content.chars().count() > PREVIEW_LEN {
        let cut: String = content.chars().take(PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        content.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_content_passes_through() {
        assert_eq!(preview("hello"), "hello");
    }

    #[test]
    fn long_content_is_cut_at_forty_chars() {
        let long = "a".repeat(50);
        let p = preview(&long);
        assert_eq!(p, format!("{}...", "a".repeat(40)));
    }

    #[test]
    fn multibyte_content_is_cut_on_char_boundaries() {
        let long = "ü".repeat(50);
        assert_eq!(preview(&long), format!("{}...", "ü".repeat(40)));
    }
}
