//! TwiML reply documents for the messaging webhook

pub const CONTENT_TYPE: &str = "application/xml";

const HEADER: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// `<Response><Message>text</Message></Response>`, or an empty
/// `<Response></Response>` when there is nothing to send back
pub fn message_response(text: Option<&str>) -> String {
    match text {
        Some(text) => format!(
            "{}<Response><Message>{}</Message></Response>",
            HEADER,
            escape(text)
        ),
        None => format!("{}<Response></Response>", HEADER),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_document() {
        let doc = message_response(Some("مرحباً! 👋"));
        assert!(doc.starts_with("<?xml"));
        assert!(doc.ends_with("<Response><Message>مرحباً! 👋</Message></Response>"));
    }

    #[test]
    fn test_escaping() {
        let doc = message_response(Some("a < b & \"c\""));
        assert!(doc.contains("<Message>a &lt; b &amp; &quot;c&quot;</Message>"));
    }

    #[test]
    fn test_empty_response() {
        assert!(message_response(None).ends_with("<Response></Response>"));
    }
}
