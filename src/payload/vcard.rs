//! vCard 3.0 contact card formatting

use serde::{Deserialize, Serialize};

/// Contact details for a vCard payload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    /// Formatted name (`FN`)
    pub name: String,
    /// Telephone number (`TEL`)
    pub phone: String,
    /// Email address (`EMAIL`)
    pub email: String,
    /// Organization (`ORG`), omitted when empty
    pub organization: Option<String>,
    /// Job title (`TITLE`), omitted when empty
    pub title: Option<String>,
}

/// Format a contact as a vCard 3.0 text block.
///
/// Lines are separated by `\n` with no trailing newline. `ORG` and `TITLE`
/// are only emitted when present and non-empty. Values are escaped per the
/// vCard text rules.
pub fn format_contact(contact: &ContactInfo) -> String {
    let mut lines = vec![
        "BEGIN:VCARD".to_string(),
        "VERSION:3.0".to_string(),
        format!("FN:{}", escape_text(&contact.name)),
    ];

    if let Some(org) = non_empty(&contact.organization) {
        lines.push(format!("ORG:{}", escape_text(org)));
    }
    if let Some(title) = non_empty(&contact.title) {
        lines.push(format!("TITLE:{}", escape_text(title)));
    }

    lines.push(format!("TEL:{}", escape_text(&contact.phone)));
    lines.push(format!("EMAIL:{}", escape_text(&contact.email)));
    lines.push("END:VCARD".to_string());

    lines.join("\n")
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push_str("\\n");
            }
            '\n' => out.push_str("\\n"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn jane() -> ContactInfo {
        ContactInfo {
            name: "Jane Doe".to_string(),
            phone: "+15551234567".to_string(),
            email: "jane@x.com".to_string(),
            organization: None,
            title: None,
        }
    }

    #[test]
    fn test_minimal_contact_exact_output() {
        assert_eq!(
            format_contact(&jane()),
            "BEGIN:VCARD\nVERSION:3.0\nFN:Jane Doe\nTEL:+15551234567\nEMAIL:jane@x.com\nEND:VCARD"
        );
    }

    #[test]
    fn test_empty_optional_fields_are_omitted() {
        let contact = ContactInfo {
            organization: Some(String::new()),
            title: Some(String::new()),
            ..jane()
        };
        let card = format_contact(&contact);

        assert!(!card.contains("ORG:"));
        assert!(!card.contains("TITLE:"));
        assert_eq!(card.lines().filter(|l| l.starts_with("FN:")).count(), 1);
        assert_eq!(card.lines().filter(|l| l.starts_with("TEL:")).count(), 1);
        assert_eq!(card.lines().filter(|l| l.starts_with("EMAIL:")).count(), 1);
        assert!(card.contains("\nFN:Jane Doe\n"));
        assert!(card.contains("\nTEL:+15551234567\n"));
        assert!(card.contains("\nEMAIL:jane@x.com\n"));
    }

    #[test]
    fn test_full_contact_line_order() {
        let contact = ContactInfo {
            organization: Some("Acme".to_string()),
            title: Some("Engineer".to_string()),
            ..jane()
        };
        let card = format_contact(&contact);
        let lines: Vec<&str> = card.lines().collect();

        assert_eq!(
            lines,
            vec![
                "BEGIN:VCARD",
                "VERSION:3.0",
                "FN:Jane Doe",
                "ORG:Acme",
                "TITLE:Engineer",
                "TEL:+15551234567",
                "EMAIL:jane@x.com",
                "END:VCARD",
            ]
        );
    }

    #[test]
    fn test_special_characters_are_escaped() {
        let contact = ContactInfo {
            name: "Doe, Jane".to_string(),
            organization: Some("R&D; Labs\\East".to_string()),
            title: Some("Lead\nEngineer\r\nII".to_string()),
            ..jane()
        };
        let card = format_contact(&contact);

        assert!(card.contains("FN:Doe\\, Jane\n"));
        assert!(card.contains("ORG:R&D\\; Labs\\\\East\n"));
        assert!(card.contains("TITLE:Lead\\nEngineer\\nII\n"));
        assert_eq!(card.lines().count(), 8);
    }
}
