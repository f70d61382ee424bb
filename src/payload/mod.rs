//! Payload formatting
//!
//! Converts structured user input into the plain-text payloads that QR
//! readers understand: vCard 3.0 contact cards and `WIFI:` credential strings.
//! URL and free-text payloads pass through unchanged.

mod vcard;
mod wifi;

pub use vcard::{ContactInfo, format_contact};
pub use wifi::{WifiCredential, WifiEncryption, format_wifi};

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of data a QR code carries, together with its fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum QrContent {
    /// A URL, encoded verbatim
    Url {
        /// Target address
        url: String,
    },
    /// Free-form text, encoded verbatim
    Text {
        /// Text content
        text: String,
    },
    /// A contact card, encoded as vCard 3.0
    Contact(ContactInfo),
    /// WiFi network credentials
    Wifi(WifiCredential),
}

impl QrContent {
    /// Produce the text payload handed to the QR encoder.
    ///
    /// An empty string means there is nothing to render yet.
    pub fn to_payload(&self) -> String {
        match self {
            QrContent::Url { url } => url.clone(),
            QrContent::Text { text } => text.clone(),
            QrContent::Contact(contact) => format_contact(contact),
            QrContent::Wifi(wifi) => format_wifi(wifi),
        }
    }

    /// Short label for logs, reports and metrics
    pub fn kind(&self) -> ContentKind {
        match self {
            QrContent::Url { .. } => ContentKind::Url,
            QrContent::Text { .. } => ContentKind::Text,
            QrContent::Contact(_) => ContentKind::Contact,
            QrContent::Wifi(_) => ContentKind::Wifi,
        }
    }
}

/// Discriminant of [`QrContent`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// URL payload
    Url,
    /// Free text payload
    Text,
    /// vCard payload
    Contact,
    /// WiFi payload
    Wifi,
}

impl ContentKind {
    /// Lowercase label used in reports and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Url => "url",
            ContentKind::Text => "text",
            ContentKind::Contact => "contact",
            ContentKind::Wifi => "wifi",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_and_text_pass_through() {
        let url = QrContent::Url {
            url: "https://example.com/a?b=c;d".to_string(),
        };
        assert_eq!(url.to_payload(), "https://example.com/a?b=c;d");

        let text = QrContent::Text {
            text: "line one\nline two".to_string(),
        };
        assert_eq!(text.to_payload(), "line one\nline two");
    }

    #[test]
    fn test_empty_url_yields_empty_payload() {
        let url = QrContent::Url { url: String::new() };
        assert!(url.to_payload().is_empty());
    }

    #[test]
    fn test_content_deserializes_from_tagged_toml() {
        let content: QrContent = toml::from_str(
            r#"
            type = "wifi"
            ssid = "Home"
            password = "secret1"
            encryption = "WPA"
            "#,
        )
        .unwrap();

        assert_eq!(content.kind(), ContentKind::Wifi);
        assert_eq!(content.to_payload(), "WIFI:T:WPA;S:Home;P:secret1;;");
    }
}
