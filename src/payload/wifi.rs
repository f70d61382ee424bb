//! WiFi network credential payloads (`WIFI:T:..;S:..;P:..;;`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Network authentication mode advertised in the payload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WifiEncryption {
    /// WPA/WPA2/WPA3 personal
    #[default]
    #[serde(rename = "WPA", alias = "wpa")]
    Wpa,
    /// Legacy WEP
    #[serde(rename = "WEP", alias = "wep")]
    Wep,
    /// Open network
    #[serde(rename = "nopass", alias = "none")]
    NoPass,
}

impl WifiEncryption {
    /// Token used in the `T:` field
    pub fn as_str(&self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

impl fmt::Display for WifiEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WifiEncryption {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "wpa" | "wpa2" | "wpa3" => Ok(Self::Wpa),
            "wep" => Ok(Self::Wep),
            "nopass" | "none" | "open" => Ok(Self::NoPass),
            other => Err(format!(
                "Unknown encryption '{other}', expected wpa, wep or nopass"
            )),
        }
    }
}

/// Credentials for joining a WiFi network
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WifiCredential {
    /// Network name
    pub ssid: String,
    /// Network password (ignored by readers for open networks)
    pub password: String,
    /// Authentication mode
    pub encryption: WifiEncryption,
    /// Whether the network does not broadcast its SSID
    pub hidden: bool,
}

/// Format WiFi credentials as a `WIFI:` payload string.
pub fn format_wifi(wifi: &WifiCredential) -> String {
    let hidden = if wifi.hidden { "H:true;" } else { "" };
    format!(
        "WIFI:T:{};S:{};P:{};{};",
        wifi.encryption,
        escape_field(&wifi.ssid),
        escape_field(&wifi.password),
        hidden
    )
}

fn escape_field(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential(ssid: &str, password: &str, encryption: WifiEncryption) -> WifiCredential {
        WifiCredential {
            ssid: ssid.to_string(),
            password: password.to_string(),
            encryption,
            hidden: false,
        }
    }

    #[test]
    fn test_wpa_exact_output() {
        let wifi = credential("Home", "secret1", WifiEncryption::Wpa);
        assert_eq!(format_wifi(&wifi), "WIFI:T:WPA;S:Home;P:secret1;;");
    }

    #[test]
    fn test_encryption_tokens() {
        for (encryption, token) in [
            (WifiEncryption::Wpa, "WPA"),
            (WifiEncryption::Wep, "WEP"),
            (WifiEncryption::NoPass, "nopass"),
        ] {
            let wifi = credential("Cafe", "pw", encryption);
            assert_eq!(format_wifi(&wifi), format!("WIFI:T:{token};S:Cafe;P:pw;;"));
        }
    }

    #[test]
    fn test_reserved_characters_are_escaped() {
        let wifi = credential("My;Net,work", "a:b\\c\"d", WifiEncryption::Wpa);
        assert_eq!(
            format_wifi(&wifi),
            "WIFI:T:WPA;S:My\\;Net\\,work;P:a\\:b\\\\c\\\"d;;"
        );
    }

    #[test]
    fn test_hidden_network_flag() {
        let wifi = WifiCredential {
            hidden: true,
            ..credential("Attic", "pw", WifiEncryption::Wep)
        };
        assert_eq!(format_wifi(&wifi), "WIFI:T:WEP;S:Attic;P:pw;H:true;;");
    }

    #[test]
    fn test_encryption_from_str() {
        assert_eq!("WPA2".parse::<WifiEncryption>(), Ok(WifiEncryption::Wpa));
        assert_eq!("open".parse::<WifiEncryption>(), Ok(WifiEncryption::NoPass));
        assert!("psk".parse::<WifiEncryption>().is_err());
    }
}
