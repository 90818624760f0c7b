use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl FromStr for Theme {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(ValidationError::invalid(
                "theme",
                format!("'{other}' is not one of light, dark, system"),
            )),
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::System => "system",
        })
    }
}

/// User settings stored under the `settings` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub username: String,
    pub theme: Theme,
    pub gemini_api_key: String,
    pub default_timezone: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: "User".to_string(),
            theme: Theme::System,
            gemini_api_key: String::new(),
            default_timezone: system_timezone(),
        }
    }
}

impl Settings {
    /// Default zone resolved to a `Tz`, falling back to UTC when the stored
    /// identifier is unknown.
    pub fn timezone(&self) -> chrono_tz::Tz {
        super::parse_zone(&self.default_timezone).unwrap_or(chrono_tz::Tz::UTC)
    }

    /// Greeting for the dashboard header, by local hour.
    pub fn greeting(hour: u32) -> &'static str {
        if hour < 12 {
            "Good Morning"
        } else if hour < 18 {
            "Good Afternoon"
        } else {
            "Good Evening"
        }
    }
}

/// `$TZ` when it names a known zone, otherwise `UTC`.
pub fn system_timezone() -> String {
    std::env::var("TZ")
        .ok()
        .and_then(|tz| super::parse_zone(tz.trim_start_matches(':')))
        .map_or_else(|| "UTC".to_string(), |tz| tz.name().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_fill_defaults() {
        let parsed: Settings = serde_json::from_str(r#"{"username":"Ada"}"#).unwrap();
        assert_eq!(parsed.username, "Ada");
        assert_eq!(parsed.theme, Theme::System);
        assert!(parsed.gemini_api_key.is_empty());
    }

    #[test]
    fn unknown_zone_falls_back_to_utc() {
        let settings = Settings {
            default_timezone: "Mars/Olympus".into(),
            ..Settings::default()
        };
        assert_eq!(settings.timezone(), chrono_tz::Tz::UTC);
    }

    #[test]
    fn lowercase_zone_resolves() {
        let settings = Settings {
            default_timezone: "asia/tokyo".into(),
            ..Settings::default()
        };
        assert_eq!(settings.timezone(), chrono_tz::Tz::Asia__Tokyo);
    }

    #[test]
    fn theme_round_trips_as_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        assert_eq!("Light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn greeting_by_hour() {
        assert_eq!(Settings::greeting(7), "Good Morning");
        assert_eq!(Settings::greeting(12), "Good Afternoon");
        assert_eq!(Settings::greeting(18), "Good Evening");
    }
}
