//! Display and AI preferences.
//!
//! Settings have no relational constraints. Any stored record may be
//! partial; missing keys take the defaults below.

use serde::{Deserialize, Serialize};

/// Background grid pattern drawn behind the editor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridPatternStyle {
    #[default]
    Dots,
    Lines,
    Squares,
}

/// Process-wide preferences for one store instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub ai_enabled: bool,
    pub ai_auto_accept: bool,
    pub ai_name: String,
    /// Theme key, e.g. `dark` or `blue`.
    pub theme: String,
    pub primary_color: String,
    pub grid_pattern_enabled: bool,
    pub grid_pattern_style: GridPatternStyle,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ai_enabled: true,
            ai_auto_accept: false,
            ai_name: "Memo".to_string(),
            theme: "dark".to_string(),
            primary_color: "#89B4FA".to_string(),
            grid_pattern_enabled: false,
            grid_pattern_style: GridPatternStyle::Dots,
        }
    }
}

/// Shallow partial override of [`Settings`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_auto_accept: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_pattern_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_pattern_style: Option<GridPatternStyle>,
}

impl SettingsPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `base` with every present key of this patch applied.
    pub fn merged_over(&self, base: &Settings) -> Settings {
        let mut merged = base.clone();
        if let Some(value) = self.ai_enabled {
            merged.ai_enabled = value;
        }
        if let Some(value) = self.ai_auto_accept {
            merged.ai_auto_accept = value;
        }
        if let Some(value) = &self.ai_name {
            merged.ai_name = value.clone();
        }
        if let Some(value) = &self.theme {
            merged.theme = value.clone();
        }
        if let Some(value) = &self.primary_color {
            merged.primary_color = value.clone();
        }
        if let Some(value) = self.grid_pattern_enabled {
            merged.grid_pattern_enabled = value;
        }
        if let Some(value) = self.grid_pattern_style {
            merged.grid_pattern_style = value;
        }
        merged
    }

    /// Human-readable log line for this change.
    ///
    /// Only one description is produced even when several keys change.
    /// Priority: theme, primary color, AI toggle, grid toggle.
    pub fn describe(&self) -> String {
        if let Some(theme) = &self.theme {
            return format!("Changed theme to {theme}");
        }
        if self.primary_color.is_some() {
            return "Changed primary color".to_string();
        }
        if let Some(enabled) = self.ai_enabled {
            return if enabled { "Enabled AI" } else { "Disabled AI" }.to_string();
        }
        if let Some(enabled) = self.grid_pattern_enabled {
            return if enabled {
                "Enabled grid pattern"
            } else {
                "Disabled grid pattern"
            }
            .to_string();
        }
        "Updated settings".to_string()
    }
}

impl From<&Settings> for SettingsPatch {
    fn from(value: &Settings) -> Self {
        Self {
            ai_enabled: Some(value.ai_enabled),
            ai_auto_accept: Some(value.ai_auto_accept),
            ai_name: Some(value.ai_name.clone()),
            theme: Some(value.theme.clone()),
            primary_color: Some(value.primary_color.clone()),
            grid_pattern_enabled: Some(value.grid_pattern_enabled),
            grid_pattern_style: Some(value.grid_pattern_style),
        }
    }
}

/// Display fields older stores kept at the record root instead of under
/// `settings`. Written next to the nested record; a non-empty root value
/// wins on read.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacySettingsFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_pattern_enabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_pattern_style: Option<GridPatternStyle>,
}

impl LegacySettingsFields {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            theme: Some(settings.theme.clone()),
            primary_color: Some(settings.primary_color.clone()),
            grid_pattern_enabled: Some(settings.grid_pattern_enabled),
            grid_pattern_style: Some(settings.grid_pattern_style),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the root values over `settings`. Blank strings are ignored.
    pub fn apply_over(&self, mut settings: Settings) -> Settings {
        if let Some(theme) = self.theme.as_ref().filter(|value| !value.is_empty()) {
            settings.theme = theme.clone();
        }
        if let Some(color) = self
            .primary_color
            .as_ref()
            .filter(|value| !value.is_empty())
        {
            settings.primary_color = color.clone();
        }
        if let Some(enabled) = self.grid_pattern_enabled {
            settings.grid_pattern_enabled = enabled;
        }
        if let Some(style) = self.grid_pattern_style {
            settings.grid_pattern_style = style;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::{GridPatternStyle, LegacySettingsFields, Settings, SettingsPatch};

    #[test]
    fn legacy_root_fields_win_unless_blank() {
        let legacy = LegacySettingsFields {
            theme: Some("blue".to_string()),
            primary_color: Some(String::new()),
            ..LegacySettingsFields::default()
        };
        let nested = Settings {
            primary_color: "#123456".to_string(),
            ..Settings::default()
        };
        let merged = legacy.apply_over(nested);
        assert_eq!(merged.theme, "blue");
        assert_eq!(merged.primary_color, "#123456");
    }

    #[test]
    fn partial_record_merges_over_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"theme":"blue"}"#).unwrap();
        assert_eq!(settings.theme, "blue");
        assert_eq!(settings.ai_name, "Memo");
        assert!(settings.ai_enabled);
    }

    #[test]
    fn describe_prefers_theme_over_color() {
        let patch = SettingsPatch {
            theme: Some("blue".to_string()),
            primary_color: Some("#fff".to_string()),
            ..SettingsPatch::default()
        };
        assert_eq!(patch.describe(), "Changed theme to blue");
    }

    #[test]
    fn describe_falls_back_for_unlisted_keys() {
        let patch = SettingsPatch {
            grid_pattern_style: Some(GridPatternStyle::Lines),
            ..SettingsPatch::default()
        };
        assert_eq!(patch.describe(), "Updated settings");
    }

    #[test]
    fn describe_reports_ai_before_grid() {
        let patch = SettingsPatch {
            ai_enabled: Some(false),
            grid_pattern_enabled: Some(true),
            ..SettingsPatch::default()
        };
        assert_eq!(patch.describe(), "Disabled AI");
    }
}
