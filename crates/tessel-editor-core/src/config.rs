//! Editor configuration.
//!
//! Every knob has a default, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! [drag]
//! throttle_ms = 32.0
//!
//! [triggers.emoji]
//! min_query = 3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Embed kinds that occupy a whole line. Everything else embeds inline.
    pub block_embeds: Vec<SmolStr>,
    pub authorship: AuthorshipConfig,
    pub drag: DragConfig,
    pub selection: SelectionConfig,
    pub triggers: TriggersConfig,
    pub layout: LayoutConfig,
    pub file_drop: FileDropConfig,
    pub reflow: ReflowConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            block_embeds: ["image", "video", "link", "file", "divider"]
                .into_iter()
                .map(SmolStr::new_static)
                .collect(),
            authorship: AuthorshipConfig::default(),
            drag: DragConfig::default(),
            selection: SelectionConfig::default(),
            triggers: TriggersConfig::default(),
            layout: LayoutConfig::default(),
            file_drop: FileDropConfig::default(),
            reflow: ReflowConfig::default(),
        }
    }
}

impl EditorConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&source)
    }

    pub fn is_block_embed(&self, kind: &str) -> bool {
        self.block_embeds.iter().any(|k| k == kind)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for trigger in [&self.triggers.mention, &self.triggers.emoji] {
            if trigger.window <= trigger.max_query {
                return Err(ConfigError::TriggerWindow {
                    trigger: trigger.trigger,
                    window: trigger.window,
                    max_query: trigger.max_query,
                });
            }
        }
        Ok(())
    }
}

/// Author-label recomputation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorshipConfig {
    /// Quiet period after the last local edit before labels are recomputed.
    pub debounce_ms: f64,
    /// Block type names that never get a label.
    pub exempt_block_types: Vec<SmolStr>,
    /// Embed services whose blocks neither count nor get a label.
    pub omitted_services: Vec<SmolStr>,
    /// Label offset for headings, indexed by level minus one.
    pub heading_offsets: Vec<f64>,
    /// Label offset for every other block.
    pub body_offset: f64,
}

impl Default for AuthorshipConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100.0,
            exempt_block_types: vec![SmolStr::new_static("divider")],
            omitted_services: ["figma", "loom", "airtable", "miro"]
                .into_iter()
                .map(SmolStr::new_static)
                .collect(),
            heading_offsets: vec![10.0, 7.0, 5.0, 3.0, 3.0, 3.0],
            body_offset: 2.0,
        }
    }
}

impl AuthorshipConfig {
    pub fn heading_offset(&self, level: u8) -> f64 {
        usize::from(level)
            .checked_sub(1)
            .and_then(|i| self.heading_offsets.get(i))
            .copied()
            .unwrap_or(self.body_offset)
    }
}

/// Drag and drop of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Minimum spacing between drag-over evaluations.
    pub throttle_ms: f64,
    /// Height of the fixed navigation bar covering the top of the viewport.
    pub navbar_height: f64,
    /// Opacity applied to nodes being dragged.
    pub dragging_opacity: f32,
    /// How long the vacated follower keeps its margin before it resets.
    pub animation_ms: f64,
    /// Pointer travel (px) below which the drop is not animated.
    pub animation_min_delta: f64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            throttle_ms: 20.0,
            navbar_height: 56.0,
            dragging_opacity: 0.4,
            animation_ms: 250.0,
            animation_min_delta: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// How long the mouse must be held before native selection changes are
    /// treated as a drag-selection.
    pub mouse_down_delay_ms: f64,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self {
            mouse_down_delay_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawTriggers")]
pub struct TriggersConfig {
    pub mention: TriggerConfig,
    pub emoji: TriggerConfig,
}

impl Default for TriggersConfig {
    fn default() -> Self {
        Self {
            mention: TriggerConfig::mention(),
            emoji: TriggerConfig::emoji(),
        }
    }
}

/// One trigger-character tracker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerConfig {
    pub trigger: char,
    /// How far back from the cursor to look for the trigger.
    pub window: usize,
    /// Query length needed before the picker opens.
    pub min_query: usize,
    pub max_query: usize,
    /// Block type names in which the tracker stays inert.
    pub excluded_block_types: Vec<SmolStr>,
}

impl TriggerConfig {
    pub fn mention() -> Self {
        Self {
            trigger: '@',
            window: 32,
            min_query: 0,
            max_query: 30,
            excluded_block_types: vec![SmolStr::new_static("code-block")],
        }
    }

    pub fn emoji() -> Self {
        Self {
            trigger: ':',
            window: 24,
            min_query: 2,
            max_query: 20,
            excluded_block_types: vec![SmolStr::new_static("code-block")],
        }
    }
}

// Each trigger has its own defaults, so a partial `[triggers.emoji]` table
// must be layered over the emoji defaults rather than a shared `Default`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTriggers {
    mention: TriggerOverrides,
    emoji: TriggerOverrides,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TriggerOverrides {
    trigger: Option<char>,
    window: Option<usize>,
    min_query: Option<usize>,
    max_query: Option<usize>,
    excluded_block_types: Option<Vec<SmolStr>>,
}

impl TriggerOverrides {
    fn over(self, base: TriggerConfig) -> TriggerConfig {
        TriggerConfig {
            trigger: self.trigger.unwrap_or(base.trigger),
            window: self.window.unwrap_or(base.window),
            min_query: self.min_query.unwrap_or(base.min_query),
            max_query: self.max_query.unwrap_or(base.max_query),
            excluded_block_types: self
                .excluded_block_types
                .unwrap_or(base.excluded_block_types),
        }
    }
}

impl From<RawTriggers> for TriggersConfig {
    fn from(raw: RawTriggers) -> Self {
        Self {
            mention: raw.mention.over(TriggerConfig::mention()),
            emoji: raw.emoji.over(TriggerConfig::emoji()),
        }
    }
}

/// Geometry used to lay out the headless block tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub line_height: f64,
    pub code_line_height: f64,
    /// Line height per heading level, indexed by level minus one.
    pub heading_heights: Vec<f64>,
    pub embed_height: f64,
    pub divider_height: f64,
    pub char_width: f64,
    pub content_width: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            line_height: 24.0,
            code_line_height: 20.0,
            heading_heights: vec![44.0, 36.0, 30.0, 26.0, 24.0, 24.0],
            embed_height: 320.0,
            divider_height: 24.0,
            char_width: 8.0,
            content_width: 720.0,
        }
    }
}

impl LayoutConfig {
    pub fn heading_height(&self, level: u8) -> f64 {
        usize::from(level)
            .checked_sub(1)
            .and_then(|i| self.heading_heights.get(i))
            .copied()
            .unwrap_or(self.line_height)
    }

    /// Chars that fit on one visual row.
    pub fn chars_per_row(&self) -> usize {
        if self.char_width <= 0.0 {
            return usize::MAX;
        }
        ((self.content_width / self.char_width).floor() as usize).max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDropConfig {
    /// A file drag is considered over when no drag-enter follows a
    /// drag-leave within this window.
    pub end_timeout_ms: f64,
}

impl Default for FileDropConfig {
    fn default() -> Self {
        Self {
            end_timeout_ms: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReflowConfig {
    pub debounce_ms: f64,
}

impl Default for ReflowConfig {
    fn default() -> Self {
        Self { debounce_ms: 150.0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EditorConfig::from_toml_str(
            r#"
            block_embeds = ["image", "divider"]

            [drag]
            throttle_ms = 32.0

            [triggers.emoji]
            min_query = 3
            "#,
        )
        .expect("valid config");

        assert_eq!(config.drag.throttle_ms, 32.0);
        assert_eq!(config.drag.navbar_height, DragConfig::default().navbar_height);
        assert_eq!(config.triggers.emoji.min_query, 3);
        assert_eq!(config.triggers.emoji.trigger, ':');
        assert_eq!(config.triggers.emoji.max_query, TriggerConfig::emoji().max_query);
        assert_eq!(config.triggers.mention, TriggerConfig::mention());
        assert!(config.is_block_embed("divider"));
        assert!(!config.is_block_embed("video"));
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = EditorConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.triggers.emoji.trigger, ':');
    }

    #[test]
    fn test_rejects_bad_toml() {
        let err = EditorConfig::from_toml_str("[drag]\nthrottle_ms = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));

        let err = EditorConfig::from_toml_str("[triggers.mention]\nwindow = 4\nmax_query = 10")
            .unwrap_err();
        assert!(matches!(err, ConfigError::TriggerWindow { window: 4, .. }));
    }

    #[test]
    fn test_offsets_fall_back_to_body() {
        let authorship = AuthorshipConfig::default();
        assert_eq!(authorship.heading_offset(1), 10.0);
        assert_eq!(authorship.heading_offset(9), authorship.body_offset);
        assert_eq!(LayoutConfig::default().heading_height(0), 24.0);
    }
}
