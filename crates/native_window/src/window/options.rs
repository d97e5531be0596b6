//! Window creation options

use serde::{Deserialize, Serialize};

use crate::config::Config;

/// Title used when none is configured
pub const DEFAULT_TITLE: &str = "Window";

/// Initial show state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowState {
    /// Start maximized
    Maximize,
    /// Start minimized
    Minimize,
    /// Start at normal size
    #[default]
    Restore,
    /// Cover the primary screen without decorations
    Fullscreen,
}

/// Chrome theme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Dark title bar and borders
    Dark,
    /// Light title bar and borders
    Light,
    /// Follow the system; requests dark chrome, which the OS ignores when the
    /// system theme is light
    #[default]
    Auto,
}

impl Theme {
    /// Whether this theme asks for dark chrome
    pub const fn wants_dark(self) -> bool {
        matches!(self, Self::Dark | Self::Auto)
    }
}

/// Immutable configuration consumed once by [`Window::create`](super::Window::create)
///
/// Position and size fields left as `None` are chosen by the window system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateOptions {
    /// Title bar text
    pub title: String,
    /// Left edge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    /// Top edge
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    /// Outer width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    /// Outer height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    /// Initial show state
    pub state: ShowState,
    /// Whether the user can resize the window
    pub resizable: bool,
    /// Chrome theme
    pub theme: Theme,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            x: None,
            y: None,
            width: None,
            height: None,
            state: ShowState::Restore,
            resizable: true,
            theme: Theme::Auto,
        }
    }
}

impl Config for CreateOptions {}

impl CreateOptions {
    /// Options with the given title and defaults everywhere else
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Set the title
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the initial position
    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Set the initial size
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    /// Set the initial show state
    pub fn with_state(mut self, state: ShowState) -> Self {
        self.state = state;
        self
    }

    /// Set whether the window is resizable
    pub fn with_resizable(mut self, resizable: bool) -> Self {
        self.resizable = resizable;
        self
    }

    /// Set the chrome theme
    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }
}
