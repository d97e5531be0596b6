//! Window style bitmask

use bitflags::bitflags;

use super::options::{CreateOptions, ShowState};

bitflags! {
    /// Top-level window style bits
    ///
    /// Values match the Win32 `WS_*` constants so the native backend can pass
    /// them through unchanged.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WindowStyle: u32 {
        /// Maximize button in the title bar
        const MAXIMIZEBOX = 0x0001_0000;
        /// Minimize button in the title bar
        const MINIMIZEBOX = 0x0002_0000;
        /// Sizing border
        const THICKFRAME = 0x0004_0000;
        /// Window menu in the title bar
        const SYSMENU = 0x0008_0000;
        /// Title bar (includes the thin border)
        const CAPTION = 0x00C0_0000;
        /// Initially maximized
        const MAXIMIZE = 0x0100_0000;
        /// Initially visible
        const VISIBLE = 0x1000_0000;
        /// Initially minimized
        const MINIMIZE = 0x2000_0000;
        /// Borderless pop-up window
        const POPUP = 0x8000_0000;
    }
}

impl WindowStyle {
    /// Chrome every decorated window gets regardless of options
    pub const CHROME: Self = Self::CAPTION
        .union(Self::SYSMENU)
        .union(Self::MINIMIZEBOX)
        .union(Self::MAXIMIZEBOX);

    /// Compute the creation style for `options`
    ///
    /// The sizing border follows `resizable` in every state. Fullscreen
    /// windows drop the decorated chrome in favour of a pop-up.
    pub fn from_options(options: &CreateOptions) -> Self {
        let mut style = match options.state {
            ShowState::Fullscreen => Self::POPUP,
            ShowState::Maximize => Self::CHROME | Self::MAXIMIZE,
            ShowState::Minimize => Self::CHROME | Self::MINIMIZE,
            ShowState::Restore => Self::CHROME,
        };
        style.set(Self::THICKFRAME, options.resizable);
        style | Self::VISIBLE
    }
}
