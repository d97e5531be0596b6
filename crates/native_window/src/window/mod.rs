//! Window management
//!
//! # Module Organization
//!
//! - **`handle`**: the [`Window`] type and its creation protocol
//! - **`options`**: [`CreateOptions`], the configuration consumed at creation
//! - **`style`**: the [`WindowStyle`] bitmask derived from those options
//!
//! # Creation protocol
//!
//! 1. Encode the title for the window system
//! 2. Count the window on its event loop (rolled back if creation fails)
//! 3. Register a uniquely named class whose procedure is the loop's bridge
//! 4. Create the handle, passing the loop as the creation parameter
//! 5. Apply the theme, best effort

pub mod handle;
pub mod options;
pub mod style;

pub use handle::{Window, WindowError, WindowResult};
pub use options::{CreateOptions, ShowState, Theme, DEFAULT_TITLE};
pub use style::WindowStyle;
