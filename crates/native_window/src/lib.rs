//! # Native Window
//!
//! Native top-level windows bound to a single-threaded event loop.
//!
//! ## Features
//!
//! - **Window lifecycle**: uniquely named classes, creation, show-state control
//! - **Event loop**: live window accounting; the pump ends when the last window closes
//! - **Message bridge**: raw window-system messages become a small closed set of events
//! - **Backends**: Win32 on Windows, an in-process window system everywhere
//! - **Configuration**: creation options from TOML or RON files
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use native_window::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let event_loop = EventLoop::native()?;
//!
//!     event_loop.set_handler(|event, target| match event {
//!         Event::Close => target.exit(),
//!         _ => {}
//!     });
//!
//!     let _window = Window::create(&event_loop, &CreateOptions::new("Hello"))?;
//!     event_loop.run()?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod bridge;
pub mod config;
pub mod event_loop;
pub mod events;
pub mod foundation;
pub mod platform;
pub mod window;

pub use event_loop::{EventLoop, EventLoopError, PumpStatus};
pub use events::{ActionTarget, Event};
pub use window::{CreateOptions, ShowState, Theme, Window, WindowError};

/// Common imports for crate users
pub mod prelude {
    pub use crate::{
        ActionTarget, CreateOptions, Event, EventLoop, EventLoopError, PumpStatus, ShowState,
        Theme, Window, WindowError,
        config::{Config, ConfigError},
        platform::{HeadlessSystem, NativeHandle, WindowSystem},
    };
}
