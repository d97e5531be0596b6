//! Native top-level window
//!
//! A [`Window`] owns its title and class name (in both encodings) and records
//! the native handle it was given. It does not own the handle's lifetime:
//! the window system destroys handles through the message bridge or an
//! [`ActionTarget`](crate::ActionTarget), and dropping a `Window` only
//! releases the memory it owns. The two steps can happen in either order.

use std::rc::{Rc, Weak};

use raw_window_handle::RawWindowHandle;
use thiserror::Error;

use super::options::{CreateOptions, ShowState};
use super::style::WindowStyle;
use crate::event_loop::EventLoop;
use crate::foundation::text::{EncodingError, NativeText};
use crate::foundation::token;
use crate::platform::{
    Background, CreateParam, Message, NativeHandle, PlatformError, ShowCommand, WindowClass,
    WindowDescriptor, WindowProcedure, WindowSystem,
};

/// Window creation errors
#[derive(Error, Debug)]
pub enum WindowError {
    /// Title or class name cannot be represented for the window system
    #[error("Invalid window text: {0}")]
    Encoding(EncodingError),

    /// An allocation failed
    #[error("Out of memory while creating window")]
    OutOfMemory,

    /// The window system rejected the class
    #[error("Window class registration failed: {0}")]
    ClassRegistration(PlatformError),

    /// The window system returned no handle
    #[error("Native window creation failed")]
    HandleCreation,
}

impl From<EncodingError> for WindowError {
    fn from(err: EncodingError) -> Self {
        match err {
            EncodingError::OutOfMemory => Self::OutOfMemory,
            other => Self::Encoding(other),
        }
    }
}

/// Result alias for window operations
pub type WindowResult<T> = Result<T, WindowError>;

/// A native top-level window bound to an [`EventLoop`]
pub struct Window {
    title: NativeText,
    class: NativeText,
    handle: Option<NativeHandle>,
    event_loop: Weak<EventLoop>,
}

impl Window {
    /// Create and show a window bound to `event_loop`
    ///
    /// On success the loop's live window count has grown by one. On failure
    /// it is unchanged and nothing is left alive.
    pub fn create(event_loop: &Rc<EventLoop>, options: &CreateOptions) -> WindowResult<Self> {
        let title = NativeText::new(&options.title)?;

        // Counted before registration: the creation is in flight from here on
        let reservation = event_loop.reserve_window();

        let class = NativeText::new(&token::class_name(token::CLASS_PREFIX))?;
        let system = event_loop.system();

        let procedure: Rc<dyn WindowProcedure> = Rc::clone(event_loop.bridge()) as Rc<dyn WindowProcedure>;
        system
            .register_class(&WindowClass {
                name: &class,
                background: Background::Window,
                procedure,
            })
            .map_err(WindowError::ClassRegistration)?;

        let style = WindowStyle::from_options(options);
        let descriptor = placement(system, &class, &title, style, options);

        let Some(handle) = system.create_window(&descriptor, Some(CreateParam::new(event_loop))) else {
            system.unregister_class(&class);
            return Err(WindowError::HandleCreation);
        };

        apply_theme(system, handle, options.theme.wants_dark());

        reservation.commit();
        log::info!("Created window {} \"{}\" ({})", handle, title, class);

        Ok(Self {
            title,
            class,
            handle: Some(handle),
            event_loop: Rc::downgrade(event_loop),
        })
    }

    /// Native handle, `None` if the window was never created
    pub fn handle(&self) -> Option<NativeHandle> {
        self.handle
    }

    /// Title text
    pub fn title(&self) -> &NativeText {
        &self.title
    }

    /// Registered class name
    pub fn class_name(&self) -> &NativeText {
        &self.class
    }

    /// The event loop this window was created on, if it still exists
    pub fn event_loop(&self) -> Option<Rc<EventLoop>> {
        self.event_loop.upgrade()
    }

    /// Whether the native window still exists
    pub fn is_alive(&self) -> bool {
        match (self.handle, self.event_loop.upgrade()) {
            (Some(handle), Some(event_loop)) => event_loop.system().is_window(handle),
            _ => false,
        }
    }

    /// Minimize the window
    pub fn minimize(&self) {
        self.show(ShowCommand::Minimize);
    }

    /// Maximize the window
    pub fn maximize(&self) {
        self.show(ShowCommand::Maximize);
    }

    /// Restore the window to its normal size
    pub fn restore(&self) {
        self.show(ShowCommand::Restore);
    }

    /// Ask the window to close
    ///
    /// Queues a close request exactly like the user clicking the close
    /// button; it is handled when the event loop next pumps messages.
    pub fn request_close(&self) -> Result<(), PlatformError> {
        let handle = self
            .handle
            .ok_or(PlatformError::MessagePost("window has no handle".to_string()))?;
        let event_loop = self
            .event_loop
            .upgrade()
            .ok_or(PlatformError::MessagePost("event loop is gone".to_string()))?;
        event_loop.system().post_message(handle, Message::Close)
    }

    /// Raw handle for rendering surface creation
    pub fn raw_window_handle(&self) -> Option<RawWindowHandle> {
        let handle = self.handle?;
        self.event_loop.upgrade()?.system().raw_window_handle(handle)
    }

    /// Release the window's memory
    ///
    /// Equivalent to dropping it. The native handle is left alone.
    pub fn deinit(self) {
        log::trace!("Releasing window \"{}\"", self.title);
    }

    fn show(&self, command: ShowCommand) {
        let (Some(handle), Some(event_loop)) = (self.handle, self.event_loop.upgrade()) else {
            return;
        };
        let system = event_loop.system();
        system.show_window(handle, command);
        system.redraw(handle);
    }
}

impl std::fmt::Debug for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("title", &self.title.as_str())
            .field("class", &self.class.as_str())
            .field("handle", &self.handle)
            .finish()
    }
}

fn placement<'a>(
    system: &dyn WindowSystem,
    class: &'a NativeText,
    title: &'a NativeText,
    style: WindowStyle,
    options: &CreateOptions,
) -> WindowDescriptor<'a> {
    if options.state == ShowState::Fullscreen {
        let (width, height) = system.screen_size();
        let configured = options.x.is_some() || options.y.is_some() || options.width.is_some() || options.height.is_some();
        log::debug!(
            "Fullscreen window \"{}\": undecorated pop-up at (0, 0) {}x{}{}",
            title,
            width,
            height,
            if configured { ", configured placement ignored" } else { "" }
        );
        return WindowDescriptor {
            class,
            title,
            style,
            x: Some(0),
            y: Some(0),
            width: Some(width),
            height: Some(height),
        };
    }

    WindowDescriptor {
        class,
        title,
        style,
        x: options.x,
        y: options.y,
        width: options.width,
        height: options.height,
    }
}

fn apply_theme(system: &dyn WindowSystem, handle: NativeHandle, dark: bool) {
    if let Err(err) = system.set_dark_mode(handle, dark) {
        log::debug!("Ignoring theme failure on window {}: {}", handle, err);
    }
}
