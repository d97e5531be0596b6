//! Window-system abstraction
//!
//! This module defines the contract every window system implements. The rest
//! of the crate (windows, the event loop, the message bridge) only ever talks
//! to a `dyn WindowSystem`, so the same binding logic runs on Win32 and on the
//! in-process [`headless`] system used by tests.
//!
//! # Layering
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  Window / EventLoop          │ ← public API
//! └──────────────┬───────────────┘
//!                │ calls
//!        ┌───────▼────────┐
//!        │ WindowSystem   │ ← this trait
//!        └───────┬────────┘
//!                │ delivers messages to
//!        ┌───────▼────────┐
//!        │ WindowProcedure│ ← implemented by the message bridge
//!        └────────────────┘
//! ```

use std::fmt;
use std::rc::{Rc, Weak};

use raw_window_handle::RawWindowHandle;
use thiserror::Error;

use crate::event_loop::EventLoop;
use crate::foundation::text::NativeText;
use crate::window::WindowStyle;

pub mod headless;
#[cfg(windows)]
pub mod win32;

pub use headless::HeadlessSystem;
#[cfg(windows)]
pub use win32::Win32System;

/// Opaque identifier of a native window instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NativeHandle(u64);

impl NativeHandle {
    /// Wrap a raw window-system handle value
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw window-system handle value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Opaque value handed to the window system at creation time
///
/// The window system never looks inside; it only delivers it back with the
/// construction message so the bridge can bind the new handle.
#[derive(Clone)]
pub struct CreateParam {
    event_loop: Weak<EventLoop>,
}

impl CreateParam {
    pub(crate) fn new(event_loop: &Rc<EventLoop>) -> Self {
        Self { event_loop: Rc::downgrade(event_loop) }
    }

    pub(crate) fn into_event_loop(self) -> Weak<EventLoop> {
        self.event_loop
    }
}

impl fmt::Debug for CreateParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CreateParam")
            .field("alive", &(self.event_loop.strong_count() > 0))
            .finish()
    }
}

/// Window-system messages, as far as this crate distinguishes them
#[derive(Debug, Clone)]
pub enum Message {
    /// The handle's construction message, carrying the creation parameter
    Create {
        /// Parameter passed to [`WindowSystem::create_window`]
        param: Option<CreateParam>,
    },
    /// The user or application asked the window to close
    Close,
    /// The handle is being torn down
    Destroy,
    /// The client area needs repainting
    Paint,
    /// The client area changed size
    Resize {
        /// New client width
        width: u32,
        /// New client height
        height: u32,
    },
    /// Any message without its own variant
    Other {
        /// Platform message identifier
        id: u32,
    },
}

/// What the procedure did with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Handled; the platform receives its "handled" value (zero)
    Handled,
    /// Not handled; the platform runs default processing and returns its own value
    Default,
}

/// Untranslated message parameters, kept so queued messages can be re-dispatched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RawMessage {
    /// Platform message identifier
    pub id: u32,
    /// First message parameter
    pub wparam: usize,
    /// Second message parameter
    pub lparam: isize,
}

/// A message taken off the thread's queue
#[derive(Debug, Clone)]
pub struct QueuedMessage {
    /// Target window, `None` for thread messages
    pub handle: Option<NativeHandle>,
    /// Translated message
    pub message: Message,
    /// Original parameters
    pub raw: RawMessage,
}

/// Result of asking the window system for the next message
#[derive(Debug)]
pub enum NextMessage {
    /// A message to dispatch
    Message(QueuedMessage),
    /// The quit signal, with its exit code
    Quit(i32),
    /// Nothing queued (only returned when not waiting, or when the system can
    /// never produce another message)
    Empty,
    /// Retrieving a message failed
    Failed(PlatformError),
}

/// Show-state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowCommand {
    /// Iconify
    Minimize,
    /// Fill the work area
    Maximize,
    /// Back to normal size and position
    Restore,
}

/// Stock background brushes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Background {
    /// The system window colour
    #[default]
    Window,
    /// Solid white
    White,
    /// Solid black
    Black,
}

/// A window class to register
///
/// Classes always get the default application icon and arrow cursor.
pub struct WindowClass<'a> {
    /// Registration name, unique per process
    pub name: &'a NativeText,
    /// Background brush
    pub background: Background,
    /// Callback receiving every message for windows of this class
    pub procedure: Rc<dyn WindowProcedure>,
}

/// Parameters of a single window instance
#[derive(Debug, Clone, Copy)]
pub struct WindowDescriptor<'a> {
    /// Registered class to instantiate
    pub class: &'a NativeText,
    /// Title bar text
    pub title: &'a NativeText,
    /// Style bits
    pub style: WindowStyle,
    /// Left edge, `None` for the system default
    pub x: Option<i32>,
    /// Top edge, `None` for the system default
    pub y: Option<i32>,
    /// Outer width, `None` for the system default
    pub width: Option<u32>,
    /// Outer height, `None` for the system default
    pub height: Option<u32>,
}

/// Window-system errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The class could not be registered
    #[error("window class registration failed: {0}")]
    ClassRegistration(String),

    /// The window could not be created
    #[error("window creation failed: {0}")]
    HandleCreation(String),

    /// A window attribute could not be applied
    #[error("window attribute rejected: {0}")]
    Attribute(String),

    /// A message could not be queued
    #[error("message post failed: {0}")]
    MessagePost(String),

    /// Retrieving a message failed
    #[error("message retrieval failed: {0}")]
    MessageRetrieval(String),

    /// The operation is not available on this window system
    #[error("unsupported on this window system: {0}")]
    Unsupported(&'static str),
}

/// Receiver of every message for windows of a class
pub trait WindowProcedure {
    /// Handle one message for `handle`
    ///
    /// Called synchronously by the window system, possibly re-entrantly
    /// (destroying a window from inside a handler delivers `Destroy` before
    /// the destroy call returns).
    fn handle_message(&self, system: &dyn WindowSystem, handle: NativeHandle, message: Message) -> Reply;
}

/// The window-system primitives the crate is built on
///
/// Implementations are single-threaded; every call happens on the thread
/// that owns the message pump.
pub trait WindowSystem {
    /// Human-readable name for logs
    fn name(&self) -> &'static str;

    /// Register a named class with its procedure
    fn register_class(&self, class: &WindowClass<'_>) -> Result<(), PlatformError>;

    /// Remove a registered class and release its procedure
    ///
    /// Returns `false` if the class is unknown or windows of it still exist.
    fn unregister_class(&self, name: &NativeText) -> bool;

    /// Create a window instance
    ///
    /// Must deliver [`Message::Create`] with `param` to the class procedure
    /// before returning. Returns `None` if the window system refused.
    fn create_window(&self, descriptor: &WindowDescriptor<'_>, param: Option<CreateParam>) -> Option<NativeHandle>;

    /// Destroy a window, delivering [`Message::Destroy`] synchronously
    ///
    /// Returns `false` if the handle was not (or no longer) a live window.
    /// Classes registered by this crate hold a single window each, so the
    /// window's class is unregistered once the window is gone.
    fn destroy_window(&self, handle: NativeHandle) -> bool;

    /// Whether `handle` refers to a live window
    fn is_window(&self, handle: NativeHandle) -> bool;

    /// Request a show-state transition
    fn show_window(&self, handle: NativeHandle, command: ShowCommand);

    /// Request a redraw
    fn redraw(&self, handle: NativeHandle);

    /// Best-effort dark or light chrome
    fn set_dark_mode(&self, handle: NativeHandle, dark: bool) -> Result<(), PlatformError>;

    /// Queue a message for `handle`
    fn post_message(&self, handle: NativeHandle, message: Message) -> Result<(), PlatformError>;

    /// Take the next message off the queue, optionally blocking
    fn next_message(&self, wait: bool) -> NextMessage;

    /// Deliver a queued message to its window's procedure
    fn dispatch_message(&self, message: QueuedMessage);

    /// Post the quit signal
    fn post_quit(&self, exit_code: i32);

    /// Default processing for a message the procedure did not handle
    fn default_procedure(&self, handle: NativeHandle, message: &Message) -> isize;

    /// Size of the primary screen
    fn screen_size(&self) -> (u32, u32);

    /// Raw handle for surface integration, where the platform has one
    fn raw_window_handle(&self, handle: NativeHandle) -> Option<RawWindowHandle>;
}
