//! Abstract window events and the handle a handler acts through
//!
//! Raw window-system messages are translated by the message bridge into the
//! closed [`Event`] set below. When a handler is installed on the
//! [`EventLoop`], it receives each event together with an [`ActionTarget`]
//! for the window concerned and has full authority over what happens next:
//! nothing is done on its behalf.

use std::fmt;

use crate::event_loop::EventLoop;
use crate::platform::{NativeHandle, ShowCommand};

/// Events delivered to the application handler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Event {
    /// The user (or the application) asked the window to close
    Close,
}

/// Application event handler
pub type EventHandler = Box<dyn FnMut(Event, &ActionTarget<'_>)>;

/// Commands available to a handler for the window an event concerns
///
/// Lives only for the duration of one handler call and owns nothing.
pub struct ActionTarget<'a> {
    handle: NativeHandle,
    event_loop: &'a EventLoop,
}

impl<'a> ActionTarget<'a> {
    pub(crate) fn new(handle: NativeHandle, event_loop: &'a EventLoop) -> Self {
        Self { handle, event_loop }
    }

    /// Native handle of the target window
    pub fn handle(&self) -> NativeHandle {
        self.handle
    }

    /// Destroy the window and release its place in the event loop
    ///
    /// Calling this on an already destroyed window does nothing, so the live
    /// window count is released at most once per window.
    pub fn exit(&self) {
        if self.event_loop.system().destroy_window(self.handle) {
            self.event_loop.decrement();
        } else {
            log::debug!("Window {} already destroyed", self.handle);
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

    fn show(&self, command: ShowCommand) {
        let system = self.event_loop.system();
        system.show_window(self.handle, command);
        system.redraw(self.handle);
    }
}

impl fmt::Debug for ActionTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionTarget")
            .field("handle", &self.handle)
            .field("live_windows", &self.event_loop.live_windows())
            .finish()
    }
}
