//! Event loop: live-window accounting, handler dispatch and the message pump
//!
//! The loop counts how many windows are alive. Creating a window increments
//! the count; destroying it through the default close path or through
//! [`ActionTarget::exit`] decrements it. The decrement that reaches zero posts
//! the window system's quit signal, and that is the only thing that ends
//! [`EventLoop::run`].
//!
//! Everything here is single-threaded: `EventLoop` is `!Send` and all calls
//! happen on the thread that pumps messages.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::bridge::MessageBridge;
use crate::events::{ActionTarget, Event, EventHandler};
use crate::platform::{HeadlessSystem, NativeHandle, NextMessage, PlatformError, WindowSystem};

/// Exit code posted with the quit signal when the last window goes away
pub const QUIT_EXIT_CODE: i32 = 0;

/// Event loop errors
#[derive(Error, Debug)]
pub enum EventLoopError {
    /// The window system can never deliver another message, but windows are
    /// still counted as alive
    #[error("event loop stalled with {live_windows} live window(s) and no pending messages")]
    Stalled {
        /// Live windows at the time the pump gave up
        live_windows: usize,
    },

    /// Window-system failure
    #[error("Window system error: {0}")]
    Platform(#[from] PlatformError),
}

/// Outcome of a non-blocking pump
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpStatus {
    /// Queue drained; the loop is still running
    Pending,
    /// The quit signal was observed
    Quit(i32),
}

/// Process-wide dispatcher for a set of windows
pub struct EventLoop {
    system: Rc<dyn WindowSystem>,
    bridge: Rc<MessageBridge>,
    live_windows: Cell<usize>,
    handler: RefCell<Option<Rc<RefCell<EventHandler>>>>,
}

impl EventLoop {
    /// Create an event loop on top of a window system
    pub fn new(system: Rc<dyn WindowSystem>) -> Rc<Self> {
        log::debug!("Creating event loop on {} window system", system.name());
        Rc::new(Self {
            system,
            bridge: Rc::new(MessageBridge::new()),
            live_windows: Cell::new(0),
            handler: RefCell::new(None),
        })
    }

    /// Create an event loop on a fresh in-process window system
    pub fn headless() -> Rc<Self> {
        Self::new(Rc::new(HeadlessSystem::new()))
    }

    /// Create an event loop on the platform's native window system
    #[cfg(windows)]
    pub fn native() -> Result<Rc<Self>, EventLoopError> {
        let system = crate::platform::Win32System::new()?;
        Ok(Self::new(Rc::new(system)))
    }

    /// Create an event loop on the platform's native window system
    #[cfg(not(windows))]
    pub fn native() -> Result<Rc<Self>, EventLoopError> {
        Err(PlatformError::Unsupported("no native window system on this platform").into())
    }

    /// The window system this loop drives
    pub fn system(&self) -> &dyn WindowSystem {
        self.system.as_ref()
    }

    pub(crate) fn bridge(&self) -> &Rc<MessageBridge> {
        &self.bridge
    }

    /// Install the application handler, replacing any previous one
    ///
    /// While a handler is installed, close requests are only reported to it;
    /// windows stay open unless the handler calls [`ActionTarget::exit`].
    pub fn set_handler<F>(&self, handler: F)
    where
        F: FnMut(Event, &ActionTarget<'_>) + 'static,
    {
        let handler: EventHandler = Box::new(handler);
        *self.handler.borrow_mut() = Some(Rc::new(RefCell::new(handler)));
    }

    /// Remove the application handler, restoring default behaviour
    pub fn clear_handler(&self) {
        self.handler.borrow_mut().take();
    }

    /// Whether a handler is installed, including while it runs
    pub fn has_handler(&self) -> bool {
        self.handler.borrow().is_some()
    }

    /// Number of windows currently alive
    pub fn live_windows(&self) -> usize {
        self.live_windows.get()
    }

    /// Count one more live window
    pub fn increment(&self) {
        let count = self.live_windows.get() + 1;
        self.live_windows.set(count);
        log::trace!("Live windows: {}", count);
    }

    /// Count one window fewer, posting quit when none remain
    ///
    /// Decrementing at zero is a logic error; it is logged and ignored so the
    /// count never goes negative.
    pub fn decrement(&self) {
        match self.live_windows.get() {
            0 => log::error!("Live window count decremented below zero; ignoring"),
            1 => {
                self.live_windows.set(0);
                log::debug!("Last window closed, posting quit");
                self.system.post_quit(QUIT_EXIT_CODE);
            }
            count => {
                self.live_windows.set(count - 1);
                log::trace!("Live windows: {}", count - 1);
            }
        }
    }

    /// Count a window whose creation is in flight
    ///
    /// The count is taken back when the returned guard is dropped without
    /// being committed, without posting quit.
    pub(crate) fn reserve_window(&self) -> WindowReservation<'_> {
        self.increment();
        WindowReservation { event_loop: self, committed: false }
    }

    /// Hand `event` for `handle` to the application handler
    ///
    /// Returns whether a handler is installed, in which case the handler
    /// owns the event and no default action may follow. An event arriving
    /// while the handler is already running (from a nested pump or modal
    /// loop inside it) is dropped. A handler may install or clear handlers
    /// while running; the change applies from the next dispatch.
    pub fn dispatch(&self, event: Event, handle: NativeHandle) -> bool {
        let installed = self.handler.borrow().as_ref().map(Rc::clone);
        let Some(handler) = installed else {
            return false;
        };

        let Ok(mut running) = handler.try_borrow_mut() else {
            log::debug!("Handler busy; dropping {:?} for window {}", event, handle);
            return true;
        };
        log::trace!("Dispatching {:?} for window {}", event, handle);
        let callback = &mut *running;
        callback(event, &ActionTarget::new(handle, self));
        true
    }

    /// Dispatch every queued message without blocking
    pub fn pump_pending(&self) -> Result<PumpStatus, EventLoopError> {
        loop {
            match self.system.next_message(false) {
                NextMessage::Message(queued) => self.system.dispatch_message(queued),
                NextMessage::Quit(code) => return Ok(PumpStatus::Quit(code)),
                NextMessage::Empty => return Ok(PumpStatus::Pending),
                NextMessage::Failed(err) => return Err(err.into()),
            }
        }
    }

    /// Pump messages until the quit signal, returning its exit code
    pub fn run(&self) -> Result<i32, EventLoopError> {
        log::info!("Starting message pump with {} live window(s)", self.live_windows());
        loop {
            match self.system.next_message(true) {
                NextMessage::Message(queued) => self.system.dispatch_message(queued),
                NextMessage::Quit(code) => {
                    log::info!("Message pump finished with exit code {}", code);
                    return Ok(code);
                }
                NextMessage::Empty => {
                    return Err(EventLoopError::Stalled { live_windows: self.live_windows() });
                }
                NextMessage::Failed(err) => return Err(err.into()),
            }
        }
    }
}

impl fmt::Debug for EventLoop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventLoop")
            .field("system", &self.system.name())
            .field("live_windows", &self.live_windows.get())
            .field("has_handler", &self.has_handler())
            .finish()
    }
}

/// A live-window count held for a window still being created
pub(crate) struct WindowReservation<'a> {
    event_loop: &'a EventLoop,
    committed: bool,
}

impl WindowReservation<'_> {
    /// Keep the count: the window now exists
    pub(crate) fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for WindowReservation<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let count = self.event_loop.live_windows.get().saturating_sub(1);
            self.event_loop.live_windows.set(count);
            log::debug!("Window creation abandoned; live windows back to {}", count);
        }
    }
}
