//! In-process window system
//!
//! Keeps windows, classes and the message queue in memory and follows the
//! same delivery rules as a native window system: construction and
//! destruction messages are delivered synchronously, posted messages wait
//! in a FIFO queue, and the quit signal is only reported once the queue is
//! otherwise empty.
//!
//! Besides backing the test suite it lets an application run its window
//! logic without a display. A few fault-injection switches make the failure
//! paths of window creation reachable.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use raw_window_handle::RawWindowHandle;
use slotmap::{new_key_type, Key, KeyData, SlotMap};

use super::{
    Background, CreateParam, Message, NativeHandle, NextMessage, PlatformError, QueuedMessage,
    RawMessage, Reply, ShowCommand, WindowClass, WindowDescriptor, WindowProcedure, WindowSystem,
};
use crate::foundation::text::NativeText;
use crate::window::WindowStyle;

new_key_type! {
    struct SurfaceKey;
}

/// Default placement used when a descriptor leaves position or size open
const DEFAULT_ORIGIN: (i32, i32) = (100, 100);
const DEFAULT_SIZE: (u32, u32) = (800, 600);
const DEFAULT_SCREEN: (u32, u32) = (1920, 1080);

/// Current show state of a headless window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// Normal size and position
    Normal,
    /// Iconified
    Minimized,
    /// Filling the work area
    Maximized,
}

/// Snapshot of a headless window, for inspection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceInfo {
    /// Class the window was created from
    pub class: String,
    /// Title text
    pub title: String,
    /// Style bits it was created with
    pub style: WindowStyle,
    /// Resolved position
    pub position: (i32, i32),
    /// Resolved size
    pub size: (u32, u32),
    /// Show state
    pub state: SurfaceState,
    /// Background brush of the window's class
    pub background: Background,
    /// Last chrome theme applied, if any
    pub dark_mode: Option<bool>,
    /// Number of redraw requests received
    pub redraws: u32,
}

struct Surface {
    info: SurfaceInfo,
    destroying: bool,
}

struct ClassEntry {
    procedure: Rc<dyn WindowProcedure>,
    background: Background,
}

/// In-memory window system
pub struct HeadlessSystem {
    surfaces: RefCell<SlotMap<SurfaceKey, Surface>>,
    classes: RefCell<HashMap<String, ClassEntry>>,
    queue: RefCell<VecDeque<QueuedMessage>>,
    quit: Cell<Option<i32>>,
    screen: (u32, u32),
    fail_class_registration: Cell<bool>,
    fail_window_creation: Cell<bool>,
    reject_theme: Cell<bool>,
}

impl HeadlessSystem {
    /// Create an empty window system with a 1920x1080 screen
    pub fn new() -> Self {
        Self::with_screen_size(DEFAULT_SCREEN.0, DEFAULT_SCREEN.1)
    }

    /// Create an empty window system with the given screen size
    pub fn with_screen_size(width: u32, height: u32) -> Self {
        Self {
            surfaces: RefCell::new(SlotMap::with_key()),
            classes: RefCell::new(HashMap::new()),
            queue: RefCell::new(VecDeque::new()),
            quit: Cell::new(None),
            screen: (width, height),
            fail_class_registration: Cell::new(false),
            fail_window_creation: Cell::new(false),
            reject_theme: Cell::new(false),
        }
    }

    /// Make the next class registration fail
    pub fn fail_next_class_registration(&self) {
        self.fail_class_registration.set(true);
    }

    /// Make the next window creation fail
    pub fn fail_next_window_creation(&self) {
        self.fail_window_creation.set(true);
    }

    /// Reject (or stop rejecting) theme attribute changes
    pub fn reject_theme_changes(&self, reject: bool) {
        self.reject_theme.set(reject);
    }

    /// Snapshot of a live window
    pub fn surface(&self, handle: NativeHandle) -> Option<SurfaceInfo> {
        self.surfaces.borrow().get(key_of(handle)).map(|surface| surface.info.clone())
    }

    /// Number of live windows
    pub fn window_count(&self) -> usize {
        self.surfaces.borrow().len()
    }

    /// Number of registered classes
    pub fn class_count(&self) -> usize {
        self.classes.borrow().len()
    }

    /// Whether a class with this name is registered
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.borrow().contains_key(name)
    }

    /// Number of messages waiting in the queue
    pub fn queued_messages(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Exit code of a posted but not yet retrieved quit signal
    pub fn pending_quit(&self) -> Option<i32> {
        self.quit.get()
    }

    fn release_class(&self, name: &str) -> bool {
        let in_use = self.surfaces.borrow().values().any(|surface| surface.info.class == name);
        if in_use {
            return false;
        }
        let released = self.classes.borrow_mut().remove(name).is_some();
        if released {
            log::trace!("Unregistered headless class {}", name);
        }
        released
    }

    fn procedure_for(&self, handle: NativeHandle) -> Option<Rc<dyn WindowProcedure>> {
        let class = self.surfaces.borrow().get(key_of(handle))?.info.class.clone();
        self.classes.borrow().get(&class).map(|entry| Rc::clone(&entry.procedure))
    }

    fn with_surface(&self, handle: NativeHandle, f: impl FnOnce(&mut SurfaceInfo)) -> bool {
        match self.surfaces.borrow_mut().get_mut(key_of(handle)) {
            Some(surface) if !surface.destroying => {
                f(&mut surface.info);
                true
            }
            _ => false,
        }
    }
}

impl Default for HeadlessSystem {
    fn default() -> Self {
        Self::new()
    }
}

fn handle_of(key: SurfaceKey) -> NativeHandle {
    NativeHandle::from_raw(key.data().as_ffi())
}

fn key_of(handle: NativeHandle) -> SurfaceKey {
    SurfaceKey::from(KeyData::from_ffi(handle.raw()))
}

fn initial_state(style: WindowStyle) -> SurfaceState {
    if style.contains(WindowStyle::MINIMIZE) {
        SurfaceState::Minimized
    } else if style.contains(WindowStyle::MAXIMIZE) {
        SurfaceState::Maximized
    } else {
        SurfaceState::Normal
    }
}

impl WindowSystem for HeadlessSystem {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn register_class(&self, class: &WindowClass<'_>) -> Result<(), PlatformError> {
        if self.fail_class_registration.replace(false) {
            return Err(PlatformError::ClassRegistration("registration refused".to_string()));
        }

        let mut classes = self.classes.borrow_mut();
        let name = class.name.as_str();
        if classes.contains_key(name) {
            return Err(PlatformError::ClassRegistration(format!("class '{}' already exists", name)));
        }

        classes.insert(
            name.to_string(),
            ClassEntry {
                procedure: Rc::clone(&class.procedure),
                background: class.background,
            },
        );
        log::trace!("Registered headless class {}", name);
        Ok(())
    }

    fn unregister_class(&self, name: &NativeText) -> bool {
        self.release_class(name.as_str())
    }

    fn create_window(&self, descriptor: &WindowDescriptor<'_>, param: Option<CreateParam>) -> Option<NativeHandle> {
        if self.fail_window_creation.replace(false) {
            log::debug!("Headless window creation refused");
            return None;
        }
        let (procedure, background) = self
            .classes
            .borrow()
            .get(descriptor.class.as_str())
            .map(|entry| (Rc::clone(&entry.procedure), entry.background))?;

        let info = SurfaceInfo {
            class: descriptor.class.as_str().to_string(),
            title: descriptor.title.as_str().to_string(),
            style: descriptor.style,
            position: (
                descriptor.x.unwrap_or(DEFAULT_ORIGIN.0),
                descriptor.y.unwrap_or(DEFAULT_ORIGIN.1),
            ),
            size: (
                descriptor.width.unwrap_or(DEFAULT_SIZE.0),
                descriptor.height.unwrap_or(DEFAULT_SIZE.1),
            ),
            state: initial_state(descriptor.style),
            background,
            dark_mode: None,
            redraws: 0,
        };
        let key = self.surfaces.borrow_mut().insert(Surface { info, destroying: false });
        let handle = handle_of(key);

        // The construction message arrives before the caller sees the handle
        procedure.handle_message(self, handle, Message::Create { param });
        Some(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) -> bool {
        let marked = self.with_surface(handle, |_| ());
        if !marked {
            return false;
        }
        if let Some(surface) = self.surfaces.borrow_mut().get_mut(key_of(handle)) {
            surface.destroying = true;
        }

        if let Some(procedure) = self.procedure_for(handle) {
            procedure.handle_message(self, handle, Message::Destroy);
        }

        let removed = self.surfaces.borrow_mut().remove(key_of(handle));
        self.queue.borrow_mut().retain(|queued| queued.handle != Some(handle));
        log::trace!("Destroyed headless window {}", handle);

        if let Some(surface) = removed {
            self.release_class(&surface.info.class);
        }
        true
    }

    fn is_window(&self, handle: NativeHandle) -> bool {
        self.surfaces
            .borrow()
            .get(key_of(handle))
            .is_some_and(|surface| !surface.destroying)
    }

    fn show_window(&self, handle: NativeHandle, command: ShowCommand) {
        self.with_surface(handle, |info| {
            info.state = match command {
                ShowCommand::Minimize => SurfaceState::Minimized,
                ShowCommand::Maximize => SurfaceState::Maximized,
                ShowCommand::Restore => SurfaceState::Normal,
            };
        });
    }

    fn redraw(&self, handle: NativeHandle) {
        self.with_surface(handle, |info| info.redraws += 1);
    }

    fn set_dark_mode(&self, handle: NativeHandle, dark: bool) -> Result<(), PlatformError> {
        if self.reject_theme.get() {
            return Err(PlatformError::Attribute("theme changes rejected".to_string()));
        }
        if self.with_surface(handle, |info| info.dark_mode = Some(dark)) {
            Ok(())
        } else {
            Err(PlatformError::Attribute(format!("no window {}", handle)))
        }
    }

    fn post_message(&self, handle: NativeHandle, message: Message) -> Result<(), PlatformError> {
        if !self.is_window(handle) {
            return Err(PlatformError::MessagePost(format!("no window {}", handle)));
        }
        self.queue.borrow_mut().push_back(QueuedMessage {
            handle: Some(handle),
            message,
            raw: RawMessage::default(),
        });
        Ok(())
    }

    fn next_message(&self, _wait: bool) -> NextMessage {
        // Nothing outside this process can feed the queue, so waiting on an
        // empty queue would never end; report it as empty instead.
        if let Some(queued) = self.queue.borrow_mut().pop_front() {
            return NextMessage::Message(queued);
        }
        match self.quit.take() {
            Some(code) => NextMessage::Quit(code),
            None => NextMessage::Empty,
        }
    }

    fn dispatch_message(&self, queued: QueuedMessage) {
        let Some(handle) = queued.handle else {
            log::trace!("Dropping thread message {:?}", queued.message);
            return;
        };
        let Some(procedure) = self.procedure_for(handle) else {
            log::trace!("Dropping message for dead window {}", handle);
            return;
        };

        if procedure.handle_message(self, handle, queued.message.clone()) == Reply::Default {
            self.default_procedure(handle, &queued.message);
        }
    }

    fn post_quit(&self, exit_code: i32) {
        log::debug!("Quit posted with exit code {}", exit_code);
        self.quit.set(Some(exit_code));
    }

    fn default_procedure(&self, handle: NativeHandle, message: &Message) -> isize {
        if let Message::Close = message {
            self.destroy_window(handle);
        }
        0
    }

    fn screen_size(&self) -> (u32, u32) {
        self.screen
    }

    fn raw_window_handle(&self, _handle: NativeHandle) -> Option<RawWindowHandle> {
        None
    }
}
