//! Message bridge between the window system and the event loop
//!
//! Every class registered by [`Window::create`](crate::Window::create) uses
//! the bridge of its event loop as its procedure, so every message for every
//! window of that loop passes through [`MessageBridge::handle_message`].
//!
//! Per handle the bridge tracks a two-state lifecycle:
//!
//! ```text
//!            Create { param: Some }
//!  Unbound ─────────────────────────▶ Bound
//!     ▲                                 │
//!     └──────────── Destroy ────────────┘
//! ```
//!
//! * **Bound** handles have an event loop recorded in the registry. A close
//!   request becomes [`Event::Close`]; with a handler installed the handler
//!   decides everything, without one the window is destroyed and the loop's
//!   count released.
//! * **Unbound** handles get default processing, except that their teardown
//!   posts the quit signal so a stray window cannot leave the pump hanging.
//!
//! The bridge never fails. A reference that cannot be recovered (the loop was
//! dropped) is treated as unbound.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::event_loop::{EventLoop, QUIT_EXIT_CODE};
use crate::events::Event;
use crate::platform::{CreateParam, Message, NativeHandle, Reply, WindowProcedure, WindowSystem};

/// Whether a handle has an event loop attached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// No event loop recorded
    Unbound,
    /// An event loop is recorded
    Bound,
}

/// Registry of handle → event loop, plus the per-message state machine
#[derive(Default)]
pub struct MessageBridge {
    bindings: RefCell<HashMap<NativeHandle, Weak<EventLoop>>>,
}

impl MessageBridge {
    /// Create a bridge with no bound handles
    pub fn new() -> Self {
        Self::default()
    }

    /// Current binding of `handle`
    pub fn binding(&self, handle: NativeHandle) -> Binding {
        if self.bindings.borrow().contains_key(&handle) {
            Binding::Bound
        } else {
            Binding::Unbound
        }
    }

    /// Number of bound handles
    pub fn bound_count(&self) -> usize {
        self.bindings.borrow().len()
    }

    fn bind(&self, handle: NativeHandle, param: CreateParam) {
        let previous = self.bindings.borrow_mut().insert(handle, param.into_event_loop());
        if previous.is_some() {
            log::warn!("Window {} was bound twice; keeping the latest event loop", handle);
        }
        log::trace!("Bound window {}", handle);
    }

    fn lookup(&self, handle: NativeHandle) -> Option<Rc<EventLoop>> {
        self.bindings.borrow().get(&handle).and_then(Weak::upgrade)
    }

    fn unbind(&self, handle: NativeHandle) -> Option<Rc<EventLoop>> {
        self.bindings.borrow_mut().remove(&handle).and_then(|weak| weak.upgrade())
    }

    fn on_close(system: &dyn WindowSystem, event_loop: &EventLoop, handle: NativeHandle) {
        if event_loop.dispatch(Event::Close, handle) {
            return;
        }
        log::debug!("No handler installed; closing window {}", handle);
        if system.destroy_window(handle) {
            event_loop.decrement();
        }
    }
}

impl WindowProcedure for MessageBridge {
    fn handle_message(&self, system: &dyn WindowSystem, handle: NativeHandle, message: Message) -> Reply {
        match message {
            Message::Create { param: Some(param) } => {
                self.bind(handle, param);
                Reply::Default
            }
            Message::Create { param: None } => Reply::Default,
            Message::Destroy => {
                if self.unbind(handle).is_some() {
                    Reply::Default
                } else {
                    log::debug!("Unbound window {} destroyed; posting quit", handle);
                    system.post_quit(QUIT_EXIT_CODE);
                    Reply::Handled
                }
            }
            Message::Close => match self.lookup(handle) {
                Some(event_loop) => {
                    Self::on_close(system, &event_loop, handle);
                    Reply::Handled
                }
                None => Reply::Default,
            },
            _ => Reply::Default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::HeadlessSystem;
    use std::cell::Cell;

    fn setup() -> (Rc<HeadlessSystem>, Rc<EventLoop>) {
        let system = Rc::new(HeadlessSystem::new());
        let event_loop = EventLoop::new(Rc::clone(&system) as Rc<dyn WindowSystem>);
        (system, event_loop)
    }

    #[test]
    fn test_create_with_param_binds() {
        let (system, event_loop) = setup();
        let bridge = MessageBridge::new();
        let handle = NativeHandle::from_raw(7);

        assert_eq!(bridge.binding(handle), Binding::Unbound);
        let reply = bridge.handle_message(
            &*system,
            handle,
            Message::Create { param: Some(CreateParam::new(&event_loop)) },
        );
        assert_eq!(reply, Reply::Default);
        assert_eq!(bridge.binding(handle), Binding::Bound);
    }

    #[test]
    fn test_create_without_param_stays_unbound() {
        let (system, _event_loop) = setup();
        let bridge = MessageBridge::new();
        let handle = NativeHandle::from_raw(7);

        bridge.handle_message(&*system, handle, Message::Create { param: None });
        assert_eq!(bridge.binding(handle), Binding::Unbound);
    }

    #[test]
    fn test_unbound_close_gets_default_processing() {
        let (system, _event_loop) = setup();
        let bridge = MessageBridge::new();
        let reply = bridge.handle_message(&*system, NativeHandle::from_raw(3), Message::Close);
        assert_eq!(reply, Reply::Default);
    }

    #[test]
    fn test_unbound_destroy_posts_quit() {
        let (system, _event_loop) = setup();
        let bridge = MessageBridge::new();

        let reply = bridge.handle_message(&*system, NativeHandle::from_raw(3), Message::Destroy);
        assert_eq!(reply, Reply::Handled);
        assert_eq!(system.pending_quit(), Some(QUIT_EXIT_CODE));
    }

    #[test]
    fn test_bound_destroy_unbinds_without_quit() {
        let (system, event_loop) = setup();
        let bridge = MessageBridge::new();
        let handle = NativeHandle::from_raw(9);
        bridge.handle_message(
            &*system,
            handle,
            Message::Create { param: Some(CreateParam::new(&event_loop)) },
        );

        let reply = bridge.handle_message(&*system, handle, Message::Destroy);
        assert_eq!(reply, Reply::Default);
        assert_eq!(bridge.binding(handle), Binding::Unbound);
        assert_eq!(system.pending_quit(), None);
    }

    #[test]
    fn test_bound_close_goes_to_handler() {
        let (system, event_loop) = setup();
        let bridge = MessageBridge::new();
        let handle = NativeHandle::from_raw(11);
        bridge.handle_message(
            &*system,
            handle,
            Message::Create { param: Some(CreateParam::new(&event_loop)) },
        );

        let received = Rc::new(Cell::new(None));
        let sink = Rc::clone(&received);
        event_loop.set_handler(move |event, target| sink.set(Some((event, target.handle()))));

        let reply = bridge.handle_message(&*system, handle, Message::Close);
        assert_eq!(reply, Reply::Handled);
        assert_eq!(received.get(), Some((Event::Close, handle)));
    }

    #[test]
    fn test_dropped_loop_degrades_to_unbound() {
        let (system, event_loop) = setup();
        let bridge = MessageBridge::new();
        let handle = NativeHandle::from_raw(5);
        bridge.handle_message(
            &*system,
            handle,
            Message::Create { param: Some(CreateParam::new(&event_loop)) },
        );
        drop(event_loop);

        assert_eq!(bridge.handle_message(&*system, handle, Message::Close), Reply::Default);
        assert_eq!(bridge.handle_message(&*system, handle, Message::Destroy), Reply::Handled);
        assert_eq!(system.pending_quit(), Some(QUIT_EXIT_CODE));
    }

    #[test]
    fn test_other_messages_pass_through() {
        let (system, event_loop) = setup();
        let bridge = MessageBridge::new();
        let handle = NativeHandle::from_raw(13);
        bridge.handle_message(
            &*system,
            handle,
            Message::Create { param: Some(CreateParam::new(&event_loop)) },
        );

        for message in [Message::Paint, Message::Resize { width: 10, height: 20 }, Message::Other { id: 0x0200 }] {
            assert_eq!(bridge.handle_message(&*system, handle, message), Reply::Default);
        }
    }
}
