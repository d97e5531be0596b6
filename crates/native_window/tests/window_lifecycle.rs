//! End-to-end window lifecycle on the in-process window system

use std::cell::Cell;
use std::rc::Rc;

use native_window::foundation::text::EncodingError;
use native_window::platform::headless::SurfaceState;
use native_window::platform::{Background, Message, PlatformError};
use native_window::prelude::*;
use native_window::window::WindowStyle;

fn setup() -> (Rc<HeadlessSystem>, Rc<EventLoop>) {
    setup_with(HeadlessSystem::new())
}

fn setup_with(system: HeadlessSystem) -> (Rc<HeadlessSystem>, Rc<EventLoop>) {
    let system = Rc::new(system);
    let event_loop = EventLoop::new(Rc::clone(&system) as Rc<dyn WindowSystem>);
    (system, event_loop)
}

fn open(event_loop: &Rc<EventLoop>, title: &str) -> Window {
    Window::create(event_loop, &CreateOptions::new(title)).expect("window creation")
}

#[test]
fn single_window_closes_and_pump_quits() {
    let (system, event_loop) = setup();
    let window = open(&event_loop, "Only");
    assert_eq!(event_loop.live_windows(), 1);
    assert!(window.is_alive());

    window.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Quit(0));

    assert_eq!(event_loop.live_windows(), 0);
    assert!(!window.is_alive());
    assert_eq!(system.window_count(), 0);
}

#[test]
fn run_returns_exit_code_after_last_close() {
    let (_system, event_loop) = setup();
    let window = open(&event_loop, "Run");
    window.request_close().unwrap();
    assert_eq!(event_loop.run().unwrap(), 0);
}

#[test]
fn second_window_keeps_loop_running() {
    let (_system, event_loop) = setup();
    event_loop.set_handler(|event, target| {
        if event == Event::Close {
            target.exit();
        }
    });

    let first = open(&event_loop, "First");
    let second = open(&event_loop, "Second");
    assert_eq!(event_loop.live_windows(), 2);

    first.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Pending);
    assert_eq!(event_loop.live_windows(), 1);
    assert!(!first.is_alive());
    assert!(second.is_alive());

    second.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Quit(0));
    assert_eq!(event_loop.live_windows(), 0);
}

#[test]
fn default_close_releases_each_window_once() {
    let (_system, event_loop) = setup();
    let first = open(&event_loop, "First");
    let second = open(&event_loop, "Second");

    first.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Pending);
    assert_eq!(event_loop.live_windows(), 1);
    assert!(!first.is_alive());
    assert!(second.is_alive());

    second.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Quit(0));
    assert_eq!(event_loop.live_windows(), 0);
}

#[test]
fn close_during_a_running_handler_is_not_default_handled() {
    let (_system, event_loop) = setup();
    let first = open(&event_loop, "First");
    let second = open(&event_loop, "Second");
    let first_handle = first.handle();
    let second_handle = second.handle().unwrap();

    let nested_status = Rc::new(Cell::new(None));
    let sink = Rc::clone(&nested_status);
    let weak = Rc::downgrade(&event_loop);
    event_loop.set_handler(move |_, target| {
        if Some(target.handle()) != first_handle {
            return;
        }
        let Some(event_loop) = weak.upgrade() else {
            return;
        };
        event_loop.system().post_message(second_handle, Message::Close).unwrap();
        sink.set(Some(event_loop.pump_pending().unwrap()));
    });

    first.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Pending);

    assert_eq!(nested_status.get(), Some(PumpStatus::Pending));
    assert!(first.is_alive());
    assert!(second.is_alive());
    assert_eq!(event_loop.live_windows(), 2);
    assert!(event_loop.has_handler());
}

#[test]
fn handler_that_ignores_close_keeps_window_open() {
    let (_system, event_loop) = setup();
    let closes = Rc::new(Cell::new(0));
    let counter = Rc::clone(&closes);
    event_loop.set_handler(move |_, _| counter.set(counter.get() + 1));

    let window = open(&event_loop, "Stubborn");
    window.request_close().unwrap();
    window.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Pending);

    assert_eq!(closes.get(), 2);
    assert!(window.is_alive());
    assert_eq!(event_loop.live_windows(), 1);
}

#[test]
fn handler_receives_the_closing_window() {
    let (_system, event_loop) = setup();
    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    event_loop.set_handler(move |_, target| sink.set(Some(target.handle())));

    let _other = open(&event_loop, "Other");
    let window = open(&event_loop, "Target");
    window.request_close().unwrap();
    event_loop.pump_pending().unwrap();

    assert_eq!(seen.get(), window.handle());
}

#[test]
fn repeated_exit_releases_window_once() {
    let (_system, event_loop) = setup();
    event_loop.set_handler(|_, target| {
        target.exit();
        target.exit();
    });

    let _keep = open(&event_loop, "Keep");
    let window = open(&event_loop, "Leave");
    window.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Pending);
    assert_eq!(event_loop.live_windows(), 1);
}

#[test]
fn clearing_the_handler_restores_default_close() {
    let (_system, event_loop) = setup();
    event_loop.set_handler(|_, _| {});
    let window = open(&event_loop, "Default");
    event_loop.clear_handler();

    window.request_close().unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Quit(0));
    assert!(!window.is_alive());
}

#[test]
fn show_state_changes_are_followed_by_redraws() {
    let (system, event_loop) = setup();
    let window = open(&event_loop, "Shows");
    let handle = window.handle().unwrap();

    window.minimize();
    assert_eq!(system.surface(handle).unwrap().state, SurfaceState::Minimized);
    window.maximize();
    assert_eq!(system.surface(handle).unwrap().state, SurfaceState::Maximized);
    window.restore();

    let info = system.surface(handle).unwrap();
    assert_eq!(info.state, SurfaceState::Normal);
    assert_eq!(info.redraws, 3);
}

#[test]
fn handler_can_change_show_state() {
    let (system, event_loop) = setup();
    event_loop.set_handler(|_, target| target.minimize());

    let window = open(&event_loop, "Hide on close");
    window.request_close().unwrap();
    event_loop.pump_pending().unwrap();

    let info = system.surface(window.handle().unwrap()).unwrap();
    assert_eq!(info.state, SurfaceState::Minimized);
    assert_eq!(info.redraws, 1);
}

#[test]
fn creation_options_reach_the_window_system() {
    let (system, event_loop) = setup();
    let options = CreateOptions::new("Placed")
        .with_position(10, 20)
        .with_size(640, 480)
        .with_resizable(false)
        .with_state(ShowState::Maximize);
    let window = Window::create(&event_loop, &options).unwrap();

    let info = system.surface(window.handle().unwrap()).unwrap();
    assert_eq!(info.title, "Placed");
    assert_eq!(info.position, (10, 20));
    assert_eq!(info.size, (640, 480));
    assert_eq!(info.state, SurfaceState::Maximized);
    assert!(info.style.contains(WindowStyle::CAPTION | WindowStyle::VISIBLE | WindowStyle::MAXIMIZE));
    assert!(!info.style.contains(WindowStyle::THICKFRAME));
}

#[test]
fn fullscreen_covers_the_screen() {
    let (system, event_loop) = setup_with(HeadlessSystem::with_screen_size(1280, 720));
    let options = CreateOptions::new("Full")
        .with_position(50, 50)
        .with_state(ShowState::Fullscreen);
    let window = Window::create(&event_loop, &options).unwrap();

    let info = system.surface(window.handle().unwrap()).unwrap();
    assert_eq!(info.position, (0, 0));
    assert_eq!(info.size, (1280, 720));
    assert!(info.style.contains(WindowStyle::POPUP));
    assert!(!info.style.contains(WindowStyle::CAPTION));
}

#[test]
fn every_window_gets_its_own_class() {
    let (system, event_loop) = setup();
    let first = open(&event_loop, "A");
    let second = open(&event_loop, "B");

    assert_ne!(first.class_name().as_str(), second.class_name().as_str());
    assert!(first.class_name().as_str().starts_with("native-window-"));
    assert!(system.has_class(second.class_name().as_str()));
    assert_eq!(system.class_count(), 2);
}

#[test]
fn closed_windows_release_their_class() {
    let (system, event_loop) = setup();
    let first = open(&event_loop, "First");
    let second = open(&event_loop, "Second");
    let first_class = first.class_name().as_str().to_string();

    first.request_close().unwrap();
    event_loop.pump_pending().unwrap();
    assert!(!system.has_class(&first_class));
    assert!(system.has_class(second.class_name().as_str()));

    second.request_close().unwrap();
    event_loop.pump_pending().unwrap();
    assert_eq!(system.class_count(), 0);
}

#[test]
fn windows_use_the_system_background() {
    let (system, event_loop) = setup();
    let window = open(&event_loop, "Background");
    assert_eq!(system.surface(window.handle().unwrap()).unwrap().background, Background::Window);
}

#[test]
fn theme_is_applied_best_effort() {
    let (system, event_loop) = setup();
    let auto = open(&event_loop, "Auto");
    let light = Window::create(&event_loop, &CreateOptions::new("Light").with_theme(Theme::Light)).unwrap();
    assert_eq!(system.surface(auto.handle().unwrap()).unwrap().dark_mode, Some(true));
    assert_eq!(system.surface(light.handle().unwrap()).unwrap().dark_mode, Some(false));

    system.reject_theme_changes(true);
    let plain = open(&event_loop, "Rejected");
    assert_eq!(system.surface(plain.handle().unwrap()).unwrap().dark_mode, None);
    assert_eq!(event_loop.live_windows(), 3);
}

#[test]
fn failed_class_registration_leaves_count_unchanged() {
    let (system, event_loop) = setup();
    system.fail_next_class_registration();

    let result = Window::create(&event_loop, &CreateOptions::default());
    assert!(matches!(result, Err(WindowError::ClassRegistration(PlatformError::ClassRegistration(_)))));
    assert_eq!(event_loop.live_windows(), 0);
    assert_eq!(system.pending_quit(), None);
}

#[test]
fn failed_handle_creation_leaves_count_unchanged() {
    let (system, event_loop) = setup();
    let _existing = open(&event_loop, "Existing");
    system.fail_next_window_creation();

    let result = Window::create(&event_loop, &CreateOptions::new("Doomed"));
    assert!(matches!(result, Err(WindowError::HandleCreation)));
    assert_eq!(event_loop.live_windows(), 1);
    assert_eq!(system.window_count(), 1);
    assert_eq!(system.class_count(), 1);
    assert_eq!(system.pending_quit(), None);
}

#[test]
fn interior_nul_in_title_is_rejected() {
    let (system, event_loop) = setup();
    let result = Window::create(&event_loop, &CreateOptions::new("bad\0title"));

    assert!(matches!(
        result,
        Err(WindowError::Encoding(EncodingError::InteriorNul { position: 3 }))
    ));
    assert_eq!(event_loop.live_windows(), 0);
    assert_eq!(system.class_count(), 0);
}

#[test]
fn deinit_leaves_native_window_alone() {
    let (system, event_loop) = setup();
    let window = open(&event_loop, "Released");
    let handle = window.handle().unwrap();
    window.deinit();

    assert!(system.is_window(handle));
    assert_eq!(event_loop.live_windows(), 1);

    system.post_message(handle, Message::Close).unwrap();
    assert_eq!(event_loop.pump_pending().unwrap(), PumpStatus::Quit(0));
}

#[test]
fn closing_a_destroyed_window_is_an_error() {
    let (_system, event_loop) = setup();
    event_loop.set_handler(|_, target| target.exit());
    let _keep = open(&event_loop, "Keep");
    let window = open(&event_loop, "Gone");

    window.request_close().unwrap();
    event_loop.pump_pending().unwrap();
    assert!(matches!(window.request_close(), Err(PlatformError::MessagePost(_))));
}

#[test]
fn headless_windows_have_no_raw_handle() {
    let (_system, event_loop) = setup();
    let window = open(&event_loop, "Raw");
    assert!(window.raw_window_handle().is_none());
}
