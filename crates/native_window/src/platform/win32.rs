//! Win32 window system
//!
//! Classes registered here all share one window procedure, [`wnd_proc`]. It
//! finds the crate-level procedure (the message bridge) for each `HWND`
//! through a thread-local table filled in during `WM_NCCREATE` from the
//! creation context, translates the message, and falls back to
//! `DefWindowProcW` whenever the procedure asks for default processing.
//!
//! All access happens on the thread that created the windows; Win32 delivers
//! messages for a window only on its creating thread, which is why the
//! tables are thread-local.

#![allow(unsafe_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::c_void;
use std::rc::Rc;

use raw_window_handle::{RawWindowHandle, Win32WindowHandle};
use windows::{
    core::PCWSTR,
    Win32::{
        Foundation::{BOOL, HINSTANCE, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::{
            Dwm::{DwmSetWindowAttribute, DWMWA_USE_IMMERSIVE_DARK_MODE},
            Gdi::{
                GetStockObject, GetSysColorBrush, InvalidateRect, UpdateWindow, BLACK_BRUSH,
                COLOR_WINDOW, HBRUSH, WHITE_BRUSH,
            },
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::WindowsAndMessaging::{
            CreateWindowExW, DefWindowProcW, DestroyWindow, DispatchMessageW, GetMessageW,
            GetSystemMetrics, IsWindow, LoadCursorW, LoadIconW, PeekMessageW, PostMessageW,
            PostQuitMessage, RegisterClassExW, ShowWindow, TranslateMessage, UnregisterClassW,
            CREATESTRUCTW,
            CS_HREDRAW, CS_VREDRAW, CW_USEDEFAULT, HMENU, IDC_ARROW, IDI_APPLICATION, MSG,
            PM_REMOVE, SM_CXSCREEN, SM_CYSCREEN, SW_MAXIMIZE, SW_MINIMIZE, SW_RESTORE,
            WINDOW_EX_STYLE, WINDOW_STYLE, WM_CLOSE, WM_DESTROY, WM_NCCREATE, WM_NCDESTROY,
            WM_PAINT, WM_QUIT, WM_SIZE, WNDCLASSEXW,
        },
    },
};

use super::{
    Background, CreateParam, Message, NativeHandle, NextMessage, PlatformError, QueuedMessage,
    RawMessage, Reply, ShowCommand, WindowClass, WindowDescriptor, WindowProcedure, WindowSystem,
};
use crate::foundation::text::NativeText;

/// Data handed to `wnd_proc` through `lpCreateParams`
///
/// Lives on `create_window`'s stack; `WM_NCCREATE` is delivered before
/// `CreateWindowExW` returns, so the pointer is valid whenever it is read.
struct CreateContext {
    procedure: Rc<dyn WindowProcedure>,
    param: Option<CreateParam>,
    class: String,
}

struct WindowEntry {
    procedure: Rc<dyn WindowProcedure>,
    class: String,
}

thread_local! {
    /// Procedure per registered class name
    static CLASS_PROCEDURES: RefCell<HashMap<String, Rc<dyn WindowProcedure>>> =
        RefCell::new(HashMap::new());

    /// Procedure per live window, from WM_NCCREATE to WM_NCDESTROY
    static WINDOW_PROCEDURES: RefCell<HashMap<NativeHandle, WindowEntry>> =
        RefCell::new(HashMap::new());

    /// Classes whose window has received WM_NCDESTROY; unregistered once the
    /// destroying call has returned and the window no longer exists
    static RETIRED_CLASSES: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

/// Win32 window system for the calling thread
pub struct Win32System {
    hinstance: HINSTANCE,
}

impl Win32System {
    /// Window system for the current module
    pub fn new() -> Result<Self, PlatformError> {
        // SAFETY: no module name asks for the executable's own handle.
        let module = unsafe { GetModuleHandleW(None) }
            .map_err(|err| PlatformError::ClassRegistration(format!("module handle unavailable: {}", err)))?;
        Ok(Self { hinstance: HINSTANCE(module.0) })
    }

    fn current() -> Self {
        Self::new().unwrap_or(Self { hinstance: HINSTANCE::default() })
    }

    fn release_retired_classes(&self) {
        let retired = RETIRED_CLASSES.with(|retired| std::mem::take(&mut *retired.borrow_mut()));
        for name in retired {
            match NativeText::new(&name) {
                Ok(name) => {
                    if !self.unregister_class(&name) {
                        log::debug!("Class {} could not be unregistered", name);
                    }
                }
                Err(err) => log::warn!("Cannot encode retired class name {}: {}", name, err),
            }
        }
    }

    fn background_brush(background: Background) -> HBRUSH {
        // SAFETY: stock objects and system colour brushes are owned by the
        // system and never need freeing.
        unsafe {
            match background {
                Background::Window => GetSysColorBrush(COLOR_WINDOW),
                Background::White => HBRUSH(GetStockObject(WHITE_BRUSH).0),
                Background::Black => HBRUSH(GetStockObject(BLACK_BRUSH).0),
            }
        }
    }
}

fn handle_of(hwnd: HWND) -> NativeHandle {
    NativeHandle::from_raw(hwnd.0 as usize as u64)
}

fn hwnd_of(handle: NativeHandle) -> HWND {
    HWND(handle.raw() as usize as *mut c_void)
}

fn to_coordinate(value: Option<i32>) -> i32 {
    value.unwrap_or(CW_USEDEFAULT)
}

fn to_extent(value: Option<u32>) -> i32 {
    value.map_or(CW_USEDEFAULT, |v| i32::try_from(v).unwrap_or(i32::MAX))
}

fn loword(value: isize) -> u32 {
    (value as usize & 0xFFFF) as u32
}

fn hiword(value: isize) -> u32 {
    ((value as usize >> 16) & 0xFFFF) as u32
}

fn translate(id: u32, lparam: LPARAM) -> Message {
    match id {
        WM_CLOSE => Message::Close,
        WM_DESTROY => Message::Destroy,
        WM_PAINT => Message::Paint,
        WM_SIZE => Message::Resize { width: loword(lparam.0), height: hiword(lparam.0) },
        other => Message::Other { id: other },
    }
}

fn message_id(message: &Message) -> Option<u32> {
    match message {
        Message::Create { .. } => None,
        Message::Close => Some(WM_CLOSE),
        Message::Destroy => Some(WM_DESTROY),
        Message::Paint => Some(WM_PAINT),
        Message::Resize { .. } => Some(WM_SIZE),
        Message::Other { id } => Some(*id),
    }
}

fn queued_from(msg: &MSG) -> QueuedMessage {
    QueuedMessage {
        handle: (!msg.hwnd.is_invalid()).then(|| handle_of(msg.hwnd)),
        message: translate(msg.message, msg.lParam),
        raw: RawMessage { id: msg.message, wparam: msg.wParam.0, lparam: msg.lParam.0 },
    }
}

/// Map a procedure's reply onto the value Win32 expects
unsafe fn finish(reply: Reply, hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    match reply {
        Reply::Handled => LRESULT(0),
        Reply::Default => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
    }
}

// SAFETY: registered as `lpfnWndProc`; Windows guarantees the args are valid.
unsafe extern "system" fn wnd_proc(hwnd: HWND, msg: u32, wparam: WPARAM, lparam: LPARAM) -> LRESULT {
    let handle = handle_of(hwnd);
    let system = Win32System::current();

    if msg == WM_NCCREATE {
        // SAFETY: for WM_NCCREATE, lparam points to the CREATESTRUCTW of the
        // CreateWindowExW call in progress.
        let create = unsafe { &*(lparam.0 as *const CREATESTRUCTW) };
        let context = create.lpCreateParams as *const CreateContext;
        if !context.is_null() {
            // SAFETY: see CreateContext; the pointee outlives this call.
            let context = unsafe { &*context };
            WINDOW_PROCEDURES.with(|table| {
                table.borrow_mut().insert(
                    handle,
                    WindowEntry {
                        procedure: Rc::clone(&context.procedure),
                        class: context.class.clone(),
                    },
                );
            });
            let reply = context.procedure.handle_message(
                &system,
                handle,
                Message::Create { param: context.param.clone() },
            );
            return unsafe { finish(reply, hwnd, msg, wparam, lparam) };
        }
    }

    let procedure = WINDOW_PROCEDURES.with(|table| {
        table.borrow().get(&handle).map(|entry| Rc::clone(&entry.procedure))
    });
    let Some(procedure) = procedure else {
        return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
    };

    let reply = procedure.handle_message(&system, handle, translate(msg, lparam));
    if msg == WM_NCDESTROY {
        if let Some(entry) = WINDOW_PROCEDURES.with(|table| table.borrow_mut().remove(&handle)) {
            RETIRED_CLASSES.with(|retired| retired.borrow_mut().push(entry.class));
        }
    }
    unsafe { finish(reply, hwnd, msg, wparam, lparam) }
}

impl WindowSystem for Win32System {
    fn name(&self) -> &'static str {
        "win32"
    }

    fn register_class(&self, class: &WindowClass<'_>) -> Result<(), PlatformError> {
        // SAFETY: loading stock resources with a null instance.
        let icon = unsafe { LoadIconW(None, IDI_APPLICATION) }
            .map_err(|err| PlatformError::ClassRegistration(err.to_string()))?;
        let cursor = unsafe { LoadCursorW(None, IDC_ARROW) }
            .map_err(|err| PlatformError::ClassRegistration(err.to_string()))?;

        let wndclass = WNDCLASSEXW {
            cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
            style: CS_HREDRAW | CS_VREDRAW,
            lpfnWndProc: Some(wnd_proc),
            hInstance: self.hinstance,
            hIcon: icon,
            hCursor: cursor,
            hbrBackground: Self::background_brush(class.background),
            lpszClassName: PCWSTR(class.name.as_wide_ptr()),
            hIconSm: icon,
            ..Default::default()
        };

        // SAFETY: wndclass is fully initialised and the class name buffer is
        // null-terminated; Windows copies it during the call.
        let atom = unsafe { RegisterClassExW(&wndclass) };
        if atom == 0 {
            let err = windows::core::Error::from_win32();
            return Err(PlatformError::ClassRegistration(err.to_string()));
        }

        CLASS_PROCEDURES.with(|table| {
            table
                .borrow_mut()
                .insert(class.name.as_str().to_string(), Rc::clone(&class.procedure));
        });
        Ok(())
    }

    fn unregister_class(&self, name: &NativeText) -> bool {
        // SAFETY: the name buffer is null-terminated and outlives the call.
        let unregistered = unsafe { UnregisterClassW(PCWSTR(name.as_wide_ptr()), self.hinstance) }.is_ok();
        if unregistered {
            CLASS_PROCEDURES.with(|table| {
                table.borrow_mut().remove(name.as_str());
            });
            log::trace!("Unregistered class {}", name);
        }
        unregistered
    }

    fn create_window(&self, descriptor: &WindowDescriptor<'_>, param: Option<CreateParam>) -> Option<NativeHandle> {
        let procedure = CLASS_PROCEDURES.with(|table| table.borrow().get(descriptor.class.as_str()).cloned())?;
        let context = CreateContext {
            procedure,
            param,
            class: descriptor.class.as_str().to_string(),
        };

        // SAFETY: both strings are null-terminated and outlive the call;
        // `context` outlives the call and is only read during WM_NCCREATE.
        let result = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                PCWSTR(descriptor.class.as_wide_ptr()),
                PCWSTR(descriptor.title.as_wide_ptr()),
                WINDOW_STYLE(descriptor.style.bits()),
                to_coordinate(descriptor.x),
                to_coordinate(descriptor.y),
                to_extent(descriptor.width),
                to_extent(descriptor.height),
                HWND::default(),
                HMENU::default(),
                self.hinstance,
                Some(std::ptr::addr_of!(context).cast::<c_void>()),
            )
        };

        match result {
            Ok(hwnd) if !hwnd.is_invalid() => Some(handle_of(hwnd)),
            Ok(_) => None,
            Err(err) => {
                log::error!("CreateWindowExW failed: {}", err);
                None
            }
        }
    }

    fn destroy_window(&self, handle: NativeHandle) -> bool {
        if !self.is_window(handle) {
            return false;
        }
        // SAFETY: the handle refers to a live window owned by this thread.
        let destroyed = unsafe { DestroyWindow(hwnd_of(handle)) }.is_ok();
        self.release_retired_classes();
        destroyed
    }

    fn is_window(&self, handle: NativeHandle) -> bool {
        // SAFETY: IsWindow accepts any value.
        unsafe { IsWindow(hwnd_of(handle)) }.as_bool()
    }

    fn show_window(&self, handle: NativeHandle, command: ShowCommand) {
        let command = match command {
            ShowCommand::Minimize => SW_MINIMIZE,
            ShowCommand::Maximize => SW_MAXIMIZE,
            ShowCommand::Restore => SW_RESTORE,
        };
        // SAFETY: the return value only reports previous visibility.
        unsafe {
            let _ = ShowWindow(hwnd_of(handle), command);
        }
    }

    fn redraw(&self, handle: NativeHandle) {
        let hwnd = hwnd_of(handle);
        // SAFETY: both calls tolerate stale handles.
        unsafe {
            let _ = InvalidateRect(hwnd, None, BOOL::from(true));
            let _ = UpdateWindow(hwnd);
        }
    }

    fn set_dark_mode(&self, handle: NativeHandle, dark: bool) -> Result<(), PlatformError> {
        let value = BOOL::from(dark);
        // SAFETY: `value` is a BOOL living across the call, as the attribute requires.
        unsafe {
            DwmSetWindowAttribute(
                hwnd_of(handle),
                DWMWA_USE_IMMERSIVE_DARK_MODE,
                std::ptr::addr_of!(value).cast::<c_void>(),
                std::mem::size_of::<BOOL>() as u32,
            )
        }
        .map_err(|err| PlatformError::Attribute(err.to_string()))
    }

    fn post_message(&self, handle: NativeHandle, message: Message) -> Result<(), PlatformError> {
        let id = match message {
            Message::Close => WM_CLOSE,
            Message::Other { id } => id,
            _ => return Err(PlatformError::Unsupported("only close and raw messages can be posted")),
        };
        // SAFETY: posting never dereferences the parameters.
        unsafe { PostMessageW(hwnd_of(handle), id, WPARAM(0), LPARAM(0)) }
            .map_err(|err| PlatformError::MessagePost(err.to_string()))
    }

    fn next_message(&self, wait: bool) -> NextMessage {
        let mut msg = MSG::default();
        if wait {
            // SAFETY: msg is a valid out-parameter.
            let ret = unsafe { GetMessageW(&mut msg, HWND::default(), 0, 0) };
            return match ret.0 {
                -1 => NextMessage::Failed(PlatformError::MessageRetrieval(
                    windows::core::Error::from_win32().to_string(),
                )),
                0 => NextMessage::Quit(msg.wParam.0 as i32),
                _ => NextMessage::Message(queued_from(&msg)),
            };
        }

        // SAFETY: msg is a valid out-parameter.
        let found = unsafe { PeekMessageW(&mut msg, HWND::default(), 0, 0, PM_REMOVE) }.as_bool();
        if !found {
            NextMessage::Empty
        } else if msg.message == WM_QUIT {
            NextMessage::Quit(msg.wParam.0 as i32)
        } else {
            NextMessage::Message(queued_from(&msg))
        }
    }

    fn dispatch_message(&self, queued: QueuedMessage) {
        let msg = MSG {
            hwnd: queued.handle.map_or(HWND::default(), hwnd_of),
            message: queued.raw.id,
            wParam: WPARAM(queued.raw.wparam),
            lParam: LPARAM(queued.raw.lparam),
            ..Default::default()
        };
        // SAFETY: msg was produced by GetMessageW/PeekMessageW on this thread.
        unsafe {
            let _ = TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
        self.release_retired_classes();
    }

    fn post_quit(&self, exit_code: i32) {
        // SAFETY: always valid on a thread with a message queue.
        unsafe { PostQuitMessage(exit_code) };
    }

    fn default_procedure(&self, handle: NativeHandle, message: &Message) -> isize {
        let Some(id) = message_id(message) else {
            return 0;
        };
        // SAFETY: default processing of a parameterless message.
        unsafe { DefWindowProcW(hwnd_of(handle), id, WPARAM(0), LPARAM(0)) }.0
    }

    fn screen_size(&self) -> (u32, u32) {
        // SAFETY: plain metric queries.
        let (width, height) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
        (u32::try_from(width).unwrap_or(0), u32::try_from(height).unwrap_or(0))
    }

    fn raw_window_handle(&self, handle: NativeHandle) -> Option<RawWindowHandle> {
        let mut raw = Win32WindowHandle::empty();
        raw.hwnd = hwnd_of(handle).0;
        raw.hinstance = self.hinstance.0;
        Some(RawWindowHandle::Win32(raw))
    }
}
