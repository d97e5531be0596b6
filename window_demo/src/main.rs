//! Two-window demo
//!
//! Opens two windows on one event loop and exits once both are closed.
//!
//! ```text
//! window_demo [--headless] [options.toml|options.ron]
//! ```
//!
//! With `--headless` (the only mode off Windows) the windows live in the
//! in-process window system and the demo closes them itself.

use std::rc::Rc;

use native_window::foundation::logging;
use native_window::prelude::*;

struct Args {
    headless: bool,
    options_path: Option<String>,
}

impl Args {
    fn parse() -> Self {
        let mut args = Self {
            headless: !cfg!(windows),
            options_path: None,
        };
        for arg in std::env::args().skip(1) {
            match arg.as_str() {
                "--headless" => args.headless = true,
                _ => args.options_path = Some(arg),
            }
        }
        args
    }
}

fn load_options(path: Option<&str>) -> Result<CreateOptions, ConfigError> {
    match path {
        Some(path) => {
            log::info!("Loading window options from {}", path);
            CreateOptions::load_from_file(path)
        }
        None => Ok(CreateOptions::new("Native Window Demo").with_size(800, 600)),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init();

    let args = Args::parse();
    let options = load_options(args.options_path.as_deref())?;

    let event_loop = if args.headless {
        log::info!("Running on the headless window system");
        EventLoop::headless()
    } else {
        EventLoop::native()?
    };

    event_loop.set_handler(|event, target| {
        if event == Event::Close {
            log::info!("Close requested for window {}", target.handle());
            target.exit();
        }
    });

    let main_window = Window::create(&event_loop, &options)?;
    let secondary = Window::create(
        &event_loop,
        &options
            .clone()
            .with_title(format!("{} (secondary)", options.title))
            .with_theme(Theme::Light),
    )?;
    log::info!("{} window(s) open", event_loop.live_windows());

    let code = if args.headless {
        match close_all(&event_loop, &[&main_window, &secondary])? {
            Some(code) => code,
            None => event_loop.run()?,
        }
    } else {
        event_loop.run()?
    };
    log::info!("Event loop finished with exit code {}", code);
    Ok(())
}

/// Close every window the way a user would, pumping after each request
///
/// Returns the exit code if the quit signal was seen along the way.
fn close_all(event_loop: &Rc<EventLoop>, windows: &[&Window]) -> Result<Option<i32>, Box<dyn std::error::Error>> {
    for window in windows {
        window.request_close()?;
        match event_loop.pump_pending()? {
            PumpStatus::Quit(code) => return Ok(Some(code)),
            PumpStatus::Pending => log::info!("{} window(s) still open", event_loop.live_windows()),
        }
    }
    Ok(None)
}
