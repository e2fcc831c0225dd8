//! Terminal output.
//!
//! `log!` writes one `[module] message` line to stderr; `debug!` does the
//! same but only with `--verbose`. The watcher reports through a status
//! block that replaces itself on every update instead of scrolling.
//!
//! stdout belongs to command output (`build --style link|out`), so nothing
//! here ever touches it.
//!
//! ```ignore
//! log!("serve"; "http://{}", addr);
//! debug!("poll"; "subscriber {} registered", id);
//! status_success("updated: sequence.puml");
//! ```

use std::fmt;
use std::io::{IsTerminal, Write, stderr};
use std::sync::LazyLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crossterm::{
    cursor::MoveUp,
    queue,
    terminal::{Clear, ClearType},
};
use owo_colors::{OwoColorize, Stream, Style};
use parking_lot::Mutex;

static VERBOSE: AtomicBool = AtomicBool::new(false);

pub fn set_verbose(enabled: bool) {
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// `log!("module"; "format {}", args)`
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::write_line($module, format_args!($($arg)*))
    }};
}

/// Like `log!`, shown only with `--verbose`.
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::write_line($module, format_args!($($arg)*))
        }
    }};
}

/// Write `[module] message` to stderr.
pub fn write_line(module: &str, message: fmt::Arguments<'_>) {
    let tag = format!("[{module}]");
    let tag = tag.if_supports_color(Stream::Stderr, |t| t.style(tag_style(module)));

    let mut err = stderr().lock();
    let _ = writeln!(err, "{tag} {message}");
}

fn tag_style(module: &str) -> Style {
    let style = Style::new().bold();
    match module {
        "serve" => style.bright_blue(),
        "watch" => style.bright_green(),
        "poll" => style.bright_cyan(),
        "error" => style.bright_red(),
        _ => style.bright_yellow(),
    }
}

// ============================================================================
// Status block
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Success,
    Quiet,
    Failure,
}

/// Last watcher report, redrawn in place.
///
/// On a terminal the previous block is erased before the next one is
/// drawn; anywhere else reports simply accumulate.
pub struct StatusBlock {
    /// Height of the block currently on screen.
    drawn_lines: usize,
}

static STATUS: LazyLock<Mutex<StatusBlock>> = LazyLock::new(|| Mutex::new(StatusBlock::new()));

impl StatusBlock {
    pub const fn new() -> Self {
        Self { drawn_lines: 0 }
    }

    fn show(&mut self, mark: Mark, message: &str) {
        let mut err = stderr().lock();

        if self.drawn_lines > 0 && err.is_terminal() {
            let lines = u16::try_from(self.drawn_lines).unwrap_or(u16::MAX);
            let _ = queue!(err, MoveUp(lines), Clear(ClearType::FromCursorDown));
        }

        let _ = writeln!(err, "{}", render_line(mark, message));
        let _ = err.flush();

        self.drawn_lines = line_count(message);
    }
}

fn render_line(mark: Mark, message: &str) -> String {
    let time = format!("[{}]", chrono::Local::now().format("%H:%M:%S"));
    let time = time.if_supports_color(Stream::Stderr, |t| t.dimmed());

    match mark {
        Mark::Success => {
            let check = "✓".if_supports_color(Stream::Stderr, |t| t.green());
            format!("{time} {check} {message}")
        }
        Mark::Failure => {
            let cross = "✗".if_supports_color(Stream::Stderr, |t| t.red());
            format!("{time} {cross} {message}")
        }
        Mark::Quiet => {
            let message = message.if_supports_color(Stream::Stderr, |t| t.dimmed());
            format!("{time} {message}")
        }
    }
}

fn with_detail(summary: &str, detail: &str) -> String {
    match detail {
        "" => summary.to_string(),
        detail => format!("{summary}\n{detail}"),
    }
}

fn line_count(message: &str) -> usize {
    message.lines().count().max(1)
}

pub fn status_success(message: &str) {
    STATUS.lock().show(Mark::Success, message);
}

pub fn status_unchanged(message: &str) {
    STATUS.lock().show(Mark::Quiet, message);
}

/// Report a failure; `detail` goes on the following lines.
pub fn status_error(summary: &str, detail: &str) {
    STATUS.lock().show(Mark::Failure, &with_detail(summary, detail));
}
