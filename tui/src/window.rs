//! Terminal Window Control
//!
//! Asks the hosting terminal emulator to maximize and go fullscreen using
//! the xterm window-manipulation sequences (`CSI 9 ; 1 t` and
//! `CSI 10 ; 1 t`). Terminals that don't support them ignore the bytes, so
//! the kiosk keeps running either way.

use std::fmt;
use std::io::{self, Write};

use crossterm::{Command, QueueableCommand};
use kiosk_core::{WindowError, WindowHandle};

/// Maximize the terminal window
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Maximize;

impl Command for Maximize {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        f.write_str("\x1b[9;1t")
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "window maximize needs an ANSI terminal",
        ))
    }
}

/// Enter or leave fullscreen
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fullscreen(pub bool);

impl Command for Fullscreen {
    fn write_ansi(&self, f: &mut impl fmt::Write) -> fmt::Result {
        if self.0 {
            f.write_str("\x1b[10;1t")
        } else {
            f.write_str("\x1b[10;0t")
        }
    }

    #[cfg(windows)]
    fn execute_winapi(&self) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "fullscreen needs an ANSI terminal",
        ))
    }
}

/// The terminal the kiosk is drawn in
pub struct TerminalWindow<W: Write + Send> {
    out: W,
}

impl TerminalWindow<io::Stdout> {
    /// Control the terminal on stdout
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> TerminalWindow<W> {
    /// Control the terminal behind `out`
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// The underlying writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn send(&mut self, command: impl Command) -> Result<(), WindowError> {
        self.out.queue(command)?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write + Send> WindowHandle for TerminalWindow<W> {
    fn maximize(&mut self) -> Result<(), WindowError> {
        self.send(Maximize)
    }

    fn set_fullscreen(&mut self, fullscreen: bool) -> Result<(), WindowError> {
        self.send(Fullscreen(fullscreen))
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

#[cfg(all(test, not(windows)))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequences_written() {
        let mut window = TerminalWindow::new(Vec::new());
        window.maximize().unwrap();
        window.set_fullscreen(true).unwrap();
        window.set_fullscreen(false).unwrap();

        let written = String::from_utf8(window.into_inner()).unwrap();
        assert_eq!(written, "\x1b[9;1t\x1b[10;1t\x1b[10;0t");
    }

    #[test]
    fn test_name() {
        assert_eq!(TerminalWindow::new(Vec::new()).name(), "terminal");
    }
}
