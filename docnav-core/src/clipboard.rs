//! Clipboard writers
//!
//! [`ClipboardChain`] tries the system clipboard first and falls back to an
//! OSC 52 escape sequence, which most terminal emulators turn into a
//! clipboard write.

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::io::Write;

/// Something that can put text on a clipboard
pub trait ClipboardWriter {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Primary writer with a fallback
#[derive(Default)]
pub struct ClipboardChain {
    primary: Option<Box<dyn ClipboardWriter>>,
    fallback: Option<Box<dyn ClipboardWriter>>,
}

impl ClipboardChain {
    pub fn new(
        primary: Option<Box<dyn ClipboardWriter>>,
        fallback: Option<Box<dyn ClipboardWriter>>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// System clipboard when available, OSC 52 on stdout otherwise
    pub fn system() -> Self {
        #[cfg(feature = "clipboard")]
        let primary: Option<Box<dyn ClipboardWriter>> = Some(Box::new(SystemClipboard::default()));
        #[cfg(not(feature = "clipboard"))]
        let primary: Option<Box<dyn ClipboardWriter>> = None;

        Self::new(primary, Some(Box::new(Osc52Writer::new(std::io::stdout()))))
    }

    /// A chain that never succeeds
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Write `text`; false when every writer failed
    pub fn copy(&mut self, text: &str) -> bool {
        for (name, writer) in [("primary", &mut self.primary), ("fallback", &mut self.fallback)] {
            let Some(writer) = writer else {
                continue;
            };
            match writer.write_text(text) {
                Ok(()) => return true,
                Err(e) => log::debug!("{} clipboard failed: {:#}", name, e),
            }
        }
        false
    }
}

/// The desktop clipboard, opened on first use
#[cfg(feature = "clipboard")]
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

#[cfg(feature = "clipboard")]
impl ClipboardWriter for SystemClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let result = clipboard.set_text(text.to_owned());
        self.inner = Some(clipboard);
        result?;
        Ok(())
    }
}

/// Build the OSC 52 "set clipboard" sequence for `text`
pub fn osc52_sequence(text: &str) -> String {
    format!("\x1b]52;c;{}\x07", BASE64.encode(text.as_bytes()))
}

/// Writes OSC 52 sequences to a terminal
pub struct Osc52Writer<W: Write> {
    out: W,
}

impl<W: Write> Osc52Writer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ClipboardWriter for Osc52Writer<W> {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.out.write_all(osc52_sequence(text).as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}
