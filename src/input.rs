//! Input handling module
//!
//! Plain line prompts plus masked password entry. Masking is a small state
//! machine (`MaskBuffer`) fed one key at a time from a `KeySource`: the
//! crossterm terminal in raw mode when stdin is a TTY, or raw bytes when
//! input is piped.

use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::io::{self, BufRead, IsTerminal, Read, Write};

/// Default placeholder echoed per typed character
pub const DEFAULT_MASK_CHAR: char = '*';

/// Default maximum number of buffered password characters
pub const DEFAULT_MAX_LEN: usize = 127;

/// A keystroke as seen by the masking state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskKey {
    /// Newline or carriage return
    Enter,
    /// Backspace or delete
    Erase,
    /// Any character; non-printable ones are ignored
    Char(char),
    /// Keys with no meaning for masked entry
    Ignored,
}

/// Result of feeding one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaskStep {
    Continue,
    Done,
}

/// Buffer for masked entry. Echo goes to any `Write`.
#[derive(Debug, Clone)]
pub struct MaskBuffer {
    buf: String,
    mask: char,
    max_len: usize,
}

impl MaskBuffer {
    pub fn new(mask: char, max_len: usize) -> Self {
        Self {
            buf: String::new(),
            mask,
            max_len,
        }
    }

    /// Apply one key, echoing mask characters or erase sequences to `echo`.
    pub fn feed<W: Write>(&mut self, key: MaskKey, echo: &mut W) -> io::Result<MaskStep> {
        match key {
            MaskKey::Enter => return Ok(MaskStep::Done),
            MaskKey::Erase => {
                if self.buf.pop().is_some() {
                    echo.write_all(b"\x08 \x08")?;
                }
            }
            MaskKey::Char(c) if is_printable(c) && self.buf.chars().count() < self.max_len => {
                self.buf.push(c);
                write!(echo, "{}", self.mask)?;
            }
            MaskKey::Char(_) | MaskKey::Ignored => {}
        }
        echo.flush()?;
        Ok(MaskStep::Continue)
    }

    pub fn as_str(&self) -> &str {
        &self.buf
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

fn is_printable(c: char) -> bool {
    !c.is_control()
}

/// Source of keystrokes for masked entry. `Ok(None)` means end of input.
pub trait KeySource {
    fn next_key(&mut self) -> io::Result<Option<MaskKey>>;
}

/// Keys decoded from a raw byte stream (piped stdin, test fixtures).
pub struct ByteKeys<R: Read> {
    bytes: io::Bytes<R>,
}

impl<R: Read> ByteKeys<R> {
    pub fn new(reader: R) -> Self {
        Self {
            bytes: reader.bytes(),
        }
    }
}

impl<R: Read> KeySource for ByteKeys<R> {
    fn next_key(&mut self) -> io::Result<Option<MaskKey>> {
        let Some(byte) = self.bytes.next().transpose()? else {
            return Ok(None);
        };
        Ok(Some(match byte {
            b'\n' | b'\r' => MaskKey::Enter,
            0x7f | 0x08 => MaskKey::Erase,
            b if b.is_ascii() => MaskKey::Char(b as char),
            _ => MaskKey::Ignored,
        }))
    }
}

/// Keys read from the terminal through crossterm. Raw mode must already be on.
pub struct TerminalKeys;

impl KeySource for TerminalKeys {
    fn next_key(&mut self) -> io::Result<Option<MaskKey>> {
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            return Ok(Some(match key.code {
                KeyCode::Enter => MaskKey::Enter,
                KeyCode::Backspace | KeyCode::Delete => MaskKey::Erase,
                KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    MaskKey::Ignored
                }
                KeyCode::Char(c) => MaskKey::Char(c),
                _ => MaskKey::Ignored,
            }));
        }
    }
}

/// Reads one line of text without echoing it.
pub struct MaskedInput<K: KeySource> {
    keys: K,
    mask: char,
    max_len: usize,
}

impl<K: KeySource> MaskedInput<K> {
    pub fn new(keys: K) -> Self {
        Self::with_options(keys, DEFAULT_MASK_CHAR, DEFAULT_MAX_LEN)
    }

    pub fn with_options(keys: K, mask: char, max_len: usize) -> Self {
        Self {
            keys,
            mask,
            max_len,
        }
    }

    /// Read until Enter. Returns `None` if input ended before anything was typed.
    pub fn read<W: Write>(&mut self, echo: &mut W) -> io::Result<Option<String>> {
        let mut buffer = MaskBuffer::new(self.mask, self.max_len);
        loop {
            match self.keys.next_key()? {
                Some(key) => {
                    if buffer.feed(key, echo)? == MaskStep::Done {
                        return Ok(Some(buffer.into_string()));
                    }
                }
                None if buffer.as_str().is_empty() => return Ok(None),
                None => return Ok(Some(buffer.into_string())),
            }
        }
    }
}

/// Restores cooked mode when dropped
struct RawModeGuard;

impl RawModeGuard {
    fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            tracing::warn!("Failed to restore terminal mode: {}", e);
        }
    }
}

/// Line-oriented user interaction used by the session and menu layers.
///
/// `Ok(None)` from a read means the input stream is exhausted.
pub trait Prompt {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>>;
    fn say(&mut self, msg: &str);
}

/// Prompt backed by the process stdin/stdout
pub struct TerminalPrompt {
    mask: char,
    max_len: usize,
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new(DEFAULT_MASK_CHAR, DEFAULT_MAX_LEN)
    }
}

impl TerminalPrompt {
    pub fn new(mask: char, max_len: usize) -> Self {
        Self { mask, max_len }
    }
}

impl Prompt for TerminalPrompt {
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout();
        write!(stdout, "{}", prompt)?;
        stdout.flush()?;

        let secret = if io::stdin().is_terminal() {
            let _raw = RawModeGuard::enable()?;
            MaskedInput::with_options(TerminalKeys, self.mask, self.max_len).read(&mut stdout)?
        } else {
            let stdin = io::stdin().lock();
            MaskedInput::with_options(ByteKeys::new(stdin), self.mask, self.max_len)
                .read(&mut stdout)?
        };
        writeln!(stdout)?;
        Ok(secret)
    }

    fn say(&mut self, msg: &str) {
        println!("{}", msg);
    }
}
