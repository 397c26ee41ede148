//! Line-oriented operator prompts.
//!
//! Prompts go to stderr so stdout only carries results. Input is read one
//! line at a time; end-of-input is reported as `None`. A line that is not
//! valid UTF-8 is reported and asked for again.

use std::io::{self, BufRead, Write};

/// Source of operator answers.
pub trait Prompt {
    /// Show `label` and read one line with the trailing newline removed.
    /// Returns `None` at end of input.
    fn line(&mut self, label: &str) -> io::Result<Option<String>>;

    /// Print an informational message for the operator.
    fn say(&mut self, message: &str) -> io::Result<()>;
}

/// Prompt backed by any reader/writer pair.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on the process's stdin/stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn line(&mut self, label: &str) -> io::Result<Option<String>> {
        loop {
            write!(self.output, "{}", label)?;
            self.output.flush()?;

            let mut input = Vec::new();
            if self.input.read_until(b'\n', &mut input)? == 0 {
                return Ok(None);
            }
            match String::from_utf8(input) {
                Ok(text) => return Ok(Some(text.trim_end_matches(['\n', '\r']).to_string())),
                Err(_) => writeln!(self.output, "[WARN] Input is not valid UTF-8, try again")?,
            }
        }
    }

    fn say(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{}", message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_reads_lines_until_eof() {
        let mut prompt = TerminalPrompt::new(Cursor::new("first\r\nsecond\n"), Vec::new());
        assert_eq!(prompt.line("A: ").unwrap().as_deref(), Some("first"));
        assert_eq!(prompt.line("B: ").unwrap().as_deref(), Some("second"));
        assert_eq!(prompt.line("C: ").unwrap(), None);

        let shown = String::from_utf8(prompt.into_output()).unwrap();
        assert_eq!(shown, "A: B: C: ");
    }

    #[test]
    fn test_empty_line_is_not_eof() {
        let mut prompt = TerminalPrompt::new(Cursor::new("\n"), Vec::new());
        assert_eq!(prompt.line("").unwrap().as_deref(), Some(""));
        assert_eq!(prompt.line("").unwrap(), None);
    }

    #[test]
    fn test_invalid_utf8_line_is_asked_again() {
        let input: &[u8] = b"\xff\xfe\nok\n";
        let mut prompt = TerminalPrompt::new(Cursor::new(input), Vec::new());
        assert_eq!(prompt.line("IP: ").unwrap().as_deref(), Some("ok"));

        let shown = String::from_utf8(prompt.into_output()).unwrap();
        assert_eq!(shown, "IP: [WARN] Input is not valid UTF-8, try again\nIP: ");
    }

    #[test]
    fn test_invalid_utf8_then_eof() {
        let input: &[u8] = b"\xff";
        let mut prompt = TerminalPrompt::new(Cursor::new(input), Vec::new());
        assert_eq!(prompt.line("").unwrap(), None);
    }

    #[test]
    fn test_say_appends_newline() {
        let mut prompt = TerminalPrompt::new(Cursor::new(""), Vec::new());
        prompt.say("hello").unwrap();
        assert_eq!(prompt.into_output(), b"hello\n");
    }
}
