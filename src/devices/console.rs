use std::io::{self, BufRead, Write};

use super::{Console, ENTER_KEY};

/// Line oriented keypad/display over any reader and writer.
pub struct LineConsole<R, W> {
    input: R,
    output: W,
}

impl<R, W> LineConsole<R, W>
where
    R: BufRead,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R, W> Console for LineConsole<R, W>
where
    R: BufRead,
    W: Write,
{
    fn prompt(&mut self, message: &str) -> io::Result<()> {
        writeln!(self.output, "{message}")?;
        self.output.flush()
    }

    fn read_line(&mut self) -> io::Result<String> {
        let mut entry = String::new();
        if self.input.read_line(&mut entry)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "keypad input closed",
            ));
        }
        let trimmed = entry.trim_end_matches([ENTER_KEY, '\r']).len();
        entry.truncate(trimmed);
        Ok(entry)
    }

    fn read_char(&mut self) -> io::Result<char> {
        let entry = self.read_line()?;
        Ok(entry.chars().next().unwrap_or(ENTER_KEY))
    }
}
