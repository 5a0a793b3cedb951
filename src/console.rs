//! Prompt rendering and line reading for the REPL.
//!
//! The engine core has no opinion on how a line of input arrives; this
//! module is the plain stdio collaborator the REPL uses to read one.

use std::io::{self, Write};

pub const PROMPT: &str = "db > ";

/// Prints the prompt with no trailing newline and flushes so it is visible
/// before `read_line` blocks.
pub fn print_prompt() -> io::Result<()> {
    print!("{}", PROMPT);
    io::stdout().flush()
}

/// Reads one line from stdin, stripping the trailing newline. Returns
/// `Ok(None)` on EOF (e.g. piped input has run out, or the terminal sent
/// Ctrl-D).
pub fn read_line() -> io::Result<Option<String>> {
    let mut buf = String::new();
    let n = io::stdin().read_line(&mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.ends_with('\n') {
        buf.pop();
        if buf.ends_with('\r') {
            buf.pop();
        }
    }
    Ok(Some(buf))
}
