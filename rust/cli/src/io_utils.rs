//! Line input helpers for the console.

use std::io::BufRead;
use std::path::Path;

/// Reads a line of input from a buffered reader, blocking until available.
///
/// Returns the trimmed line, or `None` on EOF or a read error.
///
/// ```rust
/// # use netchess_cli::io_utils::read_stdin_line;
/// let mut input = std::io::Cursor::new("Begin\n");
/// assert_eq!(read_stdin_line(&mut input).as_deref(), Some("Begin"));
/// assert_eq!(read_stdin_line(&mut input), None);
/// ```
pub fn read_stdin_line(stdin: &mut dyn BufRead) -> Option<String> {
    let mut line = String::new();
    match stdin.read_line(&mut line) {
        Ok(0) => None, // EOF
        Ok(_) => Some(line.trim().to_string()),
        Err(_) => None,
    }
}

/// Console lines from a script file. Blank lines and `#` comments are skipped.
pub fn read_script(path: &Path) -> std::io::Result<Vec<String>> {
    let mut content = std::fs::read_to_string(path)?;
    strip_utf8_bom(&mut content);
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect())
}

fn strip_utf8_bom(s: &mut String) {
    const UTF8_BOM: &str = "\u{feff}";
    if s.starts_with(UTF8_BOM) {
        s.drain(..UTF8_BOM.len());
    }
}
