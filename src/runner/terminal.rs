//! Terminal emulation variants selected by the `term` option (§4.6).

use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalKind {
    Dumb,
    Ansi,
    AsIs,
}

impl FromStr for TerminalKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dumb" => Ok(TerminalKind::Dumb),
            "ansi" => Ok(TerminalKind::Ansi),
            "as-is" => Ok(TerminalKind::AsIs),
            other => Err(anyhow::anyhow!("unknown term kind {other:?}")),
        }
    }
}

impl fmt::Display for TerminalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TerminalKind::Dumb => "dumb",
            TerminalKind::Ansi => "ansi",
            TerminalKind::AsIs => "as-is",
        })
    }
}

fn normalize_newlines(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace('\r', "\n")
}

fn rstrip_lines(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n")
}

fn expand_tabs(line: &str, tabstop: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut col = 0;
    for ch in line.chars() {
        if ch == '\t' {
            let spaces = tabstop - (col % tabstop);
            out.extend(std::iter::repeat(' ').take(spaces));
            col += spaces;
        } else {
            out.push(ch);
            col += 1;
        }
    }
    out
}

/// `dumb`: normalize newlines, expand tabs to 8 columns, rstrip each line.
pub fn render_dumb(raw: &str) -> String {
    let normalized = normalize_newlines(raw);
    let expanded: Vec<String> = normalized.lines().map(|l| expand_tabs(l, 8)).collect();
    rstrip_lines(&expanded.join("\n"))
}

/// `as-is`: concatenate with newline normalization only.
pub fn render_as_is(raw: &str) -> String {
    normalize_newlines(raw)
}

/// `ansi`: feed the raw bytes through a full VT100 screen emulator and
/// render its final display, rstripping each line.
pub fn render_ansi(raw: &[u8], rows: u16, cols: u16) -> String {
    let mut parser = vt100::Parser::new(rows, cols, 0);
    parser.process(raw);
    let screen = parser.screen();
    let contents = screen.contents();
    rstrip_lines(&contents)
}

pub fn render(raw: &str, raw_bytes: &[u8], kind: TerminalKind, rows: u16, cols: u16) -> String {
    match kind {
        TerminalKind::Dumb => render_dumb(raw),
        TerminalKind::AsIs => render_as_is(raw),
        TerminalKind::Ansi => render_ansi(raw_bytes, rows, cols),
    }
}
