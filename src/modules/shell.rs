//! The `shell` language module: a `Finder`/`Parser`/`Runner` triple for
//! POSIX-shell examples introduced by a `$ ` prompt, with `> ` continuation
//! lines, kept in-tree as the reference implementation of those contracts.

use crate::error::CoreError;
use crate::harvest::finder::{normalize_and_recheck, FinderMatch};
use crate::harvest::{Example, Finder};
use crate::location::Where;
use crate::options::{OptionScope, OptionStack, OptionValue};
use crate::parser::{default_parse_option_tokens, Parser, CORE_LIST_OPTIONS};
use crate::runner::pty::PtyDriver;
use crate::runner::shebang::{ShebangTemplate, TokenValue};
use crate::runner::terminal::{self, TerminalKind};
use crate::runner::{Runner, RunnerState};
use anyhow::{Context, Result};
use fancy_regex::Regex as FancyRegex;
use portable_pty::CommandBuilder;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

fn shell_prompt_regex() -> &'static FancyRegex {
    static RE: OnceLock<FancyRegex> = OnceLock::new();
    RE.get_or_init(|| {
        FancyRegex::new(
            r"(?m)^(?P<indent>[ \t]*)(?P<snippet>\$[ ].*(?:\n(?P=indent)>[ ].*)*)\n(?P<expected>(?:(?!(?P=indent)[ \t]*\n)(?!(?P=indent)[ \t]*\$[ ])(?P=indent).*\n?)*)",
        )
        .expect("shell prompt regex is valid")
    })
}

/// Locates `$ `-prompted blocks, with `> `-prefixed continuation lines, and
/// everything that follows up to the next blank or prompt line as expected.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellFinder;

impl ShellFinder {
    pub fn new() -> Self {
        Self
    }
}

impl Finder for ShellFinder {
    fn id(&self) -> &'static str {
        "shell-prompt"
    }

    fn regex(&self) -> &FancyRegex {
        shell_prompt_regex()
    }

    fn language_of(&self, _options: &OptionStack, _indent: &str, _snippet: &str) -> Option<String> {
        Some("shell".to_string())
    }

    /// On top of the default indent normalization and self-recheck, strips
    /// the 2-character `$ `/`> ` prompt marker from every snippet line.
    fn snippet_and_expected(&self, m: &FinderMatch<'_>, where_: Where) -> Result<(String, String, Where), CoreError> {
        let (snippet, expected, where_) = normalize_and_recheck(self, m, where_)?;
        let bare = snippet
            .split('\n')
            .map(|line| line.get(2..).unwrap_or(""))
            .collect::<Vec<_>>()
            .join("\n");
        Ok((bare, expected, where_))
    }
}

fn options_string_regex() -> &'static regex::Regex {
    static RE: OnceLock<regex::Regex> = OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"(?m)#\s*byexample:\s*([^\n'\"]*)").unwrap())
}

/// Tokenizes the trailing `# byexample: ...` comment and adds the
/// `shell`/`stop-on-timeout`/`stop-on-silence` flags to the option vocabulary.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellParser;

impl ShellParser {
    pub fn new() -> Self {
        Self
    }
}

/// Option names `shell` recognizes on top of the core vocabulary.
const SHELL_KNOWN_OPTIONS: &[&str] = &[
    "norm_ws",
    "tags",
    "rm",
    "timeout",
    "geometry",
    "term",
    "x.dfl_timeout",
    "x.delaybeforesend",
    "stop_on_timeout",
    "stop_on_silence",
    "shell",
];

impl Parser for ShellParser {
    fn language(&self) -> &'static str {
        "shell"
    }

    fn options_string_regex(&self) -> &regex::Regex {
        options_string_regex()
    }

    fn known_options(&self) -> &'static [&'static str] {
        SHELL_KNOWN_OPTIONS
    }

    fn list_option_names(&self) -> &'static [&'static str] {
        CORE_LIST_OPTIONS
    }

    /// Same `+name`/`-name`/`+name=value` grammar as the default, but
    /// normalizes hyphenated flag names (`stop-on-timeout`) to the
    /// underscored option keys the runner reads before validating and
    /// accumulating them.
    fn parse_option_tokens(&self, tokens: &[String], at: &Where) -> Result<OptionScope> {
        let normalized: Vec<String> = tokens
            .iter()
            .map(|token| {
                if let Some(rest) = token.strip_prefix('+') {
                    match rest.split_once('=') {
                        Some((name, value)) => format!("+{}={value}", name.replace('-', "_")),
                        None => format!("+{}", rest.replace('-', "_")),
                    }
                } else if let Some(rest) = token.strip_prefix('-') {
                    format!("-{}", rest.replace('-', "_"))
                } else {
                    token.clone()
                }
            })
            .collect();
        default_parse_option_tokens(&normalized, self.known_options(), self.list_option_names(), at)
    }
}

fn parse_geometry(spec: &str) -> Result<(u16, u16)> {
    let (rows, cols) = spec
        .split_once('x')
        .ok_or_else(|| anyhow::anyhow!("geometry {spec:?} is not of the form ROWSxCOLS"))?;
    Ok((rows.parse()?, cols.parse()?))
}

/// Build the argv for `shell`'s interpreter, grounded in each shell's
/// non-interactive, non-rc-sourcing invocation.
fn default_cmd(shell: &str) -> Result<Vec<String>> {
    let (prog, args): (&str, &[&str]) = match shell {
        "bash" => ("bash", &["--norc", "--noprofile", "--posix", "--noediting"]),
        "dash" => ("dash", &[]),
        "ksh" => ("ksh", &["+E"]),
        "sh" => ("sh", &[]),
        other => anyhow::bail!("unsupported shell {other:?}"),
    };
    which::which(prog).with_context(|| format!("shell interpreter {prog:?} not found on PATH"))?;

    let template = ShebangTemplate::new("/usr/bin/env %prog %args");
    let mut tokens = BTreeMap::new();
    tokens.insert("prog".to_string(), TokenValue::Single(prog.to_string()));
    tokens.insert(
        "args".to_string(),
        TokenValue::Many(args.iter().map(|s| s.to_string()).collect()),
    );
    let cmdline = template.substitute(&tokens)?;
    Ok(shell_words::split(&cmdline)?)
}

/// Drives one shell interpreter over a pty, discriminating prompts by a
/// per-session-unique `PS1`/`PS2`/`PS3`/`PS4` banner so the runner never
/// confuses its own prompt with text the example printed.
pub struct ShellRunner {
    state: RunnerState,
    pty: Option<PtyDriver>,
    ps1_re: regex::Regex,
    any_ps_re: regex::Regex,
    rows: u16,
    cols: u16,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ShellRunner {
    pub fn new() -> Self {
        Self {
            state: RunnerState::Uninitialized,
            pty: None,
            ps1_re: regex::Regex::new(r"/byexample/sh/ps1> ").expect("ps1 regex is valid"),
            any_ps_re: regex::Regex::new(r"/byexample/sh/ps\d+> ").expect("any-ps regex is valid"),
            rows: 24,
            cols: 80,
        }
    }

    /// Send ctrl-Z and wait for the primary prompt to resurface, for the
    /// `stop_on_timeout`/`stop_on_silence` soft-stop path: a timeout there
    /// ends the example rather than failing it.
    fn stop_and_resync(&mut self, at: &Where) -> Result<Vec<u8>, CoreError> {
        let pty = self.pty.as_mut().expect("runner is initialized");
        pty.send_control(b'z').map_err(|e| CoreError::BrokenRunner {
            language: "shell".to_string(),
            reason: e.to_string(),
        })?;
        let m = pty.expect(&self.ps1_re, Duration::from_secs(10), at)?;
        Ok(m.before)
    }
}

impl Runner for ShellRunner {
    fn language(&self) -> &'static str {
        "shell"
    }

    fn state(&self) -> RunnerState {
        self.state
    }

    fn initialize(&mut self, options: &OptionStack) -> Result<()> {
        let shell = options.get_str("shell").unwrap_or("bash").to_string();
        let geometry = options.get_str("geometry").unwrap_or("24x80");
        let (rows, cols) = parse_geometry(geometry)?;
        self.rows = rows;
        self.cols = cols;

        let argv = default_cmd(&shell)?;
        let mut cmd = CommandBuilder::new(&argv[0]);
        for arg in &argv[1..] {
            cmd.arg(arg);
        }

        let mut pty = PtyDriver::spawn(cmd, rows, cols)?;
        let banner = "export PS1='/byexample/sh/ps1> '; export PS2='/byexample/sh/ps2> '; \
             export PS3='/byexample/sh/ps3> '; export PS4='/byexample/sh/ps4> '";
        pty.send_line(banner)?;

        let dfl_timeout = Duration::from_secs_f64(options.get_float("x.dfl_timeout").unwrap_or(10.0));
        let where_ = Where::new(0, 0, "<shell-initialize>");
        pty.expect(&self.ps1_re, dfl_timeout, &where_)?;

        self.pty = Some(pty);
        self.state = RunnerState::Ready;
        Ok(())
    }

    /// Feeds `example.source` one line at a time, expecting the secondary
    /// prompt after every line but the last and the primary prompt after
    /// it (§4.6 "Prompt discipline").
    fn run(&mut self, example: &Example, options: &OptionStack) -> Result<String, CoreError> {
        self.state = RunnerState::Executing;

        let timeout = Duration::from_secs_f64(options.get_float("timeout").unwrap_or(2.0));
        let stop_on_timeout = options.get_bool("stop_on_timeout");
        let stop_on_silence = options.get_bool("stop_on_silence");

        let lines: Vec<&str> = example.source.trim_end_matches('\n').split('\n').collect();
        let mut collected: Vec<u8> = Vec::new();

        for (i, line) in lines.iter().enumerate() {
            let is_last = i + 1 == lines.len();
            let pty = self.pty.as_mut().expect("runner is initialized");
            pty.send_line(line).map_err(|e| CoreError::BrokenRunner {
                language: "shell".to_string(),
                reason: e.to_string(),
            })?;

            let re = if is_last { &self.ps1_re } else { &self.any_ps_re };
            let result = if is_last && stop_on_silence {
                pty.expect_with_idle_timeout(re, timeout, Duration::from_millis(500), &example.where_)
            } else {
                pty.expect(re, timeout, &example.where_)
            };

            match result {
                Ok(m) => collected.extend_from_slice(&m.before),
                Err(CoreError::Timeout { at, partial_output }) if is_last && (stop_on_timeout || stop_on_silence) => {
                    collected.extend_from_slice(partial_output.as_bytes());
                    let resynced = self.stop_and_resync(&at)?;
                    collected.extend_from_slice(&resynced);
                }
                Err(CoreError::Timeout { at, partial_output }) => {
                    self.state = RunnerState::Cancelling;
                    collected.extend_from_slice(partial_output.as_bytes());
                    return Err(CoreError::Timeout {
                        at,
                        partial_output: String::from_utf8_lossy(&collected).into_owned(),
                    });
                }
                Err(other) => return Err(other),
            }
        }

        self.state = RunnerState::Ready;
        let raw = String::from_utf8_lossy(&collected).into_owned();
        let term: TerminalKind = options
            .get_str("term")
            .and_then(|s| TerminalKind::from_str(s).ok())
            .unwrap_or(TerminalKind::Dumb);
        Ok(terminal::render(&raw, &collected, term, self.rows, self.cols))
    }

    fn cancel(&mut self, _example: &Example, _options: &OptionStack) -> bool {
        let where_ = Where::new(0, 0, "<shell-cancel>");
        let pty = match self.pty.as_mut() {
            Some(pty) => pty,
            None => return false,
        };
        if pty.send_control(b'c').is_err() {
            self.state = RunnerState::Broken;
            return false;
        }
        match pty.expect(&self.ps1_re, Duration::from_secs(5), &where_) {
            Ok(_) => {
                self.state = RunnerState::Ready;
                true
            }
            Err(_) => {
                self.state = RunnerState::Broken;
                false
            }
        }
    }

    fn shutdown(&mut self) -> Result<()> {
        if let Some(mut pty) = self.pty.take() {
            pty.shutdown(Duration::from_millis(200))?;
        }
        self.state = RunnerState::ShutDown;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_simple_prompt_block() {
        let finder = ShellFinder::new();
        let text = "$ echo hi\nhi\n";
        let matches = finder.matches(text, 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].snippet, "$ echo hi");
        assert_eq!(matches[0].expected, "hi\n");
    }

    #[test]
    fn matches_continuation_line() {
        let finder = ShellFinder::new();
        let text = "$ echo hi && \\\n> echo bye\nhi\nbye\n";
        let matches = finder.matches(text, 1);
        assert_eq!(matches.len(), 1);
        assert!(matches[0].snippet.contains("> echo bye"));
    }

    #[test]
    fn stops_expected_at_a_blank_line() {
        let finder = ShellFinder::new();
        let text = "$ echo hi\nhi\n\nNot part of the example.\n";
        let matches = finder.matches(text, 1);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].expected, "hi\n");
    }

    #[test]
    fn snippet_and_expected_strips_prompt_markers() {
        let finder = ShellFinder::new();
        let text = "$ echo hi\nhi\n";
        let m = &finder.matches(text, 1)[0];
        let where_ = Where::new(1, 2, "doc.md");
        let (snippet, expected, _) = finder.snippet_and_expected(m, where_).unwrap();
        assert_eq!(snippet, "echo hi");
        assert_eq!(expected, "hi\n");
    }

    #[test]
    fn options_string_regex_extracts_trailing_comment() {
        let parser = ShellParser::new();
        let caps = parser
            .options_string_regex()
            .captures("echo hi # byexample: +norm_ws")
            .unwrap();
        assert_eq!(caps.get(1).unwrap().as_str().trim(), "+norm_ws");
    }

    #[test]
    fn hyphenated_flags_normalize_to_underscored_keys() {
        let parser = ShellParser::new();
        let at = Where::new(1, 1, "doc.md");
        let scope = parser
            .parse_option_tokens(&["+stop-on-timeout".to_string()], &at)
            .unwrap();
        assert_eq!(scope.get("stop_on_timeout").and_then(OptionValue::as_bool), Some(true));
    }

    #[test]
    fn repeated_rm_tokens_accumulate_into_a_list() {
        let parser = ShellParser::new();
        let at = Where::new(1, 1, "doc.md");
        let scope = parser
            .parse_option_tokens(&["+rm=foo".to_string(), "+rm=bar".to_string()], &at)
            .unwrap();
        assert_eq!(
            scope.get("rm").and_then(OptionValue::as_list),
            Some(&["foo".to_string(), "bar".to_string()][..])
        );
    }

    #[test]
    fn unknown_option_is_rejected() {
        let parser = ShellParser::new();
        let at = Where::new(1, 1, "doc.md");
        let err = parser
            .parse_option_tokens(&["+not-a-real-option".to_string()], &at)
            .unwrap_err();
        assert!(err.to_string().contains("not_a_real_option"));
    }

    #[test]
    fn parses_standard_geometry() {
        assert_eq!(parse_geometry("24x80").unwrap(), (24, 80));
    }

    #[test]
    fn rejects_malformed_geometry() {
        assert!(parse_geometry("nope").is_err());
    }
}
