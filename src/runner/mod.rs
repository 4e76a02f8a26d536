//! Runner (§4.6): drives an interactive interpreter over a pseudo-terminal.
//! The pty mechanics live in [`pty::PtyDriver`], a composable helper a
//! concrete Runner embeds (§9); [`terminal`] renders captured output per the
//! `term` option; [`shebang`] builds the spawn command line.

pub mod pty;
pub mod shebang;
pub mod terminal;

use crate::error::CoreError;
use crate::harvest::Example;
use crate::options::OptionStack;
use anyhow::Result;

/// States a Runner instance moves through (§4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Uninitialized,
    Ready,
    Executing,
    Cancelling,
    Broken,
    ShutDown,
}

impl RunnerState {
    /// Whether `run`/`cancel` may be attempted from this state.
    pub fn is_usable(self) -> bool {
        matches!(self, RunnerState::Ready)
    }
}

/// Per-language interpreter driver. Implementors embed a [`pty::PtyDriver`]
/// and are not re-entrant: one example at a time, single-threaded (§5).
pub trait Runner: Send {
    fn language(&self) -> &'static str;

    fn state(&self) -> RunnerState;

    /// Spawn the interpreter and drive it until the first prompt. Enters
    /// `Ready` on success.
    fn initialize(&mut self, options: &OptionStack) -> Result<()>;

    /// Feed `example.source` line by line, returning the rendered output
    /// collected between prompts (§4.6 "Prompt discipline").
    fn run(&mut self, example: &Example, options: &OptionStack) -> Result<String, CoreError>;

    /// Attempt to recover a stuck interpreter: send an interrupt, expect
    /// the primary prompt, discard output. `true` on success (Runner
    /// returns to `Ready`); `false` marks the Runner `Broken`.
    fn cancel(&mut self, example: &Example, options: &OptionStack) -> bool;

    /// Send EOF, then force-terminate after a short grace period. Valid
    /// from any state.
    fn shutdown(&mut self) -> Result<()>;

    /// Interactive debugging hook. Not part of automated runs; the default
    /// implementation declines.
    fn interact(&mut self, _example: &Example, _options: &OptionStack) -> Result<()> {
        anyhow::bail!("interact() is not supported outside an interactive debug session")
    }
}
