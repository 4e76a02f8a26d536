//! Executor (§2 step 6, §5): for each parsed example, invokes the
//! registered Runner and compares its output against the compiled
//! `Expected` regex. One interpreter session is kept alive per language for
//! the lifetime of a document (§5 "Ordering guarantees").

use crate::error::CoreError;
use crate::expected::sanitize_group_name;
use crate::harvest::Example;
use crate::location::Where;
use crate::options::OptionStack;
use crate::registry::Registry;
use crate::runner::{Runner, RunnerState};
use anyhow::Result;
use std::collections::{BTreeMap, BTreeSet};

/// Result of running and checking one example.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub at: Where,
    pub output: String,
    pub matched: bool,
    /// Named capture groups and the text they captured, keyed by the
    /// original (unsanitized) tag name.
    pub captures: BTreeMap<String, String>,
    /// Set when the example's output was a timeout's partial output rather
    /// than a completed run.
    pub timed_out: bool,
}

pub struct Executor<'r> {
    registry: &'r Registry,
}

impl<'r> Executor<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Execute `examples` in order, reusing one Runner per language across
    /// the whole document. A broken runner (failed cancel) skips the rest
    /// of that language's examples with a diagnostic rather than aborting
    /// the document (§7 "Broken-runner errors").
    pub fn execute(&self, examples: &[Example], options: &OptionStack) -> Result<(Vec<ExecutionOutcome>, Vec<String>)> {
        let mut runners: BTreeMap<String, Box<dyn Runner>> = BTreeMap::new();
        let mut broken: BTreeSet<String> = BTreeSet::new();
        let mut outcomes = Vec::new();
        let mut diagnostics = Vec::new();

        for example in examples {
            if broken.contains(&example.language) {
                diagnostics.push(format!(
                    "{}: runner for language {:?} is broken, skipping",
                    example.where_, example.language
                ));
                continue;
            }

            let runner = match runners.get_mut(&example.language) {
                Some(runner) => runner,
                None => {
                    let mut runner = self
                        .registry
                        .make_runner(&example.language)
                        .ok_or_else(|| anyhow::anyhow!("no runner factory for language {:?}", example.language))?;
                    runner.initialize(options)?;
                    runners.entry(example.language.clone()).or_insert(runner)
                }
            };

            if runner.state() != RunnerState::Ready {
                runner.initialize(options)?;
            }

            match runner.run(example, options) {
                Ok(output) => {
                    outcomes.push(self.check(example, output, false)?);
                }
                Err(CoreError::Timeout { partial_output, .. }) => {
                    let recovered = runner.cancel(example, options);
                    if !recovered {
                        broken.insert(example.language.clone());
                    }
                    outcomes.push(self.check(example, partial_output, true)?);
                }
                Err(other) => return Err(other.into()),
            }
        }

        for (_, mut runner) in runners {
            let _ = runner.shutdown();
        }

        Ok((outcomes, diagnostics))
    }

    fn check(&self, example: &Example, output: String, timed_out: bool) -> Result<ExecutionOutcome> {
        let matcher = example.expected.matcher()?;
        let matched = matcher.is_match(&output).unwrap_or(false);

        let mut captures = BTreeMap::new();
        if matched {
            if let Ok(Some(caps)) = matcher.captures(&output) {
                for name in example.expected.tags_by_idx.values().filter_map(|v| v.as_ref()) {
                    let sanitized = sanitize_group_name(name);
                    if let Some(m) = caps.name(&sanitized) {
                        captures.insert(name.clone(), m.as_str().to_string());
                    }
                }
            }
        }

        Ok(ExecutionOutcome {
            at: example.where_.clone(),
            output,
            matched,
            captures,
            timed_out,
        })
    }
}
