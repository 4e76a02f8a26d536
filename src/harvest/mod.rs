//! Harvest pipeline (§4.4): split a document into zones, find candidates in
//! each zone, arbitrate overlaps, then parse survivors into [`Example`]s.

pub mod example;
pub mod finder;
pub mod overlap;
pub mod zone;

pub use example::{Example, ExampleCandidate};
pub use finder::Finder;
pub use zone::{NoDelimiter, Zone, ZoneDelimiter};

use crate::error::CoreError;
use crate::options::OptionStack;
use crate::registry::Registry;
use anyhow::{Context, Result};

/// Diagnostics collected along the way that never abort the harvest: an
/// unclassified language, a language dropped for lack of a registered
/// parser/runner, and so on (§7, "Discovery diagnostics").
#[derive(Debug, Default)]
pub struct HarvestReport {
    pub examples: Vec<Example>,
    pub diagnostics: Vec<String>,
}

/// Orchestrates zone delimiting, finding, overlap arbitration, and parsing
/// for one document, against a shared [`Registry`] of finders/parsers/
/// runners (§4.4).
pub struct Harvester<'r> {
    registry: &'r Registry,
}

impl<'r> Harvester<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Run the full pipeline (§4.4 steps 1-6) over `document`.
    ///
    /// 1. Choose the zone delimiter by `filepath`'s extension.
    /// 2. Obtain zones.
    /// 3. Run every finder over every zone; keep only candidates whose
    ///    language is in the allow-list and has both a parser and a runner
    ///    registered, dropping everything else with a diagnostic.
    /// 4. Sort candidates by `(start_lineno asc, end_lineno desc)`.
    /// 5. Arbitrate overlaps.
    /// 6. Parse each surviving candidate, threading one [`OptionStack`] per
    ///    document.
    pub fn harvest(&self, document: &str, filepath: &str) -> Result<HarvestReport> {
        let mut report = HarvestReport::default();
        let mut candidates = Vec::new();

        let delimiter = self.registry.delimiter_for(filepath);
        for zone in delimiter.zones(document, filepath) {
            for finder in self.registry.finders() {
                for result in finder::candidates_in_zone(
                    finder.as_ref(),
                    &zone.text,
                    zone.where_.start_lineno,
                    filepath,
                    &OptionStack::new(),
                ) {
                    match result {
                        Ok(candidate) => {
                            if self.registry.is_accepted(&candidate.language) {
                                candidates.push(candidate);
                            } else {
                                report.diagnostics.push(format!(
                                    "{}: language {:?} has no registered parser/runner (or is not allow-listed), dropping candidate",
                                    candidate.where_, candidate.language
                                ));
                            }
                        }
                        Err(err @ CoreError::SelfRecheckFailed { .. }) => return Err(err.into()),
                        Err(other) => return Err(other.into()),
                    }
                }
            }
        }

        overlap::sort_candidates(&mut candidates);
        let candidates = overlap::arbitrate(candidates)?;

        let mut stack = OptionStack::new();
        for candidate in candidates {
            let language = candidate.language.clone();
            let parser = self
                .registry
                .parser_for(&language)
                .with_context(|| format!("no parser registered for language {language:?}"))?;
            let example = parser.parse(candidate, &mut stack)?;
            report.examples.push(example);
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::shell::{ShellFinder, ShellParser, ShellRunner};
    use crate::runner::Runner;

    fn shell_registry() -> Registry {
        let mut registry = Registry::new();
        registry.register_finder(Box::new(ShellFinder::new()));
        registry.register_parser(Box::new(ShellParser::new()));
        registry.register_runner_factory("shell", || Box::new(ShellRunner::new()) as Box<dyn Runner>);
        registry
    }

    #[test]
    fn harvests_a_single_shell_example() {
        let registry = shell_registry();
        let harvester = Harvester::new(&registry);
        let doc = "Some prose.\n\n    $ echo hi\n    hi\n\nMore prose.\n";
        let report = harvester.harvest(doc, "doc.md").unwrap();
        assert_eq!(report.examples.len(), 1);
        assert_eq!(report.examples[0].language, "shell");
        assert!(report.examples[0].source.contains("echo hi"));
    }

    #[test]
    fn empty_document_yields_no_examples() {
        let registry = shell_registry();
        let harvester = Harvester::new(&registry);
        let report = harvester.harvest("no examples here\n", "doc.md").unwrap();
        assert!(report.examples.is_empty());
    }

    #[test]
    fn unregistered_language_is_a_diagnostic_not_a_failure() {
        let mut registry = Registry::new();
        registry.register_finder(Box::new(ShellFinder::new()));
        // No parser/runner registered for "shell" at all.
        let harvester = Harvester::new(&registry);
        let doc = "    $ echo hi\n    hi\n";
        let report = harvester.harvest(doc, "doc.md").unwrap();
        assert!(report.examples.is_empty());
        assert_eq!(report.diagnostics.len(), 1);
    }
}
