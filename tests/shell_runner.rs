//! End-to-end harvest + execute scenarios against a real `/bin/sh`, covering
//! §8 scenario 7 ("Shell run") and the "interpreter session persists across
//! examples of the same language" ordering guarantee from §5.

mod common;

use byexample_core::harvest::Harvester;
use byexample_core::modules::shell::{ShellFinder, ShellParser, ShellRunner};
use byexample_core::options::OptionStack;
use byexample_core::registry::Registry;
use byexample_core::runner::Runner;
use byexample_core::Executor;

fn shell_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_finder(Box::new(ShellFinder::new()));
    registry.register_parser(Box::new(ShellParser::new()));
    registry.register_runner_factory("shell", || Box::new(ShellRunner::new()) as Box<dyn Runner>);
    registry
}

#[test]
fn harvests_and_runs_a_single_example_against_a_real_shell() {
    common::init_tracing();
    let registry = shell_registry();
    let harvester = Harvester::new(&registry);
    let doc = "Say hello:\n\n    $ echo hi\n    hi\n";
    let report = harvester.harvest(doc, "doc.md").unwrap();
    assert_eq!(report.examples.len(), 1);

    let executor = Executor::new(&registry);
    let (outcomes, diagnostics) = executor.execute(&report.examples, &OptionStack::new()).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].matched, "output was {:?}", outcomes[0].output);
    assert!(!outcomes[0].timed_out);
}

#[test]
fn interpreter_session_persists_across_examples_in_one_document() {
    let registry = shell_registry();
    let harvester = Harvester::new(&registry);
    let doc = "\
    $ x=42
    $ echo $x
    42
";
    let report = harvester.harvest(doc, "doc.md").unwrap();
    assert_eq!(report.examples.len(), 2);

    let executor = Executor::new(&registry);
    let (outcomes, _diagnostics) = executor.execute(&report.examples, &OptionStack::new()).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes[1].matched, "second example saw: {:?}", outcomes[1].output);
}

#[test]
fn named_capture_tag_is_reported_in_the_outcome() {
    let registry = shell_registry();
    let harvester = Harvester::new(&registry);
    let doc = "\
    $ echo hello-world
    hello-<suffix>
";
    let report = harvester.harvest(doc, "doc.md").unwrap();
    assert_eq!(report.examples.len(), 1);

    let executor = Executor::new(&registry);
    let (outcomes, _diagnostics) = executor.execute(&report.examples, &OptionStack::new()).unwrap();
    assert!(outcomes[0].matched, "output was {:?}", outcomes[0].output);
    assert_eq!(outcomes[0].captures.get("suffix").map(String::as_str), Some("world"));
}
