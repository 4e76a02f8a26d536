//! Harvests a document read from a real file on disk, the shape a caller of
//! this library actually uses outside these tests (§6 "External interfaces").

mod common;

use byexample_core::harvest::Harvester;
use byexample_core::modules::shell::{ShellFinder, ShellParser, ShellRunner};
use byexample_core::options::OptionStack;
use byexample_core::registry::Registry;
use byexample_core::runner::Runner;
use byexample_core::Executor;
use std::fs;
use std::io::Write;

fn shell_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register_finder(Box::new(ShellFinder::new()));
    registry.register_parser(Box::new(ShellParser::new()));
    registry.register_runner_factory("shell", || Box::new(ShellRunner::new()) as Box<dyn Runner>);
    registry
}

#[test]
fn harvests_and_runs_a_document_written_to_a_scratch_directory() {
    common::init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let doc_path = dir.path().join("doc.md");
    {
        let mut file = fs::File::create(&doc_path).unwrap();
        write!(file, "Say hello:\n\n    $ echo hi\n    hi\n").unwrap();
    }

    let contents = fs::read_to_string(&doc_path).unwrap();
    let registry = shell_registry();
    let harvester = Harvester::new(&registry);
    let report = harvester.harvest(&contents, doc_path.to_str().unwrap()).unwrap();
    assert_eq!(report.examples.len(), 1);

    let executor = Executor::new(&registry);
    let (outcomes, diagnostics) = executor.execute(&report.examples, &OptionStack::new()).unwrap();
    assert!(diagnostics.is_empty());
    assert!(outcomes[0].matched, "output was {:?}", outcomes[0].output);
}
