//! Registry (§9, "registries own the Parsers/Runners"): the single place
//! that owns every Finder/ZoneDelimiter/Parser/Runner-factory and the
//! language allow-list, so `Example`/`Finder`/`Parser` can reference each
//! other by stable id (language, finder id) instead of holding cycles.

use crate::harvest::{Finder, NoDelimiter, ZoneDelimiter};
use crate::parser::Parser;
use crate::runner::Runner;
use std::collections::{BTreeMap, BTreeSet};

type RunnerFactory = Box<dyn Fn() -> Box<dyn Runner> + Send + Sync>;

pub struct Registry {
    finders: Vec<Box<dyn Finder>>,
    delimiters_by_ext: BTreeMap<String, Box<dyn ZoneDelimiter>>,
    default_delimiter: Box<dyn ZoneDelimiter>,
    parsers: BTreeMap<String, Box<dyn Parser>>,
    runner_factories: BTreeMap<String, RunnerFactory>,
    /// `None` means "every language with a registered parser and runner is
    /// allowed"; `Some` restricts further to the named languages.
    allow_list: Option<BTreeSet<String>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            finders: Vec::new(),
            delimiters_by_ext: BTreeMap::new(),
            default_delimiter: Box::new(NoDelimiter),
            parsers: BTreeMap::new(),
            runner_factories: BTreeMap::new(),
            allow_list: None,
        }
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_finder(&mut self, finder: Box<dyn Finder>) -> &mut Self {
        self.finders.push(finder);
        self
    }

    pub fn register_delimiter(&mut self, extension: impl Into<String>, delimiter: Box<dyn ZoneDelimiter>) -> &mut Self {
        self.delimiters_by_ext.insert(extension.into(), delimiter);
        self
    }

    pub fn register_parser(&mut self, parser: Box<dyn Parser>) -> &mut Self {
        self.parsers.insert(parser.language().to_string(), parser);
        self
    }

    pub fn register_runner_factory<F>(&mut self, language: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Runner> + Send + Sync + 'static,
    {
        self.runner_factories.insert(language.into(), Box::new(factory));
        self
    }

    /// Restrict accepted languages to an explicit allow-list. Without a
    /// call to this, every language with both a parser and a runner
    /// factory registered is accepted.
    pub fn allow(&mut self, language: impl Into<String>) -> &mut Self {
        self.allow_list.get_or_insert_with(BTreeSet::new).insert(language.into());
        self
    }

    pub fn finders(&self) -> &[Box<dyn Finder>] {
        &self.finders
    }

    pub fn delimiter_for(&self, filepath: &str) -> &dyn ZoneDelimiter {
        let ext = filepath.rsplit('.').next().unwrap_or("");
        self.delimiters_by_ext
            .get(ext)
            .map(|d| d.as_ref())
            .unwrap_or(self.default_delimiter.as_ref())
    }

    pub fn parser_for(&self, language: &str) -> Option<&dyn Parser> {
        self.parsers.get(language).map(|p| p.as_ref())
    }

    pub fn make_runner(&self, language: &str) -> Option<Box<dyn Runner>> {
        self.runner_factories.get(language).map(|f| f())
    }

    /// Whether `language` has a registered parser and runner factory, and
    /// is not excluded by an explicit allow-list (§4.4 step 3).
    pub fn is_accepted(&self, language: &str) -> bool {
        if let Some(allow_list) = &self.allow_list {
            if !allow_list.contains(language) {
                return false;
            }
        }
        self.parsers.contains_key(language) && self.runner_factories.contains_key(language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::shell::{ShellFinder, ShellParser, ShellRunner};

    #[test]
    fn language_with_parser_and_runner_is_accepted() {
        let mut registry = Registry::new();
        registry.register_finder(Box::new(ShellFinder::new()));
        registry.register_parser(Box::new(ShellParser::new()));
        registry.register_runner_factory("shell", || Box::new(ShellRunner::new()) as Box<dyn Runner>);
        assert!(registry.is_accepted("shell"));
        assert!(!registry.is_accepted("python"));
    }

    #[test]
    fn allow_list_restricts_acceptance() {
        let mut registry = Registry::new();
        registry.register_parser(Box::new(ShellParser::new()));
        registry.register_runner_factory("shell", || Box::new(ShellRunner::new()) as Box<dyn Runner>);
        registry.allow("python");
        assert!(!registry.is_accepted("shell"));
    }

    #[test]
    fn default_delimiter_is_used_when_extension_unregistered() {
        let registry = Registry::new();
        assert_eq!(registry.delimiter_for("README.md").id(), "no-delimiter");
    }
}
