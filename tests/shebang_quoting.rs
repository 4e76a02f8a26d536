//! Shebang quoting round-trip property (§8): for every token map, splitting
//! the substituted template with POSIX shell-word rules recovers the
//! original, unquoted token values in order.

use byexample_core::runner::shebang::{ShebangTemplate, TokenValue};
use std::collections::BTreeMap;

#[test]
fn single_token_round_trips_through_shell_word_splitting() {
    let tpl = ShebangTemplate::new("%prog -c %script");
    let mut tokens = BTreeMap::new();
    tokens.insert("prog".to_string(), TokenValue::Single("/usr/bin/env bash".to_string()));
    tokens.insert(
        "script".to_string(),
        TokenValue::Single("echo 'hi there' && exit".to_string()),
    );
    let rendered = tpl.substitute(&tokens).unwrap();
    let words = shell_words::split(&rendered).unwrap();
    assert_eq!(words, vec!["/usr/bin/env bash", "-c", "echo 'hi there' && exit"]);
}

#[test]
fn list_token_elements_stay_as_distinct_words_even_with_embedded_spaces() {
    let tpl = ShebangTemplate::new("env %args");
    let mut tokens = BTreeMap::new();
    tokens.insert(
        "args".to_string(),
        TokenValue::Many(vec![
            "VAR=has spaces".to_string(),
            "another arg".to_string(),
            "plain".to_string(),
        ]),
    );
    let rendered = tpl.substitute(&tokens).unwrap();
    let words = shell_words::split(&rendered).unwrap();
    assert_eq!(words, vec!["env", "VAR=has spaces", "another arg", "plain"]);
}

#[test]
fn braced_tokens_compose_with_a_following_literal_identifier_character() {
    let tpl = ShebangTemplate::new("%{shell}rc --login");
    let mut tokens = BTreeMap::new();
    tokens.insert("shell".to_string(), TokenValue::Single("/bin/bash".to_string()));
    let rendered = tpl.substitute(&tokens).unwrap();
    assert_eq!(rendered, "/bin/bashrc --login");
}

#[test]
fn a_segment_quoted_together_in_the_template_keeps_its_word_boundary_after_substitution() {
    let tpl = ShebangTemplate::new("/bin/sh -c '%e %p %a >/dev/null'");
    let mut tokens = BTreeMap::new();
    tokens.insert("e".to_string(), TokenValue::Single("/usr/bin/env".to_string()));
    tokens.insert("p".to_string(), TokenValue::Single("python".to_string()));
    tokens.insert(
        "a".to_string(),
        TokenValue::Many(vec!["-i".to_string(), "-c".to_string(), "print('hi')".to_string()]),
    );
    let rendered = tpl.substitute(&tokens).unwrap();
    let words = shell_words::split(&rendered).unwrap();
    assert_eq!(words.len(), 3);
    assert_eq!(words[0], "/bin/sh");
    assert_eq!(words[1], "-c");

    // `words[2]` is itself a shell command line for a nested `sh -c` to
    // re-parse: splitting it again must recover the original argv, with the
    // `%a` list's multi-word element still a single word.
    let inner = shell_words::split(&words[2]).unwrap();
    assert_eq!(inner, vec!["/usr/bin/env", "python", "-i", "-c", "print('hi')", ">/dev/null"]);
}
