use std::collections::{BTreeMap, HashMap};

use mcpdeck_core::env::{Environment, missing_inputs, resolve, resolve_template};

fn templates(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn reference_inside_text_is_substituted() {
    let env = Environment::from_pairs([("HOME", "/usr/alice")]);
    let result = resolve(&templates(&[("KEY", "${HOME}/x")]), &[], &env);

    assert_eq!(result.resolved["KEY"], "/usr/alice/x");
    assert!(result.is_complete());
}

#[test]
fn unset_required_reference_is_unresolved() {
    let env = Environment::new();
    let result = resolve(
        &templates(&[("X", "${X}")]),
        &["X".to_string()],
        &env,
    );

    assert_eq!(result.resolved["X"], "");
    assert_eq!(result.unresolved, vec!["X".to_string()]);
}

#[test]
fn literals_pass_through() {
    let env = Environment::from_pairs([("A", "a")]);
    for literal in ["plain", "cost: $5", "a $ b", "${not closed", "$1", ""] {
        assert_eq!(resolve_template(literal, &env), literal, "{literal:?}");
    }
}

#[test]
fn bare_dollar_form_only_as_whole_value() {
    let env = Environment::from_pairs([("TOKEN", "t0k")]);
    assert_eq!(resolve_template("$TOKEN", &env), "t0k");
    assert_eq!(resolve_template("Bearer $TOKEN", &env), "Bearer $TOKEN");
    assert_eq!(resolve_template("Bearer ${TOKEN}", &env), "Bearer t0k");
}

#[test]
fn several_references_in_one_value() {
    let env = Environment::from_pairs([("HOST", "example.com"), ("PORT", "8080")]);
    assert_eq!(
        resolve_template("https://${HOST}:${PORT}/${MISSING}v1", &env),
        "https://example.com:8080/v1"
    );
}

#[test]
fn empty_value_counts_as_unresolved() {
    let env = Environment::from_pairs([("TOKEN", "")]);
    let result = resolve(
        &templates(&[("TOKEN", "${TOKEN}")]),
        &["TOKEN".to_string()],
        &env,
    );
    assert_eq!(result.unresolved, vec!["TOKEN".to_string()]);
}

#[test]
fn required_without_template_reads_environment() {
    let required = vec!["API_KEY".to_string(), "API_KEY".to_string()];

    let set = Environment::from_pairs([("API_KEY", "k")]);
    assert!(resolve(&BTreeMap::new(), &required, &set).is_complete());

    let unset = Environment::new();
    let result = resolve(&BTreeMap::new(), &required, &unset);
    assert_eq!(result.unresolved, vec!["API_KEY".to_string()]);
    assert!(result.resolved.is_empty());
}

#[test]
fn missing_inputs_name_the_referenced_variables() {
    let env = Environment::from_pairs([("HOST", "h")]);
    let templates = templates(&[
        ("URL", "https://${HOST}/${PATH_PART}"),
        ("TOKEN", "literal-but-empty?"),
        ("SECRET", "${SECRET_SOURCE}"),
    ]);
    let unresolved = vec!["URL".to_string(), "SECRET".to_string(), "ORPHAN".to_string()];

    assert_eq!(
        missing_inputs(&templates, &unresolved, &env),
        vec![
            "PATH_PART".to_string(),
            "SECRET_SOURCE".to_string(),
            "ORPHAN".to_string()
        ]
    );
}

#[test]
fn secrets_fill_only_gaps() {
    let mut env = Environment::from_pairs([("SET", "process"), ("EMPTY", "")]);
    let fallback: HashMap<String, String> = [
        ("SET".to_string(), "file".to_string()),
        ("EMPTY".to_string(), "file".to_string()),
        ("NEW".to_string(), "file".to_string()),
    ]
    .into_iter()
    .collect();

    env.fill_missing(&fallback);

    assert_eq!(env.get("SET"), Some("process"));
    assert_eq!(env.get("EMPTY"), Some("file"));
    assert_eq!(env.get("NEW"), Some("file"));
}
