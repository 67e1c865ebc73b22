//! `${NAME}` template resolution against an [`Environment`] snapshot.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::Environment;

/// A template that is exactly one reference: `$NAME` or `${NAME}`.
static WHOLE_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\$(?:\{([A-Za-z_][A-Za-z0-9_]*)\}|([A-Za-z_][A-Za-z0-9_]*))$")
        .expect("whole reference pattern is valid")
});

/// A braced reference anywhere inside a template.
static BRACED_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("braced reference pattern is valid")
});

/// Outcome of resolving a definition's environment templates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Every template key mapped to its final value.
    pub resolved: BTreeMap<String, String>,
    /// Required names whose value is empty or was never set, in declaration order.
    pub unresolved: Vec<String>,
}

impl Resolution {
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Resolve a single template string.
///
/// Unset variables expand to the empty string. References whose name is not a
/// valid identifier are left as literal text.
pub fn resolve_template(template: &str, environment: &Environment) -> String {
    if let Some(caps) = WHOLE_REFERENCE.captures(template) {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();
        return environment.get(name).unwrap_or_default().to_string();
    }

    BRACED_REFERENCE
        .replace_all(template, |caps: &Captures<'_>| {
            environment.get(&caps[1]).unwrap_or_default().to_string()
        })
        .into_owned()
}

/// Resolve every template in `templates` and report unresolved required names.
///
/// A required name without a template entry is checked against the
/// environment directly. An empty template for a required name reads that
/// name, as if it were `${NAME}`.
pub fn resolve(
    templates: &BTreeMap<String, String>,
    required: &[String],
    environment: &Environment,
) -> Resolution {
    let resolved: BTreeMap<String, String> = templates
        .iter()
        .map(|(key, template)| {
            let value = if template.is_empty() && required.contains(key) {
                environment.get(key).unwrap_or_default().to_string()
            } else {
                resolve_template(template, environment)
            };
            (key.clone(), value)
        })
        .collect();

    let mut unresolved: Vec<String> = Vec::new();
    for name in required {
        let value = match resolved.get(name) {
            Some(value) => Some(value.as_str()),
            None => environment.get(name),
        };
        if value.is_none_or(str::is_empty) && !unresolved.contains(name) {
            unresolved.push(name.clone());
        }
    }

    Resolution {
        resolved,
        unresolved,
    }
}

/// Variable names a template reads from the environment.
pub fn referenced_variables(template: &str) -> Vec<String> {
    if let Some(caps) = WHOLE_REFERENCE.captures(template) {
        return caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| vec![m.as_str().to_string()])
            .unwrap_or_default();
    }

    let mut names = Vec::new();
    for caps in BRACED_REFERENCE.captures_iter(template) {
        let name = caps[1].to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// The variables a user has to supply so that `unresolved` can resolve.
///
/// For a required key whose template references other variables, those
/// unset references are returned; otherwise the key itself.
pub fn missing_inputs(
    templates: &BTreeMap<String, String>,
    unresolved: &[String],
    environment: &Environment,
) -> Vec<String> {
    let mut inputs: Vec<String> = Vec::new();
    for name in unresolved {
        let referenced: Vec<String> = templates
            .get(name)
            .map(|t| referenced_variables(t))
            .unwrap_or_default()
            .into_iter()
            .filter(|var| !environment.has_value(var))
            .collect();

        let candidates = if referenced.is_empty() {
            vec![name.clone()]
        } else {
            referenced
        };
        for candidate in candidates {
            if !inputs.contains(&candidate) {
                inputs.push(candidate);
            }
        }
    }
    inputs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn whole_braced_reference_substitutes() {
        let env = Environment::from_pairs([("TOKEN", "abc")]);
        assert_eq!(resolve_template("${TOKEN}", &env), "abc");
    }

    #[test]
    fn whole_bare_reference_substitutes() {
        let env = Environment::from_pairs([("TOKEN", "abc")]);
        assert_eq!(resolve_template("$TOKEN", &env), "abc");
    }

    #[test]
    fn unset_reference_is_empty() {
        let env = Environment::new();
        assert_eq!(resolve_template("${NOPE}", &env), "");
        assert_eq!(resolve_template("$NOPE", &env), "");
    }

    #[test]
    fn interpolates_inside_text() {
        let env = Environment::from_pairs([("HOME", "/usr/alice"), ("USER", "alice")]);
        assert_eq!(resolve_template("${HOME}/x", &env), "/usr/alice/x");
        assert_eq!(
            resolve_template("${USER}@${HOME}:${USER}", &env),
            "alice@/usr/alice:alice"
        );
    }

    #[test]
    fn bare_reference_inside_text_is_literal() {
        let env = Environment::from_pairs([("HOME", "/usr/alice")]);
        assert_eq!(resolve_template("cd $HOME/x", &env), "cd $HOME/x");
    }

    #[test]
    fn invalid_identifier_is_literal() {
        let env = Environment::from_pairs([("1A", "no")]);
        assert_eq!(resolve_template("${1A}", &env), "${1A}");
        assert_eq!(resolve_template("${A-B}", &env), "${A-B}");
        assert_eq!(resolve_template("$1A", &env), "$1A");
    }

    #[test]
    fn literal_is_unchanged() {
        let env = Environment::from_pairs([("X", "y")]);
        for literal in ["plain", "", "a $ b", "$(whoami)", "`id`", "{X}"] {
            assert_eq!(resolve_template(literal, &env), literal);
        }
    }

    #[test]
    fn resolve_reports_unset_required() {
        let env = Environment::new();
        let res = resolve(
            &templates(&[("TOKEN", "${TOKEN}"), ("MODE", "fast")]),
            &["TOKEN".to_string()],
            &env,
        );
        assert_eq!(res.resolved.get("TOKEN").map(String::as_str), Some(""));
        assert_eq!(res.resolved.get("MODE").map(String::as_str), Some("fast"));
        assert_eq!(res.unresolved, vec!["TOKEN".to_string()]);
        assert!(!res.is_complete());
    }

    #[test]
    fn optional_unset_is_not_reported() {
        let res = resolve(&templates(&[("OPT", "${OPT}")]), &[], &Environment::new());
        assert!(res.is_complete());
    }

    #[test]
    fn required_without_template_checks_environment() {
        let required = vec!["API_KEY".to_string()];
        let missing = resolve(&BTreeMap::new(), &required, &Environment::new());
        assert_eq!(missing.unresolved, required);

        let env = Environment::from_pairs([("API_KEY", "k")]);
        let present = resolve(&BTreeMap::new(), &required, &env);
        assert!(present.is_complete());
        assert!(present.resolved.is_empty());
    }

    #[test]
    fn duplicate_required_names_reported_once() {
        let required = vec!["A".to_string(), "A".to_string()];
        let res = resolve(&BTreeMap::new(), &required, &Environment::new());
        assert_eq!(res.unresolved, vec!["A".to_string()]);
    }

    #[test]
    fn referenced_variables_collects_unique_names() {
        assert_eq!(referenced_variables("$TOKEN"), vec!["TOKEN"]);
        assert_eq!(
            referenced_variables("${A}:${B}:${A}"),
            vec!["A".to_string(), "B".to_string()]
        );
        assert!(referenced_variables("literal").is_empty());
    }

    #[test]
    fn missing_inputs_prefers_referenced_variables() {
        let tpl = templates(&[("GITHUB_TOKEN", "${GH_PAT}"), ("LITERAL", "")]);
        let unresolved = vec![
            "GITHUB_TOKEN".to_string(),
            "LITERAL".to_string(),
            "NO_TEMPLATE".to_string(),
        ];
        let inputs = missing_inputs(&tpl, &unresolved, &Environment::new());
        assert_eq!(inputs, vec!["GH_PAT", "LITERAL", "NO_TEMPLATE"]);
    }

    #[test]
    fn empty_required_template_reads_its_own_name() {
        let tpl = templates(&[("API_KEY", ""), ("OPTIONAL", "")]);
        let required = vec!["API_KEY".to_string()];

        let missing = resolve(&tpl, &required, &Environment::new());
        assert_eq!(missing.unresolved, required);
        assert_eq!(
            missing_inputs(&tpl, &missing.unresolved, &Environment::new()),
            vec!["API_KEY"]
        );

        let env = Environment::from_pairs([("API_KEY", "k"), ("OPTIONAL", "o")]);
        let filled = resolve(&tpl, &required, &env);
        assert!(filled.is_complete());
        assert_eq!(filled.resolved["API_KEY"], "k");
        assert_eq!(filled.resolved["OPTIONAL"], "");
    }
}
