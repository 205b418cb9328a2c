//! Placeholder resolution: expands a variable map into every accepted
//! spelling of each token and substitutes them literally.
//!
//! The token grammar is `{{.<Transform><Key>}}`, also accepted with a space
//! after `{{` and before `}}`. Substitution is a global literal find/replace;
//! regex is only used to discover which keys a template references. Tokens
//! that no variable resolves stay verbatim in the output.

use std::collections::{BTreeMap, BTreeSet};

use regex_lite::Regex;

use crate::engine::case::CaseTransform;

/// The full set of literal `token -> value` substitutions for a variable map.
pub struct Substitutions {
    pairs: Vec<(String, String)>,
}

impl Substitutions {
    pub fn build(variables: &BTreeMap<String, String>) -> Self {
        let mut pairs = Vec::new();
        for (key, value) in variables {
            for spelling_of_key in key_spellings(key) {
                for transform in CaseTransform::ALL {
                    let transformed = transform.apply(value);
                    for spelling in transform.spellings() {
                        let inner = format!(".{spelling}{spelling_of_key}");
                        pairs.push((format!("{{{{{inner}}}}}"), transformed.clone()));
                        pairs.push((format!("{{{{ {inner} }}}}"), transformed.clone()));
                    }
                }
            }
        }
        Self { pairs }
    }

    /// Apply every substitution to `text`. Well-formed templates have no
    /// overlapping tokens, so the order of application does not matter.
    pub fn apply(&self, text: &str) -> String {
        let mut out = text.to_string();
        for (token, value) in &self.pairs {
            if out.contains(token.as_str()) {
                out = out.replace(token.as_str(), value);
            }
        }
        out
    }
}

/// Substitute placeholders in a template body.
pub fn resolve(text: &str, variables: &BTreeMap<String, String>) -> String {
    Substitutions::build(variables).apply(text)
}

/// Substitute placeholders in a node or path name.
pub fn resolve_name(name: &str, variables: &BTreeMap<String, String>) -> String {
    Substitutions::build(variables).apply(name)
}

/// Discover the token bodies a template references (transform prefix still
/// attached). Used for reporting, not for substitution.
pub fn referenced_tokens(text: &str) -> BTreeSet<String> {
    let re = Regex::new(r"\{\{\s*\.\s*([A-Za-z0-9_-]+)\s*\}\}").unwrap();
    re.captures_iter(text)
        .map(|c| c[1].trim().to_string())
        .collect()
}

/// Accepted spellings of a variable key inside a token.
fn key_spellings(key: &str) -> Vec<String> {
    let mut spellings = vec![
        key.to_string(),
        CaseTransform::Pascal.apply(key),
        CaseTransform::Camel.apply(key),
        key.to_lowercase(),
        key.to_uppercase(),
    ];
    spellings.sort();
    spellings.dedup();
    spellings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn resolves_each_casing_transform() {
        let variables = vars(&[("Foo", "my-thing")]);
        assert_eq!(resolve("{{.PascalCaseFoo}}", &variables), "MyThing");
        assert_eq!(resolve("{{.CamelCaseFoo}}", &variables), "myThing");
        assert_eq!(resolve("{{.KebabCaseFoo}}", &variables), "my-thing");
        assert_eq!(resolve("{{.SnakeCaseFoo}}", &variables), "my_thing");
        assert_eq!(resolve("{{.UpperCaseFoo}}", &variables), "MY-THING");
        assert_eq!(resolve("{{.LowerCaseFoo}}", &variables), "my-thing");
        assert_eq!(resolve("{{.Foo}}", &variables), "my-thing");
    }

    #[test]
    fn accepts_spaced_token_form() {
        let variables = vars(&[("Foo", "my-thing")]);
        assert_eq!(resolve("{{ .PascalCaseFoo }}", &variables), "MyThing");
    }

    #[test]
    fn transform_spelling_is_case_insensitive() {
        let variables = vars(&[("Foo", "my-thing")]);
        assert_eq!(resolve("{{.pascalcaseFoo}}", &variables), "MyThing");
        assert_eq!(resolve("{{.KEBABFoo}}", &variables), "my-thing");
        assert_eq!(resolve("{{.snake_caseFoo}}", &variables), "my_thing");
    }

    #[test]
    fn key_spelling_variants_resolve() {
        let variables = vars(&[("myField", "display name")]);
        assert_eq!(resolve("{{.PascalCaseMyField}}", &variables), "DisplayName");
        assert_eq!(resolve("{{.myField}}", &variables), "display name");
    }

    #[test]
    fn unresolved_tokens_stay_verbatim() {
        let variables = vars(&[("Foo", "x")]);
        let text = "{{.PascalCaseBar}} and {{.Foo}}";
        assert_eq!(resolve(text, &variables), "{{.PascalCaseBar}} and x");
    }

    #[test]
    fn resolves_inside_larger_text() {
        let variables = vars(&[("Name", "user-profile")]);
        let text = "export { {{.PascalCaseName}} } from \"./{{.KebabCaseName}}\";";
        assert_eq!(
            resolve(text, &variables),
            "export { UserProfile } from \"./user-profile\";"
        );
    }

    #[test]
    fn discovers_referenced_tokens() {
        let tokens = referenced_tokens("{{.PascalCaseFoo}} {{ .Bar }} {{not-a-token}}");
        assert!(tokens.contains("PascalCaseFoo"));
        assert!(tokens.contains("Bar"));
        assert_eq!(tokens.len(), 2);
    }
}
