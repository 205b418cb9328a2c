//! Word decomposition and casing transforms for placeholder values.

/// A casing transform applicable to a variable value inside a placeholder
/// token (e.g. `{{.PascalCaseName}}`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseTransform {
    /// No transform; the raw value.
    Verbatim,
    Pascal,
    Camel,
    Kebab,
    Snake,
    ScreamingSnake,
    /// Uppercases the raw value without re-joining words.
    Upper,
    /// Lowercases the raw value without re-joining words.
    Lower,
}

impl CaseTransform {
    pub const ALL: [CaseTransform; 8] = [
        CaseTransform::Verbatim,
        CaseTransform::Pascal,
        CaseTransform::Camel,
        CaseTransform::Kebab,
        CaseTransform::Snake,
        CaseTransform::ScreamingSnake,
        CaseTransform::Upper,
        CaseTransform::Lower,
    ];

    /// Accepted spellings of the transform name inside a token. Matching is
    /// by literal substitution, so every alias is enumerated here.
    pub fn spellings(self) -> &'static [&'static str] {
        match self {
            CaseTransform::Verbatim => &[""],
            CaseTransform::Pascal => &[
                "PascalCase",
                "Pascalcase",
                "pascalCase",
                "pascalcase",
                "PASCALCASE",
                "Pascal",
                "pascal",
                "PASCAL",
            ],
            CaseTransform::Camel => &[
                "CamelCase",
                "Camelcase",
                "camelCase",
                "camelcase",
                "CAMELCASE",
                "Camel",
                "camel",
                "CAMEL",
            ],
            CaseTransform::Kebab => &[
                "KebabCase",
                "Kebabcase",
                "kebabCase",
                "kebabcase",
                "KEBABCASE",
                "kebab-case",
                "Kebab",
                "kebab",
                "KEBAB",
            ],
            CaseTransform::Snake => &[
                "SnakeCase",
                "Snakecase",
                "snakeCase",
                "snakecase",
                "SNAKECASE",
                "snake_case",
                "Snake",
                "snake",
                "SNAKE",
            ],
            CaseTransform::ScreamingSnake => &[
                "ScreamingSnakeCase",
                "screamingSnakeCase",
                "screamingsnakecase",
                "SCREAMINGSNAKECASE",
                "SCREAMING_SNAKE_CASE",
                "ScreamingSnake",
                "screamingsnake",
                "SCREAMINGSNAKE",
            ],
            CaseTransform::Upper => &[
                "UpperCase",
                "Uppercase",
                "upperCase",
                "uppercase",
                "UPPERCASE",
                "Upper",
                "upper",
                "UPPER",
            ],
            CaseTransform::Lower => &[
                "LowerCase",
                "Lowercase",
                "lowerCase",
                "lowercase",
                "LOWERCASE",
                "Lower",
                "lower",
                "LOWER",
            ],
        }
    }

    /// Apply the transform to a value.
    ///
    /// `Upper` and `Lower` act on the raw value (delimiters preserved); the
    /// word-joining transforms decompose the value with [`split_words`]
    /// first.
    pub fn apply(self, value: &str) -> String {
        match self {
            CaseTransform::Verbatim => value.to_string(),
            CaseTransform::Upper => value.to_uppercase(),
            CaseTransform::Lower => value.to_lowercase(),
            CaseTransform::Pascal => split_words(value)
                .iter()
                .map(|w| capitalize(w))
                .collect::<Vec<_>>()
                .join(""),
            CaseTransform::Camel => {
                let words = split_words(value);
                let mut out = String::new();
                for (i, word) in words.iter().enumerate() {
                    if i == 0 {
                        out.push_str(&word.to_lowercase());
                    } else {
                        out.push_str(&capitalize(word));
                    }
                }
                out
            }
            CaseTransform::Kebab => split_words(value)
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join("-"),
            CaseTransform::Snake => split_words(value)
                .iter()
                .map(|w| w.to_lowercase())
                .collect::<Vec<_>>()
                .join("_"),
            CaseTransform::ScreamingSnake => split_words(value)
                .iter()
                .map(|w| w.to_uppercase())
                .collect::<Vec<_>>()
                .join("_"),
        }
    }
}

/// Decompose a value into words.
///
/// Hyphens, underscores, and spaces split first; only when that yields a
/// single token are camel-case boundaries (lowercase/digit followed by
/// uppercase) used. Mixed-delimiter values therefore decompose the same way
/// across all transforms.
pub fn split_words(value: &str) -> Vec<String> {
    let delimited: Vec<String> = value
        .split(['-', '_', ' '])
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect();

    if delimited.len() != 1 {
        return delimited;
    }

    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;
    for c in delimited[0].chars() {
        if c.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = c.is_lowercase() || c.is_ascii_digit();
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}
