use regex::Regex;

use crate::error::Result;

#[derive(Debug, Clone)]
enum Matchers {
    Literal,
    Regex(Vec<Regex>),
}

/// Ordered record patterns requested by a caller.
///
/// Literal patterns are case-sensitive substrings. Regex patterns are tested
/// against each index line independently. Patterns may overlap or match
/// nothing at all.
#[derive(Debug, Clone)]
pub struct MatchSpec {
    patterns: Vec<String>,
    matchers: Matchers,
}

impl MatchSpec {
    pub fn literal<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
            matchers: Matchers::Literal,
        }
    }

    /// Compile every pattern as a regular expression.
    pub fn regex<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let compiled = patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self {
            patterns,
            matchers: Matchers::Regex(compiled),
        })
    }

    /// No patterns: the whole file is wanted.
    pub fn everything() -> Self {
        Self::literal(Vec::<String>::new())
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.matchers, Matchers::Regex(_))
    }

    /// Whether pattern number `index` matches `line`.
    pub fn matches(&self, index: usize, line: &str) -> bool {
        match &self.matchers {
            Matchers::Literal => self
                .patterns
                .get(index)
                .is_some_and(|pattern| line.contains(pattern.as_str())),
            Matchers::Regex(compiled) => compiled.get(index).is_some_and(|re| re.is_match(line)),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for MatchSpec {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::literal(iter)
    }
}
