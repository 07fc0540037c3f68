use std::fmt;

use regex::Regex;

/// Zero-padded card set number, e.g. `"001"`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CardId(String);

impl CardId {
    /// Normalizes a leading set-number token: surrounding whitespace is trimmed and the
    /// value is left-padded with zeros to three characters.
    pub fn from_token(token: &str) -> Self {
        Self(format!("{:0>3}", token.trim()))
    }

    /// The padded identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One way of recovering a [`CardId`] from an image file name.
pub trait CardIdParser: Send + Sync {
    /// Parses a card id from a file name, if this parser recognizes it.
    fn parse(&self, file_name: &str) -> Option<CardId>;
}

/// Takes the first capture group of a regular expression.
#[derive(Clone, Debug)]
pub struct RegexCardIdParser {
    regex: Regex,
}

impl RegexCardIdParser {
    /// Compiles `pattern`; its first capture group is the identifier.
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            regex: Regex::new(pattern)?,
        })
    }
}

impl CardIdParser for RegexCardIdParser {
    fn parse(&self, file_name: &str) -> Option<CardId> {
        self.regex
            .captures(file_name)
            .and_then(|c| c.get(1))
            .map(|m| CardId::from_token(m.as_str()))
    }
}

/// Ordered list of parsers; the first one that matches wins.
pub struct CardIdParserChain {
    parsers: Vec<Box<dyn CardIdParser>>,
}

impl CardIdParserChain {
    /// A chain that matches nothing.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Appends a lower-priority strategy.
    pub fn push(&mut self, parser: impl CardIdParser + 'static) -> &mut Self {
        self.parsers.push(Box::new(parser));
        self
    }

    /// Number of strategies.
    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    /// `true` when no strategy is registered.
    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }

    /// Identifier from the first strategy that matches `file_name`.
    pub fn parse(&self, file_name: &str) -> Option<CardId> {
        self.parsers.iter().find_map(|p| p.parse(file_name))
    }
}

impl Default for CardIdParserChain {
    /// `pokemon_en_001_x.png`, then `SSP_001_R.png`, then any three digits.
    fn default() -> Self {
        const PATTERNS: [&str; 3] = [r"(?i)_en_(\d{3})_", r"_(\d{3})_", r"(\d{3})"];
        let mut chain = Self::empty();
        for pattern in PATTERNS {
            match RegexCardIdParser::new(pattern) {
                Ok(parser) => {
                    chain.push(parser);
                }
                Err(e) => tracing::error!(pattern, error = %e, "built-in card id pattern rejected"),
            }
        }
        chain
    }
}

impl fmt::Debug for CardIdParserChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardIdParserChain")
            .field("parsers", &self.parsers.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dataset/card_id.rs"]
mod tests;
