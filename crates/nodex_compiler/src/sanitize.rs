// SPDX-License-Identifier: MIT OR Apache-2.0
//! Expression sanitizer.
//!
//! Normalizes raw user text into a string the parser accepts and classifies
//! every element of it. The pipeline is order-sensitive:
//!
//! 1. strip spaces and tabs
//! 2. rewrite superscript exponents into `**`
//! 3. substitute irrational symbols with their decimals
//! 4. split into elements on operators and punctuation
//! 5. insert implicit multiplications next to parentheses
//! 6. classify elements, splitting composites in algebraic mode
//! 7. reject any character outside the authorized set
//!
//! Nothing here touches the node tree.

use crate::config::{CompileOptions, Variant};
use crate::error::{CompileError, Result};
use crate::primitives::Function;
use crate::tables;
use regex::{Captures, Regex};
use std::collections::BTreeSet;
use std::sync::LazyLock;

// =============================================================================
// PATTERNS
// =============================================================================

/// One letter, one irrational symbol or one numeral, then superscripts
static SINGLE_BASE_SUPERSCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Za-z]|[π𝑒φ]|\d+(?:\.\d+)?)([⁰¹²³⁴⁵⁶⁷⁸⁹]+)").expect("valid regex")
});

/// A whole alphanumeric run, then superscripts
static RUN_BASE_SUPERSCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([A-Za-z0-9.π𝑒φ]+)([⁰¹²³⁴⁵⁶⁷⁸⁹]+)").expect("valid regex"));

/// A closing parenthesis, then superscripts
static PAREN_SUPERSCRIPT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)([⁰¹²³⁴⁵⁶⁷⁸⁹]+)").expect("valid regex"));

/// A numeral glued to an opening parenthesis
static NUMERAL_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\(").expect("valid regex"));

static NUMERAL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid regex"));

/// Parts of an algebraic composite such as `24ab1.5`
static COMPOSITE_PART_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+\.\d+|\d+)|([a-zA-Z])|([π𝑒φ])").expect("valid regex"));

// =============================================================================
// OUTPUT
// =============================================================================

/// Sanitized text and its classified elements
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sanitized {
    /// Text ready for the parser
    pub text: String,
    /// Variables, sorted alphabetically
    pub variables: Vec<String>,
    /// Numerals
    pub constants: BTreeSet<String>,
    /// Called functions
    pub functions: BTreeSet<String>,
    /// Composite tokens that were split, as typed
    pub composites: BTreeSet<String>,
}

#[derive(Default)]
struct Elements {
    variables: BTreeSet<String>,
    constants: BTreeSet<String>,
    functions: BTreeSet<String>,
    composites: BTreeSet<String>,
}

// =============================================================================
// SANITIZER
// =============================================================================

/// Text normalizer and element classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sanitizer {
    /// Implicit multiplication of juxtaposed tokens
    pub algebraic: bool,
    /// Expression flavor, deciding bracket syntax and known functions
    pub variant: Variant,
}

impl Sanitizer {
    /// Create a sanitizer
    pub fn new(algebraic: bool, variant: Variant) -> Self {
        Self { algebraic, variant }
    }

    /// Sanitizer matching compile options
    pub fn from_options(options: &CompileOptions) -> Self {
        Self::new(options.algebraic, options.variant)
    }

    fn vector_syntax(&self) -> bool {
        self.variant.vector_syntax()
    }

    fn is_function(&self, name: &str) -> bool {
        Function::from_name(name, self.variant).is_some()
    }

    /// Sanitize raw text
    pub fn sanitize(&self, raw: &str) -> Result<Sanitized> {
        let mut text: String = raw.chars().filter(|c| !matches!(c, ' ' | '\t')).collect();

        text = self.expand_superscripts(&text);

        for (symbol, value) in tables::IRRATIONALS {
            text = replace_exact_token(&text, symbol, value);
        }

        let elements = self.split_elements(&text);
        text = self.insert_implicit_multiplication(text, &elements);

        let mut found = Elements::default();
        for element in &elements {
            text = self.classify(element, text, &mut found)?;
        }

        if let Some(c) = text.chars().find(|c| !tables::is_authorized(*c, self.vector_syntax())) {
            return Err(CompileError::Syntax(format!("Unauthorized Symbol '{c}'")));
        }

        Ok(Sanitized {
            text,
            variables: found.variables.into_iter().collect(),
            constants: found.constants,
            functions: found.functions,
            composites: found.composites,
        })
    }

    fn expand_superscripts(&self, text: &str) -> String {
        let base_re = if self.algebraic {
            &*SINGLE_BASE_SUPERSCRIPT_RE
        } else {
            &*RUN_BASE_SUPERSCRIPT_RE
        };
        let text = base_re.replace_all(text, |caps: &Captures<'_>| {
            format!("({}**{})", &caps[1], superscript_to_ascii(&caps[2]))
        });
        PAREN_SUPERSCRIPT_RE
            .replace_all(&text, |caps: &Captures<'_>| {
                format!(")**{}", superscript_to_ascii(&caps[1]))
            })
            .into_owned()
    }

    fn split_elements(&self, text: &str) -> BTreeSet<String> {
        let vector_syntax = self.vector_syntax();
        text.split(|c: char| tables::is_separator(c, vector_syntax))
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect()
    }

    fn insert_implicit_multiplication(&self, text: String, elements: &BTreeSet<String>) -> String {
        if !self.algebraic {
            return NUMERAL_PAREN_RE.replace_all(&text, "$1*(").into_owned();
        }
        let mut text = text;
        for element in elements.iter().filter(|e| !self.is_function(e)) {
            text = replace_exact_token(&text, &format!("{element}("), &format!("{element}*("));
            text = replace_exact_token(&text, &format!("){element}"), &format!(")*{element}"));
        }
        text
    }

    fn classify(&self, element: &str, text: String, found: &mut Elements) -> Result<String> {
        if self.is_function(element) {
            if contains_exact_token(&text, &format!("{element}(")) {
                found.functions.insert(element.to_string());
                return Ok(text);
            }
            return Err(CompileError::Name(format!("Variable '{element}' is Taken")));
        }

        if element.chars().all(|c| c.is_ascii_digit() || c == '.') {
            if !NUMERAL_RE.is_match(element) {
                return Err(CompileError::Syntax(format!("Unrecognized Float '{element}'")));
            }
            found.constants.insert(element.to_string());
            return Ok(text);
        }

        if element.chars().all(|c| c.is_ascii_alphabetic()) {
            if element.len() == 1 || self.algebraic {
                found.variables.insert(element.to_string());
                return Ok(text);
            }
            if contains_exact_token(&text, &format!("{element}(")) {
                return Err(CompileError::Name(format!("Function '{element}' not recognized.")));
            }
            return Err(CompileError::Syntax(format!("Unauthorized Variable '{element}'")));
        }

        let vector_syntax = self.vector_syntax();
        if let Some(c) = element
            .chars()
            .find(|c| !(tables::is_authorized(*c, vector_syntax) || tables::is_irrational(*c)))
        {
            return Err(CompileError::Syntax(format!("Unauthorized Symbol '{c}'")));
        }

        if !self.algebraic {
            return Err(CompileError::Syntax(format!("Illegal Composite '{element}'")));
        }

        let parts: Vec<&str> = COMPOSITE_PART_RE
            .find_iter(element)
            .map(|m| m.as_str())
            .collect();
        if parts.concat() != element {
            return Err(CompileError::Syntax(format!("Unrecognized Composite '{element}'")));
        }

        let mut factors = Vec::with_capacity(parts.len());
        for part in parts {
            if let Some(value) = tables::irrational_value(part) {
                found.constants.insert(value.to_string());
                factors.push(value);
            } else if part.starts_with(|c: char| c.is_ascii_digit()) {
                found.constants.insert(part.to_string());
                factors.push(part);
            } else {
                found.variables.insert(part.to_string());
                factors.push(part);
            }
        }
        found.composites.insert(element.to_string());

        Ok(replace_exact_token(&text, element, &factors.join("*")))
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(false, Variant::Math)
    }
}

/// Expand the `Pi`, `eNum` and `Gold` macros.
///
/// Returns `None` when the text holds no macro.
pub fn apply_macros(text: &str) -> Option<String> {
    let mut rewritten: Option<String> = None;
    for (name, symbol) in tables::MACROS {
        let current = rewritten.as_deref().unwrap_or(text);
        if current.contains(name) {
            rewritten = Some(current.replace(name, symbol));
        }
    }
    rewritten
}

fn superscript_to_ascii(superscripts: &str) -> String {
    superscripts.chars().filter_map(tables::superscript_digit).collect()
}

// =============================================================================
// EXACT TOKEN MATCHING
// =============================================================================

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Whether a neighbour glues onto the token edge it touches
fn glues(edge: char, neighbour: char) -> bool {
    is_word_char(edge) && (is_word_char(neighbour) || (edge.is_ascii_digit() && neighbour == '.'))
}

/// Byte offsets of the occurrences of `token` not glued to a larger word or numeral
fn exact_token_offsets(text: &str, token: &str) -> Vec<usize> {
    let (Some(first), Some(last)) = (token.chars().next(), token.chars().next_back()) else {
        return Vec::new();
    };
    let mut offsets = Vec::new();
    let mut from = 0;
    while let Some(found) = text[from..].find(token) {
        let at = from + found;
        let end = at + token.len();
        let before = text[..at].chars().next_back();
        let after = text[end..].chars().next();
        let clear = !before.is_some_and(|c| glues(first, c)) && !after.is_some_and(|c| glues(last, c));
        if clear {
            offsets.push(at);
            from = end;
        } else {
            from = at + first.len_utf8();
        }
    }
    offsets
}

fn contains_exact_token(text: &str, token: &str) -> bool {
    !exact_token_offsets(text, token).is_empty()
}

/// Replace every exact occurrence of `token`
pub(crate) fn replace_exact_token(text: &str, token: &str, replacement: &str) -> String {
    let offsets = exact_token_offsets(text, token);
    if offsets.is_empty() {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len() + offsets.len() * replacement.len());
    let mut last = 0;
    for at in offsets {
        out.push_str(&text[last..at]);
        out.push_str(replacement);
        last = at + token.len();
    }
    out.push_str(&text[last..]);
    out
}
