// SPDX-License-Identifier: MIT OR Apache-2.0
//! Compiler options, loadable from RON.

use crate::kind::Kind;
use indexmap::IndexMap;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Expression flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Variant {
    /// Scalar expression with a float result
    #[default]
    Math,
    /// Expression allowing `[x, y, z]` literals, with a vector result
    Vector,
}

impl Variant {
    /// Whether bracket vector literals are allowed
    pub fn vector_syntax(self) -> bool {
        self == Self::Vector
    }

    /// Kind of the result output
    pub fn output_kind(self) -> Kind {
        match self {
            Self::Math => Kind::Scalar,
            Self::Vector => Kind::Vector,
        }
    }
}

/// Options of one expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Expression flavor
    pub variant: Variant,
    /// Implicit multiplication of juxtaposed tokens, e.g. `2ab`
    pub algebraic: bool,
    /// Rewrite `Pi`, `eNum` and `Gold` into their symbols
    pub macros: bool,
    /// Materialize numerals as tagged value nodes instead of socket defaults
    pub constant_nodes: bool,
    /// Name of the result output socket
    pub output_name: String,
    /// Kind of specific variables; unlisted ones are scalars
    pub variable_kinds: IndexMap<String, Kind>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            variant: Variant::Math,
            algebraic: false,
            macros: false,
            constant_nodes: true,
            output_name: "Result".to_string(),
            variable_kinds: IndexMap::new(),
        }
    }
}

impl CompileOptions {
    /// Options for a vector expression
    pub fn vector() -> Self {
        Self {
            variant: Variant::Vector,
            ..Self::default()
        }
    }

    /// Declare the kind of a variable
    pub fn with_variable_kind(mut self, name: impl Into<String>, kind: Kind) -> Self {
        self.variable_kinds.insert(name.into(), kind);
        self
    }

    /// Kind of a variable
    pub fn variable_kind(&self, name: &str) -> Kind {
        self.variable_kinds.get(name).copied().unwrap_or(Kind::Scalar)
    }

    /// Parse options from RON text
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        let options: CompileOptions = ron::from_str(text)?;
        options.validate()?;
        Ok(options)
    }

    /// Serialize options to pretty RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let config = PrettyConfig::default()
            .depth_limit(3)
            .separate_tuple_members(true);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load options from a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save options to a RON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.output_name.trim().is_empty() {
            return Err(ConfigError::Invalid("output_name must not be empty".to_string()));
        }
        if let Some((name, _)) = self.variable_kinds.iter().find(|(_, kind)| **kind == Kind::Output) {
            return Err(ConfigError::Invalid(format!("variable '{name}' cannot be of kind Output")));
        }
        Ok(())
    }
}

/// Errors loading or saving options
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File access failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON text did not parse
    #[error("Invalid options file: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Options could not be written
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Parsed but inconsistent
    #[error("Invalid options: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.variant, Variant::Math);
        assert!(options.constant_nodes);
        assert!(!options.algebraic);
        assert_eq!(options.output_name, "Result");
        assert_eq!(options.variable_kind("x"), Kind::Scalar);
    }

    #[test]
    fn test_ron_round_trip() {
        let options = CompileOptions::vector().with_variable_kind("v", Kind::Vector);
        let text = options.to_ron().unwrap();
        let loaded = CompileOptions::from_ron(&text).unwrap();
        assert_eq!(loaded, options);
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let options = CompileOptions::from_ron("(algebraic: true, macros: true)").unwrap();
        assert!(options.algebraic);
        assert!(options.macros);
        assert_eq!(options.variant, Variant::Math);
    }

    #[test]
    fn test_invalid_options_rejected() {
        assert!(matches!(
            CompileOptions::from_ron("(output_name: \"\")"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            CompileOptions::from_ron("(variable_kinds: {\"a\": Output})"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(CompileOptions::from_ron("(variant: Cube)"), Err(ConfigError::Parse(_))));
    }
}
