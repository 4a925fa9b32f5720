// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fixed lookup tables shared by the sanitizer and the parser.

/// Binary operators and the function each one rewrites to
pub const OPERATOR_FUNCTIONS: [(&str, &str); 7] = [
    ("+", "add"),
    ("-", "sub"),
    ("*", "mult"),
    ("/", "div"),
    ("%", "mod"),
    ("**", "pow"),
    ("//", "floordiv"),
];

/// Superscript digits and their ASCII counterpart
pub const SUPERSCRIPTS: [(char, char); 10] = [
    ('⁰', '0'),
    ('¹', '1'),
    ('²', '2'),
    ('³', '3'),
    ('⁴', '4'),
    ('⁵', '5'),
    ('⁶', '6'),
    ('⁷', '7'),
    ('⁸', '8'),
    ('⁹', '9'),
];

/// Irrational symbols and the decimal they stand for
pub const IRRATIONALS: [(&str, &str); 3] = [
    ("π", "3.1415927"),
    ("𝑒", "2.7182818"),
    ("φ", "1.6180339"),
];

/// Macro names and the symbol they expand to
pub const MACROS: [(&str, &str); 3] = [
    ("Pi", "π"),
    ("eNum", "𝑒"),
    ("Gold", "φ"),
];

/// Operators and punctuation allowed in a sanitized math expression
pub const MATH_SYMBOLS: &str = "/*-+%.,()";

/// Extra punctuation allowed by the vector variant
pub const VECTOR_SYMBOLS: &str = "[]";

/// Function name an operator rewrites to
pub fn operator_function(operator: &str) -> Option<&'static str> {
    OPERATOR_FUNCTIONS
        .iter()
        .find(|(op, _)| *op == operator)
        .map(|(_, name)| *name)
}

/// ASCII digit of a superscript digit
pub fn superscript_digit(c: char) -> Option<char> {
    SUPERSCRIPTS.iter().find(|(s, _)| *s == c).map(|(_, d)| *d)
}

/// Whether `c` is a superscript digit
pub fn is_superscript(c: char) -> bool {
    superscript_digit(c).is_some()
}

/// Decimal expansion of an irrational symbol
pub fn irrational_value(symbol: &str) -> Option<&'static str> {
    IRRATIONALS.iter().find(|(s, _)| *s == symbol).map(|(_, v)| *v)
}

/// Whether `c` is one of the irrational symbols
pub fn is_irrational(c: char) -> bool {
    IRRATIONALS.iter().any(|(s, _)| s.chars().eq(std::iter::once(c)))
}

/// Whether `c` may appear in a sanitized expression
pub fn is_authorized(c: char, vector_syntax: bool) -> bool {
    c.is_ascii_alphanumeric()
        || MATH_SYMBOLS.contains(c)
        || (vector_syntax && VECTOR_SYMBOLS.contains(c))
}

/// Whether `c` splits elements apart
pub fn is_separator(c: char, vector_syntax: bool) -> bool {
    (MATH_SYMBOLS.contains(c) && c != '.') || (vector_syntax && VECTOR_SYMBOLS.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookups() {
        assert_eq!(operator_function("//"), Some("floordiv"));
        assert_eq!(operator_function("^"), None);
        assert_eq!(superscript_digit('²'), Some('2'));
        assert_eq!(irrational_value("φ"), Some("1.6180339"));
        assert!(is_irrational('𝑒'));
        assert!(!is_irrational('e'));
    }

    #[test]
    fn test_authorized_set() {
        assert!(is_authorized('[', true));
        assert!(!is_authorized('[', false));
        assert!(!is_authorized('^', true));
        assert!(is_separator(',', false));
        assert!(!is_separator('.', false));
    }
}
