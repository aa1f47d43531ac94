//! Naming collaborator.
//!
//! Raw schema names (`user-profile`, `order.line`, `2fa_token`) must become
//! target-language identifiers. The trait keeps the policy pluggable; the
//! default targets the same Go-flavored identifiers as the default format
//! registry.

use once_cell::sync::Lazy;
use regex::Regex;

pub trait Namer {
    /// Exported type identifier for a raw schema name.
    fn type_name(&self, raw: &str) -> String;

    /// Member/accessor identifier for a raw property name.
    fn member_name(&self, raw: &str) -> String;
}

static WORDS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z0-9]+").unwrap());

/// Keywords of the default target; member names that land on one get a
/// suffix. Type names are capitalized and cannot collide.
const RESERVED: &[&str] = &[
    "break", "case", "chan", "const", "continue", "default", "defer", "else",
    "fallthrough", "for", "func", "go", "goto", "if", "import", "interface",
    "map", "package", "range", "return", "select", "struct", "switch", "type",
    "var",
];

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultNamer;

impl DefaultNamer {
    fn pascal(raw: &str) -> String {
        let mut out = String::with_capacity(raw.len());
        for word in WORDS.find_iter(raw) {
            let word = word.as_str();
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        }
        out
    }
}

impl Namer for DefaultNamer {
    fn type_name(&self, raw: &str) -> String {
        let name = Self::pascal(raw);
        if name.is_empty() {
            return "Anon".to_string();
        }
        // identifiers cannot start with a digit
        if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            format!("Nr{name}")
        } else {
            name
        }
    }

    fn member_name(&self, raw: &str) -> String {
        let pascal = self.type_name(raw);
        let mut chars = pascal.chars();
        let name = match chars.next() {
            Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
            None => return "member".to_string(),
        };
        if RESERVED.contains(&name.as_str()) {
            format!("{name}Var")
        } else {
            name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_names_are_pascal_case() {
        let n = DefaultNamer;
        assert_eq!(n.type_name("user-profile"), "UserProfile");
        assert_eq!(n.type_name("order.line_item"), "OrderLineItem");
        assert_eq!(n.type_name("already"), "Already");
        assert_eq!(n.type_name("HTTPStatus"), "HTTPStatus");
    }

    #[test]
    fn leading_digit_gets_a_prefix() {
        let n = DefaultNamer;
        assert_eq!(n.type_name("2fa-token"), "Nr2faToken");
    }

    #[test]
    fn member_names_avoid_keywords() {
        let n = DefaultNamer;
        assert_eq!(n.member_name("display_name"), "displayName");
        assert_eq!(n.member_name("type"), "typeVar");
        assert_eq!(n.member_name("range"), "rangeVar");
    }

    #[test]
    fn empty_input_still_yields_an_identifier() {
        let n = DefaultNamer;
        assert_eq!(n.type_name("$$$"), "Anon");
        assert_eq!(n.member_name("$$$"), "anon");
    }
}
