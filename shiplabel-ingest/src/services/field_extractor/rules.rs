//! Named line rules
//!
//! A [`LineRule`] looks at the whole address block and proposes a value for
//! one field. Rules are independent: none reads another's result. When two
//! rules target the same field, the earlier one in the [`RuleSet`] wins.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{AddressDraft, AddressField};

/// `<4-5 digit zip> <UPPERCASE CITY>` anywhere in a line
static ZIP_CITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b([0-9]{4,5})\s+(\p{Lu}[\p{Lu}\-]*)\b").expect("zip/city pattern is valid")
});

type Matcher = Box<dyn Fn(&[String]) -> Option<String> + Send + Sync>;

/// One extraction heuristic for one field
pub struct LineRule {
    name: &'static str,
    field: AddressField,
    matcher: Matcher,
}

impl LineRule {
    pub fn new<F>(name: &'static str, field: AddressField, matcher: F) -> Self
    where
        F: Fn(&[String]) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name,
            field,
            matcher: Box::new(matcher),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn field(&self) -> AddressField {
        self.field
    }

    pub fn apply(&self, lines: &[String]) -> Option<String> {
        (self.matcher)(lines)
    }
}

impl std::fmt::Debug for LineRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineRule")
            .field("name", &self.name)
            .field("field", &self.field)
            .finish()
    }
}

/// Ordered collection of rules producing one draft
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<LineRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<LineRule>) -> Self {
        Self { rules }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(LineRule::name).collect()
    }

    /// Run every rule over `lines`
    pub fn apply(&self, lines: &[String]) -> AddressDraft {
        let mut draft = AddressDraft::default();

        for rule in &self.rules {
            if !draft.is_blank(rule.field()) {
                continue;
            }
            match rule.apply(lines) {
                Some(value) => {
                    tracing::trace!(rule = rule.name(), field = rule.field().column(), "Rule matched");
                    draft.set(rule.field(), value);
                }
                None => {
                    tracing::trace!(rule = rule.name(), "Rule did not match");
                }
            }
        }

        draft
    }
}

/// Remove every whitespace character
pub fn strip_whitespace(line: &str) -> String {
    line.chars().filter(|c| !c.is_whitespace()).collect()
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

/// Index of the first line whose whitespace-stripped form is all digits
pub fn phone_line_index(lines: &[String]) -> Option<usize> {
    lines.iter().position(|l| is_all_digits(&strip_whitespace(l)))
}

/// First `(zip, city)` pair found in any line
pub fn find_zip_city(lines: &[String]) -> Option<(String, String)> {
    lines.iter().find_map(|line| {
        ZIP_CITY
            .captures(line)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
    })
}

/// First line, verbatim
pub fn first_line(field: AddressField) -> LineRule {
    LineRule::new("first_line", field, |lines| lines.first().cloned())
}

/// Last line, verbatim
pub fn last_line(field: AddressField) -> LineRule {
    LineRule::new("last_line", field, |lines| lines.last().cloned())
}

/// First line containing any of `markers` (case-sensitive)
pub fn containing_any(name: &'static str, field: AddressField, markers: Vec<String>) -> LineRule {
    LineRule::new(name, field, move |lines| {
        lines
            .iter()
            .find(|line| markers.iter().any(|m| !m.is_empty() && line.contains(m.as_str())))
            .cloned()
    })
}

/// First line that is exactly nine digits once whitespace is stripped
pub fn nine_digit_phone(field: AddressField) -> LineRule {
    LineRule::new("nine_digit_phone", field, |lines| {
        lines
            .iter()
            .map(|l| strip_whitespace(l))
            .find(|s| s.len() == 9 && is_all_digits(s))
    })
}

/// First all-digit line, whitespace stripped
pub fn digit_only_phone(field: AddressField) -> LineRule {
    LineRule::new("digit_only_phone", field, |lines| {
        phone_line_index(lines).map(|i| strip_whitespace(&lines[i]))
    })
}

/// The line right after the first all-digit line
pub fn line_after_phone(field: AddressField) -> LineRule {
    LineRule::new("line_after_phone", field, |lines| {
        phone_line_index(lines).and_then(|i| lines.get(i + 1).cloned())
    })
}

/// First line containing "STR", "STREET" or any digit
pub fn street_like(field: AddressField) -> LineRule {
    LineRule::new("street_like", field, |lines| {
        lines
            .iter()
            .find(|line| {
                line.contains("STR")
                    || line.contains("STREET")
                    || line.chars().any(|c| c.is_ascii_digit())
            })
            .cloned()
    })
}

/// Zip code from the first zip/city match
pub fn zip_from_zip_city() -> LineRule {
    LineRule::new("zip_city", AddressField::ZipCode, |lines| {
        find_zip_city(lines).map(|(zip, _)| zip)
    })
}

/// City from the first zip/city match
pub fn city_from_zip_city() -> LineRule {
    LineRule::new("zip_city", AddressField::City, |lines| {
        find_zip_city(lines).map(|(_, city)| city)
    })
}

/// Fixed value, skipped when empty
pub fn constant(name: &'static str, field: AddressField, value: String) -> LineRule {
    LineRule::new(name, field, move |_| {
        if value.is_empty() {
            None
        } else {
            Some(value.clone())
        }
    })
}
