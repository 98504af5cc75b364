//! # Placeholder Engine
//!
//! Scans text content for `{field}` tokens and substitutes values from a
//! tabular data row through a field → column mapping.
//!
//! Tokens are found by a small deterministic scanner rather than a pattern
//! engine: on `{` collect the field name up to `}`. A second `{` before the
//! closing brace restarts the token; an unterminated or empty `{}` token is
//! treated as literal text. Substitution is textual and non-recursive —
//! substituted values are never re-scanned.
//!
//! ```
//! use std::collections::HashMap;
//! use pergamino::placeholder::substitute;
//!
//! let mapping = HashMap::from([("name".to_string(), "Col1".to_string())]);
//! let row = serde_json::json!({"Col1": "Ana"});
//! let row = row.as_object().unwrap();
//! assert_eq!(substitute("Hi {name}", &mapping, row), "Hi Ana");
//! ```

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::template::{Element, Properties, Template};

/// Field name → data column name.
pub type Mapping = HashMap<String, String>;

/// One record of tabular input, keyed by column name.
pub type Row = Map<String, Value>;

/// Already-parsed tabular data, supplied by an external ingestion step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DataSet {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub rows: Vec<Row>,
}

/// Events produced by the token scanner.
enum Segment<'a> {
    Literal(&'a str),
    /// A complete `{field}` token; the str is the field name only.
    Token(&'a str),
}

/// Split text into literal runs and `{field}` tokens.
fn scan(text: &str) -> Vec<Segment<'_>> {
    let bytes = text.as_bytes();
    let mut segments = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'{' {
            i += 1;
            continue;
        }
        // Candidate token: look for the closing brace, restarting on '{'
        let open = i;
        let mut j = open + 1;
        let close = loop {
            match bytes.get(j) {
                None => break None,
                Some(b'}') => break Some(j),
                Some(b'{') => break None,
                Some(_) => j += 1,
            }
        };
        match close {
            // Empty `{}` stays literal
            Some(close) if close > open + 1 => {
                if literal_start < open {
                    segments.push(Segment::Literal(&text[literal_start..open]));
                }
                segments.push(Segment::Token(&text[open + 1..close]));
                i = close + 1;
                literal_start = i;
            }
            _ => {
                // Not a token; resume scanning at the next character (which
                // may itself be an opening brace)
                i += 1;
            }
        }
    }
    if literal_start < text.len() {
        segments.push(Segment::Literal(&text[literal_start..]));
    }
    segments
}

/// Distinct placeholder field names across every text element.
///
/// Order-independent and duplicate-free by construction.
pub fn extract_fields(elements: &[Element]) -> BTreeSet<String> {
    let mut fields = BTreeSet::new();
    for element in elements {
        if let Some(text) = element.text() {
            for segment in scan(text) {
                if let Segment::Token(field) = segment {
                    fields.insert(field.to_string());
                }
            }
        }
    }
    fields
}

/// Render a cell value as text. Strings pass through unquoted; null renders
/// empty (a missing key and an explicit null are deliberately identical).
fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Substitute every `{field}` occurrence in `text`.
///
/// - mapped field, value present → the stringified value
/// - mapped field, value missing or null → empty string
/// - unmapped field → the literal token is preserved
pub fn substitute(text: &str, mapping: &Mapping, row: &Row) -> String {
    let mut out = String::with_capacity(text.len());
    for segment in scan(text) {
        match segment {
            Segment::Literal(s) => out.push_str(s),
            Segment::Token(field) => match mapping.get(field) {
                Some(column) => {
                    if let Some(value) = row.get(column) {
                        out.push_str(&stringify(value));
                    }
                }
                None => {
                    out.push('{');
                    out.push_str(field);
                    out.push('}');
                }
            },
        }
    }
    out
}

/// Produce a new template with every text element's content substituted.
///
/// The source template is never mutated; the clone is a throwaway rendering
/// artifact for one export page.
pub fn render_template_for_row(template: &Template, mapping: &Mapping, row: &Row) -> Template {
    let mut substituted = template.clone();
    for element in &mut substituted.elements {
        if let Properties::Text(text_props) = &mut element.properties {
            text_props.text = substitute(&text_props.text, mapping, row);
        }
    }
    substituted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{Element, TextProperties};
    use pretty_assertions::assert_eq;

    fn text_element(id: &str, text: &str) -> Element {
        let mut el = Element::text_block(id);
        el.properties = Properties::Text(TextProperties {
            text: text.into(),
            ..Default::default()
        });
        el
    }

    fn row(pairs: &[(&str, Value)]) -> Row {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    fn mapping(pairs: &[(&str, &str)]) -> Mapping {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn extract_collapses_duplicates() {
        let elements = vec![
            text_element("a", "Hi {name}, {name}! Course: {course}"),
            text_element("b", "{course}"),
            Element::image_block("c", "x", (10, 10)),
        ];
        let fields = extract_fields(&elements);
        assert_eq!(
            fields.into_iter().collect::<Vec<_>>(),
            vec!["course".to_string(), "name".to_string()]
        );
    }

    #[test]
    fn extract_is_order_independent() {
        let forward = vec![text_element("a", "{x} {y}"), text_element("b", "{z}")];
        let reversed: Vec<Element> = forward.iter().rev().cloned().collect();
        assert_eq!(extract_fields(&forward), extract_fields(&reversed));
    }

    #[test]
    fn substitute_mapped_value() {
        let m = mapping(&[("name", "Col1")]);
        let r = row(&[("Col1", Value::String("Ana".into()))]);
        assert_eq!(substitute("Hi {name}", &m, &r), "Hi Ana");
    }

    #[test]
    fn substitute_unmapped_field_stays_literal() {
        let m = Mapping::new();
        let r = row(&[("Col1", Value::String("Ana".into()))]);
        assert_eq!(substitute("Hi {name}", &m, &r), "Hi {name}");
    }

    #[test]
    fn substitute_missing_and_null_values_render_empty() {
        let m = mapping(&[("name", "Col1"), ("course", "Col2")]);
        let r = row(&[("Col2", Value::Null)]);
        assert_eq!(substitute("{name}|{course}|", &m, &r), "||");
    }

    #[test]
    fn substitute_stringifies_numbers() {
        let m = mapping(&[("score", "S")]);
        let r = row(&[("S", Value::from(95))]);
        assert_eq!(substitute("Score: {score}", &m, &r), "Score: 95");
    }

    #[test]
    fn substitute_is_non_recursive() {
        // A substituted value containing no braces is stable under a second pass
        let m = mapping(&[("a", "A")]);
        let r = row(&[("A", Value::String("plain".into()))]);
        let once = substitute("x {a} y", &m, &r);
        assert_eq!(substitute(&once, &m, &r), once);
    }

    #[test]
    fn unmatched_braces_are_literal() {
        let m = mapping(&[("a", "A")]);
        let r = row(&[("A", Value::String("v".into()))]);
        assert_eq!(substitute("open { no close", &m, &r), "open { no close");
        assert_eq!(substitute("empty {} kept", &m, &r), "empty {} kept");
        // A '{' inside a candidate token restarts the scan: "{x{a}" keeps the
        // first brace literal and substitutes the inner token
        assert_eq!(substitute("{x{a}", &m, &r), "{xv");
    }

    #[test]
    fn render_for_row_clones_and_substitutes() {
        let mut template = Template::untitled();
        template.elements.push(text_element("t", "Hi {name}"));
        let m = mapping(&[("name", "Col1")]);
        let r = row(&[("Col1", Value::String("Ben".into()))]);

        let rendered = render_template_for_row(&template, &m, &r);
        assert_eq!(rendered.elements[0].text(), Some("Hi Ben"));
        // Source untouched
        assert_eq!(template.elements[0].text(), Some("Hi {name}"));
    }
}
