//! Tag-list tokenizer for structured header lines.
//!
//! Structured header values are tag lists. Two grammars exist:
//!
//! | Versions | Example | Rules |
//! |----------|---------|-------|
//! | 4.0+ | `<ID=DP,Number=1,Type=Integer,Description="Depth, total">` | named tags, quoting, `\"` and `\\` escapes |
//! | 3.x | `DP,1,Integer,"Depth, total"` | positional values, quotes only protect commas |
//!
//! The modern grammar checks that the expected tags lead the list in order,
//! and accepts any extra tags after them. The legacy grammar has no tag names,
//! so every expected tag must be present, in order, with nothing extra.

use linked_hash_map::LinkedHashMap;

use crate::core::version::FormatVersion;
use crate::error::HeaderError;

/// Ordered attribute mapping of a structured header line.
pub type Attributes = LinkedHashMap<String, String>;

/// Tokenize the value of a structured header line using the grammar of `version`.
///
/// `expected` lists the tags the line kind requires, in their required order.
///
/// # Errors
///
/// Returns `HeaderError::MalformedLine` for unclosed quotes, tags out of order,
/// unexpected tags, or (legacy grammar) a value count that does not match.
pub fn parse_tags(
    version: FormatVersion,
    text: &str,
    expected: &[&str],
) -> Result<Attributes, HeaderError> {
    if version.uses_modern_grammar() {
        parse_modern(text, expected)
    } else {
        parse_legacy(text, expected)
    }
}

/// Accumulates one `TAG=value` pair at a time.
#[derive(Default)]
struct TagBuilder {
    attributes: Attributes,
    name: Option<String>,
    buffer: String,
}

impl TagBuilder {
    fn end_name(&mut self) {
        self.name = Some(self.buffer.trim().to_string());
        self.buffer.clear();
    }

    fn end_tag(&mut self, text: &str) -> Result<(), HeaderError> {
        let value = self.buffer.trim().to_string();
        self.buffer.clear();

        let Some(name) = self.name.take() else {
            if value.is_empty() {
                return Ok(());
            }
            return Err(HeaderError::MalformedLine(format!(
                "value '{value}' has no tag name in {text}"
            )));
        };

        if name.is_empty() {
            return Err(HeaderError::MalformedLine(format!(
                "empty tag name in {text}"
            )));
        }
        if self.attributes.contains_key(&name) {
            return Err(HeaderError::MalformedLine(format!(
                "duplicate tag '{name}' in {text}"
            )));
        }
        self.attributes.insert(name, value);
        Ok(())
    }
}

fn parse_modern(text: &str, expected: &[&str]) -> Result<Attributes, HeaderError> {
    let text = text.trim();
    let last = text.chars().count().saturating_sub(1);

    let mut builder = TagBuilder::default();
    let mut in_quote = false;
    let mut escape = false;
    let mut closed = false;

    for (i, c) in text.chars().enumerate() {
        if in_quote {
            if escape {
                // Only quotes and backslashes are unescaped
                if c != '"' && c != '\\' {
                    builder.buffer.push('\\');
                }
                builder.buffer.push(c);
                escape = false;
            } else {
                match c {
                    '\\' => escape = true,
                    '"' => in_quote = false,
                    other => builder.buffer.push(other),
                }
            }
            continue;
        }

        match c {
            '"' => in_quote = true,
            '<' if i == 0 => {}
            '>' if i == last => {
                builder.end_tag(text)?;
                closed = true;
            }
            '=' if builder.name.is_none() => builder.end_name(),
            ',' => builder.end_tag(text)?,
            other => builder.buffer.push(other),
        }
    }

    if in_quote {
        return Err(HeaderError::MalformedLine(format!(
            "unclosed quote in {text}"
        )));
    }
    if !closed {
        builder.end_tag(text)?;
    }

    let attributes = builder.attributes;
    if attributes.is_empty() && !expected.is_empty() {
        return Err(HeaderError::MalformedLine(format!(
            "no tags found in {text}, expected {}",
            expected.join(",")
        )));
    }
    check_tag_order(&attributes, expected, text)?;

    Ok(attributes)
}

fn check_tag_order(
    attributes: &Attributes,
    expected: &[&str],
    text: &str,
) -> Result<(), HeaderError> {
    for (index, (tag, expected_tag)) in attributes.keys().zip(expected).enumerate() {
        if tag == expected_tag {
            continue;
        }
        let problem = if expected.contains(&tag.as_str()) {
            "is out of order"
        } else {
            "is not allowed"
        };
        return Err(HeaderError::MalformedLine(format!(
            "tag '{tag}' at position {index} {problem} in {text}; expected tags {}",
            expected.join(",")
        )));
    }
    Ok(())
}

fn parse_legacy(text: &str, expected: &[&str]) -> Result<Attributes, HeaderError> {
    let mut values = Vec::new();
    let mut buffer = String::new();
    let mut in_quote = false;

    for c in text.chars() {
        match c {
            '"' => in_quote = !in_quote,
            ',' if !in_quote => values.push(std::mem::take(&mut buffer)),
            other => buffer.push(other),
        }
    }

    if in_quote {
        return Err(HeaderError::MalformedLine(format!(
            "unclosed quote in {text}"
        )));
    }
    values.push(buffer);

    if values.len() != expected.len() {
        return Err(HeaderError::MalformedLine(format!(
            "expected {} values ({}) but found {} in {text}",
            expected.len(),
            expected.join(","),
            values.len()
        )));
    }

    Ok(expected
        .iter()
        .map(|tag| (*tag).to_string())
        .zip(values)
        .collect())
}
