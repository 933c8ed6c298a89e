use rmq_core::truncate_for_display;
use rmq_http::HttpEvidence;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

const ACTUAL_DISPLAY_CHARS: usize = 400;

#[derive(Debug, Clone, PartialEq)]
/// Data collected from the live system for one check.
pub enum Evidence {
    Text(String),
    Http(HttpEvidence),
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("expected {expected}, got {actual}")]
/// Evidence did not match an expectation.
pub struct AssertionMismatch {
    pub expected: String,
    pub actual: String,
}

impl AssertionMismatch {
    fn new(expected: impl Into<String>, actual: impl AsRef<str>) -> Self {
        Self {
            expected: expected.into(),
            actual: truncate_for_display(actual.as_ref(), ACTUAL_DISPLAY_CHARS),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One declarative check against a piece of evidence.
pub enum Expectation {
    /// Literal substring of the text (or raw body) evidence.
    Contains(String),
    StatusEquals(u16),
    /// Value at a JSON pointer equals `expected`.
    JsonEquals { pointer: String, expected: Value },
    /// Array at a JSON pointer has exactly `expected` elements.
    JsonLength { pointer: String, expected: usize },
    /// Every element of the array at `pointer` satisfies all `expectations`.
    JsonEach {
        pointer: String,
        expectations: Vec<Expectation>,
    },
    /// The `field` strings of the array at `pointer` include `expected`.
    /// A missing array counts as empty.
    JsonNamesInclude {
        pointer: String,
        field: String,
        expected: String,
    },
}

impl Expectation {
    pub fn contains(fragment: impl Into<String>) -> Self {
        Self::Contains(fragment.into())
    }

    pub fn status(status: u16) -> Self {
        Self::StatusEquals(status)
    }

    pub fn json_equals(pointer: impl Into<String>, expected: impl Into<Value>) -> Self {
        Self::JsonEquals {
            pointer: pointer.into(),
            expected: expected.into(),
        }
    }

    pub fn json_length(pointer: impl Into<String>, expected: usize) -> Self {
        Self::JsonLength {
            pointer: pointer.into(),
            expected,
        }
    }

    pub fn json_each(pointer: impl Into<String>, expectations: Vec<Expectation>) -> Self {
        Self::JsonEach {
            pointer: pointer.into(),
            expectations,
        }
    }

    pub fn json_names_include(
        pointer: impl Into<String>,
        field: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::JsonNamesInclude {
            pointer: pointer.into(),
            field: field.into(),
            expected: expected.into(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Expectation::Contains(fragment) => format!("contains `{fragment}`"),
            Expectation::StatusEquals(status) => format!("status == {status}"),
            Expectation::JsonEquals { pointer, expected } => {
                format!("json {} == {expected}", display_pointer(pointer))
            }
            Expectation::JsonLength { pointer, expected } => {
                format!("json {} has {expected} elements", display_pointer(pointer))
            }
            Expectation::JsonEach {
                pointer,
                expectations,
            } => format!(
                "every element of json {} satisfies [{}]",
                display_pointer(pointer),
                expectations
                    .iter()
                    .map(Expectation::describe)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            Expectation::JsonNamesInclude {
                pointer,
                field,
                expected,
            } => format!(
                "json {}[].{field} includes `{expected}`",
                display_pointer(pointer)
            ),
        }
    }

    pub fn evaluate(&self, evidence: &Evidence) -> Result<(), AssertionMismatch> {
        match (self, evidence) {
            (Expectation::Contains(fragment), Evidence::Text(text)) => {
                contains(fragment, text)
            }
            (Expectation::Contains(fragment), Evidence::Http(http)) => {
                contains(fragment, &http.text())
            }
            (Expectation::StatusEquals(expected), Evidence::Http(http)) => {
                if http.status == *expected {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new(
                        format!("status {expected}"),
                        format!("status {}", http.status),
                    ))
                }
            }
            (Expectation::StatusEquals(expected), Evidence::Text(_)) => Err(
                AssertionMismatch::new(
                    format!("status {expected}"),
                    "text evidence without status",
                ),
            ),
            (_, Evidence::Http(http)) => match http.json() {
                Some(body) => self.evaluate_json(body),
                None => Err(AssertionMismatch::new(
                    self.describe(),
                    format!("non-JSON body (status {}): {}", http.status, http.text()),
                )),
            },
            (_, Evidence::Text(text)) => match serde_json::from_str::<Value>(text) {
                Ok(body) => self.evaluate_json(&body),
                Err(_) => Err(AssertionMismatch::new(
                    self.describe(),
                    format!("non-JSON text: {text}"),
                )),
            },
        }
    }

    fn evaluate_json(&self, body: &Value) -> Result<(), AssertionMismatch> {
        match self {
            Expectation::Contains(fragment) => contains(fragment, &body.to_string()),
            Expectation::StatusEquals(expected) => Err(AssertionMismatch::new(
                format!("status {expected}"),
                "JSON value without status",
            )),
            Expectation::JsonEquals { pointer, expected } => {
                let actual = resolve(body, pointer)?;
                if actual == expected {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new(
                        format!("{} == {expected}", display_pointer(pointer)),
                        actual.to_string(),
                    ))
                }
            }
            Expectation::JsonLength { pointer, expected } => {
                let items = resolve_array(body, pointer)?;
                if items.len() == *expected {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new(
                        format!("{} with {expected} elements", display_pointer(pointer)),
                        format!("{} elements", items.len()),
                    ))
                }
            }
            Expectation::JsonEach {
                pointer,
                expectations,
            } => {
                let items = resolve_array(body, pointer)?;
                let failures = items
                    .iter()
                    .enumerate()
                    .flat_map(move |(index, item)| {
                        expectations.iter().filter_map(move |expectation| {
                            expectation
                                .evaluate_json(item)
                                .err()
                                .map(|mismatch| format!("[{index}] {mismatch}"))
                        })
                    })
                    .collect::<Vec<_>>();
                if failures.is_empty() {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new(self.describe(), failures.join("; ")))
                }
            }
            Expectation::JsonNamesInclude {
                pointer,
                field,
                expected,
            } => {
                let names = match body.pointer(pointer) {
                    None | Some(Value::Null) => Vec::new(),
                    Some(Value::Array(items)) => items
                        .iter()
                        .filter_map(|item| item.get(field.as_str()).and_then(Value::as_str))
                        .collect::<Vec<_>>(),
                    Some(other) => {
                        return Err(AssertionMismatch::new(
                            format!("array at {}", display_pointer(pointer)),
                            other.to_string(),
                        ))
                    }
                };
                if names.iter().any(|name| *name == expected.as_str()) {
                    Ok(())
                } else {
                    Err(AssertionMismatch::new(
                        format!("{field} `{expected}` present"),
                        format!("[{}]", names.join(", ")),
                    ))
                }
            }
        }
    }
}

fn contains(fragment: &str, text: &str) -> Result<(), AssertionMismatch> {
    if text.contains(fragment) {
        Ok(())
    } else {
        Err(AssertionMismatch::new(format!("text containing `{fragment}`"), text))
    }
}

fn display_pointer(pointer: &str) -> &str {
    if pointer.is_empty() {
        "<root>"
    } else {
        pointer
    }
}

fn resolve<'a>(body: &'a Value, pointer: &str) -> Result<&'a Value, AssertionMismatch> {
    body.pointer(pointer).ok_or_else(|| {
        AssertionMismatch::new(
            format!("value at {}", display_pointer(pointer)),
            format!("missing in {body}"),
        )
    })
}

fn resolve_array<'a>(body: &'a Value, pointer: &str) -> Result<&'a Vec<Value>, AssertionMismatch> {
    let value = resolve(body, pointer)?;
    value.as_array().ok_or_else(|| {
        AssertionMismatch::new(
            format!("array at {}", display_pointer(pointer)),
            value.to_string(),
        )
    })
}
