//! A lenient, schema-agnostic view of a model document.
//!
//! Documents are YAML (and therefore also JSON). The [`Document`] and
//! [`Node`] types hide the irregularities the importer tolerates:
//!
//! - field names are matched ignoring case, surrounding whitespace and the
//!   difference between `-` and `_`;
//! - scalar text has its whitespace collapsed, and numbers and booleans read
//!   as text;
//! - element lists may be given as a sequence or as a single mapping, and
//!   each item may be wrapped in a single-entry mapping naming the element
//!   (`- characteristic: {...}`);
//! - YAML tags are ignored.

use serde_yaml::{Mapping, Value};

/// Element names holding characteristics below a characteristic.
const CHARACTERISTIC_LISTS: &[&str] = &["characteristics", "children", "characteristic"];

/// Element names holding the root characteristics of a mapping root.
const ROOT_LISTS: &[&str] = &["characteristics", "characteristic"];

/// Fields marking a mapping root as a single characteristic.
const CHARACTERISTIC_FIELDS: &[&str] = &["key", "name"];

/// Element names holding requirements.
const REQUIREMENT_LISTS: &[&str] = &["requirements", "requirement"];

/// The input could not be read as a model document at all.
#[derive(Debug, thiserror::Error)]
pub enum MalformedDocumentError {
    /// The input is not UTF-8 text.
    #[error("document is not valid UTF-8 text")]
    NotText(#[from] std::str::Utf8Error),

    /// The input is not well-formed YAML or JSON.
    #[error("document could not be parsed: {0}")]
    Syntax(#[from] serde_yaml::Error),

    /// The input parsed, but holds no characteristics root element.
    #[error("document has no characteristics root element")]
    NoRoot,
}

/// A parsed model document.
#[derive(Debug, Clone)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Parses a document.
    ///
    /// The root must be one of:
    ///
    /// - a sequence of characteristic elements;
    /// - a mapping with a `characteristics` (or `characteristic`) element;
    /// - a single characteristic, i.e. a mapping with a `key` or `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not YAML, or if it has no
    /// characteristics root element.
    pub fn parse(text: &str) -> Result<Self, MalformedDocumentError> {
        if text.trim().is_empty() {
            return Err(MalformedDocumentError::NoRoot);
        }

        let root: Value = serde_yaml::from_str(text)?;
        let has_root = match untag(&root) {
            Value::Sequence(_) => true,
            Value::Mapping(mapping) => root_characteristics(mapping).is_some(),
            _ => false,
        };

        if has_root {
            Ok(Self { root })
        } else {
            Err(MalformedDocumentError::NoRoot)
        }
    }

    /// Parses a document from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not UTF-8, or for any reason
    /// [`Document::parse`] fails.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MalformedDocumentError> {
        Self::parse(std::str::from_utf8(bytes)?)
    }

    /// The root characteristic elements, in document order.
    #[must_use]
    pub fn characteristics(&self) -> Vec<Node<'_>> {
        match untag(&self.root) {
            Value::Sequence(items) => elements(items, "characteristic"),
            Value::Mapping(mapping) => root_characteristics(mapping).unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

/// An element of a [`Document`]: a mapping from field names to values.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    mapping: &'a Mapping,
}

impl<'a> Node<'a> {
    fn get(&self, field: &str) -> Option<&'a Value> {
        let wanted = normalize_name(field);
        self.mapping
            .iter()
            .find(|(name, _)| {
                untag(name).as_str().map(normalize_name).as_deref() == Some(wanted.as_str())
            })
            .map(|(_, value)| untag(value))
    }

    fn has_any(&self, fields: &[&str]) -> bool {
        fields.iter().any(|field| self.get(field).is_some())
    }

    /// The text of a scalar field, with whitespace collapsed.
    ///
    /// Returns `None` if the field is absent, is not a scalar, or holds only
    /// whitespace.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::Sequence(_) | Value::Mapping(_) => None,
            value => render(value).filter(|text| !text.is_empty()),
        }
    }

    /// The value of a field as written, whatever its shape.
    ///
    /// Only an absent or null field gives `None`. Empty strings are kept, and
    /// sequences and mappings are rendered inline (`[1]`, `{"x":1}`), so a
    /// value that is present but unusable can be reported as such.
    #[must_use]
    pub fn raw(&self, field: &str) -> Option<String> {
        self.get(field).and_then(render)
    }

    /// A nested mapping field.
    #[must_use]
    pub fn child(&self, field: &str) -> Option<Self> {
        match self.get(field)? {
            Value::Mapping(mapping) => Some(Node { mapping }),
            _ => None,
        }
    }

    /// Nested characteristic elements, in document order.
    #[must_use]
    pub fn characteristics(&self) -> Vec<Self> {
        self.elements(CHARACTERISTIC_LISTS, "characteristic")
    }

    /// Requirement elements, in document order.
    #[must_use]
    pub fn requirements(&self) -> Vec<Self> {
        self.elements(REQUIREMENT_LISTS, "requirement")
    }

    fn elements(&self, lists: &[&str], element: &str) -> Vec<Self> {
        lists
            .iter()
            .filter_map(|list| self.get(list))
            .flat_map(|value| match value {
                Value::Sequence(items) => elements(items, element),
                Value::Mapping(_) => elements(std::slice::from_ref(value), element),
                _ => Vec::new(),
            })
            .collect()
    }
}

/// The root characteristics of a mapping root, or `None` if the mapping is
/// neither a characteristic nor holds a root list.
fn root_characteristics(mapping: &Mapping) -> Option<Vec<Node<'_>>> {
    let node = Node { mapping };
    if node.has_any(CHARACTERISTIC_FIELDS) {
        Some(vec![node])
    } else if node.has_any(ROOT_LISTS) {
        Some(node.elements(ROOT_LISTS, "characteristic"))
    } else {
        None
    }
}

/// Mapping items of a list, unwrapping `{<element>: {...}}` wrappers.
fn elements<'a>(items: &'a [Value], element: &str) -> Vec<Node<'a>> {
    items
        .iter()
        .filter_map(|item| match untag(item) {
            Value::Mapping(mapping) => Some(unwrap_element(mapping, element)),
            other => {
                tracing::trace!(?other, "skipping non-mapping {element} item");
                None
            }
        })
        .collect()
}

fn unwrap_element<'a>(mapping: &'a Mapping, element: &str) -> Node<'a> {
    let node = Node { mapping };
    if mapping.len() == 1 {
        if let Some(inner) = node.child(element) {
            return inner;
        }
    }
    node
}

fn render(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(text) => Some(text.split_whitespace().collect::<Vec<_>>().join(" ")),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => Some(
            serde_json::to_string(value)
                .or_else(|_| serde_yaml::to_string(value).map(|text| text.trim().to_string()))
                .unwrap_or_default(),
        ),
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_ascii_lowercase().replace('_', "-")
}
