//! Schema-validated project configuration.
//!
//! A [`Schema`] is a tree of named [`Node`]s. Leaves carry a default value
//! and the set of [`Type`]s they accept; objects nest further schemas.
//! Loading a file deep-merges it over the defaults and rejects any key or
//! value the schema does not allow.

use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A JSON value type accepted by a schema leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// `true` or `false`.
    Boolean,
    /// A whole number. Booleans never satisfy this type.
    Integer,
    /// A string.
    String,
    /// A list whose elements all satisfy `element`.
    List {
        /// Type of every element.
        element: Box<Type>,
        /// Minimum number of elements.
        min_length: usize,
    },
}

impl Type {
    /// A list of `element` with no length requirement.
    #[must_use]
    pub fn list(element: Type) -> Self {
        Self::List {
            element: Box::new(element),
            min_length: 0,
        }
    }

    /// A list of `element` with at least `min_length` entries.
    #[must_use]
    pub fn list_min(element: Type, min_length: usize) -> Self {
        Self::List {
            element: Box::new(element),
            min_length,
        }
    }

    /// Returns `true` if `value` satisfies this type.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Boolean => value.is_boolean(),
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::String => value.is_string(),
            Self::List {
                element,
                min_length,
            } => value.as_array().is_some_and(|items| {
                items.len() >= *min_length && items.iter().all(|item| element.accepts(item))
            }),
        }
    }

    /// Infers the type of a default value.
    ///
    /// Lists infer their element type from the first element and fall back
    /// to strings when empty.
    fn of(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(_) => Some(Self::Boolean),
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(Self::Integer),
            Value::String(_) => Some(Self::String),
            Value::Array(items) => {
                let element = items.first().map_or(Some(Self::String), Self::of)?;
                Some(Self::list(element))
            }
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Boolean => write!(f, "boolean"),
            Self::Integer => write!(f, "integer"),
            Self::String => write!(f, "string"),
            Self::List {
                element,
                min_length: 0,
            } => write!(f, "list of {element}"),
            Self::List {
                element,
                min_length,
            } => write!(f, "list of {element} (at least {min_length})"),
        }
    }
}

/// A node in the configuration schema.
#[derive(Debug, Clone)]
pub enum Node {
    /// A leaf value with a default and its admissible types.
    Value {
        /// Value used when the file does not override it.
        default: Value,
        /// The value must satisfy at least one of these.
        types: Vec<Type>,
    },
    /// A nested object.
    Object(Schema),
}

impl Node {
    /// A leaf whose only admissible type is inferred from `default`.
    #[must_use]
    pub fn value(default: impl Into<Value>) -> Self {
        let default = default.into();
        let types = Type::of(&default).into_iter().collect();
        Self::Value { default, types }
    }

    /// A leaf with explicitly listed admissible types.
    #[must_use]
    pub fn with_types(default: impl Into<Value>, types: Vec<Type>) -> Self {
        Self::Value {
            default: default.into(),
            types,
        }
    }

    /// A list-of-strings leaf.
    #[must_use]
    pub fn strings(default: &[&str]) -> Self {
        Self::Value {
            default: Value::from(default.to_vec()),
            types: vec![Type::list(Type::String)],
        }
    }

    /// A nested object.
    #[must_use]
    pub fn object(schema: Schema) -> Self {
        Self::Object(schema)
    }

    fn default_value(&self) -> Value {
        match self {
            Self::Value { default, .. } => default.clone(),
            Self::Object(schema) => Value::Object(schema.defaults()),
        }
    }
}

/// An ordered set of named schema nodes.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    nodes: Vec<(String, Node)>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named node.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, node: Node) -> Self {
        self.nodes.push((key.into(), node));
        self
    }

    fn get(&self, key: &str) -> Option<&Node> {
        self.nodes.iter().find(|(k, _)| k == key).map(|(_, n)| n)
    }

    /// Builds the full tree of default values.
    #[must_use]
    pub fn defaults(&self) -> Map<String, Value> {
        self.nodes
            .iter()
            .map(|(key, node)| (key.clone(), node.default_value()))
            .collect()
    }

    fn verify(&self, values: &Map<String, Value>, parent: Option<&str>) -> Result<(), ConfigError> {
        for (key, value) in values {
            let key_path = parent.map_or_else(|| key.clone(), |p| format!("{p}.{key}"));

            let Some(node) = self.get(key) else {
                return Err(ConfigError::UnknownKey { key: key_path });
            };

            match node {
                Node::Object(schema) => {
                    let Some(nested) = value.as_object() else {
                        return Err(ConfigError::WrongType {
                            key: key_path,
                            expected: "object".to_string(),
                        });
                    };
                    schema.verify(nested, Some(&key_path))?;
                }
                Node::Value { types, .. } => {
                    if !types.iter().any(|t| t.accepts(value)) {
                        return Err(ConfigError::WrongType {
                            key: key_path,
                            expected: types
                                .iter()
                                .map(ToString::to_string)
                                .collect::<Vec<_>>()
                                .join(" or "),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Merges `overrides` onto `defaults`. Only objects recurse, everything
/// else is replaced wholesale.
fn merge(defaults: &mut Map<String, Value>, overrides: Map<String, Value>) {
    for (key, value) in overrides {
        match value {
            Value::Object(nested) => {
                if let Some(Value::Object(existing)) = defaults.get_mut(&key) {
                    merge(existing, nested);
                    continue;
                }
                defaults.insert(key, Value::Object(nested));
            }
            value => {
                defaults.insert(key, value);
            }
        }
    }
}

/// A fully merged and validated configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    values: Map<String, Value>,
}

impl Config {
    /// Creates a configuration holding only the schema defaults.
    #[must_use]
    pub fn defaults(schema: &Schema) -> Self {
        Self {
            values: schema.defaults(),
        }
    }

    /// Loads a configuration file and merges it over the schema defaults.
    ///
    /// A missing file is not an error; it yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not a JSON object,
    /// or contains keys or values the schema does not allow.
    pub fn load(path: &Path, schema: &Schema) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                return Ok(Self::defaults(schema));
            }
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&content, schema).map_err(|e| e.in_file(path))
    }

    /// Parses configuration content and merges it over the schema defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the content is not a JSON object or does not
    /// validate against the schema.
    pub fn parse(content: &str, schema: &Schema) -> Result<Self, ConfigError> {
        let parsed: Value = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

        let Value::Object(overrides) = parsed else {
            return Err(ConfigError::Parse {
                message: "top level value is not an object".to_string(),
            });
        };

        let mut values = schema.defaults();
        merge(&mut values, overrides);
        schema.verify(&values, None)?;

        Ok(Self { values })
    }

    /// Returns the raw value for a top-level key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Returns a view of a nested object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lookup`] if `key` is not an object.
    pub fn section(&self, key: &str) -> Result<Section<'_>, ConfigError> {
        self.values
            .get(key)
            .and_then(Value::as_object)
            .map(|values| Section {
                key: key.to_string(),
                values,
            })
            .ok_or_else(|| ConfigError::Lookup {
                key: key.to_string(),
            })
    }

    /// Returns a string value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lookup`] if `key` is not a string.
    pub fn string(&self, key: &str) -> Result<&str, ConfigError> {
        string_in(&self.values, key, key)
    }

    /// Returns a list-of-strings value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lookup`] if `key` is not a list of strings.
    pub fn strings(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        strings_in(&self.values, key, key)
    }
}

/// A borrowed view of a nested configuration object.
#[derive(Debug, Clone)]
pub struct Section<'a> {
    key: String,
    values: &'a Map<String, Value>,
}

impl<'a> Section<'a> {
    /// Returns the raw value for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&'a Value> {
        self.values.get(key)
    }

    /// Returns a string value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lookup`] if `key` is not a string.
    pub fn string(&self, key: &str) -> Result<&'a str, ConfigError> {
        string_in(self.values, key, &format!("{}.{key}", self.key))
    }

    /// Returns a list-of-strings value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lookup`] if `key` is not a list of strings.
    pub fn strings(&self, key: &str) -> Result<Vec<String>, ConfigError> {
        strings_in(self.values, key, &format!("{}.{key}", self.key))
    }
}

fn string_in<'a>(
    values: &'a Map<String, Value>,
    key: &str,
    key_path: &str,
) -> Result<&'a str, ConfigError> {
    values
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ConfigError::Lookup {
            key: key_path.to_string(),
        })
}

fn strings_in(
    values: &Map<String, Value>,
    key: &str,
    key_path: &str,
) -> Result<Vec<String>, ConfigError> {
    values
        .get(key)
        .and_then(Value::as_array)
        .and_then(|items| {
            items
                .iter()
                .map(|item| item.as_str().map(String::from))
                .collect::<Option<Vec<_>>>()
        })
        .ok_or_else(|| ConfigError::Lookup {
            key: key_path.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config content.
    #[error("failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A key that the schema does not declare.
    #[error("unknown configuration key \"{key}\"")]
    UnknownKey {
        /// Dotted path of the key.
        key: String,
    },

    /// A value that satisfies none of the admissible types.
    #[error("value for \"{key}\" is of wrong type, expected {expected}")]
    WrongType {
        /// Dotted path of the key.
        key: String,
        /// Description of the admissible types.
        expected: String,
    },

    /// A lookup of a key that does not exist or has another type.
    #[error("configuration key \"{key}\" is missing or has an unexpected type")]
    Lookup {
        /// Dotted path of the key.
        key: String,
    },

    /// Any of the above, attributed to a file.
    #[error("invalid config {}: {source}", .path.display())]
    File {
        /// Path of the configuration file.
        path: PathBuf,
        /// The underlying error.
        source: Box<ConfigError>,
    },
}

impl ConfigError {
    fn in_file(self, path: &Path) -> Self {
        Self::File {
            path: path.to_path_buf(),
            source: Box::new(self),
        }
    }
}
