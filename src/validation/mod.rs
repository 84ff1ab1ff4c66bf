/// Declarative request validation
///
/// Each route that accepts a structured body declares a `Schema` mapping
/// field names to rules. Validation is a single pass that collects every
/// violation instead of failing on the first, strips unknown fields, and
/// applies defaults, so handlers only ever see normalized input.
use crate::error::ApiError;
use serde::Serialize;
use serde_json::{Map, Value};

/// One field-level validation failure
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Violation {
    pub field: String,
    pub message: String,
}

/// Expected value shape for a field
#[derive(Debug, Clone)]
pub enum Kind {
    Str {
        min_len: Option<usize>,
        max_len: Option<usize>,
        format: Option<Format>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
        integer: bool,
    },
    Bool,
}

/// Enumerated string formats
#[derive(Debug, Clone, Copy)]
pub enum Format {
    Uuid,
    /// Calendar date, YYYY-MM-DD
    Date,
}

/// Rule for a single named field
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    kind: Kind,
    required: bool,
    default: Option<Value>,
}

impl Field {
    pub fn string(name: &'static str) -> Self {
        Field {
            name,
            kind: Kind::Str {
                min_len: None,
                max_len: None,
                format: None,
            },
            required: false,
            default: None,
        }
    }

    pub fn number(name: &'static str) -> Self {
        Field {
            name,
            kind: Kind::Number {
                min: None,
                max: None,
                integer: false,
            },
            required: false,
            default: None,
        }
    }

    pub fn integer(name: &'static str) -> Self {
        Field {
            name,
            kind: Kind::Number {
                min: None,
                max: None,
                integer: true,
            },
            required: false,
            default: None,
        }
    }

    pub fn boolean(name: &'static str) -> Self {
        Field {
            name,
            kind: Kind::Bool,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn min_len(mut self, n: usize) -> Self {
        if let Kind::Str { ref mut min_len, .. } = self.kind {
            *min_len = Some(n);
        }
        self
    }

    pub fn max_len(mut self, n: usize) -> Self {
        if let Kind::Str { ref mut max_len, .. } = self.kind {
            *max_len = Some(n);
        }
        self
    }

    pub fn format(mut self, f: Format) -> Self {
        if let Kind::Str { ref mut format, .. } = self.kind {
            *format = Some(f);
        }
        self
    }

    pub fn min(mut self, n: f64) -> Self {
        if let Kind::Number { ref mut min, .. } = self.kind {
            *min = Some(n);
        }
        self
    }

    pub fn max(mut self, n: f64) -> Self {
        if let Kind::Number { ref mut max, .. } = self.kind {
            *max = Some(n);
        }
        self
    }

    /// Check one present value against this rule
    fn check(&self, value: &Value, errors: &mut Vec<Violation>) {
        match &self.kind {
            Kind::Str {
                min_len,
                max_len,
                format,
            } => {
                let Some(s) = value.as_str() else {
                    errors.push(Violation {
                        field: self.name.to_string(),
                        message: format!("{} must be a string", self.name),
                    });
                    return;
                };
                if let Some(min) = min_len {
                    if s.chars().count() < *min {
                        errors.push(Violation {
                            field: self.name.to_string(),
                            message: format!("{} must be at least {} characters", self.name, min),
                        });
                    }
                }
                if let Some(max) = max_len {
                    if s.chars().count() > *max {
                        errors.push(Violation {
                            field: self.name.to_string(),
                            message: format!("{} must be at most {} characters", self.name, max),
                        });
                    }
                }
                match format {
                    Some(Format::Uuid) => {
                        if uuid::Uuid::parse_str(s).is_err() {
                            errors.push(Violation {
                                field: self.name.to_string(),
                                message: format!("{} must be a valid UUID", self.name),
                            });
                        }
                    }
                    Some(Format::Date) => {
                        if chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d").is_err() {
                            errors.push(Violation {
                                field: self.name.to_string(),
                                message: format!("{} must be a date in YYYY-MM-DD format", self.name),
                            });
                        }
                    }
                    None => {}
                }
            }
            Kind::Number { min, max, integer } => {
                let Some(n) = value.as_f64() else {
                    errors.push(Violation {
                        field: self.name.to_string(),
                        message: format!("{} must be a number", self.name),
                    });
                    return;
                };
                if *integer && value.as_i64().is_none() {
                    errors.push(Violation {
                        field: self.name.to_string(),
                        message: format!("{} must be an integer", self.name),
                    });
                }
                if let Some(min) = min {
                    if n < *min {
                        errors.push(Violation {
                            field: self.name.to_string(),
                            message: format!("{} must be at least {}", self.name, min),
                        });
                    }
                }
                if let Some(max) = max {
                    if n > *max {
                        errors.push(Violation {
                            field: self.name.to_string(),
                            message: format!("{} must be at most {}", self.name, max),
                        });
                    }
                }
            }
            Kind::Bool => {
                if !value.is_boolean() {
                    errors.push(Violation {
                        field: self.name.to_string(),
                        message: format!("{} must be a boolean", self.name),
                    });
                }
            }
        }
    }
}

/// Declared shape of one request body
#[derive(Debug, Clone)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Schema { fields: Vec::new() }
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Validate and normalize an input object.
    ///
    /// Returns the normalized object (unknown fields stripped, defaults
    /// applied) or every violation found in one pass.
    pub fn validate(&self, input: &Value) -> Result<Map<String, Value>, Vec<Violation>> {
        let empty = Map::new();
        let object = match input {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(vec![Violation {
                    field: "body".to_string(),
                    message: "Request body must be a JSON object".to_string(),
                }]);
            }
        };

        let mut errors = Vec::new();
        let mut normalized = Map::new();

        for field in &self.fields {
            match object.get(field.name) {
                Some(Value::Null) | None => {
                    if field.required {
                        errors.push(Violation {
                            field: field.name.to_string(),
                            message: format!("{} is required", field.name),
                        });
                    } else if let Some(default) = &field.default {
                        normalized.insert(field.name.to_string(), default.clone());
                    }
                }
                Some(value) => {
                    field.check(value, &mut errors);
                    normalized.insert(field.name.to_string(), value.clone());
                }
            }
        }

        if errors.is_empty() {
            Ok(normalized)
        } else {
            Err(errors)
        }
    }

    /// Validate, mapping violations into the error taxonomy
    pub fn checked(&self, input: &Value) -> Result<Map<String, Value>, ApiError> {
        self.validate(input).map_err(|violations| ApiError::Validation {
            message: "Validation failed".to_string(),
            violations,
        })
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}
