//! Form field descriptions and text parsing.

use crate::validation::FieldError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

/// How a field's text is interpreted on submit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    /// Never prefilled from a record; left blank on edit means "keep the current value"
    Secret,
    /// Unsigned whole number no larger than `max`
    Integer { max: u64 },
    Decimal,
    Select { options: &'static [&'static str] },
    Toggle,
}

/// Static description of one field of an entity form.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    /// Dotted path into the request body, e.g. `config.temperature`
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    /// Blank text is an error rather than "not set"
    pub required: bool,
    /// Text shown in a fresh create form
    pub default: &'static str,
    pub placeholder: Option<&'static str>,
    /// Only offered when creating (e.g. a model's id)
    pub create_only: bool,
    /// Blanking the field on an edit form removes the stored value
    pub clearable: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            label,
            kind,
            required: false,
            default: "",
            placeholder: None,
            create_only: false,
            clearable: false,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn default_value(mut self, default: &'static str) -> Self {
        self.default = default;
        self
    }

    pub const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub const fn create_only(mut self) -> Self {
        self.create_only = true;
        self
    }

    pub const fn clearable(mut self) -> Self {
        self.clearable = true;
        self
    }

    /// Parse text changed on an edit form. Blank text can only remove a value the update
    /// body can express as removed; elsewhere it is an error rather than "no change".
    /// Secrets are the exception: blank keeps the stored secret.
    pub(crate) fn parse_edit(&self, text: &str) -> Result<Value, FieldError> {
        if text.trim().is_empty() && !self.clearable && self.kind != FieldKind::Secret {
            return Err(FieldError::new(self.name, "is required"));
        }
        self.parse(text)
    }

    /// Convert the typed text into a JSON value for the request body.
    ///
    /// Blank optional fields become `null`. Numbers are never coerced: `"abc"` is an error.
    pub(crate) fn parse(&self, text: &str) -> Result<Value, FieldError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return match self.kind {
                // Blank required text is reported by the request's own validation
                FieldKind::Text | FieldKind::Email | FieldKind::Secret if self.required => Ok(Value::String(text.to_string())),
                _ if self.required => Err(FieldError::new(self.name, "is required")),
                _ => Ok(Value::Null),
            };
        }

        match self.kind {
            FieldKind::Text | FieldKind::Email | FieldKind::Secret => Ok(Value::String(trimmed.to_string())),
            FieldKind::Integer { max } => {
                let value: u64 = trimmed
                    .parse()
                    .map_err(|_| FieldError::new(self.name, "must be a whole number"))?;
                if value > max {
                    return Err(FieldError::new(self.name, format!("must be at most {max}")));
                }
                Ok(Value::from(value))
            }
            FieldKind::Decimal => {
                let value: f64 = trimmed.parse().map_err(|_| FieldError::new(self.name, "must be a number"))?;
                serde_json::Number::from_f64(value)
                    .map(Value::Number)
                    .ok_or_else(|| FieldError::new(self.name, "must be a finite number"))
            }
            FieldKind::Select { options } => {
                if options.contains(&trimmed) {
                    Ok(Value::String(trimmed.to_string()))
                } else {
                    Err(FieldError::new(self.name, format!("must be one of: {}", options.join(", "))))
                }
            }
            FieldKind::Toggle => match trimmed {
                "true" | "on" | "yes" => Ok(Value::Bool(true)),
                "false" | "off" | "no" => Ok(Value::Bool(false)),
                _ => Err(FieldError::new(self.name, "must be true or false")),
            },
        }
    }

    /// Text shown for `value` when a form is prefilled from a record.
    pub(crate) fn prefill(&self, value: Option<&Value>) -> String {
        if self.kind == FieldKind::Secret {
            return String::new();
        }
        match value {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }
}

/// Look up a dotted path in a JSON object.
pub(crate) fn lookup<'v>(value: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(value, |current, segment| current.get(segment))
}

/// Insert `value` at a dotted path, creating intermediate objects.
pub(crate) fn insert(object: &mut Map<String, Value>, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            object.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = object
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                insert(child, rest, value);
            }
        }
    }
}

/// Input widget a client should render for a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Widget {
    Text,
    Email,
    Password,
    Number,
    Select,
    Toggle,
}

/// One field of a form as sent to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormFieldView {
    pub name: String,
    pub label: String,
    pub widget: Widget,
    pub required: bool,
    /// Current text of the field
    pub value: String,
    pub placeholder: Option<String>,
    /// Allowed values for select fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl FormFieldView {
    pub(crate) fn new(spec: &FieldSpec, value: &str) -> Self {
        let (widget, options) = match spec.kind {
            FieldKind::Text => (Widget::Text, vec![]),
            FieldKind::Email => (Widget::Email, vec![]),
            FieldKind::Secret => (Widget::Password, vec![]),
            FieldKind::Integer { .. } | FieldKind::Decimal => (Widget::Number, vec![]),
            FieldKind::Select { options } => (Widget::Select, options.iter().map(|o| o.to_string()).collect()),
            FieldKind::Toggle => (Widget::Toggle, vec![]),
        };
        Self {
            name: spec.name.to_string(),
            label: spec.label.to_string(),
            widget,
            required: spec.required,
            value: value.to_string(),
            placeholder: spec.placeholder.map(str::to_string),
            options,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PORT: FieldSpec = FieldSpec::new("port", "Port", FieldKind::Integer { max: u16::MAX as u64 });

    #[test]
    fn test_non_numeric_port_is_an_error_not_zero() {
        let err = PORT.parse("abc").unwrap_err();
        assert_eq!(err, FieldError::new("port", "must be a whole number"));
        assert_eq!(PORT.parse("-1").unwrap_err().field, "port");
        assert_eq!(PORT.parse("70000").unwrap_err().message, "must be at most 65535");
        assert_eq!(PORT.parse(" 5432 ").unwrap(), json!(5432));
    }

    #[test]
    fn test_blank_optional_is_null_and_blank_required_number_is_error() {
        assert_eq!(PORT.parse("").unwrap(), Value::Null);
        let required = FieldSpec::new("context_length", "Context Length", FieldKind::Integer { max: u32::MAX as u64 }).required();
        assert_eq!(required.parse("  ").unwrap_err().message, "is required");
    }

    #[test]
    fn test_select_and_toggle() {
        let select = FieldSpec::new("role", "Role", FieldKind::Select { options: &["admin", "user"] });
        assert_eq!(select.parse("admin").unwrap(), json!("admin"));
        assert_eq!(select.parse("owner").unwrap_err().message, "must be one of: admin, user");

        let toggle = FieldSpec::new("enabled", "Enabled", FieldKind::Toggle);
        assert_eq!(toggle.parse("on").unwrap(), json!(true));
        assert!(toggle.parse("maybe").is_err());
    }

    #[test]
    fn test_decimal_rejects_nan() {
        let decimal = FieldSpec::new("config.top_p", "Top P", FieldKind::Decimal);
        assert_eq!(decimal.parse("0.9").unwrap(), json!(0.9));
        assert!(decimal.parse("NaN").is_err());
        assert!(decimal.parse("ten").is_err());
    }

    #[test]
    fn test_secret_is_never_prefilled() {
        let secret = FieldSpec::new("key", "API Key", FieldKind::Secret);
        assert_eq!(secret.prefill(Some(&json!("sk-live"))), "");
    }

    #[test]
    fn test_nested_paths() {
        let mut object = Map::new();
        insert(&mut object, "name", json!("GPT-4"));
        insert(&mut object, "config.temperature", json!(0.2));
        insert(&mut object, "config.max_tokens", json!(100));
        let value = Value::Object(object);

        assert_eq!(value, json!({"name": "GPT-4", "config": {"temperature": 0.2, "max_tokens": 100}}));
        assert_eq!(lookup(&value, "config.max_tokens"), Some(&json!(100)));
        assert_eq!(lookup(&value, "config.top_p"), None);
    }
}
