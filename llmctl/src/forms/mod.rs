//! Entity editor: add and edit forms over the four record kinds.
//!
//! A form is a list of text fields, exactly as typed into inputs. Opening a create form
//! fills every field with the kind's defaults; opening an edit form fills them from the
//! record. On submit the text is parsed field by field (collecting every error), assembled
//! into the same JSON body the typed API accepts, deserialized and validated.
//!
//! Edit forms only send the fields whose text differs from the prefill, so untouched
//! fields can never clobber the stored values.
//!
//! ```ignore
//! let mut form = EntityForm::<DatabaseConnectionForm>::open_create();
//! form.set("name", "Test DB")?;
//! form.set("port", "3306")?;
//! let create = form.submit_create()?;
//! ```

pub mod fields;
pub mod schemas;
pub mod visibility;

use crate::errors::{Error, Result};
use crate::types::EntityKind;
use crate::validation::{FieldError, Validate, Validator};
use fields::{FieldSpec, FormFieldView};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use utoipa::ToSchema;

pub use schemas::{ApiKeyForm, DatabaseConnectionForm, ModelForm, UserForm};

/// A record kind that can be edited through a form.
pub trait FormEntity {
    const KIND: EntityKind;

    /// Typed body produced by a create form
    type Create: DeserializeOwned + Validate;
    /// Typed body produced by an edit form
    type Update: DeserializeOwned + Validate;
    /// API representation an edit form is prefilled from
    type Record: Serialize;

    fn fields() -> &'static [FieldSpec];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum FormMode {
    Create,
    Edit,
}

#[derive(Debug, Clone)]
struct FormField {
    spec: FieldSpec,
    initial: String,
    value: String,
}

impl FormField {
    fn changed(&self) -> bool {
        self.value != self.initial
    }
}

/// An open add or edit form for entity kind `E`.
#[derive(Debug, Clone)]
pub struct EntityForm<E: FormEntity> {
    mode: FormMode,
    fields: Vec<FormField>,
    _entity: PhantomData<E>,
}

impl<E: FormEntity> EntityForm<E> {
    /// A fresh add form, pre-populated with the kind's defaults.
    pub fn open_create() -> Self {
        let fields = E::fields()
            .iter()
            .map(|spec| FormField {
                spec: *spec,
                initial: spec.default.to_string(),
                value: spec.default.to_string(),
            })
            .collect();
        Self {
            mode: FormMode::Create,
            fields,
            _entity: PhantomData,
        }
    }

    /// An edit form prefilled from `record`. Create-only fields are left out.
    pub fn open_edit(record: &E::Record) -> Result<Self> {
        let json = serde_json::to_value(record).map_err(|e| Error::Other(e.into()))?;
        let fields = E::fields()
            .iter()
            .filter(|spec| !spec.create_only)
            .map(|spec| {
                let text = spec.prefill(fields::lookup(&json, spec.name));
                FormField {
                    spec: *spec,
                    initial: text.clone(),
                    value: text,
                }
            })
            .collect();
        Ok(Self {
            mode: FormMode::Edit,
            fields,
            _entity: PhantomData,
        })
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.field(name).map(|f| f.value.as_str())
    }

    /// Whether any field differs from what the form was opened with.
    pub fn is_dirty(&self) -> bool {
        self.fields.iter().any(FormField::changed)
    }

    fn field(&self, name: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.spec.name == name)
    }

    /// Replace the text of one field. Unknown names are rejected.
    pub fn set(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let mode = self.mode_name();
        let field = self
            .fields
            .iter_mut()
            .find(|f| f.spec.name == name)
            .ok_or_else(|| Error::BadRequest {
                message: format!("{} {mode} form has no field '{name}'", E::KIND),
            })?;
        field.value = value.into();
        Ok(())
    }

    /// Set several fields at once. Every unknown name is reported together.
    pub fn apply(&mut self, values: &BTreeMap<String, String>) -> Result<()> {
        let mut unknown = Validator::new();
        for (name, value) in values {
            if self.set(name, value.clone()).is_err() {
                unknown.push(name, "is not a field of this form");
            }
        }
        unknown.finish()
    }

    fn mode_name(&self) -> &'static str {
        match self.mode {
            FormMode::Create => "create",
            FormMode::Edit => "edit",
        }
    }

    /// Parse the selected fields into a JSON body, collecting every parse error.
    fn body(&self, include: impl Fn(&FormField) -> bool) -> std::result::Result<Value, Vec<FieldError>> {
        let mut object = Map::new();
        let mut errors = Vec::new();
        for field in self.fields.iter().filter(|f| include(f)) {
            let parsed = match self.mode {
                FormMode::Create => field.spec.parse(&field.value),
                FormMode::Edit => field.spec.parse_edit(&field.value),
            };
            match parsed {
                Ok(value) => fields::insert(&mut object, field.spec.name, value),
                Err(error) => errors.push(error),
            }
        }
        if errors.is_empty() { Ok(Value::Object(object)) } else { Err(errors) }
    }

    fn typed<T: DeserializeOwned + Validate>(&self, body: std::result::Result<Value, Vec<FieldError>>) -> Result<T> {
        let body = body.map_err(|errors| Error::Validation { errors })?;
        let typed: T = serde_json::from_value(body).map_err(|e| Error::BadRequest {
            message: format!("Invalid {} form: {e}", E::KIND),
        })?;
        typed.validate()?;
        Ok(typed)
    }

    /// Parse every field into a create request.
    pub fn submit_create(&self) -> Result<E::Create> {
        if self.mode != FormMode::Create {
            return Err(Error::BadRequest {
                message: "An edit form cannot create a record".to_string(),
            });
        }
        self.typed(self.body(|_| true))
    }

    /// Parse only the changed fields into an update request.
    pub fn submit_update(&self) -> Result<E::Update> {
        if self.mode != FormMode::Edit {
            return Err(Error::BadRequest {
                message: "A create form cannot update a record".to_string(),
            });
        }
        self.typed(self.body(FormField::changed))
    }

    pub fn view(&self) -> FormView {
        FormView {
            kind: E::KIND,
            mode: self.mode,
            fields: self.fields.iter().map(|f| FormFieldView::new(&f.spec, &f.value)).collect(),
        }
    }
}

/// A form as sent to clients
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FormView {
    pub kind: EntityKind,
    pub mode: FormMode,
    pub fields: Vec<FormFieldView>,
}

/// Field texts typed by the user, keyed by field name. Fields left out keep their current
/// text (the default on create, the prefill on edit).
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FormSubmission {
    pub fields: BTreeMap<String, String>,
}
