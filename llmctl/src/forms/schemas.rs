//! Field layouts of the four entity forms.

use super::FormEntity;
use super::fields::{FieldKind, FieldSpec};
use crate::api::models::{
    api_keys::{ApiKeyCreate, ApiKeyResponse, ApiKeyUpdate},
    database_connections::{DatabaseConnectionCreate, DatabaseConnectionResponse, DatabaseConnectionUpdate},
    llm_models::{ModelCreate, ModelResponse, ModelUpdate},
    users::{UserCreate, UserResponse, UserUpdate},
};
use crate::types::EntityKind;

const DATABASE_TYPES: &[&str] = &["postgresql", "mysql", "mongodb", "sqlite"];
const PROVIDERS: &[&str] = &["openai", "anthropic", "google", "cohere", "huggingface"];
const ROLES: &[&str] = &["admin", "user", "viewer"];
const USER_STATUSES: &[&str] = &["active", "inactive", "suspended"];

const PORT: FieldKind = FieldKind::Integer { max: u16::MAX as u64 };
const U32: FieldKind = FieldKind::Integer { max: u32::MAX as u64 };
const U64: FieldKind = FieldKind::Integer { max: u64::MAX };

pub struct DatabaseConnectionForm;

impl FormEntity for DatabaseConnectionForm {
    const KIND: EntityKind = EntityKind::DatabaseConnection;
    type Create = DatabaseConnectionCreate;
    type Update = DatabaseConnectionUpdate;
    type Record = DatabaseConnectionResponse;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("name", "Connection Name", FieldKind::Text)
                .required()
                .placeholder("e.g., Production DB"),
            FieldSpec::new("type", "Database Type", FieldKind::Select { options: DATABASE_TYPES })
                .required()
                .default_value("postgresql"),
            FieldSpec::new("host", "Host", FieldKind::Text)
                .required()
                .placeholder("localhost or database.example.com"),
            FieldSpec::new("port", "Port", PORT).default_value("5432"),
            FieldSpec::new("database", "Database Name", FieldKind::Text)
                .required()
                .placeholder("Database name"),
            FieldSpec::new("username", "Username", FieldKind::Text)
                .required()
                .placeholder("Database username"),
            FieldSpec::new("password", "Password", FieldKind::Secret).placeholder("Database password"),
        ];
        FIELDS
    }
}

pub struct ApiKeyForm;

impl FormEntity for ApiKeyForm {
    const KIND: EntityKind = EntityKind::ApiKey;
    type Create = ApiKeyCreate;
    type Update = ApiKeyUpdate;
    type Record = ApiKeyResponse;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("name", "Key Name", FieldKind::Text)
                .required()
                .placeholder("e.g., OpenAI Production"),
            FieldSpec::new("provider", "Provider", FieldKind::Select { options: PROVIDERS })
                .required()
                .default_value("openai"),
            FieldSpec::new("key", "API Key", FieldKind::Secret)
                .required()
                .placeholder("Enter your API key..."),
            FieldSpec::new("usage_limit", "Usage Limit (requests/month)", U64)
                .default_value("10000")
                .placeholder("10000")
                .clearable(),
        ];
        FIELDS
    }
}

pub struct ModelForm;

impl FormEntity for ModelForm {
    const KIND: EntityKind = EntityKind::Model;
    type Create = ModelCreate;
    type Update = ModelUpdate;
    type Record = ModelResponse;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("id", "Model ID", FieldKind::Text)
                .required()
                .placeholder("e.g., gpt-4")
                .create_only(),
            FieldSpec::new("name", "Display Name", FieldKind::Text).required().placeholder("e.g., GPT-4"),
            FieldSpec::new("provider", "Provider", FieldKind::Text).required().placeholder("e.g., OpenAI"),
            FieldSpec::new("version", "Version", FieldKind::Text)
                .required()
                .placeholder("e.g., gpt-4-0125-preview"),
            FieldSpec::new("context_length", "Context Length", U32).required().default_value("8192"),
            FieldSpec::new("cost_per_1k", "Cost per 1K tokens", FieldKind::Decimal)
                .required()
                .default_value("0"),
            FieldSpec::new("enabled", "Enabled", FieldKind::Toggle).required().default_value("true"),
            FieldSpec::new("is_default", "Default model", FieldKind::Toggle)
                .required()
                .default_value("false")
                .create_only(),
            FieldSpec::new("config.temperature", "Temperature", FieldKind::Decimal)
                .required()
                .default_value("0.7"),
            FieldSpec::new("config.max_tokens", "Max Tokens", U32).required().default_value("4096"),
            FieldSpec::new("config.top_p", "Top P", FieldKind::Decimal).required().default_value("1.0"),
            FieldSpec::new("config.frequency_penalty", "Frequency Penalty", FieldKind::Decimal)
                .required()
                .default_value("0"),
            FieldSpec::new("config.presence_penalty", "Presence Penalty", FieldKind::Decimal)
                .required()
                .default_value("0"),
        ];
        FIELDS
    }
}

pub struct UserForm;

impl FormEntity for UserForm {
    const KIND: EntityKind = EntityKind::User;
    type Create = UserCreate;
    type Update = UserUpdate;
    type Record = UserResponse;

    fn fields() -> &'static [FieldSpec] {
        const FIELDS: &[FieldSpec] = &[
            FieldSpec::new("name", "Full Name", FieldKind::Text).required().placeholder("John Doe"),
            FieldSpec::new("email", "Email", FieldKind::Email)
                .required()
                .placeholder("john@example.com"),
            FieldSpec::new("role", "Role", FieldKind::Select { options: ROLES })
                .required()
                .default_value("user"),
            FieldSpec::new("status", "Status", FieldKind::Select { options: USER_STATUSES })
                .required()
                .default_value("active"),
            FieldSpec::new("usage_limit", "Usage Limit (requests/month)", U64)
                .required()
                .default_value("5000")
                .placeholder("5000"),
        ];
        FIELDS
    }
}
