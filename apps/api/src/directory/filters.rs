//! Allow-listed equality filters for professional listings.
//!
//! Callers send arbitrary `key=value` pairs; each key must map to one of the
//! variants below. Unknown keys are rejected, so column names reaching SQL
//! only ever come from [`FieldFilter::column`].

use std::collections::HashMap;

use thiserror::Error;
use uuid::Uuid;

use crate::models::moderation::ModerationStatus;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    #[error("unknown filter field '{0}'")]
    UnknownField(String),

    #[error("invalid value '{value}' for filter '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// One exact, case-sensitive equality predicate on a professional column.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldFilter {
    Name(String),
    Category(String),
    Specialization(String),
    City(String),
    Phone(String),
    Email(String),
    Verified(bool),
    Status(ModerationStatus),
    UserId(Uuid),
}

impl FieldFilter {
    /// Parses one caller-supplied pair. Portuguese aliases are the field
    /// names the public directory has always accepted.
    pub fn parse(key: &str, value: &str) -> Result<Self, FilterError> {
        let invalid = |reason: String| FilterError::InvalidValue {
            field: key.to_string(),
            value: value.to_string(),
            reason,
        };

        let filter = match key {
            "name" | "nome" => FieldFilter::Name(value.to_string()),
            "category" | "tipo" => FieldFilter::Category(value.to_string()),
            "specialization" | "especializacao" => FieldFilter::Specialization(value.to_string()),
            "city" | "cidade" => FieldFilter::City(value.to_string()),
            "phone" | "telefone" => FieldFilter::Phone(value.to_string()),
            "email" => FieldFilter::Email(value.to_string()),
            "verified" | "verificado" => FieldFilter::Verified(
                value
                    .parse::<bool>()
                    .map_err(|_| invalid("expected 'true' or 'false'".to_string()))?,
            ),
            "status" => FieldFilter::Status(value.parse().map_err(|e| invalid(format!("{e}")))?),
            "userId" | "user_id" => {
                FieldFilter::UserId(value.parse().map_err(|e| invalid(format!("{e}")))?)
            }
            other => return Err(FilterError::UnknownField(other.to_string())),
        };
        Ok(filter)
    }

    /// The SQL column this filter constrains.
    pub fn column(&self) -> &'static str {
        match self {
            FieldFilter::Name(_) => "name",
            FieldFilter::Category(_) => "category",
            FieldFilter::Specialization(_) => "specialization",
            FieldFilter::City(_) => "city",
            FieldFilter::Phone(_) => "phone",
            FieldFilter::Email(_) => "email",
            FieldFilter::Verified(_) => "verified",
            FieldFilter::Status(_) => "status",
            FieldFilter::UserId(_) => "user_id",
        }
    }

    /// Evaluates the predicate against an in-memory record.
    #[cfg(test)]
    pub fn matches(&self, professional: &crate::models::professional::Professional) -> bool {
        match self {
            FieldFilter::Name(v) => professional.name == *v,
            FieldFilter::Category(v) => professional.category == *v,
            FieldFilter::Specialization(v) => {
                professional.specialization.as_deref() == Some(v.as_str())
            }
            FieldFilter::City(v) => professional.city.as_deref() == Some(v.as_str()),
            FieldFilter::Phone(v) => professional.phone.as_deref() == Some(v.as_str()),
            FieldFilter::Email(v) => professional.email.as_deref() == Some(v.as_str()),
            FieldFilter::Verified(v) => professional.verified == *v,
            FieldFilter::Status(v) => professional.status == *v,
            FieldFilter::UserId(v) => professional.user_id == Some(*v),
        }
    }
}

/// Parses a whole query map. Pairs with an empty value are skipped.
/// Keys are processed in sorted order so the first reported error is stable.
pub fn parse_filters(raw: &HashMap<String, String>) -> Result<Vec<FieldFilter>, FilterError> {
    let mut keys: Vec<&String> = raw.keys().collect();
    keys.sort();

    let mut filters = Vec::with_capacity(keys.len());
    for key in keys {
        let value = &raw[key];
        if value.is_empty() {
            continue;
        }
        filters.push(FieldFilter::parse(key, value)?);
    }
    Ok(filters)
}
