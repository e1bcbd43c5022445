use std::{
    collections::BTreeMap,
    fmt::{self, Display},
};

use potion::Error;
use serde::Serialize;
use warp::reject::Rejection;

#[derive(Debug)]
pub struct QueryError {
    info: String,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self { info }
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::RowNotFound => Self::new(format!("RowNotFound")),
            sqlx::Error::PoolTimedOut => Self::new(format!("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(format!("Pool closed")),
            sqlx::Error::WorkerCrashed => Self::new(format!("Worker crashed")),
            sqlx::Error::Database(e) => match e.constraint() {
                Some(constraint) => Self::new(format!("{e} ({constraint})")),
                None => Self::new(format!("{e}")),
            },
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for QueryError {
    fn from(value: sqlx::migrate::MigrateError) -> Self {
        Self::new(format!("{value}"))
    }
}

impl Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info)
    }
}

impl std::error::Error for QueryError {}

impl Into<Error> for QueryError {
    fn into(self) -> Error {
        Error {
            code: 500,
            info: Some(self.info),
            redirect: None,
        }
    }
}

/// A form value that could not be read as the requested type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeError {
    info: String,
}

impl TypeError {
    pub fn new(info: &str) -> Self {
        Self {
            info: info.to_string(),
        }
    }

    pub fn info(&self) -> &str {
        &self.info
    }
}

impl Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.info)
    }
}

impl std::error::Error for TypeError {}

/// Field-keyed validation failures, one message per field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Keeps the first message reported for a field.
    pub fn add(&mut self, field: &str, message: &str) {
        self.fields
            .entry(field.to_owned())
            .or_insert_with(|| message.to_owned());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        match self.is_empty() {
            true => Ok(value),
            false => Err(self),
        }
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(&self.fields) {
            Ok(json) => write!(f, "{json}"),
            Err(_) => write!(f, "{:?}", self.fields),
        }
    }
}

pub type ActionResult<T> = Result<T, ActionError>;

/// Everything an operation can fail with. All variants are client visible.
#[derive(thiserror::Error, Debug)]
pub enum ActionError {
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error("Authentication credentials were not provided")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// A relation row that should exist does not.
    #[error("{0}")]
    NotFound(String),

    /// A recipe or user addressed by id does not exist.
    #[error("{0}")]
    Missing(String),

    #[error("{0}")]
    SelfReference(String),

    #[error("Database error: {0}")]
    Query(#[from] QueryError),
}

impl From<ValidationErrors> for ActionError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl ActionError {
    pub fn code(&self) -> u16 {
        match self {
            ActionError::Validation(_) => 400,
            ActionError::Unauthenticated => 401,
            ActionError::Forbidden(_) => 403,
            ActionError::Conflict(_) => 400,
            ActionError::NotFound(_) => 400,
            ActionError::Missing(_) => 404,
            ActionError::SelfReference(_) => 400,
            ActionError::Query(_) => 500,
        }
    }
}

impl Into<Error> for ActionError {
    fn into(self) -> Error {
        if let ActionError::Query(e) = &self {
            log::error!("> {e}");
        }

        Error {
            code: self.code().into(),
            info: Some(self.to_string()),
            redirect: None,
        }
    }
}

impl Into<Rejection> for ActionError {
    fn into(self) -> Rejection {
        let error: Error = self.into();
        error.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_keep_first_message() {
        let mut errors = ValidationErrors::new();
        errors.add("ingredients", "first");
        errors.add("ingredients", "second");
        errors.add("tags", "missing");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("ingredients"), Some("first"));
        assert_eq!(
            errors.to_string(),
            r#"{"ingredients":"first","tags":"missing"}"#
        );
    }

    #[test]
    fn action_errors_map_to_status_codes() {
        assert_eq!(
            ActionError::Validation(ValidationErrors::single("text", "x")).code(),
            400
        );
        assert_eq!(ActionError::Unauthenticated.code(), 401);
        assert_eq!(ActionError::Forbidden(String::new()).code(), 403);
        assert_eq!(ActionError::Missing(String::new()).code(), 404);
        assert_eq!(ActionError::Query(QueryError::new(String::new())).code(), 500);
    }
}
