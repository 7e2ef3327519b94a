use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, RuntimeErr};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    Internal(String),
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        // A serializable transaction that loses a race fails with SQLSTATE
        // 40001; surface it as a conflict rather than a server error. Call
        // sites reword it where a more specific message applies.
        if is_serialization_failure(&err) {
            return AppError::Conflict("Conflicting concurrent update, please retry".to_string());
        }
        AppError::Internal(format!("Database error: {}", err))
    }
}

fn is_serialization_failure(err: &DbErr) -> bool {
    let runtime_err = match err {
        DbErr::Conn(e) | DbErr::Exec(e) | DbErr::Query(e) => e,
        _ => return false,
    };

    match runtime_err {
        RuntimeErr::SqlxError(sqlx_err) => sqlx_err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .is_some_and(|code| code == "40001"),
        _ => false,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
        }

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::sqlx;
    use std::borrow::Cow;

    #[derive(Debug)]
    struct SerializationFailure;

    impl std::fmt::Display for SerializationFailure {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "could not serialize access due to concurrent update")
        }
    }

    impl std::error::Error for SerializationFailure {}

    impl sqlx::error::DatabaseError for SerializationFailure {
        fn message(&self) -> &str {
            "could not serialize access due to concurrent update"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some("40001".into())
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }
    }

    fn serialization_err() -> DbErr {
        DbErr::Query(RuntimeErr::SqlxError(sqlx::Error::Database(Box::new(
            SerializationFailure,
        ))))
    }

    #[test]
    fn serialization_failure_maps_to_conflict() {
        assert!(matches!(
            AppError::from(serialization_err()),
            AppError::Conflict(_)
        ));
    }

    #[test]
    fn other_db_errors_map_to_internal() {
        let err = DbErr::Custom("connection reset".to_string());
        assert!(matches!(AppError::from(err), AppError::Internal(_)));
    }
}
