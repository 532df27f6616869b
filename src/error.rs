use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use rusqlite::ffi;
use thiserror::Error;

use crate::api_json::ApiResponse;

/// Errores del dominio SIRDS.
///
/// Cada variante se traduce a un código HTTP y a la envoltura
/// `{ "success": false, "message": ... }` que espera el dashboard.
#[derive(Debug, Error)]
pub enum SirdsError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("error de base de datos: {0}")]
    Database(rusqlite::Error),

    #[error("error al exportar: {0}")]
    Export(String),

    #[error("error interno: {0}")]
    Internal(String),
}

pub type SirdsResult<T> = Result<T, SirdsError>;

impl SirdsError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        SirdsError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        SirdsError::Validation(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        SirdsError::Conflict(msg.into())
    }
}

/// Las violaciones de restricciones de SQLite se clasifican como errores del
/// dominio: UNIQUE/PRIMARY KEY son conflictos, CHECK/FOREIGN KEY/NOT NULL son
/// errores de validación.
impl From<rusqlite::Error> for SirdsError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(ref err, ref msg) = e {
            let detalle = msg.clone().unwrap_or_else(|| err.to_string());
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    return SirdsError::Conflict(format!("registro duplicado: {}", detalle));
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => {
                    return SirdsError::Validation(format!("referencia inexistente: {}", detalle));
                }
                ffi::SQLITE_CONSTRAINT_CHECK | ffi::SQLITE_CONSTRAINT_NOTNULL => {
                    return SirdsError::Validation(format!("dato inválido: {}", detalle));
                }
                _ => {}
            }
        }
        SirdsError::Database(e)
    }
}

impl From<csv::Error> for SirdsError {
    fn from(e: csv::Error) -> Self {
        SirdsError::Export(e.to_string())
    }
}

impl From<actix_web::error::BlockingError> for SirdsError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        SirdsError::Internal(e.to_string())
    }
}

impl ResponseError for SirdsError {
    fn status_code(&self) -> StatusCode {
        match self {
            SirdsError::NotFound(_) => StatusCode::NOT_FOUND,
            SirdsError::Validation(_) => StatusCode::BAD_REQUEST,
            SirdsError::Conflict(_) => StatusCode::CONFLICT,
            SirdsError::Database(_) | SirdsError::Export(_) | SirdsError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
        HttpResponse::build(status).json(ApiResponse::<()>::fallo(self.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn unique_violation_is_conflict() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (x TEXT UNIQUE); INSERT INTO t VALUES ('a');").unwrap();
        let err: SirdsError = conn.execute("INSERT INTO t VALUES ('a')", []).unwrap_err().into();
        assert!(matches!(err, SirdsError::Conflict(_)));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn check_violation_is_validation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (n INTEGER CHECK (n >= 1));").unwrap();
        let err: SirdsError = conn.execute("INSERT INTO t VALUES (0)", []).unwrap_err().into();
        assert!(matches!(err, SirdsError::Validation(_)));
    }

    #[test]
    fn other_sqlite_errors_stay_database_errors() {
        let conn = Connection::open_in_memory().unwrap();
        let err: SirdsError = conn.execute("SELECT * FROM no_existe", []).unwrap_err().into();
        assert!(matches!(err, SirdsError::Database(_)));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
