use diesel::result::{DatabaseErrorKind, Error as DieselError};
use rocket::http::Status;
use rocket::request::Request;
use rocket::response::{self, Responder};
use rocket::serde::json::Json;
use serde_json::json;
use tracing::{debug, warn};

use crate::utils::try_respond;

#[derive(Debug)]
pub enum ApiError {
    Diesel(DieselError),
    BadRequest(String),
    NotFound(String),
    Internal,
}

impl From<DieselError> for ApiError {
    fn from(err: DieselError) -> ApiError {
        ApiError::Diesel(err)
    }
}

impl From<r2d2::Error> for ApiError {
    fn from(err: r2d2::Error) -> ApiError {
        warn!(error = %err, "could not check out a database connection");
        ApiError::Internal
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;

impl ApiError {
    pub fn status(&self) -> Status {
        match self {
            ApiError::Diesel(DieselError::NotFound) => Status::NotFound,
            ApiError::Diesel(DieselError::DatabaseError(kind, _)) => match kind {
                DatabaseErrorKind::ForeignKeyViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::UniqueViolation => Status::BadRequest,
                _ => Status::InternalServerError,
            },
            ApiError::Diesel(_) => Status::InternalServerError,
            ApiError::BadRequest(_) => Status::BadRequest,
            ApiError::NotFound(_) => Status::NotFound,
            ApiError::Internal => Status::InternalServerError,
        }
    }
}

fn message(status: Status) -> &'static str {
    match status.code {
        400 => "Bad Request",
        404 => "Not Found",
        _ => "Internal Server Error",
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, req: &'r Request<'_>) -> response::Result<'static> {
        let status = self.status();
        if status.code >= 500 {
            warn!(error = ?self, uri = %req.uri(), "request failed");
        } else {
            debug!(error = ?self, uri = %req.uri(), "request rejected");
        }
        let body = json!({ "msg": message(status) });
        try_respond(req, &body, status)
    }
}
