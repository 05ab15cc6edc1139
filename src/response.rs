//! Response envelope returned by [`Connection::request`](crate::Connection::request).
//!
//! The wire contract is fixed: an object carrying exactly one of
//! `{"result": <payload>}` or `{"error": {"code": <int>, "message": <string>}}`.

use serde::{Deserialize, Serialize};

/// Application error carried inside a successful transport response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("remote error {code}: {message}")]
pub struct ResponseError {
    /// Application defined error code.
    pub code: i64,
    /// Human readable description.
    pub message: String,
}

/// Either a success payload or a structured application error.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response<T> {
    /// The remote operation succeeded.
    Result(T),
    /// The remote operation reported an application error.
    Error(ResponseError),
}

impl<T> Response<T> {
    /// Whether the envelope carries a success payload.
    #[must_use]
    pub fn is_ok(&self) -> bool { matches!(self, Response::Result(_)) }

    /// Borrow the success payload, if any.
    #[must_use]
    pub fn result(&self) -> Option<&T> {
        match self {
            Response::Result(value) => Some(value),
            Response::Error(_) => None,
        }
    }

    /// Borrow the application error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ResponseError> {
        match self {
            Response::Result(_) => None,
            Response::Error(err) => Some(err),
        }
    }

    /// Convert into a standard [`Result`].
    ///
    /// # Errors
    /// Returns the carried [`ResponseError`] when the envelope is an error.
    pub fn into_result(self) -> Result<T, ResponseError> {
        match self {
            Response::Result(value) => Ok(value),
            Response::Error(err) => Err(err),
        }
    }
}

impl<T> From<Response<T>> for Result<T, ResponseError> {
    fn from(response: Response<T>) -> Self { response.into_result() }
}
