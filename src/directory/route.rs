use std::fmt;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use thiserror::Error;

pub const BASE_PATH: &str = "/intros";

/// Characters `encodeURIComponent` leaves alone.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("route '{path}' is outside /intros")]
    OutsideBase { path: String },

    #[error("route '{path}' has too many segments")]
    TooDeep { path: String },

    #[error("route '{path}' is not valid UTF-8 once decoded")]
    InvalidEncoding { path: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Route {
    /// `/intros`
    List,
    /// `/intros/:id`, where `id` is a stable key or a list position.
    Detail(String),
}

impl Route {
    /// Parse a location path. Query strings and fragments are ignored and the
    /// identifier is percent-decoded.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim();
        let no_query = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let rest = no_query
            .strip_prefix(BASE_PATH)
            .ok_or_else(|| RouteError::OutsideBase {
                path: path.to_string(),
            })?;
        if rest.is_empty() {
            return Ok(Route::List);
        }
        let id = rest.strip_prefix('/').ok_or_else(|| RouteError::OutsideBase {
            path: path.to_string(),
        })?;
        if id.contains('/') {
            return Err(RouteError::TooDeep {
                path: path.to_string(),
            });
        }
        let decoded = percent_decode_str(id)
            .decode_utf8()
            .map_err(|_| RouteError::InvalidEncoding {
                path: path.to_string(),
            })?;
        Ok(Route::Detail(decoded.into_owned()))
    }

    pub fn detail(id: impl Into<String>) -> Self {
        Route::Detail(id.into())
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Route::List => None,
            Route::Detail(id) => Some(id),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::List => BASE_PATH.to_string(),
            Route::Detail(id) => format!("{BASE_PATH}/{}", encode_component(id)),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
