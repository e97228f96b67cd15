// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Control-plane errors, mapped onto the wire error kinds.

use relay_storage::StoreError;
use relay_wire::{Envelope, ErrorKind};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControlError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ControlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ControlError::BadRequest(_) => ErrorKind::BadRequest,
            ControlError::Unauthorized(_) => ErrorKind::Unauthorized,
            ControlError::Forbidden(_) => ErrorKind::Forbidden,
            ControlError::NotFound(_) => ErrorKind::NotFound,
            ControlError::Conflict(_) => ErrorKind::Conflict,
            ControlError::Storage(_) => ErrorKind::StorageError,
        }
    }

    /// Render into the response envelope for any payload type.
    pub fn to_envelope<T>(&self) -> Envelope<T> {
        Envelope::error(self.kind(), self.to_string())
    }

    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        ControlError::BadRequest(message.into())
    }

    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        ControlError::Forbidden(message.into())
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        ControlError::NotFound(message.into())
    }

    pub(crate) fn conflict(message: impl Into<String>) -> Self {
        ControlError::Conflict(message.into())
    }
}
