// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared by every surface, with the numeric codes the
//! envelope carries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    #[error("Bad request")]
    BadRequest,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Resource not found")]
    NotFound,
    #[error("Conflict")]
    Conflict,
    #[error("External service unavailable")]
    ExternalServiceUnavailable,
    #[error("Callback forward failed")]
    CallbackForwardFailed,
    #[error("Storage operation failed")]
    StorageError,
    #[error("Workspace not found")]
    WorkspaceNotFound,
    #[error("Container start failed")]
    ContainerStartFailed,
    #[error("Internal server error")]
    Internal,
}

impl ErrorKind {
    /// Numeric code carried by the response envelope.
    pub fn code(&self) -> u32 {
        match self {
            ErrorKind::BadRequest => 40000,
            ErrorKind::Unauthorized => 40100,
            ErrorKind::Forbidden => 40300,
            ErrorKind::NotFound => 40400,
            ErrorKind::Conflict => 40900,
            ErrorKind::Internal => 50000,
            ErrorKind::StorageError => 50101,
            ErrorKind::ExternalServiceUnavailable => 50201,
            ErrorKind::CallbackForwardFailed => 50202,
            ErrorKind::WorkspaceNotFound => 50301,
            ErrorKind::ContainerStartFailed => 50302,
        }
    }
}
