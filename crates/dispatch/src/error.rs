// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatcher errors. Anything raised during claim→resolve→stage→handoff
//! is converted into a `fail_run` with the message surfaced.

use crate::api::ApiError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("control plane error: {0}")]
    Api(#[from] ApiError),
    #[error("invalid claim payload: {0}")]
    InvalidClaim(String),
    #[error("workspace error: {0}")]
    Workspace(String),
    #[error("storage error: {0}")]
    Storage(String),
    #[error("container start failed: {0}")]
    ContainerStart(String),
    #[error("executor handoff failed: {0}")]
    Handoff(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatchError {
    pub(crate) fn workspace(message: impl Into<String>) -> Self {
        DispatchError::Workspace(message.into())
    }

    pub(crate) fn storage(message: impl Into<String>) -> Self {
        DispatchError::Storage(message.into())
    }
}
