//! Crate level error.
//!
//! Each transport reports its own error enum; [`Error`] only tells them apart.
use crate::{ffi::FfiError, grpc::GrpcError, http::HttpError};

/// A transport-level failure: the call could not produce a response record.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Grpc(#[from] GrpcError),
    #[error(transparent)]
    Ffi(#[from] FfiError),
}
