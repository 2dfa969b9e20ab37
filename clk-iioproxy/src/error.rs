use alloc::{format, string::String};

use fdt_parser::FdtError;
use rdif_clk::ClkError;

use crate::NodeId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SetupError {
    #[error("required property `{0}` missing")]
    MissingConfig(&'static str),
    #[error("allocation failure")]
    AllocationFailure,
    #[error("register clock `{name}` fail: {source}")]
    RegistrationFailed { name: String, source: ClkError },
    #[error("add clock provider fail: {0}")]
    ProviderAdvertiseFailed(ClkError),
    #[error("apply initial rate fail: {0}")]
    InitialRate(ClkError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no driver matches node {0:?}")]
    NotMatched(NodeId),
    #[error("node {0:?} already bound")]
    AlreadyBound(NodeId),
    #[error("node {0:?} not bound")]
    NotBound(NodeId),
    #[error("fdt parse error: {0}")]
    Fdt(String),
    #[error("setup fail: {0}")]
    Setup(#[from] SetupError),
}

impl From<FdtError<'_>> for ProbeError {
    fn from(value: FdtError) -> Self {
        Self::Fdt(format!("{value:?}"))
    }
}
