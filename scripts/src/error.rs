use std::path::PathBuf;

use ethers::{providers::MiddlewareError, signers::WalletError, types::H256};
use thiserror::Error;

use crate::report::{ErrorReport, TransactionResponse};

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("contract artifact '{name}' not found under {}", .dir.display())]
    ArtifactNotFound { name: String, dir: PathBuf },

    #[error("contract artifact '{0}' has no deployable bytecode")]
    MissingBytecode(String),

    #[error("function '{function}' not found in the abi of '{contract}'")]
    UnknownFunction { contract: String, function: String },

    #[error("function '{function}' expects {expected} argument(s), got {actual}")]
    ArgumentCount {
        function: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid rpc url '{url}': {reason}")]
    RpcUrl { url: String, reason: String },

    #[error("invalid private key: {0}")]
    PrivateKey(String),

    #[error("signing failed: {0}")]
    Signing(#[from] WalletError),

    #[error("{context}: {}", .report.message)]
    Rpc {
        context: &'static str,
        report: ErrorReport,
    },

    /// Terminal: the node refused to estimate gas for the call.
    #[error("gas limit request failed: {}", .0.message)]
    GasEstimation(ErrorReport),

    /// Terminal: the transaction was broadcast but never minted successfully.
    #[error("transaction {hash:?} minting failed: {}", .error.message)]
    Minting {
        hash: H256,
        error: ErrorReport,
        response: Box<TransactionResponse>,
    },

    #[error(transparent)]
    Abi(#[from] ethers::abi::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ScriptError {
    /// Wraps a middleware failure, keeping the node's error payload.
    pub fn rpc<E: MiddlewareError>(context: &'static str) -> impl FnOnce(E) -> Self {
        move |e| Self::Rpc {
            context,
            report: ErrorReport::from_middleware(&e),
        }
    }
}
