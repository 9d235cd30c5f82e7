use std::{
    error::Error,
    fs,
    path::{Path, PathBuf},
};

use ethers::{
    providers::MiddlewareError,
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, Signature, TransactionReceipt,
        H256, U256, U64,
    },
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ScriptError;

pub const GAS_LIMIT_REQUEST_ERROR_FILE: &str = "gas_limit_request_error.txt";

/// Serializable snapshot of a failure. Keeps the message, every source in the
/// chain and the json-rpc payload so nothing is lost when written to disk.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ErrorReport {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<TransactionReceipt>,
}

impl ErrorReport {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    pub fn from_error<E: Error + ?Sized>(e: &E) -> Self {
        let mut causes = Vec::new();
        let mut source = e.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }
        Self {
            message: e.to_string(),
            causes,
            ..Default::default()
        }
    }

    pub fn from_middleware<E: MiddlewareError>(e: &E) -> Self {
        let mut report = Self::from_error(e);
        if let Some(response) = e.as_error_response() {
            report.code = Some(response.code);
            report.data = response.data.clone();
        }
        report
    }

    pub fn reverted(receipt: TransactionReceipt) -> Self {
        Self {
            message: format!(
                "transaction {:?} reverted in block {:?}",
                receipt.transaction_hash, receipt.block_number
            ),
            receipt: Some(receipt),
            ..Default::default()
        }
    }
}

/// Acknowledgment of a broadcast transaction, built from the locally signed
/// payload before any confirmation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionResponse {
    pub hash: H256,
    pub from: Address,
    pub to: Option<Address>,
    pub nonce: Option<U256>,
    pub gas_limit: Option<U256>,
    pub gas_price: Option<U256>,
    pub value: Option<U256>,
    pub data: Option<Bytes>,
    pub chain_id: Option<U64>,
    pub v: u64,
    pub r: U256,
    pub s: U256,
    pub raw: Bytes,
}

impl TransactionResponse {
    pub fn new(tx: &TypedTransaction, from: Address, signature: &Signature) -> Self {
        Self {
            hash: tx.hash(signature),
            from,
            to: tx.to().and_then(|to| to.as_address().copied()),
            nonce: tx.nonce().copied(),
            gas_limit: tx.gas().copied(),
            gas_price: tx.gas_price(),
            value: tx.value().copied(),
            data: tx.data().cloned(),
            chain_id: tx.chain_id(),
            v: signature.v,
            r: signature.r,
            s: signature.s,
            raw: tx.rlp_signed(signature),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Report {
    GasLimitRequestError,
    TxResponse(H256),
    TxReceipt(H256),
    TxMintingError(H256),
}

impl Report {
    pub fn file_name(&self) -> String {
        match self {
            Report::GasLimitRequestError => GAS_LIMIT_REQUEST_ERROR_FILE.to_string(),
            Report::TxResponse(hash) => format!("tx_response_{:?}", hash),
            Report::TxReceipt(hash) => format!("tx_receipt_{:?}", hash),
            Report::TxMintingError(hash) => format!("tx_minting_error_{:?}.txt", hash),
        }
    }

    fn title(&self) -> &'static str {
        match self {
            Report::GasLimitRequestError | Report::TxMintingError(_) => "The error",
            Report::TxResponse(_) => "The transaction response",
            Report::TxReceipt(_) => "The transaction receipt",
        }
    }
}

/// Prints a report or dumps it as pretty json, depending on one flag.
#[derive(Debug, Clone)]
pub struct Reporter {
    save_to_file: bool,
    output_dir: PathBuf,
}

impl Reporter {
    pub fn new(save_to_file: bool, output_dir: impl AsRef<Path>) -> Self {
        Self {
            save_to_file,
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    /// Returns the written path when saving to file, `None` when printed.
    pub fn report<T: Serialize>(
        &self,
        report: Report,
        value: &T,
    ) -> Result<Option<PathBuf>, ScriptError> {
        let json = serde_json::to_string_pretty(value)?;
        if self.save_to_file {
            let path = self.output_dir.join(report.file_name());
            fs::write(&path, json)?;
            println!("{} has been saved to file: {}.", report.title(), path.display());
            log::debug!("{:?} written to {:?}", report, path);
            Ok(Some(path))
        } else {
            println!("{}:\n{}", report.title(), json);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fmt;

    use tempfile::tempdir;

    use super::*;

    #[derive(Debug)]
    struct Outer(Inner);

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "outer failure")
        }
    }

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "inner failure")
        }
    }

    impl Error for Outer {
        fn source(&self) -> Option<&(dyn Error + 'static)> {
            Some(&self.0)
        }
    }

    impl Error for Inner {}

    fn hash() -> H256 {
        H256::from_low_u64_be(0xabcdef)
    }

    #[test]
    fn file_names_follow_the_hash() {
        let hash = hash();
        let hex = format!("{:?}", hash);
        assert!(hex.starts_with("0x") && hex.len() == 66);

        assert_eq!(
            Report::GasLimitRequestError.file_name(),
            "gas_limit_request_error.txt"
        );
        assert_eq!(Report::TxResponse(hash).file_name(), format!("tx_response_{hex}"));
        assert_eq!(Report::TxReceipt(hash).file_name(), format!("tx_receipt_{hex}"));
        assert_eq!(
            Report::TxMintingError(hash).file_name(),
            format!("tx_minting_error_{hex}.txt")
        );
    }

    #[test]
    fn error_report_keeps_the_source_chain() {
        let report = ErrorReport::from_error(&Outer(Inner));
        assert_eq!(report.message, "outer failure");
        assert_eq!(report.causes, vec!["inner failure".to_string()]);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["message"], "outer failure");
        assert_eq!(json["causes"][0], "inner failure");
        assert!(json.get("code").is_none());
        assert!(json.get("receipt").is_none());
    }

    #[test]
    fn reverted_report_embeds_the_receipt() {
        let receipt = TransactionReceipt {
            transaction_hash: hash(),
            status: Some(U64::zero()),
            ..Default::default()
        };
        let report = ErrorReport::reverted(receipt);
        assert!(report.message.contains("reverted"));
        assert_eq!(report.receipt.map(|r| r.transaction_hash), Some(hash()));
    }

    #[test]
    fn saving_writes_one_file_per_report() {
        let dir = tempdir().unwrap();
        let reporter = Reporter::new(true, dir.path());
        let hash = hash();

        let reports = [
            Report::GasLimitRequestError,
            Report::TxResponse(hash),
            Report::TxReceipt(hash),
            Report::TxMintingError(hash),
        ];
        for report in reports {
            let path = reporter
                .report(report, &ErrorReport::message("boom"))
                .unwrap()
                .unwrap();
            assert_eq!(path, dir.path().join(report.file_name()));

            let content = fs::read_to_string(&path).unwrap();
            assert_eq!(content, "{\n  \"message\": \"boom\"\n}");
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), reports.len());
    }

    #[test]
    fn printing_never_touches_the_disk() {
        let dir = tempdir().unwrap();
        let reporter = Reporter::new(false, dir.path());
        let hash = hash();

        for report in [
            Report::GasLimitRequestError,
            Report::TxResponse(hash),
            Report::TxReceipt(hash),
            Report::TxMintingError(hash),
        ] {
            let written = reporter
                .report(report, &ErrorReport::message("boom"))
                .unwrap();
            assert!(written.is_none());
        }
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
