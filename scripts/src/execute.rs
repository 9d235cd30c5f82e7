use std::sync::Arc;

use ethers::{
    providers::{JsonRpcClient, Middleware},
    types::{
        transaction::eip2718::TypedTransaction, Address, TransactionReceipt, TransactionRequest,
        U256,
    },
};
use serde::Serialize;

use crate::{
    artifact::{encode_call, Artifact},
    error::ScriptError,
    report::{ErrorReport, Report, Reporter, TransactionResponse},
    setting::Setting,
    utils::{send_transaction, wait_transaction, Client},
};

/// What to call and how to price it.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub contract_address: Address,
    pub function_name: String,
    pub function_argument: String,
    pub nonce: Setting<U256>,
    pub gas_limit: Setting<U256>,
}

#[derive(Serialize)]
struct MintingReport<'a> {
    error: &'a ErrorReport,
    transaction: &'a TransactionResponse,
}

pub async fn resolve_nonce<M: Middleware>(
    client: &M,
    from: Address,
    nonce: Setting<U256>,
) -> Result<U256, ScriptError> {
    match nonce {
        Setting::Fixed(nonce) => Ok(nonce),
        Setting::Auto => client
            .get_transaction_count(from, None)
            .await
            .map_err(ScriptError::rpc("requesting nonce")),
    }
}

/// `tx` must carry neither gas nor nonce when estimating.
pub async fn resolve_gas_limit<M: Middleware>(
    client: &M,
    tx: &TypedTransaction,
    gas_limit: Setting<U256>,
) -> Result<U256, ScriptError> {
    match gas_limit {
        Setting::Fixed(gas_limit) => Ok(gas_limit),
        Setting::Auto => client
            .estimate_gas(tx, None)
            .await
            .map_err(|e| ScriptError::GasEstimation(ErrorReport::from_middleware(&e))),
    }
}

pub struct Execute<P: JsonRpcClient + 'static> {
    client: Arc<Client<P>>,
    reporter: Reporter,
}

impl<P: JsonRpcClient + 'static> Execute<P> {
    pub fn new(client: Arc<Client<P>>, reporter: Reporter) -> Self {
        Self { client, reporter }
    }

    /// Sends one transaction calling `invocation.function_name` and waits for
    /// it to be minted. Gas estimation and minting failures are reported
    /// before being returned.
    pub async fn run(
        &self,
        artifact: &Artifact,
        invocation: &Invocation,
    ) -> Result<TransactionReceipt, ScriptError> {
        println!(
            "Contract '{}'. Executing function '{}({})'...",
            artifact.contract_name, invocation.function_name, invocation.function_argument
        );
        let function = artifact.function(&invocation.function_name)?;
        let data = encode_call(function, &[invocation.function_argument.clone()])?;

        let from = self.client.address();
        let nonce = resolve_nonce(&*self.client, from, invocation.nonce).await?;
        println!("Nonce: {}", nonce);
        println!("Data: {}", data);

        let mut tx: TypedTransaction = TransactionRequest::new()
            .from(from)
            .to(invocation.contract_address)
            .data(data)
            .into();
        let gas_limit = self.gas_limit(&tx, invocation.gas_limit).await?;
        tx.set_gas(gas_limit);
        tx.set_nonce(nonce);

        println!("Sending the transaction...");
        let (response, pending) = send_transaction(&self.client, tx).await?;
        println!(
            "The transaction has been sent successfully. Hash: {:?}",
            response.hash
        );
        self.reporter
            .report(Report::TxResponse(response.hash), &response)?;

        println!("Waiting the transaction minting...");
        let receipt = match wait_transaction(pending).await {
            Ok(receipt) => receipt,
            Err(error) => {
                println!("Transaction minting failed.");
                self.reporter.report(
                    Report::TxMintingError(response.hash),
                    &MintingReport {
                        error: &error,
                        transaction: &response,
                    },
                )?;
                return Err(ScriptError::Minting {
                    hash: response.hash,
                    error,
                    response: Box::new(response),
                });
            }
        };
        println!(
            "The transaction has been minted successfully. Hash: {:?}",
            receipt.transaction_hash
        );
        self.reporter
            .report(Report::TxReceipt(receipt.transaction_hash), &receipt)?;
        Ok(receipt)
    }

    async fn gas_limit(
        &self,
        tx: &TypedTransaction,
        gas_limit: Setting<U256>,
    ) -> Result<U256, ScriptError> {
        let requested = gas_limit.is_auto();
        if requested {
            println!("Requesting the gas limit from the blockchain ...");
        }
        match resolve_gas_limit(&*self.client, tx, gas_limit).await {
            Ok(gas_limit) => {
                if requested {
                    println!("Gas limit has been successfully requested.");
                }
                println!("Gas limit for the transaction: {}", gas_limit);
                Ok(gas_limit)
            }
            Err(ScriptError::GasEstimation(report)) => {
                println!("Requesting gas limit failed.");
                self.reporter.report(Report::GasLimitRequestError, &report)?;
                Err(ScriptError::GasEstimation(report))
            }
            Err(e) => Err(e),
        }
    }
}
