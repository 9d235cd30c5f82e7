use std::{sync::Arc, time::Duration};

use ethers::{
    middleware::SignerMiddleware,
    providers::{Http, JsonRpcClient, Middleware, PendingTransaction, Provider, ProviderError},
    signers::{LocalWallet, Signer},
    types::{transaction::eip2718::TypedTransaction, TransactionReceipt, H256, U64},
    utils::hex,
};

use crate::{
    error::ScriptError,
    report::{ErrorReport, TransactionResponse},
};

pub type Client<P = Http> = SignerMiddleware<Provider<P>, LocalWallet>;

pub fn provider(rpc: &str, interval: Duration) -> Result<Provider<Http>, ScriptError> {
    let provider = Provider::<Http>::try_from(rpc).map_err(|e| ScriptError::RpcUrl {
        url: rpc.to_string(),
        reason: e.to_string(),
    })?;
    Ok(provider.interval(interval))
}

pub fn wallet(sk: &str) -> Result<LocalWallet, ScriptError> {
    let bytes = hex::decode(sk.strip_prefix("0x").unwrap_or(sk))
        .map_err(|e| ScriptError::PrivateKey(e.to_string()))?;
    if bytes.len() != 32 {
        return Err(ScriptError::PrivateKey(format!(
            "expected 32 bytes, got {}",
            bytes.len()
        )));
    }
    LocalWallet::from_bytes(&bytes).map_err(|e| ScriptError::PrivateKey(e.to_string()))
}

pub async fn connect<P: JsonRpcClient + 'static>(
    provider: Provider<P>,
    sk: &str,
) -> Result<Arc<Client<P>>, ScriptError> {
    let wallet = wallet(sk)?;
    let chain_id = provider
        .get_chainid()
        .await
        .map_err(ScriptError::rpc("requesting chain id"))?;
    log::info!("signer:{:?} chain id:{}", wallet.address(), chain_id);

    Ok(Arc::new(SignerMiddleware::new(
        provider,
        wallet.with_chain_id(chain_id.as_u64()),
    )))
}

/// Fills the remaining fields, signs locally and broadcasts the raw transaction.
pub async fn send_transaction<P: JsonRpcClient + 'static>(
    client: &Client<P>,
    mut tx: TypedTransaction,
) -> Result<(TransactionResponse, PendingTransaction<'_, P>), ScriptError> {
    client
        .fill_transaction(&mut tx, None)
        .await
        .map_err(ScriptError::rpc("filling transaction"))?;

    let signature = client.signer().sign_transaction(&tx).await?;
    let response = TransactionResponse::new(&tx, client.address(), &signature);

    let pending = client
        .send_raw_transaction(response.raw.clone())
        .await
        .map_err(ScriptError::rpc("sending transaction"))?;
    if pending.tx_hash() != response.hash {
        log::warn!(
            "node returned hash {:?}, locally computed {:?}",
            pending.tx_hash(),
            response.hash
        );
    }
    log::info!("transaction hash:{:?}", response.hash);
    Ok((response, pending))
}

/// Blocks until the transaction has one confirmation.
pub async fn wait_transaction<P: JsonRpcClient>(
    pending: PendingTransaction<'_, P>,
) -> Result<TransactionReceipt, ErrorReport> {
    let transaction_hash = pending.tx_hash();
    minted(transaction_hash, pending.confirmations(1).await)
}

/// A dropped transaction or a receipt with status 0 counts as a failure.
pub fn minted(
    transaction_hash: H256,
    outcome: Result<Option<TransactionReceipt>, ProviderError>,
) -> Result<TransactionReceipt, ErrorReport> {
    match outcome {
        Ok(Some(receipt)) if receipt.status == Some(U64::zero()) => {
            Err(ErrorReport::reverted(receipt))
        }
        Ok(Some(receipt)) => Ok(receipt),
        Ok(None) => Err(ErrorReport::message(format!(
            "transaction {:?} was dropped from the mempool",
            transaction_hash
        ))),
        Err(e) => Err(ErrorReport::from_middleware(&e)),
    }
}
