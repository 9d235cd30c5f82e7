use ethers::{
    providers::Middleware,
    types::{Transaction, H256},
};

use crate::error::ScriptError;

/// Prints the node's current record of `hash`, `null` when it is unknown.
pub async fn inspect<M: Middleware>(
    client: &M,
    hash: H256,
) -> Result<Option<Transaction>, ScriptError> {
    let transaction = client
        .get_transaction(hash)
        .await
        .map_err(ScriptError::rpc("requesting transaction"))?;
    println!("txResponse: {}", serde_json::to_string_pretty(&transaction)?);
    Ok(transaction)
}
