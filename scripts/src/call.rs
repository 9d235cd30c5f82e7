use ethers::{
    abi::Token,
    providers::Middleware,
    types::{transaction::eip2718::TypedTransaction, Address, TransactionRequest},
};

use crate::{
    artifact::{encode_call, Artifact},
    error::ScriptError,
};

/// Read-only `eth_call` of a contract function, printing the decoded outputs.
pub async fn call<M: Middleware>(
    client: &M,
    artifact: &Artifact,
    contract_address: Address,
    function_name: &str,
    args: &[String],
) -> Result<Vec<Token>, ScriptError> {
    let function = artifact.function(function_name)?;
    let data = encode_call(function, args)?;
    log::debug!("call data:{}", data);

    let tx: TypedTransaction = TransactionRequest::new()
        .to(contract_address)
        .data(data)
        .into();
    let output = client
        .call(&tx, None)
        .await
        .map_err(ScriptError::rpc("calling function"))?;
    let tokens = function.decode_output(&output)?;

    println!(
        "Contract '{}'. {}({}) returned:",
        artifact.contract_name,
        function_name,
        args.join(", ")
    );
    for token in &tokens {
        println!("{}", token);
    }
    Ok(tokens)
}
