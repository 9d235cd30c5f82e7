use std::sync::Arc;

use ethers::{contract::ContractFactory, providers::JsonRpcClient, types::H160};

use crate::{artifact::Artifact, error::ScriptError, report::ErrorReport, utils::Client};

pub struct Deploy<P: JsonRpcClient + 'static> {
    client: Arc<Client<P>>,
}

impl<P: JsonRpcClient + 'static> Deploy<P> {
    pub fn new(client: Arc<Client<P>>) -> Self {
        Self { client }
    }

    /// Deploys without constructor arguments and waits for one confirmation.
    pub async fn run(&self, artifact: &Artifact) -> Result<H160, ScriptError> {
        println!("Deploying the contract '{}' ...", artifact.contract_name);

        let contract = ContractFactory::new(
            artifact.abi.clone(),
            artifact.bytecode()?,
            self.client.clone(),
        )
        .deploy(())
        .map_err(|e| ScriptError::Rpc {
            context: "building deployment",
            report: ErrorReport::from_error(&e),
        })?
        .legacy()
        .send()
        .await
        .map_err(|e| ScriptError::Rpc {
            context: "deploying contract",
            report: ErrorReport::from_error(&e),
        })?;

        println!(
            "Contract '{}' has been deployed successfully at: {:?}",
            artifact.contract_name,
            contract.address()
        );
        Ok(contract.address())
    }
}
