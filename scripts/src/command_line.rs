use std::{convert::Infallible, env, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use ethers::{
    providers::{Http, Provider},
    types::{H160, H256, U256},
};

use crate::{
    artifact::Artifact,
    call::call,
    deploy::Deploy,
    execute::{Execute, Invocation},
    inspect::inspect,
    report::Reporter,
    setting::Setting,
    utils::{connect, provider},
};

const DEFAULT_CONTRACT_ADDRESS: &str = "0xbd030c78c38E977BCb41d783b88A1f02c07124C8";
const DEFAULT_TRANSACTION_HASH: &str =
    "0xb82614e6ed8ad9506136f59168865eeae779936b1aabbf045d64a6ed171cb7e5";

const ENV_PREFIX: &str = "SP_";

/// Unsets empty `SP_*` variables so that their defaults apply.
pub fn clear_empty_env() {
    for (key, value) in env::vars_os() {
        let blank = value.to_str().map_or(false, |v| v.trim().is_empty());
        if blank && key.to_str().map_or(false, |k| k.starts_with(ENV_PREFIX)) {
            env::remove_var(key);
        }
    }
}

/// Only a case-insensitive `true` enables the flag.
fn parse_flag(s: &str) -> Result<bool, Infallible> {
    Ok(s.trim().eq_ignore_ascii_case("true"))
}

#[derive(Debug, Args)]
pub struct ContractArgs {
    /// Directory holding the hardhat build artifacts
    #[clap(long, env = "SP_ARTIFACTS_DIR", default_value = "artifacts")]
    artifacts: PathBuf,

    #[clap(long, env = "SP_CONTRACT_NAME", default_value = "ContractA")]
    contract_name: String,
}

impl ContractArgs {
    fn load(&self) -> Result<Artifact> {
        Ok(Artifact::load(&self.artifacts, &self.contract_name)?)
    }
}

#[derive(Debug, Args)]
/// Deploy a contract without constructor arguments
pub struct DeployCommand {
    #[clap(long, env = "SP_PRIVATE_KEY", hide_env_values = true)]
    sk: String,

    #[command(flatten)]
    contract: ContractArgs,
}

impl DeployCommand {
    pub async fn execute(self, provider: Provider<Http>) -> Result<()> {
        let artifact = self.contract.load()?;
        let client = connect(provider, &self.sk).await?;
        Deploy::new(client)
            .run(&artifact)
            .await
            .with_context(|| format!("deploying '{}'", self.contract.contract_name))?;
        Ok(())
    }
}

#[derive(Debug, Args)]
/// Send a transaction calling one contract function with a single argument
pub struct ExecuteCommand {
    #[clap(long, env = "SP_PRIVATE_KEY", hide_env_values = true)]
    sk: String,

    #[command(flatten)]
    contract: ContractArgs,

    #[clap(long, env = "SP_CONTRACT_ADDRESS", default_value = DEFAULT_CONTRACT_ADDRESS)]
    contract_address: H160,

    #[clap(long, env = "SP_FUNCTION_NAME", default_value = "setX")]
    function_name: String,

    #[clap(long, env = "SP_FUNCTION_ARGUMENT", default_value = "123")]
    function_argument: String,

    /// `auto` or a literal nonce
    #[clap(long, env = "SP_NONCE", default_value = "auto")]
    nonce: Setting<U256>,

    /// `auto` or a literal gas limit
    #[clap(long, env = "SP_GAS_LIMIT", default_value = "auto")]
    gas_limit: Setting<U256>,

    /// Save the response, receipt and errors as json files instead of printing them
    #[clap(
        long,
        env = "SP_SAVE_TO_FILE",
        default_value = "true",
        value_parser = parse_flag,
        action = ArgAction::Set
    )]
    save_to_file: bool,

    #[clap(long, env = "SP_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,
}

impl ExecuteCommand {
    pub async fn execute(self, provider: Provider<Http>) -> Result<()> {
        let artifact = self.contract.load()?;
        let client = connect(provider, &self.sk).await?;
        let reporter = Reporter::new(self.save_to_file, &self.output_dir);

        let invocation = Invocation {
            contract_address: self.contract_address,
            function_name: self.function_name,
            function_argument: self.function_argument,
            nonce: self.nonce,
            gas_limit: self.gas_limit,
        };
        log::info!("invocation:{:?}", invocation);
        Execute::new(client, reporter)
            .run(&artifact, &invocation)
            .await?;
        Ok(())
    }
}

#[derive(Debug, Args)]
/// Print the node's record of a transaction
pub struct InspectCommand {
    #[clap(long, env = "SP_TRANSACTION_HASH", default_value = DEFAULT_TRANSACTION_HASH)]
    transaction_hash: H256,
}

impl InspectCommand {
    pub async fn execute(self, provider: Provider<Http>) -> Result<()> {
        inspect(&provider, self.transaction_hash).await?;
        Ok(())
    }
}

#[derive(Debug, Args)]
/// Call a view function and print what it returns
pub struct CallCommand {
    #[command(flatten)]
    contract: ContractArgs,

    #[clap(long, env = "SP_CONTRACT_ADDRESS", default_value = DEFAULT_CONTRACT_ADDRESS)]
    contract_address: H160,

    #[clap(long, env = "SP_FUNCTION_NAME", default_value = "x")]
    function_name: String,

    #[clap(long, env = "SP_FUNCTION_ARGUMENT")]
    function_argument: Option<String>,
}

impl CallCommand {
    pub async fn execute(self, provider: Provider<Http>) -> Result<()> {
        let artifact = self.contract.load()?;
        let args: Vec<String> = self.function_argument.into_iter().collect();
        call(
            &provider,
            &artifact,
            self.contract_address,
            &self.function_name,
            &args,
        )
        .await?;
        Ok(())
    }
}

#[derive(Subcommand)]
pub enum Commands {
    Deploy(DeployCommand),
    Execute(ExecuteCommand),
    Inspect(InspectCommand),
    Call(CallCommand),
}

#[derive(Parser)]
pub struct CommandLine {
    #[clap(long, env = "SP_RPC_URL", default_value = "http://127.0.0.1:8545", global = true)]
    rpc: String,

    /// Poll interval while waiting for confirmations
    #[clap(long, env = "SP_POLL_INTERVAL_MS", default_value_t = 1000, global = true)]
    poll_interval_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

impl CommandLine {
    pub async fn execute(self) -> Result<()> {
        let provider = provider(&self.rpc, Duration::from_millis(self.poll_interval_ms))?;
        match self.command {
            Commands::Deploy(c) => c.execute(provider).await,
            Commands::Execute(c) => c.execute(provider).await,
            Commands::Inspect(c) => c.execute(provider).await,
            Commands::Call(c) => c.execute(provider).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use clap::CommandFactory;

    use super::*;

    // parsing reads the process environment
    static ENV: Mutex<()> = Mutex::new(());

    #[test]
    fn command_line_is_consistent() {
        CommandLine::command().debug_assert();
    }

    #[test]
    fn execute_defaults() {
        let _env = ENV.lock().unwrap_or_else(|e| e.into_inner());
        let cmd = CommandLine::try_parse_from(["contract-scripts", "execute", "--sk", "0x01"])
            .unwrap();
        let Commands::Execute(execute) = cmd.command else {
            panic!("expected execute");
        };
        assert_eq!(execute.contract.contract_name, "ContractA");
        assert_eq!(
            execute.contract_address,
            DEFAULT_CONTRACT_ADDRESS.parse::<H160>().unwrap()
        );
        assert_eq!(execute.function_name, "setX");
        assert_eq!(execute.function_argument, "123");
        assert_eq!(execute.nonce, Setting::Auto);
        assert_eq!(execute.gas_limit, Setting::Auto);
        assert!(execute.save_to_file);
    }

    #[test]
    fn execute_literals() {
        let _env = ENV.lock().unwrap_or_else(|e| e.into_inner());
        let cmd = CommandLine::try_parse_from([
            "contract-scripts",
            "execute",
            "--sk",
            "0x01",
            "--nonce",
            "4",
            "--gas-limit",
            "AUTO",
            "--save-to-file",
            "False",
        ])
        .unwrap();
        let Commands::Execute(execute) = cmd.command else {
            panic!("expected execute");
        };
        assert_eq!(execute.nonce, Setting::Fixed(U256::from(4)));
        assert_eq!(execute.gas_limit, Setting::Auto);
        assert!(!execute.save_to_file);
    }

    #[test]
    fn malformed_nonce_is_rejected() {
        let _env = ENV.lock().unwrap_or_else(|e| e.into_inner());
        assert!(CommandLine::try_parse_from([
            "contract-scripts",
            "execute",
            "--sk",
            "0x01",
            "--nonce",
            "next"
        ])
        .is_err());
    }

    #[test]
    fn flag_only_accepts_true() {
        assert_eq!(parse_flag("TRUE"), Ok(true));
        assert_eq!(parse_flag("true"), Ok(true));
        assert_eq!(parse_flag("yes"), Ok(false));
        assert_eq!(parse_flag("1"), Ok(false));
    }

    #[test]
    fn inspect_default_hash() {
        let _env = ENV.lock().unwrap_or_else(|e| e.into_inner());
        let cmd = CommandLine::try_parse_from(["contract-scripts", "inspect"]).unwrap();
        let Commands::Inspect(inspect) = cmd.command else {
            panic!("expected inspect");
        };
        assert_eq!(
            inspect.transaction_hash,
            DEFAULT_TRANSACTION_HASH.parse::<H256>().unwrap()
        );
    }

    #[test]
    fn empty_variables_fall_back_to_defaults() {
        let _env = ENV.lock().unwrap_or_else(|e| e.into_inner());
        let names = [
            "SP_CONTRACT_NAME",
            "SP_FUNCTION_NAME",
            "SP_FUNCTION_ARGUMENT",
            "SP_NONCE",
            "SP_GAS_LIMIT",
            "SP_SAVE_TO_FILE",
        ];
        for name in names {
            env::set_var(name, "");
        }
        env::set_var("SP_GAS_LIMIT", "  ");
        clear_empty_env();
        for name in names {
            assert!(env::var_os(name).is_none());
        }

        let cmd = CommandLine::try_parse_from(["contract-scripts", "execute", "--sk", "0x01"])
            .unwrap();
        let Commands::Execute(execute) = cmd.command else {
            panic!("expected execute");
        };
        assert_eq!(execute.contract.contract_name, "ContractA");
        assert_eq!(execute.function_name, "setX");
        assert_eq!(execute.function_argument, "123");
        assert_eq!(execute.nonce, Setting::Auto);
        assert_eq!(execute.gas_limit, Setting::Auto);
        assert!(execute.save_to_file);
    }

    #[test]
    fn non_empty_variables_are_kept() {
        let _env = ENV.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("SP_NONCE", "7");
        clear_empty_env();
        let cmd = CommandLine::try_parse_from(["contract-scripts", "execute", "--sk", "0x01"]);
        env::remove_var("SP_NONCE");

        let Commands::Execute(execute) = cmd.unwrap().command else {
            panic!("expected execute");
        };
        assert_eq!(execute.nonce, Setting::Fixed(U256::from(7)));
    }
}
