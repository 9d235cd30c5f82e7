use std::{
    fs,
    path::{Path, PathBuf},
};

use ethers::{
    abi::{
        token::{LenientTokenizer, Tokenizer},
        Abi, Function, Token,
    },
    types::Bytes,
};
use serde::Deserialize;

use crate::error::ScriptError;

/// Hardhat build output of a single contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub abi: Abi,
    #[serde(default)]
    pub bytecode: Bytes,
}

impl Artifact {
    /// Finds `<name>.json` anywhere below `dir`.
    pub fn load(dir: &Path, name: &str) -> Result<Self, ScriptError> {
        let not_found = || ScriptError::ArtifactNotFound {
            name: name.to_string(),
            dir: dir.to_path_buf(),
        };
        if !dir.is_dir() {
            return Err(not_found());
        }
        let path = find(dir, &format!("{}.json", name))?.ok_or_else(not_found)?;
        log::info!("contract artifact:{:?}", path);

        let artifact: Artifact = serde_json::from_str(&fs::read_to_string(&path)?)?;
        Ok(artifact)
    }

    pub fn bytecode(&self) -> Result<Bytes, ScriptError> {
        if self.bytecode.is_empty() {
            Err(ScriptError::MissingBytecode(self.contract_name.clone()))
        } else {
            Ok(self.bytecode.clone())
        }
    }

    /// First overload with the given name.
    pub fn function(&self, name: &str) -> Result<&Function, ScriptError> {
        self.abi
            .function(name)
            .map_err(|_| ScriptError::UnknownFunction {
                contract: self.contract_name.clone(),
                function: name.to_string(),
            })
    }
}

fn find(dir: &Path, file_name: &str) -> Result<Option<PathBuf>, ScriptError> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()?;
    entries.sort();

    for path in entries {
        if path.is_dir() {
            if let Some(found) = find(&path, file_name)? {
                return Ok(Some(found));
            }
        } else if path.file_name().map_or(false, |n| n == file_name) {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

/// Tokenizes string arguments against the function inputs and abi-encodes the call.
pub fn encode_call(function: &Function, args: &[String]) -> Result<Bytes, ScriptError> {
    if function.inputs.len() != args.len() {
        return Err(ScriptError::ArgumentCount {
            function: function.name.clone(),
            expected: function.inputs.len(),
            actual: args.len(),
        });
    }
    let tokens = function
        .inputs
        .iter()
        .zip(args)
        .map(|(param, arg)| LenientTokenizer::tokenize(&param.kind, arg))
        .collect::<Result<Vec<Token>, _>>()?;

    Ok(function.encode_input(&tokens)?.into())
}
