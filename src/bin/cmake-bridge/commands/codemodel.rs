//! `cmake-bridge codemodel` command
//!
//! Prints the code model reported by the CMake server, suitable as input
//! for `cmake-bridge translate`.

use anyhow::{Context, Result};

use cmake_bridge::BridgeError;

use crate::cli::CodemodelArgs;
use crate::commands::{initialise, write_output};

pub fn execute(args: CodemodelArgs) -> Result<()> {
    let interpreter = initialise(&args.session)?;
    let model = interpreter.code_model().ok_or(BridgeError::NotInitialised)?;

    let mut json = serde_json::to_string_pretty(model).context("failed to serialize code model")?;
    json.push('\n');
    write_output(args.output.as_deref(), &json)
}
