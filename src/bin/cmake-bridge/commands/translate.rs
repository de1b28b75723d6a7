//! `cmake-bridge translate` command
//!
//! Converts a saved code model offline. Accepts either a bare
//! `{"configurations": [...]}` document or a complete `codemodel` reply.

use anyhow::{Context, Result};

use cmake_bridge::ops::{CMakeInterpreter, InterpreterPaths};
use cmake_bridge::server::CodeModel;
use cmake_bridge::util::config::DEFAULT_BACKEND;
use cmake_bridge::util::diagnostic::suggestions;
use cmake_bridge::util::fs::{absolute, read_to_string};

use crate::cli::TranslateArgs;
use crate::commands::{convert_output, write_output};

pub fn execute(args: TranslateArgs) -> Result<()> {
    let contents = read_to_string(&args.codemodel)?;
    let model: CodeModel = serde_json::from_str(&contents).with_context(|| {
        format!(
            "failed to parse code model: {} (help: {})",
            args.codemodel.display(),
            suggestions::BAD_CODE_MODEL
        )
    })?;

    let paths = InterpreterPaths {
        source_dir: absolute(&args.source_dir)?,
        build_root: absolute(&args.build_root)?,
        subdir: args.subdir.clone().unwrap_or_default(),
        install_prefix: args.install_prefix.clone(),
    };

    let mut interpreter = CMakeInterpreter::new(paths, DEFAULT_BACKEND);
    interpreter.analyse_code_model(model)?;

    let contents = convert_output(&interpreter, args.output.format)?;
    write_output(args.output.output.as_deref(), &contents)
}
