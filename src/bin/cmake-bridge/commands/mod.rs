//! Command implementations

pub mod codemodel;
pub mod completions;
pub mod convert;
pub mod translate;

use std::path::Path;

use anyhow::{Context, Result};

use cmake_bridge::ast::render;
use cmake_bridge::ops::{CMakeInterpreter, InterpreterPaths};
use cmake_bridge::toolchain::detect_compilers;
use cmake_bridge::util::config::load_for_source;
use cmake_bridge::util::fs::{absolute, write_string};
use cmake_bridge::BridgeError;

use crate::cli::{OutputFormat, SessionArgs};

/// Run the configure step and a server session for `args`.
pub fn initialise(args: &SessionArgs) -> Result<CMakeInterpreter> {
    let source_dir = absolute(&args.source)?;
    if !source_dir.join("CMakeLists.txt").is_file() {
        anyhow::bail!("no CMakeLists.txt found in {}", source_dir.display());
    }

    let mut config = load_for_source(&source_dir);
    if let Some(backend) = &args.backend {
        config.cmake.backend = Some(backend.clone());
    }

    let build_root = match &args.build_dir {
        Some(dir) => absolute(dir)?,
        None => source_dir.join("build"),
    };

    let paths = InterpreterPaths {
        source_dir,
        build_root,
        subdir: args.subdir.clone().unwrap_or_default(),
        install_prefix: args.install_prefix.clone(),
    };

    let mut options = config.cmake.options.clone();
    options.extend(args.defines.iter().map(|d| format!("-D{}", d)));

    let compilers = detect_compilers(&config.toolchain);
    let (major, minor) = config.protocol_version();

    let mut interpreter = CMakeInterpreter::new(paths, config.backend())
        .with_server_settings(config.server_settings())
        .with_protocol(major, minor);
    interpreter.initialise(&options, &compilers)?;

    Ok(interpreter)
}

/// Print the analysed project in `format`.
pub fn convert_output(interpreter: &CMakeInterpreter, format: OutputFormat) -> Result<String> {
    let project = interpreter.project().ok_or(BridgeError::NotAnalysed)?;

    match format {
        OutputFormat::Json => serde_json::to_string_pretty(&project.report())
            .map(|mut json| {
                json.push('\n');
                json
            })
            .context("failed to serialize converted targets"),
        OutputFormat::Text => {
            let synthesis = interpreter.to_statements()?;
            Ok(render(&synthesis.block))
        }
    }
}

/// Print `contents` to stdout, or write them to `output`.
pub fn write_output(output: Option<&Path>, contents: &str) -> Result<()> {
    match output {
        Some(path) => {
            write_string(path, contents)?;
            tracing::info!("Wrote {}", path.display());
        }
        None => print!("{}", contents),
    }
    Ok(())
}
