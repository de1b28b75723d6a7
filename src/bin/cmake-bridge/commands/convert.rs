//! `cmake-bridge convert` command
//!
//! Configures the subproject, queries the CMake server and prints the
//! equivalent build statements.

use anyhow::Result;

use crate::cli::ConvertArgs;
use crate::commands::{convert_output, initialise, write_output};

pub fn execute(args: ConvertArgs) -> Result<()> {
    let mut interpreter = initialise(&args.session)?;

    for file in interpreter.build_system_files() {
        tracing::debug!("Build system file: {}", file.display());
    }

    interpreter.analyse()?;
    let contents = convert_output(&interpreter, args.output.format)?;
    write_output(args.output.output.as_deref(), &contents)
}
