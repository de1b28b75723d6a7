//! Declarative build statements: node types, synthesis and printing.

pub mod node;
pub mod printer;
pub mod synth;

pub use node::{CodeBlock, Statement, Value};
pub use printer::render;
pub use synth::{synthesize, Identifiers, Synthesis};
