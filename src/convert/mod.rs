//! Conversion of the CMake code model into build targets.
//!
//! - [`target`]: per-target normalization and dependency inference
//! - [`project`]: the target arena for one code model
//! - [`flags`], [`paths`], [`language`]: the normalization rules

pub mod flags;
pub mod language;
pub mod paths;
pub mod project;
pub mod target;

pub use language::Language;
pub use paths::RebaseRoots;
pub use project::ConvertedProject;
pub use target::{ConvertedTarget, TargetFunction, TargetId};
