//! Compiler registry used to pre-seed the CMake cache.
//!
//! The outer build decides which compilers a subproject must use; CMake is
//! told about them through `-DCMAKE_<LANG>_COMPILER` cache variables so both
//! sides agree.

use indexmap::IndexMap;

use crate::convert::language::Language;
use crate::util::config::ToolchainSettings;
use crate::util::process::find_executable;

/// Maps languages to compiler commands.
pub trait CompilerRegistry {
    /// Languages with a known compiler, in a stable order.
    fn languages(&self) -> Vec<Language>;

    /// Command words of the compiler for `lang`: the executable, optionally
    /// preceded by a launcher such as `ccache`.
    fn compiler(&self, lang: Language) -> Option<&[String]>;
}

/// A fixed language to compiler map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticCompilers {
    compilers: IndexMap<Language, Vec<String>>,
}

impl StaticCompilers {
    pub fn new() -> Self {
        StaticCompilers::default()
    }

    /// Register `command`, split on whitespace.
    pub fn with(mut self, lang: Language, command: &str) -> Self {
        let words: Vec<String> = command.split_whitespace().map(str::to_string).collect();
        if !words.is_empty() {
            self.compilers.insert(lang, words);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.compilers.is_empty()
    }
}

impl CompilerRegistry for StaticCompilers {
    fn languages(&self) -> Vec<Language> {
        self.compilers.keys().copied().collect()
    }

    fn compiler(&self, lang: Language) -> Option<&[String]> {
        self.compilers.get(&lang).map(Vec::as_slice)
    }
}

const C_CANDIDATES: [&str; 3] = ["cc", "gcc", "clang"];
const CXX_CANDIDATES: [&str; 3] = ["c++", "g++", "clang++"];

/// Detect C and C++ compilers.
///
/// Priority per language:
/// 1. Config file (`[toolchain] cc` / `cxx`)
/// 2. Environment variables (CC, CXX)
/// 3. First candidate found in PATH
pub fn detect_compilers(settings: &ToolchainSettings) -> StaticCompilers {
    let mut compilers = StaticCompilers::new();

    let c = settings
        .cc
        .clone()
        .or_else(|| std::env::var("CC").ok())
        .or_else(|| first_in_path(&C_CANDIDATES));
    if let Some(c) = c {
        compilers = compilers.with(Language::C, &c);
    }

    let cxx = settings
        .cxx
        .clone()
        .or_else(|| std::env::var("CXX").ok())
        .or_else(|| first_in_path(&CXX_CANDIDATES));
    if let Some(cxx) = cxx {
        compilers = compilers.with(Language::Cpp, &cxx);
    }

    for lang in compilers.languages() {
        if let Some(words) = compilers.compiler(lang) {
            tracing::debug!("Using {} compiler: {}", lang, words.join(" "));
        }
    }

    compilers
}

fn first_in_path(candidates: &[&str]) -> Option<String> {
    candidates
        .iter()
        .find_map(|name| find_executable(name))
        .map(|path| path.display().to_string())
}

/// `-DCMAKE_<LANG>_COMPILER[_LAUNCHER]=...` arguments for every registered
/// compiler.
///
/// Commands of more than two words cannot be expressed this way and are
/// skipped.
pub fn cache_arguments(registry: &dyn CompilerRegistry) -> Vec<String> {
    let mut args = Vec::new();

    for lang in registry.languages() {
        let cmake_lang = lang.cmake_name().to_ascii_uppercase();
        match registry.compiler(lang) {
            Some([exe]) => {
                args.push(format!("-DCMAKE_{}_COMPILER={}", cmake_lang, exe));
            }
            Some([launcher, exe]) => {
                args.push(format!("-DCMAKE_{}_COMPILER_LAUNCHER={}", cmake_lang, launcher));
                args.push(format!("-DCMAKE_{}_COMPILER={}", cmake_lang, exe));
            }
            Some(words) => {
                tracing::warn!(
                    "Ignoring {} compiler command with {} words: {}",
                    lang,
                    words.len(),
                    words.join(" ")
                );
            }
            None => {}
        }
    }

    args
}
