//! Source languages and their CMake names.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Language of a converted target's sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// C language (default)
    #[default]
    C,
    /// C++ language
    #[serde(alias = "cxx", alias = "c++")]
    Cpp,
    Cuda,
    #[serde(rename = "cs")]
    CSharp,
    Java,
    Fortran,
    Swift,
}

impl Language {
    pub const ALL: [Language; 7] = [
        Language::C,
        Language::Cpp,
        Language::Cuda,
        Language::CSharp,
        Language::Java,
        Language::Fortran,
        Language::Swift,
    ];

    /// Tag used in the emitted statements (`c`, `cpp`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Cuda => "cuda",
            Language::CSharp => "cs",
            Language::Java => "java",
            Language::Fortran => "fortran",
            Language::Swift => "swift",
        }
    }

    /// Name CMake uses for this language (`C`, `CXX`, ...).
    pub fn cmake_name(&self) -> &'static str {
        match self {
            Language::C => "C",
            Language::Cpp => "CXX",
            Language::Cuda => "CUDA",
            Language::CSharp => "CSharp",
            Language::Java => "Java",
            Language::Fortran => "Fortran",
            Language::Swift => "Swift",
        }
    }

    /// Map a CMake language name, case-insensitively. Unknown names map to C.
    pub fn from_cmake(name: &str) -> Language {
        Language::ALL
            .into_iter()
            .find(|l| l.cmake_name().eq_ignore_ascii_case(name))
            .unwrap_or_default()
    }

    /// Whether the language has a `-std=` style standard selection.
    pub fn has_standard_flag(&self) -> bool {
        matches!(self, Language::C | Language::Cpp)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
