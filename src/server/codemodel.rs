//! The CMake code model, as reported by the `codemodel` request.
//!
//! These types are a read-only view of the foreign target graph:
//! configurations contain projects, projects contain targets and targets
//! contain file groups. The server reports flag lists as single shell-style
//! strings; they are split into tokens while deserializing.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Payload of a `codemodel` reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CodeModel {
    pub configurations: Vec<Configuration>,
}

impl CodeModel {
    /// Iterate over every target of every project of every configuration.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.configurations
            .iter()
            .flat_map(|c| c.projects.iter())
            .flat_map(|p| p.targets.iter())
    }
}

/// A build configuration (e.g. `Debug`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub projects: Vec<Project>,
}

/// A CMake `project()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub name: String,
    #[serde(default)]
    pub source_directory: String,
    #[serde(default)]
    pub build_directory: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// CMake target type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetType {
    StaticLibrary,
    SharedLibrary,
    ModuleLibrary,
    Executable,
    ObjectLibrary,
    Utility,
    /// Anything else the server reports, kept verbatim.
    Other(String),
}

impl TargetType {
    pub fn as_str(&self) -> &str {
        match self {
            TargetType::StaticLibrary => "STATIC_LIBRARY",
            TargetType::SharedLibrary => "SHARED_LIBRARY",
            TargetType::ModuleLibrary => "MODULE_LIBRARY",
            TargetType::Executable => "EXECUTABLE",
            TargetType::ObjectLibrary => "OBJECT_LIBRARY",
            TargetType::Utility => "UTILITY",
            TargetType::Other(s) => s,
        }
    }
}

impl From<String> for TargetType {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "STATIC_LIBRARY" => TargetType::StaticLibrary,
            "SHARED_LIBRARY" => TargetType::SharedLibrary,
            "MODULE_LIBRARY" => TargetType::ModuleLibrary,
            "EXECUTABLE" => TargetType::Executable,
            "OBJECT_LIBRARY" => TargetType::ObjectLibrary,
            "UTILITY" => TargetType::Utility,
            _ => TargetType::Other(s),
        }
    }
}

impl From<TargetType> for String {
    fn from(t: TargetType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single CMake target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    pub full_name: String,
    #[serde(rename = "type")]
    pub target_type: TargetType,
    #[serde(default)]
    pub source_directory: String,
    #[serde(default)]
    pub build_directory: String,
    #[serde(default)]
    pub artifacts: Vec<String>,
    #[serde(default)]
    pub has_install_rule: bool,
    #[serde(default, deserialize_with = "deserialize_paths")]
    pub install_paths: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub link_libraries: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub link_flags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub link_language_flags: Vec<String>,
    #[serde(default)]
    pub file_groups: Vec<FileGroup>,
}

/// A group of sources sharing one compiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileGroup {
    #[serde(default)]
    pub language: String,
    #[serde(default, deserialize_with = "deserialize_flags")]
    pub compile_flags: Vec<String>,
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_paths")]
    pub include_path: Vec<String>,
    #[serde(default)]
    pub is_generated: bool,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Split a CMake flag string into tokens.
///
/// Whitespace separates tokens unless quoted; single and double quotes group,
/// a backslash escapes the next character outside single quotes.
pub fn split_flags(raw: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut has_token = false;
    let mut quote: Option<char> = None;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('\''), c) => current.push(c),
            (_, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                    has_token = true;
                }
            }
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                has_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if has_token {
                    tokens.push(std::mem::take(&mut current));
                    has_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                has_token = true;
            }
        }
    }

    if has_token {
        tokens.push(current);
    }
    tokens
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlagsRepr {
    Joined(String),
    List(Vec<String>),
}

fn deserialize_flags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<FlagsRepr>::deserialize(deserializer)? {
        Some(FlagsRepr::Joined(s)) => split_flags(&s),
        Some(FlagsRepr::List(v)) => v,
        None => Vec::new(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Plain(String),
    Entry { path: String },
}

fn deserialize_paths<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<PathRepr>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|p| match p {
            PathRepr::Plain(path) | PathRepr::Entry { path } => path,
        })
        .collect())
}
