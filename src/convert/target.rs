//! Per-target conversion of the CMake code model.
//!
//! A [`ConvertedTarget`] is built from one CMake target in a single pass over
//! its file groups, then refined in two passes once all sibling targets
//! exist: [`ConvertedTarget::postprocess`] and
//! [`ConvertedTarget::process_object_libs`].

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;

use crate::convert::flags::{extend_set, extend_unique, extract_flags};
use crate::convert::language::Language;
use crate::convert::paths::RebaseRoots;
use crate::error::{BridgeError, BridgeResult};
use crate::server::codemodel::{Target, TargetType};

/// Extensions of compiled objects CMake leaves in generated source lists.
pub const OBJECT_EXTENSIONS: [&str; 2] = [".o", ".obj"];

/// Marker extension of CMake's internal custom-command rules.
const RULE_EXTENSION: &str = ".rule";

/// Index of a target within one conversion pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TargetId(pub usize);

/// Build function a target is declared with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFunction {
    Executable,
    StaticLibrary,
    SharedLibrary,
    SharedModule,
}

impl TargetFunction {
    /// Map a CMake target type. Object libraries become static libraries.
    pub fn for_type(target_type: &TargetType) -> Option<TargetFunction> {
        match target_type {
            TargetType::StaticLibrary | TargetType::ObjectLibrary => {
                Some(TargetFunction::StaticLibrary)
            }
            TargetType::SharedLibrary => Some(TargetFunction::SharedLibrary),
            TargetType::ModuleLibrary => Some(TargetFunction::SharedModule),
            TargetType::Executable => Some(TargetFunction::Executable),
            TargetType::Utility | TargetType::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TargetFunction::Executable => "executable",
            TargetFunction::StaticLibrary => "static_library",
            TargetFunction::SharedLibrary => "shared_library",
            TargetFunction::SharedModule => "shared_module",
        }
    }
}

impl fmt::Display for TargetFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A CMake target normalized for statement synthesis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConvertedTarget {
    pub name: String,
    pub full_name: String,
    pub target_type: TargetType,
    pub source_dir: PathBuf,
    pub build_dir: PathBuf,
    pub artifacts: Vec<String>,
    pub install: bool,
    pub install_dir: String,
    pub languages: Vec<Language>,
    pub compile_args: IndexMap<Language, Vec<String>>,
    pub include_dirs: IndexSet<String>,
    pub sources: Vec<String>,
    pub generated: Vec<String>,
    pub override_options: Vec<String>,
    pub position_independent: bool,
    /// Linker flags, including language-specific ones.
    pub link_flags: Vec<String>,
    /// Link libraries; after postprocessing only those not resolved to siblings.
    pub link_libraries: Vec<String>,
    #[serde(skip)]
    pub link_with: Vec<TargetId>,
    #[serde(skip)]
    pub object_libs: Vec<TargetId>,
}

impl ConvertedTarget {
    /// Convert one CMake target.
    pub fn new(target: &Target) -> Self {
        let mut converted = ConvertedTarget {
            name: target.name.clone(),
            full_name: target.full_name.clone(),
            target_type: target.target_type.clone(),
            source_dir: PathBuf::from(&target.source_directory),
            build_dir: PathBuf::from(&target.build_directory),
            artifacts: target.artifacts.clone(),
            install: target.has_install_rule,
            install_dir: target.install_paths.first().cloned().unwrap_or_default(),
            languages: Vec::new(),
            compile_args: IndexMap::new(),
            include_dirs: IndexSet::new(),
            sources: Vec::new(),
            generated: Vec::new(),
            override_options: Vec::new(),
            position_independent: false,
            link_flags: target
                .link_flags
                .iter()
                .chain(&target.link_language_flags)
                .cloned()
                .collect(),
            link_libraries: target.link_libraries.clone(),
            link_with: Vec::new(),
            object_libs: Vec::new(),
        };

        for group in &target.file_groups {
            let lang = Language::from_cmake(&group.language);
            if !converted.languages.contains(&lang) {
                converted.languages.push(lang);
            }

            let args = group
                .compile_flags
                .iter()
                .cloned()
                .chain(group.defines.iter().map(|d| format!("-D{}", d)));
            extend_unique(converted.compile_args.entry(lang).or_default(), args);

            extend_set(&mut converted.include_dirs, group.include_path.iter().cloned());

            if group.is_generated {
                converted.generated.extend(group.sources.iter().cloned());
            } else {
                converted.sources.extend(group.sources.iter().cloned());
            }
        }

        converted
    }

    /// The build function for this target.
    pub fn function(&self) -> BridgeResult<TargetFunction> {
        TargetFunction::for_type(&self.target_type).ok_or_else(|| {
            BridgeError::UnsupportedTargetKind {
                target: self.name.clone(),
                kind: self.target_type.to_string(),
            }
        })
    }

    /// First pass: flags, link libraries and paths.
    ///
    /// `output_targets` maps the full name of every target in this pass to
    /// its id.
    pub fn postprocess(&mut self, output_targets: &HashMap<String, TargetId>, roots: &RebaseRoots) {
        self.extract_compile_flags();
        self.resolve_link_libraries(output_targets);
        self.rebase_paths(roots);
        self.install_dir = roots.rebase_install_dir(&self.install_dir);
    }

    fn extract_compile_flags(&mut self) {
        for (lang, args) in self.compile_args.iter_mut() {
            let extracted = extract_flags(*lang, args);
            *args = extracted.args;
            extend_unique(&mut self.override_options, extracted.override_options);
            self.position_independent |= extracted.position_independent;
        }
    }

    fn resolve_link_libraries(&mut self, output_targets: &HashMap<String, TargetId>) {
        let mut raw = Vec::new();

        for lib in std::mem::take(&mut self.link_libraries) {
            // rpath handling is left to the native linker defaults
            if lib.contains(",-rpath,") {
                continue;
            }

            if !Path::new(&lib).is_absolute() {
                let sibling = basename(&lib).and_then(|b| output_targets.get(b));
                if let Some(&id) = sibling {
                    if !self.link_with.contains(&id) {
                        self.link_with.push(id);
                    }
                    continue;
                }
            }

            raw.push(lib);
        }

        self.link_libraries = raw;
    }

    fn rebase_paths(&mut self, roots: &RebaseRoots) {
        let source_dir = self.source_dir.clone();

        let mut includes: IndexSet<String> = self
            .include_dirs
            .iter()
            .map(|dir| roots.rebase(dir, &source_dir))
            .collect();
        includes.insert(roots.build_dir_include(&self.build_dir));
        includes.insert(".".to_string());
        self.include_dirs = includes;

        let rebase_all = |files: &[String]| -> Vec<String> {
            files
                .iter()
                .filter(|f| !f.ends_with(RULE_EXTENSION))
                .map(|f| roots.rebase(f, &source_dir))
                .collect()
        };
        self.sources = rebase_all(&self.sources);
        self.generated = rebase_all(&self.generated);
    }

    /// Object file names this target is expected to produce.
    pub fn object_outputs(&self) -> HashSet<String> {
        self.sources
            .iter()
            .chain(&self.generated)
            .filter_map(|f| basename(f))
            .flat_map(|b| OBJECT_EXTENSIONS.iter().map(move |ext| format!("{}{}", b, ext)))
            .collect()
    }

    /// Second pass: infer object library consumption.
    ///
    /// Generated entries that are compiled objects are dropped; an object
    /// library producing one of them becomes an object-library dependency.
    pub fn process_object_libs(&mut self, own_id: TargetId, object_libs: &[(TargetId, HashSet<String>)]) {
        let (objects, generated): (Vec<String>, Vec<String>) = std::mem::take(&mut self.generated)
            .into_iter()
            .partition(|f| OBJECT_EXTENSIONS.iter().any(|ext| f.ends_with(ext)));
        self.generated = generated;

        let wanted: HashSet<&str> = objects.iter().filter_map(|f| basename(f)).collect();
        if wanted.is_empty() {
            return;
        }

        for (id, outputs) in object_libs {
            if *id == own_id || self.object_libs.contains(id) {
                continue;
            }
            if outputs.iter().any(|o| wanted.contains(o.as_str())) {
                self.object_libs.push(*id);
            }
        }
    }

    /// Dump this target at debug level.
    pub fn log(&self, names: impl Fn(TargetId) -> String) {
        let list = |ids: &[TargetId]| ids.iter().map(|id| names(*id)).collect::<Vec<_>>();

        tracing::debug!("Target {}", self.name);
        tracing::debug!("  -- full_name:      {}", self.full_name);
        tracing::debug!("  -- type:           {}", self.target_type);
        tracing::debug!("  -- install:        {}", self.install);
        tracing::debug!("  -- install_dir:    {}", self.install_dir);
        tracing::debug!("  -- link_libraries: {:?}", self.link_libraries);
        tracing::debug!("  -- link_with:      {:?}", list(&self.link_with));
        tracing::debug!("  -- object_libs:    {:?}", list(&self.object_libs));
        tracing::debug!("  -- link_flags:     {:?}", self.link_flags);
        tracing::debug!("  -- languages:      {:?}", self.languages);
        tracing::debug!("  -- includes:       {:?}", self.include_dirs);
        tracing::debug!("  -- sources:        {:?}", self.sources);
        tracing::debug!("  -- generated:      {:?}", self.generated);
        tracing::debug!("  -- pie:            {}", self.position_independent);
        tracing::debug!("  -- override_opts:  {:?}", self.override_options);
        for (lang, args) in &self.compile_args {
            tracing::debug!("  -- {}_args: {:?}", lang, args);
        }
    }
}

fn basename(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|n| n.to_str())
}
