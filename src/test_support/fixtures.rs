//! Code model fixtures for common test scenarios.
//!
//! All fixtures describe a CMake subproject at `/proj/sub`, configured into
//! `/proj/build/sub/__CMake_build` with install prefix `/usr/local`.

use std::path::PathBuf;

use crate::convert::paths::RebaseRoots;
use crate::server::codemodel::{CodeModel, Configuration, FileGroup, Project, Target, TargetType};

pub const SOURCE_ROOT: &str = "/proj/sub";
pub const BUILD_ROOT: &str = "/proj/build";
pub const SUBDIR: &str = "sub";
pub const CMAKE_BUILD_DIR: &str = "/proj/build/sub/__CMake_build";
pub const INSTALL_PREFIX: &str = "/usr/local";

/// Rebase roots matching the fixture layout.
pub fn test_roots() -> RebaseRoots {
    RebaseRoots {
        source_root: PathBuf::from(SOURCE_ROOT),
        build_root: PathBuf::from(BUILD_ROOT),
        subdir: PathBuf::from(SUBDIR),
        install_prefix: PathBuf::from(INSTALL_PREFIX),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Builder for a [`FileGroup`].
#[derive(Debug, Clone)]
pub struct FileGroupBuilder {
    group: FileGroup,
}

impl FileGroupBuilder {
    pub fn new(language: &str) -> Self {
        FileGroupBuilder {
            group: FileGroup {
                language: language.to_string(),
                ..FileGroup::default()
            },
        }
    }

    pub fn flags(mut self, flags: &[&str]) -> Self {
        self.group.compile_flags.extend(strings(flags));
        self
    }

    pub fn defines(mut self, defines: &[&str]) -> Self {
        self.group.defines.extend(strings(defines));
        self
    }

    pub fn includes(mut self, dirs: &[&str]) -> Self {
        self.group.include_path.extend(strings(dirs));
        self
    }

    pub fn sources(mut self, sources: &[&str]) -> Self {
        self.group.sources.extend(strings(sources));
        self
    }

    pub fn generated(mut self) -> Self {
        self.group.is_generated = true;
        self
    }

    pub fn build(self) -> FileGroup {
        self.group
    }
}

/// Builder for a CMake [`Target`].
///
/// The full name defaults to the name; directories default to the fixture
/// source root and CMake build directory.
#[derive(Debug, Clone)]
pub struct TargetBuilder {
    target: Target,
}

impl TargetBuilder {
    pub fn new(name: &str, target_type: &str) -> Self {
        TargetBuilder {
            target: Target {
                name: name.to_string(),
                full_name: name.to_string(),
                target_type: TargetType::from(target_type.to_string()),
                source_directory: SOURCE_ROOT.to_string(),
                build_directory: CMAKE_BUILD_DIR.to_string(),
                artifacts: Vec::new(),
                has_install_rule: false,
                install_paths: Vec::new(),
                link_libraries: Vec::new(),
                link_flags: Vec::new(),
                link_language_flags: Vec::new(),
                file_groups: Vec::new(),
            },
        }
    }

    pub fn full_name(mut self, full_name: &str) -> Self {
        self.target.full_name = full_name.to_string();
        self
    }

    pub fn source_dir(mut self, dir: &str) -> Self {
        self.target.source_directory = dir.to_string();
        self
    }

    pub fn build_dir(mut self, dir: &str) -> Self {
        self.target.build_directory = dir.to_string();
        self
    }

    pub fn group(mut self, group: FileGroupBuilder) -> Self {
        self.target.file_groups.push(group.build());
        self
    }

    pub fn link_libraries(mut self, libs: &[&str]) -> Self {
        self.target.link_libraries.extend(strings(libs));
        self
    }

    pub fn link_flags(mut self, flags: &[&str]) -> Self {
        self.target.link_flags.extend(strings(flags));
        self
    }

    pub fn install_paths(mut self, paths: &[&str]) -> Self {
        self.target.has_install_rule = true;
        self.target.install_paths.extend(strings(paths));
        self
    }

    pub fn build(self) -> Target {
        self.target
    }
}

/// Wrap targets into a single-configuration, single-project code model.
pub fn code_model(project: &str, targets: Vec<Target>) -> CodeModel {
    CodeModel {
        configurations: vec![Configuration {
            name: "Debug".to_string(),
            projects: vec![Project {
                name: project.to_string(),
                source_directory: SOURCE_ROOT.to_string(),
                build_directory: CMAKE_BUILD_DIR.to_string(),
                targets,
            }],
        }],
    }
}

/// Ready-made code models.
pub mod scenarios {
    use super::*;

    /// An executable `app` linking the static library `core`.
    ///
    /// `app` is listed first so dependency ordering is observable.
    pub fn app_with_core() -> CodeModel {
        let app = TargetBuilder::new("app", "EXECUTABLE")
            .group(
                FileGroupBuilder::new("C")
                    .flags(&["-O2", "-fPIE"])
                    .includes(&["/proj/sub/include"])
                    .sources(&["main.c"]),
            )
            .link_libraries(&["libcore.a", "-lm"])
            .install_paths(&["/usr/local/bin"])
            .build();

        let core = TargetBuilder::new("core", "STATIC_LIBRARY")
            .full_name("libcore.a")
            .group(
                FileGroupBuilder::new("C")
                    .flags(&["-std=c99", "-fPIC"])
                    .defines(&["CORE_BUILD"])
                    .includes(&["/proj/sub/include"])
                    .sources(&["core.c", "util.c"]),
            )
            .build();

        code_model("demo", vec![app, core])
    }

    /// `app` built as C11, linking `libcore.a` by basename and the system
    /// math library by absolute path.
    pub fn app_with_libcore() -> CodeModel {
        let app = TargetBuilder::new("app", "EXECUTABLE")
            .group(FileGroupBuilder::new("C").flags(&["-std=c11"]).sources(&["a.c"]))
            .link_libraries(&["libcore.a", "/usr/lib/libm.so"])
            .build();

        let libcore = TargetBuilder::new("libcore", "STATIC_LIBRARY")
            .full_name("libcore.a")
            .group(FileGroupBuilder::new("C").sources(&["core.c"]))
            .build();

        code_model("demo", vec![app, libcore])
    }

    /// An executable consuming the objects of the object library `helpers`.
    pub fn object_library() -> CodeModel {
        let helpers = TargetBuilder::new("helpers", "OBJECT_LIBRARY")
            .group(FileGroupBuilder::new("C").sources(&["helper.c"]))
            .build();

        let tool = TargetBuilder::new("tool", "EXECUTABLE")
            .group(FileGroupBuilder::new("C").sources(&["tool.c"]))
            .group(
                FileGroupBuilder::new("C")
                    .generated()
                    .sources(&["/proj/build/sub/__CMake_build/CMakeFiles/helpers.dir/helper.c.o"]),
            )
            .build();

        code_model("objects", vec![helpers, tool])
    }

    /// Two static libraries linking each other.
    pub fn link_cycle() -> CodeModel {
        let a = TargetBuilder::new("a", "STATIC_LIBRARY")
            .full_name("liba.a")
            .group(FileGroupBuilder::new("C").sources(&["a.c"]))
            .link_libraries(&["libb.a"])
            .build();
        let b = TargetBuilder::new("b", "STATIC_LIBRARY")
            .full_name("libb.a")
            .group(FileGroupBuilder::new("C").sources(&["b.c"]))
            .link_libraries(&["liba.a"])
            .build();

        code_model("cycle", vec![a, b])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_builder_defaults() {
        let target = TargetBuilder::new("core", "STATIC_LIBRARY").build();
        assert_eq!(target.full_name, "core");
        assert_eq!(target.target_type, TargetType::StaticLibrary);
        assert_eq!(target.source_directory, SOURCE_ROOT);
        assert!(!target.has_install_rule);
    }

    #[test]
    fn test_scenarios_shape() {
        let model = scenarios::app_with_core();
        let names: Vec<_> = model.targets().map(|t| t.full_name.as_str()).collect();
        assert_eq!(names, vec!["app", "libcore.a"]);

        let model = scenarios::object_library();
        assert_eq!(model.targets().count(), 2);
    }
}
