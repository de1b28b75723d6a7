//! Statement synthesis from converted targets.
//!
//! Targets are emitted depth-first in conversion order, each after every
//! target it links or extracts objects from. Each target produces four
//! bindings: include directories, sources, the target itself and a
//! re-exportable dependency.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use petgraph::algo::tarjan_scc;
use petgraph::graph::DiGraph;

use crate::ast::node::{
    path_list, CodeBlock, DependencyAttributes, DependencyDeclaration, PositionIndependence,
    ProjectDeclaration, TargetAttributes, TargetDeclaration,
};
use crate::convert::project::ConvertedProject;
use crate::convert::target::TargetId;
use crate::error::{BridgeError, BridgeResult};

/// Bindings emitted for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifiers {
    pub inc: String,
    pub src: String,
    pub tgt: String,
    pub dep: String,
}

impl Identifiers {
    fn from_base(base: &str) -> Self {
        Identifiers {
            inc: format!("{}_inc", base),
            src: format!("{}_src", base),
            tgt: base.to_string(),
            dep: format!("{}_dep", base),
        }
    }

    fn all(&self) -> [&str; 4] {
        [&self.inc, &self.src, &self.tgt, &self.dep]
    }
}

/// Synthesized statements plus the identifiers assigned to each target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Synthesis {
    pub block: CodeBlock,
    /// Keyed by target full name, in emission order.
    pub identifiers: IndexMap<String, Identifiers>,
}

/// Replace characters outside `[A-Za-z0-9_]` and guard a leading digit.
pub fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

/// Synthesize the statement sequence for `project`.
pub fn synthesize(project: &ConvertedProject) -> BridgeResult<Synthesis> {
    check_cycles(project)?;

    let mut synth = Synthesizer {
        project,
        processed: HashMap::new(),
        used: HashSet::new(),
        out: Synthesis::default(),
    };

    synth.out.block.push(
        ProjectDeclaration {
            name: project.name.clone(),
            languages: project.languages.clone(),
        }
        .to_statement(),
    );

    for (id, _) in project.iter() {
        synth.process(id)?;
    }

    Ok(synth.out)
}

/// Fail when linked or object-library edges form a cycle.
fn check_cycles(project: &ConvertedProject) -> BridgeResult<()> {
    let mut graph: DiGraph<TargetId, ()> = DiGraph::new();
    let nodes: Vec<_> = project.iter().map(|(id, _)| graph.add_node(id)).collect();

    for (id, _) in project.iter() {
        for dep in project.dependencies(id) {
            let (from, to) = (nodes[id.0], nodes[dep.0]);
            if !graph.contains_edge(from, to) {
                graph.add_edge(from, to, ());
            }
        }
    }

    for component in tarjan_scc(&graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.contains_edge(n, n));
        if cyclic {
            let mut targets: Vec<String> = component
                .iter()
                .map(|&n| project.full_name(graph[n]).to_string())
                .collect();
            targets.sort();
            return Err(BridgeError::DependencyCycle { targets });
        }
    }

    Ok(())
}

struct Synthesizer<'a> {
    project: &'a ConvertedProject,
    processed: HashMap<TargetId, Identifiers>,
    used: HashSet<String>,
    out: Synthesis,
}

impl Synthesizer<'_> {
    fn process(&mut self, id: TargetId) -> BridgeResult<()> {
        if self.processed.contains_key(&id) {
            return Ok(());
        }

        let project = self.project;
        let target = project.target(id);

        for dep in project.dependencies(id) {
            self.process(dep)?;
        }

        let function = target.function()?;
        let ids = self.allocate(&target.name);

        let link_with = target
            .link_with
            .iter()
            .map(|dep| self.processed[dep].tgt.clone())
            .collect();
        let objects = target
            .object_libs
            .iter()
            .map(|dep| self.processed[dep].tgt.clone())
            .collect();
        let link_args: Vec<String> = target
            .link_flags
            .iter()
            .chain(&target.link_libraries)
            .cloned()
            .collect();

        let declaration = TargetDeclaration {
            binding: ids.tgt.clone(),
            function,
            name: target.name.clone(),
            sources: ids.src.clone(),
            attributes: TargetAttributes {
                link_args: link_args.clone(),
                link_with,
                include_directories: ids.inc.clone(),
                install: target.install,
                install_dir: Some(target.install_dir.clone()).filter(|d| !d.is_empty()),
                override_options: target.override_options.clone(),
                objects,
                compile_args: target.compile_args.clone(),
                position_independence: PositionIndependence::for_function(
                    function,
                    target.position_independent,
                ),
            },
        };

        let dependency = DependencyDeclaration {
            binding: ids.dep.clone(),
            attributes: DependencyAttributes {
                link_args,
                link_with: ids.tgt.clone(),
                include_directories: ids.inc.clone(),
            },
        };

        let block = &mut self.out.block;
        block.push(path_list(
            &ids.inc,
            "include_directories",
            target.include_dirs.iter().cloned(),
        ));
        block.push(path_list(
            &ids.src,
            "files",
            target.sources.iter().chain(&target.generated).cloned(),
        ));
        block.push(declaration.to_statement());
        block.push(dependency.to_statement());

        tracing::debug!("Emitted {} as {}", target.full_name, ids.tgt);
        self.out
            .identifiers
            .insert(target.full_name.clone(), ids.clone());
        self.processed.insert(id, ids);
        Ok(())
    }

    /// Identifiers for `name`, suffixed with a counter on collision.
    fn allocate(&mut self, name: &str) -> Identifiers {
        let base = sanitize_identifier(name);
        let mut ids = Identifiers::from_base(&base);
        let mut n = 2;
        while ids.all().iter().any(|i| self.used.contains(*i)) {
            ids = Identifiers::from_base(&format!("{}_{}", base, n));
            n += 1;
        }
        for i in ids.all() {
            self.used.insert(i.to_string());
        }
        ids
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::ast::node::{Statement, Value};
    use crate::test_support::{code_model, scenarios, test_roots, FileGroupBuilder, TargetBuilder};

    fn analyse(model: &crate::server::codemodel::CodeModel) -> ConvertedProject {
        ConvertedProject::analyse(model, &test_roots())
    }

    fn bindings(block: &CodeBlock) -> Vec<&str> {
        block.lines.iter().filter_map(Statement::binding).collect()
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("core"), "core");
        assert_eq!(sanitize_identifier("my-lib.v2"), "my_lib_v2");
        assert_eq!(sanitize_identifier("3rdparty"), "_3rdparty");
        assert_eq!(sanitize_identifier(""), "_");
    }

    #[test]
    fn test_dependencies_emitted_first() {
        let synthesis = synthesize(&analyse(&scenarios::app_with_core())).unwrap();
        let block = &synthesis.block;

        assert_eq!(block.lines[0].call().unwrap().name, "project");
        assert_eq!(
            bindings(block),
            vec!["core_inc", "core_src", "core", "core_dep", "app_inc", "app_src", "app", "app_dep"]
        );
        assert!(block.position_of("core_dep").unwrap() < block.position_of("app").unwrap());
    }

    #[test]
    fn test_app_links_core_by_identifier() {
        let synthesis = synthesize(&analyse(&scenarios::app_with_core())).unwrap();
        let block = &synthesis.block;
        let app = block.lines[block.position_of("app").unwrap()].call().unwrap();

        assert_eq!(app.name, "executable");
        assert_eq!(app.args.positional[0], Value::string("app"));
        assert_eq!(app.args.positional[1], Value::id("app_src"));
        assert_eq!(app.args.keywords["link_with"], Value::ids(["core"]));
        assert_eq!(app.args.keywords["link_args"], Value::strings(["-lm"]));
        assert_eq!(app.args.keywords["install_dir"], Value::string("bin"));
        assert_eq!(app.args.keywords["pie"], Value::Bool(true));

        let core = block.lines[block.position_of("core").unwrap()].call().unwrap();
        assert_eq!(core.name, "static_library");
        assert_eq!(core.args.keywords["override_options"], Value::strings(["c_std=c99"]));
        assert_eq!(core.args.keywords["c_args"], Value::strings(["-DCORE_BUILD"]));
        assert_eq!(core.args.keywords["pic"], Value::Bool(true));
        assert!(!core.args.keywords.contains_key("install_dir"));

        let dep = block.lines[block.position_of("core_dep").unwrap()].call().unwrap();
        assert_eq!(dep.name, "declare_dependency");
        assert_eq!(dep.args.keywords["link_with"], Value::id("core"));
        assert_eq!(dep.args.keywords["include_directories"], Value::id("core_inc"));
    }

    #[test]
    fn test_app_with_libcore_statements() {
        let project = analyse(&scenarios::app_with_libcore());
        let app_id = project.lookup("app").unwrap();
        let libcore_id = project.lookup("libcore.a").unwrap();
        assert_eq!(project.target(app_id).link_with, vec![libcore_id]);
        assert_eq!(project.target(app_id).link_libraries, vec!["/usr/lib/libm.so"]);

        let synthesis = synthesize(&project).unwrap();
        let block = &synthesis.block;
        assert_eq!(
            bindings(block),
            vec![
                "libcore_inc", "libcore_src", "libcore", "libcore_dep",
                "app_inc", "app_src", "app", "app_dep",
            ]
        );

        let app = block.lines[block.position_of("app").unwrap()].call().unwrap();
        assert_eq!(app.args.keywords["override_options"], Value::strings(["c_std=c11"]));
        assert_eq!(app.args.keywords["link_args"], Value::strings(["/usr/lib/libm.so"]));
        assert_eq!(app.args.keywords["link_with"], Value::ids(["libcore"]));
        assert_ne!(
            app.args.keywords.get("c_args"),
            Some(&Value::strings(["-std=c11"]))
        );
    }

    #[test]
    fn test_sources_include_generated() {
        let model = code_model(
            "g",
            vec![TargetBuilder::new("gen", "SHARED_LIBRARY")
                .group(FileGroupBuilder::new("C").sources(&["a.c"]))
                .group(
                    FileGroupBuilder::new("C")
                        .generated()
                        .sources(&["/proj/build/sub/__CMake_build/b.c"]),
                )
                .build()],
        );
        let synthesis = synthesize(&analyse(&model)).unwrap();
        let block = &synthesis.block;
        let files = block.lines[block.position_of("gen_src").unwrap()].call().unwrap();

        assert_eq!(
            files.args.positional,
            vec![Value::string("a.c"), Value::string("__CMake_build/b.c")]
        );
    }

    #[test]
    fn test_object_library_extraction() {
        let synthesis = synthesize(&analyse(&scenarios::object_library())).unwrap();
        let block = &synthesis.block;
        let tool = block.lines[block.position_of("tool").unwrap()].call().unwrap();

        assert!(block.position_of("helpers").unwrap() < block.position_of("tool").unwrap());
        match &tool.args.keywords["objects"] {
            Value::Array(items) => {
                assert_eq!(items.len(), 1);
                match &items[0] {
                    Value::Method(call) => {
                        assert_eq!(*call.object, Value::id("helpers"));
                        assert_eq!(call.name, "extract_all_objects");
                    }
                    other => panic!("expected method call, got {:?}", other),
                }
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_synthesis_is_idempotent() {
        let project = analyse(&scenarios::app_with_core());
        let first = synthesize(&project).unwrap();
        let second = synthesize(&project).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.identifiers["libcore.a"].tgt, "core");
    }

    #[test]
    fn test_identifier_collisions_get_suffix() {
        let model = code_model(
            "c",
            vec![
                TargetBuilder::new("a-b", "STATIC_LIBRARY").build(),
                TargetBuilder::new("a_b", "STATIC_LIBRARY").build(),
            ],
        );
        let synthesis = synthesize(&analyse(&model)).unwrap();
        assert_eq!(synthesis.identifiers["a-b"].tgt, "a_b");
        assert_eq!(synthesis.identifiers["a_b"].tgt, "a_b_2");
        assert_eq!(synthesis.identifiers["a_b"].dep, "a_b_2_dep");
    }

    #[test]
    fn test_cycle_is_reported() {
        let err = synthesize(&analyse(&scenarios::link_cycle())).unwrap_err();
        match err {
            BridgeError::DependencyCycle { targets } => {
                assert_eq!(targets, vec!["liba.a", "libb.a"]);
            }
            other => panic!("expected cycle, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_kind_fails() {
        let model = code_model(
            "i",
            vec![TargetBuilder::new("iface", "INTERFACE_LIBRARY").build()],
        );
        assert!(matches!(
            synthesize(&analyse(&model)),
            Err(BridgeError::UnsupportedTargetKind { .. })
        ));
    }
}
