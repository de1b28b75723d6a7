//! Conversion of a whole code model.

use std::collections::HashMap;

use serde::Serialize;

use crate::convert::language::Language;
use crate::convert::paths::RebaseRoots;
use crate::convert::target::{ConvertedTarget, TargetId};
use crate::server::codemodel::{CodeModel, TargetType};

/// Every convertible target of a code model, indexed by [`TargetId`].
#[derive(Debug, Clone, Default)]
pub struct ConvertedProject {
    /// Name of the first CMake project; empty when the model has none.
    pub name: String,
    /// Languages used by any target, in first-seen order.
    pub languages: Vec<Language>,
    targets: Vec<ConvertedTarget>,
    by_full_name: HashMap<String, TargetId>,
}

impl ConvertedProject {
    /// Convert `model`, rebasing paths against `roots`.
    ///
    /// Utility targets are skipped. When the model lists several
    /// configurations, the first target with a given full name wins.
    pub fn analyse(model: &CodeModel, roots: &RebaseRoots) -> Self {
        let mut project = ConvertedProject {
            name: model
                .configurations
                .iter()
                .flat_map(|c| c.projects.iter())
                .map(|p| p.name.clone())
                .next()
                .unwrap_or_default(),
            ..ConvertedProject::default()
        };

        for target in model.targets() {
            if target.target_type == TargetType::Utility {
                tracing::debug!("Skipping utility target {}", target.name);
                continue;
            }
            if project.by_full_name.contains_key(&target.full_name) {
                tracing::debug!("Skipping duplicate target {}", target.full_name);
                continue;
            }

            let converted = ConvertedTarget::new(target);
            for lang in &converted.languages {
                if !project.languages.contains(lang) {
                    project.languages.push(*lang);
                }
            }

            let id = TargetId(project.targets.len());
            project.by_full_name.insert(converted.full_name.clone(), id);
            project.targets.push(converted);
        }

        for target in &mut project.targets {
            target.postprocess(&project.by_full_name, roots);
        }

        let object_libs: Vec<_> = project
            .iter()
            .filter(|(_, t)| t.target_type == TargetType::ObjectLibrary)
            .map(|(id, t)| (id, t.object_outputs()))
            .collect();
        for (index, target) in project.targets.iter_mut().enumerate() {
            target.process_object_libs(TargetId(index), &object_libs);
        }

        for target in &project.targets {
            target.log(|id| project.full_name(id).to_string());
        }

        project
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn target(&self, id: TargetId) -> &ConvertedTarget {
        &self.targets[id.0]
    }

    pub fn full_name(&self, id: TargetId) -> &str {
        &self.targets[id.0].full_name
    }

    pub fn lookup(&self, full_name: &str) -> Option<TargetId> {
        self.by_full_name.get(full_name).copied()
    }

    /// Targets in conversion order.
    pub fn iter(&self) -> impl Iterator<Item = (TargetId, &ConvertedTarget)> {
        self.targets
            .iter()
            .enumerate()
            .map(|(i, t)| (TargetId(i), t))
    }

    /// Targets `id` depends on: linked targets first, then object libraries.
    pub fn dependencies(&self, id: TargetId) -> impl Iterator<Item = TargetId> + '_ {
        let target = self.target(id);
        target
            .link_with
            .iter()
            .chain(&target.object_libs)
            .copied()
    }

    fn full_names(&self, ids: &[TargetId]) -> Vec<&str> {
        ids.iter().map(|id| self.full_name(*id)).collect()
    }

    /// A serializable summary with dependency edges resolved to full names.
    pub fn report(&self) -> ProjectReport<'_> {
        ProjectReport {
            name: &self.name,
            languages: &self.languages,
            targets: self
                .targets
                .iter()
                .map(|t| TargetReport {
                    function: t.function().ok().map(|f| f.as_str()),
                    link_with: self.full_names(&t.link_with),
                    object_libs: self.full_names(&t.object_libs),
                    target: t,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProjectReport<'a> {
    pub name: &'a str,
    pub languages: &'a [Language],
    pub targets: Vec<TargetReport<'a>>,
}

#[derive(Debug, Serialize)]
pub struct TargetReport<'a> {
    #[serde(flatten)]
    pub target: &'a ConvertedTarget,
    pub function: Option<&'static str>,
    pub link_with: Vec<&'a str>,
    pub object_libs: Vec<&'a str>,
}
