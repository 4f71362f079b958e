//! Import loading and ordering using petgraph
//!
//! Starting from the root module, every import is handed to the
//! [`ImportResolver`] once per distinct path. The resulting import graph is
//! split into strongly connected components so modules are checked with their
//! imports first; a component with more than one module is an import cycle.

use crate::error::{CheckError, ErrorKind, ImportError, Loc};
use petal_ast::{Def, Module, Span};
use petgraph::algo;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::{HashMap, HashSet, VecDeque};

/// Supplies parsed modules for import paths
pub trait ImportResolver {
    fn resolve(&mut self, path: &str) -> Result<Module, ImportError>;
}

impl<F> ImportResolver for F
where
    F: FnMut(&str) -> Result<Module, ImportError>,
{
    fn resolve(&mut self, path: &str) -> Result<Module, ImportError> {
        self(path)
    }
}

/// Resolver backed by modules held in memory
#[derive(Debug, Default)]
pub struct MemoryResolver {
    modules: HashMap<String, Module>,
    requests: Vec<String>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, module: Module) -> Self {
        self.modules.insert(module.path.clone(), module);
        self
    }

    /// Every path requested so far, in order
    pub fn requests(&self) -> &[String] {
        &self.requests
    }
}

impl ImportResolver for MemoryResolver {
    fn resolve(&mut self, path: &str) -> Result<Module, ImportError> {
        self.requests.push(path.to_string());
        self.modules
            .get(path)
            .cloned()
            .ok_or_else(|| ImportError::NotFound {
                path: path.to_string(),
            })
    }
}

/// Resolver for programs without imports
#[derive(Debug, Default, Clone, Copy)]
pub struct NoImports;

impl ImportResolver for NoImports {
    fn resolve(&mut self, path: &str) -> Result<Module, ImportError> {
        Err(ImportError::NotFound {
            path: path.to_string(),
        })
    }
}

/// Modules in checking order (imports before importers)
#[derive(Debug)]
pub(crate) struct LoadedModules {
    pub order: Vec<Module>,
    pub errors: Vec<CheckError>,
}

#[derive(Debug, Default)]
struct ImportGraph {
    graph: DiGraph<String, Span>,
    nodes: HashMap<String, NodeIndex>,
}

impl ImportGraph {
    fn node(&mut self, path: &str) -> NodeIndex {
        if let Some(&n) = self.nodes.get(path) {
            return n;
        }
        let n = self.graph.add_node(path.to_string());
        self.nodes.insert(path.to_string(), n);
        n
    }
}

fn imports_of(module: &Module) -> Vec<(String, Span)> {
    module
        .defs
        .iter()
        .filter_map(|d| match d {
            Def::Import(i) => Some((i.path.clone(), i.span.clone())),
            _ => None,
        })
        .collect()
}

pub(crate) fn load_modules(root: Module, resolver: &mut dyn ImportResolver) -> LoadedModules {
    let mut graph = ImportGraph::default();
    let mut modules: HashMap<String, Module> = HashMap::new();
    let mut failed: HashSet<String> = HashSet::new();
    let mut errors = Vec::new();
    let mut queue = VecDeque::new();

    graph.node(&root.path);
    queue.push_back(root.path.clone());
    modules.insert(root.path.clone(), root);

    while let Some(path) = queue.pop_front() {
        let from = graph.node(&path);
        for (import, span) in imports_of(&modules[&path]) {
            if failed.contains(&import) {
                continue;
            }
            if !graph.nodes.contains_key(&import) {
                match resolver.resolve(&import) {
                    Ok(mut module) => {
                        tracing::debug!(path = %import, "loaded import");
                        module.path = import.clone();
                        graph.node(&import);
                        modules.insert(import.clone(), module);
                        queue.push_back(import.clone());
                    }
                    Err(err) => {
                        let kind = match err {
                            ImportError::NotFound { path } => ErrorKind::ImportNotFound { path },
                            ImportError::Parse { path, message } => {
                                ErrorKind::ImportFailed { path, message }
                            }
                        };
                        errors.push(CheckError::new(kind, Loc::new(path.clone(), span)));
                        failed.insert(import);
                        continue;
                    }
                }
            }
            let to = graph.node(&import);
            graph.graph.update_edge(from, to, span);
        }
    }

    let mut order = Vec::new();
    // tarjan_scc yields components in reverse topological order: imports first
    for component in algo::tarjan_scc(&graph.graph) {
        let cyclic = component.len() > 1
            || component
                .first()
                .is_some_and(|&n| graph.graph.contains_edge(n, n));
        if cyclic {
            errors.push(cycle_error(&graph.graph, &component));
        }
        let mut members: Vec<NodeIndex> = component;
        members.sort();
        for n in members {
            if let Some(module) = modules.remove(&graph.graph[n]) {
                order.push(module);
            }
        }
    }

    LoadedModules { order, errors }
}

fn cycle_error(graph: &DiGraph<String, Span>, component: &[NodeIndex]) -> CheckError {
    let mut members = component.to_vec();
    members.sort();
    let first = members[0];
    // report at the first import edge that stays inside the cycle
    let site = graph
        .edges(first)
        .find(|e| members.contains(&petgraph::visit::EdgeRef::target(e)))
        .map(|e| e.weight().clone())
        .unwrap_or_default();
    let mut err = CheckError::new(ErrorKind::ImportCycle, Loc::new(graph[first].clone(), site));
    for &n in &members {
        err = err.with_note(Loc::new(graph[n].clone(), Span::default()), graph[n].clone());
    }
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use petal_ast::build::*;

    #[test]
    fn test_imports_come_first() {
        let root = module("app", vec![Import::qualified("lib").into()]);
        let mut resolver = MemoryResolver::new()
            .with(module("lib", vec![Import::qualified("base").into()]))
            .with(module("base", vec![]));

        let loaded = load_modules(root, &mut resolver);
        let paths: Vec<&str> = loaded.order.iter().map(|m| m.path.as_str()).collect();
        assert_eq!(paths, vec!["base", "lib", "app"]);
        assert!(loaded.errors.is_empty());
    }

    #[test]
    fn test_each_path_is_resolved_once() {
        let root = module(
            "app",
            vec![
                Import::qualified("lib").into(),
                Import::splice("lib").into(),
                Import::qualified("other").into(),
            ],
        );
        let mut resolver = MemoryResolver::new()
            .with(module("lib", vec![Import::qualified("other").into()]))
            .with(module("other", vec![]));

        let loaded = load_modules(root, &mut resolver);
        assert_eq!(resolver.requests(), &["lib".to_string(), "other".to_string()]);
        assert_eq!(loaded.order.len(), 3);
    }

    #[test]
    fn test_missing_import_is_reported_at_the_import() {
        let root = module("app", vec![Import::qualified("nope").at(3).into()]);
        let loaded = load_modules(root, &mut NoImports);
        assert_eq!(loaded.errors.len(), 1);
        assert_eq!(
            loaded.errors[0].kind,
            ErrorKind::ImportNotFound {
                path: "nope".to_string()
            }
        );
        assert_eq!(loaded.errors[0].loc.line(), Some(3));
    }

    #[test]
    fn test_import_cycle_reported_once() {
        let root = module("a", vec![Import::qualified("b").into()]);
        let mut resolver = MemoryResolver::new().with(module("b", vec![Import::qualified("a").into()]));

        let loaded = load_modules(root, &mut resolver);
        let cycles: Vec<_> = loaded
            .errors
            .iter()
            .filter(|e| e.kind == ErrorKind::ImportCycle)
            .collect();
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].notes.len(), 2);
        assert_eq!(loaded.order.len(), 2);
    }
}
