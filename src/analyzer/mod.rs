/// Flow-sensitive abstract interpreter over the input AST.
///
/// One `Analyzer` value serves exactly one analysis. Scopes form a chain that
/// governs visibility; paths form a chain that isolates the effects of each
/// branch until it is joined back into its parent. Names are keyed by their
/// fully-scoped form (`"1/0/x"` for `x` defined in scope 1 under the module),
/// and every name resolution walks the scope chain from the innermost scope
/// outward across every live path.
mod builtins;
mod visit;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

use thiserror::Error;

use crate::ast::{Module, Position};
use crate::report::{IssueData, IssueKind, Report};
use crate::state::{Flag, State};
use crate::types::{are_types_equal, PathId, ScopeId, Type};

/// Unrecoverable analyzer failure. Diagnostics never travel this way; they
/// accumulate in the report and analysis continues past every one of them.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("analyzer failure: {0}")]
    Internal(String),
}

const MODULE_SCOPE: ScopeId = 0;
const MODULE_PATH: PathId = 0;

fn either_unknown(left: &Type, right: &Type) -> bool {
    matches!(left, Type::Unknown) || matches!(right, Type::Unknown)
}

/// Synthetic name holding a function body's return type.
const RETURN_NAME: &str = "*return";

pub struct Analyzer {
    /// Scope chain, innermost scope last. Entry 0 is always the module.
    scope_chain: Vec<ScopeId>,
    /// Path chain, innermost path last. Entry 0 is always the module path.
    path_chain: Vec<PathId>,
    /// PathId -> fully-scoped name -> latest state on that path.
    name_map: BTreeMap<PathId, BTreeMap<String, State>>,
    builtins: HashMap<&'static str, Type>,
    /// User definitions currently being analyzed; guards against re-entry.
    definition_chain: Vec<u64>,
    scope_counter: ScopeId,
    path_counter: PathId,
    node_counter: u64,
    report: Report,
}

/// Result of resolving a bare name against the scope and path chains.
pub(crate) struct ScopeLookup {
    pub in_scope: bool,
    pub scoped_name: String,
    pub state: Option<State>,
}

/// Analyze one source unit and produce its report. Internal failures are
/// caught here so the caller never observes a partial result.
pub fn analyze(module: &Module) -> Report {
    let run = panic::catch_unwind(AssertUnwindSafe(|| Analyzer::new().run(module)));
    match run {
        Ok(report) => report,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "analysis aborted".to_string());
            Report::failure(AnalyzerError::Internal(message).to_string())
        }
    }
}

/// Convenience wrapper over `analyze` for a JSON-serialized syntax tree, as
/// produced by the external parser. A tree that cannot be deserialized is a
/// parser failure: `success` stays false and one issue records the fact.
pub fn analyze_json(source: &str) -> Report {
    match serde_json::from_str::<Module>(source) {
        Ok(module) => analyze(&module),
        Err(err) => {
            let mut report = Report::failure(err.to_string());
            report.issue(IssueKind::ParserFailure, IssueData::default());
            report
        }
    }
}

impl Analyzer {
    pub fn new() -> Analyzer {
        let mut name_map = BTreeMap::new();
        name_map.insert(MODULE_PATH, BTreeMap::new());
        Analyzer {
            scope_chain: vec![MODULE_SCOPE],
            path_chain: vec![MODULE_PATH],
            name_map,
            builtins: builtins::table(),
            definition_chain: Vec::new(),
            scope_counter: MODULE_SCOPE,
            path_counter: MODULE_PATH,
            node_counter: 0,
            report: Report::new(),
        }
    }

    pub fn run(mut self, module: &Module) -> Report {
        if module.body.is_empty() {
            self.issue(IssueKind::EmptyBody, IssueData::at(Position::default()));
        }
        self.visit_stmts(&module.body);
        self.finish_scope();

        self.report.variables = self.name_map.clone();
        let module_map = self.name_map.get(&MODULE_PATH).cloned().unwrap_or_default();
        for (full_name, state) in module_map {
            if let Some((scope, bare)) = full_name.rsplit_once('/') {
                if scope == "0" {
                    self.report
                        .top_level_variables
                        .insert(bare.to_string(), state);
                }
            }
        }
        self.report.success = true;
        self.report
    }

    // -----------------------------------------------------------------------
    // Issue plumbing
    // -----------------------------------------------------------------------

    pub(crate) fn issue(&mut self, kind: IssueKind, data: IssueData) {
        self.report.issue(kind, data);
    }

    pub(crate) fn bump_node(&mut self) -> u64 {
        self.node_counter += 1;
        self.node_counter
    }

    // -----------------------------------------------------------------------
    // Scope and path chains
    // -----------------------------------------------------------------------

    fn chain_str(chain: &[ScopeId]) -> String {
        let parts: Vec<String> = chain.iter().rev().map(|s| s.to_string()).collect();
        parts.join("/")
    }

    /// The current scope chain rendered innermost-first, e.g. `"1/0"`.
    pub(crate) fn scope_str(&self) -> String {
        Self::chain_str(&self.scope_chain)
    }

    /// The fully-scoped form of `name` in the current scope chain.
    pub(crate) fn scoped_name(&self, name: &str) -> String {
        format!("{}/{}", self.scope_str(), name)
    }

    pub(crate) fn scope_depth(&self) -> usize {
        self.scope_chain.len()
    }

    fn current_path(&self) -> PathId {
        *self.path_chain.last().expect("path chain never empty")
    }

    fn insert_state(&mut self, scoped_name: String, state: State) {
        let path = self.current_path();
        self.name_map
            .get_mut(&path)
            .expect("current path is always mapped")
            .insert(scoped_name, state);
    }

    /// Run `body` under a fresh control-flow path. The path is pushed for the
    /// duration of the closure and popped on the way out, so a caller cannot
    /// leave the chain unbalanced.
    pub(crate) fn with_path<T>(&mut self, body: impl FnOnce(&mut Self) -> T) -> (PathId, T) {
        self.path_counter += 1;
        let path_id = self.path_counter;
        self.name_map.insert(path_id, BTreeMap::new());
        self.path_chain.push(path_id);
        let out = body(self);
        self.path_chain.pop();
        (path_id, out)
    }

    /// Run `body` inside a fresh function scope stacked on `defining_scope`
    /// (the chain captured when the function was defined). The scope is
    /// finalized and the caller's chain restored on the way out.
    pub(crate) fn with_function_scope<T>(
        &mut self,
        defining_scope: &[ScopeId],
        body: impl FnOnce(&mut Self) -> T,
    ) -> T {
        self.scope_counter += 1;
        let mut chain = defining_scope.to_vec();
        chain.push(self.scope_counter);
        let saved = std::mem::replace(&mut self.scope_chain, chain);
        let out = body(self);
        self.finish_scope();
        self.scope_chain = saved;
        out
    }

    pub(crate) fn defining_scope(&self) -> Vec<ScopeId> {
        self.scope_chain.clone()
    }

    // -----------------------------------------------------------------------
    // Name resolution
    // -----------------------------------------------------------------------

    /// Walk outward from the innermost scope: for each suffix of the scope
    /// chain and each live path, look for `suffix + "/" + name`. Only a hit
    /// under the full chain counts as in-scope.
    pub(crate) fn find_in_scope(&self, name: &str) -> ScopeLookup {
        for cut in 0..self.scope_chain.len() {
            let visible = &self.scope_chain[..self.scope_chain.len() - cut];
            let scoped = format!("{}/{}", Self::chain_str(visible), name);
            for path in self.path_chain.iter().rev() {
                if let Some(state) = self.name_map.get(path).and_then(|m| m.get(&scoped)) {
                    return ScopeLookup {
                        in_scope: cut == 0,
                        scoped_name: scoped,
                        state: Some(state.clone()),
                    };
                }
            }
        }
        ScopeLookup {
            in_scope: false,
            scoped_name: self.scoped_name(name),
            state: None,
        }
    }

    /// Does any path, in any scope, hold a binding whose bare name is `name`?
    /// Distinguishes an out-of-scope read from a truly undefined one.
    pub(crate) fn find_out_of_scope(&self, name: &str) -> bool {
        self.name_map.values().any(|names| {
            names
                .keys()
                .any(|full| full.rsplit('/').next() == Some(name))
        })
    }

    pub(crate) fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    pub(crate) fn builtin_type(&self, name: &str) -> Option<Type> {
        self.builtins.get(name).cloned()
    }

    // -----------------------------------------------------------------------
    // Store / load
    // -----------------------------------------------------------------------

    pub(crate) fn store_variable(&mut self, name: &str, ty: Type, position: Position) -> State {
        if self.is_builtin(name) {
            self.issue(
                IssueKind::AliasedBuiltin,
                IssueData::at(position).named(name),
            );
        }
        let found = self.find_in_scope(name);
        let state = match found.state {
            None => State::fresh(name, ty, position),
            Some(prev) => {
                let mut next = prev.traced("store", position);
                if !found.in_scope {
                    self.issue(
                        IssueKind::WriteOutOfScope,
                        IssueData::at(position).named(name).in_scope(self.scope_str()),
                    );
                }
                // A side that is Unknown already failed inference and was
                // reported there; a type-change diagnostic on top is noise.
                if !are_types_equal(&ty, &prev.ty) && !either_unknown(&ty, &prev.ty) {
                    self.issue(
                        IssueKind::TypeChanges,
                        IssueData::at(position)
                            .named(name)
                            .changed(prev.ty.display(), ty.display()),
                    );
                }
                next.ty = ty;
                if prev.set == Flag::Yes && prev.read == Flag::No {
                    next.over = Flag::Yes;
                } else {
                    next.set = Flag::Yes;
                    next.read = Flag::No;
                }
                next
            }
        };
        self.insert_state(self.scoped_name(name), state.clone());
        state
    }

    /// Store for a loop variable: binding it counts as both a write and a
    /// read, so the loop variable alone never trips the unread sweep.
    pub(crate) fn store_iter_variable(
        &mut self,
        name: &str,
        ty: Type,
        position: Position,
    ) -> State {
        let mut state = self.store_variable(name, ty, position);
        state.read = Flag::Yes;
        self.insert_state(self.scoped_name(name), state.clone());
        state
    }

    /// Refresh a binding after an in-place refinement (`.append`): the axes
    /// are untouched, only the type and trace move forward.
    pub(crate) fn append_variable(&mut self, name: &str, ty: Type, position: Position) {
        let found = self.find_in_scope(name);
        if let Some(prev) = found.state {
            let mut next = prev.traced("append", position);
            next.ty = ty;
            self.insert_state(found.scoped_name, next);
        }
    }

    pub(crate) fn load_variable(&mut self, name: &str, position: Position) -> State {
        let found = self.find_in_scope(name);
        match found.state {
            None => {
                if self.find_out_of_scope(name) {
                    self.issue(
                        IssueKind::ReadOutOfScope,
                        IssueData::at(position).named(name).in_scope(self.scope_str()),
                    );
                } else {
                    self.issue(
                        IssueKind::UndefinedVariables,
                        IssueData::at(position).named(name),
                    );
                }
                let state = State::placeholder(name, position);
                self.insert_state(self.scoped_name(name), state.clone());
                state
            }
            Some(prev) => {
                let mut next = prev.traced("load", position);
                match prev.set {
                    Flag::No => self.issue(
                        IssueKind::UndefinedVariables,
                        IssueData::at(position).named(name),
                    ),
                    Flag::Maybe => self.issue(
                        IssueKind::PossiblyUndefinedVariables,
                        IssueData::at(position).named(name),
                    ),
                    Flag::Yes => {}
                }
                next.read = Flag::Yes;
                // A function loaded from an outer scope keeps its own scoped
                // name: calling it must not fork a local shadow.
                let key = if !found.in_scope && matches!(prev.ty, Type::Function(_)) {
                    found.scoped_name
                } else {
                    self.scoped_name(name)
                };
                self.insert_state(key, next.clone());
                next
            }
        }
    }

    // -----------------------------------------------------------------------
    // Path joining
    // -----------------------------------------------------------------------

    /// Join two paths: names on both sides agree or degrade per axis, names
    /// on one side weaken toward `Maybe`. The result lands in the parent path.
    fn combine_states(&mut self, left: &State, right: Option<&State>, position: Position) -> State {
        let mut next = left.traced("branch", position);
        match right {
            None => {
                next.set = left.set.weaken();
                next.read = left.read.weaken();
                next.over = left.over.weaken();
            }
            Some(right) => {
                if !are_types_equal(&left.ty, &right.ty) && !either_unknown(&left.ty, &right.ty) {
                    self.issue(
                        IssueKind::TypeChanges,
                        IssueData::at(position)
                            .named(&left.name)
                            .changed(left.ty.display(), right.ty.display()),
                    );
                }
                next.set = left.set.join(right.set);
                next.read = left.read.join(right.read);
                next.over = left.over.join(right.over);
                next.trace.push(std::rc::Rc::new(right.clone()));
            }
        }
        next
    }

    /// Fold the two child paths of a branching construct back into the
    /// current path.
    pub(crate) fn merge_paths(&mut self, left: PathId, right: PathId, position: Position) {
        let left_map = self.name_map.get(&left).cloned().unwrap_or_default();
        let right_map = self.name_map.get(&right).cloned().unwrap_or_default();

        for (name, left_state) in &left_map {
            let combined = self.combine_states(left_state, right_map.get(name), position);
            self.insert_state(name.clone(), combined);
        }
        for (name, right_state) in &right_map {
            if !left_map.contains_key(name) {
                let combined = self.combine_states(right_state, None, position);
                self.insert_state(name.clone(), combined);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Scope finalization
    // -----------------------------------------------------------------------

    /// End-of-scope sweep over the current path: a binding overwritten before
    /// any read is reported, as is one never read at all. Synthetic names and
    /// function bindings are exempt from the unread check.
    pub(crate) fn finish_scope(&mut self) {
        let path = self.current_path();
        let scope = self.scope_str();
        let entries: Vec<State> = self
            .name_map
            .get(&path)
            .map(|names| {
                names
                    .iter()
                    .filter(|(full, _)| {
                        full.rsplit_once('/')
                            .map(|(prefix, _)| prefix == scope)
                            .unwrap_or(false)
                    })
                    .map(|(_, state)| state.clone())
                    .collect()
            })
            .unwrap_or_default();

        for state in entries {
            if state.name.starts_with('*') {
                continue;
            }
            if state.over == Flag::Yes {
                self.issue(
                    IssueKind::OverwrittenVariables,
                    IssueData::at(state.position)
                        .named(&state.name)
                        .in_scope(scope.clone()),
                );
            }
            if state.read == Flag::No && !matches!(state.ty, Type::Function(_)) {
                self.issue(
                    IssueKind::UnreadVariables,
                    IssueData::at(state.position)
                        .named(&state.name)
                        .of_type(state.ty.display())
                        .in_scope(scope.clone()),
                );
            }
        }
    }

    /// The function body's return type, if the scope being finished set one.
    pub(crate) fn scope_return_type(&self) -> Option<Type> {
        let found = self.find_in_scope(RETURN_NAME);
        match found.state {
            Some(state) if found.in_scope => Some(state.ty),
            _ => None,
        }
    }
}

impl Default for Analyzer {
    fn default() -> Self {
        Analyzer::new()
    }
}
