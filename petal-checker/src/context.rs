//! Per-run checker state
//!
//! Memo tables for type and function instances, alias resolution state, the
//! synthetic type variables of generic definitions and the queue of instance
//! bodies still to be checked. One context serves exactly one checking run.

use crate::error::CheckError;
use petal_ast::{FunId, ModId, TypeId, VarId};
use std::collections::{HashMap, HashSet, VecDeque};

/// Memo key of a type instance: the generic definition and its ground arguments
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeInstKey {
    pub def: TypeId,
    pub args: Vec<TypeId>,
}

/// Memo key of a function instance. The calling module is part of the key
/// because the instance body is checked with that module's methods visible.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FunInstKey {
    pub def: FunId,
    pub caller: ModId,
    pub args: Vec<TypeId>,
}

/// Owner of a list of type parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParmOwner {
    Type(TypeId),
    Fun(FunId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VarState {
    InProgress,
    /// An initialization cycle through this variable was reported
    Cycle,
    Done,
}

#[derive(Debug, Default)]
struct Memo {
    types: HashMap<TypeInstKey, Result<TypeId, Vec<CheckError>>>,
    funs: HashMap<FunInstKey, Result<FunId, Vec<CheckError>>>,
}

#[derive(Debug, Default)]
pub struct CheckerContext {
    memo: Memo,
    /// Instances made while discarding; dropped when discarding ends
    scratch: Memo,
    discard: u32,

    pub(crate) alias_path: Vec<TypeId>,
    pub(crate) alias_cycles: HashSet<TypeId>,
    pub(crate) alias_targets: HashMap<TypeId, Option<TypeId>>,

    /// Type instances whose bodies are being built, innermost last
    pub(crate) instantiating: Vec<TypeInstKey>,
    /// Generic definitions found to instantiate without end
    pub(crate) divergent_types: HashSet<TypeId>,
    pub(crate) divergent_funs: HashSet<FunId>,
    /// The body that first asked for each function instance
    pub(crate) fun_origins: HashMap<FunId, FunId>,
    /// The function whose body is being checked
    pub(crate) current_fun: Option<FunId>,

    pub(crate) type_vars: HashMap<(ParmOwner, usize), TypeId>,
    pub(crate) var_states: HashMap<VarId, VarState>,
    pub(crate) pending_bodies: VecDeque<FunId>,
    pub(crate) current_module: Option<ModId>,
    temp_counter: u32,
}

impl CheckerContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn discarding(&self) -> bool {
        self.discard > 0
    }

    pub(crate) fn begin_discard(&mut self) {
        self.discard += 1;
    }

    pub(crate) fn end_discard(&mut self) {
        self.discard -= 1;
        if self.discard == 0 {
            self.scratch = Memo::default();
        }
    }

    /// Leaves discard mode for work whose results outlive the discarding
    /// caller. Returns the depth to hand back to `resume_discard`.
    pub(crate) fn suspend_discard(&mut self) -> u32 {
        std::mem::take(&mut self.discard)
    }

    pub(crate) fn resume_discard(&mut self, depth: u32) {
        self.discard = depth;
    }

    /// Scratch instances are visible only while discarding
    pub fn type_instance(&self, key: &TypeInstKey) -> Option<&Result<TypeId, Vec<CheckError>>> {
        self.memo
            .types
            .get(key)
            .or_else(|| self.scratch.types.get(key).filter(|_| self.discarding()))
    }

    pub fn fun_instance(&self, key: &FunInstKey) -> Option<&Result<FunId, Vec<CheckError>>> {
        self.memo
            .funs
            .get(key)
            .or_else(|| self.scratch.funs.get(key).filter(|_| self.discarding()))
    }

    pub(crate) fn memo_type(&mut self, key: TypeInstKey, value: Result<TypeId, Vec<CheckError>>) {
        if self.discarding() && !self.memo.types.contains_key(&key) {
            self.scratch.types.insert(key, value);
        } else {
            self.memo.types.insert(key, value);
        }
    }

    pub(crate) fn memo_fun(&mut self, key: FunInstKey, value: Result<FunId, Vec<CheckError>>) {
        if self.discarding() && !self.memo.funs.contains_key(&key) {
            self.scratch.funs.insert(key, value);
        } else {
            self.memo.funs.insert(key, value);
        }
    }

    pub fn type_instance_count(&self) -> usize {
        self.memo.types.values().filter(|r| r.is_ok()).count()
    }

    pub fn fun_instance_count(&self) -> usize {
        self.memo.funs.values().filter(|r| r.is_ok()).count()
    }

    /// A fresh name for a compiler-introduced local
    pub(crate) fn temp_name(&mut self) -> String {
        self.temp_counter += 1;
        format!("$t{}", self.temp_counter)
    }
}
