/// Per-name flow facts.
///
/// A `State` answers three questions about a variable along one control-flow
/// path: has it been set, has it been read, has it been overwritten. Each
/// axis lives in a three-point domain where `Maybe` records disagreement
/// between joined paths. States are immutable once inserted into the name
/// tables; every update derives a successor that links back to its
/// predecessor through `trace`.
use std::rc::Rc;

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::ast::Position;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    No,
    Yes,
    Maybe,
}

impl Flag {
    /// Join at a path confluence: agreement is kept, disagreement is `Maybe`.
    pub fn join(self, other: Flag) -> Flag {
        if self == other {
            self
        } else {
            Flag::Maybe
        }
    }

    /// Degrade for a name present on only one side of a join.
    pub fn weaken(self) -> Flag {
        match self {
            Flag::No => Flag::No,
            Flag::Yes | Flag::Maybe => Flag::Maybe,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Flag::No => "no",
            Flag::Yes => "yes",
            Flag::Maybe => "maybe",
        }
    }
}

impl Serialize for Flag {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub name: String,
    pub ty: Type,
    pub set: Flag,
    pub read: Flag,
    pub over: Flag,
    /// The operation that produced this state: "store", "load", "append", "branch".
    pub method: &'static str,
    pub position: Position,
    /// Predecessor snapshots, most recent first. Joins carry both parents.
    pub trace: Vec<Rc<State>>,
}

impl State {
    /// A brand-new binding: set, not yet read, not overwritten.
    pub fn fresh(name: &str, ty: Type, position: Position) -> State {
        State {
            name: name.to_string(),
            ty,
            set: Flag::Yes,
            read: Flag::No,
            over: Flag::No,
            method: "store",
            position,
            trace: Vec::new(),
        }
    }

    /// Placeholder for a name read before any definition: unknown type, read
    /// but never set, so downstream rules can keep firing.
    pub fn placeholder(name: &str, position: Position) -> State {
        State {
            name: name.to_string(),
            ty: Type::Unknown,
            set: Flag::No,
            read: Flag::Yes,
            over: Flag::No,
            method: "load",
            position,
            trace: Vec::new(),
        }
    }

    /// Derive a successor carrying the same axes and type, with this state
    /// linked as its predecessor.
    pub fn traced(&self, method: &'static str, position: Position) -> State {
        State {
            name: self.name.clone(),
            ty: self.ty.clone(),
            set: self.set,
            read: self.read,
            over: self.over,
            method,
            position,
            trace: vec![Rc::new(self.clone())],
        }
    }
}

// Reports render a state as its observable summary; the trace chain stays an
// in-memory structure.
impl Serialize for State {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_struct("State", 7)?;
        out.serialize_field("name", &self.name)?;
        out.serialize_field("type", &self.ty.display())?;
        out.serialize_field("set", &self.set)?;
        out.serialize_field("read", &self.read)?;
        out.serialize_field("over", &self.over)?;
        out.serialize_field("method", self.method)?;
        out.serialize_field("position", &self.position)?;
        out.end()
    }
}
