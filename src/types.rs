/// Inferred type lattice and the operator tables over it.
///
/// Types are tagged values. The mutable container tags (List, Dict, Set) hold
/// their element information behind `Rc<RefCell<..>>` so that passing a value
/// into a function body or calling `.append` refines the one shared instance,
/// while the immutable tags copy cleanly. `Unknown` is the inference-failure
/// sentinel: it compares unequal to everything, itself included.
use std::cell::RefCell;
use std::rc::Rc;

use crate::ast::{Operator, Stmt};

/// Identifier of a function scope; scope 0 is the module.
pub type ScopeId = u32;
/// Identifier of a control-flow path; path 0 is the module path.
pub type PathId = u32;

#[derive(Debug, Clone)]
pub enum Type {
    Num,
    Str,
    Bool,
    None,
    List(Rc<RefCell<ListType>>),
    Tuple(Rc<TupleType>),
    Dict(Rc<RefCell<DictType>>),
    Set(Rc<RefCell<SetType>>),
    File,
    Function(Callable),
    Unknown,
}

#[derive(Debug, Clone, Default)]
pub struct ListType {
    pub empty: bool,
    pub subtype: Option<Type>,
}

#[derive(Debug, Clone)]
pub struct TupleType {
    pub empty: bool,
    pub subtypes: Vec<Type>,
}

#[derive(Debug, Clone)]
pub struct DictType {
    pub empty: bool,
    pub keys: Type,
    pub values: Type,
}

#[derive(Debug, Clone, Default)]
pub struct SetType {
    pub empty: bool,
    pub subtype: Option<Type>,
}

/// The `definition` carried by a Function type: what to do when it is called.
#[derive(Debug, Clone)]
pub enum Callable {
    Builtin(Builtin),
    Method(Method),
    User(Rc<UserFunction>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Range,
    SetConstructor,
    Print,
    Input,
    Open,
}

/// A method bound to its receiver at attribute-lookup time.
#[derive(Debug, Clone)]
pub enum Method {
    ListAppend(Box<Type>),
    DictItems(Box<Type>),
}

/// A function defined in the analyzed source. The body is analyzed once per
/// call site, under the snapshot of the scope chain captured at definition.
#[derive(Debug)]
pub struct UserFunction {
    pub id: u64,
    pub name: String,
    pub params: Vec<String>,
    pub body: Rc<Vec<Stmt>>,
    pub defining_scope: Vec<ScopeId>,
}

impl Type {
    pub fn empty_list() -> Type {
        Type::List(Rc::new(RefCell::new(ListType {
            empty: true,
            subtype: None,
        })))
    }

    pub fn list_of(subtype: Type) -> Type {
        Type::List(Rc::new(RefCell::new(ListType {
            empty: false,
            subtype: Some(subtype),
        })))
    }

    pub fn empty_tuple() -> Type {
        Type::Tuple(Rc::new(TupleType {
            empty: true,
            subtypes: Vec::new(),
        }))
    }

    pub fn tuple_of(subtypes: Vec<Type>) -> Type {
        Type::Tuple(Rc::new(TupleType {
            empty: subtypes.is_empty(),
            subtypes,
        }))
    }

    pub fn empty_dict() -> Type {
        Type::Dict(Rc::new(RefCell::new(DictType {
            empty: true,
            keys: Type::Unknown,
            values: Type::Unknown,
        })))
    }

    pub fn dict_of(keys: Type, values: Type) -> Type {
        Type::Dict(Rc::new(RefCell::new(DictType {
            empty: false,
            keys,
            values,
        })))
    }

    pub fn empty_set() -> Type {
        Type::Set(Rc::new(RefCell::new(SetType {
            empty: true,
            subtype: None,
        })))
    }

    /// The tag name, as it appears in reports.
    pub fn name(&self) -> &'static str {
        match self {
            Type::Num => "Num",
            Type::Str => "Str",
            Type::Bool => "Bool",
            Type::None => "None",
            Type::List(_) => "List",
            Type::Tuple(_) => "Tuple",
            Type::Dict(_) => "Dict",
            Type::Set(_) => "Set",
            Type::File => "File",
            Type::Function(_) => "Function",
            Type::Unknown => "Unknown",
        }
    }

    pub fn display(&self) -> String {
        match self {
            Type::List(inner) => {
                let inner = inner.borrow();
                match &inner.subtype {
                    Some(sub) if !inner.empty => format!("List[{}]", sub.display()),
                    _ => "List".to_string(),
                }
            }
            Type::Tuple(inner) => {
                if inner.empty {
                    "Tuple".to_string()
                } else {
                    let parts: Vec<String> =
                        inner.subtypes.iter().map(|t| t.display()).collect();
                    format!("Tuple[{}]", parts.join(", "))
                }
            }
            Type::Dict(inner) => {
                let inner = inner.borrow();
                if inner.empty {
                    "Dict".to_string()
                } else {
                    format!("Dict[{}, {}]", inner.keys.display(), inner.values.display())
                }
            }
            Type::Set(inner) => {
                let inner = inner.borrow();
                match &inner.subtype {
                    Some(sub) if !inner.empty => format!("Set[{}]", sub.display()),
                    _ => "Set".to_string(),
                }
            }
            other => other.name().to_string(),
        }
    }
}

/// Structural equality over the lattice. `Unknown` never equals anything.
/// An empty list equals any list: empty literals are treated as polymorphic,
/// so `xs = []` followed by `xs = [1]` is not a type change.
pub fn are_types_equal(left: &Type, right: &Type) -> bool {
    match (left, right) {
        (Type::Unknown, _) | (_, Type::Unknown) => false,
        (Type::List(l), Type::List(r)) => {
            let (l, r) = (l.borrow(), r.borrow());
            if l.empty || r.empty {
                return true;
            }
            match (&l.subtype, &r.subtype) {
                (Some(a), Some(b)) => are_types_equal(a, b),
                _ => true,
            }
        }
        _ => left.name() == right.name(),
    }
}

/// Element type obtained by indexing a sequence at `index`.
pub fn index_sequence_type(ty: &Type, index: usize) -> Type {
    match ty {
        Type::Tuple(inner) => inner.subtypes.get(index).cloned().unwrap_or(Type::Unknown),
        Type::List(inner) => inner.borrow().subtype.clone().unwrap_or(Type::Unknown),
        Type::Set(inner) => inner.borrow().subtype.clone().unwrap_or(Type::Unknown),
        Type::Str | Type::File => Type::Str,
        _ => Type::Unknown,
    }
}

pub fn is_sequence(ty: &Type) -> bool {
    matches!(
        ty,
        Type::List(_) | Type::Set(_) | Type::Tuple(_) | Type::Str | Type::File
    )
}

pub fn is_empty_list(ty: &Type) -> bool {
    match ty {
        Type::List(inner) => inner.borrow().empty,
        _ => false,
    }
}

/// Copy semantics at a call boundary: immutable tags yield a fresh value,
/// mutable containers keep sharing their cell with the caller.
pub fn copy_type(ty: &Type) -> Type {
    match ty {
        Type::Num => Type::Num,
        Type::Str => Type::Str,
        Type::Tuple(inner) => Type::Tuple(Rc::new(TupleType {
            empty: inner.empty,
            subtypes: inner.subtypes.clone(),
        })),
        other => other.clone(),
    }
}

/// The binary-operator table. `None` means the operand pair is incompatible;
/// the visitor reports it and falls back to `Unknown`.
pub fn apply_binary_op(op: Operator, left: &Type, right: &Type) -> Option<Type> {
    use Operator::*;
    match (op, left, right) {
        (Add, Type::Num, Type::Num) => Some(Type::Num),
        (Add, Type::Str, Type::Str) => Some(Type::Str),
        (Add, Type::List(l), Type::List(r)) => Some(merge_lists(l, r)),
        (Add, Type::Tuple(l), Type::Tuple(r)) => Some(concat_tuples(l, r)),
        (Sub, Type::Num, Type::Num) => Some(Type::Num),
        (Sub, Type::Set(l), Type::Set(r)) => Some(merge_sets(l, r)),
        (Mult, Type::Num, Type::Num) => Some(Type::Num),
        (Mult, Type::Num, Type::Str) | (Mult, Type::Str, Type::Num) => Some(Type::Str),
        (Mult, Type::Num, seq @ (Type::List(_) | Type::Tuple(_))) => Some(seq.clone()),
        (Mult, seq @ (Type::List(_) | Type::Tuple(_)), Type::Num) => Some(seq.clone()),
        (Div | Mod | Pow, Type::Num, Type::Num) => Some(Type::Num),
        _ => None,
    }
}

/// Merged list type: an empty left side adopts the right side's element type.
fn merge_lists(left: &Rc<RefCell<ListType>>, right: &Rc<RefCell<ListType>>) -> Type {
    let (l, r) = (left.borrow(), right.borrow());
    Type::List(Rc::new(RefCell::new(ListType {
        empty: l.empty && r.empty,
        subtype: if l.empty {
            r.subtype.clone()
        } else {
            l.subtype.clone()
        },
    })))
}

fn merge_sets(left: &Rc<RefCell<SetType>>, right: &Rc<RefCell<SetType>>) -> Type {
    let (l, r) = (left.borrow(), right.borrow());
    Type::Set(Rc::new(RefCell::new(SetType {
        empty: l.empty && r.empty,
        subtype: if l.empty {
            r.subtype.clone()
        } else {
            l.subtype.clone()
        },
    })))
}

fn concat_tuples(left: &Rc<TupleType>, right: &Rc<TupleType>) -> Type {
    Type::Tuple(Rc::new(TupleType {
        empty: left.empty && right.empty,
        subtypes: left
            .subtypes
            .iter()
            .chain(right.subtypes.iter())
            .cloned()
            .collect(),
    }))
}
