/// Built-in functions, attribute methods, and the call evaluator that drives
/// them. User definitions re-enter the visitor on their stored body under a
/// fresh scope stacked on the defining chain.
use std::collections::HashMap;

use crate::ast::Position;
use crate::types::{copy_type, Builtin, Callable, Method, Type};

use super::Analyzer;

/// Names resolvable everywhere without a binding.
pub(super) fn table() -> HashMap<&'static str, Type> {
    let mut builtins = HashMap::new();
    builtins.insert("range", Type::Function(Callable::Builtin(Builtin::Range)));
    builtins.insert(
        "set",
        Type::Function(Callable::Builtin(Builtin::SetConstructor)),
    );
    builtins.insert("print", Type::Function(Callable::Builtin(Builtin::Print)));
    builtins.insert("input", Type::Function(Callable::Builtin(Builtin::Input)));
    builtins.insert("open", Type::Function(Callable::Builtin(Builtin::Open)));
    builtins
}

impl Analyzer {
    /// Invoke a Function type's definition with already-inferred argument
    /// types. `callee` is the root name the call was reached through, when
    /// one could be identified.
    pub(crate) fn call_function(
        &mut self,
        callable: &Callable,
        args: &[Type],
        callee: Option<&str>,
        position: Position,
    ) -> Type {
        match callable {
            Callable::Builtin(builtin) => match builtin {
                Builtin::Range => Type::list_of(Type::Num),
                Builtin::SetConstructor => Type::empty_set(),
                Builtin::Print => Type::None,
                Builtin::Input => Type::Str,
                Builtin::Open => Type::File,
            },
            Callable::Method(method) => match method {
                Method::ListAppend(receiver) => {
                    if let Type::List(inner) = receiver.as_ref() {
                        {
                            let mut inner = inner.borrow_mut();
                            inner.empty = false;
                            if let Some(arg) = args.first() {
                                inner.subtype = Some(arg.clone());
                            }
                        }
                        if let Some(name) = callee {
                            self.append_variable(name, receiver.as_ref().clone(), position);
                        }
                    }
                    Type::None
                }
                Method::DictItems(receiver) => {
                    if let Type::Dict(inner) = receiver.as_ref() {
                        let inner = inner.borrow();
                        Type::list_of(Type::tuple_of(vec![
                            inner.keys.clone(),
                            inner.values.clone(),
                        ]))
                    } else {
                        Type::Unknown
                    }
                }
            },
            Callable::User(definition) => {
                // A definition already on the chain is analyzing itself;
                // re-entering would never terminate.
                if self.definition_chain.contains(&definition.id) {
                    return Type::Unknown;
                }
                self.definition_chain.push(definition.id);
                let result =
                    self.with_function_scope(&definition.defining_scope, |inner| {
                        for (index, param) in definition.params.iter().enumerate() {
                            let param_ty =
                                args.get(index).map(copy_type).unwrap_or(Type::Unknown);
                            inner.store_variable(param, param_ty, position);
                        }
                        inner.visit_stmts(&definition.body);
                        inner.scope_return_type().unwrap_or(Type::None)
                    });
                self.definition_chain.pop();
                result
            }
        }
    }

    /// Attribute lookup against the built-in method table. A miss yields no
    /// type; the append-to-non-list case is reported by the caller before it
    /// gets here.
    pub(crate) fn attribute_type(&mut self, receiver: &Type, attr: &str) -> Type {
        match (receiver, attr) {
            (Type::List(_), "append") => {
                Type::Function(Callable::Method(Method::ListAppend(Box::new(receiver.clone()))))
            }
            (Type::Dict(_), "items") => {
                Type::Function(Callable::Method(Method::DictItems(Box::new(receiver.clone()))))
            }
            _ => Type::Unknown,
        }
    }
}
