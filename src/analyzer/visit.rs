/// One visit rule per AST shape. Statements update the name tables through
/// the store/load primitives; expressions evaluate to an inferred type.
use std::rc::Rc;

use crate::ast::{
    Comprehension, Expr, ExprKind, NameCtx, Position, Slice, Stmt, StmtKind, UnaryOperator,
};
use crate::report::{IssueData, IssueKind};
use crate::state::Flag;
use crate::types::{
    apply_binary_op, index_sequence_type, is_empty_list, is_sequence, Callable, Type, UserFunction,
};

use super::Analyzer;

/// How a destructuring walk binds the names it reaches.
#[derive(Clone, Copy, PartialEq, Eq)]
enum BindMode {
    Assign,
    Iter,
}

impl Analyzer {
    pub(crate) fn visit_stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            if stmts.len() > 1 && matches!(stmt.kind, StmtKind::Pass {}) {
                self.issue(IssueKind::UnnecessaryPass, IssueData::at(stmt.position()));
            }
            self.visit_stmt(stmt);
        }
    }

    pub(crate) fn visit_stmt(&mut self, stmt: &Stmt) {
        self.bump_node();
        self.check_after_return(stmt.position());
        match &stmt.kind {
            StmtKind::Assign { targets, value } => {
                let value_ty = self.visit_expr(value);
                for target in targets {
                    self.walk_target(target, &value_ty, BindMode::Assign);
                }
            }
            StmtKind::If { test, body, orelse } => {
                self.visit_expr(test);
                let (body_path, _) = self.with_path(|a| a.visit_stmts(body));
                let (else_path, _) = self.with_path(|a| a.visit_stmts(orelse));
                self.merge_paths(body_path, else_path, stmt.position());
            }
            StmtKind::While { test, body, orelse } => {
                self.visit_expr(test);
                let (body_path, _) = self.with_path(|a| a.visit_stmts(body));
                let (else_path, _) = self.with_path(|a| a.visit_stmts(orelse));
                self.merge_paths(body_path, else_path, stmt.position());
                // One more look at the test models the next iteration's reads.
                self.visit_expr(test);
            }
            StmtKind::For {
                target,
                iter,
                body,
                orelse,
            } => {
                let (iter_ty, iter_name) = self.iteration_source(iter);
                let element_ty = index_sequence_type(&iter_ty, 0);
                let target_name = self.walk_target(target, &element_ty, BindMode::Iter);
                if let (Some(target_name), Some(iter_name)) = (&target_name, &iter_name) {
                    if target_name == iter_name {
                        self.issue(
                            IssueKind::IterationVariableIsIterationList,
                            IssueData::at(stmt.position()).named(target_name),
                        );
                    }
                }
                self.visit_stmts(body);
                self.visit_stmts(orelse);
            }
            StmtKind::FunctionDef { name, args, body } => {
                let definition = Rc::new(UserFunction {
                    id: self.bump_node(),
                    name: name.clone(),
                    params: args.args.iter().map(|a| a.arg.clone()).collect(),
                    body: Rc::clone(body),
                    defining_scope: self.defining_scope(),
                });
                let ty = Type::Function(Callable::User(definition));
                self.store_variable(name, ty, stmt.position());
            }
            StmtKind::Return { value } => {
                if self.scope_depth() == 1 {
                    self.issue(
                        IssueKind::ReturnOutsideFunction,
                        IssueData::at(stmt.position()),
                    );
                }
                let ty = match value {
                    Some(value) => self.visit_expr(value),
                    None => Type::None,
                };
                self.store_variable(super::RETURN_NAME, ty, stmt.position());
            }
            StmtKind::With {
                context_expr,
                optional_vars,
                body,
            } => {
                let context_ty = self.visit_expr(context_expr);
                if let Some(vars) = optional_vars {
                    self.walk_target(vars, &context_ty, BindMode::Assign);
                }
                self.visit_stmts(body);
            }
            StmtKind::Expr { value } => {
                self.visit_expr(value);
            }
            StmtKind::Pass {} => {}
        }
    }

    pub(crate) fn visit_expr(&mut self, expr: &Expr) -> Type {
        self.bump_node();
        self.check_after_return(expr.position());
        match &expr.kind {
            ExprKind::Num { .. } => Type::Num,
            ExprKind::Str { .. } => Type::Str,
            ExprKind::Bool { .. } => Type::Bool,
            ExprKind::Name { id, ctx } => self.visit_name(id, *ctx, expr.position()),
            ExprKind::BinOp { left, op, right } => {
                let left_ty = self.visit_expr(left);
                let right_ty = self.visit_expr(right);
                match apply_binary_op(*op, &left_ty, &right_ty) {
                    Some(result) => result,
                    None => {
                        self.issue(
                            IssueKind::IncompatibleTypes,
                            IssueData::at(expr.position())
                                .operation(op.as_str())
                                .operands(left_ty.display(), right_ty.display()),
                        );
                        Type::Unknown
                    }
                }
            }
            ExprKind::BoolOp { values } => {
                for value in values {
                    self.visit_expr(value);
                }
                Type::Bool
            }
            ExprKind::UnaryOp { op, operand } => {
                let operand_ty = self.visit_expr(operand);
                match op {
                    UnaryOperator::Not => Type::Bool,
                    _ => operand_ty,
                }
            }
            ExprKind::Compare { left, comparators } => {
                self.visit_expr(left);
                for comparator in comparators {
                    self.visit_expr(comparator);
                }
                Type::Bool
            }
            ExprKind::Call { func, args } => self.visit_call(func, args, expr.position()),
            ExprKind::Attribute { value, attr } => {
                self.visit_attribute(value, attr, expr.position())
            }
            ExprKind::Subscript { value, slice } => {
                let value_ty = self.visit_expr(value);
                match slice.as_ref() {
                    Slice::Index { value: index } => {
                        self.visit_expr(index);
                        index_sequence_type(&value_ty, 0)
                    }
                    Slice::Slice { lower, upper, step } => {
                        for bound in [lower, upper, step].into_iter().flatten() {
                            self.visit_expr(bound);
                        }
                        value_ty
                    }
                }
            }
            ExprKind::List { elts } => {
                if elts.is_empty() {
                    Type::empty_list()
                } else {
                    let mut last = Type::Unknown;
                    for elt in elts {
                        last = self.visit_expr(elt);
                    }
                    Type::list_of(last)
                }
            }
            ExprKind::Tuple { elts } => {
                if elts.is_empty() {
                    Type::empty_tuple()
                } else {
                    let subtypes = elts.iter().map(|e| self.visit_expr(e)).collect();
                    Type::tuple_of(subtypes)
                }
            }
            ExprKind::Dict { keys, values } => {
                if keys.is_empty() {
                    Type::empty_dict()
                } else {
                    let mut key_ty = Type::Unknown;
                    let mut value_ty = Type::Unknown;
                    for key in keys {
                        key_ty = self.visit_expr(key);
                    }
                    for value in values {
                        value_ty = self.visit_expr(value);
                    }
                    Type::dict_of(key_ty, value_ty)
                }
            }
            ExprKind::ListComp { elt, generators } => {
                for generator in generators {
                    self.comprehension_source(generator);
                }
                let element_ty = self.visit_expr(elt);
                Type::list_of(element_ty)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Names
    // -----------------------------------------------------------------------

    fn visit_name(&mut self, id: &str, ctx: NameCtx, position: Position) -> Type {
        if id == "___" {
            self.issue(IssueKind::UnconnectedBlocks, IssueData::at(position));
        }
        if ctx == NameCtx::Load {
            match id {
                "True" | "False" => Type::Bool,
                "None" => Type::None,
                _ => {
                    let found = self.find_in_scope(id);
                    if found.state.is_none() {
                        if let Some(builtin) = self.builtin_type(id) {
                            return builtin;
                        }
                    }
                    self.load_variable(id, position).ty
                }
            }
        } else {
            self.find_in_scope(id)
                .state
                .map(|state| state.ty)
                .unwrap_or(Type::Unknown)
        }
    }

    // -----------------------------------------------------------------------
    // Destructuring targets
    // -----------------------------------------------------------------------

    /// Walk an assignment or loop target, binding each reached name to the
    /// matching slice of `ty`. Returns the first bound name.
    fn walk_target(&mut self, target: &Expr, ty: &Type, mode: BindMode) -> Option<String> {
        match &target.kind {
            ExprKind::Name { id, .. } => {
                if id == "___" {
                    self.issue(IssueKind::UnconnectedBlocks, IssueData::at(target.position()));
                    return None;
                }
                match mode {
                    BindMode::Assign => {
                        self.store_variable(id, ty.clone(), target.position());
                    }
                    BindMode::Iter => {
                        self.store_iter_variable(id, ty.clone(), target.position());
                    }
                }
                Some(id.clone())
            }
            ExprKind::Tuple { elts } | ExprKind::List { elts } => {
                let mut first = None;
                for (index, elt) in elts.iter().enumerate() {
                    let element_ty = index_sequence_type(ty, index);
                    let bound = self.walk_target(elt, &element_ty, mode);
                    if first.is_none() {
                        first = bound;
                    }
                }
                first
            }
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Iteration sources (for loops and comprehensions)
    // -----------------------------------------------------------------------

    /// Resolve the source of an iteration. A bare name is loaded, so
    /// iterating over a list counts as reading it. Checks that fire on a
    /// known type are skipped for `Unknown`: inference already failed there
    /// and was reported at the load.
    fn iteration_source(&mut self, iter: &Expr) -> (Type, Option<String>) {
        let mut iter_name = None;
        let iter_ty = if let ExprKind::Name { id, .. } = &iter.kind {
            iter_name = Some(id.clone());
            if id == "___" {
                self.issue(IssueKind::UnconnectedBlocks, IssueData::at(iter.position()));
            }
            self.load_variable(id, iter.position()).ty
        } else {
            self.visit_expr(iter)
        };

        if is_empty_list(&iter_ty) {
            let mut data = IssueData::at(iter.position());
            if let Some(name) = &iter_name {
                data = data.named(name);
            }
            self.issue(IssueKind::EmptyIterations, data);
        } else if !matches!(iter_ty, Type::Unknown) && !is_sequence(&iter_ty) {
            let mut data = IssueData::at(iter.position()).of_type(iter_ty.display());
            if let Some(name) = &iter_name {
                data = data.named(name);
            }
            self.issue(IssueKind::NonListIterations, data);
        }
        (iter_ty, iter_name)
    }

    fn comprehension_source(&mut self, generator: &Comprehension) {
        let (iter_ty, iter_name) = self.iteration_source(&generator.iter);
        let element_ty = index_sequence_type(&iter_ty, 0);
        let target_name = self.walk_target(&generator.target, &element_ty, BindMode::Iter);
        if let (Some(target_name), Some(iter_name)) = (&target_name, &iter_name) {
            if target_name == iter_name {
                self.issue(
                    IssueKind::IterationVariableIsIterationList,
                    IssueData::at(generator.iter.position()).named(target_name),
                );
            }
        }
        for condition in &generator.ifs {
            self.visit_expr(condition);
        }
    }

    // -----------------------------------------------------------------------
    // Calls and attributes
    // -----------------------------------------------------------------------

    fn visit_call(&mut self, func: &Expr, args: &[Expr], position: Position) -> Type {
        let func_ty = self.visit_expr(func);
        let callee = Self::root_name(func).map(str::to_string);
        let arg_types: Vec<Type> = args.iter().map(|arg| self.visit_expr(arg)).collect();
        match func_ty {
            Type::Function(callable) => {
                self.call_function(&callable, &arg_types, callee.as_deref(), position)
            }
            Type::Unknown => {
                // Only a direct call of an unresolved bare name is an unknown
                // function; an Unknown from a failed sub-expression was
                // already reported where it failed.
                if matches!(func.kind, ExprKind::Name { .. }) {
                    let mut data = IssueData::at(position);
                    if let Some(name) = &callee {
                        data = data.named(name);
                    }
                    self.issue(IssueKind::UnknownFunctions, data);
                }
                Type::Unknown
            }
            other => {
                let mut data = IssueData::at(position).of_type(other.display());
                if let Some(name) = &callee {
                    data = data.named(name);
                }
                self.issue(IssueKind::NotAFunction, data);
                Type::Unknown
            }
        }
    }

    fn visit_attribute(&mut self, value: &Expr, attr: &str, position: Position) -> Type {
        let value_ty = self.visit_expr(value);
        if attr == "append" && !matches!(value_ty, Type::List(_)) {
            let mut data = IssueData::at(position).of_type(value_ty.display());
            if let Some(name) = Self::root_name(value) {
                data = data.named(name);
            }
            self.issue(IssueKind::AppendToNonList, data);
            return Type::Unknown;
        }
        self.attribute_type(&value_ty, attr)
    }

    /// Root identifier under a callee expression: `xs.append` -> `xs`,
    /// `grid[0].append` -> `grid`.
    fn root_name(expr: &Expr) -> Option<&str> {
        match &expr.kind {
            ExprKind::Name { id, .. } => Some(id),
            ExprKind::Call { func, .. } => Self::root_name(func),
            ExprKind::Attribute { value, .. } => Self::root_name(value),
            ExprKind::Subscript { value, .. } => Self::root_name(value),
            _ => None,
        }
    }

    // -----------------------------------------------------------------------
    // Post-return detection
    // -----------------------------------------------------------------------

    fn check_after_return(&mut self, position: Position) {
        if self.scope_depth() > 1 {
            let found = self.find_in_scope(super::RETURN_NAME);
            if let Some(state) = found.state {
                if found.in_scope && state.set == Flag::Yes {
                    self.issue(
                        IssueKind::ActionAfterReturn,
                        IssueData::at(position).in_scope(self.scope_str()),
                    );
                }
            }
        }
    }
}
