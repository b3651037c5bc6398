/// Spec tests for the flow analyzer.
///
/// Programs are built as syntax trees through the helpers below (the parser
/// is an external collaborator) and fed straight to `analyze`. Tests are
/// grouped into: clean programs, one group per diagnostic, and the
/// report-level laws (idempotence, join behavior, scope/variable tables).
use std::rc::Rc;

use tattle::analyzer::analyze;
use tattle::ast::{
    Arg, Arguments, Comprehension, Expr, ExprKind, Module, NameCtx, Operator, Slice, Stmt,
    StmtKind,
};
use tattle::report::{IssueKind, Report};
use tattle::state::Flag;

// ---------------------------------------------------------------------------
// Tree-building helpers
// ---------------------------------------------------------------------------

fn module(body: Vec<Stmt>) -> Module {
    Module { body }
}

fn num(line: u32, col: u32) -> Expr {
    Expr::new(ExprKind::Num { n: 1.0 }, line, col)
}

fn str_lit(line: u32, col: u32) -> Expr {
    Expr::new(ExprKind::Str { s: String::new() }, line, col)
}

fn bool_lit(line: u32, col: u32) -> Expr {
    Expr::new(ExprKind::Bool { value: true }, line, col)
}

fn load(name: &str, line: u32, col: u32) -> Expr {
    Expr::new(
        ExprKind::Name {
            id: name.to_string(),
            ctx: NameCtx::Load,
        },
        line,
        col,
    )
}

fn store(name: &str, line: u32, col: u32) -> Expr {
    Expr::new(
        ExprKind::Name {
            id: name.to_string(),
            ctx: NameCtx::Store,
        },
        line,
        col,
    )
}

fn assign(name: &str, value: Expr, line: u32) -> Stmt {
    Stmt::new(
        StmtKind::Assign {
            targets: vec![store(name, line, 0)],
            value,
        },
        line,
        0,
    )
}

fn assign_to(target: Expr, value: Expr, line: u32) -> Stmt {
    Stmt::new(
        StmtKind::Assign {
            targets: vec![target],
            value,
        },
        line,
        0,
    )
}

fn expr_stmt(value: Expr, line: u32) -> Stmt {
    Stmt::new(StmtKind::Expr { value }, line, 0)
}

fn call(func: Expr, args: Vec<Expr>, line: u32, col: u32) -> Expr {
    Expr::new(
        ExprKind::Call {
            func: Box::new(func),
            args,
        },
        line,
        col,
    )
}

fn attr(value: Expr, name: &str, line: u32, col: u32) -> Expr {
    Expr::new(
        ExprKind::Attribute {
            value: Box::new(value),
            attr: name.to_string(),
        },
        line,
        col,
    )
}

fn index0(value: Expr, line: u32, col: u32) -> Expr {
    Expr::new(
        ExprKind::Subscript {
            value: Box::new(value),
            slice: Box::new(Slice::Index {
                value: Box::new(num(line, col)),
            }),
        },
        line,
        col,
    )
}

fn binop(left: Expr, op: Operator, right: Expr, line: u32) -> Expr {
    Expr::new(
        ExprKind::BinOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        },
        line,
        0,
    )
}

fn compare(left: Expr, right: Expr, line: u32) -> Expr {
    Expr::new(
        ExprKind::Compare {
            left: Box::new(left),
            comparators: vec![right],
        },
        line,
        0,
    )
}

fn list_lit(elts: Vec<Expr>, line: u32, col: u32) -> Expr {
    Expr::new(ExprKind::List { elts }, line, col)
}

fn tuple_lit(elts: Vec<Expr>, line: u32, col: u32) -> Expr {
    Expr::new(ExprKind::Tuple { elts }, line, col)
}

fn print_stmt(arg: Expr, line: u32) -> Stmt {
    expr_stmt(call(load("print", line, 0), vec![arg], line, 0), line)
}

fn if_stmt(test: Expr, body: Vec<Stmt>, orelse: Vec<Stmt>, line: u32) -> Stmt {
    Stmt::new(StmtKind::If { test, body, orelse }, line, 0)
}

fn while_stmt(test: Expr, body: Vec<Stmt>, line: u32) -> Stmt {
    Stmt::new(
        StmtKind::While {
            test,
            body,
            orelse: vec![],
        },
        line,
        0,
    )
}

fn for_stmt(target: Expr, iter: Expr, body: Vec<Stmt>, line: u32) -> Stmt {
    Stmt::new(
        StmtKind::For {
            target,
            iter,
            body,
            orelse: vec![],
        },
        line,
        0,
    )
}

fn def_fn(name: &str, params: &[&str], body: Vec<Stmt>, line: u32) -> Stmt {
    Stmt::new(
        StmtKind::FunctionDef {
            name: name.to_string(),
            args: Arguments {
                args: params
                    .iter()
                    .map(|p| Arg {
                        arg: p.to_string(),
                        lineno: line,
                        col_offset: 0,
                    })
                    .collect(),
            },
            body: Rc::new(body),
        },
        line,
        0,
    )
}

fn ret(value: Option<Expr>, line: u32) -> Stmt {
    Stmt::new(StmtKind::Return { value }, line, 0)
}

fn pass_stmt(line: u32) -> Stmt {
    Stmt::new(StmtKind::Pass {}, line, 0)
}

// ---------------------------------------------------------------------------
// Assertion helpers
// ---------------------------------------------------------------------------

fn raised_kinds(report: &Report) -> Vec<IssueKind> {
    report
        .issues
        .iter()
        .filter(|(_, entries)| !entries.is_empty())
        .map(|(kind, _)| *kind)
        .collect()
}

fn assert_only(report: &Report, expected: &[IssueKind]) {
    assert_eq!(
        raised_kinds(report),
        expected.to_vec(),
        "unexpected issue set: {:?}",
        report
            .issues
            .iter()
            .filter(|(_, entries)| !entries.is_empty())
            .collect::<Vec<_>>()
    );
}

fn issue_names(report: &Report, kind: IssueKind) -> Vec<String> {
    report
        .issues_of(kind)
        .iter()
        .filter_map(|entry| entry.name.clone())
        .collect()
}

// ---------------------------------------------------------------------------
// Clean programs
// ---------------------------------------------------------------------------

#[test]
fn assign_and_print_is_clean() {
    let report = analyze(&module(vec![
        assign("x", num(1, 4), 1),
        print_stmt(load("x", 2, 6), 2),
    ]));
    assert!(report.success);
    assert_only(&report, &[]);
    let x = &report.top_level_variables["x"];
    assert_eq!(x.ty.name(), "Num");
    assert_eq!(x.set, Flag::Yes);
    assert_eq!(x.read, Flag::Yes);
    assert_eq!(x.over, Flag::No);
}

#[test]
fn append_refines_an_empty_list() {
    let report = analyze(&module(vec![
        assign("xs", list_lit(vec![], 1, 5), 1),
        expr_stmt(
            call(attr(load("xs", 2, 0), "append", 2, 3), vec![num(2, 10)], 2, 0),
            2,
        ),
        print_stmt(index0(load("xs", 3, 6), 3, 9), 3),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.top_level_variables["xs"].ty.display(), "List[Num]");
}

#[test]
fn calling_a_function_infers_its_return_type() {
    let report = analyze(&module(vec![
        def_fn("f", &[], vec![ret(Some(num(2, 11)), 2)], 1),
        assign("r", call(load("f", 3, 4), vec![], 3, 4), 3),
        print_stmt(load("r", 4, 6), 4),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.top_level_variables["f"].ty.name(), "Function");
    assert_eq!(report.top_level_variables["r"].ty.name(), "Num");
}

#[test]
fn dict_items_iteration_destructures_pairs() {
    let dict = Expr::new(
        ExprKind::Dict {
            keys: vec![str_lit(1, 5)],
            values: vec![num(1, 10)],
        },
        1,
        4,
    );
    let report = analyze(&module(vec![
        assign("d", dict, 1),
        for_stmt(
            tuple_lit(vec![store("k", 2, 4), store("v", 2, 7)], 2, 4),
            call(attr(load("d", 2, 12), "items", 2, 14), vec![], 2, 12),
            vec![
                print_stmt(load("k", 3, 10), 3),
                print_stmt(load("v", 4, 10), 4),
            ],
            2,
        ),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.variables[&0]["0/k"].ty.name(), "Str");
    assert_eq!(report.variables[&0]["0/v"].ty.name(), "Num");
}

#[test]
fn list_comprehension_yields_element_list() {
    let comp = Expr::new(
        ExprKind::ListComp {
            elt: Box::new(binop(load("x", 2, 6), Operator::Mult, num(2, 10), 2)),
            generators: vec![Comprehension {
                target: store("x", 2, 16),
                iter: load("xs", 2, 21),
                ifs: vec![],
            }],
        },
        2,
        5,
    );
    let report = analyze(&module(vec![
        assign("xs", list_lit(vec![num(1, 6)], 1, 5), 1),
        assign("ys", comp, 2),
        print_stmt(load("ys", 3, 6), 3),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.top_level_variables["ys"].ty.display(), "List[Num]");
}

#[test]
fn with_statement_binds_context() {
    let report = analyze(&module(vec![
        Stmt::new(
            StmtKind::With {
                context_expr: call(load("open", 1, 5), vec![str_lit(1, 10)], 1, 5),
                optional_vars: Some(store("fh", 1, 20)),
                body: vec![print_stmt(index0(load("fh", 2, 10), 2, 13), 2)],
            },
            1,
            0,
        ),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.top_level_variables["fh"].ty.name(), "File");
}

#[test]
fn tuple_destructuring_assignment() {
    let report = analyze(&module(vec![
        assign("t", tuple_lit(vec![num(1, 5), str_lit(1, 8)], 1, 4), 1),
        assign_to(
            tuple_lit(vec![store("a", 2, 0), store("b", 2, 3)], 2, 0),
            load("t", 2, 7),
            2,
        ),
        print_stmt(load("a", 3, 6), 3),
        print_stmt(load("b", 4, 6), 4),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.top_level_variables["a"].ty.name(), "Num");
    assert_eq!(report.top_level_variables["b"].ty.name(), "Str");
}

#[test]
fn defining_in_both_branches_keeps_set_firm() {
    let report = analyze(&module(vec![
        if_stmt(
            bool_lit(1, 3),
            vec![assign("x", num(2, 8), 2)],
            vec![assign("x", num(4, 8), 4)],
            1,
        ),
        print_stmt(load("x", 5, 6), 5),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.top_level_variables["x"].set, Flag::Yes);
}

#[test]
fn recursive_function_does_not_diverge() {
    let report = analyze(&module(vec![
        def_fn(
            "f",
            &[],
            vec![ret(Some(call(load("f", 2, 11), vec![], 2, 11)), 2)],
            1,
        ),
        assign("r", call(load("f", 3, 4), vec![], 3, 4), 3),
        print_stmt(load("r", 4, 6), 4),
    ]));
    assert_only(&report, &[]);
    assert_eq!(report.top_level_variables["r"].ty.name(), "Unknown");
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

#[test]
fn reading_an_unassigned_name() {
    let report = analyze(&module(vec![print_stmt(load("y", 1, 6), 1)]));
    assert_only(&report, &[IssueKind::UndefinedVariables]);
    assert_eq!(issue_names(&report, IssueKind::UndefinedVariables), ["y"]);
}

#[test]
fn overwrite_before_read() {
    let report = analyze(&module(vec![
        assign("x", num(1, 4), 1),
        assign("x", num(2, 4), 2),
    ]));
    assert_only(
        &report,
        &[IssueKind::UnreadVariables, IssueKind::OverwrittenVariables],
    );
    assert_eq!(issue_names(&report, IssueKind::OverwrittenVariables), ["x"]);
    assert_eq!(issue_names(&report, IssueKind::UnreadVariables), ["x"]);
}

#[test]
fn conditional_definition_is_possibly_undefined() {
    let report = analyze(&module(vec![
        if_stmt(load("c", 1, 3), vec![assign("x", num(2, 8), 2)], vec![], 1),
        print_stmt(load("x", 3, 6), 3),
    ]));
    assert_only(
        &report,
        &[
            IssueKind::UndefinedVariables,
            IssueKind::PossiblyUndefinedVariables,
        ],
    );
    assert_eq!(issue_names(&report, IssueKind::UndefinedVariables), ["c"]);
    assert_eq!(
        issue_names(&report, IssueKind::PossiblyUndefinedVariables),
        ["x"]
    );
    assert_eq!(report.top_level_variables["x"].set, Flag::Maybe);
}

#[test]
fn iterating_over_the_iteration_variable() {
    let report = analyze(&module(vec![for_stmt(
        store("x", 1, 4),
        load("x", 1, 9),
        vec![pass_stmt(2)],
        1,
    )]));
    assert_only(
        &report,
        &[
            IssueKind::UndefinedVariables,
            IssueKind::IterationVariableIsIterationList,
        ],
    );
    let undefined = &report.issues_of(IssueKind::UndefinedVariables)[0];
    assert_eq!(undefined.position.unwrap().line, 1);
    assert_eq!(undefined.position.unwrap().column, 9);
    assert_eq!(
        issue_names(&report, IssueKind::IterationVariableIsIterationList),
        ["x"]
    );
}

#[test]
fn incompatible_operand_types() {
    let report = analyze(&module(vec![expr_stmt(
        binop(str_lit(1, 0), Operator::Add, num(1, 6), 1),
        1,
    )]));
    assert_only(&report, &[IssueKind::IncompatibleTypes]);
    let entry = &report.issues_of(IssueKind::IncompatibleTypes)[0];
    assert_eq!(entry.operation.as_deref(), Some("Add"));
    assert_eq!(entry.left.as_deref(), Some("Str"));
    assert_eq!(entry.right.as_deref(), Some("Num"));
}

#[test]
fn return_at_module_level() {
    let report = analyze(&module(vec![
        def_fn("f", &[], vec![ret(Some(num(2, 11)), 2)], 1),
        ret(Some(num(3, 7)), 3),
    ]));
    assert_only(&report, &[IssueKind::ReturnOutsideFunction]);
    assert_eq!(report.top_level_variables["f"].ty.name(), "Function");
}

#[test]
fn while_loop_re_reads_its_test() {
    let report = analyze(&module(vec![
        assign("x", num(1, 4), 1),
        while_stmt(
            compare(load("x", 2, 6), num(2, 10), 2),
            vec![assign(
                "x",
                binop(load("x", 3, 8), Operator::Add, num(3, 12), 3),
                3,
            )],
            2,
        ),
    ]));
    // The loop variable is only maybe-set after the join, so the re-read of
    // the test surfaces it.
    assert_only(&report, &[IssueKind::PossiblyUndefinedVariables]);
    assert_eq!(
        issue_names(&report, IssueKind::PossiblyUndefinedVariables),
        ["x"]
    );
}

#[test]
fn read_out_of_scope_after_call() {
    let report = analyze(&module(vec![
        def_fn(
            "f",
            &[],
            vec![
                assign("y", num(2, 8), 2),
                ret(Some(load("y", 3, 11)), 3),
            ],
            1,
        ),
        assign("r", call(load("f", 4, 4), vec![], 4, 4), 4),
        print_stmt(load("r", 5, 6), 5),
        print_stmt(load("y", 6, 6), 6),
    ]));
    assert_only(&report, &[IssueKind::ReadOutOfScope]);
    assert_eq!(issue_names(&report, IssueKind::ReadOutOfScope), ["y"]);
}

#[test]
fn write_out_of_scope_inside_function() {
    let report = analyze(&module(vec![
        assign("g", num(1, 4), 1),
        print_stmt(load("g", 2, 6), 2),
        def_fn("f", &[], vec![assign("g", num(4, 8), 4)], 3),
        expr_stmt(call(load("f", 5, 0), vec![], 5, 0), 5),
    ]));
    assert_only(
        &report,
        &[IssueKind::UnreadVariables, IssueKind::WriteOutOfScope],
    );
    assert_eq!(issue_names(&report, IssueKind::WriteOutOfScope), ["g"]);
}

#[test]
fn statements_after_return_are_flagged() {
    let report = analyze(&module(vec![
        def_fn(
            "f",
            &[],
            vec![ret(Some(num(2, 11)), 2), assign("x", num(3, 8), 3)],
            1,
        ),
        expr_stmt(call(load("f", 4, 0), vec![], 4, 0), 4),
    ]));
    assert_only(
        &report,
        &[IssueKind::UnreadVariables, IssueKind::ActionAfterReturn],
    );
    assert!(!report.issues_of(IssueKind::ActionAfterReturn).is_empty());
}

#[test]
fn aliasing_a_builtin() {
    let report = analyze(&module(vec![assign("print", num(1, 8), 1)]));
    assert_only(
        &report,
        &[IssueKind::UnreadVariables, IssueKind::AliasedBuiltin],
    );
    assert_eq!(issue_names(&report, IssueKind::AliasedBuiltin), ["print"]);
}

#[test]
fn pass_alongside_other_statements() {
    let report = analyze(&module(vec![
        assign("x", num(1, 4), 1),
        pass_stmt(2),
        print_stmt(load("x", 3, 6), 3),
    ]));
    assert_only(&report, &[IssueKind::UnnecessaryPass]);
    assert_eq!(
        report.issues_of(IssueKind::UnnecessaryPass)[0]
            .position
            .unwrap()
            .line,
        2
    );
}

#[test]
fn empty_module_body() {
    let report = analyze(&module(vec![]));
    assert!(report.success);
    assert_only(&report, &[IssueKind::EmptyBody]);
    assert!(report.top_level_variables.is_empty());
}

#[test]
fn calling_an_unknown_name() {
    let report = analyze(&module(vec![expr_stmt(
        call(load("foo", 1, 0), vec![], 1, 0),
        1,
    )]));
    assert_only(
        &report,
        &[IssueKind::UndefinedVariables, IssueKind::UnknownFunctions],
    );
    assert_eq!(issue_names(&report, IssueKind::UnknownFunctions), ["foo"]);
}

#[test]
fn calling_a_non_function() {
    let report = analyze(&module(vec![
        assign("x", num(1, 4), 1),
        expr_stmt(call(load("x", 2, 0), vec![], 2, 0), 2),
    ]));
    assert_only(&report, &[IssueKind::NotAFunction]);
    let entry = &report.issues_of(IssueKind::NotAFunction)[0];
    assert_eq!(entry.name.as_deref(), Some("x"));
    assert_eq!(entry.type_name.as_deref(), Some("Num"));
}

#[test]
fn empty_iteration_source() {
    let report = analyze(&module(vec![
        assign("xs", list_lit(vec![], 1, 5), 1),
        for_stmt(store("i", 2, 4), load("xs", 2, 9), vec![pass_stmt(3)], 2),
    ]));
    assert_only(&report, &[IssueKind::EmptyIterations]);
    assert_eq!(issue_names(&report, IssueKind::EmptyIterations), ["xs"]);
}

#[test]
fn non_list_iteration_source() {
    let report = analyze(&module(vec![
        assign("n", num(1, 4), 1),
        for_stmt(store("i", 2, 4), load("n", 2, 9), vec![pass_stmt(3)], 2),
    ]));
    assert_only(&report, &[IssueKind::NonListIterations]);
    let entry = &report.issues_of(IssueKind::NonListIterations)[0];
    assert_eq!(entry.name.as_deref(), Some("n"));
    assert_eq!(entry.type_name.as_deref(), Some("Num"));
}

#[test]
fn append_to_non_list() {
    let report = analyze(&module(vec![
        assign("s", str_lit(1, 4), 1),
        expr_stmt(
            call(attr(load("s", 2, 0), "append", 2, 2), vec![num(2, 9)], 2, 0),
            2,
        ),
    ]));
    assert_only(&report, &[IssueKind::AppendToNonList]);
    let entry = &report.issues_of(IssueKind::AppendToNonList)[0];
    assert_eq!(entry.name.as_deref(), Some("s"));
    assert_eq!(entry.type_name.as_deref(), Some("Str"));
}

#[test]
fn unconnected_placeholder_block() {
    let report = analyze(&module(vec![for_stmt(
        store("x", 1, 4),
        load("___", 1, 9),
        vec![pass_stmt(2)],
        1,
    )]));
    assert_only(
        &report,
        &[IssueKind::UnconnectedBlocks, IssueKind::UndefinedVariables],
    );
}

#[test]
fn type_change_on_reassignment() {
    let report = analyze(&module(vec![
        assign("x", num(1, 4), 1),
        print_stmt(load("x", 2, 6), 2),
        assign("x", str_lit(3, 4), 3),
        print_stmt(load("x", 4, 6), 4),
    ]));
    assert_only(&report, &[IssueKind::TypeChanges]);
    let entry = &report.issues_of(IssueKind::TypeChanges)[0];
    assert_eq!(entry.old.as_deref(), Some("Num"));
    assert_eq!(entry.new.as_deref(), Some("Str"));
}

#[test]
fn unread_parameter_is_flagged() {
    let report = analyze(&module(vec![
        def_fn("f", &["a"], vec![ret(Some(num(2, 11)), 2)], 1),
        expr_stmt(call(load("f", 3, 0), vec![num(3, 2)], 3, 0), 3),
    ]));
    assert_only(&report, &[IssueKind::UnreadVariables]);
    let entry = &report.issues_of(IssueKind::UnreadVariables)[0];
    assert_eq!(entry.name.as_deref(), Some("a"));
    assert_eq!(entry.scope.as_deref(), Some("1/0"));
}

// ---------------------------------------------------------------------------
// Laws and invariants
// ---------------------------------------------------------------------------

#[test]
fn analyzing_twice_yields_equal_reports() {
    let program = module(vec![
        assign("xs", list_lit(vec![], 1, 5), 1),
        expr_stmt(
            call(attr(load("xs", 2, 0), "append", 2, 3), vec![num(2, 10)], 2, 0),
            2,
        ),
        if_stmt(
            bool_lit(3, 3),
            vec![assign("x", num(4, 8), 4)],
            vec![],
            3,
        ),
        print_stmt(load("x", 5, 6), 5),
        print_stmt(index0(load("xs", 6, 6), 6, 9), 6),
    ]);
    let first = serde_json::to_value(analyze(&program)).unwrap();
    let second = serde_json::to_value(analyze(&program)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn wrapping_a_definition_in_a_branch_weakens_set_to_maybe() {
    let unconditional = analyze(&module(vec![
        assign("x", num(1, 4), 1),
        print_stmt(load("x", 2, 6), 2),
    ]));
    assert_eq!(unconditional.top_level_variables["x"].set, Flag::Yes);

    let conditional = analyze(&module(vec![
        if_stmt(bool_lit(1, 3), vec![assign("x", num(2, 8), 2)], vec![], 1),
        print_stmt(load("x", 3, 6), 3),
    ]));
    assert_eq!(conditional.top_level_variables["x"].set, Flag::Maybe);
}

#[test]
fn join_reports_type_changes_symmetrically() {
    let left_first = analyze(&module(vec![if_stmt(
        bool_lit(1, 3),
        vec![assign("x", str_lit(2, 8), 2)],
        vec![assign("x", num(4, 8), 4)],
        1,
    )]));
    let right_first = analyze(&module(vec![if_stmt(
        bool_lit(1, 3),
        vec![assign("x", num(2, 8), 2)],
        vec![assign("x", str_lit(4, 8), 4)],
        1,
    )]));

    let left_entry = &left_first.issues_of(IssueKind::TypeChanges)[0];
    let right_entry = &right_first.issues_of(IssueKind::TypeChanges)[0];
    assert_eq!(left_entry.old, right_entry.new);
    assert_eq!(left_entry.new, right_entry.old);

    let left_state = &left_first.top_level_variables["x"];
    let right_state = &right_first.top_level_variables["x"];
    assert_eq!(left_state.set, right_state.set);
    assert_eq!(left_state.read, right_state.read);
    assert_eq!(left_state.over, right_state.over);
}

#[test]
fn top_level_variables_mirror_two_segment_module_names() {
    let report = analyze(&module(vec![
        def_fn("f", &[], vec![ret(Some(num(2, 11)), 2)], 1),
        assign("r", call(load("f", 3, 4), vec![], 3, 4), 3),
        print_stmt(load("r", 4, 6), 4),
    ]));
    let module_names: Vec<&String> = report.variables[&0]
        .keys()
        .filter(|full| full.matches('/').count() == 1 && full.starts_with("0/"))
        .collect();
    for full in &module_names {
        let bare = full.rsplit('/').next().unwrap();
        assert!(
            report.top_level_variables.contains_key(bare),
            "missing top-level entry for {}",
            full
        );
    }
    // The function body's names live under its own scope, not the module's.
    assert!(report.variables[&0].contains_key("1/0/*return"));
    assert!(!report.top_level_variables.contains_key("*return"));
}
