//! Builders shared by the test modules

use datalog_ast::{Atom, Literal, Query, Rule, Term, Tuple};
use datalog_core::Program;
use datalog_eval::QueryResult;

/// Install a test subscriber once; `RUST_LOG=debug` shows evaluation phases
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn var(name: &str) -> Term {
    Term::var(name)
}

pub fn make_atom(pred: &str, args: Vec<Term>) -> Atom {
    Atom::new(pred, args)
}

pub fn pos(pred: &str, args: Vec<Term>) -> Literal {
    Literal::Positive(make_atom(pred, args))
}

pub fn neg(pred: &str, args: Vec<Term>) -> Literal {
    Literal::Negative(make_atom(pred, args))
}

pub fn make_rule(head: Atom, body: Vec<Literal>) -> Rule {
    Rule::new(head, body)
}

pub fn query(body: Vec<Literal>) -> Query {
    Query::new(body)
}

pub fn fact(program: &mut Program, pred: &str, args: Vec<Term>) {
    program
        .add_fact(make_atom(pred, args))
        .expect("test facts are ground");
}

pub fn row(terms: Vec<Term>) -> Tuple {
    Tuple::new(terms)
}

pub fn int_row(values: &[i64]) -> Tuple {
    Tuple::new(values.iter().map(|v| Term::int(*v)).collect())
}

pub fn string_row(values: &[&str]) -> Tuple {
    Tuple::new(values.iter().map(|v| Term::string(v)).collect())
}

/// Sorted rows of a result
pub fn rows(result: &QueryResult) -> Vec<Tuple> {
    result.sorted()
}

/// Edge facts plus left-recursive transitive closure:
///
/// ```text
/// path(X, Y) :- edge(X, Y).
/// path(X, Y) :- path(X, Z), edge(Z, Y).
/// ```
pub fn closure_program(nodes: i64, edges: &[(i64, i64)]) -> Program {
    let mut program = Program::new();
    for n in 0..nodes {
        fact(&mut program, "node", vec![Term::int(n)]);
    }
    for (from, to) in edges {
        fact(&mut program, "edge", vec![Term::int(*from), Term::int(*to)]);
    }
    program.add_rule(make_rule(
        make_atom("path", vec![var("X"), var("Y")]),
        vec![pos("edge", vec![var("X"), var("Y")])],
    ));
    program.add_rule(make_rule(
        make_atom("path", vec![var("X"), var("Y")]),
        vec![
            pos("path", vec![var("X"), var("Z")]),
            pos("edge", vec![var("Z"), var("Y")]),
        ],
    ));
    program
}

/// [`closure_program`] plus a negated layer on top:
///
/// ```text
/// unreachable(X, Y) :- node(X), node(Y), not path(X, Y).
/// isolated(X)       :- node(X), not path(X, X), X != 0.
/// ```
pub fn negation_program(nodes: i64, edges: &[(i64, i64)]) -> Program {
    let mut program = closure_program(nodes, edges);
    program.add_rule(make_rule(
        make_atom("unreachable", vec![var("X"), var("Y")]),
        vec![
            pos("node", vec![var("X")]),
            pos("node", vec![var("Y")]),
            neg("path", vec![var("X"), var("Y")]),
        ],
    ));
    program.add_rule(make_rule(
        make_atom("isolated", vec![var("X")]),
        vec![
            pos("node", vec![var("X")]),
            neg("path", vec![var("X"), var("X")]),
            Literal::BuiltIn(datalog_ast::BuiltinAtom::compare(
                datalog_ast::ComparisonOp::NotEqual,
                var("X"),
                Term::int(0),
            )),
        ],
    ));
    program
}
