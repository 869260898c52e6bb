//! End-to-end programs through the engine

use crate::fixtures::*;
use datalog_ast::{
    ArithmeticOp, BuiltinAtom, ComparisonOp, Literal, Predicate, Query, Term, Value,
};
use datalog_core::Program;
use datalog_eval::{
    Engine, EvaluationConfig, EvaluationError, EvaluationStrategy, EvaluationTechnique,
    QueryResult,
};
use datalog_magic::rewrite;
use datalog_safety::{SafetyError, StratificationError};

fn all_configs() -> Vec<EvaluationConfig> {
    vec![
        EvaluationConfig::default(),
        EvaluationConfig::naive(),
        EvaluationConfig::default().with_magic_sets(),
        EvaluationConfig {
            evaluation_strategy: EvaluationStrategy::WellFounded,
            ..EvaluationConfig::default()
        },
    ]
}

/// Answer `q` with and without magic sets; the rewrite must apply and both
/// answers must agree
fn magic_agrees(program: &Program, q: &Query) -> QueryResult {
    let rewritten = rewrite(program, q).unwrap();
    assert!(rewritten.is_some(), "no rewrite for {q}");

    let plain = Engine::default().execute(program, q).unwrap();
    let magic = Engine::new(EvaluationConfig::default().with_magic_sets())
        .execute(program, q)
        .unwrap();
    assert_eq!(plain, magic, "query {q}");
    magic
}

/// p(1). p(2).  q(?X) :- p(?X).
fn simple_rule_program() -> Program {
    let mut program = Program::new();
    fact(&mut program, "p", vec![Term::int(1)]);
    fact(&mut program, "p", vec![Term::int(2)]);
    program.add_rule(make_rule(
        make_atom("q", vec![var("X")]),
        vec![pos("p", vec![var("X")])],
    ));
    program
}

#[test]
fn test_simple_rule() {
    init_tracing();
    // ?- q(?x).
    let program = simple_rule_program();
    let q = query(vec![pos("q", vec![var("x")])]);

    for config in all_configs() {
        let result = Engine::new(config).execute(&program, &q).unwrap();
        assert_eq!(rows(&result), vec![int_row(&[1]), int_row(&[2])]);
    }
}

#[test]
fn test_transitive_closure_with_idb_fact() {
    init_tracing();
    // edge('a','b'). path('b','c'). edge('c','d').
    let mut program = Program::new();
    fact(&mut program, "edge", vec![Term::string("a"), Term::string("b")]);
    fact(&mut program, "path", vec![Term::string("b"), Term::string("c")]);
    fact(&mut program, "edge", vec![Term::string("c"), Term::string("d")]);
    // path(?X, ?Y) :- edge(?X, ?Y).
    program.add_rule(make_rule(
        make_atom("path", vec![var("X"), var("Y")]),
        vec![pos("edge", vec![var("X"), var("Y")])],
    ));
    // path(?X, ?Y) :- path(?X, ?Z), path(?Z, ?Y).
    program.add_rule(make_rule(
        make_atom("path", vec![var("X"), var("Y")]),
        vec![
            pos("path", vec![var("X"), var("Z")]),
            pos("path", vec![var("Z"), var("Y")]),
        ],
    ));
    let q = query(vec![pos("path", vec![var("X"), var("Y")])]);

    let expected = vec![
        string_row(&["a", "b"]),
        string_row(&["a", "c"]),
        string_row(&["a", "d"]),
        string_row(&["b", "c"]),
        string_row(&["b", "d"]),
        string_row(&["c", "d"]),
    ];
    for config in all_configs() {
        let result = Engine::new(config).execute(&program, &q).unwrap();
        assert_eq!(rows(&result), expected);
    }

    // Bound first argument goes through the magic-sets rewrite
    let from_a = query(vec![pos("path", vec![Term::string("a"), var("Y")])]);
    let result = Engine::new(EvaluationConfig::default().with_magic_sets())
        .execute(&program, &from_a)
        .unwrap();
    assert_eq!(
        rows(&result),
        vec![string_row(&["b"]), string_row(&["c"]), string_row(&["d"])]
    );
}

fn stratified_negation_program() -> Program {
    let mut program = Program::new();
    for s in ["d", "b", "a", "q"] {
        fact(&mut program, "s", vec![Term::string(s)]);
    }
    for r in ["d", "c"] {
        fact(&mut program, "r", vec![Term::string(r)]);
    }
    for p in ["b", "e"] {
        fact(&mut program, "p", vec![Term::string(p)]);
    }
    fact(&mut program, "t", vec![Term::string("a")]);
    // q(?X) :- s(?X), not p(?X).
    program.add_rule(make_rule(
        make_atom("q", vec![var("X")]),
        vec![pos("s", vec![var("X")]), neg("p", vec![var("X")])],
    ));
    // p(?X) :- r(?X).
    program.add_rule(make_rule(
        make_atom("p", vec![var("X")]),
        vec![pos("r", vec![var("X")])],
    ));
    // r(?X) :- t(?X).
    program.add_rule(make_rule(
        make_atom("r", vec![var("X")]),
        vec![pos("t", vec![var("X")])],
    ));
    program
}

#[test]
fn test_stratified_negation() {
    init_tracing();
    let program = stratified_negation_program();
    let q = query(vec![pos("q", vec![var("X")])]);

    for config in all_configs() {
        let result = Engine::new(config).execute(&program, &q).unwrap();
        assert_eq!(rows(&result), vec![string_row(&["q"])]);
    }

    let model = Engine::default().evaluate(&program).unwrap();
    assert_eq!(model.stats().strata, 2);
    assert!(model.undefined().is_empty());
}

#[test]
fn test_unsafe_rule_is_rejected_by_every_strategy() {
    init_tracing();
    let mut program = Program::new();
    fact(&mut program, "p", vec![Term::int(1)]);
    // pp(?X, ?Y) :- p(?X).
    program.add_rule(make_rule(
        make_atom("pp", vec![var("X"), var("Y")]),
        vec![pos("p", vec![var("X")])],
    ));
    let q = query(vec![pos("pp", vec![var("X"), var("Y")])]);

    for config in all_configs() {
        let err = Engine::new(config).execute(&program, &q).unwrap_err();
        match err {
            EvaluationError::UnsafeRule(SafetyError::UnsafeRule { rule, .. }) => {
                assert!(rule.starts_with("pp("));
            }
            other => panic!("expected an unsafe rule error, got {other:?}"),
        }
    }
}

#[test]
fn test_non_stratifiable_program_is_rejected() {
    init_tracing();
    let mut program = Program::new();
    fact(&mut program, "r", vec![Term::int(1)]);
    // p(?X) :- r(?X), not q(?X).
    program.add_rule(make_rule(
        make_atom("p", vec![var("X")]),
        vec![pos("r", vec![var("X")]), neg("q", vec![var("X")])],
    ));
    // q(?X) :- r(?X), not p(?X).
    program.add_rule(make_rule(
        make_atom("q", vec![var("X")]),
        vec![pos("r", vec![var("X")]), neg("p", vec![var("X")])],
    ));

    for technique in [EvaluationTechnique::Naive, EvaluationTechnique::SemiNaive] {
        let config = EvaluationConfig {
            evaluation_technique: technique,
            ..EvaluationConfig::default()
        };
        let err = Engine::new(config).evaluate(&program).unwrap_err();
        assert_eq!(
            err,
            EvaluationError::NotStratified(StratificationError::CycleThroughNegation(vec![
                Predicate::new("p", 1),
                Predicate::new("q", 1),
            ]))
        );
    }

    // The well-founded strategy accepts it; both atoms are undefined
    let model = Engine::new(EvaluationConfig {
        evaluation_strategy: EvaluationStrategy::WellFounded,
        ..EvaluationConfig::default()
    })
    .evaluate(&program)
    .unwrap();
    assert!(model.relation(&Predicate::new("p", 1)).is_none());
    assert_eq!(
        model.undefined().get(&Predicate::new("p", 1)).map(|r| r.len()),
        Some(1)
    );
    assert_eq!(
        model.undefined().get(&Predicate::new("q", 1)).map(|r| r.len()),
        Some(1)
    );
}

/// s(1). s(2). p(3). p(4).  w(?X, ?Y) :- s(?X), p(?Y).
fn cartesian_program() -> Program {
    let mut program = Program::new();
    fact(&mut program, "s", vec![Term::int(1)]);
    fact(&mut program, "s", vec![Term::int(2)]);
    fact(&mut program, "p", vec![Term::int(3)]);
    fact(&mut program, "p", vec![Term::int(4)]);
    program.add_rule(make_rule(
        make_atom("w", vec![var("X"), var("Y")]),
        vec![pos("s", vec![var("X")]), pos("p", vec![var("Y")])],
    ));
    program
}

#[test]
fn test_cartesian_product_follows_query_order() {
    init_tracing();
    let program = cartesian_program();
    // ?- w(?Y, ?X).
    let q = query(vec![pos("w", vec![var("Y"), var("X")])]);

    for config in all_configs() {
        let result = Engine::new(config).execute(&program, &q).unwrap();
        assert_eq!(result.variables.len(), 2);
        assert_eq!(
            rows(&result),
            vec![
                int_row(&[1, 3]),
                int_row(&[1, 4]),
                int_row(&[2, 3]),
                int_row(&[2, 4]),
            ]
        );
    }
}

/// Prices with a doubling rule and a threshold on the doubled price
fn price_program() -> Program {
    let mut program = Program::new();
    fact(&mut program, "price", vec![Term::string("tea"), Term::int(3)]);
    fact(&mut program, "price", vec![Term::string("cake"), Term::constant(4.5)]);
    fact(&mut program, "price", vec![Term::string("pie"), Term::int(7)]);
    // doubled(?I, ?T) :- price(?I, ?P), MULTIPLY(?P, 2, ?T).
    program.add_rule(make_rule(
        make_atom("doubled", vec![var("I"), var("T")]),
        vec![
            pos("price", vec![var("I"), var("P")]),
            Literal::BuiltIn(BuiltinAtom::arithmetic(
                ArithmeticOp::Multiply,
                var("P"),
                Term::int(2),
                var("T"),
            )),
        ],
    ));
    // cheap(?I) :- doubled(?I, ?T), ?T < 10.
    program.add_rule(make_rule(
        make_atom("cheap", vec![var("I")]),
        vec![
            pos("doubled", vec![var("I"), var("T")]),
            Literal::BuiltIn(BuiltinAtom::compare(
                ComparisonOp::LessThan,
                var("T"),
                Term::int(10),
            )),
        ],
    ));
    program
}

#[test]
fn test_arithmetic_and_mixed_numeric_comparison() {
    init_tracing();
    let program = price_program();
    let engine = Engine::default();
    let doubled = engine
        .execute(&program, &query(vec![pos("doubled", vec![Term::string("cake"), var("T")])]))
        .unwrap();
    assert_eq!(rows(&doubled), vec![row(vec![Term::constant(Value::Double(9.0))])]);

    let cheap = engine
        .execute(&program, &query(vec![pos("cheap", vec![var("I")])]))
        .unwrap();
    assert_eq!(rows(&cheap), vec![string_row(&["cake"]), string_row(&["tea"])]);
}

#[test]
fn test_program_queries_and_idempotence() {
    init_tracing();
    let mut program = stratified_negation_program();
    program.add_query(query(vec![pos("q", vec![var("X")])]));
    program.add_query(query(vec![pos("p", vec![var("X")])]));

    let engine = Engine::new(EvaluationConfig {
        parallel_queries: true,
        ..EvaluationConfig::default()
    });
    let first = engine.execute_program(&program).unwrap();
    let second = engine.execute_program(&program).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        rows(&first[1]),
        vec![
            string_row(&["a"]),
            string_row(&["b"]),
            string_row(&["c"]),
            string_row(&["d"]),
            string_row(&["e"]),
        ]
    );

    let model_a = engine.evaluate(&program).unwrap();
    let model_b = engine.evaluate(&program).unwrap();
    assert_eq!(model_a.relations(), model_b.relations());
}

#[test]
fn test_self_join_query_with_magic_sets() {
    init_tracing();
    let program = closure_program(5, &[(0, 1), (1, 2), (2, 0), (2, 3), (3, 4)]);
    // ?- path(0, ?Z), path(?Z, 0).
    let q = query(vec![
        pos("path", vec![Term::int(0), var("Z")]),
        pos("path", vec![var("Z"), Term::int(0)]),
    ]);

    let plain = Engine::default().execute(&program, &q).unwrap();
    let magic = Engine::new(EvaluationConfig::default().with_magic_sets())
        .execute(&program, &q)
        .unwrap();
    assert_eq!(plain, magic);
    assert_eq!(rows(&magic), vec![int_row(&[0]), int_row(&[1]), int_row(&[2])]);
}

#[test]
fn test_bound_queries_through_magic_sets() {
    init_tracing();
    let simple = simple_rule_program();
    assert!(magic_agrees(&simple, &query(vec![pos("q", vec![Term::int(2)])])).is_true());
    assert!(!magic_agrees(&simple, &query(vec![pos("q", vec![Term::int(3)])])).is_true());

    let negation = stratified_negation_program();
    assert!(magic_agrees(&negation, &query(vec![pos("q", vec![Term::string("q")])])).is_true());
    // a reaches p through t and r
    assert!(!magic_agrees(&negation, &query(vec![pos("q", vec![Term::string("a")])])).is_true());

    // ?- w(?Y, 4).
    let cartesian = cartesian_program();
    let result = magic_agrees(&cartesian, &query(vec![pos("w", vec![var("Y"), Term::int(4)])]));
    assert_eq!(rows(&result), vec![int_row(&[1]), int_row(&[2])]);
}

#[test]
fn test_arithmetic_through_magic_sets() {
    init_tracing();
    let program = price_program();

    let doubled = magic_agrees(
        &program,
        &query(vec![pos("doubled", vec![Term::string("cake"), var("T")])]),
    );
    assert_eq!(rows(&doubled), vec![row(vec![Term::constant(Value::Double(9.0))])]);

    assert!(magic_agrees(&program, &query(vec![pos("cheap", vec![Term::string("tea")])])).is_true());
    assert!(!magic_agrees(&program, &query(vec![pos("cheap", vec![Term::string("pie")])])).is_true());
}

/// Facts `a(1)`, `a(2)`, `c(1.0)`, `d(3.0)`, with `b` and `e` derived from
/// `c` and `d` so that magic sets adorn them, and rules that compare across
/// numeric types through `=` and `ADD`
fn mixed_numeric_program() -> Program {
    let mut program = Program::new();
    fact(&mut program, "a", vec![Term::int(1)]);
    fact(&mut program, "a", vec![Term::int(2)]);
    fact(&mut program, "c", vec![Term::constant(1.0)]);
    fact(&mut program, "d", vec![Term::constant(3.0)]);
    // b(?Y) :- c(?Y).  e(?Y) :- d(?Y).
    program.add_rule(make_rule(
        make_atom("b", vec![var("Y")]),
        vec![pos("c", vec![var("Y")])],
    ));
    program.add_rule(make_rule(
        make_atom("e", vec![var("Y")]),
        vec![pos("d", vec![var("Y")])],
    ));
    let equal = || Literal::BuiltIn(BuiltinAtom::equal(var("X"), var("Y")));
    // k(?X, ?Y) :- a(?X), b(?Y), ?X = ?Y.
    program.add_rule(make_rule(
        make_atom("k", vec![var("X"), var("Y")]),
        vec![pos("a", vec![var("X")]), pos("b", vec![var("Y")]), equal()],
    ));
    // k2(?X, ?Y) :- a(?X), ?X = ?Y, b(?Y).
    program.add_rule(make_rule(
        make_atom("k2", vec![var("X"), var("Y")]),
        vec![pos("a", vec![var("X")]), equal(), pos("b", vec![var("Y")])],
    ));
    // next(?X, ?Z) :- a(?X), ADD(?X, 1, ?Z), e(?Z).
    program.add_rule(make_rule(
        make_atom("next", vec![var("X"), var("Z")]),
        vec![
            pos("a", vec![var("X")]),
            Literal::BuiltIn(BuiltinAtom::arithmetic(
                ArithmeticOp::Add,
                var("X"),
                Term::int(1),
                var("Z"),
            )),
            pos("e", vec![var("Z")]),
        ],
    ));
    program
}

#[test]
fn test_equality_across_numeric_types_in_rule_bodies() {
    init_tracing();
    let program = mixed_numeric_program();
    let one_and_double = vec![row(vec![Term::int(1), Term::constant(1.0)])];
    let two_and_three = vec![row(vec![Term::int(2), Term::constant(3.0)])];

    for config in all_configs() {
        let engine = Engine::new(config);
        for head in ["k", "k2"] {
            let result = engine
                .execute(&program, &query(vec![pos(head, vec![var("X"), var("Y")])]))
                .unwrap();
            assert_eq!(rows(&result), one_and_double, "{head}");
        }
        let next = engine
            .execute(&program, &query(vec![pos("next", vec![var("X"), var("Z")])]))
            .unwrap();
        assert_eq!(rows(&next), two_and_three);
    }

    for head in ["k", "k2"] {
        let result = magic_agrees(&program, &query(vec![pos(head, vec![Term::int(1), var("Y")])]));
        assert_eq!(rows(&result), vec![row(vec![Term::constant(1.0)])], "{head}");
    }
    let next = magic_agrees(&program, &query(vec![pos("next", vec![Term::int(2), var("Z")])]));
    assert_eq!(rows(&next), vec![row(vec![Term::constant(3.0)])]);
}
