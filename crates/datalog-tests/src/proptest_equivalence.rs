//! Property-based equivalence tests
//!
//! Random edge sets over a handful of nodes are fed to the same programs
//! under different evaluation settings; the results must be set-equal.

use crate::fixtures::*;
use datalog_ast::{Predicate, Query, Term};
use datalog_core::Program;
use datalog_eval::{Engine, EvaluationConfig, EvaluationStrategy, RuleOptimiser};
use datalog_magic::rewrite;
use proptest::prelude::*;

const NODES: i64 = 6;

fn edges_strategy() -> impl Strategy<Value = Vec<(i64, i64)>> {
    prop::collection::vec((0..NODES, 0..NODES), 0..16)
}

fn start_strategy() -> impl Strategy<Value = i64> {
    0..NODES
}

fn well_founded() -> EvaluationConfig {
    EvaluationConfig {
        evaluation_strategy: EvaluationStrategy::WellFounded,
        ..EvaluationConfig::default()
    }
}

fn reachable_from(start: i64, edges: &[(i64, i64)]) -> Vec<i64> {
    let mut seen = vec![false; NODES as usize];
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        for (from, to) in edges {
            if *from == node && !seen[*to as usize] {
                seen[*to as usize] = true;
                stack.push(*to);
            }
        }
    }
    (0..NODES).filter(|n| seen[*n as usize]).collect()
}

fn path_query(start: i64) -> Query {
    query(vec![pos("path", vec![Term::int(start), var("Y")])])
}

fn queries_for(start: i64) -> Vec<Query> {
    vec![
        path_query(start),
        // ?- unreachable(start, ?Y).
        query(vec![pos("unreachable", vec![Term::int(start), var("Y")])]),
        // ?- path(start, ?Z), path(?Z, start).
        query(vec![
            pos("path", vec![Term::int(start), var("Z")]),
            pos("path", vec![var("Z"), Term::int(start)]),
        ]),
        // ?- path(?X, start), isolated(?X).
        query(vec![
            pos("path", vec![var("X"), Term::int(start)]),
            pos("isolated", vec![var("X")]),
        ]),
    ]
}

fn evaluate(program: &Program, config: EvaluationConfig) -> datalog_eval::Model {
    Engine::new(config).evaluate(program).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_closure_matches_graph_search(
        edges in edges_strategy(),
        start in start_strategy()
    ) {
        let program = closure_program(NODES, &edges);
        let result = Engine::default().execute(&program, &path_query(start)).unwrap();

        let expected: Vec<_> = reachable_from(start, &edges)
            .into_iter()
            .map(|n| int_row(&[n]))
            .collect();
        prop_assert_eq!(rows(&result), expected);
    }

    #[test]
    fn test_naive_and_semi_naive_agree(edges in edges_strategy()) {
        let program = negation_program(NODES, &edges);
        let naive = evaluate(&program, EvaluationConfig::naive());
        let semi_naive = evaluate(&program, EvaluationConfig::default());

        prop_assert_eq!(naive.relations(), semi_naive.relations());
        prop_assert_eq!(naive.stats().facts_derived, semi_naive.stats().facts_derived);
    }

    #[test]
    fn test_magic_sets_agree(edges in edges_strategy(), start in start_strategy()) {
        init_tracing();
        let program = negation_program(NODES, &edges);
        let plain = Engine::default();
        let magic = Engine::new(EvaluationConfig::default().with_magic_sets());

        for q in queries_for(start) {
            let expected = plain.execute(&program, &q).unwrap();
            let actual = magic.execute(&program, &q).unwrap();
            prop_assert_eq!(&expected, &actual, "query {}", q);
        }
    }

    #[test]
    fn test_magic_rewrite_leaves_input_untouched(
        edges in edges_strategy(),
        start in start_strategy()
    ) {
        let program = negation_program(NODES, &edges);
        let before = program.clone();
        let rewritten = rewrite(&program, &path_query(start)).unwrap();

        prop_assert!(rewritten.is_some());
        prop_assert_eq!(program.rules(), before.rules());
        prop_assert_eq!(program.facts(), before.facts());
    }

    #[test]
    fn test_evaluation_is_idempotent(edges in edges_strategy()) {
        let program = negation_program(NODES, &edges);
        let first = evaluate(&program, EvaluationConfig::default());
        let second = evaluate(&program, EvaluationConfig::default());

        prop_assert_eq!(first.relations(), second.relations());
        prop_assert_eq!(first.stats(), second.stats());
    }

    #[test]
    fn test_evaluating_the_model_again_adds_nothing(edges in edges_strategy()) {
        let program = negation_program(NODES, &edges);
        let model = evaluate(&program, EvaluationConfig::default());

        let mut saturated = Program::new();
        for (predicate, relation) in model.relations().iter() {
            saturated.add_relation(*predicate, relation).unwrap();
        }
        let saturated = saturated.with_rules(program.rules().to_vec());
        let again = evaluate(&saturated, EvaluationConfig::default());

        prop_assert_eq!(again.relations(), model.relations());
        prop_assert_eq!(again.stats().facts_derived, 0);
    }

    #[test]
    fn test_well_founded_matches_stratified(edges in edges_strategy()) {
        let program = negation_program(NODES, &edges);
        let stratified = evaluate(&program, EvaluationConfig::default());
        let model = evaluate(&program, well_founded());

        prop_assert!(model.undefined().is_empty());
        prop_assert_eq!(model.relations(), stratified.relations());
    }

    #[test]
    fn test_rule_optimisers_agree(edges in edges_strategy()) {
        let program = negation_program(NODES, &edges);
        let plain = evaluate(&program, EvaluationConfig::default());
        let optimised = evaluate(&program, EvaluationConfig {
            rule_optimisers: vec![
                RuleOptimiser::RemoveDuplicateLiterals,
                RuleOptimiser::ReplaceVariablesWithConstants,
                RuleOptimiser::ReorderLiterals,
            ],
            ..EvaluationConfig::default()
        });

        prop_assert_eq!(plain.relations(), optimised.relations());
    }

    #[test]
    fn test_win_move_undefined_on_cycles(edges in edges_strategy()) {
        // win(X) :- edge(X, Y), not win(Y).
        let mut program = closure_program(NODES, &edges);
        program.add_rule(make_rule(
            make_atom("win", vec![var("X")]),
            vec![pos("edge", vec![var("X"), var("Y")]), neg("win", vec![var("Y")])],
        ));
        let model = evaluate(&program, well_founded());
        let win = Predicate::new("win", 1);

        // A position with no moves is never won and never undefined
        for node in 0..NODES {
            let has_move = edges.iter().any(|(from, _)| *from == node);
            if !has_move {
                let tuple = int_row(&[node]);
                prop_assert!(!model.relations().contains(&win, &tuple));
                prop_assert!(!model.undefined().contains(&win, &tuple));
            }
        }
        // True and undefined never overlap
        if let Some(undefined) = model.undefined().get(&win) {
            for tuple in undefined {
                prop_assert!(!model.relations().contains(&win, tuple));
            }
        }
    }
}
