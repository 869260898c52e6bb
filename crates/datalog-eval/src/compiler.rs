//! Rule compilation
//!
//! A rule body is compiled into a sequence of steps over a *binding
//! relation*: one column per variable bound so far, starting from the unit
//! relation. Positive literals join, negative literals subtract, and
//! built-ins filter or extend each binding.
//!
//! Steps are scheduled greedily: built-ins and negations run as soon as
//! their inputs are bound, positive literals run in body order. A built-in
//! never binds a variable that a pending positive literal mentions; it runs
//! after that literal as a semantic filter instead. Negations whose
//! variables are never all bound run last and are read existentially.

use crate::config::{DivideByZeroBehaviour, EvaluationConfig};
use crate::error::EvaluationError;
use datalog_algebra::{difference, join, project, select, JoinKind, PatternEntry, Selection};
use datalog_ast::{Atom, Bindings, BuiltinAtom, Literal, Predicate, Rule, Symbol, Term, Tuple};
use datalog_builtins::{can_evaluate, evaluate, BuiltinOutcome};
use datalog_core::{Relation, RelationStore};
use std::borrow::Cow;

/// Relations a compiled rule reads from
#[derive(Clone, Copy)]
pub struct RuleInputs<'a> {
    /// Read by positive literals
    pub positive: &'a RelationStore,
    /// Read by negated literals
    pub negative: &'a RelationStore,
    /// Replaces the relation of one positive step
    pub delta: Option<(usize, &'a Relation)>,
}

impl<'a> RuleInputs<'a> {
    /// Positive and negative literals read the same store
    pub fn new(store: &'a RelationStore) -> Self {
        RuleInputs {
            positive: store,
            negative: store,
            delta: None,
        }
    }

    pub fn with_delta(self, step: usize, delta: &'a Relation) -> Self {
        RuleInputs {
            delta: Some((step, delta)),
            ..self
        }
    }
}

/// A rule ready for repeated evaluation
#[derive(Debug, Clone)]
pub struct CompiledRule {
    rule: Rule,
    steps: Vec<Step>,
    head: Vec<HeadTerm>,
    variables: Vec<Symbol>,
}

#[derive(Debug, Clone)]
enum Step {
    Positive(PositiveStep),
    Negative(NegativeStep),
    Builtin(BuiltinStep),
}

#[derive(Debug, Clone)]
struct PositiveStep {
    view: AtomView,
    /// Binding column to view column
    mapping: Vec<Option<usize>>,
    /// Columns kept after the join: all binding columns, then new variables
    output: Vec<usize>,
}

#[derive(Debug, Clone)]
struct NegativeStep {
    view: AtomView,
    /// View columns whose variables are bound
    bound_columns: Vec<usize>,
    mapping: Vec<Option<usize>>,
}

#[derive(Debug, Clone)]
struct BuiltinStep {
    builtin: BuiltinAtom,
    /// Argument positions of the variables this step binds, one per variable
    new_positions: Vec<usize>,
}

#[derive(Debug, Clone)]
enum HeadTerm {
    Column(usize),
    Constant(Term),
    Nested(Term),
}

/// Extracts the bindings of an atom's variables from a relation
#[derive(Debug, Clone)]
struct AtomView {
    predicate: Predicate,
    /// Distinct variables in first-occurrence order
    variables: Vec<Symbol>,
    kind: ViewKind,
}

#[derive(Debug, Clone)]
enum ViewKind {
    /// Every argument is a variable or a ground term
    Flat {
        selection: Option<Selection>,
        columns: Vec<usize>,
    },
    /// Some argument nests a variable inside a compound term
    Nested(Vec<Term>),
}

impl AtomView {
    fn new(atom: &Atom) -> Self {
        let variables = atom.variables();
        let flat = atom
            .terms
            .iter()
            .all(|term| term.is_variable() || term.is_ground());
        if !flat {
            return AtomView {
                predicate: atom.predicate,
                variables,
                kind: ViewKind::Nested(atom.terms.clone()),
            };
        }

        let mut first_column: Vec<(Symbol, usize)> = Vec::new();
        let mut pattern = Vec::with_capacity(atom.terms.len());
        for (column, term) in atom.terms.iter().enumerate() {
            let entry = match term {
                Term::Variable(name) => match first_column.iter().find(|(v, _)| v == name) {
                    Some((_, first)) => PatternEntry::SameAs(*first),
                    None => {
                        first_column.push((*name, column));
                        PatternEntry::Any
                    }
                },
                ground => PatternEntry::Equals(ground.clone()),
            };
            pattern.push(entry);
        }
        let selection = pattern
            .iter()
            .any(|entry| !matches!(entry, PatternEntry::Any))
            .then_some(Selection::Pattern(pattern));
        AtomView {
            predicate: atom.predicate,
            variables,
            kind: ViewKind::Flat {
                selection,
                columns: first_column.into_iter().map(|(_, column)| column).collect(),
            },
        }
    }

    /// The view's bindings; a plain full-width read borrows the relation
    fn read<'r>(
        &self,
        relation: Option<&'r Relation>,
    ) -> Result<Cow<'r, Relation>, EvaluationError> {
        let Some(relation) = relation else {
            return Ok(Cow::Owned(Relation::new(self.variables.len())));
        };
        match &self.kind {
            ViewKind::Flat { selection, columns } => {
                let selected = match selection {
                    Some(selection) => Cow::Owned(select(relation, selection)?),
                    None => Cow::Borrowed(relation),
                };
                let identity = columns.len() == selected.arity()
                    && columns.iter().enumerate().all(|(i, c)| i == *c);
                if identity {
                    Ok(selected)
                } else {
                    Ok(Cow::Owned(project(&selected, columns)?))
                }
            }
            ViewKind::Nested(terms) => {
                let mut result = Relation::new(self.variables.len());
                for tuple in relation {
                    let mut bindings = Bindings::new();
                    let matched = terms
                        .iter()
                        .zip(tuple.terms())
                        .all(|(pattern, ground)| pattern.match_ground(ground, &mut bindings));
                    if !matched {
                        continue;
                    }
                    let row = self
                        .variables
                        .iter()
                        .filter_map(|v| bindings.get(v).cloned())
                        .collect();
                    result.insert(Tuple::new(row));
                }
                Ok(Cow::Owned(result))
            }
        }
    }
}

fn join_mapping(bound: &[Symbol], view_variables: &[Symbol]) -> Vec<Option<usize>> {
    bound
        .iter()
        .map(|v| view_variables.iter().position(|w| w == v))
        .collect()
}

fn term_is_bound(term: &Term, bound: &[Symbol]) -> bool {
    let mut vars = Vec::new();
    term.collect_variables(&mut vars);
    vars.iter().all(|v| bound.contains(v))
}

fn builtin_ready(builtin: &BuiltinAtom, bound: &[Symbol]) -> bool {
    let known: Vec<bool> = builtin.terms.iter().map(|t| term_is_bound(t, bound)).collect();
    builtin
        .terms
        .iter()
        .zip(&known)
        .all(|(term, known)| *known || term.is_variable())
        && can_evaluate(builtin.kind, &known)
}

/// Check whether `builtin` would bind a variable that a pending positive
/// literal also binds. Joins compare terms structurally, so `1 = 1.0` must
/// be decided by the built-in after both sides are known.
fn binds_positive_variable(
    builtin: &BuiltinAtom,
    bound: &[Symbol],
    pending: &[&Literal],
) -> bool {
    builtin
        .terms
        .iter()
        .filter_map(|term| match term {
            Term::Variable(name) if !bound.contains(name) => Some(name),
            _ => None,
        })
        .any(|name| {
            pending
                .iter()
                .any(|literal| literal.is_positive() && literal.variables().contains(name))
        })
}

fn unbound_variables(literal: &Literal, bound: &[Symbol]) -> Vec<Symbol> {
    literal
        .variables()
        .into_iter()
        .filter(|v| !bound.contains(v))
        .collect()
}

impl CompiledRule {
    /// Compile a rule.
    ///
    /// # Errors
    ///
    /// `UnboundVariables` if a built-in or the head needs a variable that no
    /// literal binds. Rules that pass the safety check never fail here.
    pub fn compile(rule: &Rule) -> Result<Self, EvaluationError> {
        let mut pending: Vec<&Literal> = rule.body.iter().collect();
        let mut bound: Vec<Symbol> = Vec::new();
        let mut steps = Vec::with_capacity(pending.len());

        while !pending.is_empty() {
            let ready = pending.iter().position(|literal| match literal {
                Literal::BuiltIn(builtin) => {
                    builtin_ready(builtin, &bound)
                        && !binds_positive_variable(builtin, &bound, &pending)
                }
                Literal::Negative(atom) => atom.terms.iter().all(|t| term_is_bound(t, &bound)),
                Literal::Positive(_) => false,
            });
            let index = match ready {
                Some(index) => index,
                None => match pending.iter().position(|l| l.is_positive()) {
                    Some(index) => index,
                    None => match pending.iter().position(|l| l.is_negative()) {
                        Some(index) => index,
                        None => {
                            let variables = pending
                                .iter()
                                .flat_map(|l| unbound_variables(l, &bound))
                                .collect();
                            return Err(EvaluationError::UnboundVariables {
                                rule: rule.to_string(),
                                variables,
                            });
                        }
                    },
                },
            };
            let literal = pending.remove(index);
            steps.push(Self::compile_step(literal, &mut bound));
        }

        let mut head = Vec::with_capacity(rule.head.terms.len());
        for term in &rule.head.terms {
            if !term_is_bound(term, &bound) {
                let mut variables = Vec::new();
                term.collect_variables(&mut variables);
                variables.retain(|v| !bound.contains(v));
                return Err(EvaluationError::UnboundVariables {
                    rule: rule.to_string(),
                    variables,
                });
            }
            head.push(match term {
                Term::Variable(name) => {
                    HeadTerm::Column(bound.iter().position(|v| v == name).unwrap_or_default())
                }
                ground if ground.is_ground() => HeadTerm::Constant(ground.clone()),
                nested => HeadTerm::Nested(nested.clone()),
            });
        }

        Ok(CompiledRule {
            rule: rule.clone(),
            steps,
            head,
            variables: bound,
        })
    }

    fn compile_step(literal: &Literal, bound: &mut Vec<Symbol>) -> Step {
        match literal {
            Literal::Positive(atom) => {
                let view = AtomView::new(atom);
                let mapping = join_mapping(bound, &view.variables);
                let width = bound.len();
                let mut output: Vec<usize> = (0..width).collect();
                for (column, variable) in view.variables.iter().enumerate() {
                    if !bound.contains(variable) {
                        output.push(width + column);
                        bound.push(*variable);
                    }
                }
                Step::Positive(PositiveStep {
                    view,
                    mapping,
                    output,
                })
            }
            Literal::Negative(atom) => {
                let view = AtomView::new(atom);
                let bound_columns: Vec<usize> = view
                    .variables
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| bound.contains(v))
                    .map(|(column, _)| column)
                    .collect();
                let kept: Vec<Symbol> = bound_columns.iter().map(|c| view.variables[*c]).collect();
                let mapping = join_mapping(bound, &kept);
                Step::Negative(NegativeStep {
                    view,
                    bound_columns,
                    mapping,
                })
            }
            Literal::BuiltIn(builtin) => {
                let mut new_positions = Vec::new();
                for (position, term) in builtin.terms.iter().enumerate() {
                    if let Term::Variable(name) = term {
                        if !bound.contains(name) {
                            bound.push(*name);
                            new_positions.push(position);
                        }
                    }
                }
                Step::Builtin(BuiltinStep {
                    builtin: builtin.clone(),
                    new_positions,
                })
            }
        }
    }

    pub fn rule(&self) -> &Rule {
        &self.rule
    }

    pub fn head_predicate(&self) -> Predicate {
        self.rule.head.predicate
    }

    /// Variables in binding order
    pub fn variables(&self) -> &[Symbol] {
        &self.variables
    }

    /// Step index and predicate of every positive step
    pub fn positive_steps(&self) -> impl Iterator<Item = (usize, Predicate)> + '_ {
        self.steps
            .iter()
            .enumerate()
            .filter_map(|(index, step)| match step {
                Step::Positive(positive) => Some((index, positive.view.predicate)),
                _ => None,
            })
    }

    /// Evaluate the body and build the head tuples it derives
    pub fn execute(
        &self,
        inputs: RuleInputs<'_>,
        config: &EvaluationConfig,
    ) -> Result<Relation, EvaluationError> {
        let mut bindings = Relation::unit();
        for (index, step) in self.steps.iter().enumerate() {
            if bindings.is_empty() {
                break;
            }
            bindings = match step {
                Step::Positive(positive) => {
                    let source = match inputs.delta {
                        Some((delta_step, delta)) if delta_step == index => Some(delta),
                        _ => inputs.positive.get(&positive.view.predicate),
                    };
                    let view = positive.view.read(source)?;
                    let joined = join(&bindings, &view, &positive.mapping, JoinKind::Inner)?;
                    project(&joined, &positive.output)?
                }
                Step::Negative(negative) => {
                    let view = negative
                        .view
                        .read(inputs.negative.get(&negative.view.predicate))?;
                    let view = project(&view, &negative.bound_columns)?;
                    let matched = join(&bindings, &view, &negative.mapping, JoinKind::Semi)?;
                    difference(&bindings, &matched)?
                }
                Step::Builtin(builtin) => self.apply_builtin(builtin, &bindings, config)?,
            };
        }
        Ok(self.build_head(&bindings))
    }

    fn apply_builtin(
        &self,
        step: &BuiltinStep,
        bindings: &Relation,
        config: &EvaluationConfig,
    ) -> Result<Relation, EvaluationError> {
        let mut result = Relation::new(bindings.arity() + step.new_positions.len());
        for tuple in bindings {
            let env = self.environment(tuple);
            let args: Vec<Option<Term>> = step
                .builtin
                .terms
                .iter()
                .map(|term| {
                    let term = term.substitute(&env);
                    term.is_ground().then_some(term)
                })
                .collect();
            match evaluate(step.builtin.kind, &args) {
                BuiltinOutcome::Holds(terms) => {
                    let mut row = tuple.terms().to_vec();
                    row.extend(step.new_positions.iter().map(|p| terms[*p].clone()));
                    result.insert(Tuple::new(row));
                }
                BuiltinOutcome::Fails => {}
                BuiltinOutcome::DivisionByZero => {
                    if config.divide_by_zero == DivideByZeroBehaviour::Stop {
                        return Err(EvaluationError::DivisionByZero {
                            rule: self.rule.to_string(),
                        });
                    }
                }
            }
        }
        Ok(result)
    }

    fn environment(&self, tuple: &Tuple) -> Bindings {
        self.variables
            .iter()
            .zip(tuple.terms())
            .map(|(v, t)| (*v, t.clone()))
            .collect()
    }

    fn build_head(&self, bindings: &Relation) -> Relation {
        let mut result = Relation::new(self.head.len());
        for tuple in bindings {
            let needs_env = self.head.iter().any(|t| matches!(t, HeadTerm::Nested(_)));
            let env = if needs_env {
                self.environment(tuple)
            } else {
                Bindings::new()
            };
            let row = self
                .head
                .iter()
                .map(|term| match term {
                    HeadTerm::Column(column) => tuple.terms()[*column].clone(),
                    HeadTerm::Constant(term) => term.clone(),
                    HeadTerm::Nested(term) => term.substitute(&env),
                })
                .collect();
            result.insert(Tuple::new(row));
        }
        result
    }
}
