//! Union and difference

use crate::{illegal, AlgebraError};
use datalog_core::Relation;

/// Set union of one or more relations of the same arity
pub fn union(relations: &[&Relation]) -> Result<Relation, AlgebraError> {
    let Some(first) = relations.first() else {
        return Err(illegal("union of no relations".to_string()));
    };
    let arity = first.arity();
    if let Some(other) = relations.iter().find(|r| r.arity() != arity) {
        return Err(illegal(format!(
            "union of relations with arities {} and {}",
            arity,
            other.arity()
        )));
    }
    let mut result = Relation::new(arity);
    for relation in relations {
        result.add_all(relation);
    }
    Ok(result)
}

/// Tuples of `left` that are not in `right`
pub fn difference(left: &Relation, right: &Relation) -> Result<Relation, AlgebraError> {
    if left.arity() != right.arity() {
        return Err(illegal(format!(
            "difference of relations with arities {} and {}",
            left.arity(),
            right.arity()
        )));
    }
    Ok(Relation::from_tuples(
        left.arity(),
        left.iter().filter(|tuple| !right.contains(tuple)).cloned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{Term, Tuple};

    fn rel(values: &[i64]) -> Relation {
        Relation::from_tuples(1, values.iter().map(|v| Tuple::new(vec![Term::int(*v)])))
    }

    #[test]
    fn test_union() {
        let result = union(&[&rel(&[1, 2]), &rel(&[2, 3]), &rel(&[])]).unwrap();
        assert_eq!(result, rel(&[1, 2, 3]));
    }

    #[test]
    fn test_union_errors() {
        assert!(union(&[]).is_err());
        let wide = Relation::new(2);
        assert!(matches!(
            union(&[&rel(&[1]), &wide]),
            Err(AlgebraError::IllegalArgument(_))
        ));
    }

    #[test]
    fn test_difference() {
        let result = difference(&rel(&[1, 2, 3]), &rel(&[2, 4])).unwrap();
        assert_eq!(result, rel(&[1, 3]));
        assert!(difference(&rel(&[1]), &Relation::new(2)).is_err());
    }
}
