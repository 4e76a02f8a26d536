//! Overlap arbitration (§4.4): classify and resolve Type 1/2/3 collisions
//! between candidates sorted by `(start_lineno asc, end_lineno desc)`.

use crate::error::CoreError;
use crate::harvest::example::ExampleCandidate;

/// Sort candidates the way §4.4 requires before arbitration.
pub fn sort_candidates(candidates: &mut [ExampleCandidate]) {
    candidates.sort_by(|a, b| {
        a.where_
            .start_lineno
            .cmp(&b.where_.start_lineno)
            .then(b.where_.end_lineno.cmp(&a.where_.end_lineno))
    });
}

/// Resolve overlaps in a sorted candidate list. Type 2 (inner containment)
/// candidates are dropped silently (logged); Type 1 (same start) and Type 3
/// (partial overlap) are fatal. Runs until a full pass finds no collisions,
/// which terminates in O(n^2) steps.
pub fn arbitrate(mut candidates: Vec<ExampleCandidate>) -> Result<Vec<ExampleCandidate>, CoreError> {
    loop {
        let mut collision_free = true;
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let mut drop_index = None;
        for i in 1..candidates.len() {
            let prev = &candidates[i - 1];
            let curr = &candidates[i];

            let type1 = curr.where_.start_lineno == prev.where_.start_lineno;
            let type2 = !type1 && curr.where_.end_lineno <= prev.where_.end_lineno;
            let type3 = !type1 && !type2 && curr.where_.start_lineno <= prev.where_.end_lineno;

            if !(type1 || type2 || type3) {
                continue;
            }
            collision_free = false;

            if type2 {
                tracing::debug!(at = %curr.where_, "dropping inner example (Type 2 overlap)");
                drop_index = Some(i);
                break;
            }

            if type1 {
                return Err(CoreError::AmbiguousOverlap {
                    first: prev.where_.clone(),
                    second: curr.where_.clone(),
                });
            }

            return Err(CoreError::PartialOverlap {
                first: prev.where_.clone(),
                second: curr.where_.clone(),
            });
        }

        match drop_index {
            Some(i) => {
                candidates.remove(i);
            }
            None => {
                debug_assert!(collision_free);
                return Ok(candidates);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::Where;

    fn candidate(start: usize, end: usize) -> ExampleCandidate {
        ExampleCandidate::new(
            "test",
            "shell",
            "snippet",
            "expected",
            "",
            Where::new(start, end, "doc.md"),
        )
    }

    #[test]
    fn type2_inner_example_is_dropped() {
        let mut candidates = vec![candidate(1, 4), candidate(2, 3)];
        sort_candidates(&mut candidates);
        let result = arbitrate(candidates).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].where_.start_lineno, 1);
        assert_eq!(result[0].where_.end_lineno, 4);
    }

    #[test]
    fn type1_same_start_is_fatal() {
        let mut candidates = vec![candidate(1, 4), candidate(1, 5)];
        sort_candidates(&mut candidates);
        let err = arbitrate(candidates).unwrap_err();
        assert!(matches!(err, CoreError::AmbiguousOverlap { .. }));
    }

    #[test]
    fn type3_partial_overlap_is_fatal() {
        let mut candidates = vec![candidate(1, 4), candidate(2, 5)];
        sort_candidates(&mut candidates);
        let err = arbitrate(candidates).unwrap_err();
        assert!(matches!(err, CoreError::PartialOverlap { .. }));
    }

    #[test]
    fn disjoint_examples_are_kept_in_order() {
        let mut candidates = vec![candidate(5, 6), candidate(1, 2), candidate(3, 4)];
        sort_candidates(&mut candidates);
        let result = arbitrate(candidates).unwrap();
        let starts: Vec<usize> = result.iter().map(|c| c.where_.start_lineno).collect();
        assert_eq!(starts, vec![1, 3, 5]);
    }
}
