//! Combo-question resolution (`spec.md` §4.D step 2): combine two already
//! resolved legs under a pair of directions. Grounded in
//! `original_source/src/helpers/resolution.py::combo_change_sign` and
//! `original_source/src/resolve_forecasts/acled.py::resolve`'s combo
//! handling, re-expressed over the `Direction` enum instead of a raw `+1/-1`
//! int.

use forecastbench_core::Direction;

/// `(d1 == 1 ? r1 : 1-r1) * (d2 == 1 ? r2 : 1-r2)`. NaN propagates: a combo
/// with an indeterminate leg is itself indeterminate.
pub fn combine(directions: [Direction; 2], leg_outcomes: [f64; 2]) -> f64 {
    if leg_outcomes[0].is_nan() || leg_outcomes[1].is_nan() {
        return f64::NAN;
    }
    directions[0].apply(leg_outcomes[0]) * directions[1].apply(leg_outcomes[1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_positive_directions_multiply_raw_outcomes() {
        let v = combine([Direction::Positive, Direction::Positive], [1.0, 1.0]);
        assert_eq!(v, 1.0);
    }

    #[test]
    fn negative_direction_inverts_leg() {
        let v = combine([Direction::Negative, Direction::Positive], [1.0, 1.0]);
        assert_eq!(v, 0.0);
    }

    #[test]
    fn identity_over_all_outcome_combinations() {
        // spec.md §8 property 5: combo outcome equals the product of
        // per-leg sign-adjusted outcomes for every (direction, outcome)
        // combination.
        for &d0 in &[Direction::Positive, Direction::Negative] {
            for &d1 in &[Direction::Positive, Direction::Negative] {
                for &r0 in &[0.0, 1.0] {
                    for &r1 in &[0.0, 1.0] {
                        let expected = d0.apply(r0) * d1.apply(r1);
                        assert_eq!(combine([d0, d1], [r0, r1]), expected);
                    }
                }
            }
        }
    }

    #[test]
    fn nan_leg_propagates() {
        let v = combine([Direction::Positive, Direction::Positive], [f64::NAN, 1.0]);
        assert!(v.is_nan());
    }
}
