//! Ranking of applicable overloads.
//!
//! Candidates are ordered by cast count, then by the number of inferred
//! generic arguments, then non-variadic before variadic. The first wins
//! unless the second is equal on all three keys, which is ambiguous.

use dothtml_core::ResolutionError;

use super::Candidate;

/// Pick the best of `viable`, which must not be empty.
pub fn find_best_match(name: &str, mut viable: Vec<Candidate>) -> Result<Candidate, ResolutionError> {
    viable.sort_by_key(Candidate::rank_key);
    let mut ranked = viable.into_iter();
    let Some(best) = ranked.next() else {
        return Err(ResolutionError::NoApplicableOverload {
            name: name.to_string(),
            args: String::new(),
        });
    };
    if let Some(second) = ranked.next()
        && second.rank_key() == best.rank_key()
    {
        return Err(ResolutionError::AmbiguousOverload {
            name: name.to_string(),
            candidates: format!("{} and {}", best.describe(), second.describe()),
        });
    }
    Ok(best)
}
