use std::collections::BTreeSet;

use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

use super::errors::SelectionError;
use super::quiz::OPTION_COUNT;

/// Shuffled answer options for one item, with the correct answer recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct McqOptions {
    pub options: [String; OPTION_COUNT],
    pub answer: String,
}

/// Samples three distinct distractors from `pool` minus the target, then
/// shuffles target and distractors into the final option order.
///
/// The pool is a set, so options are distinct by construction and the answer
/// is always one of them. Iteration over a `BTreeSet` is ordered, which makes
/// the result a pure function of (target, pool, rng state).
pub fn select_options<R: Rng + ?Sized>(
    target: &str,
    pool: &BTreeSet<String>,
    rng: &mut R,
) -> Result<McqOptions, SelectionError> {
    let needed = OPTION_COUNT - 1;
    let candidates: Vec<&String> = pool.iter().filter(|word| word.as_str() != target).collect();

    if candidates.len() < needed {
        return Err(SelectionError::InsufficientPool {
            available: candidates.len(),
            needed,
        });
    }

    let mut options: Vec<String> = Vec::with_capacity(OPTION_COUNT);
    options.push(target.to_string());
    options.extend(
        candidates
            .choose_multiple(rng, needed)
            .map(|word| (*word).clone()),
    );
    options.shuffle(rng);

    let options: [String; OPTION_COUNT] = options
        .try_into()
        .expect("selection always yields exactly OPTION_COUNT options");

    Ok(McqOptions {
        options,
        answer: target.to_string(),
    })
}
