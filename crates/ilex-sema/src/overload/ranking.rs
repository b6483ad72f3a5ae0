//! Candidate ranking shared by operator and call resolution.
//!
//! Every viable candidate carries a conversion cost plus the two tie-break
//! keys. Selection is: lowest total cost wins; among cost ties the
//! candidate declared on the most-derived type wins; among those the one
//! with more exactly-matched (identity-converted) arguments wins; anything
//! still tied is ambiguous and reported as such.

/// One viable candidate with its ranking keys.
#[derive(Debug, Clone)]
pub struct Candidate<T> {
    /// The candidate payload.
    pub item: T,
    /// Total conversion cost over all operands.
    pub cost: u32,
    /// Number of operands matched by the identity conversion.
    pub exact_matches: u32,
    /// Distance of the declaring type from the most-derived type searched;
    /// zero is most derived.
    pub depth: u32,
}

/// Outcome of ranking.
#[derive(Debug)]
pub enum Ranked<T> {
    /// A single best candidate.
    Best(T),
    /// Two or more candidates tied on every key.
    Ambiguous(Vec<T>),
    /// No viable candidates were supplied.
    NoMatch,
}

/// Pick the best candidate.
pub fn pick<T>(candidates: Vec<Candidate<T>>) -> Ranked<T> {
    if candidates.is_empty() {
        return Ranked::NoMatch;
    }
    let best_cost = candidates.iter().map(|c| c.cost).min().unwrap_or(0);
    let mut pool: Vec<Candidate<T>> = candidates
        .into_iter()
        .filter(|c| c.cost == best_cost)
        .collect();
    if pool.len() > 1 {
        let best_depth = pool.iter().map(|c| c.depth).min().unwrap_or(0);
        pool.retain(|c| c.depth == best_depth);
    }
    if pool.len() > 1 {
        let best_exact = pool.iter().map(|c| c.exact_matches).max().unwrap_or(0);
        pool.retain(|c| c.exact_matches == best_exact);
    }
    if pool.len() == 1 {
        return Ranked::Best(pool.remove(0).item);
    }
    Ranked::Ambiguous(pool.into_iter().map(|c| c.item).collect())
}
