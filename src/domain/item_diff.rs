use std::collections::HashSet;

/// Item ids seen in `observed` that are absent from `known`, each reported once.
pub fn new_item_ids<I>(known: &HashSet<i32>, observed: I) -> Vec<i32>
where
    I: IntoIterator<Item = i32>,
{
    let mut seen = HashSet::new();
    observed
        .into_iter()
        .filter(|id| !known.contains(id) && seen.insert(*id))
        .collect()
}
