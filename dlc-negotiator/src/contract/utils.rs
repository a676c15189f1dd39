use std::collections::HashMap;
use std::hash::Hash;

/// Returns whether both slices hold the same elements with the same
/// multiplicity, regardless of their order.
pub(crate) fn unordered_equal<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    fn count<T>(items: &[T]) -> HashMap<&T, usize>
    where
        T: Eq + Hash,
    {
        let mut cnt = HashMap::new();
        for i in items {
            *cnt.entry(i).or_insert(0) += 1
        }
        cnt
    }

    a.len() == b.len() && count(a) == count(b)
}
