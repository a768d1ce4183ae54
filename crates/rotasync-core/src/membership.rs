/// Unordered comparison that counts duplicates: both sides must have the
/// same length and the same elements the same number of times.
pub fn same_members<T: Ord + Clone>(current: &[T], target: &[T]) -> bool {
    if current.len() != target.len() {
        return false;
    }
    let mut a = current.to_vec();
    let mut b = target.to_vec();
    a.sort();
    b.sort();
    a == b
}
