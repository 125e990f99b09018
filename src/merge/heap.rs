//! Index min-heap with an injected ordering.
//!
//! The merge engine runs two interdependent heaps whose ordering depends on
//! live contig ranks and on row state stored outside the heap, so every
//! operation takes the `lt` closure as an argument instead of baking a
//! comparator into the element type.

/// Push `value`, restoring the heap property under `lt`.
pub(crate) fn push<F>(heap: &mut Vec<usize>, value: usize, lt: F)
where
    F: Fn(usize, usize) -> bool,
{
    heap.push(value);
    let mut i = heap.len() - 1;
    while i > 0 {
        let parent = (i - 1) / 2;
        if lt(heap[i], heap[parent]) {
            heap.swap(i, parent);
            i = parent;
        } else {
            break;
        }
    }
}

/// Pop the minimum under `lt`.
pub(crate) fn pop<F>(heap: &mut Vec<usize>, lt: F) -> Option<usize>
where
    F: Fn(usize, usize) -> bool,
{
    if heap.is_empty() {
        return None;
    }
    let last = heap.len() - 1;
    heap.swap(0, last);
    let top = heap.pop();

    let mut i = 0;
    loop {
        let left = 2 * i + 1;
        if left >= heap.len() {
            break;
        }
        let right = left + 1;
        let smallest = if right < heap.len() && lt(heap[right], heap[left]) {
            right
        } else {
            left
        };
        if lt(heap[smallest], heap[i]) {
            heap.swap(i, smallest);
            i = smallest;
        } else {
            break;
        }
    }
    top
}

/// The current minimum, without removing it.
pub(crate) fn peek(heap: &[usize]) -> Option<usize> {
    heap.first().copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pop_order_follows_injected_keys() {
        let keys = [50usize, 10, 40, 20, 30];
        let lt = |a: usize, b: usize| keys[a] < keys[b];
        let mut heap = Vec::new();
        for i in 0..keys.len() {
            push(&mut heap, i, lt);
        }
        assert_eq!(peek(&heap), Some(1));
        let mut drained = Vec::new();
        while let Some(i) = pop(&mut heap, lt) {
            drained.push(keys[i]);
        }
        assert_eq!(drained, vec![10, 20, 30, 40, 50]);
    }

    #[test]
    fn test_two_heaps_with_different_orderings() {
        let keys = [3usize, 1, 2];
        let mut asc = Vec::new();
        let mut desc = Vec::new();
        for i in 0..keys.len() {
            push(&mut asc, i, |a, b| keys[a] < keys[b]);
            push(&mut desc, i, |a, b| keys[a] > keys[b]);
        }
        assert_eq!(peek(&asc), Some(1));
        assert_eq!(peek(&desc), Some(0));
    }

    #[test]
    fn test_empty() {
        let mut heap: Vec<usize> = Vec::new();
        assert_eq!(peek(&heap), None);
        assert_eq!(pop(&mut heap, |a, b| a < b), None);
    }
}
