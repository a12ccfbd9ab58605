//! Order-statistics store used to extract the median of a price window.
//!
//! An unbalanced binary search tree over a multiset of observations. Keys less
//! than a node go left, everything else (including equal keys) goes right, so
//! duplicates accumulate rightward.
//!
//! Cost: building from `n` values is expected O(n log n) with an O(n) in-order
//! traversal, but monotonic input degenerates the tree into a list and makes
//! construction O(n^2). For large windows this is the dominant cost of the
//! median-reversion policy. Nodes live in an arena and both insertion and
//! traversal are iterative, so a degenerate tree costs time but cannot
//! overflow the stack.

#[derive(Debug, Clone)]
struct Node {
    key: f64,
    left: Option<usize>,
    right: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderStatisticsTree {
    nodes: Vec<Node>,
}

impl OrderStatisticsTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut tree = Self::new();
        for value in values {
            tree.insert(value);
        }
        tree
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn insert(&mut self, key: f64) {
        let new_index = self.nodes.len();
        self.nodes.push(Node {
            key,
            left: None,
            right: None,
        });
        if new_index == 0 {
            return;
        }

        let mut current = 0;
        loop {
            let node = &mut self.nodes[current];
            let slot = if key < node.key {
                &mut node.left
            } else {
                &mut node.right
            };
            match *slot {
                Some(next) => current = next,
                None => {
                    *slot = Some(new_index);
                    return;
                }
            }
        }
    }

    /// Keys in ascending order.
    pub fn in_order(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = Vec::new();
        let mut cursor = if self.nodes.is_empty() { None } else { Some(0) };

        while cursor.is_some() || !stack.is_empty() {
            while let Some(i) = cursor {
                stack.push(i);
                cursor = self.nodes[i].left;
            }
            if let Some(i) = stack.pop() {
                out.push(self.nodes[i].key);
                cursor = self.nodes[i].right;
            }
        }
        out
    }

    /// Middle key for an odd count, mean of the two middle keys for an even
    /// count, `None` when empty.
    pub fn median(&self) -> Option<f64> {
        let sorted = self.in_order();
        let n = sorted.len();
        if n == 0 {
            return None;
        }
        if n % 2 == 1 {
            Some(sorted[n / 2])
        } else {
            Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sorted_median(values: &[f64]) -> Option<f64> {
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = sorted.len();
        match n {
            0 => None,
            _ if n % 2 == 1 => Some(sorted[n / 2]),
            _ => Some((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0),
        }
    }

    #[test]
    fn median_odd_count() {
        let tree = OrderStatisticsTree::from_values([3.0, 1.0, 2.0]);
        assert_eq!(tree.median(), Some(2.0));
    }

    #[test]
    fn median_even_count() {
        let tree = OrderStatisticsTree::from_values([3.0, 1.0, 2.0, 4.0]);
        assert_eq!(tree.median(), Some(2.5));
    }

    #[test]
    fn median_empty() {
        let tree = OrderStatisticsTree::new();
        assert!(tree.is_empty());
        assert_eq!(tree.median(), None);
    }

    #[test]
    fn median_single() {
        let tree = OrderStatisticsTree::from_values([42.0]);
        assert_eq!(tree.median(), Some(42.0));
    }

    #[test]
    fn duplicates_are_kept() {
        let tree = OrderStatisticsTree::from_values([5.0, 5.0, 1.0, 5.0]);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.in_order(), vec![1.0, 5.0, 5.0, 5.0]);
        assert_eq!(tree.median(), Some(5.0));
    }

    #[test]
    fn equal_keys_go_right() {
        let mut tree = OrderStatisticsTree::new();
        tree.insert(2.0);
        tree.insert(2.0);
        assert_eq!(tree.nodes[0].left, None);
        assert_eq!(tree.nodes[0].right, Some(1));
    }

    #[test]
    fn monotonic_input_does_not_overflow() {
        let tree = OrderStatisticsTree::from_values((0..5_000).map(f64::from));
        assert_eq!(tree.median(), Some(2499.5));
    }

    proptest! {
        #[test]
        fn median_matches_full_sort(values in prop::collection::vec(-1_000i32..1_000, 0..200)) {
            let values: Vec<f64> = values.into_iter().map(|v| f64::from(v) / 4.0).collect();
            let tree = OrderStatisticsTree::from_values(values.iter().copied());
            prop_assert_eq!(tree.median(), sorted_median(&values));
        }

        #[test]
        fn in_order_is_sorted(values in prop::collection::vec(0u16..50, 0..100)) {
            let values: Vec<f64> = values.into_iter().map(f64::from).collect();
            let tree = OrderStatisticsTree::from_values(values.iter().copied());
            let mut expected = values.clone();
            expected.sort_by(|a, b| a.partial_cmp(b).unwrap());
            prop_assert_eq!(tree.in_order(), expected);
        }
    }
}
