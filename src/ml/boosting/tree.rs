//! Binary regression tree stored as a flat node arena

use crate::ml::FeatureVector;

#[derive(Debug, Clone, PartialEq)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Samples with `x[feature] < threshold` go left
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    nodes: Vec<TreeNode>,
}

impl Tree {
    pub fn predict(&self, features: &FeatureVector) -> f64 {
        let mut at = 0;
        loop {
            match self.nodes.get(at) {
                Some(TreeNode::Leaf { value }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    at = if features[*feature] < *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => return 0.0,
            }
        }
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    pub(super) fn push_leaf(&mut self, value: f64) -> usize {
        self.nodes.push(TreeNode::Leaf { value });
        self.nodes.len() - 1
    }

    /// Turn leaf `at` into a split over two existing nodes
    pub(super) fn set_split(
        &mut self,
        at: usize,
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    ) {
        self.nodes[at] = TreeNode::Split {
            feature,
            threshold,
            left,
            right,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing() {
        let mut tree = Tree::default();
        let root = tree.push_leaf(0.0);
        let left = tree.push_leaf(-1.0);
        let right = tree.push_leaf(1.0);
        tree.set_split(root, 2, 0.5, left, right);

        let mut x = [0.0; 10];
        assert_eq!(tree.predict(&x), -1.0);
        x[2] = 0.5;
        assert_eq!(tree.predict(&x), 1.0);
        assert_eq!(tree.n_leaves(), 2);
    }
}
