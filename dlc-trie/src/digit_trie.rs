//! # DigitTrie
//! Data structure to store and lookup digit decomposition data.

use crate::{Error, LookupResult};
#[cfg(feature = "use-serde")]
use serde::{Deserialize, Serialize};

const ROOT: usize = 0;

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
struct DigitNode<T> {
    parent: Option<usize>,
    digit: usize,
    children: Vec<Option<usize>>,
    value: Option<T>,
}

impl<T> DigitNode<T> {
    fn new(parent: Option<usize>, digit: usize, base: usize) -> Self {
        DigitNode {
            parent,
            digit,
            children: vec![None; base],
            value: None,
        }
    }
}

/// Structure to store data inserted and looked-up based on digit paths.
/// Nodes are kept in an arena and refer to each other by index. A value can
/// only be stored at a node none of whose ancestors or descendants hold one,
/// so that any full digit sequence is covered by at most one stored prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "use-serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "camelCase")
)]
pub struct DigitTrie<T> {
    nodes: Vec<DigitNode<T>>,
    // Indexes of the nodes holding a value, in insertion order.
    populated: Vec<usize>,
    base: usize,
}

impl<T> DigitTrie<T> {
    /// Create a new empty trie for the given base.
    pub fn new(base: usize) -> DigitTrie<T> {
        DigitTrie {
            nodes: vec![DigitNode::new(None, 0, base)],
            populated: Vec::new(),
            base,
        }
    }

    /// The base of the digits stored in this trie.
    pub fn base(&self) -> usize {
        self.base
    }

    /// The number of values stored in the trie.
    pub fn len(&self) -> usize {
        self.populated.len()
    }

    /// Returns true if no value was inserted in the trie.
    pub fn is_empty(&self) -> bool {
        self.populated.is_empty()
    }

    /// Store `value` at `path`. Returns [`Error::Conflict`] if a value is
    /// already stored at the path, at one of its prefixes or at a path that it
    /// is a prefix of, and [`Error::InvalidPath`] if the path contains a digit
    /// that is not smaller than the base. The empty path stores the value at
    /// the root, covering every digit sequence, and so requires an empty trie.
    /// The trie is left unchanged on error.
    pub fn insert(&mut self, path: &[usize], value: T) -> Result<(), Error> {
        if path.iter().any(|d| *d >= self.base) {
            return Err(Error::InvalidPath);
        }

        if self.nodes[ROOT].value.is_some() {
            return Err(Error::Conflict(Vec::new()));
        }

        if path.is_empty() {
            if !self.is_empty() {
                return Err(Error::Conflict(Vec::new()));
            }
            self.nodes[ROOT].value = Some(value);
            self.populated.push(ROOT);
            return Ok(());
        }

        let mut cur = ROOT;
        let mut depth = 0;
        while depth < path.len() {
            match self.nodes[cur].children[path[depth]] {
                Some(next) => {
                    cur = next;
                    depth += 1;
                    if self.nodes[cur].value.is_some() {
                        return Err(Error::Conflict(path[..depth].to_vec()));
                    }
                }
                None => break,
            }
        }

        // Nodes only get created on the way to a stored value, so an existing
        // node at the end of the path has a populated descendant.
        if depth == path.len() {
            return Err(Error::Conflict(path.to_vec()));
        }

        for digit in &path[depth..] {
            let index = self.nodes.len();
            self.nodes
                .push(DigitNode::new(Some(cur), *digit, self.base));
            self.nodes[cur].children[*digit] = Some(index);
            cur = index;
        }

        self.nodes[cur].value = Some(value);
        self.populated.push(cur);
        Ok(())
    }

    /// Returns an iterator over the stored values and their paths, in insertion
    /// order. Each call starts a new iteration.
    pub fn explore(&self) -> DigitTrieIter<'_, T> {
        DigitTrieIter {
            trie: self,
            next: 0,
        }
    }

    /// Walks `digits` from the root and returns the first stored value found on
    /// the way, together with the prefix of `digits` leading to it.
    pub fn look_up(&self, digits: &[usize]) -> Option<LookupResult<'_, T>> {
        if let Some(value) = &self.nodes[ROOT].value {
            return Some(LookupResult {
                path: Vec::new(),
                value,
            });
        }

        let mut cur = ROOT;
        for (i, digit) in digits.iter().enumerate() {
            cur = (*self.nodes[cur].children.get(*digit)?)?;
            if let Some(value) = &self.nodes[cur].value {
                return Some(LookupResult {
                    path: digits[..=i].to_vec(),
                    value,
                });
            }
        }

        None
    }

    fn path_to(&self, index: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cur = index;
        while let Some(parent) = self.nodes[cur].parent {
            path.push(self.nodes[cur].digit);
            cur = parent;
        }
        path.reverse();
        path
    }
}

/// Iterator over the values of a [`DigitTrie`], see [`DigitTrie::explore`].
pub struct DigitTrieIter<'a, T> {
    trie: &'a DigitTrie<T>,
    next: usize,
}

impl<'a, T> Iterator for DigitTrieIter<'a, T> {
    type Item = LookupResult<'a, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = *self.trie.populated.get(self.next)?;
        self.next += 1;
        let value = self.trie.nodes[index].value.as_ref()?;
        Some(LookupResult {
            path: self.trie.path_to(index),
            value,
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.trie.populated.len() - self.next;
        (remaining, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> Vec<Vec<usize>> {
        vec![
            vec![0, 0, 1, 1],
            vec![0, 1, 0],
            vec![0, 1, 1, 0],
            vec![1],
            vec![0, 0, 0],
        ]
    }

    fn build(paths: &[Vec<usize>]) -> DigitTrie<usize> {
        let mut trie = DigitTrie::new(2);
        for (i, path) in paths.iter().enumerate() {
            trie.insert(path, i).unwrap();
        }
        trie
    }

    #[test]
    fn digit_trie_explore_returns_inserted_elements_in_order() {
        let paths = paths();
        let trie = build(&paths);

        let explored: Vec<(Vec<usize>, usize)> =
            trie.explore().map(|x| (x.path, *x.value)).collect();

        let expected: Vec<(Vec<usize>, usize)> = paths
            .into_iter()
            .enumerate()
            .map(|(i, p)| (p, i))
            .collect();
        assert_eq!(expected, explored);
        assert_eq!(5, trie.len());
        assert!(!trie.is_empty());
    }

    #[test]
    fn digit_trie_explore_is_restartable() {
        let trie = build(&paths());

        let first: Vec<_> = trie.explore().map(|x| x.path).collect();
        let second: Vec<_> = trie.explore().map(|x| x.path).collect();

        assert_eq!(first, second);
        assert_eq!(5, trie.explore().size_hint().0);
    }

    #[test]
    fn digit_trie_explore_independent_of_insertion_order() {
        let paths = paths();
        let mut reversed = paths.clone();
        reversed.reverse();

        let mut a: Vec<_> = build(&paths).explore().map(|x| x.path).collect();
        let mut b: Vec<_> = build(&reversed).explore().map(|x| x.path).collect();
        a.sort();
        b.sort();

        assert_eq!(a, b);
    }

    #[test]
    fn digit_trie_insert_existing_path_conflicts() {
        let mut trie = build(&paths());

        assert_eq!(
            Err(Error::Conflict(vec![0, 1, 0])),
            trie.insert(&[0, 1, 0], 10)
        );
        assert_eq!(5, trie.len());
    }

    #[test]
    fn digit_trie_insert_under_value_conflicts() {
        let mut trie = build(&paths());

        assert_eq!(
            Err(Error::Conflict(vec![1])),
            trie.insert(&[1, 0, 1], 10)
        );
    }

    #[test]
    fn digit_trie_insert_above_value_conflicts() {
        let mut trie = build(&paths());

        assert_eq!(Err(Error::Conflict(vec![0, 1])), trie.insert(&[0, 1], 10));
        assert_eq!(Err(Error::Conflict(vec![0])), trie.insert(&[0], 10));
    }

    #[test]
    fn digit_trie_conflict_leaves_trie_unchanged() {
        let mut trie = build(&paths());
        let before = trie.clone();

        assert!(trie.insert(&[1, 1, 1], 10).is_err());

        assert_eq!(before, trie);
    }

    #[test]
    fn digit_trie_invalid_paths() {
        let mut trie = DigitTrie::new(2);

        assert_eq!(Err(Error::InvalidPath), trie.insert(&[0, 2], 1));
        assert_eq!(Err(Error::InvalidPath), trie.insert(&[3], 1));
        assert!(trie.is_empty());
    }

    #[test]
    fn digit_trie_empty_path_stored_at_root() {
        let mut trie = DigitTrie::new(2);
        trie.insert(&[], 7).unwrap();

        assert_eq!(1, trie.len());
        let explored: Vec<_> = trie.explore().map(|x| (x.path, *x.value)).collect();
        assert_eq!(vec![(Vec::new(), 7)], explored);

        let res = trie.look_up(&[1, 0, 1, 1]).unwrap();
        assert!(res.path.is_empty());
        assert_eq!(7, *res.value);
    }

    #[test]
    fn digit_trie_empty_path_conflicts_with_other_values() {
        let mut trie = build(&paths());
        assert_eq!(Err(Error::Conflict(Vec::new())), trie.insert(&[], 10));
        assert_eq!(5, trie.len());

        let mut root_trie = DigitTrie::new(2);
        root_trie.insert(&[], 1).unwrap();
        assert_eq!(Err(Error::Conflict(Vec::new())), root_trie.insert(&[0, 1], 2));
        assert_eq!(Err(Error::Conflict(Vec::new())), root_trie.insert(&[], 2));
        assert_eq!(1, root_trie.len());
    }

    #[test]
    fn digit_trie_look_up_returns_covering_prefix() {
        let trie = build(&paths());

        let res = trie.look_up(&[0, 1, 0, 1]).unwrap();
        assert_eq!(vec![0, 1, 0], res.path);
        assert_eq!(1, *res.value);

        let res = trie.look_up(&[1, 1, 1, 1]).unwrap();
        assert_eq!(vec![1], res.path);
        assert_eq!(3, *res.value);
    }

    #[test]
    fn digit_trie_look_up_not_found() {
        let trie = build(&paths());

        assert!(trie.look_up(&[0, 0, 1, 0]).is_none());
        assert!(trie.look_up(&[0, 1]).is_none());
        assert!(trie.look_up(&[3]).is_none());
        assert!(DigitTrie::<usize>::new(10).look_up(&[1, 2, 3]).is_none());
    }

    #[test]
    fn digit_trie_base_ten() {
        let mut trie = DigitTrie::new(10);
        trie.insert(&[4, 3, 2, 1], "a").unwrap();
        trie.insert(&[9], "b").unwrap();

        assert_eq!(10, trie.base());
        assert_eq!(Some(&"a"), trie.look_up(&[4, 3, 2, 1]).map(|x| x.value));
        assert_eq!(Some(&"b"), trie.look_up(&[9, 0, 0, 0]).map(|x| x.value));
    }
}
