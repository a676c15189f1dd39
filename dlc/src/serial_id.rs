//! #SerialIdOrderer
//! Deterministic ordering of transaction inputs and outputs based on the
//! random serial ids exchanged by the parties of a contract.

use crate::Error;

/// Orders items according to their serial id, in ascending order. Both parties
/// build the same orderer from the same set of ids and thus obtain the same
/// transaction layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SerialIdOrderer {
    sorted_ids: Vec<u64>,
}

impl SerialIdOrderer {
    /// Create a new orderer for the given set of ids. Returns an error if the
    /// same id appears more than once.
    pub fn new(ids: &[u64]) -> Result<Self, Error> {
        let mut sorted_ids = ids.to_vec();
        sorted_ids.sort_unstable();
        if sorted_ids.windows(2).any(|w| w[0] == w[1]) {
            return Err(Error::InvalidArgument);
        }
        Ok(SerialIdOrderer { sorted_ids })
    }

    /// Returns the position that the item with the given id will have once
    /// ordered, or `None` if the id is unknown to this orderer.
    pub fn get_index_for_id(&self, id: u64) -> Option<usize> {
        self.sorted_ids.binary_search(&id).ok()
    }

    /// Reorders `items`, where `items[i]` is identified by `ids[i]`. The ids
    /// must be exactly the ones the orderer was created with.
    pub fn order<T>(&self, items: Vec<T>, ids: &[u64]) -> Result<Vec<T>, Error> {
        if items.len() != ids.len() || ids.len() != self.sorted_ids.len() {
            return Err(Error::InvalidArgument);
        }

        let mut slots: Vec<Option<T>> = (0..items.len()).map(|_| None).collect();
        for (item, id) in items.into_iter().zip(ids) {
            let index = self.get_index_for_id(*id).ok_or(Error::InvalidArgument)?;
            if slots[index].replace(item).is_some() {
                return Err(Error::InvalidArgument);
            }
        }

        // Every slot is filled since ids are distinct and as many as slots.
        slots
            .into_iter()
            .collect::<Option<Vec<T>>>()
            .ok_or(Error::InvalidArgument)
    }

    /// The number of ids known to this orderer.
    pub fn len(&self) -> usize {
        self.sorted_ids.len()
    }

    /// Whether the orderer was created without any id.
    pub fn is_empty(&self) -> bool {
        self.sorted_ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_items_by_ascending_id() {
        let ids = [42, 7, 1_000_000, 8];
        let orderer = SerialIdOrderer::new(&ids).unwrap();

        let ordered = orderer.order(vec!["a", "b", "c", "d"], &ids).unwrap();

        assert_eq!(vec!["b", "d", "a", "c"], ordered);
    }

    #[test]
    fn index_for_id_is_position_after_ordering() {
        let orderer = SerialIdOrderer::new(&[30, 10, 20]).unwrap();

        assert_eq!(Some(0), orderer.get_index_for_id(10));
        assert_eq!(Some(1), orderer.get_index_for_id(20));
        assert_eq!(Some(2), orderer.get_index_for_id(30));
        assert_eq!(None, orderer.get_index_for_id(15));
        assert_eq!(3, orderer.len());
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        assert_eq!(
            Err(Error::InvalidArgument),
            SerialIdOrderer::new(&[3, 1, 3])
        );
    }

    #[test]
    fn order_rejects_unknown_or_mismatched_ids() {
        let orderer = SerialIdOrderer::new(&[1, 2]).unwrap();

        assert!(orderer.order(vec![0, 1], &[1, 3]).is_err());
        assert!(orderer.order(vec![0], &[1]).is_err());
        assert!(orderer.order(vec![0, 1], &[2, 2]).is_err());
    }

    #[test]
    fn empty_orderer() {
        let orderer = SerialIdOrderer::new(&[]).unwrap();

        assert!(orderer.is_empty());
        assert_eq!(Vec::<u8>::new(), orderer.order(Vec::new(), &[]).unwrap());
    }
}
