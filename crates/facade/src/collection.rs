//! Collection Iterator Adapter
//!
//! Lazy, forward-only iteration over foreign collections. An enumeration
//! failure is yielded once as `Err` and ends the sequence.

use std::iter::FusedIterator;

use cqg_ports::{ForeignCollection, ForeignEnumerator, GwResult};

pub struct CollectionIter<T> {
    cursor: Option<Box<dyn ForeignEnumerator<T>>>,
    done: bool,
}

impl<T> CollectionIter<T> {
    /// An already exhausted sequence
    pub fn empty() -> Self {
        Self {
            cursor: None,
            done: true,
        }
    }

    /// Rewind to the first item
    pub fn reset(&mut self) -> GwResult<()> {
        if let Some(cursor) = self.cursor.as_mut() {
            cursor.reset()?;
            self.done = false;
        }
        Ok(())
    }
}

/// Start iterating `collection`; `None` yields an empty sequence
pub fn iterate<T, C>(collection: Option<&C>) -> GwResult<CollectionIter<T>>
where
    C: ForeignCollection<T> + ?Sized,
{
    let Some(collection) = collection else {
        return Ok(CollectionIter::empty());
    };

    let mut cursor = collection.new_enum()?;
    cursor.reset()?;

    Ok(CollectionIter {
        cursor: Some(cursor),
        done: false,
    })
}

impl<T> Iterator for CollectionIter<T> {
    type Item = GwResult<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let cursor = self.cursor.as_mut()?;

        match cursor.next() {
            Ok(Some(item)) => Some(Ok(item)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(code) => {
                self.done = true;
                Some(Err(code))
            }
        }
    }
}

impl<T> FusedIterator for CollectionIter<T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use cqg_ports::{GwObject, ResultCode};

    struct Numbers {
        items: Vec<u32>,
        fail_at: Option<usize>,
    }

    impl GwObject for Numbers {}

    struct NumbersCursor {
        items: Vec<u32>,
        fail_at: Option<usize>,
        position: usize,
    }

    impl ForeignEnumerator<u32> for NumbersCursor {
        fn reset(&mut self) -> GwResult<()> {
            self.position = 0;
            Ok(())
        }

        fn next(&mut self) -> GwResult<Option<u32>> {
            if self.fail_at == Some(self.position) {
                return Err(ResultCode::FAIL);
            }
            let item = self.items.get(self.position).copied();
            self.position += 1;
            Ok(item)
        }
    }

    impl ForeignCollection<u32> for Numbers {
        fn count(&self) -> GwResult<usize> {
            Ok(self.items.len())
        }

        fn new_enum(&self) -> GwResult<Box<dyn ForeignEnumerator<u32>>> {
            Ok(Box::new(NumbersCursor {
                items: self.items.clone(),
                fail_at: self.fail_at,
                position: 0,
            }))
        }
    }

    #[test]
    fn test_iterates_all_items() {
        let numbers = Numbers {
            items: vec![1, 2, 3],
            fail_at: None,
        };
        let items: GwResult<Vec<u32>> = iterate(Some(&numbers)).unwrap().collect();
        assert_eq!(items.unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_collection_is_empty() {
        let mut iter = iterate::<u32, Numbers>(None).unwrap();
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_failure_surfaces_then_ends() {
        let numbers = Numbers {
            items: vec![1, 2, 3],
            fail_at: Some(1),
        };
        let mut iter = iterate(Some(&numbers)).unwrap();
        assert_eq!(iter.next(), Some(Ok(1)));
        assert_eq!(iter.next(), Some(Err(ResultCode::FAIL)));
        assert_eq!(iter.next(), None);
    }

    #[test]
    fn test_reset_restarts() {
        let numbers = Numbers {
            items: vec![7],
            fail_at: None,
        };
        let mut iter = iterate(Some(&numbers)).unwrap();
        assert_eq!(iter.next(), Some(Ok(7)));
        assert_eq!(iter.next(), None);

        iter.reset().unwrap();
        assert_eq!(iter.next(), Some(Ok(7)));
    }

    #[test]
    fn test_works_through_trait_objects() {
        let numbers: Box<dyn ForeignCollection<u32>> = Box::new(Numbers {
            items: vec![4, 5],
            fail_at: None,
        });
        let count = iterate::<u32, _>(Some(&*numbers)).unwrap().count();
        assert_eq!(count, 2);
    }
}
