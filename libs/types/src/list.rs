//! Shared List
//!
//! Ordered sequence of [`Value`]s behind shared storage. Every handle cloned
//! from a list observes the same elements; mutators therefore take `&self`.
//! Positions accept negative indices counted from the end (`-1` is the last
//! element).

use crate::convert::{FromArgs, FromValue};
use crate::error::ValueError;
use crate::value::Value;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// Ordered, shared sequence of values
#[derive(Clone, Default)]
pub struct List {
    items: Arc<RwLock<Vec<Value>>>,
}

fn resolve(index: isize, len: usize) -> Option<usize> {
    let position = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    (position < len).then_some(position)
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self::from_values(Vec::with_capacity(capacity))
    }

    /// Take ownership of `values` as the list storage
    pub fn from_values(values: Vec<Value>) -> Self {
        Self {
            items: Arc::new(RwLock::new(values)),
        }
    }

    pub fn size(&self) -> usize {
        self.items.read_recursive().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read_recursive().is_empty()
    }

    pub fn append(&self, value: impl Into<Value>) {
        self.items.write().push(value.into());
    }

    /// Replace the element at `index`; `false` when out of range
    pub fn set(&self, index: isize, value: impl Into<Value>) -> bool {
        let mut items = self.items.write();
        match resolve(index, items.len()) {
            Some(position) => {
                items[position] = value.into();
                true
            }
            None => false,
        }
    }

    /// Insert before `index`; an index equal to the size appends
    pub fn insert(&self, index: isize, value: impl Into<Value>) -> bool {
        let mut items = self.items.write();
        let len = items.len();
        let position = if index >= 0 && index as usize == len {
            Some(len)
        } else {
            resolve(index, len)
        };
        match position {
            Some(position) => {
                items.insert(position, value.into());
                true
            }
            None => false,
        }
    }

    /// Element at `index`, shared with the list for nested containers
    pub fn find(&self, index: isize) -> Option<Value> {
        let items = self.items.read_recursive();
        resolve(index, items.len()).map(|position| items[position].clone())
    }

    /// Truncate or pad with `Null`, returning the new size
    pub fn resize(&self, new_size: usize) -> usize {
        let mut items = self.items.write();
        items.resize(new_size, Value::Null);
        items.len()
    }

    /// Typed extraction of a positional argument
    pub fn get<T: FromValue>(&self, index: usize) -> Result<T, ValueError> {
        let value = self
            .find(index as isize)
            .ok_or(ValueError::InvalidIndex { index })?;
        T::from_value(&value).ok_or(ValueError::InvalidArgumentCast {
            index,
            from: value.type_name(),
            to: T::TYPE.name(),
        })
    }

    /// Check arity and convert every element, e.g. `list.unpack::<(i64, String)>()`
    pub fn unpack<A: FromArgs>(&self) -> Result<A, ValueError> {
        A::from_args(self)
    }

    /// Restartable read-only iteration over the live list
    pub fn iter(&self) -> ListIter {
        ListIter {
            list: self.clone(),
            position: 0,
        }
    }

    /// Shallow snapshot of the current elements
    pub fn to_vec(&self) -> Vec<Value> {
        self.items.read_recursive().clone()
    }

    /// Independent copy of the list and everything nested in it
    pub fn deep_copy(&self) -> List {
        let items = self.items.read_recursive();
        List::from_values(items.iter().map(Value::deep_copy).collect())
    }

    /// Whether both handles point at the same storage
    pub fn ptr_eq(&self, other: &List) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }
}

/// Iterator over a live [`List`]
///
/// Each step reads the element at the current position, so elements appended
/// while iterating are observed. Mutating the list from the consumer of the
/// iterator is not supported.
pub struct ListIter {
    list: List,
    position: usize,
}

impl Iterator for ListIter {
    type Item = Value;

    fn next(&mut self) -> Option<Value> {
        let item = self.list.items.read_recursive().get(self.position).cloned();
        if item.is_some() {
            self.position += 1;
        }
        item
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = Value;
    type IntoIter = ListIter;

    fn into_iter(self) -> ListIter {
        self.iter()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        List::from_values(iter.into_iter().collect())
    }
}

impl From<Vec<Value>> for List {
    fn from(values: Vec<Value>) -> Self {
        List::from_values(values)
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let lhs = self.items.read_recursive();
        let rhs = other.items.read_recursive();
        *lhs == *rhs
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.items.read_recursive().iter()).finish()
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, value) in self.items.read_recursive().iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            fmt::Display::fmt(value, f)?;
        }
        f.write_str("]")
    }
}

/// Build a [`List`] from expressions convertible into [`Value`]
#[macro_export]
macro_rules! list {
    () => {
        $crate::List::new()
    };
    ($($value:expr),+ $(,)?) => {
        $crate::List::from_values(vec![$($crate::Value::from($value)),+])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::list;

    #[test]
    fn test_append_and_size() {
        let list = List::new();
        assert!(list.is_empty());
        list.append(1);
        list.append("two");
        assert_eq!(list.size(), 2);
        assert!(!list.is_empty());
    }

    #[test]
    fn test_find_with_negative_index() {
        let list = list![10, 20, 30];
        assert_eq!(list.find(0), Some(Value::Int(10)));
        assert_eq!(list.find(-1), Some(Value::Int(30)));
        assert_eq!(list.find(-3), Some(Value::Int(10)));
        assert_eq!(list.find(3), None);
        assert_eq!(list.find(-4), None);
    }

    #[test]
    fn test_set_and_insert() {
        let list = list![1, 2, 3];
        assert!(list.set(-1, "last"));
        assert!(!list.set(3, 4));
        assert!(list.insert(0, 0));
        assert!(list.insert(4, "end"));
        assert!(!list.insert(6, "too far"));
        assert_eq!(list.to_vec(), list![0, 1, 2, "last", "end"].to_vec());
    }

    #[test]
    fn test_resize() {
        let list = list![1, 2, 3];
        assert_eq!(list.resize(1), 1);
        assert_eq!(list.resize(3), 3);
        assert_eq!(list.find(2), Some(Value::Null));
    }

    #[test]
    fn test_unpack_arguments() {
        let args = list![100, "alice", 2.5];
        let (amount, name, rate): (i64, String, f64) = args.unpack().unwrap();
        assert_eq!(amount, 100);
        assert_eq!(name, "alice");
        assert_eq!(rate, 2.5);

        let err = args.unpack::<(i64, i64)>().unwrap_err();
        assert_eq!(err.to_string(), "expected 2 arguments but 3 were given");

        let err = args.unpack::<(String, String, f64)>().unwrap_err();
        assert_eq!(err.to_string(), "invalid cast in argument 0 from type Int to String");
    }

    #[test]
    fn test_iteration_is_restartable_and_live() {
        let list = list![1, 2];
        let first: Vec<Value> = list.iter().collect();
        assert_eq!(first.len(), 2);

        let mut iter = list.iter();
        assert_eq!(iter.next(), Some(Value::Int(1)));
        list.append(3);
        assert_eq!(iter.next(), Some(Value::Int(2)));
        assert_eq!(iter.next(), Some(Value::Int(3)));
        assert_eq!(iter.next(), None);

        let sum: i64 = (&list).into_iter().filter_map(|v| v.get::<i64>()).sum();
        assert_eq!(sum, 6);
    }

    #[test]
    fn test_clone_shares_deep_copy_does_not() {
        let inner = list![1];
        let outer = list![inner.clone()];
        let shared = outer.clone();
        let copy = outer.deep_copy();

        inner.append(2);
        assert_eq!(shared.find(0), Some(Value::from(list![1, 2])));
        assert_eq!(copy.find(0), Some(Value::from(list![1])));
        assert!(shared.ptr_eq(&outer));
        assert!(!copy.ptr_eq(&outer));
    }
}
