//! An ordered key-value map implemented with an AVL tree.
//!
//! The tree keeps itself height-balanced with rotations, so lookup,
//! insertion and removal all take O(log n) time. Inserting a key that is
//! already present overwrites the stored value in place.
//!
//! ```
//! use avl_map::AvlTreeMap;
//!
//! let mut map = AvlTreeMap::new();
//! map.insert(2, "two");
//! map.insert(1, "one");
//! map.insert(3, "three");
//! assert_eq!(map.get(&2), Ok(&"two"));
//! assert_eq!(map.values_in_order(), [&"one", &"two", &"three"]);
//!
//! map.remove(&2).unwrap();
//! assert!(map.find(&2).is_none());
//! ```

mod error;
mod map;

pub use error::Error;
pub use map::{AvlTreeMap, Iter, NodeHandle};

#[cfg(test)]
mod proptests;
