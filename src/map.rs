use std::cmp::{self, Ordering};
use std::fmt;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::Error;

/// An ordered key-value map implemented with an AVL tree.
///
/// Keys are unique; inserting an existing key overwrites the stored value
/// in place.
pub struct AvlTreeMap<K: Ord, V> {
    root: Link<K, V>,
    num_nodes: usize,
}

struct Node<K, V> {
    key: K,
    value: V,
    left: Link<K, V>,
    right: Link<K, V>,
    parent: Link<K, V>,
    height: isize,
}

type NodePtr<K, V> = NonNull<Node<K, V>>;
type Link<K, V> = Option<NodePtr<K, V>>;

/// An opaque handle to an entry of an [`AvlTreeMap`].
///
/// Handles are returned by [`AvlTreeMap::insert`] and [`AvlTreeMap::find`]
/// and stay valid until the entry they refer to is removed or the map is
/// cleared or dropped.
pub struct NodeHandle<K, V> {
    node: NodePtr<K, V>,
}

/// An iterator over the key-value pairs of a map in ascending key order.
pub struct Iter<'a, K, V> {
    next: Link<K, V>,
    marker: PhantomData<&'a Node<K, V>>,
}

/// Result of a tree search: either the node holding the key, or the node an
/// insert would attach a new child to (`None` when the tree is empty).
enum SearchResult<K, V> {
    Found(NodePtr<K, V>),
    InsertionPoint(Link<K, V>),
}

#[allow(clippy::enum_variant_names)]
enum Direction {
    FromParent,
    FromLeft,
    FromRight,
}

impl<K: Ord, V> AvlTreeMap<K, V> {
    /// Creates an empty map.
    /// No memory is allocated until the first item is inserted.
    pub fn new() -> Self {
        Self {
            root: None,
            num_nodes: 0,
        }
    }

    /// Returns true if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.num_nodes
    }

    #[cfg(test)]
    pub fn height(&self) -> isize {
        Node::height_of(self.root)
    }

    /// Clears the map, deallocating all memory.
    pub fn clear(&mut self) {
        self.postorder(|node_ptr| unsafe {
            Node::destroy(node_ptr);
        });
        self.root = None;
        self.num_nodes = 0;
    }

    /// Returns a reference to the value corresponding to the key.
    /// Fails with [`Error::KeyNotFound`] if the key is not in the map.
    pub fn get(&self, key: &K) -> Result<&V, Error> {
        match self.find_node(key) {
            SearchResult::Found(node_ptr) => Ok(&unsafe { &*node_ptr.as_ptr() }.value),
            SearchResult::InsertionPoint(_) => Err(Error::KeyNotFound),
        }
    }

    /// Looks up the key and returns a handle to its entry if present.
    pub fn find(&self, key: &K) -> Option<NodeHandle<K, V>> {
        match self.find_node(key) {
            SearchResult::Found(node_ptr) => Some(NodeHandle { node: node_ptr }),
            SearchResult::InsertionPoint(_) => None,
        }
    }

    /// Returns references to the key-value pair behind a handle.
    ///
    /// # Safety
    ///
    /// `handle` must have been obtained from this map and its entry must not
    /// have been removed since.
    pub unsafe fn key_value(&self, handle: NodeHandle<K, V>) -> (&K, &V) {
        let node = &*handle.node.as_ptr();
        (&node.key, &node.value)
    }

    /// Inserts a key-value pair into the map and returns a handle to its
    /// node. If the key is already present, the stored value is overwritten
    /// in place and the size does not change.
    pub fn insert(&mut self, key: K, value: V) -> NodeHandle<K, V> {
        match self.find_node(&key) {
            SearchResult::Found(mut node_ptr) => {
                unsafe {
                    node_ptr.as_mut().value = value;
                }
                NodeHandle { node: node_ptr }
            }
            SearchResult::InsertionPoint(None) => {
                let node_ptr = Node::create(None, key, value);
                self.root = Some(node_ptr);
                self.num_nodes = 1;
                NodeHandle { node: node_ptr }
            }
            SearchResult::InsertionPoint(Some(attach_ptr)) => {
                let node_ptr = unsafe {
                    let goes_left = key < attach_ptr.as_ref().key;
                    let node_ptr = Node::create(Some(attach_ptr), key, value);
                    if goes_left {
                        Node::set_left(attach_ptr, Some(node_ptr));
                    } else {
                        Node::set_right(attach_ptr, Some(node_ptr));
                    }
                    Node::update_height(attach_ptr);
                    node_ptr
                };
                self.num_nodes += 1;
                // The new leaf and its parent are in order; an imbalance can
                // first show up at the grandparent.
                let start = unsafe { attach_ptr.as_ref().parent };
                self.check_balance(start);
                NodeHandle { node: node_ptr }
            }
        }
    }

    /// Removes a key from the map and returns the value that was stored at
    /// it. Fails with [`Error::KeyNotFound`] if the key is not in the map.
    pub fn remove(&mut self, key: &K) -> Result<V, Error> {
        match self.find_node(key) {
            SearchResult::Found(node_ptr) => {
                debug_assert!(self.num_nodes >= 1);
                let value = self.remove_node(node_ptr);
                debug_assert!(self.find(key).is_none());
                Ok(value)
            }
            SearchResult::InsertionPoint(_) => Err(Error::KeyNotFound),
        }
    }

    /// Removes the entry behind a handle and returns its value.
    /// Fails with [`Error::InvalidInput`] if no handle is given.
    ///
    /// The node is re-resolved by its key before unlinking, so removal takes
    /// the same path as [`remove`](Self::remove).
    ///
    /// # Safety
    ///
    /// A present `handle` must have been obtained from this map and its
    /// entry must not have been removed since.
    pub unsafe fn remove_by_handle(
        &mut self,
        handle: Option<NodeHandle<K, V>>,
    ) -> Result<V, Error> {
        let handle = handle.ok_or(Error::InvalidInput)?;
        let key = &(*handle.node.as_ptr()).key;
        match self.find_node(key) {
            SearchResult::Found(node_ptr) => Ok(self.remove_node(node_ptr)),
            SearchResult::InsertionPoint(_) => Err(Error::KeyNotFound),
        }
    }

    /// Collects references to all values in ascending key order.
    pub fn values_in_order(&self) -> Vec<&V> {
        let mut values = Vec::with_capacity(self.num_nodes);
        self.traverse(
            |_| {},
            |node_ptr| values.push(&unsafe { &*node_ptr.as_ptr() }.value),
            |_| {},
        );
        values
    }

    /// Gets an iterator over the key-value pairs of the map in ascending
    /// key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            next: self.root.map(Node::leftmost),
            marker: PhantomData,
        }
    }

    /// Asserts that the internal tree structure is consistent.
    #[cfg(any(test, feature = "consistency_check"))]
    pub fn check_consistency(&self) {
        unsafe {
            // Check root link
            if let Some(root_ptr) = self.root {
                assert!(root_ptr.as_ref().parent.is_none());
            }

            // Check tree nodes
            let mut num_nodes = 0;
            self.preorder(|node_ptr| {
                let node = node_ptr.as_ref();
                let mut left_height = -1;
                let mut right_height = -1;

                // Check link to left child node
                if let Some(left_ptr) = node.left {
                    assert!(left_ptr.as_ref().parent == Some(node_ptr));
                    assert!(left_ptr.as_ref().key < node.key);
                    left_height = left_ptr.as_ref().height;
                }

                // Check link to right child node
                if let Some(right_ptr) = node.right {
                    assert!(right_ptr.as_ref().parent == Some(node_ptr));
                    assert!(right_ptr.as_ref().key > node.key);
                    right_height = right_ptr.as_ref().height;
                }

                // Check height formula and AVL condition
                assert_eq!(node.height, 1 + cmp::max(left_height, right_height));
                assert!((left_height - right_height).abs() <= 1);

                num_nodes += 1;
            });

            // Check number of nodes
            assert_eq!(num_nodes, self.num_nodes);
        }
    }

    fn find_node(&self, key: &K) -> SearchResult<K, V> {
        let mut current = match self.root {
            Some(root_ptr) => root_ptr,
            None => return SearchResult::InsertionPoint(None),
        };
        loop {
            current = unsafe {
                match key.cmp(&current.as_ref().key) {
                    Ordering::Equal => return SearchResult::Found(current),
                    Ordering::Less => match current.as_ref().left {
                        Some(left_ptr) => left_ptr,
                        None => return SearchResult::InsertionPoint(Some(current)),
                    },
                    Ordering::Greater => match current.as_ref().right {
                        Some(right_ptr) => right_ptr,
                        None => return SearchResult::InsertionPoint(Some(current)),
                    },
                }
            };
        }
    }

    /// Unlinks the node from the tree, destroys it and restores balance.
    /// Returns the value that was stored at the node.
    fn remove_node(&mut self, node_ptr: NodePtr<K, V>) -> V {
        let rebalance_from = match Node::num_children(node_ptr) {
            0 => self.detach_leaf(node_ptr),
            1 => self.splice_out(node_ptr),
            _ => self.remove_inner(node_ptr),
        };
        let value = unsafe { Node::destroy(node_ptr) };
        self.num_nodes -= 1;
        self.check_balance(rebalance_from);
        value
    }

    /// Detaches a node without children from its parent.
    /// Returns the old parent as the point to rebalance from.
    fn detach_leaf(&mut self, node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe {
            debug_assert!(Node::num_children(node_ptr) == 0);
            match node_ptr.as_ref().parent {
                None => {
                    self.root = None;
                    None
                }
                Some(mut parent_ptr) => {
                    if Node::is_right_child(node_ptr) {
                        parent_ptr.as_mut().right = None;
                    } else {
                        parent_ptr.as_mut().left = None;
                    }
                    Some(parent_ptr)
                }
            }
        }
    }

    /// Splices the sole child of a node into the node's position.
    /// Returns the old parent as the point to rebalance from.
    fn splice_out(&mut self, node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe {
            debug_assert!(Node::num_children(node_ptr) == 1);
            let child_ptr = node_ptr.as_ref().right.or(node_ptr.as_ref().left).unwrap();
            let parent = node_ptr.as_ref().parent;
            self.replace_in_parent(node_ptr, child_ptr);
            parent
        }
    }

    /// Removes a node with two children by relocating its in-order
    /// successor, then unlinking the node via the 0/1-child paths.
    fn remove_inner(&mut self, node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe {
            let right_ptr = node_ptr.as_ref().right.unwrap();
            if right_ptr.as_ref().left.is_none() {
                // Successor is the direct right child; a full position swap
                // would only shuffle the same links twice.
                self.promote_right_child(node_ptr, right_ptr);
            } else {
                self.swap_with_successor(node_ptr, Node::leftmost(right_ptr));
            }
            // The node now holds at most the one child it inherited from
            // the successor's old position.
            match Node::num_children(node_ptr) {
                0 => self.detach_leaf(node_ptr),
                _ => self.splice_out(node_ptr),
            }
        }
    }

    /// Short-circuit splice for a successor that is the removed node's
    /// direct right child: the successor takes the node's position and
    /// absorbs its left subtree, the successor's own right subtree is
    /// re-homed as the node's new right child, and the node stays linked as
    /// the successor's right child until the 0/1-child removal detaches it.
    fn promote_right_child(&mut self, mut node_ptr: NodePtr<K, V>, successor: NodePtr<K, V>) {
        unsafe {
            debug_assert!(node_ptr.as_ref().right == Some(successor));
            Node::set_left(successor, node_ptr.as_ref().left);
            self.replace_in_parent(node_ptr, successor);
            node_ptr.as_mut().left = None;
            Node::set_right(node_ptr, successor.as_ref().right);
            Node::set_right(successor, Some(node_ptr));
        }
    }

    /// Exchanges the positions (parents, children and heights) of a node
    /// and its deeper in-order successor. The successor is the leftmost
    /// node of the right subtree, so it is its parent's left child and has
    /// no left child of its own.
    fn swap_with_successor(&mut self, mut node_ptr: NodePtr<K, V>, mut successor: NodePtr<K, V>) {
        unsafe {
            debug_assert!(successor.as_ref().left.is_none());
            let successor_parent = successor.as_ref().parent.unwrap();
            let successor_right = successor.as_ref().right;
            let successor_height = successor.as_ref().height;

            self.replace_in_parent(node_ptr, successor);
            Node::set_left(successor, node_ptr.as_ref().left);
            Node::set_right(successor, node_ptr.as_ref().right);
            successor.as_mut().height = node_ptr.as_ref().height;

            Node::set_left(successor_parent, Some(node_ptr));
            node_ptr.as_mut().left = None;
            Node::set_right(node_ptr, successor_right);
            node_ptr.as_mut().height = successor_height;
        }
    }

    /// Puts `replacement` into `source`'s place below its parent, or into
    /// the root slot if `source` is the root.
    fn replace_in_parent(&mut self, source: NodePtr<K, V>, mut replacement: NodePtr<K, V>) {
        unsafe {
            match source.as_ref().parent {
                Some(parent_ptr) => {
                    if Node::is_right_child(source) {
                        Node::set_right(parent_ptr, Some(replacement));
                    } else {
                        Node::set_left(parent_ptr, Some(replacement));
                    }
                }
                None => {
                    replacement.as_mut().parent = None;
                    self.root = Some(replacement);
                }
            }
        }
    }

    /// Walks from the given position up to the root restoring the AVL
    /// condition. Balanced nodes get their height refreshed; a node with
    /// balance factor +2 or -2 is rotated, with the variant chosen by the
    /// taller child's balance factor. The walk stops early when a rotation
    /// leaves the local subtree at the height the unbalanced node had
    /// before, since nothing above can have changed then. A single insert
    /// needs at most one rotation; a removal may rotate once per level.
    fn check_balance(&mut self, start_from: Link<K, V>) {
        let mut current = start_from;
        while let Some(node_ptr) = current {
            unsafe {
                if Node::is_balanced(node_ptr) {
                    Node::update_height(node_ptr);
                    current = node_ptr.as_ref().parent;
                    continue;
                }
                let height_before = node_ptr.as_ref().height;
                let local_root = if Node::balance_factor(node_ptr) == 2 {
                    let left_ptr = node_ptr.as_ref().left.unwrap();
                    if Node::balance_factor(left_ptr) >= 0 {
                        self.rotate_ll(node_ptr)
                    } else {
                        self.rotate_lr(node_ptr)
                    }
                } else {
                    debug_assert_eq!(Node::balance_factor(node_ptr), -2);
                    let right_ptr = node_ptr.as_ref().right.unwrap();
                    if Node::balance_factor(right_ptr) == 1 {
                        self.rotate_rl(node_ptr)
                    } else {
                        self.rotate_rr(node_ptr)
                    }
                };
                if local_root.as_ref().height == height_before {
                    break;
                }
                current = local_root.as_ref().parent;
            }
        }
    }

    /// Single right rotation: the left child takes the unbalanced node's
    /// position. Returns the new local subtree root.
    fn rotate_ll(&mut self, node_b: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let node_a = node_b.as_ref().left.unwrap();
            Node::set_left(node_b, node_a.as_ref().right);
            self.replace_in_parent(node_b, node_a);
            Node::set_right(node_a, Some(node_b));
            Node::update_height(node_b);
            Node::update_height(node_a);
            node_a
        }
    }

    /// Single left rotation, mirror of [`rotate_ll`](Self::rotate_ll).
    fn rotate_rr(&mut self, node_b: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let node_a = node_b.as_ref().right.unwrap();
            Node::set_right(node_b, node_a.as_ref().left);
            self.replace_in_parent(node_b, node_a);
            Node::set_left(node_a, Some(node_b));
            Node::update_height(node_b);
            Node::update_height(node_a);
            node_a
        }
    }

    /// Double rotation for a left child that is right-heavy: the left
    /// child's right child takes the unbalanced node's position. Heights
    /// are recomputed bottom-up. Returns the new local subtree root.
    fn rotate_lr(&mut self, node_c: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let node_a = node_c.as_ref().left.unwrap();
            let node_d = node_a.as_ref().right.unwrap();
            Node::set_left(node_c, node_d.as_ref().right);
            Node::set_right(node_a, node_d.as_ref().left);
            self.replace_in_parent(node_c, node_d);
            Node::set_left(node_d, Some(node_a));
            Node::set_right(node_d, Some(node_c));
            Node::update_height(node_a);
            Node::update_height(node_c);
            Node::update_height(node_d);
            node_d
        }
    }

    /// Double rotation, mirror of [`rotate_lr`](Self::rotate_lr).
    fn rotate_rl(&mut self, node_c: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            let node_a = node_c.as_ref().right.unwrap();
            let node_d = node_a.as_ref().left.unwrap();
            Node::set_right(node_c, node_d.as_ref().left);
            Node::set_left(node_a, node_d.as_ref().right);
            self.replace_in_parent(node_c, node_d);
            Node::set_left(node_d, Some(node_c));
            Node::set_right(node_d, Some(node_a));
            Node::update_height(node_a);
            Node::update_height(node_c);
            Node::update_height(node_d);
            node_d
        }
    }

    #[cfg(any(test, feature = "consistency_check"))]
    fn preorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(f, |_| {}, |_| {});
    }

    fn postorder<F: FnMut(NodePtr<K, V>)>(&self, f: F) {
        self.traverse(|_| {}, |_| {}, f);
    }

    fn traverse<Pre, In, Post>(&self, mut preorder: Pre, mut inorder: In, mut postorder: Post)
    where
        Pre: FnMut(NodePtr<K, V>),
        In: FnMut(NodePtr<K, V>),
        Post: FnMut(NodePtr<K, V>),
    {
        if let Some(mut node_ptr) = self.root {
            let mut dir = Direction::FromParent;
            loop {
                match dir {
                    Direction::FromParent => {
                        preorder(node_ptr);
                        if let Some(left_ptr) = unsafe { node_ptr.as_ref().left } {
                            node_ptr = left_ptr;
                        } else {
                            dir = Direction::FromLeft;
                        }
                    }
                    Direction::FromLeft => {
                        inorder(node_ptr);
                        if let Some(right_ptr) = unsafe { node_ptr.as_ref().right } {
                            node_ptr = right_ptr;
                            dir = Direction::FromParent;
                        } else {
                            dir = Direction::FromRight;
                        }
                    }
                    Direction::FromRight => {
                        // Post order traversal is used for node deletion,
                        // so make sure not to use node pointer after postorder call.
                        if let Some(parent_ptr) = unsafe { node_ptr.as_ref().parent } {
                            if Some(node_ptr) == unsafe { parent_ptr.as_ref().left } {
                                dir = Direction::FromLeft;
                            } else {
                                dir = Direction::FromRight;
                            }
                            postorder(node_ptr);
                            node_ptr = parent_ptr;
                        } else {
                            postorder(node_ptr);
                            break;
                        }
                    }
                }
            }
        }
    }
}

impl<K: Ord, V> Drop for AvlTreeMap<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<K: Ord, V> Default for AvlTreeMap<K, V> {
    /// Creates an empty map.
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V: Clone> Clone for AvlTreeMap<K, V> {
    fn clone(&self) -> Self {
        let mut map = Self::new();
        for (key, value) in self.iter() {
            map.insert(key.clone(), value.clone());
        }
        map
    }
}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for AvlTreeMap<K, V> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Ord, V> FromIterator<(K, V)> for AvlTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        map.extend(iter);
        map
    }
}

impl<K: Ord, V> Extend<(K, V)> for AvlTreeMap<K, V> {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a AvlTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V> Clone for NodeHandle<K, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V> Copy for NodeHandle<K, V> {}

impl<K, V> PartialEq for NodeHandle<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<K, V> Eq for NodeHandle<K, V> {}

impl<K, V> fmt::Debug for NodeHandle<K, V> {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_tuple("NodeHandle").field(&self.node).finish()
    }
}

// Auto derived clone would get an unwanted type bound on K and V
impl<'a, K, V> Clone for Iter<'a, K, V> {
    fn clone(&self) -> Self {
        Self {
            next: self.next,
            marker: PhantomData,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);
    fn next(&mut self) -> Option<Self::Item> {
        let node_ptr = self.next?;
        let node = unsafe { &*node_ptr.as_ptr() };
        self.next = Node::next_in_order(node_ptr);
        Some((&node.key, &node.value))
    }
}

impl<K, V> Node<K, V> {
    fn create(parent: Link<K, V>, key: K, value: V) -> NodePtr<K, V> {
        let boxed = Box::new(Node {
            key,
            value,
            parent,
            left: None,
            right: None,
            height: 0,
        });
        unsafe { NodePtr::new_unchecked(Box::into_raw(boxed)) }
    }

    unsafe fn destroy(node_ptr: NodePtr<K, V>) -> V {
        Box::from_raw(node_ptr.as_ptr()).value
    }

    // Height of a possibly absent subtree; a missing child counts as -1 so
    // that a leaf has height 0.
    fn height_of(link: Link<K, V>) -> isize {
        match link {
            None => -1,
            Some(node_ptr) => unsafe { node_ptr.as_ref().height },
        }
    }

    fn update_height(mut node_ptr: NodePtr<K, V>) {
        unsafe {
            node_ptr.as_mut().height = 1 + cmp::max(
                Self::height_of(node_ptr.as_ref().left),
                Self::height_of(node_ptr.as_ref().right),
            );
        }
    }

    fn balance_factor(node_ptr: NodePtr<K, V>) -> isize {
        unsafe {
            Self::height_of(node_ptr.as_ref().left) - Self::height_of(node_ptr.as_ref().right)
        }
    }

    fn is_balanced(node_ptr: NodePtr<K, V>) -> bool {
        Self::balance_factor(node_ptr).abs() <= 1
    }

    fn is_right_child(node_ptr: NodePtr<K, V>) -> bool {
        unsafe {
            match node_ptr.as_ref().parent {
                Some(parent_ptr) => parent_ptr.as_ref().right == Some(node_ptr),
                None => false,
            }
        }
    }

    fn num_children(node_ptr: NodePtr<K, V>) -> usize {
        unsafe {
            let node = node_ptr.as_ref();
            usize::from(node.left.is_some()) + usize::from(node.right.is_some())
        }
    }

    // Storing a child also points its parent link back here. Storing None
    // leaves the old child's parent untouched; callers detach explicitly.
    fn set_left(mut node_ptr: NodePtr<K, V>, child: Link<K, V>) {
        unsafe {
            node_ptr.as_mut().left = child;
            if let Some(mut child_ptr) = child {
                child_ptr.as_mut().parent = Some(node_ptr);
            }
        }
    }

    fn set_right(mut node_ptr: NodePtr<K, V>, child: Link<K, V>) {
        unsafe {
            node_ptr.as_mut().right = child;
            if let Some(mut child_ptr) = child {
                child_ptr.as_mut().parent = Some(node_ptr);
            }
        }
    }

    fn leftmost(mut node_ptr: NodePtr<K, V>) -> NodePtr<K, V> {
        unsafe {
            while let Some(left_ptr) = node_ptr.as_ref().left {
                node_ptr = left_ptr;
            }
        }
        node_ptr
    }

    fn next_in_order(node_ptr: NodePtr<K, V>) -> Link<K, V> {
        unsafe {
            if let Some(right_ptr) = node_ptr.as_ref().right {
                return Some(Self::leftmost(right_ptr));
            }
            let mut current = node_ptr;
            while let Some(parent_ptr) = current.as_ref().parent {
                if !Self::is_right_child(current) {
                    return Some(parent_ptr);
                }
                current = parent_ptr;
            }
            None
        }
    }
}
