use std::{
    collections::BTreeMap,
    fmt,
    ops::{Index, IndexMut},
};

use crate::{Point, Scalar};

/// Stable handle of a node inside an [`Arena`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct NodeId(usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A cover tree node holding one or more points which are all at distance 0 from each other.
#[derive(Clone, Debug)]
pub(crate) struct Node<P> {
    points: Vec<P>,
    // children[i] are the children of this node at level i. They are present in cover set i - 1.
    children: BTreeMap<i32, Vec<NodeId>>,
}

impl<P: Point> Node<P> {
    pub(crate) fn new(point: P) -> Self {
        Self {
            points: vec![point],
            children: BTreeMap::new(),
        }
    }

    /// Returns the children at `level`, or an empty slice.
    pub(crate) fn children_at(&self, level: i32) -> &[NodeId] {
        self.children.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn add_child(&mut self, level: i32, child: NodeId) {
        self.children.entry(level).or_default().push(child);
    }

    /// Removes one reference to `child` at `level`. Ordering among siblings is not preserved.
    pub(crate) fn remove_child(&mut self, level: i32, child: NodeId) -> bool {
        let removed = match self.children.get_mut(&level) {
            Some(v) => match v.iter().position(|&c| c == child) {
                Some(idx) => {
                    v.swap_remove(idx);
                    true
                }
                None => false,
            },
            None => false,
        };

        if self.children.get(&level).is_some_and(Vec::is_empty) {
            self.children.remove(&level);
        }

        removed
    }

    /// Detaches and returns every child at `level`.
    pub(crate) fn take_children(&mut self, level: i32) -> Vec<NodeId> {
        self.children.remove(&level).unwrap_or_default()
    }

    /// Returns the children of the highest level that has any.
    pub(crate) fn top_children(&self) -> Option<(i32, &[NodeId])> {
        self.children
            .iter()
            .next_back()
            .map(|(&level, v)| (level, v.as_slice()))
    }

    /// Children from every level, highest level first.
    pub(crate) fn all_children(&self) -> impl Iterator<Item = (i32, NodeId)> + '_ {
        self.children
            .iter()
            .rev()
            .flat_map(|(&level, v)| v.iter().map(move |&c| (level, c)))
    }

    /// Adds `point` unless an equal point is already stored. Returns whether it was added.
    pub(crate) fn add_point(&mut self, point: P) -> bool {
        if self.has_point(&point) {
            false
        } else {
            self.points.push(point);
            true
        }
    }

    pub(crate) fn remove_point(&mut self, point: &P) -> bool {
        match self.points.iter().position(|q| q == point) {
            Some(idx) => {
                self.points.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn has_point(&self, point: &P) -> bool {
        self.points.iter().any(|q| q == point)
    }

    pub(crate) fn is_single(&self) -> bool {
        self.points.len() == 1
    }

    pub(crate) fn points(&self) -> &[P] {
        &self.points
    }

    pub(crate) fn representative(&self) -> &P {
        &self.points[0]
    }

    pub(crate) fn distance_to(&self, other: &Node<P>) -> Scalar {
        self.representative().distance(other.representative())
    }
}

/// Owner of every node of a tree. Freed slots are recycled.
#[derive(Clone, Debug)]
pub(crate) struct Arena<P> {
    slots: Vec<Option<Node<P>>>,
    free: Vec<usize>,
}

impl<P> Default for Arena<P> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<P> Arena<P> {
    pub(crate) fn alloc(&mut self, node: Node<P>) -> NodeId {
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = Some(node);
                NodeId(idx)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    pub(crate) fn free(&mut self, id: NodeId) -> Option<Node<P>> {
        let node = self.slots.get_mut(id.0).and_then(Option::take);
        if node.is_some() {
            self.free.push(id.0);
        }
        node
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&Node<P>> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    /// Number of live nodes.
    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeId, &Node<P>)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.as_ref().map(|node| (NodeId(idx), node)))
    }
}

impl<P> Index<NodeId> for Arena<P> {
    type Output = Node<P>;

    fn index(&self, id: NodeId) -> &Node<P> {
        match self.slots.get(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling node id {}", id),
        }
    }
}

impl<P> IndexMut<NodeId> for Arena<P> {
    fn index_mut(&mut self, id: NodeId) -> &mut Node<P> {
        match self.slots.get_mut(id.0) {
            Some(Some(node)) => node,
            _ => panic!("dangling node id {}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct Tagged(f64, char);

    impl Point for Tagged {
        fn distance(&self, other: &Self) -> Scalar {
            (self.0 - other.0).abs()
        }
    }

    #[test]
    fn test_node_points() {
        let mut node = Node::new(Tagged(1., 'a'));
        assert!(node.is_single());
        assert!(!node.add_point(Tagged(1., 'a')));
        assert!(node.add_point(Tagged(1., 'b')));
        assert!(!node.is_single());
        assert!(node.has_point(&Tagged(1., 'b')));
        assert_eq!(&Tagged(1., 'a'), node.representative());

        assert!(node.remove_point(&Tagged(1., 'a')));
        assert!(!node.remove_point(&Tagged(1., 'a')));
        assert_eq!(&Tagged(1., 'b'), node.representative());
        assert_eq!(2., node.distance_to(&Node::new(Tagged(3., 'z'))));
    }

    #[test]
    fn test_node_children() {
        let mut arena = Arena::default();
        let a = arena.alloc(Node::new(Tagged(0., 'a')));
        let b = arena.alloc(Node::new(Tagged(1., 'b')));
        let c = arena.alloc(Node::new(Tagged(2., 'c')));

        arena[a].add_child(3, b);
        arena[a].add_child(3, c);
        arena[a].add_child(-1, c);

        assert_eq!(&[b, c], arena[a].children_at(3));
        assert!(arena[a].children_at(2).is_empty());
        assert_eq!(Some((3, &[b, c][..])), arena[a].top_children());
        assert_eq!(
            vec![(3, b), (3, c), (-1, c)],
            arena[a].all_children().collect::<Vec<_>>()
        );

        assert!(arena[a].remove_child(3, b));
        assert!(!arena[a].remove_child(3, b));
        assert_eq!(&[c], arena[a].children_at(3));
        assert!(arena[a].remove_child(-1, c));
        assert_eq!(Some((3, &[c][..])), arena[a].top_children());

        assert_eq!(vec![c], arena[a].take_children(3));
        assert!(arena[a].take_children(3).is_empty());
        assert_eq!(None, arena[a].top_children());
    }

    #[test]
    fn test_arena_reuses_slots() {
        let mut arena = Arena::default();
        let a = arena.alloc(Node::new(Tagged(0., 'a')));
        let b = arena.alloc(Node::new(Tagged(1., 'b')));
        assert_eq!(2, arena.len());

        assert!(arena.free(a).is_some());
        assert!(arena.free(a).is_none());
        assert!(arena.get(a).is_none());
        assert_eq!(1, arena.len());

        let c = arena.alloc(Node::new(Tagged(2., 'c')));
        assert_eq!(a, c);
        assert_eq!(&Tagged(2., 'c'), arena[c].representative());
        assert_eq!(vec![c, b], arena.iter().map(|(id, _)| id).collect::<Vec<_>>());
    }
}
