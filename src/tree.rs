use std::{
    collections::{BTreeMap, HashSet, VecDeque},
    fmt,
    iter::FromIterator,
};

use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tracing::{debug, trace};

use crate::node::{Arena, Node, NodeId};
use crate::{CoverTreeError, Point, Result, Scalar};

const DEFAULT_BASE: Scalar = 2.;

/// A node paired with its distance to the point being inserted, removed or queried.
type DistNode = (Scalar, NodeId);

/// Query result containing k-nearest neighbours to a query point.
#[derive(Debug)]
pub struct QueryResult<P> {
    query_index: usize,
    neighbours: VecDeque<Neighbour<P>>,
}

impl<P> Default for QueryResult<P> {
    fn default() -> Self {
        Self {
            query_index: 0,
            neighbours: VecDeque::new(),
        }
    }
}

impl<P> QueryResult<P> {
    pub(crate) fn new(index: usize, neighbours: VecDeque<Neighbour<P>>) -> Self {
        Self {
            query_index: index,
            neighbours,
        }
    }

    /// Returns the query index from batch query for this result.
    pub fn index(&self) -> usize {
        self.query_index
    }

    /// Sets the query index.
    pub fn set_index(&mut self, query_index: usize) {
        self.query_index = query_index;
    }

    /// Returns the nearest neighbours of a query, closest first.
    pub fn neighbours(&self) -> &VecDeque<Neighbour<P>> {
        &self.neighbours
    }

    /// Consumes ```self``` and returns the query index and the nearest neighbours of that query.
    pub fn take(self) -> (usize, VecDeque<Neighbour<P>>) {
        (self.query_index, self.neighbours)
    }
}

/// A neighbour resulted from a k-nearest neighbour search.
#[derive(Clone, Debug, PartialEq)]
pub struct Neighbour<P> {
    point: P,
    dist: Scalar,
}

impl<P> Neighbour<P> {
    /// Returns the stored point.
    pub fn point(&self) -> &P {
        &self.point
    }

    /// Returns the distance for a neighbour to a query point.
    pub fn dist(&self) -> Scalar {
        self.dist
    }

    /// Consumes the neighbour and returns the stored point.
    pub fn into_point(self) -> P {
        self.point
    }
}

/// A dynamic cover tree over an arbitrary metric space.
///
/// Level `i` of the tree is associated with the distance `base^i`. Nodes present at level `i`
/// are more than `base^i` apart from each other (separation) and every child a node gains at
/// level `i` lies within `base^i` of it (covering). Insertion, removal and k-nearest neighbour
/// search all walk the tree level by level over "cover sets" of candidate nodes.
///
/// Points at distance 0 from each other share a node, so a tree may hold several unequal points
/// which are indistinguishable by the metric.
#[derive(Clone, Debug)]
pub struct CoverTree<P> {
    base: Scalar,
    // base^max_level bounds the distance from the root to every stored point.
    max_level: i32,
    // No node has children at or below min_level.
    min_level: i32,
    root: Option<NodeId>,
    num_nodes: usize,
    nodes: Arena<P>,
}

/// Bookkeeping shared by the frames of a removal.
struct Removal {
    cover_sets: BTreeMap<i32, Vec<DistNode>>,
    // Level the descent started at; the apex nodes are present at every level above it.
    top: i32,
    apex: Vec<DistNode>,
    // Set once a point was stripped from a node that holds several points.
    multi: bool,
    removed: bool,
}

impl<P: Point> CoverTree<P> {
    /// Creates a tree with the default base of 2 and inserts all `points`.
    ///
    /// `max_distance` should bound the distance between any two points that will ever be
    /// inserted. Points further away from the root are still accepted; the tree grows new levels
    /// on top instead.
    pub fn new<I>(max_distance: Scalar, points: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
    {
        CoverTreeBuilder::new()
            .max_distance(max_distance)
            .build(points)
    }

    fn empty(base: Scalar, max_distance: Scalar) -> Self {
        let max_level = level_for(base, max_distance);

        Self {
            base,
            max_level,
            min_level: max_level - 1,
            root: None,
            num_nodes: 0,
            nodes: Arena::default(),
        }
    }

    /// Inserts a point to a tree.
    ///
    /// A point at distance 0 from an existing node is absorbed into that node (and dropped if an
    /// equal point is already stored). Returns `true` if a new node was created.
    pub fn insert(&mut self, point: P) -> Result<bool> {
        let root = match self.root {
            Some(root) => root,
            None => {
                let root = self.nodes.alloc(Node::new(point));
                trace!(node = %root, "created root node");
                self.root = Some(root);
                self.num_nodes = 1;
                return Ok(true);
            }
        };

        let d_root = point.distance(self.nodes[root].representative());
        if !d_root.is_finite() {
            return Err(CoverTreeError::NonFiniteDistance { distance: d_root });
        }

        if let Some(&(dist, nearest)) = self.k_nearest_nodes(&point, 1).first() {
            if dist == 0. {
                let added = self.nodes[nearest].add_point(point);
                trace!(node = %nearest, added, "absorbed point into existing node");
                return Ok(false);
            }
        }

        self.rebound(d_root);

        // No node is at distance 0 from the point at this stage.
        if !self.attach(&point, d_root, root) {
            return Err(CoverTreeError::Unplaceable {
                level: self.max_level,
            });
        }

        Ok(true)
    }

    /// Raises `max_level` until `base^max_level` covers `dist`.
    fn rebound(&mut self, dist: Scalar) {
        if dist <= self.sep(self.max_level) {
            return;
        }

        let level = level_for(self.base, dist);
        debug!(from = self.max_level, to = level, dist, "raising max level");
        self.max_level = level;
    }

    /// Walks down from `max_level` while some cover set member is within reach, then attaches
    /// the point below the closest member of the lowest level that covers it. Returns `false` if
    /// no level could take the point.
    fn attach(&mut self, point: &P, d_root: Scalar, root: NodeId) -> bool {
        let mut qi: Vec<DistNode> = vec![(d_root, root)];
        let mut candidates = Vec::new();
        let mut level = self.max_level;

        loop {
            let sep = self.sep(level);
            let mut min_dist = Scalar::MAX;
            let mut min_qi: Option<DistNode> = None;
            let mut qj = Vec::with_capacity(qi.len());

            for &(dist, id) in &qi {
                if min_qi.is_none_or(|(d, _)| dist < d) {
                    min_qi = Some((dist, id));
                }

                min_dist = min_dist.min(dist);
                if dist <= sep {
                    qj.push((dist, id));
                }

                for &child in self.nodes[id].children_at(level) {
                    let d = point.distance(self.nodes[child].representative());
                    min_dist = min_dist.min(d);
                    if d <= sep {
                        qj.push((d, child));
                    }
                }
            }

            if min_dist > sep {
                break;
            }

            candidates.push((level, min_qi));
            qi = qj;
            level -= 1;
        }

        for (level, min_qi) in candidates.into_iter().rev() {
            match min_qi {
                Some((dist, parent)) if dist <= self.sep(level) => {
                    let child = self.nodes.alloc(Node::new(point.clone()));
                    self.nodes[parent].add_child(level, child);
                    self.min_level = self.min_level.min(level - 1);
                    self.num_nodes += 1;
                    trace!(node = %child, parent = %parent, level, "attached new node");
                    return true;
                }
                _ => {}
            }
        }

        false
    }

    /// Removes one point equal to `point` from a tree. Returns `false` if no such point is stored.
    pub fn remove(&mut self, point: &P) -> Result<bool> {
        let root = match self.root {
            Some(root) => root,
            None => return Ok(false),
        };

        let removing_root = self.nodes[root].has_point(point);
        if removing_root && !self.nodes[root].is_single() {
            return Ok(self.nodes[root].remove_point(point));
        }

        // The root is replaced by its child from the highest level. Starting one level above the
        // top makes the root's children at max_level orphans like any other.
        let new_root = if removing_root {
            let highest = self.nodes[root]
                .top_children()
                .and_then(|(level, children)| children.last().map(|&c| (level, c)));

            match highest {
                Some((level, child)) => {
                    self.nodes[root].remove_child(level, child);
                    Some(child)
                }
                None => {
                    self.nodes.free(root);
                    self.root = None;
                    self.num_nodes = 0;
                    trace!(node = %root, "removed last node");
                    return Ok(true);
                }
            }
        } else {
            None
        };

        let top = if new_root.is_some() {
            self.max_level + 1
        } else {
            self.max_level
        };

        let apex = match new_root {
            Some(new_root) => (self.distance(point, new_root), new_root),
            None => (self.distance(point, root), root),
        };

        let mut top_set = vec![(self.distance(point, root), root)];
        if new_root.is_some() {
            top_set.push(apex);
        }

        let mut ctx = Removal {
            cover_sets: BTreeMap::new(),
            top,
            apex: vec![apex],
            multi: false,
            removed: false,
        };
        ctx.cover_sets.insert(top, top_set);

        self.descend(point, &mut ctx, top)?;

        match new_root {
            Some(new_root) => {
                self.nodes.free(root);
                self.num_nodes -= 1;
                self.root = Some(new_root);
                debug!(old = %root, new = %new_root, "promoted child to root");
                Ok(true)
            }
            None => Ok(ctx.removed),
        }
    }

    /// Builds the cover sets from `top` down to `min_level`, then detaches the node holding
    /// `point` on the way back up, re-parenting its children one level at a time.
    fn descend(&mut self, point: &P, ctx: &mut Removal, top: i32) -> Result<()> {
        let mut frames = Vec::new();
        let mut level = top;

        loop {
            let sep = self.sep(level);
            let qi = ctx.cover_sets.get(&level).cloned().unwrap_or_default();
            let mut qj = Vec::with_capacity(qi.len());
            let mut min_node: Option<DistNode> = None;
            let mut parent = None;

            for &(dist, id) in &qi {
                if min_node.is_none_or(|(d, _)| dist < d) {
                    min_node = Some((dist, id));
                }

                if dist <= sep {
                    qj.push((dist, id));
                }

                for &child in self.nodes[id].children_at(level) {
                    let d = point.distance(self.nodes[child].representative());
                    if min_node.is_none_or(|(m, _)| d < m) {
                        min_node = Some((d, child));
                        if d == 0. {
                            parent = Some(id);
                        }
                    }

                    if d <= sep {
                        qj.push((d, child));
                    }
                }
            }

            ctx.cover_sets.entry(level - 1).or_default().extend(qj);
            frames.push((level, min_node, parent));

            if level <= self.min_level {
                break;
            }
            level -= 1;
        }

        for (level, min_node, parent) in frames.into_iter().rev() {
            if let Some((_, target)) = min_node {
                self.detach(point, ctx, level, target, parent)?;
            }
        }

        Ok(())
    }

    /// Strips `point` from `target` if it is shared, otherwise unlinks `target` from `parent`
    /// and re-parents its children at `level - 1`.
    fn detach(
        &mut self,
        point: &P,
        ctx: &mut Removal,
        level: i32,
        target: NodeId,
        parent: Option<NodeId>,
    ) -> Result<()> {
        match self.nodes.get(target) {
            Some(node) if node.has_point(point) => {}
            _ => return Ok(()),
        }

        if ctx.multi {
            return Ok(());
        }

        if !self.nodes[target].is_single() {
            self.nodes[target].remove_point(point);
            trace!(node = %target, "removed point from shared node");
            ctx.multi = true;
            ctx.removed = true;
            return Ok(());
        }

        if let Some(parent) = parent {
            self.nodes[parent].remove_child(level, target);
        }

        for set in ctx.cover_sets.values_mut() {
            set.retain(|&(_, id)| id != target);
        }
        ctx.apex.retain(|&(_, id)| id != target);

        let orphans = self.nodes[target].take_children(level - 1);
        for orphan in orphans {
            self.reparent(point, orphan, ctx, level - 1)?;
        }

        if parent.is_some() {
            self.nodes.free(target);
            self.num_nodes -= 1;
            ctx.removed = true;
            trace!(node = %target, level, "removed node");
        }

        Ok(())
    }

    /// Attaches `orphan` below the closest cover set member within range, starting at `level`
    /// and moving up one level at a time. The orphan stands in for itself on every level it
    /// passes.
    fn reparent(
        &mut self,
        point: &P,
        orphan: NodeId,
        ctx: &mut Removal,
        mut level: i32,
    ) -> Result<()> {
        loop {
            let sep = self.sep(level);

            if level > ctx.top && !ctx.cover_sets.contains_key(&level) {
                ctx.cover_sets.insert(level, ctx.apex.clone());
            }

            let mut parent: Option<DistNode> = None;
            if let Some(set) = ctx.cover_sets.get(&level) {
                for &(_, id) in set {
                    if id == orphan {
                        continue;
                    }

                    let d = self.nodes[orphan].distance_to(&self.nodes[id]);
                    if d <= sep && parent.is_none_or(|(m, _)| d < m) {
                        parent = Some((d, id));
                    }
                }
            }

            if let Some((_, parent)) = parent {
                self.nodes[parent].add_child(level, orphan);
                if level > self.max_level {
                    debug!(from = self.max_level, to = level, "raising max level");
                    self.max_level = level;
                }

                trace!(node = %orphan, parent = %parent, level, "re-parented node");
                return Ok(());
            }

            if sep.is_infinite() || level == i32::MAX {
                return Err(CoverTreeError::Unplaceable { level });
            }

            let d = self.distance(point, orphan);
            let set = ctx.cover_sets.entry(level).or_default();
            if !set.iter().any(|&(_, id)| id == orphan) {
                set.push((d, orphan));
            }

            level += 1;
        }
    }

    /// Returns the ```k``` nodes closest to ```point```, closest first.
    fn k_nearest_nodes(&self, point: &P, k: usize) -> Vec<DistNode> {
        let root = match self.root {
            Some(root) if k > 0 => root,
            _ => return Vec::new(),
        };

        // max_dist is the distance to the farthest of the best nodes found so far.
        let mut max_dist = self.distance(point, root);
        let mut best = vec![(max_dist, root)];
        let mut q = vec![(max_dist, root)];

        for level in (self.min_level..=self.max_level).rev() {
            let size = q.len();
            for ii in 0..size {
                let id = q[ii].1;
                for &child in self.nodes[id].children_at(level) {
                    let d = self.distance(point, child);
                    if d < max_dist || best.len() < k {
                        let idx = best.partition_point(|&(b, _)| b <= d);
                        best.insert(idx, (d, child));
                        if best.len() > k {
                            best.pop();
                        }

                        if let Some(&(farthest, _)) = best.last() {
                            max_dist = farthest;
                        }
                    }

                    q.push((d, child));
                }
            }

            // Descendants below this level are within base^level of their ancestor.
            let bound = max_dist + self.sep(level);
            q.retain(|&(d, _)| d <= bound);
        }

        best
    }

    /// Returns the ```k``` points closest to ```point```, closest first.
    ///
    /// More than ```k``` points may be returned when several points share the node holding the
    /// k-th closest point.
    pub fn k_nearest_neighbors(&self, point: &P, k: usize) -> Vec<P> {
        self.search(point, k)
            .take()
            .1
            .into_iter()
            .map(Neighbour::into_point)
            .collect()
    }

    /// Performs the nearest neighbour search for a single query and returns ```k``` neighbours
    /// who are closest to the ```query``` point, along with their distances.
    pub fn search(&self, query: &P, k: usize) -> QueryResult<P> {
        let mut neighbours = Vec::new();

        for (dist, id) in self.k_nearest_nodes(query, k) {
            neighbours.extend(self.nodes[id].points().iter().map(|p| Neighbour {
                point: p.clone(),
                dist,
            }));

            if neighbours.len() >= k {
                break;
            }
        }

        QueryResult::new(0, VecDeque::from_iter(neighbours))
    }

    /// Returns true if the tree satisfies the cover tree invariants.
    ///
    /// Nodes present at level ```i``` must be more than ```base^i``` apart, children at level
    /// ```i``` must lie within ```base^i``` of their parent, and every live node must be
    /// reachable from the root exactly once. Meant for tests and debugging: the cost is
    /// quadratic in the size of each level.
    pub fn is_valid_tree(&self) -> bool {
        let root = match self.root {
            Some(root) => root,
            None => return self.num_nodes == 0 && self.nodes.len() == 0,
        };

        if self.nodes.len() != self.num_nodes {
            debug!(
                live = self.nodes.len(),
                counted = self.num_nodes,
                "node count mismatch"
            );
            return false;
        }

        if !self.is_connected(root) {
            return false;
        }

        let mut nodes = vec![root];
        for level in ((self.min_level + 1)..=self.max_level).rev() {
            let sep = self.sep(level);

            for (ii, &a) in nodes.iter().enumerate() {
                for &b in &nodes[ii + 1..] {
                    if self.nodes[a].distance_to(&self.nodes[b]) <= sep {
                        debug!(level, a = %a, b = %b, "separation invariant failed");
                        return false;
                    }
                }
            }

            let mut children = Vec::new();
            for &id in &nodes {
                for &child in self.nodes[id].children_at(level) {
                    if self.nodes[id].distance_to(&self.nodes[child]) > sep {
                        debug!(level, parent = %id, child = %child, "covering invariant failed");
                        return false;
                    }
                }
                children.extend_from_slice(self.nodes[id].children_at(level));
            }

            nodes.append(&mut children);
        }

        true
    }

    /// Checks that every node is reached exactly once from the root and that each node only has
    /// children below the level it was attached at.
    fn is_connected(&self, root: NodeId) -> bool {
        let mut seen = HashSet::with_capacity(self.num_nodes);
        let mut stack = vec![(self.max_level + 1, root)];

        while let Some((attached, id)) = stack.pop() {
            if !seen.insert(id) {
                debug!(node = %id, "node reachable more than once");
                return false;
            }

            for (level, child) in self.nodes[id].all_children() {
                if level >= attached || level <= self.min_level || level > self.max_level {
                    debug!(node = %id, child = %child, level, "child outside level range");
                    return false;
                }

                if self.nodes.get(child).is_none() {
                    debug!(node = %id, child = %child, "dangling child");
                    return false;
                }

                stack.push((level, child));
            }
        }

        seen.len() == self.num_nodes
    }

    #[inline(always)]
    fn distance(&self, point: &P, id: NodeId) -> Scalar {
        point.distance(self.nodes[id].representative())
    }

    #[inline(always)]
    fn sep(&self, level: i32) -> Scalar {
        self.base.powi(level)
    }

    /// Returns the number of points in a tree.
    pub fn len(&self) -> usize {
        self.nodes.iter().map(|(_, node)| node.points().len()).sum()
    }

    /// Returns true if a tree holds no points.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Returns the number of nodes in a tree.
    pub fn node_count(&self) -> usize {
        self.num_nodes
    }

    /// Returns an iterator over all stored points in no particular order.
    pub fn points(&self) -> impl Iterator<Item = &P> + '_ {
        self.nodes.iter().flat_map(|(_, node)| node.points().iter())
    }

    /// Returns the base used to compute the distance bound ```base^level``` of a level.
    pub fn base(&self) -> Scalar {
        self.base
    }

    /// Returns the highest level of a tree.
    pub fn max_level(&self) -> i32 {
        self.max_level
    }

    /// Returns the level below which no node has children.
    pub fn min_level(&self) -> i32 {
        self.min_level
    }
}

impl<P: Point + Send + Sync> CoverTree<P> {
    /// Performs the nearest neighbour search for a slice of queries in parallel and returns
    /// ```k``` neighbours for each of them. Results are in the order of ```queries```.
    pub fn search_batch(&self, queries: &[P], k: usize) -> Vec<QueryResult<P>> {
        queries
            .par_iter()
            .enumerate()
            .map(|(idx, query)| {
                let mut result = self.search(query, k);
                result.set_index(idx);
                result
            })
            .collect()
    }
}

impl<P: Point + fmt::Debug> fmt::Display for CoverTree<P> {
    /// Prints every level with the nodes present there, each followed by its children at that
    /// level.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = match self.root {
            Some(root) => root,
            None => return writeln!(f, "(empty)"),
        };

        let mut nodes = vec![root];
        for level in (self.min_level..=self.max_level).rev() {
            writeln!(f, "LEVEL {}", level)?;

            let mut children = Vec::new();
            for &id in &nodes {
                writeln!(f, "{:?}", self.nodes[id].representative())?;
                for &child in self.nodes[id].children_at(level) {
                    writeln!(f, "  {:?}", self.nodes[child].representative())?;
                    children.push(child);
                }
            }

            nodes.append(&mut children);
        }

        Ok(())
    }
}

/// Smallest level whose distance bound ```base^level``` is at least ```dist```.
fn level_for(base: Scalar, dist: Scalar) -> i32 {
    let mut level = (dist.ln() / base.ln()).ceil() as i32;

    // ln() ratios can be off by one ulp around exact powers.
    while base.powi(level - 1) >= dist {
        level -= 1;
    }
    while base.powi(level) < dist {
        level += 1;
    }

    level
}

/// A build struct for initialising a new cover tree.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CoverTreeBuilder {
    base: Option<Scalar>,
    max_distance: Option<Scalar>,
}

impl CoverTreeBuilder {
    /// Creates a builder with default parameters.
    pub fn new() -> Self {
        Self {
            ..Default::default()
        }
    }

    /// Sets the ```base``` in exponentiation when calculating the covering distance (or invariant)
    /// of a level. Must be at least 2; defaults to 2.
    pub fn base(mut self, base: Scalar) -> Self {
        self.base = Some(base);
        self
    }

    /// Sets the bound on the distance between any two points. If not given, it is derived from
    /// the initial points.
    pub fn max_distance(mut self, max_distance: Scalar) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Constructs a cover tree containing the given points.
    pub fn build<P, I>(self, points: I) -> Result<CoverTree<P>>
    where
        P: Point,
        I: IntoIterator<Item = P>,
    {
        let base = self.base.unwrap_or(DEFAULT_BASE);
        if !base.is_finite() || base < 2. {
            return Err(CoverTreeError::InvalidBase { base });
        }

        let points: Vec<P> = points.into_iter().collect();

        let max_distance = match self.max_distance {
            Some(max_distance) => max_distance,
            None => {
                // Every pair is within twice the largest distance to the first point.
                let far = match points.split_first() {
                    Some((first, rest)) => rest
                        .iter()
                        .map(|p| first.distance(p))
                        .fold(0., Scalar::max),
                    None => 0.,
                };

                if far > 0. {
                    2. * far
                } else {
                    1.
                }
            }
        };

        if !max_distance.is_finite() || max_distance <= 0. {
            return Err(CoverTreeError::InvalidMaxDistance { max_distance });
        }

        let mut ct = CoverTree::empty(base, max_distance);
        for point in points {
            ct.insert(point)?;
        }

        debug!(
            nodes = ct.num_nodes,
            max_level = ct.max_level,
            min_level = ct.min_level,
            "built cover tree"
        );

        Ok(ct)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Debug, PartialEq)]
    struct X(Scalar);

    impl Point for X {
        fn distance(&self, other: &Self) -> Scalar {
            (self.0 - other.0).abs()
        }
    }

    // Root 0 with 10 attached at level 4 and 0.3 at level -1.
    fn small_tree() -> (CoverTree<X>, NodeId) {
        let ct = CoverTree::new(16., vec![X(0.), X(10.), X(0.3)]).unwrap();
        assert!(ct.is_valid_tree());
        assert_eq!((4, -2), (ct.max_level, ct.min_level));
        let root = ct.root.unwrap();
        (ct, root)
    }

    fn find(ct: &CoverTree<X>, x: Scalar) -> NodeId {
        ct.nodes
            .iter()
            .find(|(_, node)| node.representative().0 == x)
            .map(|(id, _)| id)
            .unwrap()
    }

    fn level_of(ct: &CoverTree<X>, parent: NodeId, child: NodeId) -> i32 {
        ct.nodes[parent]
            .all_children()
            .find(|&(_, c)| c == child)
            .map(|(level, _)| level)
            .unwrap()
    }

    #[test]
    fn test_invalid_covering() {
        let (mut ct, root) = small_tree();
        let ten = find(&ct, 10.);
        assert_eq!(4, level_of(&ct, root, ten));

        ct.nodes[root].remove_child(4, ten);
        ct.nodes[root].add_child(0, ten);
        assert!(!ct.is_valid_tree());
    }

    #[test]
    fn test_invalid_separation() {
        let (mut ct, root) = small_tree();
        let close = ct.nodes.alloc(Node::new(X(0.5)));
        ct.nodes[root].add_child(ct.max_level, close);
        ct.num_nodes += 1;
        assert!(!ct.is_valid_tree());
    }

    #[test]
    fn test_invalid_unreachable_node() {
        let (mut ct, root) = small_tree();
        let near = find(&ct, 0.3);
        assert_eq!(-1, level_of(&ct, root, near));

        assert!(ct.nodes[root].remove_child(-1, near));
        assert_eq!(ct.num_nodes, ct.nodes.len());
        assert!(!ct.is_valid_tree());
    }

    #[test]
    fn test_invalid_node_count() {
        let (mut ct, _) = small_tree();
        ct.num_nodes += 1;
        assert!(!ct.is_valid_tree());

        let (mut ct, _) = small_tree();
        ct.num_nodes -= 1;
        assert!(!ct.is_valid_tree());
    }

    #[test]
    fn test_wide_level_range() {
        let points = vec![X(0.), X(1e-150), X(1e150), X(1.), X(-1e-120), X(2e150)];
        let mut ct = CoverTree::new(16., points.clone()).unwrap();
        assert!(ct.max_level - ct.min_level > 900);
        assert!(ct.is_valid_tree());
        assert_eq!(vec![X(0.), X(1e-150)], ct.k_nearest_neighbors(&X(1e-151), 2));

        for point in &points {
            assert!(ct.remove(point).unwrap());
            assert!(ct.is_valid_tree());
        }
        assert!(ct.is_empty());
    }
}
