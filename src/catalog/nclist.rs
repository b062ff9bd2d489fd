//! Nested containment list: an interval index for ranged features.
//!
//! Each node's children are the stored intervals lying entirely within it,
//! recursively. Within one sibling list no interval contains another, so
//! siblings sorted by begin are also sorted by end, and both ends can be
//! binary searched. Nodes live in an arena and refer to each other by index,
//! which lets a removed node's children be re-parented by moving indices.

use crate::core::feature::SequenceFeature;

/// Anything with a closed 1-based range
pub trait Interval {
    fn begin(&self) -> i32;
    fn end(&self) -> i32;
}

impl Interval for SequenceFeature {
    fn begin(&self) -> i32 {
        SequenceFeature::begin(self)
    }

    fn end(&self) -> i32 {
        SequenceFeature::end(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NodeId(usize);

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    begin: i32,
    end: i32,
    children: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct NestedContainmentList<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    roots: Vec<NodeId>,
    len: usize,
}

impl<T: Interval + PartialEq> NestedContainmentList<T> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            roots: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.free.clear();
        self.roots.clear();
        self.len = 0;
    }

    /// Add an interval. Duplicates are not checked here.
    ///
    /// An interval with the same range as a stored one nests beneath it.
    pub fn add(&mut self, item: T) {
        let node = Node {
            begin: item.begin(),
            end: item.end(),
            item,
            children: Vec::new(),
        };
        let id = match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.nodes.push(Some(node));
                NodeId(self.nodes.len() - 1)
            }
        };
        let roots = std::mem::take(&mut self.roots);
        self.roots = self.insert_into(roots, id);
        self.len += 1;
    }

    /// Remove the first stored item equal to `item`. Its children take its
    /// place among its former siblings.
    pub fn remove(&mut self, item: &T) -> Option<T> {
        let roots = std::mem::take(&mut self.roots);
        let (roots, removed) = self.remove_from(roots, item);
        self.roots = roots;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    pub fn contains(&self, item: &T) -> bool {
        self.find_in(&self.roots, item)
    }

    /// Every stored item overlapping the closed range `from..=to`
    pub fn find_overlaps(&self, from: i32, to: i32) -> Vec<&T> {
        let mut found = Vec::new();
        self.collect_overlaps(&self.roots, from, to, &mut found);
        found
    }

    /// All items, each container before its contents
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let node = self.node(id);
            stack.extend(node.children.iter().rev().copied());
            Some(&node.item)
        })
    }

    /// Depth of the deepest nesting, 0 when empty
    pub fn depth(&self) -> usize {
        self.depth_of(&self.roots)
    }

    fn depth_of(&self, list: &[NodeId]) -> usize {
        list.iter()
            .map(|&id| 1 + self.depth_of(&self.node(id).children))
            .max()
            .unwrap_or(0)
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        match &self.nodes[id.0] {
            Some(node) => node,
            None => unreachable!("live node id {} points at a free slot", id.0),
        }
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        match &mut self.nodes[id.0] {
            Some(node) => node,
            None => unreachable!("live node id {} points at a free slot", id.0),
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node<T>> {
        let node = self.nodes[id.0].take();
        self.free.push(id.0);
        node
    }

    /// Insert node `id` (possibly with children of its own) into a sibling
    /// list, returning the updated list.
    fn insert_into(&mut self, mut list: Vec<NodeId>, id: NodeId) -> Vec<NodeId> {
        let (begin, end) = {
            let node = self.node(id);
            (node.begin, node.end)
        };

        // the only sibling that can contain us is the first ending at or after our end
        let pos = list.partition_point(|&s| self.node(s).end < end);
        if let Some(&container) = list.get(pos) {
            if self.node(container).begin <= begin {
                let children = std::mem::take(&mut self.node_mut(container).children);
                let children = self.insert_into(children, id);
                self.node_mut(container).children = children;
                return list;
            }
        }

        // siblings we contain form a contiguous run starting at our begin
        let start = list.partition_point(|&s| self.node(s).begin < begin);
        let mut stop = start;
        while stop < list.len() && self.node(list[stop]).end <= end {
            stop += 1;
        }
        let adopted: Vec<NodeId> = list.drain(start..stop).collect();
        if !adopted.is_empty() {
            let mut children = std::mem::take(&mut self.node_mut(id).children);
            for child in adopted {
                children = self.insert_into(children, child);
            }
            self.node_mut(id).children = children;
        }
        list.insert(start, id);
        list
    }

    fn remove_from(&mut self, mut list: Vec<NodeId>, item: &T) -> (Vec<NodeId>, Option<T>) {
        let (begin, end) = (item.begin(), item.end());
        let mut i = list.partition_point(|&s| self.node(s).end < end);
        while i < list.len() && self.node(list[i]).begin <= begin {
            let id = list[i];
            if self.node(id).item == *item {
                list.remove(i);
                let Some(node) = self.release(id) else {
                    return (list, None);
                };
                for child in node.children {
                    list = self.insert_into(list, child);
                }
                return (list, Some(node.item));
            }
            let children = std::mem::take(&mut self.node_mut(id).children);
            let (children, removed) = self.remove_from(children, item);
            self.node_mut(id).children = children;
            if removed.is_some() {
                return (list, removed);
            }
            i += 1;
        }
        (list, None)
    }

    fn find_in(&self, list: &[NodeId], item: &T) -> bool {
        let (begin, end) = (item.begin(), item.end());
        let start = list.partition_point(|&s| self.node(s).end < end);
        list[start..]
            .iter()
            .map(|&id| self.node(id))
            .take_while(|node| node.begin <= begin)
            .any(|node| node.item == *item || self.find_in(&node.children, item))
    }

    fn collect_overlaps<'a>(&'a self, list: &[NodeId], from: i32, to: i32, found: &mut Vec<&'a T>) {
        let start = list.partition_point(|&s| self.node(s).end < from);
        for &id in &list[start..] {
            let node = self.node(id);
            if node.begin > to {
                break;
            }
            found.push(&node.item);
            self.collect_overlaps(&node.children, from, to, found);
        }
    }
}

impl<T: Interval + PartialEq> Default for NestedContainmentList<T> {
    fn default() -> Self {
        Self::new()
    }
}
