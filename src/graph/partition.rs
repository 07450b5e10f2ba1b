use std::collections::HashMap;

use super::build::{GraphLink, GraphNode};

struct DisjointSet {
    parent: Vec<usize>,
    rank: Vec<u8>,
}

impl DisjointSet {
    fn new(size: usize) -> Self {
        Self {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, index: usize) -> usize {
        let mut root = index;
        while self.parent[root] != root {
            root = self.parent[root];
        }

        let mut cursor = index;
        while self.parent[cursor] != root {
            let next = self.parent[cursor];
            self.parent[cursor] = root;
            cursor = next;
        }
        root
    }

    fn union(&mut self, a: usize, b: usize) {
        let root_a = self.find(a);
        let root_b = self.find(b);
        if root_a == root_b {
            return;
        }

        match self.rank[root_a].cmp(&self.rank[root_b]) {
            std::cmp::Ordering::Less => self.parent[root_a] = root_b,
            std::cmp::Ordering::Greater => self.parent[root_b] = root_a,
            std::cmp::Ordering::Equal => {
                self.parent[root_b] = root_a;
                self.rank[root_a] = self.rank[root_a].saturating_add(1);
            }
        }
    }
}

/// Groups nodes into connected components, ordered by each component's first node.
/// Links with an endpoint outside `nodes` are ignored.
pub fn partition<'a>(nodes: &'a [GraphNode], links: &[GraphLink]) -> Vec<Vec<&'a GraphNode>> {
    let index_by_id = nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.id.as_str(), index))
        .collect::<HashMap<_, _>>();

    let mut sets = DisjointSet::new(nodes.len());
    for link in links {
        if let (Some(&source), Some(&target)) = (
            index_by_id.get(link.source.as_str()),
            index_by_id.get(link.target.as_str()),
        ) {
            sets.union(source, target);
        }
    }

    let mut slot_by_root = HashMap::new();
    let mut components: Vec<Vec<&GraphNode>> = Vec::new();
    for (index, node) in nodes.iter().enumerate() {
        let root = sets.find(index);
        let slot = *slot_by_root.entry(root).or_insert_with(|| {
            components.push(Vec::new());
            components.len() - 1
        });
        components[slot].push(node);
    }

    components
}
