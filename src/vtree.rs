//! Variable trees for SDD normalization.
//!
//! A vtree is a full binary tree whose leaves are the diagram variables; it
//! dictates how every decision node splits its function. The synthesis
//! pipeline uses a fixed three-region layout,
//!
//! ```text
//!         root
//!        /    \
//!   outputs    .
//!             / \
//!        inputs  state
//! ```
//!
//! so that decision nodes normalized at the root branch on system choices,
//! and nodes normalized at the inner split branch on environment choices.
//! Each region is balanced by breadth-first pairwise merging of its leaves.
//!
//! Variables are numbered from 1: first the state variables (one per closure
//! member), then the inputs, then the outputs.

use std::fmt::Write as _;

/// Index of a vtree node. Plain `Copy` handle, valid for the owning tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VtreeId(u32);

impl VtreeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtreeNode {
    Leaf { var: u32 },
    Internal { left: VtreeId, right: VtreeId },
}

pub struct Vtree {
    nodes: Vec<VtreeNode>,
    parent: Vec<Option<VtreeId>>,
    depth: Vec<u32>,
    position: Vec<u32>,
    vars_below: Vec<u32>,
    leaf_of_var: Vec<VtreeId>,
    num_vars: u32,
    root: VtreeId,
    system_split: Option<VtreeId>,
    env_split: Option<VtreeId>,
}

impl Vtree {
    /// Balanced vtree over variables `1..=num_vars`, without the synthesis
    /// region structure. Used directly by diagram-level tests.
    pub fn balanced(num_vars: u32) -> Self {
        assert!(num_vars > 0);
        let mut builder = Builder::default();
        let root = builder
            .region((1..=num_vars).collect())
            .unwrap_or_else(|| unreachable!());
        builder.finish(root, num_vars, None, None)
    }

    /// The three-region synthesis layout. `state` must be positive; `inputs`
    /// and `outputs` may be zero, in which case the corresponding level of
    /// the dissection is absent.
    pub fn for_synthesis(state: u32, inputs: u32, outputs: u32) -> Self {
        assert!(state > 0);
        let num_vars = state + inputs + outputs;
        let mut builder = Builder::default();
        let state_region = builder
            .region((1..=state).collect())
            .unwrap_or_else(|| unreachable!());
        let input_region = builder.region((state + 1..=state + inputs).collect());
        let output_region = builder.region((state + inputs + 1..=num_vars).collect());

        let (inner, env_split) = match input_region {
            Some(ir) => {
                let split = builder.internal(ir, state_region);
                (split, Some(split))
            }
            None => (state_region, None),
        };
        let (root, system_split) = match output_region {
            Some(or) => {
                let split = builder.internal(or, inner);
                (split, Some(split))
            }
            None => (inner, None),
        };
        builder.finish(root, num_vars, system_split, env_split)
    }

    pub fn root(&self) -> VtreeId {
        self.root
    }

    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Vtree node where decisions branch on system outputs, if any outputs
    /// were declared.
    pub fn system_split(&self) -> Option<VtreeId> {
        self.system_split
    }

    /// Vtree node where decisions branch on environment inputs, if any
    /// inputs were declared.
    pub fn env_split(&self) -> Option<VtreeId> {
        self.env_split
    }

    pub fn node(&self, v: VtreeId) -> VtreeNode {
        self.nodes[v.index()]
    }

    pub fn is_leaf(&self, v: VtreeId) -> bool {
        matches!(self.nodes[v.index()], VtreeNode::Leaf { .. })
    }

    pub fn left(&self, v: VtreeId) -> VtreeId {
        match self.nodes[v.index()] {
            VtreeNode::Internal { left, .. } => left,
            VtreeNode::Leaf { .. } => panic!("left child of a leaf"),
        }
    }

    pub fn right(&self, v: VtreeId) -> VtreeId {
        match self.nodes[v.index()] {
            VtreeNode::Internal { right, .. } => right,
            VtreeNode::Leaf { .. } => panic!("right child of a leaf"),
        }
    }

    pub fn leaf_of_var(&self, var: u32) -> VtreeId {
        self.leaf_of_var[var as usize]
    }

    /// Number of variables in the subtree rooted at `v`.
    pub fn vars_below(&self, v: VtreeId) -> u32 {
        self.vars_below[v.index()]
    }

    /// In-order position of `v`, the id used by the textual format.
    pub fn position(&self, v: VtreeId) -> u32 {
        self.position[v.index()]
    }

    /// `true` iff `node` lies in the subtree rooted at `ancestor`
    /// (inclusive).
    pub fn contains(&self, ancestor: VtreeId, node: VtreeId) -> bool {
        let mut cur = Some(node);
        while let Some(v) = cur {
            if v == ancestor {
                return true;
            }
            cur = self.parent[v.index()];
        }
        false
    }

    /// Lowest common ancestor.
    pub fn lca(&self, a: VtreeId, b: VtreeId) -> VtreeId {
        let mut a = a;
        let mut b = b;
        while self.depth[a.index()] > self.depth[b.index()] {
            a = self.parent[a.index()].unwrap_or_else(|| unreachable!());
        }
        while self.depth[b.index()] > self.depth[a.index()] {
            b = self.parent[b.index()].unwrap_or_else(|| unreachable!());
        }
        while a != b {
            a = self.parent[a.index()].unwrap_or_else(|| unreachable!());
            b = self.parent[b.index()].unwrap_or_else(|| unreachable!());
        }
        a
    }

    /// Serializes the tree in the libsdd textual vtree format: a `vtree N`
    /// header, then one line per node with children before parents and
    /// in-order node ids.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str("c vtree with variable ordering: state, inputs, outputs\n");
        let _ = writeln!(out, "vtree {}", self.nodes.len());
        self.serialize_node(self.root, &mut out);
        out
    }

    fn serialize_node(&self, v: VtreeId, out: &mut String) {
        match self.node(v) {
            VtreeNode::Leaf { var } => {
                let _ = writeln!(out, "L {} {}", self.position(v), var);
            }
            VtreeNode::Internal { left, right } => {
                self.serialize_node(left, out);
                self.serialize_node(right, out);
                let _ = writeln!(
                    out,
                    "I {} {} {}",
                    self.position(v),
                    self.position(left),
                    self.position(right)
                );
            }
        }
    }
}

#[derive(Default)]
struct Builder {
    nodes: Vec<VtreeNode>,
}

impl Builder {
    fn leaf(&mut self, var: u32) -> VtreeId {
        self.nodes.push(VtreeNode::Leaf { var });
        VtreeId(self.nodes.len() as u32 - 1)
    }

    fn internal(&mut self, left: VtreeId, right: VtreeId) -> VtreeId {
        self.nodes.push(VtreeNode::Internal { left, right });
        VtreeId(self.nodes.len() as u32 - 1)
    }

    /// Balances a region by repeatedly merging the two front nodes of a
    /// queue and pushing the result to the back.
    fn region(&mut self, vars: Vec<u32>) -> Option<VtreeId> {
        let mut queue: std::collections::VecDeque<VtreeId> =
            vars.into_iter().map(|var| self.leaf(var)).collect();
        while queue.len() > 1 {
            let a = queue.pop_front()?;
            let b = queue.pop_front()?;
            let merged = self.internal(a, b);
            queue.push_back(merged);
        }
        queue.pop_front()
    }

    fn finish(
        self,
        root: VtreeId,
        num_vars: u32,
        system_split: Option<VtreeId>,
        env_split: Option<VtreeId>,
    ) -> Vtree {
        let n = self.nodes.len();
        let mut vtree = Vtree {
            nodes: self.nodes,
            parent: vec![None; n],
            depth: vec![0; n],
            position: vec![0; n],
            vars_below: vec![0; n],
            leaf_of_var: vec![VtreeId(0); num_vars as usize + 1],
            num_vars,
            root,
            system_split,
            env_split,
        };
        let mut next_position = 0;
        vtree.index(root, None, 0, &mut next_position);
        vtree
    }
}

impl Vtree {
    fn index(&mut self, v: VtreeId, parent: Option<VtreeId>, depth: u32, next_position: &mut u32) {
        self.parent[v.index()] = parent;
        self.depth[v.index()] = depth;
        match self.node(v) {
            VtreeNode::Leaf { var } => {
                self.leaf_of_var[var as usize] = v;
                self.vars_below[v.index()] = 1;
                self.position[v.index()] = *next_position;
                *next_position += 1;
            }
            VtreeNode::Internal { left, right } => {
                self.index(left, Some(v), depth + 1, next_position);
                self.position[v.index()] = *next_position;
                *next_position += 1;
                self.index(right, Some(v), depth + 1, next_position);
                self.vars_below[v.index()] =
                    self.vars_below[left.index()] + self.vars_below[right.index()];
            }
        }
    }
}
