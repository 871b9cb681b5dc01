//! Sentential decision diagrams.
//!
//! A compressed, trimmed SDD manager over a fixed vtree. Nodes are hash-
//! consed, so semantically equal functions built bottom-up through `apply`
//! get the same [`SddId`]; equality checks on compiled functions are id
//! comparisons. The manager owns every node for its whole lifetime.
//!
//! A decision node normalized at an internal vtree node `v` is a set of
//! `(prime, sub)` elements: the primes are functions over the left subtree
//! of `v`, pairwise disjoint and exhaustive, and the subs are functions
//! over the right subtree. Canonicity is maintained on construction:
//! elements with equal subs are merged (compression), `{(⊤, s)}` collapses
//! to `s`, and `{(p, ⊤), (!p, ⊥)}` collapses to `p` (trimming).
//!
//! # Examples
//!
//! ```
//! use ltlf_synt::sdd::SddManager;
//!
//! let mgr = SddManager::new(3);
//! let a = mgr.literal(1);
//! let b = mgr.literal(2);
//! let f = mgr.disjoin(mgr.conjoin(a, b), mgr.conjoin(a, mgr.negate(b)));
//! assert_eq!(f, a);
//! ```

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use num_bigint::BigUint;

use crate::vtree::{Vtree, VtreeId};

/// Handle to an interned SDD node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SddId(u32);

impl SddId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

const FALSE: SddId = SddId(0);
const TRUE: SddId = SddId(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Element {
    pub prime: SddId,
    pub sub: SddId,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SddNode {
    False,
    True,
    Literal { literal: i32, vtree: VtreeId },
    Decision { vtree: VtreeId, elements: Vec<Element> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Op {
    Conjoin,
    Disjoin,
}

pub struct SddManager {
    vtree: Vtree,
    nodes: RefCell<Vec<SddNode>>,
    unique: RefCell<HashMap<SddNode, SddId>>,
    negation_cache: RefCell<HashMap<SddId, SddId>>,
    apply_cache: RefCell<HashMap<(Op, SddId, SddId), SddId>>,
    condition_cache: RefCell<HashMap<(SddId, i32), SddId>>,
}

impl SddManager {
    /// Manager over a balanced vtree for variables `1..=num_vars`.
    pub fn new(num_vars: u32) -> Self {
        Self::from_vtree(Vtree::balanced(num_vars))
    }

    pub fn from_vtree(vtree: Vtree) -> Self {
        let mgr = Self {
            vtree,
            nodes: RefCell::new(vec![SddNode::False, SddNode::True]),
            unique: RefCell::new(HashMap::new()),
            negation_cache: RefCell::new(HashMap::new()),
            apply_cache: RefCell::new(HashMap::new()),
            condition_cache: RefCell::new(HashMap::new()),
        };
        mgr.unique.borrow_mut().insert(SddNode::False, FALSE);
        mgr.unique.borrow_mut().insert(SddNode::True, TRUE);
        mgr
    }

    pub fn vtree(&self) -> &Vtree {
        &self.vtree
    }

    pub fn num_vars(&self) -> u32 {
        self.vtree.num_vars()
    }

    /// Total number of interned nodes, constants included.
    pub fn num_nodes(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn true_sdd(&self) -> SddId {
        TRUE
    }

    pub fn false_sdd(&self) -> SddId {
        FALSE
    }

    pub fn is_true(&self, f: SddId) -> bool {
        f == TRUE
    }

    pub fn is_false(&self, f: SddId) -> bool {
        f == FALSE
    }

    pub fn node(&self, f: SddId) -> SddNode {
        self.nodes.borrow()[f.index()].clone()
    }

    pub fn is_literal(&self, f: SddId) -> bool {
        matches!(self.nodes.borrow()[f.index()], SddNode::Literal { .. })
    }

    pub fn is_decision(&self, f: SddId) -> bool {
        matches!(self.nodes.borrow()[f.index()], SddNode::Decision { .. })
    }

    /// Signed variable of a literal node.
    pub fn literal_of(&self, f: SddId) -> Option<i32> {
        match self.nodes.borrow()[f.index()] {
            SddNode::Literal { literal, .. } => Some(literal),
            _ => None,
        }
    }

    /// Vtree node the function is normalized at; `None` for constants.
    pub fn node_vtree(&self, f: SddId) -> Option<VtreeId> {
        match self.nodes.borrow()[f.index()] {
            SddNode::False | SddNode::True => None,
            SddNode::Literal { vtree, .. } | SddNode::Decision { vtree, .. } => Some(vtree),
        }
    }

    /// Elements of a decision node. Empty for anything else.
    pub fn elements(&self, f: SddId) -> Vec<Element> {
        match self.node(f) {
            SddNode::Decision { elements, .. } => elements,
            _ => Vec::new(),
        }
    }

    fn intern(&self, node: SddNode) -> SddId {
        if let Some(&id) = self.unique.borrow().get(&node) {
            return id;
        }
        let id = {
            let mut nodes = self.nodes.borrow_mut();
            let id = SddId(nodes.len() as u32);
            nodes.push(node.clone());
            id
        };
        self.unique.borrow_mut().insert(node, id);
        id
    }

    pub fn literal(&self, literal: i32) -> SddId {
        let var = literal.unsigned_abs();
        assert!(var >= 1 && var <= self.num_vars(), "literal out of range");
        let vtree = self.vtree.leaf_of_var(var);
        self.intern(SddNode::Literal { literal, vtree })
    }

    pub fn negate(&self, f: SddId) -> SddId {
        if f == TRUE {
            return FALSE;
        }
        if f == FALSE {
            return TRUE;
        }
        if let Some(&g) = self.negation_cache.borrow().get(&f) {
            return g;
        }
        let g = match self.node(f) {
            SddNode::Literal { literal, .. } => self.literal(-literal),
            SddNode::Decision { vtree, elements } => {
                let elements = elements
                    .into_iter()
                    .map(|e| Element { prime: e.prime, sub: self.negate(e.sub) })
                    .collect();
                self.decision(vtree, elements)
            }
            SddNode::False | SddNode::True => unreachable!(),
        };
        let mut cache = self.negation_cache.borrow_mut();
        cache.insert(f, g);
        cache.insert(g, f);
        g
    }

    pub fn conjoin(&self, a: SddId, b: SddId) -> SddId {
        self.apply(Op::Conjoin, a, b)
    }

    pub fn disjoin(&self, a: SddId, b: SddId) -> SddId {
        self.apply(Op::Disjoin, a, b)
    }

    pub fn implies(&self, a: SddId, b: SddId) -> SddId {
        self.disjoin(self.negate(a), b)
    }

    pub fn equiv(&self, a: SddId, b: SddId) -> SddId {
        self.conjoin(self.implies(a, b), self.implies(b, a))
    }

    pub fn xor(&self, a: SddId, b: SddId) -> SddId {
        self.negate(self.equiv(a, b))
    }

    fn apply(&self, op: Op, a: SddId, b: SddId) -> SddId {
        // `absorbing` wins outright, `identity` disappears.
        let (absorbing, identity) = match op {
            Op::Conjoin => (FALSE, TRUE),
            Op::Disjoin => (TRUE, FALSE),
        };
        if a == absorbing || b == absorbing {
            return absorbing;
        }
        if a == identity {
            return b;
        }
        if b == identity {
            return a;
        }
        if a == b {
            return a;
        }
        if self.negate(a) == b {
            return absorbing;
        }

        let key = (op, a.min(b), a.max(b));
        if let Some(&r) = self.apply_cache.borrow().get(&key) {
            return r;
        }

        let va = self.node_vtree(a).unwrap_or_else(|| unreachable!());
        let vb = self.node_vtree(b).unwrap_or_else(|| unreachable!());
        let v = if va == vb { va } else { self.vtree.lca(va, vb) };
        // Two non-complementary literals on the same leaf cannot exist.
        debug_assert!(!self.vtree.is_leaf(v));

        let ea = self.decompose(a, v);
        let eb = self.decompose(b, v);
        let mut elements = Vec::with_capacity(ea.len() * eb.len());
        for e1 in &ea {
            for e2 in &eb {
                let prime = self.apply(Op::Conjoin, e1.prime, e2.prime);
                if prime == FALSE {
                    continue;
                }
                let sub = self.apply(op, e1.sub, e2.sub);
                elements.push(Element { prime, sub });
            }
        }
        let r = self.decision(v, elements);
        self.apply_cache.borrow_mut().insert(key, r);
        r
    }

    /// Element list of `x` viewed as a decision at internal vtree node `v`,
    /// which must be an ancestor of (or equal to) `x`'s own vtree node.
    fn decompose(&self, x: SddId, v: VtreeId) -> Vec<Element> {
        let vx = self.node_vtree(x).unwrap_or_else(|| unreachable!());
        if vx == v {
            match self.node(x) {
                SddNode::Decision { elements, .. } => elements,
                _ => unreachable!("non-decision normalized at an internal node"),
            }
        } else if self.vtree.contains(self.vtree.left(v), vx) {
            vec![
                Element { prime: x, sub: TRUE },
                Element { prime: self.negate(x), sub: FALSE },
            ]
        } else {
            debug_assert!(self.vtree.contains(self.vtree.right(v), vx));
            vec![Element { prime: TRUE, sub: x }]
        }
    }

    /// Compresses, trims and interns a decision node. The primes of the
    /// incoming elements must be pairwise disjoint and cover `true` at
    /// `v`'s left subtree; false primes are dropped here.
    fn decision(&self, v: VtreeId, elements: Vec<Element>) -> SddId {
        let mut by_sub: HashMap<SddId, SddId> = HashMap::new();
        let mut order: Vec<SddId> = Vec::new();
        for e in elements {
            if e.prime == FALSE {
                continue;
            }
            match by_sub.get(&e.sub).copied() {
                Some(acc) => {
                    let merged = self.disjoin(acc, e.prime);
                    by_sub.insert(e.sub, merged);
                }
                None => {
                    by_sub.insert(e.sub, e.prime);
                    order.push(e.sub);
                }
            }
        }
        let mut elems: Vec<Element> = order
            .into_iter()
            .map(|sub| Element { prime: by_sub[&sub], sub })
            .collect();
        elems.sort();
        assert!(!elems.is_empty(), "decision with no surviving elements");

        if elems.len() == 1 {
            debug_assert_eq!(elems[0].prime, TRUE, "primes must cover true");
            return elems[0].sub;
        }
        if elems.len() == 2 {
            if elems[0].sub == TRUE && elems[1].sub == FALSE {
                return elems[0].prime;
            }
            if elems[0].sub == FALSE && elems[1].sub == TRUE {
                return elems[1].prime;
            }
        }
        self.intern(SddNode::Decision { vtree: v, elements: elems })
    }

    /// Restricts `f` by the given signed literal.
    pub fn condition(&self, f: SddId, literal: i32) -> SddId {
        assert!(literal != 0);
        if f == TRUE || f == FALSE {
            return f;
        }
        let key = (f, literal);
        if let Some(&r) = self.condition_cache.borrow().get(&key) {
            return r;
        }
        let r = match self.node(f) {
            SddNode::Literal { literal: l, .. } => {
                if l.unsigned_abs() == literal.unsigned_abs() {
                    if l == literal {
                        TRUE
                    } else {
                        FALSE
                    }
                } else {
                    f
                }
            }
            SddNode::Decision { vtree, elements } => {
                let leaf = self.vtree.leaf_of_var(literal.unsigned_abs());
                if !self.vtree.contains(vtree, leaf) {
                    f
                } else if self.vtree.contains(self.vtree.left(vtree), leaf) {
                    let elements = elements
                        .into_iter()
                        .map(|e| Element {
                            prime: self.condition(e.prime, literal),
                            sub: e.sub,
                        })
                        .collect();
                    self.decision(vtree, elements)
                } else {
                    let elements = elements
                        .into_iter()
                        .map(|e| Element {
                            prime: e.prime,
                            sub: self.condition(e.sub, literal),
                        })
                        .collect();
                    self.decision(vtree, elements)
                }
            }
            SddNode::False | SddNode::True => unreachable!(),
        };
        self.condition_cache.borrow_mut().insert(key, r);
        r
    }

    pub fn exists(&self, f: SddId, var: u32) -> SddId {
        let v = var as i32;
        self.disjoin(self.condition(f, v), self.condition(f, -v))
    }

    pub fn forall(&self, f: SddId, var: u32) -> SddId {
        let v = var as i32;
        self.conjoin(self.condition(f, v), self.condition(f, -v))
    }

    /// Universal quantification over a set of variables.
    pub fn forall_vars(&self, f: SddId, vars: impl IntoIterator<Item = u32>) -> SddId {
        let mut f = f;
        for var in vars {
            if f == TRUE || f == FALSE {
                break;
            }
            f = self.forall(f, var);
        }
        f
    }

    /// Number of satisfying assignments over all manager variables.
    pub fn model_count(&self, f: SddId) -> BigUint {
        let mut cache = HashMap::new();
        self.count_at(f, self.vtree.root(), &mut cache)
    }

    fn count_at(
        &self,
        f: SddId,
        v: VtreeId,
        cache: &mut HashMap<(SddId, VtreeId), BigUint>,
    ) -> BigUint {
        if f == FALSE {
            return BigUint::from(0u8);
        }
        if f == TRUE {
            return BigUint::from(1u8) << self.vtree.vars_below(v) as usize;
        }
        if let Some(c) = cache.get(&(f, v)) {
            return c.clone();
        }
        let vf = self.node_vtree(f).unwrap_or_else(|| unreachable!());
        let count = if vf == v {
            match self.node(f) {
                SddNode::Literal { .. } => BigUint::from(1u8),
                SddNode::Decision { elements, .. } => {
                    let left = self.vtree.left(v);
                    let right = self.vtree.right(v);
                    let mut total = BigUint::from(0u8);
                    for e in elements {
                        total += self.count_at(e.prime, left, cache)
                            * self.count_at(e.sub, right, cache);
                    }
                    total
                }
                SddNode::False | SddNode::True => unreachable!(),
            }
        } else {
            // f is normalized strictly below v; the missing variables on the
            // other side are free.
            let left = self.vtree.left(v);
            let right = self.vtree.right(v);
            if self.vtree.contains(left, vf) {
                self.count_at(f, left, cache) << self.vtree.vars_below(right) as usize
            } else {
                self.count_at(f, right, cache) << self.vtree.vars_below(left) as usize
            }
        };
        cache.insert((f, v), count.clone());
        count
    }

    /// Size of the diagram: total element count over the distinct decision
    /// nodes reachable from `f`. Constants and literals have size 0.
    pub fn size(&self, f: SddId) -> u64 {
        let mut seen = HashSet::new();
        let mut stack = vec![f];
        let mut total = 0u64;
        while let Some(n) = stack.pop() {
            if !seen.insert(n) {
                continue;
            }
            if let SddNode::Decision { elements, .. } = self.node(n) {
                total += elements.len() as u64;
                for e in elements {
                    stack.push(e.prime);
                    stack.push(e.sub);
                }
            }
        }
        total
    }

    /// Renders the diagram rooted at `f` in Graphviz DOT format.
    pub fn to_dot(&self, f: SddId) -> String {
        use std::fmt::Write as _;
        let mut out = String::from("digraph sdd {\n");
        out.push_str("  node [shape=record];\n");
        let mut seen = HashSet::new();
        let mut stack = vec![f];
        while let Some(n) = stack.pop() {
            if !seen.insert(n) {
                continue;
            }
            match self.node(n) {
                SddNode::False => {
                    let _ = writeln!(out, "  n{} [label=\"false\"];", n.0);
                }
                SddNode::True => {
                    let _ = writeln!(out, "  n{} [label=\"true\"];", n.0);
                }
                SddNode::Literal { literal, .. } => {
                    let _ = writeln!(out, "  n{} [label=\"{}\"];", n.0, literal);
                }
                SddNode::Decision { vtree, elements } => {
                    let _ = writeln!(
                        out,
                        "  n{} [label=\"v{}|{} elems\"];",
                        n.0,
                        self.vtree.position(vtree),
                        elements.len()
                    );
                    for (i, e) in elements.iter().enumerate() {
                        let _ = writeln!(out, "  n{} -> n{} [label=\"p{}\"];", n.0, e.prime.0, i);
                        let _ = writeln!(out, "  n{} -> n{} [label=\"s{}\"];", n.0, e.sub.0, i);
                        stack.push(e.prime);
                        stack.push(e.sub);
                    }
                }
            }
        }
        out.push_str("}\n");
        out
    }
}
