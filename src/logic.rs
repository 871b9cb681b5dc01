//! Hash-consed LTLf formulas.
//!
//! All formulas are created through an [`Arena`], which interns every node:
//! structurally equal formulas get the same [`Ltlf`] handle, so equality,
//! hashing and ordering on formulas are O(1) id comparisons. Handles are
//! plain `Copy` indices, and the arena owns the nodes for its whole lifetime,
//! so no reference counting is needed.
//!
//! # Examples
//!
//! ```
//! use ltlf_synt::logic::Arena;
//!
//! let arena = Arena::new();
//! let a = arena.atom("a");
//! let b = arena.atom("b");
//! let f = arena.until(vec![a, b]);
//! let g = arena.until(vec![a, b]);
//! assert_eq!(f, g);
//! assert_eq!(arena.fmt(f), "(a U b)");
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

/// Handle to an interned formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ltlf(u32);

impl Ltlf {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Handle to an interned atom name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomId(u32);

/// One formula node. Children are [`Ltlf`] handles into the same arena.
///
/// `True`/`False` are the trace-length markers (`tt`/`ff` in the concrete
/// syntax), distinct from the propositional constants `PropTrue`/`PropFalse`
/// (`true`/`false`). `End` marks the end of the trace; `PropositionalNot` is
/// negation restricted to atoms and `End`, which is the only negation shape
/// that survives NNF. `Next` is the strong next (`X[!]`), `WeakNext` the weak
/// one (`X`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LtlfNode {
    True,
    False,
    PropTrue,
    PropFalse,
    End,
    Atom(AtomId),
    Not(Ltlf),
    PropositionalNot(Ltlf),
    And(Vec<Ltlf>),
    Or(Vec<Ltlf>),
    Implies(Vec<Ltlf>),
    Equivalent(Vec<Ltlf>),
    Xor(Vec<Ltlf>),
    Next(Ltlf),
    WeakNext(Ltlf),
    Until(Vec<Ltlf>),
    Release(Vec<Ltlf>),
    Eventually(Ltlf),
    Always(Ltlf),
}

/// Interning arena for LTLf formulas.
pub struct Arena {
    nodes: RefCell<Vec<LtlfNode>>,
    table: RefCell<HashMap<LtlfNode, Ltlf>>,
    names: RefCell<Vec<String>>,
    name_table: RefCell<HashMap<String, AtomId>>,
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

impl Arena {
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(Vec::new()),
            table: RefCell::new(HashMap::new()),
            names: RefCell::new(Vec::new()),
            name_table: RefCell::new(HashMap::new()),
        }
    }

    /// Number of distinct interned nodes.
    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    fn intern(&self, node: LtlfNode) -> Ltlf {
        if let Some(&f) = self.table.borrow().get(&node) {
            return f;
        }
        let mut nodes = self.nodes.borrow_mut();
        let f = Ltlf(nodes.len() as u32);
        nodes.push(node.clone());
        self.table.borrow_mut().insert(node, f);
        f
    }

    /// Structural view of a formula. Cheap: child vectors are short.
    pub fn node(&self, f: Ltlf) -> LtlfNode {
        self.nodes.borrow()[f.index()].clone()
    }

    pub fn tt(&self) -> Ltlf {
        self.intern(LtlfNode::True)
    }

    pub fn ff(&self) -> Ltlf {
        self.intern(LtlfNode::False)
    }

    pub fn prop_true(&self) -> Ltlf {
        self.intern(LtlfNode::PropTrue)
    }

    pub fn prop_false(&self) -> Ltlf {
        self.intern(LtlfNode::PropFalse)
    }

    pub fn end(&self) -> Ltlf {
        self.intern(LtlfNode::End)
    }

    /// `!end`, the "still at a real position" marker.
    pub fn not_end(&self) -> Ltlf {
        let end = self.end();
        self.prop_not(end)
    }

    pub fn atom(&self, name: &str) -> Ltlf {
        let existing = self.name_table.borrow().get(name).copied();
        let id = match existing {
            Some(id) => id,
            None => {
                let mut names = self.names.borrow_mut();
                let id = AtomId(names.len() as u32);
                names.push(name.to_string());
                self.name_table.borrow_mut().insert(name.to_string(), id);
                id
            }
        };
        self.intern(LtlfNode::Atom(id))
    }

    pub fn atom_name(&self, id: AtomId) -> String {
        self.names.borrow()[id.0 as usize].clone()
    }

    /// `true` iff `f` is an atom or `End`, the only admissible arguments of
    /// [`Arena::prop_not`].
    pub fn is_atomic(&self, f: Ltlf) -> bool {
        matches!(
            self.nodes.borrow()[f.index()],
            LtlfNode::Atom(_) | LtlfNode::End
        )
    }

    /// Generic negation, eliminated by the NNF pass.
    pub fn not(&self, f: Ltlf) -> Ltlf {
        self.intern(LtlfNode::Not(f))
    }

    /// Negation of an atomic formula. Double negations cancel.
    pub fn prop_not(&self, f: Ltlf) -> Ltlf {
        if let LtlfNode::PropositionalNot(g) = self.node(f) {
            return g;
        }
        assert!(self.is_atomic(f), "propositional negation of a non-atomic formula");
        self.intern(LtlfNode::PropositionalNot(f))
    }

    /// Commutative n-ary connectives are canonicalized: arguments are sorted
    /// by handle and deduplicated, and a singleton collapses to its argument.
    /// No constant absorption happens here; `PropTrue`/`PropFalse` operands
    /// are meaningful to the compiler and must survive.
    fn assoc(&self, mut args: Vec<Ltlf>, build: impl FnOnce(Vec<Ltlf>) -> LtlfNode) -> Ltlf {
        assert!(!args.is_empty());
        args.sort();
        args.dedup();
        if args.len() == 1 {
            return args[0];
        }
        self.intern(build(args))
    }

    pub fn and(&self, args: Vec<Ltlf>) -> Ltlf {
        self.assoc(args, LtlfNode::And)
    }

    pub fn or(&self, args: Vec<Ltlf>) -> Ltlf {
        self.assoc(args, LtlfNode::Or)
    }

    pub fn implies(&self, args: Vec<Ltlf>) -> Ltlf {
        assert!(args.len() >= 2);
        self.intern(LtlfNode::Implies(args))
    }

    pub fn equivalent(&self, args: Vec<Ltlf>) -> Ltlf {
        assert!(args.len() >= 2);
        self.intern(LtlfNode::Equivalent(args))
    }

    pub fn xor(&self, args: Vec<Ltlf>) -> Ltlf {
        assert!(args.len() >= 2);
        self.intern(LtlfNode::Xor(args))
    }

    /// Strong next: `X[!] f`.
    pub fn next(&self, f: Ltlf) -> Ltlf {
        self.intern(LtlfNode::Next(f))
    }

    /// Weak next: `X f`.
    pub fn weak_next(&self, f: Ltlf) -> Ltlf {
        self.intern(LtlfNode::WeakNext(f))
    }

    /// Right-associative n-ary until: `until([a, b, c])` is `a U (b U c)`.
    pub fn until(&self, args: Vec<Ltlf>) -> Ltlf {
        assert!(args.len() >= 2);
        self.intern(LtlfNode::Until(args))
    }

    pub fn release(&self, args: Vec<Ltlf>) -> Ltlf {
        assert!(args.len() >= 2);
        self.intern(LtlfNode::Release(args))
    }

    pub fn eventually(&self, f: Ltlf) -> Ltlf {
        self.intern(LtlfNode::Eventually(f))
    }

    pub fn always(&self, f: Ltlf) -> Ltlf {
        self.intern(LtlfNode::Always(f))
    }

    /// Render a formula in the concrete syntax. Used for logs and diagnostics.
    pub fn fmt(&self, f: Ltlf) -> String {
        let mut out = String::new();
        self.write(f, &mut out);
        out
    }

    fn write_joined(&self, args: &[Ltlf], sep: &str, out: &mut String) {
        out.push('(');
        for (i, &arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(sep);
            }
            self.write(arg, out);
        }
        out.push(')');
    }

    fn write(&self, f: Ltlf, out: &mut String) {
        match self.node(f) {
            LtlfNode::True => out.push_str("tt"),
            LtlfNode::False => out.push_str("ff"),
            LtlfNode::PropTrue => out.push_str("true"),
            LtlfNode::PropFalse => out.push_str("false"),
            LtlfNode::End => out.push_str("end"),
            LtlfNode::Atom(id) => out.push_str(&self.atom_name(id)),
            LtlfNode::Not(g) => {
                out.push('!');
                self.write(g, out);
            }
            LtlfNode::PropositionalNot(g) => {
                out.push('!');
                self.write(g, out);
            }
            LtlfNode::And(args) => self.write_joined(&args, " & ", out),
            LtlfNode::Or(args) => self.write_joined(&args, " | ", out),
            LtlfNode::Implies(args) => self.write_joined(&args, " -> ", out),
            LtlfNode::Equivalent(args) => self.write_joined(&args, " <-> ", out),
            LtlfNode::Xor(args) => self.write_joined(&args, " ^ ", out),
            LtlfNode::Next(g) => {
                out.push_str("X[!]");
                self.write_unary_arg(g, out);
            }
            LtlfNode::WeakNext(g) => {
                out.push('X');
                self.write_unary_arg(g, out);
            }
            LtlfNode::Until(args) => self.write_joined(&args, " U ", out),
            LtlfNode::Release(args) => self.write_joined(&args, " R ", out),
            LtlfNode::Eventually(g) => {
                out.push('F');
                self.write_unary_arg(g, out);
            }
            LtlfNode::Always(g) => {
                out.push('G');
                self.write_unary_arg(g, out);
            }
        }
    }

    fn write_unary_arg(&self, f: Ltlf, out: &mut String) {
        out.push('(');
        self.write(f, out);
        out.push(')');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn interning_is_structural() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let b = arena.atom("b");
        assert_ne!(a, b);
        assert_eq!(a, arena.atom("a"));

        let f = arena.and(vec![a, b]);
        let g = arena.and(vec![b, a]);
        assert_eq!(f, g, "commutative arguments are sorted before interning");

        let u = arena.until(vec![a, b]);
        let v = arena.until(vec![b, a]);
        assert_ne!(u, v, "until is not commutative");
    }

    #[test]
    fn fresh_atom_names_are_registered_on_first_use() {
        let arena = Arena::new();
        let a = arena.atom("request");
        let b = arena.atom("grant");
        assert_ne!(a, b);
        assert_eq!(arena.atom("request"), a);
        assert_eq!(arena.atom("grant"), b);
        assert_eq!(arena.atom_name(match arena.node(a) {
            LtlfNode::Atom(id) => id,
            _ => unreachable!(),
        }), "request");
    }

    #[test]
    fn singleton_connectives_collapse() {
        let arena = Arena::new();
        let a = arena.atom("a");
        assert_eq!(arena.and(vec![a, a]), a);
        assert_eq!(arena.or(vec![a]), a);
    }

    #[test]
    fn no_constant_absorption() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let f = arena.and(vec![arena.prop_true(), a]);
        assert!(matches!(arena.node(f), LtlfNode::And(args) if args.len() == 2));
    }

    #[test]
    fn double_propositional_negation_cancels() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let na = arena.prop_not(a);
        assert_eq!(arena.prop_not(na), a);
    }

    #[test]
    fn formatting() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let b = arena.atom("b");
        let f = arena.or(vec![arena.next(a), arena.weak_next(b)]);
        assert_eq!(arena.fmt(f), "(X[!](a) | X(b))");
        assert_eq!(arena.fmt(arena.not_end()), "!end");
    }
}
