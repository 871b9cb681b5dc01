//! Subformula closure.
//!
//! Collects every distinct subformula of an NNF/XNF root in a deterministic
//! depth-first order and assigns each one a dense id. Closure ids become the
//! state variables of the decision diagrams: variable `id + 1` stands for
//! the obligation "this subformula must hold from the next position on".
//!
//! Four boundary markers are appended after the traversal, in a fixed order,
//! whether or not they already occur in the formula:
//!
//! ```text
//! X[!](!end)   the "atom satisfied" continuation
//! X(end)       the "atom falsified" continuation
//! !end         still at a real position
//! end          past the last position
//! ```
//!
//! Atom compilation relies on the first two being present in every closure.
//!
//! Every temporal fixpoint member also contributes the wrapper its one-step
//! unfolding defers to: `Until`/`Eventually` insert `Next(themselves)`,
//! `Release`/`Always` insert `WeakNext(themselves)` (and an n-ary
//! until/release inserts its right-associated tail, which its unfolding
//! spells out). These wrappers are what the compiler turns into state
//! literals, so they must carry closure ids of their own.

use std::collections::HashMap;

use crate::error::SynthError;
use crate::logic::{Arena, Ltlf, LtlfNode};

pub struct Closure {
    ids: HashMap<Ltlf, u32>,
    formulas: Vec<Ltlf>,
    atoms: Vec<Ltlf>,
    negated_atoms: Vec<Ltlf>,
}

impl Closure {
    /// Builds the closure of `root`, markers included.
    pub fn of(arena: &Arena, root: Ltlf) -> Self {
        let mut closure = Self {
            ids: HashMap::new(),
            formulas: Vec::new(),
            atoms: Vec::new(),
            negated_atoms: Vec::new(),
        };
        closure.visit(arena, root);
        let end = arena.end();
        let not_end = arena.not_end();
        for marker in [arena.next(not_end), arena.weak_next(end), not_end, end] {
            closure.insert(marker);
        }
        log::debug!(
            "closure of {} has {} formulas ({} atoms)",
            arena.fmt(root),
            closure.len(),
            closure.atoms.len()
        );
        closure
    }

    fn insert(&mut self, f: Ltlf) -> bool {
        if self.ids.contains_key(&f) {
            return false;
        }
        self.ids.insert(f, self.formulas.len() as u32);
        self.formulas.push(f);
        true
    }

    fn visit(&mut self, arena: &Arena, f: Ltlf) {
        if !self.insert(f) {
            return;
        }
        match arena.node(f) {
            LtlfNode::True
            | LtlfNode::False
            | LtlfNode::PropTrue
            | LtlfNode::PropFalse
            | LtlfNode::End => {}
            LtlfNode::Atom(_) => self.atoms.push(f),
            LtlfNode::PropositionalNot(g) => {
                if matches!(arena.node(g), LtlfNode::Atom(_))
                    && !self.negated_atoms.contains(&g)
                {
                    self.negated_atoms.push(g);
                }
                self.visit(arena, g);
            }
            LtlfNode::Not(g) | LtlfNode::Next(g) | LtlfNode::WeakNext(g) => self.visit(arena, g),
            LtlfNode::Eventually(g) => {
                self.insert(arena.next(f));
                self.visit(arena, g);
            }
            LtlfNode::Always(g) => {
                self.insert(arena.weak_next(f));
                self.visit(arena, g);
            }
            LtlfNode::Until(args) => {
                self.insert(arena.next(f));
                if args.len() > 2 {
                    self.visit(arena, arena.until(args[1..].to_vec()));
                }
                for g in args {
                    self.visit(arena, g);
                }
            }
            LtlfNode::Release(args) => {
                self.insert(arena.weak_next(f));
                if args.len() > 2 {
                    self.visit(arena, arena.release(args[1..].to_vec()));
                }
                for g in args {
                    self.visit(arena, g);
                }
            }
            LtlfNode::And(args)
            | LtlfNode::Or(args)
            | LtlfNode::Implies(args)
            | LtlfNode::Equivalent(args)
            | LtlfNode::Xor(args) => {
                for g in args {
                    self.visit(arena, g);
                }
            }
        }
    }

    /// Number of closure members, markers included.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Dense id of a closure member.
    pub fn id(&self, f: Ltlf) -> Result<u32, SynthError> {
        self.ids.get(&f).copied().ok_or(SynthError::NotInClosure)
    }

    /// Inverse of [`Closure::id`].
    pub fn formula(&self, id: u32) -> Ltlf {
        self.formulas[id as usize]
    }

    /// Members in id order.
    pub fn formulas(&self) -> &[Ltlf] {
        &self.formulas
    }

    /// Atoms of the root formula, in first-visit order.
    pub fn atoms(&self) -> &[Ltlf] {
        &self.atoms
    }

    /// Atoms that occur under propositional negation.
    pub fn negated_atoms(&self) -> &[Ltlf] {
        &self.negated_atoms
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnf::nnf;
    use crate::parser::parse;
    use test_log::test;

    #[test]
    fn trivial_formula_closure_is_exactly_the_markers() {
        let arena = Arena::new();
        let tt = arena.tt();
        let closure = Closure::of(&arena, tt);
        let end = arena.end();
        let not_end = arena.not_end();
        let expected = vec![
            tt,
            arena.next(not_end),
            arena.weak_next(end),
            not_end,
            end,
        ];
        assert_eq!(closure.formulas(), &expected[..]);
        assert_eq!(closure.len(), 5);
        for (i, &f) in expected.iter().enumerate() {
            assert_eq!(closure.id(f).unwrap(), i as u32);
            assert_eq!(closure.formula(i as u32), f);
        }
    }

    #[test]
    fn subformulas_get_dense_ids_in_visit_order() {
        let arena = Arena::new();
        let f = parse(&arena, "a U b").unwrap();
        let closure = Closure::of(&arena, f);
        assert_eq!(closure.id(f).unwrap(), 0);
        assert_eq!(closure.id(arena.next(f)).unwrap(), 1);
        assert_eq!(closure.id(arena.atom("a")).unwrap(), 2);
        assert_eq!(closure.id(arena.atom("b")).unwrap(), 3);
        assert_eq!(closure.len(), 8);
        assert_eq!(closure.atoms().len(), 2);
    }

    #[test]
    fn temporal_members_contribute_their_unfolding_wrappers() {
        let arena = Arena::new();
        let u = parse(&arena, "a U b").unwrap();
        assert!(Closure::of(&arena, u).id(arena.next(u)).is_ok());
        let r = parse(&arena, "a R b").unwrap();
        assert!(Closure::of(&arena, r).id(arena.weak_next(r)).is_ok());
        let f = parse(&arena, "F a").unwrap();
        assert!(Closure::of(&arena, f).id(arena.next(f)).is_ok());
        let g = parse(&arena, "G a").unwrap();
        assert!(Closure::of(&arena, g).id(arena.weak_next(g)).is_ok());

        // Nested fixpoints get wrappers too.
        let nested = parse(&arena, "F (a U b)").unwrap();
        let closure = Closure::of(&arena, nested);
        assert!(closure.id(arena.next(nested)).is_ok());
        assert!(closure.id(arena.next(u)).is_ok());
    }

    #[test]
    fn nary_until_tails_are_closure_members() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let b = arena.atom("b");
        let c = arena.atom("c");
        let f = arena.until(vec![a, b, c]);
        let closure = Closure::of(&arena, f);
        let tail = arena.until(vec![b, c]);
        assert!(closure.id(tail).is_ok());
        assert!(closure.id(arena.next(tail)).is_ok());
    }

    #[test]
    fn closure_of_ff_is_exactly_the_markers() {
        let arena = Arena::new();
        let ff = arena.ff();
        let closure = Closure::of(&arena, ff);
        let end = arena.end();
        let not_end = arena.not_end();
        let expected = vec![
            ff,
            arena.next(not_end),
            arena.weak_next(end),
            not_end,
            end,
        ];
        assert_eq!(closure.formulas(), &expected[..]);
    }

    #[test]
    fn closure_is_deterministic() {
        let arena = Arena::new();
        let f = nnf(&arena, parse(&arena, "!(a U b) | F c").unwrap());
        let first: Vec<_> = Closure::of(&arena, f).formulas().to_vec();
        let second: Vec<_> = Closure::of(&arena, f).formulas().to_vec();
        assert_eq!(first, second);
    }

    #[test]
    fn markers_are_not_duplicated() {
        let arena = Arena::new();
        // `!a` in NNF mentions `end` already.
        let f = nnf(&arena, parse(&arena, "!a").unwrap());
        let closure = Closure::of(&arena, f);
        let end = arena.end();
        let occurrences = closure.formulas().iter().filter(|&&g| g == end).count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn negated_atoms_are_recorded() {
        let arena = Arena::new();
        let f = nnf(&arena, parse(&arena, "!a & (b | !c)").unwrap());
        let closure = Closure::of(&arena, f);
        assert_eq!(
            closure.negated_atoms(),
            &[arena.atom("a"), arena.atom("c")][..]
        );
    }

    #[test]
    fn missing_formula_is_an_error() {
        let arena = Arena::new();
        let closure = Closure::of(&arena, arena.tt());
        let stranger = arena.atom("z");
        assert!(matches!(closure.id(stranger), Err(SynthError::NotInClosure)));
    }
}
