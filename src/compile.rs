//! Compilation between XNF formulas and decision diagrams.
//!
//! Closure member `i` owns state variable `i + 1`; the propositions follow,
//! inputs first, then outputs, in partition order. An atom `a` compiles to
//!
//! ```text
//! (a & NEXT_TRUE) | (!a & NEXT_FALSE)
//! ```
//!
//! where `NEXT_TRUE`/`NEXT_FALSE` are the state literals of the boundary
//! markers `X[!](!end)` and `X(end)`: whichever way the players fix `a`, the
//! diagram records in the state component whether the obligation was met.
//! Decoding (`sdd_to_formula`) maps positive state literals back to their
//! closure formulas; a negative state literal over a non-atomic formula
//! decodes to `tt`, a sound weakening that discharges satisfied bookkeeping
//! markers.

use std::collections::HashMap;

use crate::closure::Closure;
use crate::error::SynthError;
use crate::logic::{Arena, Ltlf, LtlfNode};
use crate::partition::Partition;
use crate::sdd::{SddId, SddManager, SddNode};

/// Variable numbering shared by the compiler and the search.
#[derive(Debug)]
pub struct VarMap {
    state_count: u32,
    prop_vars: HashMap<Ltlf, u32>,
    var_props: HashMap<u32, Ltlf>,
    inputs: Vec<u32>,
    outputs: Vec<u32>,
}

impl VarMap {
    /// Assigns diagram variables and checks that every atom of the closure
    /// is declared by the partition.
    pub fn build(
        arena: &Arena,
        closure: &Closure,
        partition: &Partition,
    ) -> Result<Self, SynthError> {
        let state_count = closure.len() as u32;
        let mut prop_vars = HashMap::new();
        let mut var_props = HashMap::new();
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut next = state_count + 1;
        for name in &partition.inputs {
            let atom = arena.atom(name);
            prop_vars.insert(atom, next);
            var_props.insert(next, atom);
            inputs.push(next);
            next += 1;
        }
        for name in &partition.outputs {
            let atom = arena.atom(name);
            prop_vars.insert(atom, next);
            var_props.insert(next, atom);
            outputs.push(next);
            next += 1;
        }
        for &atom in closure.atoms() {
            if !prop_vars.contains_key(&atom) {
                let name = match arena.node(atom) {
                    LtlfNode::Atom(id) => arena.atom_name(id),
                    _ => unreachable!(),
                };
                return Err(SynthError::UndeclaredVariable(name));
            }
        }
        Ok(Self { state_count, prop_vars, var_props, inputs, outputs })
    }

    pub fn state_count(&self) -> u32 {
        self.state_count
    }

    pub fn num_inputs(&self) -> u32 {
        self.inputs.len() as u32
    }

    pub fn num_outputs(&self) -> u32 {
        self.outputs.len() as u32
    }

    pub fn inputs(&self) -> &[u32] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[u32] {
        &self.outputs
    }

    fn prop_var(&self, atom: Ltlf) -> Result<u32, SynthError> {
        self.prop_vars.get(&atom).copied().ok_or(SynthError::NotInClosure)
    }
}

/// Stateless view bundling everything a compilation step needs.
pub struct Encoder<'a> {
    pub arena: &'a Arena,
    pub closure: &'a Closure,
    pub vars: &'a VarMap,
    pub mgr: &'a SddManager,
}

impl Encoder<'_> {
    fn state_literal(&self, f: Ltlf) -> Result<SddId, SynthError> {
        let id = self.closure.id(f)?;
        Ok(self.mgr.literal(id as i32 + 1))
    }

    fn next_true(&self) -> Result<SddId, SynthError> {
        let marker = self.arena.next(self.arena.not_end());
        self.state_literal(marker)
    }

    fn next_false(&self) -> Result<SddId, SynthError> {
        let marker = self.arena.weak_next(self.arena.end());
        self.state_literal(marker)
    }

    /// Compiles an XNF formula into a diagram node.
    ///
    /// `tt`/`true` compile to the trivial true node and `ff`/`false` to the
    /// trivial false node; `End`/`Next`/`WeakNext` compile to their own
    /// state literal, atoms to the branching encoding described at the
    /// module level. Unexpanded temporal operators are rejected.
    pub fn to_sdd(&self, f: Ltlf) -> Result<SddId, SynthError> {
        let mut memo = HashMap::new();
        self.compile(f, &mut memo)
    }

    fn compile(&self, f: Ltlf, memo: &mut HashMap<Ltlf, SddId>) -> Result<SddId, SynthError> {
        if let Some(&n) = memo.get(&f) {
            return Ok(n);
        }
        let n = match self.arena.node(f) {
            LtlfNode::True | LtlfNode::PropTrue => self.mgr.true_sdd(),
            LtlfNode::False | LtlfNode::PropFalse => self.mgr.false_sdd(),
            LtlfNode::End | LtlfNode::Next(_) | LtlfNode::WeakNext(_) => self.state_literal(f)?,
            LtlfNode::Atom(_) => {
                let var = self.vars.prop_var(f)? as i32;
                let pos = self.mgr.conjoin(self.mgr.literal(var), self.next_true()?);
                let neg = self.mgr.conjoin(self.mgr.literal(-var), self.next_false()?);
                self.mgr.disjoin(pos, neg)
            }
            LtlfNode::PropositionalNot(g) => {
                let inner = self.compile(g, memo)?;
                self.mgr.negate(inner)
            }
            LtlfNode::And(args) => {
                let mut acc = self.mgr.true_sdd();
                for &g in &args {
                    acc = self.mgr.conjoin(acc, self.compile(g, memo)?);
                }
                acc
            }
            LtlfNode::Or(args) => {
                let mut acc = self.mgr.false_sdd();
                for &g in &args {
                    acc = self.mgr.disjoin(acc, self.compile(g, memo)?);
                }
                acc
            }
            LtlfNode::Implies(args) => {
                let mut acc = self.compile(args[args.len() - 1], memo)?;
                for &g in args[..args.len() - 1].iter().rev() {
                    acc = self.mgr.implies(self.compile(g, memo)?, acc);
                }
                acc
            }
            LtlfNode::Equivalent(args) => {
                // N-ary equivalence is the negated parity chain; folding
                // `equiv` pairwise would compute raw parity for three or
                // more arguments.
                let mut acc = self.compile(args[0], memo)?;
                for &g in &args[1..] {
                    acc = self.mgr.xor(acc, self.compile(g, memo)?);
                }
                self.mgr.negate(acc)
            }
            LtlfNode::Xor(args) => {
                let mut acc = self.compile(args[0], memo)?;
                for &g in &args[1..] {
                    acc = self.mgr.xor(acc, self.compile(g, memo)?);
                }
                acc
            }
            LtlfNode::Not(_)
            | LtlfNode::Until(_)
            | LtlfNode::Release(_)
            | LtlfNode::Eventually(_)
            | LtlfNode::Always(_) => return Err(SynthError::ExpectedXnf),
        };
        memo.insert(f, n);
        Ok(n)
    }

    /// Decodes a diagram node back into a formula over closure members and
    /// propositions. Total on well-formed diagrams.
    pub fn sdd_to_formula(&self, n: SddId) -> Ltlf {
        if self.mgr.is_true(n) {
            return self.arena.tt();
        }
        if self.mgr.is_false(n) {
            return self.arena.ff();
        }
        match self.mgr.node(n) {
            SddNode::Literal { literal, .. } => self.decode_literal(literal),
            SddNode::Decision { elements, .. } => {
                let disjuncts = elements
                    .iter()
                    .map(|e| {
                        self.arena.and(vec![
                            self.sdd_to_formula(e.prime),
                            self.sdd_to_formula(e.sub),
                        ])
                    })
                    .collect::<Vec<_>>();
                self.arena.or(disjuncts)
            }
            SddNode::False | SddNode::True => unreachable!(),
        }
    }

    fn decode_literal(&self, literal: i32) -> Ltlf {
        let var = literal.unsigned_abs();
        if var <= self.vars.state_count() {
            let f = self.closure.formula(var - 1);
            if literal > 0 {
                f
            } else if matches!(self.arena.node(f), LtlfNode::Atom(_)) {
                self.arena.prop_not(f)
            } else {
                // A negated state marker is a discharged bookkeeping
                // obligation; it carries no further constraint.
                self.arena.tt()
            }
        } else {
            let atom = self.vars.var_props[&var];
            if literal > 0 {
                atom
            } else {
                self.arena.prop_not(atom)
            }
        }
    }

    /// Under-approximate one-step win: if some output assignment keeps the
    /// returned diagram true for every input assignment, playing it and
    /// stopping satisfies the whole obligation. Returns the quantified
    /// diagram when it is not trivially false.
    pub fn one_step_realizability(&self, f: Ltlf) -> Result<Option<SddId>, SynthError> {
        let approx = self.one_step(f, false)?;
        let q = self.mgr.forall_vars(approx, self.vars.inputs().iter().copied());
        if self.mgr.is_false(q) {
            Ok(None)
        } else {
            Ok(Some(q))
        }
    }

    /// Over-approximate one-step loss: if for every output assignment some
    /// input assignment falsifies even the optimistic approximation, the
    /// obligation is hopeless.
    pub fn one_step_unrealizability(&self, f: Ltlf) -> Result<bool, SynthError> {
        let approx = self.one_step(f, true)?;
        let q = self.mgr.forall_vars(approx, self.vars.inputs().iter().copied());
        Ok(self.mgr.is_false(q))
    }

    /// Propositional abstraction of an NNF obligation for the one-step
    /// checks. Pessimistic (`optimistic == false`): a strong next can never
    /// be met within a single step. Optimistic: any next-step obligation
    /// might still work out.
    fn one_step(&self, f: Ltlf, optimistic: bool) -> Result<SddId, SynthError> {
        Ok(match self.arena.node(f) {
            LtlfNode::True | LtlfNode::PropTrue => self.mgr.true_sdd(),
            LtlfNode::False | LtlfNode::PropFalse | LtlfNode::End => self.mgr.false_sdd(),
            LtlfNode::Atom(_) => self.mgr.literal(self.vars.prop_var(f)? as i32),
            LtlfNode::PropositionalNot(g) => match self.arena.node(g) {
                LtlfNode::End => self.mgr.true_sdd(),
                LtlfNode::Atom(_) => self.mgr.literal(-(self.vars.prop_var(g)? as i32)),
                _ => return Err(SynthError::ExpectedNnf),
            },
            LtlfNode::Next(_) => {
                if optimistic {
                    self.mgr.true_sdd()
                } else {
                    self.mgr.false_sdd()
                }
            }
            LtlfNode::WeakNext(_) => self.mgr.true_sdd(),
            LtlfNode::And(args) => {
                let mut acc = self.mgr.true_sdd();
                for &g in &args {
                    acc = self.mgr.conjoin(acc, self.one_step(g, optimistic)?);
                }
                acc
            }
            LtlfNode::Or(args) => {
                let mut acc = self.mgr.false_sdd();
                for &g in &args {
                    acc = self.mgr.disjoin(acc, self.one_step(g, optimistic)?);
                }
                acc
            }
            // Until and release are judged by their rightmost argument: the
            // tail must hold at the stopping point either way.
            LtlfNode::Until(args) | LtlfNode::Release(args) => {
                self.one_step(args[args.len() - 1], optimistic)?
            }
            LtlfNode::Eventually(g) | LtlfNode::Always(g) => self.one_step(g, optimistic)?,
            LtlfNode::Not(_)
            | LtlfNode::Implies(_)
            | LtlfNode::Equivalent(_)
            | LtlfNode::Xor(_) => return Err(SynthError::ExpectedNnf),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnf::nnf;
    use crate::parser::parse;
    use crate::vtree::Vtree;
    use crate::xnf::xnf;
    use test_log::test;

    struct Fixture {
        arena: Arena,
        closure: Closure,
        vars: VarMap,
        mgr: SddManager,
        root: Ltlf,
    }

    fn fixture(text: &str, inputs: &[&str], outputs: &[&str]) -> Fixture {
        let arena = Arena::new();
        let root = nnf(&arena, parse(&arena, text).unwrap());
        let closure = Closure::of(&arena, root);
        let partition = Partition::new(
            inputs.iter().map(|s| s.to_string()).collect(),
            outputs.iter().map(|s| s.to_string()).collect(),
        );
        let vars = VarMap::build(&arena, &closure, &partition).unwrap();
        let vtree = Vtree::for_synthesis(
            vars.state_count(),
            vars.num_inputs(),
            vars.num_outputs(),
        );
        let mgr = SddManager::from_vtree(vtree);
        Fixture { arena, closure, vars, mgr, root }
    }

    impl Fixture {
        fn encoder(&self) -> Encoder<'_> {
            Encoder {
                arena: &self.arena,
                closure: &self.closure,
                vars: &self.vars,
                mgr: &self.mgr,
            }
        }
    }

    #[test]
    fn constants_compile_to_trivial_nodes() {
        let fx = fixture("tt", &["a"], &["b"]);
        let enc = fx.encoder();
        for (f, trivial) in [
            (fx.arena.tt(), fx.mgr.true_sdd()),
            (fx.arena.ff(), fx.mgr.false_sdd()),
            (fx.arena.prop_true(), fx.mgr.true_sdd()),
            (fx.arena.prop_false(), fx.mgr.false_sdd()),
        ] {
            let n = enc.to_sdd(f).unwrap();
            assert_eq!(n, trivial);
            assert_eq!(fx.mgr.size(n), 0);
        }
    }

    #[test]
    fn atoms_compile_to_branching_decisions() {
        let fx = fixture("b", &["a"], &["b"]);
        let enc = fx.encoder();
        let n = enc.to_sdd(fx.root).unwrap();
        assert!(fx.mgr.is_decision(n));
        assert!(fx.mgr.size(n) > 0);
        // Branching on an output: normalized at the system split.
        assert_eq!(fx.mgr.node_vtree(n), fx.mgr.vtree().system_split());
    }

    #[test]
    fn undeclared_atoms_are_rejected() {
        let arena = Arena::new();
        let root = parse(&arena, "a & z").unwrap();
        let closure = Closure::of(&arena, root);
        let partition = Partition::new(vec!["a".into()], vec![]);
        let err = VarMap::build(&arena, &closure, &partition).unwrap_err();
        assert!(matches!(err, SynthError::UndeclaredVariable(name) if name == "z"));
    }

    #[test]
    fn unexpanded_temporal_operators_are_rejected() {
        let fx = fixture("a U b", &["a"], &["b"]);
        let enc = fx.encoder();
        assert!(matches!(enc.to_sdd(fx.root), Err(SynthError::ExpectedXnf)));
        let expanded = xnf(&fx.arena, fx.root).unwrap();
        assert!(enc.to_sdd(expanded).is_ok());
    }

    #[test]
    fn next_operators_compile_to_state_literals() {
        let fx = fixture("X[!] a", &[], &["a"]);
        let enc = fx.encoder();
        let n = enc.to_sdd(fx.root).unwrap();
        assert!(fx.mgr.is_literal(n));
        let id = fx.closure.id(fx.root).unwrap();
        assert_eq!(fx.mgr.literal_of(n), Some(id as i32 + 1));
    }

    #[test]
    fn decode_inverts_positive_state_literals() {
        let fx = fixture("X[!] a", &[], &["a"]);
        let enc = fx.encoder();
        let n = enc.to_sdd(fx.root).unwrap();
        assert_eq!(enc.sdd_to_formula(n), fx.root);
    }

    #[test]
    fn negative_marker_literals_decode_to_tt() {
        let fx = fixture("X[!] a", &[], &["a"]);
        let enc = fx.encoder();
        let id = fx.closure.id(fx.root).unwrap();
        let neg = fx.mgr.literal(-(id as i32 + 1));
        assert_eq!(enc.sdd_to_formula(neg), fx.arena.tt());
    }

    #[test]
    fn negative_end_literal_also_decodes_to_tt() {
        // `end` is a marker, not an atom: its discharged form is trivial.
        let fx = fixture("tt", &["a"], &["b"]);
        let enc = fx.encoder();
        let end_id = fx.closure.id(fx.arena.end()).unwrap();
        let neg = fx.mgr.literal(-(end_id as i32 + 1));
        assert_eq!(enc.sdd_to_formula(neg), fx.arena.tt());
    }

    #[test]
    fn decode_of_decision_nodes_is_a_dnf_over_elements() {
        let fx = fixture("b", &["a"], &["b"]);
        let enc = fx.encoder();
        let n = enc.to_sdd(fx.root).unwrap();
        let decoded = enc.sdd_to_formula(n);
        let b = fx.arena.atom("b");
        let next_true = fx.arena.next(fx.arena.not_end());
        let next_false = fx.arena.weak_next(fx.arena.end());
        let expected = fx.arena.or(vec![
            fx.arena.and(vec![b, next_true]),
            fx.arena.and(vec![fx.arena.prop_not(b), next_false]),
        ]);
        assert_eq!(decoded, expected);
    }

    #[test]
    fn nary_equivalence_compiles_to_negated_parity() {
        let fx = fixture("a & b & c", &[], &["a", "b", "c"]);
        let enc = fx.encoder();
        let a = fx.arena.atom("a");
        let b = fx.arena.atom("b");
        let c = fx.arena.atom("c");
        let equiv = enc.to_sdd(fx.arena.equivalent(vec![a, b, c])).unwrap();
        let parity = enc.to_sdd(fx.arena.xor(vec![a, b, c])).unwrap();
        assert_eq!(equiv, fx.mgr.negate(parity));
    }

    #[test]
    fn one_step_realizability_finds_output_wins() {
        let fx = fixture("b", &["a"], &["b"]);
        let enc = fx.encoder();
        assert!(enc.one_step_realizability(fx.root).unwrap().is_some());

        // An input obligation cannot be forced.
        let fx = fixture("a", &["a"], &["b"]);
        let enc = fx.encoder();
        assert!(enc.one_step_realizability(fx.root).unwrap().is_none());
    }

    #[test]
    fn one_step_unrealizability_detects_hopeless_obligations() {
        let fx = fixture("a", &["a"], &["b"]);
        let enc = fx.encoder();
        assert!(enc.one_step_unrealizability(fx.root).unwrap());

        let fx = fixture("b", &["a"], &["b"]);
        let enc = fx.encoder();
        assert!(!enc.one_step_unrealizability(fx.root).unwrap());
    }

    #[test]
    fn one_step_checks_use_the_until_tail() {
        // a U b with output b: satisfiable in one step by granting b.
        let fx = fixture("a U b", &["a"], &["b"]);
        let enc = fx.encoder();
        assert!(enc.one_step_realizability(fx.root).unwrap().is_some());

        // a U b with input b: the environment withholds b forever.
        let fx = fixture("a U b", &["b"], &["a"]);
        let enc = fx.encoder();
        assert!(enc.one_step_realizability(fx.root).unwrap().is_none());
        assert!(enc.one_step_unrealizability(fx.root).unwrap());
    }

    #[test]
    fn strong_next_blocks_pessimistic_one_step() {
        let fx = fixture("X[!] b", &["a"], &["b"]);
        let enc = fx.encoder();
        assert!(enc.one_step_realizability(fx.root).unwrap().is_none());
        // But optimistically it may still work out.
        assert!(!enc.one_step_unrealizability(fx.root).unwrap());
    }
}
