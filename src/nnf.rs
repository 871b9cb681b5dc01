//! Negation normal form.
//!
//! Pushes negation to the atoms, turning `Not` into `PropositionalNot` and
//! rewriting `Implies`/`Equivalent`/`Xor` through their Or/Xor duals. The
//! result contains no `Not`, `Implies`, `Equivalent` or `Xor` nodes.
//!
//! A negated atom is finite-trace aware: `!a` becomes `!a | end`, because on
//! an already-ended trace no atom holds, so its negation does.

use std::collections::HashMap;

use crate::logic::{Arena, Ltlf, LtlfNode};

/// Rewrites `f` into negation normal form. Total: every connective has a
/// dual, so no error case exists.
pub fn nnf(arena: &Arena, f: Ltlf) -> Ltlf {
    let mut memo = HashMap::new();
    walk(arena, f, false, &mut memo)
}

fn walk(arena: &Arena, f: Ltlf, negated: bool, memo: &mut HashMap<(Ltlf, bool), Ltlf>) -> Ltlf {
    if let Some(&g) = memo.get(&(f, negated)) {
        return g;
    }
    let g = rewrite(arena, f, negated, memo);
    memo.insert((f, negated), g);
    g
}

fn rewrite(arena: &Arena, f: Ltlf, negated: bool, memo: &mut HashMap<(Ltlf, bool), Ltlf>) -> Ltlf {
    let pos = |arena: &Arena, g: Ltlf, memo: &mut HashMap<_, _>| walk(arena, g, negated, memo);
    let neg = |arena: &Arena, g: Ltlf, memo: &mut HashMap<_, _>| walk(arena, g, !negated, memo);
    match arena.node(f) {
        LtlfNode::True => {
            if negated {
                arena.ff()
            } else {
                f
            }
        }
        LtlfNode::False => {
            if negated {
                arena.tt()
            } else {
                f
            }
        }
        LtlfNode::PropTrue => {
            if negated {
                arena.prop_false()
            } else {
                f
            }
        }
        LtlfNode::PropFalse => {
            if negated {
                arena.prop_true()
            } else {
                f
            }
        }
        LtlfNode::End => {
            if negated {
                arena.not_end()
            } else {
                f
            }
        }
        LtlfNode::Atom(_) => {
            if negated {
                // On the empty suffix every atom is false, hence its negation
                // holds; the `end` disjunct keeps that case.
                arena.or(vec![arena.prop_not(f), arena.end()])
            } else {
                f
            }
        }
        LtlfNode::PropositionalNot(g) => {
            if negated {
                // Double negation cancels.
                neg(arena, g, memo)
            } else {
                f
            }
        }
        LtlfNode::Not(g) => neg(arena, g, memo),
        LtlfNode::And(args) => {
            let args = args.iter().map(|&g| pos(arena, g, memo)).collect();
            if negated {
                arena.or(args)
            } else {
                arena.and(args)
            }
        }
        LtlfNode::Or(args) => {
            let args = args.iter().map(|&g| pos(arena, g, memo)).collect();
            if negated {
                arena.and(args)
            } else {
                arena.or(args)
            }
        }
        LtlfNode::Implies(args) => {
            // a1 -> ... -> an  ==  !a1 | ... | !a(n-1) | an
            let (&last, init) = match args.split_last() {
                Some(split) => split,
                None => unreachable!("implies is at least binary"),
            };
            // De Morgan turns the negated expansion into a conjunction over
            // the same children: the antecedents stay positive, the final
            // consequent flips.
            let mut parts: Vec<Ltlf> = init.iter().map(|&g| neg(arena, g, memo)).collect();
            parts.push(pos(arena, last, memo));
            if negated {
                arena.and(parts)
            } else {
                arena.or(parts)
            }
        }
        LtlfNode::Equivalent(args) => xor_chain(arena, &args, negated, memo),
        LtlfNode::Xor(args) => xor_chain(arena, &args, !negated, memo),
        LtlfNode::Next(g) => {
            let g = pos(arena, g, memo);
            if negated {
                arena.weak_next(g)
            } else {
                arena.next(g)
            }
        }
        LtlfNode::WeakNext(g) => {
            let g = pos(arena, g, memo);
            if negated {
                arena.next(g)
            } else {
                arena.weak_next(g)
            }
        }
        LtlfNode::Until(args) => {
            let args = args.iter().map(|&g| pos(arena, g, memo)).collect();
            if negated {
                arena.release(args)
            } else {
                arena.until(args)
            }
        }
        LtlfNode::Release(args) => {
            let args = args.iter().map(|&g| pos(arena, g, memo)).collect();
            if negated {
                arena.until(args)
            } else {
                arena.release(args)
            }
        }
        LtlfNode::Eventually(g) => {
            let g = pos(arena, g, memo);
            if negated {
                arena.always(g)
            } else {
                arena.eventually(g)
            }
        }
        LtlfNode::Always(g) => {
            let g = pos(arena, g, memo);
            if negated {
                arena.eventually(g)
            } else {
                arena.always(g)
            }
        }
    }
}

/// Expands an n-ary parity chain. `odd == true` builds XOR, `odd == false`
/// its negation (n-ary equivalence).
fn xor_chain(
    arena: &Arena,
    args: &[Ltlf],
    odd: bool,
    memo: &mut HashMap<(Ltlf, bool), Ltlf>,
) -> Ltlf {
    // xor(a, b)  ==  (a & !b) | (!a & b), folded left over the chain. Both
    // polarities of every prefix are needed, so expand pairwise.
    let mut t = walk(arena, args[0], false, memo);
    let mut nt = walk(arena, args[0], true, memo);
    for &arg in &args[1..] {
        let a = walk(arena, arg, false, memo);
        let na = walk(arena, arg, true, memo);
        let xor = arena.or(vec![arena.and(vec![t, na]), arena.and(vec![nt, a])]);
        let xnor = arena.or(vec![arena.and(vec![t, a]), arena.and(vec![nt, na])]);
        t = xor;
        nt = xnor;
    }
    if odd {
        t
    } else {
        nt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use test_log::test;

    fn nnf_str(text: &str) -> String {
        let arena = Arena::new();
        let f = parse(&arena, text).unwrap();
        arena.fmt(nnf(&arena, f))
    }

    fn contains_not(arena: &Arena, f: Ltlf) -> bool {
        match arena.node(f) {
            LtlfNode::Not(_)
            | LtlfNode::Implies(_)
            | LtlfNode::Equivalent(_)
            | LtlfNode::Xor(_) => true,
            LtlfNode::PropositionalNot(_) => false,
            LtlfNode::And(args)
            | LtlfNode::Or(args)
            | LtlfNode::Until(args)
            | LtlfNode::Release(args) => args.iter().any(|&g| contains_not(arena, g)),
            LtlfNode::Next(g)
            | LtlfNode::WeakNext(g)
            | LtlfNode::Eventually(g)
            | LtlfNode::Always(g) => contains_not(arena, g),
            _ => false,
        }
    }

    #[test]
    fn negated_atom_gains_end_disjunct() {
        assert_eq!(nnf_str("!a"), "(!a | end)");
    }

    #[test]
    fn temporal_duals() {
        let arena = Arena::new();
        let f = parse(&arena, "!(a U b)").unwrap();
        let g = nnf(&arena, f);
        let na = nnf(&arena, parse(&arena, "!a").unwrap());
        let nb = nnf(&arena, parse(&arena, "!b").unwrap());
        assert_eq!(g, arena.release(vec![na, nb]));

        let f = parse(&arena, "!G a").unwrap();
        let g = nnf(&arena, f);
        assert_eq!(g, arena.eventually(na));

        let f = parse(&arena, "!X[!] a").unwrap();
        assert_eq!(nnf(&arena, f), arena.weak_next(na));
        let f = parse(&arena, "!X a").unwrap();
        assert_eq!(nnf(&arena, f), arena.next(na));
    }

    #[test]
    fn constants() {
        assert_eq!(nnf_str("!tt"), "ff");
        assert_eq!(nnf_str("!true"), "false");
    }

    #[test]
    fn no_forbidden_nodes_remain() {
        let arena = Arena::new();
        for text in [
            "!(a & (b | !c))",
            "a -> b -> c",
            "!(a <-> b)",
            "a ^ b ^ c",
            "!((a U b) R (F c <-> G d))",
        ] {
            let f = parse(&arena, text).unwrap();
            let g = nnf(&arena, f);
            assert!(!contains_not(&arena, g), "{text} => {}", arena.fmt(g));
        }
    }

    #[test]
    fn idempotent() {
        let arena = Arena::new();
        for text in ["!(a U b)", "a -> (b <-> c)", "!F(a & !b)"] {
            let f = parse(&arena, text).unwrap();
            let g = nnf(&arena, f);
            assert_eq!(g, nnf(&arena, g));
        }
    }

    #[test]
    fn double_negation() {
        assert_eq!(nnf_str("!!a"), "a");
        assert_eq!(nnf_str("!!!a"), "(!a | end)");
    }

    #[test]
    fn nnf_preserves_empty_trace_evaluation() {
        use crate::eval::eval;
        let arena = Arena::new();
        for text in [
            "a -> b",
            "a <-> b",
            "a ^ b",
            "a <-> b <-> c",
            "a ^ b ^ c",
            "G a -> F b",
            "X a ^ X[!] b",
            "(a -> b) -> c",
        ] {
            let f = parse(&arena, text).unwrap();
            let before = eval(&arena, f).unwrap();
            let after = eval(&arena, nnf(&arena, f)).unwrap();
            assert_eq!(before, after, "{text}");
        }
    }

    #[test]
    fn negated_implication_keeps_antecedents_positive() {
        let arena = Arena::new();
        let f = parse(&arena, "!(a -> b)").unwrap();
        let a = arena.atom("a");
        let nb = nnf(&arena, parse(&arena, "!b").unwrap());
        assert_eq!(nnf(&arena, f), arena.and(vec![a, nb]));
    }

    #[test]
    fn equivalence_and_xor_expand_to_their_own_parities() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let b = arena.atom("b");
        let na = nnf(&arena, parse(&arena, "!a").unwrap());
        let nb = nnf(&arena, parse(&arena, "!b").unwrap());

        let equiv = nnf(&arena, parse(&arena, "a <-> b").unwrap());
        let expected = arena.or(vec![arena.and(vec![a, b]), arena.and(vec![na, nb])]);
        assert_eq!(equiv, expected);

        let xor = nnf(&arena, parse(&arena, "a ^ b").unwrap());
        let expected = arena.or(vec![arena.and(vec![a, nb]), arena.and(vec![na, b])]);
        assert_eq!(xor, expected);
    }
}
