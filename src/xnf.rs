//! Next normal form and next-stripping.
//!
//! XNF unfolds every temporal operator by one step, so that the only
//! temporal operators left at the top of the formula are `Next`/`WeakNext`
//! wrapping *unexpanded* subformulas. The result is what the compiler turns
//! into a decision diagram for one round of the game.
//!
//! `strip_next` is the inverse move at the start of the following round: it
//! peels one layer of next operators off a decoded obligation, recording
//! whether the step just taken was mandatory (`X[!] f` becomes `f & !end`)
//! or optional (`X f` becomes `f | end`).

use std::collections::HashMap;

use crate::error::SynthError;
use crate::logic::{Arena, Ltlf, LtlfNode};

/// Rewrites an NNF formula into next normal form.
///
/// Temporal fixpoints are unfolded one step:
///
/// ```text
/// h U t  =>  xnf(t) | (xnf(h) & X[!](h U t))
/// h R t  =>  xnf(t) & (xnf(h) | X(h R t))
/// F f    =>  (true & xnf(f)) | X[!](F f)
/// G f    =>  (false | xnf(f)) & X(G f)
/// ```
///
/// The `true`/`false` operands are kept verbatim: the compiler gives them a
/// meaning, and the formula factories never absorb them.
pub fn xnf(arena: &Arena, f: Ltlf) -> Result<Ltlf, SynthError> {
    let mut memo = HashMap::new();
    walk(arena, f, &mut memo)
}

fn walk(arena: &Arena, f: Ltlf, memo: &mut HashMap<Ltlf, Ltlf>) -> Result<Ltlf, SynthError> {
    if let Some(&g) = memo.get(&f) {
        return Ok(g);
    }
    let g = rewrite(arena, f, memo)?;
    memo.insert(f, g);
    Ok(g)
}

fn rewrite(arena: &Arena, f: Ltlf, memo: &mut HashMap<Ltlf, Ltlf>) -> Result<Ltlf, SynthError> {
    Ok(match arena.node(f) {
        LtlfNode::True
        | LtlfNode::False
        | LtlfNode::PropTrue
        | LtlfNode::PropFalse
        | LtlfNode::End
        | LtlfNode::Atom(_)
        | LtlfNode::PropositionalNot(_)
        | LtlfNode::Next(_)
        | LtlfNode::WeakNext(_) => f,
        LtlfNode::And(args) => {
            let args = args
                .iter()
                .map(|&g| walk(arena, g, memo))
                .collect::<Result<Vec<_>, _>>()?;
            arena.and(args)
        }
        LtlfNode::Or(args) => {
            let args = args
                .iter()
                .map(|&g| walk(arena, g, memo))
                .collect::<Result<Vec<_>, _>>()?;
            arena.or(args)
        }
        LtlfNode::Until(ref args) => {
            let head = walk(arena, args[0], memo)?;
            let tail = walk(arena, tail_of(arena, args, true), memo)?;
            arena.or(vec![tail, arena.and(vec![head, arena.next(f)])])
        }
        LtlfNode::Release(ref args) => {
            let head = walk(arena, args[0], memo)?;
            let tail = walk(arena, tail_of(arena, args, false), memo)?;
            arena.and(vec![tail, arena.or(vec![head, arena.weak_next(f)])])
        }
        LtlfNode::Eventually(g) => {
            let now = arena.and(vec![arena.prop_true(), walk(arena, g, memo)?]);
            arena.or(vec![now, arena.next(f)])
        }
        LtlfNode::Always(g) => {
            let now = arena.or(vec![arena.prop_false(), walk(arena, g, memo)?]);
            arena.and(vec![now, arena.weak_next(f)])
        }
        LtlfNode::Not(_)
        | LtlfNode::Implies(_)
        | LtlfNode::Equivalent(_)
        | LtlfNode::Xor(_) => return Err(SynthError::ExpectedNnf),
    })
}

/// Tail of a right-associated n-ary until/release.
fn tail_of(arena: &Arena, args: &[Ltlf], until: bool) -> Ltlf {
    if args.len() == 2 {
        args[1]
    } else if until {
        arena.until(args[1..].to_vec())
    } else {
        arena.release(args[1..].to_vec())
    }
}

/// Peels one layer of next operators off an XNF-shaped obligation.
///
/// `X[!] f` becomes `f & !end` (a successor position must exist), `X f`
/// becomes `f | end` (satisfied outright if the trace stops here). And/Or
/// structure is traversed; everything else passes through unchanged.
pub fn strip_next(arena: &Arena, f: Ltlf) -> Ltlf {
    match arena.node(f) {
        LtlfNode::Next(g) => arena.and(vec![g, arena.not_end()]),
        LtlfNode::WeakNext(g) => arena.or(vec![g, arena.end()]),
        LtlfNode::And(args) => {
            let args = args.iter().map(|&g| strip_next(arena, g)).collect();
            arena.and(args)
        }
        LtlfNode::Or(args) => {
            let args = args.iter().map(|&g| strip_next(arena, g)).collect();
            arena.or(args)
        }
        _ => f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnf::nnf;
    use crate::parser::parse;
    use test_log::test;

    #[test]
    fn propositional_formulas_are_fixed_points() {
        let arena = Arena::new();
        for text in ["a", "a & b", "(a | b) & c", "tt"] {
            let f = nnf(&arena, parse(&arena, text).unwrap());
            assert_eq!(xnf(&arena, f).unwrap(), f);
        }
        let end = arena.end();
        assert_eq!(xnf(&arena, end).unwrap(), end);
        let not_end = arena.not_end();
        assert_eq!(xnf(&arena, not_end).unwrap(), not_end);
    }

    #[test]
    fn until_unfolds_one_step() {
        let arena = Arena::new();
        let u = parse(&arena, "a U b").unwrap();
        let a = arena.atom("a");
        let b = arena.atom("b");
        let expected = arena.or(vec![b, arena.and(vec![a, arena.next(u)])]);
        assert_eq!(xnf(&arena, u).unwrap(), expected);
    }

    #[test]
    fn release_unfolds_one_step() {
        let arena = Arena::new();
        let r = parse(&arena, "a R b").unwrap();
        let a = arena.atom("a");
        let b = arena.atom("b");
        let expected = arena.and(vec![b, arena.or(vec![a, arena.weak_next(r)])]);
        assert_eq!(xnf(&arena, r).unwrap(), expected);
    }

    #[test]
    fn eventually_keeps_a_true_witness() {
        let arena = Arena::new();
        let f = parse(&arena, "F a").unwrap();
        let a = arena.atom("a");
        let now = arena.and(vec![arena.prop_true(), a]);
        let expected = arena.or(vec![now, arena.next(f)]);
        assert_eq!(xnf(&arena, f).unwrap(), expected);
    }

    #[test]
    fn always_keeps_a_false_witness() {
        let arena = Arena::new();
        let f = parse(&arena, "G a").unwrap();
        let a = arena.atom("a");
        let now = arena.or(vec![arena.prop_false(), a]);
        let expected = arena.and(vec![now, arena.weak_next(f)]);
        assert_eq!(xnf(&arena, f).unwrap(), expected);
    }

    #[test]
    fn next_arguments_stay_unexpanded() {
        let arena = Arena::new();
        let f = nnf(&arena, parse(&arena, "X[!](a U b)").unwrap());
        assert_eq!(xnf(&arena, f).unwrap(), f);
    }

    #[test]
    fn nary_until_splits_head_and_tail() {
        let arena = Arena::new();
        let f = arena.until(vec![arena.atom("a"), arena.atom("b"), arena.atom("c")]);
        let g = xnf(&arena, f).unwrap();
        // a U (b U c)  =>  xnf(b U c) | (a & X[!](a U (b U c)))
        let tail = arena.until(vec![arena.atom("b"), arena.atom("c")]);
        let tail_x = xnf(&arena, tail).unwrap();
        let expected = arena.or(vec![
            tail_x,
            arena.and(vec![arena.atom("a"), arena.next(f)]),
        ]);
        assert_eq!(g, expected);
    }

    #[test]
    fn rejects_raw_negation() {
        let arena = Arena::new();
        let f = parse(&arena, "!(a U b)").unwrap();
        assert!(matches!(xnf(&arena, f), Err(SynthError::ExpectedNnf)));
    }

    #[test]
    fn strip_next_records_step_kind() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let strong = arena.next(a);
        assert_eq!(
            strip_next(&arena, strong),
            arena.and(vec![a, arena.not_end()])
        );
        let weak = arena.weak_next(a);
        assert_eq!(strip_next(&arena, weak), arena.or(vec![a, arena.end()]));
    }

    #[test]
    fn strip_next_traverses_and_or() {
        let arena = Arena::new();
        let a = arena.atom("a");
        let b = arena.atom("b");
        let f = arena.or(vec![arena.next(a), arena.weak_next(b)]);
        let expected = arena.or(vec![
            arena.and(vec![a, arena.not_end()]),
            arena.or(vec![b, arena.end()]),
        ]);
        assert_eq!(strip_next(&arena, f), expected);
    }

    #[test]
    fn strip_next_leaves_untouched_operators() {
        let arena = Arena::new();
        let u = parse(&arena, "a U b").unwrap();
        assert_eq!(strip_next(&arena, u), u);
    }
}
