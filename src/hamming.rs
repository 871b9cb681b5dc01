//! Syntactic distance-to-acceptance estimate.
//!
//! A rough count of how many more obligations must be discharged before
//! [`crate::eval::eval`] would accept. Used only as a move-ordering hint by
//! the search: branches whose successor obligation looks closer to
//! acceptance are tried first. The estimate carries no soundness weight, so
//! it is deliberately crude.

use std::collections::HashMap;

use crate::logic::{Arena, Ltlf, LtlfNode};

pub fn hamming(arena: &Arena, f: Ltlf) -> u32 {
    let mut memo = HashMap::new();
    walk(arena, f, &mut memo)
}

fn walk(arena: &Arena, f: Ltlf, memo: &mut HashMap<Ltlf, u32>) -> u32 {
    if let Some(&d) = memo.get(&f) {
        return d;
    }
    let d = match arena.node(f) {
        LtlfNode::True => 0,
        LtlfNode::False | LtlfNode::PropFalse => u32::MAX,
        LtlfNode::PropTrue | LtlfNode::End | LtlfNode::Atom(_) => 1,
        LtlfNode::PropositionalNot(_) => 0,
        LtlfNode::WeakNext(_) | LtlfNode::Release(_) | LtlfNode::Always(_) => 0,
        LtlfNode::Next(g) | LtlfNode::Eventually(g) => walk(arena, g, memo).saturating_add(1),
        LtlfNode::Until(args) => {
            let tail = args[args.len() - 1];
            walk(arena, tail, memo).saturating_add(1)
        }
        LtlfNode::And(args) => args
            .iter()
            .fold(0u32, |acc, &g| acc.saturating_add(walk(arena, g, memo))),
        LtlfNode::Or(args) => args
            .iter()
            .map(|&g| walk(arena, g, memo))
            .min()
            .unwrap_or(0),
        // Pre-NNF connectives are not scored; the search never sees them.
        LtlfNode::Not(_) | LtlfNode::Implies(_) | LtlfNode::Equivalent(_) | LtlfNode::Xor(_) => 1,
    };
    memo.insert(f, d);
    d
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nnf::nnf;
    use crate::parser::parse;
    use test_log::test;

    fn dist(text: &str) -> u32 {
        let arena = Arena::new();
        let f = nnf(&arena, parse(&arena, text).unwrap());
        hamming(&arena, f)
    }

    #[test]
    fn accepted_obligations_have_distance_zero() {
        assert_eq!(dist("tt"), 0);
        assert_eq!(dist("G a"), 0);
        assert_eq!(dist("X a"), 0);
    }

    #[test]
    fn pending_obligations_are_positive() {
        assert!(dist("a") > 0);
        assert!(dist("F a") > dist("a"));
        assert_eq!(dist("ff"), u32::MAX);
    }

    #[test]
    fn conjunction_accumulates_and_disjunction_picks_cheapest() {
        assert_eq!(dist("a & b"), 2);
        assert_eq!(dist("a | G b"), 0);
        assert_eq!(dist("ff & a"), u32::MAX, "saturating sum");
    }

    #[test]
    fn until_scores_its_tail() {
        assert_eq!(dist("a U b"), 2);
        assert_eq!(dist("a U (b & c)"), 3);
    }
}
