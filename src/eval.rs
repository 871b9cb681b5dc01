//! Empty-trace evaluation.
//!
//! Decides whether an obligation is already satisfied when no further
//! positions are played, which is how the search accepts: the system stops
//! the trace exactly when `eval` says the remaining obligation holds.
//!
//! The verdicts mirror finite-trace semantics on the empty suffix: atoms are
//! false (there is no position to check them at), so negated atoms are true;
//! weak operators (`WeakNext`, `Release`, `Always`) hold vacuously, strong
//! ones (`Next`, `Until`, `Eventually`) do not. The markers are asymmetric
//! on purpose: `end` and `!end` both evaluate to false, because neither "the
//! trace has ended" nor "a real position follows" is a satisfied obligation
//! at the point where the system considers stopping; their interplay is
//! resolved at the diagram level instead.

use std::collections::HashMap;

use crate::error::SynthError;
use crate::logic::{Arena, Ltlf, LtlfNode};

/// Evaluates `f` on the empty trace suffix. Fails on raw `Not`, which only
/// NNF elimination may consume.
pub fn eval(arena: &Arena, f: Ltlf) -> Result<bool, SynthError> {
    let mut memo = HashMap::new();
    walk(arena, f, &mut memo)
}

fn walk(arena: &Arena, f: Ltlf, memo: &mut HashMap<Ltlf, bool>) -> Result<bool, SynthError> {
    if let Some(&v) = memo.get(&f) {
        return Ok(v);
    }
    let v = match arena.node(f) {
        LtlfNode::True => true,
        LtlfNode::False => false,
        LtlfNode::PropTrue => false,
        LtlfNode::PropFalse => false,
        LtlfNode::End => false,
        LtlfNode::Atom(_) => false,
        LtlfNode::PropositionalNot(g) => !matches!(arena.node(g), LtlfNode::End),
        LtlfNode::Not(_) => return Err(SynthError::ExpectedNnf),
        LtlfNode::And(args) => {
            let mut v = true;
            for &g in &args {
                v &= walk(arena, g, memo)?;
            }
            v
        }
        LtlfNode::Or(args) => {
            let mut v = false;
            for &g in &args {
                v |= walk(arena, g, memo)?;
            }
            v
        }
        LtlfNode::Implies(args) => {
            // Right-associated chain: a -> b -> c == a -> (b -> c).
            let mut v = walk(arena, args[args.len() - 1], memo)?;
            for &g in args[..args.len() - 1].iter().rev() {
                v = !walk(arena, g, memo)? || v;
            }
            v
        }
        LtlfNode::Equivalent(args) => !parity(arena, &args, memo)?,
        LtlfNode::Xor(args) => parity(arena, &args, memo)?,
        LtlfNode::Next(_) => false,
        LtlfNode::WeakNext(_) => true,
        LtlfNode::Until(_) => false,
        LtlfNode::Release(_) => true,
        LtlfNode::Eventually(_) => false,
        LtlfNode::Always(_) => true,
    };
    memo.insert(f, v);
    Ok(v)
}

fn parity(arena: &Arena, args: &[Ltlf], memo: &mut HashMap<Ltlf, bool>) -> Result<bool, SynthError> {
    let mut v = false;
    for &g in args {
        v ^= walk(arena, g, memo)?;
    }
    Ok(v)
}
