//! # ltlf-synt: forward LTLf reactive synthesis over SDDs
//!
//! **`ltlf-synt`** decides realizability of **Linear Temporal Logic on
//! finite traces (LTLf)** specifications: given a formula and a partition of
//! its propositions into environment-controlled *inputs* and
//! system-controlled *outputs*, it determines whether the system can always
//! produce a finite trace satisfying the formula, whatever the environment
//! does.
//!
//! ## How it works
//!
//! The engine plays the synthesis game *forward*, without ever building the
//! full automaton of the formula:
//!
//! - Formulas are hash-consed in an [`Arena`][crate::logic::Arena] and
//!   rewritten by small passes: negation normal form, one-step unfolding
//!   (XNF), empty-trace evaluation.
//! - Each obligation is compiled into a **Sentential Decision Diagram**
//!   over a three-region variable tree (outputs / inputs / subformula state),
//!   so that the diagram's top decision *is* the system's move and the next
//!   level down is the environment's reply.
//! - A depth-first AND/OR search explores the reachable obligations,
//!   memoizing verdicts per compiled node and treating a repeated node on
//!   the current path as an infinite deferral, which loses on finite traces.
//!
//! ## Basic Usage
//!
//! ```rust
//! use ltlf_synt::logic::Arena;
//! use ltlf_synt::parser::parse;
//! use ltlf_synt::partition::Partition;
//! use ltlf_synt::synthesis::{ForwardSynthesis, Realizability};
//!
//! let arena = Arena::new();
//! let spec = parse(&arena, "request -> F grant").unwrap();
//! let partition = Partition::new(vec!["request".into()], vec!["grant".into()]);
//!
//! let mut synth = ForwardSynthesis::new(&arena, spec, &partition).unwrap();
//! assert_eq!(synth.realizability().unwrap(), Realizability::Realizable);
//! ```
//!
//! ## Core Components
//!
//! - **[`logic`]**: the formula arena and AST.
//! - **[`parser`]**: concrete syntax.
//! - **[`nnf`]**, **[`xnf`]**, **[`eval`]**: the rewriting passes.
//! - **[`closure`]**: subformula closure with dense state ids.
//! - **[`vtree`]**, **[`sdd`]**: the decision-diagram substrate.
//! - **[`compile`]**: formula/diagram translation and one-step checks.
//! - **[`synthesis`]**: the forward game search.

pub mod closure;
pub mod compile;
pub mod error;
pub mod eval;
pub mod hamming;
pub mod logic;
pub mod nnf;
pub mod parser;
pub mod partition;
pub mod sdd;
pub mod synthesis;
pub mod vtree;
pub mod xnf;
