//! Forward synthesis game over compiled obligations.
//!
//! The search walks the reachable obligations depth-first. One round:
//!
//! 1. `eval` accepts if the obligation already holds on the empty suffix
//!    (the system simply stops the trace).
//! 2. Otherwise the obligation is unfolded to XNF and compiled. A trivially
//!    true/false diagram decides immediately.
//! 3. A decision node at the system split branches existentially over
//!    output assignments; one at the environment split branches universally
//!    over input assignments. Anything else is a forced transition: the
//!    node is decoded, one layer of next operators is stripped, and the
//!    search recurses on the successor obligation.
//!
//! Verdicts are memoized by compiled node id. A compiled node reappearing
//! on the current path means the system is deferring the same obligation
//! forever; since every trace must eventually stop, that branch loses. The
//! cycle verdict is path-dependent and therefore not memoized.
//!
//! Optional one-step checks prune before expansion: an under-approximation
//! that ignores next-step obligations can certify a win (play one step and
//! stop), and an over-approximation can certify a loss. They also catch
//! wins the expansion alone would miss, such as safety properties that are
//! satisfied by playing a single correct step.

use std::collections::HashMap;
use std::fmt;

use crate::closure::Closure;
use crate::compile::{Encoder, VarMap};
use crate::error::SynthError;
use crate::eval::eval;
use crate::hamming::hamming;
use crate::logic::{Arena, Ltlf};
use crate::nnf::nnf;
use crate::partition::Partition;
use crate::sdd::{SddId, SddManager};
use crate::vtree::Vtree;
use crate::xnf::{strip_next, xnf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Realizability {
    Realizable,
    Unrealizable,
}

impl fmt::Display for Realizability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Realizability::Realizable => write!(f, "REALIZABLE"),
            Realizability::Unrealizable => write!(f, "UNREALIZABLE"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SearchOptions {
    /// Run the one-step pre-filters before expanding a node.
    pub one_step_checks: bool,
    /// Order system choices by the syntactic distance estimate.
    pub hamming_heuristic: bool,
    /// Conjoin `!end` to the specification, ruling out the empty trace.
    pub require_nonempty: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            one_step_checks: true,
            hamming_heuristic: false,
            require_nonempty: false,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub expansions: u64,
    pub memo_hits: u64,
    pub one_step_wins: u64,
    pub one_step_losses: u64,
    pub cycles: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expansions={} memo_hits={} one_step_wins={} one_step_losses={} cycles={}",
            self.expansions, self.memo_hits, self.one_step_wins, self.one_step_losses, self.cycles
        )
    }
}

pub struct ForwardSynthesis<'a> {
    arena: &'a Arena,
    root: Ltlf,
    closure: Closure,
    vars: VarMap,
    mgr: SddManager,
    options: SearchOptions,
    discovered: HashMap<SddId, bool>,
    strategy: HashMap<SddId, SddId>,
    stats: Stats,
}

impl<'a> ForwardSynthesis<'a> {
    pub fn new(
        arena: &'a Arena,
        formula: Ltlf,
        partition: &Partition,
    ) -> Result<Self, SynthError> {
        Self::with_options(arena, formula, partition, SearchOptions::default())
    }

    pub fn with_options(
        arena: &'a Arena,
        formula: Ltlf,
        partition: &Partition,
        options: SearchOptions,
    ) -> Result<Self, SynthError> {
        let mut root = nnf(arena, formula);
        if options.require_nonempty {
            root = arena.and(vec![root, arena.not_end()]);
        }
        let closure = Closure::of(arena, root);
        let vars = VarMap::build(arena, &closure, partition)?;
        let vtree = Vtree::for_synthesis(
            vars.state_count(),
            vars.num_inputs(),
            vars.num_outputs(),
        );
        log::debug!(
            "synthesis instance: {} closure members, {} inputs, {} outputs",
            vars.state_count(),
            vars.num_inputs(),
            vars.num_outputs()
        );
        let mgr = SddManager::from_vtree(vtree);
        Ok(Self {
            arena,
            root,
            closure,
            vars,
            mgr,
            options,
            discovered: HashMap::new(),
            strategy: HashMap::new(),
            stats: Stats::default(),
        })
    }

    fn encoder(&self) -> Encoder<'_> {
        Encoder {
            arena: self.arena,
            closure: &self.closure,
            vars: &self.vars,
            mgr: &self.mgr,
        }
    }

    /// The specification in NNF, as searched (including the `!end` conjunct
    /// when the empty trace is ruled out).
    pub fn root(&self) -> Ltlf {
        self.root
    }

    pub fn manager(&self) -> &SddManager {
        &self.mgr
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    /// Winning system moves, keyed by compiled obligation node: the prime
    /// (output assignment region) the system should pick there.
    pub fn strategy(&self) -> &HashMap<SddId, SddId> {
        &self.strategy
    }

    /// Compiles the root obligation; exposed for diagnostics output.
    pub fn compiled_root(&self) -> Result<SddId, SynthError> {
        let expanded = xnf(self.arena, self.root)?;
        self.encoder().to_sdd(expanded)
    }

    pub fn realizability(&mut self) -> Result<Realizability, SynthError> {
        if self.is_realizable()? {
            Ok(Realizability::Realizable)
        } else {
            Ok(Realizability::Unrealizable)
        }
    }

    pub fn is_realizable(&mut self) -> Result<bool, SynthError> {
        let mut path = Vec::new();
        let verdict = self.search(self.root, &mut path)?;
        debug_assert!(path.is_empty());
        log::info!("search finished: {} ({})", verdict, self.stats);
        Ok(verdict)
    }

    fn search(&mut self, obligation: Ltlf, path: &mut Vec<SddId>) -> Result<bool, SynthError> {
        self.stats.expansions += 1;
        log::debug!("search: {}", self.arena.fmt(obligation));
        if eval(self.arena, obligation)? {
            log::debug!("accepted by empty-suffix evaluation");
            return Ok(true);
        }
        let expanded = xnf(self.arena, obligation)?;
        let n = self.encoder().to_sdd(expanded)?;
        if self.mgr.is_true(n) {
            return Ok(true);
        }
        if self.mgr.is_false(n) {
            return Ok(false);
        }
        if let Some(&verdict) = self.discovered.get(&n) {
            self.stats.memo_hits += 1;
            return Ok(verdict);
        }
        if path.contains(&n) {
            self.stats.cycles += 1;
            log::debug!("cycle: obligation deferred forever");
            return Ok(false);
        }
        if self.options.one_step_checks {
            let win = self.encoder().one_step_realizability(obligation)?;
            if let Some(moves) = win {
                self.stats.one_step_wins += 1;
                self.discovered.insert(n, true);
                self.strategy.insert(n, moves);
                return Ok(true);
            }
            let hopeless = self.encoder().one_step_unrealizability(obligation)?;
            if hopeless {
                self.stats.one_step_losses += 1;
                self.discovered.insert(n, false);
                return Ok(false);
            }
        }
        path.push(n);
        let verdict = self.system_move(n, path);
        path.pop();
        let verdict = verdict?;
        self.discovered.insert(n, verdict);
        Ok(verdict)
    }

    /// Existential branching over output assignments when `n` is a decision
    /// at the system split; otherwise the system has no choice to make.
    fn system_move(&mut self, n: SddId, path: &mut Vec<SddId>) -> Result<bool, SynthError> {
        if !self.is_system_decision(n) {
            return self.env_move(n, path);
        }
        let mut elements = self.mgr.elements(n);
        if self.options.hamming_heuristic {
            elements.sort_by_key(|e| {
                let g = strip_next(self.arena, self.encoder().sdd_to_formula(e.sub));
                hamming(self.arena, g)
            });
        }
        for e in elements {
            if self.env_move(e.sub, path)? {
                self.strategy.insert(n, e.prime);
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Universal branching over input assignments when `m` is a decision at
    /// the environment split; otherwise the transition is forced: decode,
    /// strip one layer of next operators, recurse.
    fn env_move(&mut self, m: SddId, path: &mut Vec<SddId>) -> Result<bool, SynthError> {
        if self.is_env_decision(m) {
            for e in self.mgr.elements(m) {
                if !self.system_move(e.sub, path)? {
                    return Ok(false);
                }
            }
            return Ok(true);
        }
        let decoded = self.encoder().sdd_to_formula(m);
        let successor = strip_next(self.arena, decoded);
        self.search(successor, path)
    }

    fn is_system_decision(&self, n: SddId) -> bool {
        match self.mgr.vtree().system_split() {
            Some(v) => self.mgr.node_vtree(n) == Some(v),
            None => false,
        }
    }

    fn is_env_decision(&self, n: SddId) -> bool {
        match self.mgr.vtree().env_split() {
            Some(v) => self.mgr.node_vtree(n) == Some(v),
            None => false,
        }
    }
}
