//! Liveness Analyzer (component D)
//!
//! Classical backward, may-dataflow over a CFG of machine
//! instructions. Only virtual registers tracked for liveness
//! (`Candidate`/`Allocated`, never `Immediate`/`StackHome`) ever enter
//! any of the four sets — that filter is applied once, here, and
//! everything downstream (interference, allocation) relies on it.

use std::collections::{HashMap, HashSet};

use super::cfg::{BlockId, Cfg};
use super::mir::MachineInstruction;
use super::vreg::{VirtualRegisterAllocator, VirtualRegisterId};

/// Per-block liveness sets.
#[derive(Debug, Clone, Default)]
pub struct LivenessInfo {
    /// Virtual registers read before any definition in the block.
    pub uses: HashMap<BlockId, HashSet<VirtualRegisterId>>,
    /// Virtual registers written in the block.
    pub defs: HashMap<BlockId, HashSet<VirtualRegisterId>>,
    /// Virtual registers live on entry to the block.
    pub live_in: HashMap<BlockId, HashSet<VirtualRegisterId>>,
    /// Virtual registers live on exit from the block.
    pub live_out: HashMap<BlockId, HashSet<VirtualRegisterId>>,
}

fn is_tracked(vra: &VirtualRegisterAllocator, id: VirtualRegisterId) -> bool {
    vra.get(id).map(|vr| vr.is_tracked()).unwrap_or(false)
}

/// Computes per-block `use`/`def`, then iterates the backward dataflow
/// equations to a fixed point:
///
/// ```text
/// live_out[b] = union of live_in[s] for s in successors(b)
/// live_in[b]  = use[b] u (live_out[b] \ def[b])
/// ```
///
/// Termination is guaranteed: the domain (subsets of a finite virtual
/// register set) is finite and every update only ever adds elements.
pub fn analyze_liveness<I: MachineInstruction>(
    cfg: &Cfg<I>,
    vra: &VirtualRegisterAllocator,
) -> LivenessInfo {
    let mut uses = HashMap::new();
    let mut defs = HashMap::new();

    for block in &cfg.blocks {
        let mut block_use = HashSet::new();
        let mut block_def = HashSet::new();
        for instr in &block.machine_instructions {
            for operand in instr.operands().into_iter().flatten() {
                if is_tracked(vra, operand) && !block_def.contains(&operand) {
                    block_use.insert(operand);
                }
            }
            if let Some(result) = instr.result() {
                if is_tracked(vra, result) {
                    block_def.insert(result);
                }
            }
        }
        uses.insert(block.id, block_use);
        defs.insert(block.id, block_def);
    }

    let mut live_in: HashMap<BlockId, HashSet<VirtualRegisterId>> =
        cfg.blocks.iter().map(|b| (b.id, HashSet::new())).collect();
    let mut live_out: HashMap<BlockId, HashSet<VirtualRegisterId>> =
        cfg.blocks.iter().map(|b| (b.id, HashSet::new())).collect();

    let mut iterations = 0usize;
    loop {
        let mut changed = false;
        for block in cfg.blocks_reverse() {
            let mut new_live_out = HashSet::new();
            for &succ in &block.successors {
                if let Some(succ_live_in) = live_in.get(&succ) {
                    new_live_out.extend(succ_live_in.iter().copied());
                }
            }
            if new_live_out != live_out[&block.id] {
                live_out.insert(block.id, new_live_out);
                changed = true;
            }

            let mut new_live_in = uses[&block.id].clone();
            let block_def = &defs[&block.id];
            for reg in &live_out[&block.id] {
                if !block_def.contains(reg) {
                    new_live_in.insert(*reg);
                }
            }
            if new_live_in != live_in[&block.id] {
                live_in.insert(block.id, new_live_in);
                changed = true;
            }
        }
        iterations += 1;
        if !changed {
            break;
        }
    }

    tracing::debug!(
        iterations,
        blocks = cfg.blocks.len(),
        "liveness fixed point converged"
    );

    LivenessInfo {
        uses,
        defs,
        live_in,
        live_out,
    }
}
