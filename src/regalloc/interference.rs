//! Interference Graph Builder (component E)
//!
//! Per-block backward sweep over machine instructions, building an
//! undirected interference graph whose nodes are tracked virtual
//! register ids. The one subtlety here is composition-aware
//! suppression — a VR restricted to `L` does not interfere with one
//! restricted to `HL`, because the allocator (not the graph) resolves
//! that physical overlap via exclusion rules when it assigns colors
//! (component G).

use std::collections::{HashMap, HashSet};

use super::cfg::{BlockId, Cfg};
use super::liveness::LivenessInfo;
use super::mir::MachineInstruction;
use super::register::Register;
use super::vreg::{VirtualRegisterAllocator, VirtualRegisterId};

/// Undirected interference graph plus the per-instruction liveness
/// recorded while building it, which the allocator (component G) and
/// later code emission both reuse.
#[derive(Debug, Clone, Default)]
pub struct InterferenceGraph {
    edges: HashMap<VirtualRegisterId, HashSet<VirtualRegisterId>>,
    /// `instruction_liveness[block][instr_index]` — the set of VR ids
    /// live *before* that instruction's effects become visible, i.e.
    /// what its operands see.
    pub instruction_liveness: HashMap<BlockId, Vec<HashSet<VirtualRegisterId>>>,
}

impl InterferenceGraph {
    fn ensure_node(&mut self, id: VirtualRegisterId) {
        self.edges.entry(id).or_default();
    }

    fn add_edge(&mut self, a: VirtualRegisterId, b: VirtualRegisterId) {
        if a == b {
            return;
        }
        self.edges.entry(a).or_default().insert(b);
        self.edges.entry(b).or_default().insert(a);
    }

    /// True iff `a` and `b` interfere. False for `a == b` (self-loops
    /// are forbidden by construction).
    pub fn interferes(&self, a: VirtualRegisterId, b: VirtualRegisterId) -> bool {
        a != b && self.edges.get(&a).map(|n| n.contains(&b)).unwrap_or(false)
    }

    /// Neighbors of `id` in the graph.
    pub fn neighbors(&self, id: VirtualRegisterId) -> impl Iterator<Item = VirtualRegisterId> + '_ {
        self.edges.get(&id).into_iter().flatten().copied()
    }

    /// All nodes present in the graph.
    pub fn nodes(&self) -> impl Iterator<Item = VirtualRegisterId> + '_ {
        self.edges.keys().copied()
    }

    /// Degree of `id`: number of neighbors currently in the graph.
    pub fn degree(&self, id: VirtualRegisterId) -> usize {
        self.edges.get(&id).map(|n| n.len()).unwrap_or(0)
    }
}

/// Two allowed sets are composition-compatible — and therefore must
/// *not* get an interference edge even when simultaneously live — when
/// every register in one is a component of some register in the
/// other. An empty allowed set ("any register of the right size")
/// never suppresses an edge: the VR could still land on an
/// overlapping register, so the check needs both sides constrained.
fn composition_compatible(a: &[Register], b: &[Register]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let a_within_b = a
        .iter()
        .all(|x| b.iter().any(|y| y.composition().contains(x)));
    let b_within_a = b
        .iter()
        .all(|x| a.iter().any(|y| y.composition().contains(x)));
    a_within_b || b_within_a
}

fn is_tracked(vra: &VirtualRegisterAllocator, id: VirtualRegisterId) -> bool {
    vra.get(id).map(|vr| vr.is_tracked()).unwrap_or(false)
}

/// Builds the interference graph for a CFG, given its liveness info.
pub fn build_interference_graph<I: MachineInstruction>(
    cfg: &Cfg<I>,
    vra: &VirtualRegisterAllocator,
    liveness: &LivenessInfo,
) -> InterferenceGraph {
    let mut graph = InterferenceGraph::default();

    for block in &cfg.blocks {
        let n = block.machine_instructions.len();
        let mut per_instr_liveness: Vec<HashSet<VirtualRegisterId>> = vec![HashSet::new(); n];
        let mut currently_live: HashSet<VirtualRegisterId> = liveness
            .live_out
            .get(&block.id)
            .cloned()
            .unwrap_or_default();

        for id in &currently_live {
            graph.ensure_node(*id);
        }

        for (idx, instr) in block.machine_instructions.iter().enumerate().rev() {
            per_instr_liveness[idx] = currently_live.clone();

            if let Some(result) = instr.result() {
                if is_tracked(vra, result) {
                    graph.ensure_node(result);
                    for &live in &currently_live {
                        if live == result {
                            continue;
                        }
                        let suppress = match (vra.get(result), vra.get(live)) {
                            (Some(r), Some(l)) => {
                                composition_compatible(&r.allowed_set, &l.allowed_set)
                            }
                            _ => false,
                        };
                        if !suppress {
                            graph.add_edge(result, live);
                        }
                    }
                    currently_live.remove(&result);
                }
            }

            for operand in instr.operands().into_iter().flatten() {
                if is_tracked(vra, operand) {
                    graph.ensure_node(operand);
                    currently_live.insert(operand);
                }
            }
        }

        let live_in = liveness.live_in.get(&block.id).cloned().unwrap_or_default();
        let survivors: Vec<VirtualRegisterId> =
            currently_live.intersection(&live_in).copied().collect();
        for i in 0..survivors.len() {
            for j in (i + 1)..survivors.len() {
                let (u, v) = (survivors[i], survivors[j]);
                let suppress = match (vra.get(u), vra.get(v)) {
                    (Some(a), Some(b)) => composition_compatible(&a.allowed_set, &b.allowed_set),
                    _ => false,
                };
                if !suppress {
                    graph.add_edge(u, v);
                }
            }
        }

        graph
            .instruction_liveness
            .insert(block.id, per_instr_liveness);
    }

    tracing::debug!(
        nodes = graph.nodes().count(),
        "interference graph built"
    );

    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regalloc::cfg::BasicBlock;
    use crate::regalloc::liveness::analyze_liveness;
    use crate::regalloc::mir::test_support::TestInstr;
    use crate::regalloc::register::Register;

    fn build(
        instrs: Vec<TestInstr>,
        vra: &VirtualRegisterAllocator,
    ) -> (Cfg<TestInstr>, LivenessInfo, InterferenceGraph) {
        let mut cfg: Cfg<TestInstr> = Cfg::new("f", crate::regalloc::cfg::BlockId(0));
        let mut b0 = BasicBlock::new(crate::regalloc::cfg::BlockId(0));
        b0.machine_instructions = instrs;
        cfg.blocks.push(b0);
        let liveness = analyze_liveness(&cfg, vra);
        let graph = build_interference_graph(&cfg, vra, &liveness);
        (cfg, liveness, graph)
    }

    /// `z = x + y`: x and y interfere (both live going into the add);
    /// z interferes with neither (defined only after x, y are last
    /// used).
    #[test]
    fn simple_interference() {
        let mut vra = VirtualRegisterAllocator::new();
        let x = vra.allocate(vec![Register::Hl]);
        let y = vra.allocate(vec![Register::De]);
        let z = vra.allocate(vec![Register::Bc]);

        let (_, _, graph) = build(
            vec![
                TestInstr::Def(x, vec![]),
                TestInstr::Def(y, vec![]),
                TestInstr::Def(z, vec![x, y]),
                TestInstr::Use(vec![z]),
            ],
            &vra,
        );

        assert!(graph.interferes(x, y));
        assert!(!graph.interferes(z, x));
        assert!(!graph.interferes(z, y));
    }

    #[test]
    fn interference_is_symmetric_and_irreflexive() {
        let mut vra = VirtualRegisterAllocator::new();
        let x = vra.allocate(vec![Register::Hl]);
        let y = vra.allocate(vec![Register::De]);
        let (_, _, graph) = build(
            vec![
                TestInstr::Def(x, vec![]),
                TestInstr::Def(y, vec![]),
                TestInstr::Use(vec![x, y]),
            ],
            &vra,
        );
        assert_eq!(graph.interferes(x, y), graph.interferes(y, x));
        assert!(!graph.interferes(x, x));
    }

    /// A VR restricted to `L` and one restricted to `HL`, even when
    /// simultaneously live, must not get a graph edge.
    #[test]
    fn composition_compatible_vrs_do_not_interfere() {
        let mut vra = VirtualRegisterAllocator::new();
        let small = vra.allocate(vec![Register::L]);
        let wide = vra.allocate(vec![Register::Hl]);
        let (_, _, graph) = build(
            vec![
                TestInstr::Def(small, vec![]),
                TestInstr::Def(wide, vec![]),
                TestInstr::Use(vec![small, wide]),
            ],
            &vra,
        );
        assert!(!graph.interferes(small, wide));
    }

    /// Two VRs that are both free to land anywhere of the same size
    /// are not composition-compatible (an empty allowed set never
    /// suppresses an edge) and must still interfere when co-live.
    #[test]
    fn unconstrained_vrs_still_interfere() {
        let mut vra = VirtualRegisterAllocator::new();
        let a = vra.allocate(vec![Register::A, Register::B, Register::C, Register::D, Register::E, Register::H, Register::L]);
        let b = vra.allocate(vec![Register::A, Register::B, Register::C, Register::D, Register::E, Register::H, Register::L]);
        let (_, _, graph) = build(
            vec![
                TestInstr::Def(a, vec![]),
                TestInstr::Def(b, vec![]),
                TestInstr::Use(vec![a, b]),
            ],
            &vra,
        );
        assert!(graph.interferes(a, b));
    }
}
