//! Register Allocator (component G)
//!
//! Graph coloring with pre-coloring, allowed-set honoring, and
//! composition-aware exclusion during assignment: sort free nodes by
//! descending degree, assign the first canonical-order candidate
//! register, spill on failure — plus an optional spill-heuristic
//! refinement that retries a failed node by evicting a higher-degree
//! neighbor instead.

use std::collections::{HashMap, HashSet};

use crate::error::{AllocResult, AllocationError};

use super::interference::InterferenceGraph;
use super::register::{Register, ALL_REGISTERS};
use super::vreg::{VirtualRegisterAllocator, VirtualRegisterId, VirtualRegisterKind};

/// Which spill-selection strategy the assignment pass uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpillHeuristic {
    /// Spill whatever node fails to color, in the order it was
    /// processed.
    FirstFound,
    /// After a first-found spill, attempt to swap it with a
    /// higher-degree already-assigned neighbor instead, freeing more
    /// colors overall.
    HighestDegree,
}

impl Default for SpillHeuristic {
    fn default() -> Self {
        SpillHeuristic::HighestDegree
    }
}

/// Tunable knobs for one allocation run: let a host opt into the
/// spill-retry refinement or a best-effort (non-aborting) ABI conflict
/// policy, without changing the default single-pass behavior.
#[derive(Debug, Clone)]
pub struct AllocatorOptions {
    /// Spill selection strategy. Defaults to `HighestDegree`.
    pub spill_heuristic: SpillHeuristic,
    /// If true (default), an ABI conflict between two pre-colored
    /// nodes aborts allocation with [`AllocationError::AbiConflict`].
    /// If false, the conflict is recorded in
    /// [`AllocationResult::warnings`] and allocation proceeds
    /// best-effort (diagnostic/tooling use only).
    pub abort_on_abi_conflict: bool,
    /// Emit a `tracing::trace!` event for every per-node coloring
    /// decision (candidate set, chosen register or spill). Off by
    /// default since it is too verbose for routine builds.
    pub trace: bool,
}

impl Default for AllocatorOptions {
    fn default() -> Self {
        Self {
            spill_heuristic: SpillHeuristic::default(),
            abort_on_abi_conflict: true,
            trace: false,
        }
    }
}

/// Final mapping produced by one allocation run, consumed by the code
/// emitter.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct AllocationResult {
    /// Virtual register identity (qualified name if it has one,
    /// otherwise its numeric id) -> assigned physical register.
    pub allocation: HashMap<String, Register>,
    /// Ids of virtual registers that could not be colored and must be
    /// materialized in memory around each use.
    pub spilled: HashSet<VirtualRegisterId>,
    /// Bit size of every named tracked virtual register, carried
    /// through for the code emitter.
    pub variable_sizes: HashMap<String, u8>,
    /// Non-fatal diagnostics collected when
    /// [`AllocatorOptions::abort_on_abi_conflict`] is false.
    pub warnings: Vec<String>,
}

fn identity_key(id: VirtualRegisterId, name: Option<&str>) -> String {
    match name {
        Some(n) => n.to_string(),
        None => id.0.to_string(),
    }
}

/// Registers excluded by a neighbor already holding `reg`: the pair
/// containing `reg` (if `reg` is a half), or the halves of `reg` (if
/// `reg` is itself a pair).
fn composition_exclusions(reg: Register) -> Vec<Register> {
    if reg.is_pair() {
        reg.composition().to_vec()
    } else {
        ALL_REGISTERS
            .iter()
            .copied()
            .filter(|r| r.is_pair() && r.composition().contains(&reg))
            .collect()
    }
}

/// Marks every `Candidate` virtual register that never appears in the
/// interference graph (i.e. never referenced by any instruction) as
/// `Unused`. These need no physical register and are excluded from
/// allocation entirely.
fn mark_unused_candidates(vra: &mut VirtualRegisterAllocator, graph: &InterferenceGraph) {
    let live_nodes: HashSet<VirtualRegisterId> = graph.nodes().collect();
    let candidate_ids: Vec<VirtualRegisterId> = vra
        .iter()
        .filter(|vr| vr.kind == VirtualRegisterKind::Candidate)
        .map(|vr| vr.id)
        .collect();
    for id in candidate_ids {
        if !live_nodes.contains(&id) {
            if let Some(vr) = vra.get_mut(id) {
                vr.kind = VirtualRegisterKind::Unused;
            }
        }
    }
}

/// Resolves a qualified-name pre-coloring map to virtual register ids
/// by matching against each VR's debug name.
fn resolve_precoloring(
    vra: &VirtualRegisterAllocator,
    precoloring: &HashMap<String, Register>,
) -> HashMap<VirtualRegisterId, Register> {
    let mut resolved = HashMap::new();
    for vr in vra.iter() {
        if let Some(name) = &vr.name {
            if let Some(&register) = precoloring.get(name) {
                resolved.insert(vr.id, register);
            }
        }
    }
    resolved
}

/// Colors an interference graph, honoring pre-coloring and per-node
/// allowed sets, and producing a spill set on failure.
///
/// Mutates `vra` in place: every successfully colored `Candidate`
/// becomes `Allocated` with its `physical` field set; candidates never
/// referenced by any instruction become `Unused`.
pub fn color(
    vra: &mut VirtualRegisterAllocator,
    graph: &InterferenceGraph,
    precoloring: &HashMap<String, Register>,
    options: &AllocatorOptions,
) -> AllocResult<AllocationResult> {
    mark_unused_candidates(vra, graph);

    let pinned = resolve_precoloring(vra, precoloring);
    let mut warnings = Vec::new();

    for (&id, &register) in &pinned {
        let vr = vra.get(id).expect("pre-colored id must exist");
        let allowed_ok = vr.allowed_set.is_empty() || vr.allowed_set.contains(&register);
        if vr.size != register.size() || !allowed_ok {
            return Err(AllocationError::AllowedSetViolation { vr: id, register });
        }
    }

    let pinned_ids: Vec<VirtualRegisterId> = pinned.keys().copied().collect();
    for i in 0..pinned_ids.len() {
        for j in (i + 1)..pinned_ids.len() {
            let (a, b) = (pinned_ids[i], pinned_ids[j]);
            if pinned[&a] == pinned[&b] && graph.interferes(a, b) {
                let conflict = AllocationError::AbiConflict {
                    vr_a: a,
                    vr_b: b,
                    register: pinned[&a],
                };
                if options.abort_on_abi_conflict {
                    return Err(conflict);
                }
                warnings.push(conflict.to_string());
            }
        }
    }

    let mut assigned: HashMap<VirtualRegisterId, Register> = pinned.clone();
    let mut spilled: HashSet<VirtualRegisterId> = HashSet::new();

    let mut free_nodes: Vec<VirtualRegisterId> = graph
        .nodes()
        .filter(|id| !pinned.contains_key(id))
        .collect();
    free_nodes.sort_by_key(|&id| (std::cmp::Reverse(graph.degree(id)), id.0));

    for v in free_nodes {
        let vr = vra.get(v).expect("graph node must have a VR record");
        let allowed: Vec<Register> = if vr.allowed_set.is_empty() {
            Register::all_of_size(vr.size).collect()
        } else {
            vr.allowed_set.clone()
        };

        let mut excluded: HashSet<Register> = HashSet::new();
        for neighbor in graph.neighbors(v) {
            if let Some(&reg) = assigned.get(&neighbor) {
                excluded.insert(reg);
                excluded.extend(composition_exclusions(reg));
            }
        }

        let chosen = ALL_REGISTERS
            .iter()
            .find(|r| allowed.contains(r) && !excluded.contains(r))
            .copied();

        if options.trace {
            tracing::trace!(vr = v.0, degree = graph.degree(v), ?chosen, "colored node");
        }

        match chosen {
            Some(reg) => {
                assigned.insert(v, reg);
            }
            None => {
                spilled.insert(v);
            }
        }
    }

    if options.spill_heuristic == SpillHeuristic::HighestDegree {
        refine_spills(vra, graph, &mut assigned, &mut spilled, &pinned);
    }

    for (&id, &register) in &assigned {
        if let Some(vr) = vra.get_mut(id) {
            vr.kind = VirtualRegisterKind::Allocated;
            vr.physical = Some(register);
        }
    }

    let mut allocation = HashMap::new();
    let mut variable_sizes = HashMap::new();
    for (&id, &register) in &assigned {
        let vr = vra.get(id).expect("assigned id must have a VR record");
        allocation.insert(identity_key(id, vr.name.as_deref()), register);
        if let Some(name) = &vr.name {
            variable_sizes.insert(name.clone(), vr.size.bits());
        }
    }
    for &id in &spilled {
        if let Some(vr) = vra.get(id) {
            if let Some(name) = &vr.name {
                variable_sizes.insert(name.clone(), vr.size.bits());
            }
        }
    }

    tracing::debug!(
        assigned = allocation.len(),
        spilled = spilled.len(),
        "register allocation complete"
    );

    Ok(AllocationResult {
        allocation,
        spilled,
        variable_sizes,
        warnings,
    })
}

/// For each spilled node, tries to swap it with a higher-degree
/// already-assigned neighbor: if taking that neighbor's register would
/// not conflict with `v`'s other neighbors, evict the neighbor (spill
/// it instead) and give its register to `v`. Bounded to one pass —
/// this is a heuristic improvement, not a fixed point search.
fn refine_spills(
    vra: &VirtualRegisterAllocator,
    graph: &InterferenceGraph,
    assigned: &mut HashMap<VirtualRegisterId, Register>,
    spilled: &mut HashSet<VirtualRegisterId>,
    pinned: &HashMap<VirtualRegisterId, Register>,
) {
    let mut candidates: Vec<VirtualRegisterId> = spilled.iter().copied().collect();
    candidates.sort_by_key(|&id| (std::cmp::Reverse(graph.degree(id)), id.0));

    for v in candidates {
        if !spilled.contains(&v) {
            continue;
        }
        let vr = match vra.get(v) {
            Some(vr) => vr,
            None => continue,
        };
        let allowed: HashSet<Register> = if vr.allowed_set.is_empty() {
            Register::all_of_size(vr.size).collect()
        } else {
            vr.allowed_set.iter().copied().collect()
        };

        let mut swap_neighbors: Vec<VirtualRegisterId> = graph
            .neighbors(v)
            .filter(|n| assigned.contains_key(n) && !pinned.contains_key(n))
            .collect();
        swap_neighbors.sort_by_key(|&id| (std::cmp::Reverse(graph.degree(id)), id.0));

        for neighbor in swap_neighbors {
            if graph.degree(neighbor) <= graph.degree(v) {
                continue;
            }
            let neighbor_reg = assigned[&neighbor];
            if !allowed.contains(&neighbor_reg) {
                continue;
            }
            let mut blocked = false;
            for other in graph.neighbors(v) {
                if other == neighbor {
                    continue;
                }
                if let Some(&reg) = assigned.get(&other) {
                    if reg == neighbor_reg || composition_exclusions(reg).contains(&neighbor_reg) {
                        blocked = true;
                        break;
                    }
                }
            }
            if blocked {
                continue;
            }

            assigned.remove(&neighbor);
            spilled.insert(neighbor);
            assigned.insert(v, neighbor_reg);
            spilled.remove(&v);
            break;
        }
    }
}
