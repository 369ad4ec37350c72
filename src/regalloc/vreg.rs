//! Virtual Register Allocator (component B)
//!
//! Creates and tracks virtual registers for one function. Distinguishes
//! normal allocation candidates from immediates and stack homes, which
//! are ignored by liveness and interference — filtering those out
//! correctly is the one correctness-critical rule this module enforces.

use std::collections::HashMap;

use super::register::{Register, RegisterSize};

/// Dense, unique identifier for a [`VirtualRegister`] within one function.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct VirtualRegisterId(pub u32);

/// What a [`VirtualRegister`] currently represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VirtualRegisterKind {
    /// A candidate the allocator determined is never read or written;
    /// it needs no physical register and is excluded from liveness.
    Unused,
    /// A normal temporary awaiting allocation. Tracked for liveness.
    Candidate,
    /// A fixed stack slot (not a register at all). `value` holds the
    /// stack offset. Never tracked for liveness.
    StackHome,
    /// A compile-time constant. `value` holds the literal. Never
    /// tracked for liveness.
    Immediate,
    /// Successfully colored by the allocator. Tracked for liveness.
    Allocated,
}

/// A value in the IR: a pre-allocation abstraction over a physical
/// register, a stack slot, or a literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualRegister {
    /// Dense unique id, assigned by the [`VirtualRegisterAllocator`].
    pub id: VirtualRegisterId,
    /// Bit width.
    pub size: RegisterSize,
    /// What this virtual register currently represents.
    pub kind: VirtualRegisterKind,
    /// Physical registers this VR may be assigned. Every entry shares
    /// `size`. Empty means "any register of the correct size" — only
    /// meaningful when `kind` is `Candidate` or `Allocated`.
    pub allowed_set: Vec<Register>,
    /// Assigned physical register. Present only when `kind ==
    /// Allocated`.
    pub physical: Option<Register>,
    /// Optional debug label, conventionally `"function.variable"`.
    pub name: Option<String>,
    /// Literal value (`Immediate`) or stack offset (`StackHome`).
    /// Unused for other kinds.
    pub value: i64,
}

impl VirtualRegister {
    /// True iff this VR's kind means it participates in liveness and
    /// interference: only `Candidate` and `Allocated` ever enter a
    /// liveness or interference set.
    pub fn is_tracked(&self) -> bool {
        matches!(
            self.kind,
            VirtualRegisterKind::Candidate | VirtualRegisterKind::Allocated
        )
    }
}

/// Creates and owns all virtual registers for one function.
///
/// Uses a dense-id-per-value scheme (`VirtualRegisterId`) for lookup,
/// but additionally stores full [`VirtualRegister`] records since the
/// allocator needs allowed sets, kinds, and debug names that a bare
/// newtype id cannot carry.
#[derive(Debug, Default, Clone)]
pub struct VirtualRegisterAllocator {
    next_id: u32,
    registers: HashMap<VirtualRegisterId, VirtualRegister>,
}

impl VirtualRegisterAllocator {
    /// Creates an empty allocator for a new function.
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> VirtualRegisterId {
        let id = VirtualRegisterId(self.next_id);
        self.next_id += 1;
        id
    }

    fn uniform_size(allowed_set: &[Register]) -> RegisterSize {
        let size = allowed_set[0].size();
        debug_assert!(
            allowed_set.iter().all(|r| r.size() == size),
            "allowed_set must contain registers of a single size"
        );
        size
    }

    /// Allocates a `Candidate` virtual register restricted to
    /// `allowed_set`. `allowed_set` must be non-empty and uniform in
    /// size.
    pub fn allocate(&mut self, allowed_set: Vec<Register>) -> VirtualRegisterId {
        self.allocate_named(None, allowed_set)
    }

    /// As [`Self::allocate`], with a debug label.
    pub fn allocate_named(
        &mut self,
        name: impl Into<Option<String>>,
        allowed_set: Vec<Register>,
    ) -> VirtualRegisterId {
        debug_assert!(!allowed_set.is_empty(), "Candidate allowed_set must be non-empty");
        let size = Self::uniform_size(&allowed_set);
        let id = self.fresh_id();
        self.registers.insert(
            id,
            VirtualRegister {
                id,
                size,
                kind: VirtualRegisterKind::Candidate,
                allowed_set,
                physical: None,
                name: name.into(),
                value: 0,
            },
        );
        id
    }

    /// Allocates a `StackHome` virtual register at a fixed stack
    /// `offset`. Never tracked for liveness.
    pub fn allocate_with_stack_home(
        &mut self,
        name: impl Into<Option<String>>,
        size: RegisterSize,
        offset: i64,
    ) -> VirtualRegisterId {
        let id = self.fresh_id();
        self.registers.insert(
            id,
            VirtualRegister {
                id,
                size,
                kind: VirtualRegisterKind::StackHome,
                allowed_set: Vec::new(),
                physical: None,
                name: name.into(),
                value: offset,
            },
        );
        id
    }

    /// Allocates an `Immediate` virtual register carrying a literal
    /// `value`. Never tracked for liveness.
    pub fn allocate_immediate(&mut self, value: i64, size: RegisterSize) -> VirtualRegisterId {
        let id = self.fresh_id();
        self.registers.insert(
            id,
            VirtualRegister {
                id,
                size,
                kind: VirtualRegisterKind::Immediate,
                allowed_set: Vec::new(),
                physical: None,
                name: None,
                value,
            },
        );
        id
    }

    /// Looks up a previously created virtual register.
    pub fn get(&self, id: VirtualRegisterId) -> Option<&VirtualRegister> {
        self.registers.get(&id)
    }

    /// Mutable lookup, used by the allocator to record kind/physical
    /// register transitions (`Candidate -> Allocated`, `Candidate ->
    /// Unused`).
    pub fn get_mut(&mut self, id: VirtualRegisterId) -> Option<&mut VirtualRegister> {
        self.registers.get_mut(&id)
    }

    /// Iterates all virtual registers created so far, in id order.
    pub fn iter(&self) -> impl Iterator<Item = &VirtualRegister> {
        let mut ids: Vec<_> = self.registers.keys().copied().collect();
        ids.sort_unstable();
        ids.into_iter().filter_map(move |id| self.registers.get(&id))
    }

    /// Number of virtual registers created so far.
    pub fn len(&self) -> usize {
        self.registers.len()
    }

    /// True iff no virtual registers have been created.
    pub fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regalloc::register::Register;

    #[test]
    fn candidate_ids_are_dense_and_unique() {
        let mut vra = VirtualRegisterAllocator::new();
        let a = vra.allocate(vec![Register::Hl]);
        let b = vra.allocate(vec![Register::De]);
        assert_ne!(a, b);
        assert_eq!(a.0 + 1, b.0);
    }

    #[test]
    fn immediates_and_stack_homes_are_untracked() {
        let mut vra = VirtualRegisterAllocator::new();
        let imm = vra.allocate_immediate(42, RegisterSize::Bits8);
        let home = vra.allocate_with_stack_home("f.x".to_string(), RegisterSize::Bits16, 4);
        assert!(!vra.get(imm).unwrap().is_tracked());
        assert!(!vra.get(home).unwrap().is_tracked());
    }

    #[test]
    fn candidates_are_tracked_until_allocated() {
        let mut vra = VirtualRegisterAllocator::new();
        let c = vra.allocate(vec![Register::A]);
        assert!(vra.get(c).unwrap().is_tracked());
        vra.get_mut(c).unwrap().kind = VirtualRegisterKind::Allocated;
        vra.get_mut(c).unwrap().physical = Some(Register::A);
        assert!(vra.get(c).unwrap().is_tracked());
    }
}
