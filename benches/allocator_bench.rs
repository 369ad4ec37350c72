use std::collections::HashMap;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use z80_regalloc::regalloc::{
    allocate_function, AllocatorOptions, BasicBlock, BlockId, Cfg, MachineInstruction, Register,
    VirtualRegisterAllocator, VirtualRegisterId, ALL_REGISTERS,
};

#[derive(Debug, Clone)]
enum Instr {
    Def(VirtualRegisterId, Vec<VirtualRegisterId>),
    Use(Vec<VirtualRegisterId>),
}

impl MachineInstruction for Instr {
    fn operands(&self) -> Vec<Option<VirtualRegisterId>> {
        match self {
            Instr::Def(_, ops) | Instr::Use(ops) => ops.iter().map(|&o| Some(o)).collect(),
        }
    }

    fn result(&self) -> Option<VirtualRegisterId> {
        match self {
            Instr::Def(r, _) => Some(*r),
            Instr::Use(_) => None,
        }
    }
}

fn build_chain_function(n: usize) -> (Cfg<Instr>, VirtualRegisterAllocator) {
    let mut vra = VirtualRegisterAllocator::new();
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        ids.push(vra.allocate(ALL_REGISTERS.to_vec()));
    }

    let mut cfg: Cfg<Instr> = Cfg::new("chain", BlockId(0));
    let mut entry = BasicBlock::new(BlockId(0));
    for (i, &id) in ids.iter().enumerate() {
        let operands = if i == 0 { vec![] } else { vec![ids[i - 1]] };
        entry.machine_instructions.push(Instr::Def(id, operands));
    }
    entry.machine_instructions.push(Instr::Use(ids.clone()));
    cfg.blocks.push(entry);
    (cfg, vra)
}

fn build_diamond_function(blocks: usize) -> (Cfg<Instr>, VirtualRegisterAllocator) {
    let mut vra = VirtualRegisterAllocator::new();
    let counter = vra.allocate(vec![Register::Hl]);
    let mut cfg: Cfg<Instr> = Cfg::new("diamond", BlockId(0));

    let mut header = BasicBlock::new(BlockId(0));
    header.machine_instructions.push(Instr::Use(vec![counter]));
    header.successors.push(BlockId(1));
    cfg.blocks.push(header);

    for i in 1..blocks {
        let mut b = BasicBlock::new(BlockId(i as u32));
        b.machine_instructions.push(Instr::Def(counter, vec![counter]));
        if i + 1 < blocks {
            b.successors.push(BlockId((i + 1) as u32));
        } else {
            b.successors.push(BlockId(0));
        }
        cfg.blocks.push(b);
    }

    (cfg, vra)
}

fn allocation_benchmark(c: &mut Criterion) {
    c.bench_function("allocate chain of 32 temporaries", |b| {
        b.iter(|| {
            let (cfg, mut vra) = build_chain_function(black_box(32));
            allocate_function(&cfg, &mut vra, &HashMap::new(), &AllocatorOptions::default())
                .unwrap()
        })
    });

    c.bench_function("allocate chain of 256 temporaries (heavy spilling)", |b| {
        b.iter(|| {
            let (cfg, mut vra) = build_chain_function(black_box(256));
            allocate_function(&cfg, &mut vra, &HashMap::new(), &AllocatorOptions::default())
                .unwrap()
        })
    });

    c.bench_function("allocate 64-block loop nest", |b| {
        b.iter(|| {
            let (cfg, mut vra) = build_diamond_function(black_box(64));
            allocate_function(&cfg, &mut vra, &HashMap::new(), &AllocatorOptions::default())
                .unwrap()
        })
    });
}

criterion_group!(benches, allocation_benchmark);
criterion_main!(benches);
