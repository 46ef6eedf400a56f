//! x86 detail-line tests: a fixture decoder fills the x86 record, the dump
//! renders it.

#![cfg(feature = "x86")]

mod common;

use common::{Fixture, FixtureDecoder};
use insn_detail::dump::x86_detail_line;
use insn_detail::x86::{
    EFlags, FpuFlags, X86Group, X86Insn, X86Mem, X86Op, X86OpType, X86Reg,
};
use insn_detail::{Access, Arch, Detail, Disassembler, Mode};

fn add_eax_1(d: &mut Detail) {
    d.regs_write.push(X86Reg::EFLAGS.0);
    let x = d.as_x86_mut().unwrap();
    x.opcode = [0x83, 0, 0, 0];
    x.addr_size = 4;
    x.modrm = 0xc0;
    x.eflags = EFlags::MODIFY_AF
        | EFlags::MODIFY_CF
        | EFlags::MODIFY_SF
        | EFlags::MODIFY_ZF
        | EFlags::MODIFY_PF
        | EFlags::MODIFY_OF;
    x.operands.push(X86Op::reg(X86Reg::EAX, 4, Access::READ | Access::WRITE));
    x.operands.push(X86Op::imm(1, 4));
}

fn fcomi_st1(d: &mut Detail) {
    d.regs_read.push(X86Reg::ST0.0);
    d.regs_write.push(X86Reg::EFLAGS.0);
    d.regs_write.push(X86Reg::FPSW.0);
    d.groups.push(X86Group::Fpu as u8);
    let x = d.as_x86_mut().unwrap();
    x.opcode = [0xdb, 0, 0, 0];
    x.addr_size = 2;
    x.modrm = 0xf1;
    x.eflags = EFlags::MODIFY_ZF | EFlags::MODIFY_PF | EFlags::MODIFY_CF;
    x.fpu_flags = FpuFlags::MODIFY_C1
        | FpuFlags::UNDEFINED_C0
        | FpuFlags::UNDEFINED_C2
        | FpuFlags::UNDEFINED_C3;
    x.operands.push(X86Op::reg(X86Reg::ST1, 10, Access::READ));
}

fn lea_rcx(d: &mut Detail) {
    let x = d.as_x86_mut().unwrap();
    x.rex = 0x48;
    x.opcode = [0x8d, 0, 0, 0];
    x.addr_size = 8;
    x.modrm = 0x4c;
    x.sib = 0x98;
    x.sib_base = X86Reg::RAX;
    x.sib_index = X86Reg::RBX;
    x.sib_scale = 4;
    x.disp = 0x10;
    let mem = X86Mem {
        base: X86Reg::RAX,
        index: X86Reg::RBX,
        scale: 4,
        disp: 0x10,
        ..X86Mem::default()
    };
    x.operands.push(X86Op::reg(X86Reg::RCX, 8, Access::WRITE));
    // lea computes the address without touching memory
    x.operands.push(X86Op::mem(mem, 8, Access::empty()));
}

fn vaddps_masked(d: &mut Detail) {
    d.groups.push(X86Group::Avx512 as u8);
    let x = d.as_x86_mut().unwrap();
    x.prefix = [0, 0, 0, 0];
    x.opcode = [0x58, 0, 0, 0];
    x.addr_size = 8;
    x.modrm = 0x40;
    x.disp = -8;
    x.avx_rm = 0;
    let mut dst = X86Op::reg(X86Reg::YMM0, 32, Access::WRITE);
    dst.avx_zero_opmask = true;
    let mut src = X86Op::mem(
        X86Mem {
            base: X86Reg::RAX,
            disp: -8,
            ..X86Mem::default()
        },
        4,
        Access::READ,
    );
    src.avx_bcast = 2;
    x.operands.push(dst);
    x.operands.push(X86Op::reg(X86Reg::YMM1, 32, Access::READ));
    x.operands.push(src);
}

fn push_imm_pair(d: &mut Detail) {
    let x = d.as_x86_mut().unwrap();
    x.opcode = [0xc8, 0, 0, 0];
    x.operands.push(X86Op::imm(0x10, 2));
    x.operands.push(X86Op::reg(X86Reg::RBP, 8, Access::WRITE));
    x.operands.push(X86Op::imm(-1, 1));
}

static FIXTURES: &[Fixture] = &[
    Fixture::x86(&[0x83, 0xc0, 0x01], X86Insn::Add as u32, add_eax_1),
    Fixture::x86(&[0xdb, 0xf1], X86Insn::Fcomi as u32, fcomi_st1),
    Fixture::x86(&[0x48, 0x8d, 0x4c, 0x98, 0x10], X86Insn::Lea as u32, lea_rcx),
    Fixture::x86(
        &[0x62, 0xf1, 0x74, 0xd9, 0x58, 0x40, 0xff],
        X86Insn::Vaddps as u32,
        vaddps_masked,
    ),
    Fixture::x86(&[0xc8, 0x10, 0x00, 0xff], X86Insn::Push as u32, push_imm_pair),
];

fn line(mode: Mode, code: &[u8]) -> String {
    let mut dis = Disassembler::new(Arch::X86, mode, FixtureDecoder::new(FIXTURES)).unwrap();
    dis.detail(true);
    let insn = dis.disasm_one(code, 0x401000).unwrap();
    x86_detail_line(&insn, mode)
}

#[test]
fn add_register_immediate() {
    assert_eq!(
        line(Mode::MODE_32, &[0x83, 0xc0, 0x01]),
        " | Prefix:0x00 0x00 0x00 0x00  | Opcode:0x83 0x00 0x00 0x00  | rex: 0x0 \
         | addr_size: 4 | modrm: 0xc0 | disp: 0x0 | sib: 0x0 | imm_count: 1 | imms[1]: 0x1 \
         | op_count: 2 | operands[0].type: REG = eax | operands[0].size: 4 \
         | operands[0].access: READ | WRITE | operands[1].type: IMM = 0x1 \
         | operands[1].size: 4 | operands[1].access: READ | Registers read: eax \
         | Registers modified: eflags eax \
         | EFLAGS: MOD_AF MOD_CF MOD_SF MOD_ZF MOD_PF MOD_OF"
    );
}

#[test]
fn fpu_group_prints_fpu_flags_only() {
    assert_eq!(
        line(Mode::MODE_16, &[0xdb, 0xf1]),
        " | Prefix:0x00 0x00 0x00 0x00  | Opcode:0xdb 0x00 0x00 0x00  | rex: 0x0 \
         | addr_size: 2 | modrm: 0xf1 | disp: 0x0 | op_count: 1 \
         | operands[0].type: REG = st(1) | operands[0].size: 10 \
         | operands[0].access: READ | Registers read: st(0) st(1) \
         | Registers modified: eflags fpsw \
         | FPU_FLAGS: MOD_C1 UNDEF_C0 UNDEF_C2 UNDEF_C3"
    );
}

#[test]
fn sib_addressing_in_long_mode() {
    assert_eq!(
        line(Mode::MODE_64, &[0x48, 0x8d, 0x4c, 0x98, 0x10]),
        " | Prefix:0x00 0x00 0x00 0x00  | Opcode:0x8d 0x00 0x00 0x00  | rex: 0x48 \
         | addr_size: 8 | modrm: 0x4c | disp: 0x10 | sib: 0x98 | sib_base: rax \
         | sib_index: rbx | sib_scale: 4 | op_count: 2 | operands[0].type: REG = rcx \
         | operands[0].size: 8 | operands[0].access: WRITE | operands[1].type: MEM \
         | operands[1].mem.base: REG = rax | operands[1].mem.index: REG = rbx \
         | operands[1].mem.scale: 4 | operands[1].mem.disp: 0x10 | operands[1].size: 8 \
         | Registers read: rax rbx | Registers modified: rcx"
    );
}

#[test]
fn sib_is_omitted_in_16_bit_mode() {
    let l = line(Mode::MODE_16, &[0x48, 0x8d, 0x4c, 0x98, 0x10]);
    assert!(!l.contains("sib"), "{l}");
    assert!(l.contains(" | disp: 0x10 | op_count: 2"), "{l}");
}

#[test]
fn avx_broadcast_and_zeroing() {
    let l = line(Mode::MODE_64, &[0x62, 0xf1, 0x74, 0xd9, 0x58, 0x40, 0xff]);
    assert!(l.contains(" | disp: 0xfffffffffffffff8 | sib: 0x0 |"), "{l}");
    assert!(l.contains(" | operands[0].avx_zero_opmask: TRUE | operands[0].size: 32"), "{l}");
    assert!(l.contains(" | operands[2].mem.disp: 0xfffffffffffffff8"), "{l}");
    assert!(l.contains(" | operands[2].avx_bcast: 2 | operands[2].size: 4"), "{l}");
    assert!(!l.contains("avx_rm"), "{l}");
    assert!(!l.contains("EFLAGS"), "{l}");
}

#[test]
fn immediates_are_listed_by_position() {
    let l = line(Mode::MODE_64, &[0xc8, 0x10, 0x00, 0xff]);
    assert!(
        l.contains(" | imm_count: 2 | imms[1]: 0x10 | imms[2]: 0xffffffffffffffff | op_count: 3"),
        "{l}"
    );
}

#[test]
fn detail_helpers_agree_with_the_dump() {
    let mut dis = Disassembler::new(Arch::X86, Mode::MODE_64, FixtureDecoder::new(FIXTURES)).unwrap();
    dis.detail(true);
    let insn = dis.disasm_one(&[0xc8, 0x10, 0x00, 0xff], 0).unwrap();
    assert_eq!(dis.insn_name(insn.id), Some("push"));
    let x = insn.detail().and_then(Detail::as_x86).unwrap();
    assert_eq!(x.op_count(X86OpType::Imm), 2);
    assert_eq!(x.op_index(X86OpType::Imm, 2), Some(2));
    assert_eq!(x.op_index(X86OpType::Reg, 1), Some(1));

    let acc = dis.regs_access(&insn).unwrap();
    assert!(acc.read.is_empty());
    assert_eq!(acc.write.as_slice(), &[X86Reg::RBP.0]);
}

#[test]
fn redecode_resets_the_record() {
    let mut dis = Disassembler::new(Arch::X86, Mode::MODE_32, FixtureDecoder::new(FIXTURES)).unwrap();
    dis.detail(true);
    let mut insn = insn_detail::Insn::default();
    dis.disasm_into(&[0xdb, 0xf1], 0, &mut insn).unwrap();
    dis.disasm_into(&[0x83, 0xc0, 0x01], 0, &mut insn).unwrap();
    let fresh = dis.disasm_one(&[0x83, 0xc0, 0x01], 0).unwrap();
    assert_eq!(insn, fresh);
    assert!(!insn.detail().unwrap().in_group(X86Group::Fpu as u8));
}
