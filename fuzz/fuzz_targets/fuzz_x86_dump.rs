#![no_main]
use libfuzzer_sys::fuzz_target;

use insn_detail::dump::x86_detail_line;
use insn_detail::x86::{reg_access, EFlags, FpuFlags, X86Group, X86Mem, X86Op, X86Reg};
use insn_detail::{Access, Detail, Insn, Mode};

/// Input bytes, zero once exhausted.
struct Input<'a>(core::slice::Iter<'a, u8>);

impl Input<'_> {
    fn u8(&mut self) -> u8 {
        self.0.next().copied().unwrap_or(0)
    }

    fn u64(&mut self) -> u64 {
        (0..8).fold(0, |acc, _| (acc << 8) | u64::from(self.u8()))
    }
}

fuzz_target!(|data: &[u8]| {
    // Any x86 record, however inconsistent, must render without panicking.
    let mut input = Input(data.iter());

    let mut detail = Detail::x86();
    for _ in 0..(input.u8() % 4) {
        detail.regs_read.push(u16::from(input.u8()));
    }
    for _ in 0..(input.u8() % 4) {
        detail.regs_write.push(u16::from(input.u8()));
    }
    if input.u8() & 1 != 0 {
        detail.groups.push(X86Group::Fpu as u8);
    }

    let x = detail.as_x86_mut().unwrap();
    x.prefix = [input.u8(), input.u8(), input.u8(), input.u8()];
    x.opcode = [input.u8(), input.u8(), input.u8(), input.u8()];
    x.rex = input.u8();
    x.addr_size = input.u8();
    x.modrm = input.u8();
    x.sib = input.u8();
    x.disp = input.u64() as i64;
    x.sib_index = X86Reg(u16::from(input.u8()));
    x.sib_scale = input.u8() as i8;
    x.sib_base = X86Reg(u16::from(input.u8()));
    x.xop_cc = input.u8();
    x.sse_cc = input.u8();
    x.avx_cc = input.u8();
    x.avx_sae = input.u8() & 1 != 0;
    x.avx_rm = input.u8();
    x.eflags = EFlags::from_bits_retain(input.u64());
    x.fpu_flags = FpuFlags::from_bits_retain(input.u64());

    for _ in 0..(input.u8() % 9) {
        let size = input.u8();
        let access = Access::from_bits_truncate(input.u8());
        let mut op = match input.u8() % 3 {
            0 => X86Op::reg(X86Reg(u16::from(input.u8())), size, access),
            1 => X86Op::imm(i64::from(input.u8() as i8), size),
            _ => X86Op::mem(
                X86Mem {
                    segment: X86Reg(u16::from(input.u8())),
                    base: X86Reg(u16::from(input.u8())),
                    index: X86Reg(u16::from(input.u8())),
                    scale: i32::from(input.u8()),
                    disp: i64::from(input.u8() as i8),
                },
                size,
                access,
            ),
        };
        op.avx_bcast = input.u8();
        op.avx_zero_opmask = input.u8() & 1 != 0;
        x.operands.push(op);
    }

    let _ = reg_access(&detail);
    let insn = Insn {
        detail: Some(Box::new(detail)),
        ..Insn::default()
    };
    for mode in [Mode::MODE_16, Mode::MODE_32, Mode::MODE_64] {
        let _ = x86_detail_line(&insn, mode);
    }
});
