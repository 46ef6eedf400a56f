#![no_main]
use libfuzzer_sys::fuzz_target;

use insn_detail::arm_builder::OpGroup;
use insn_detail::arm_mapping::{build_detail, reg_access};
use insn_detail::arm_tables::{self, opc, OpType, Step, MAX_OPERANDS};
use insn_detail::dump::arm_detail_line;
use insn_detail::{Detail, Features, Insn, McInst, Mode, Syntax};

/// Walk step at `slot` asking for a VPT predicate.
fn is_vpt_slot(opcode: u32, slot: usize) -> bool {
    arm_tables::walk(opcode)
        .iter()
        .any(|s| matches!(*s, Step::Classify(OpGroup::VptPredicate, n) if n as usize == slot))
}

fn has_unimplemented_group(opcode: u32) -> bool {
    arm_tables::walk(opcode)
        .iter()
        .any(|s| matches!(*s, Step::Classify(OpGroup::Unimplemented(_), _)))
}

fuzz_target!(|data: &[u8]| {
    // Operands follow the declared slot types, so the builder must never
    // report a contract violation for them.
    let Some((&first, rest)) = data.split_first() else {
        return;
    };
    let opcode = u32::from(first) % opc::INSTRUCTION_LIST_END;
    if has_unimplemented_group(opcode) {
        return;
    }
    let mode = if first & 0x80 != 0 { Mode::THUMB } else { Mode::ARM };
    let mut inst = McInst::new(opcode, 0x8000, mode);
    let mut bytes = rest.iter().copied();
    let mut next = || bytes.next().unwrap_or(0);

    for slot in 0..MAX_OPERANDS {
        let b = next();
        match arm_tables::op_type(opcode, slot) {
            OpType::Invalid => break,
            OpType::Reg | OpType::MemReg | OpType::MemIndexReg => {
                inst.push_reg(u16::from(b));
            }
            OpType::Pred if is_vpt_slot(opcode, slot) => {
                inst.push_imm(i64::from(b % 3));
            }
            OpType::Pred => {
                inst.push_imm(i64::from(b % 15));
            }
            OpType::Imm | OpType::MemImm => {
                // Low three bits double as a shift opcode; the low nibble
                // doubles as an IT mask.
                let mut v = (i64::from(b) & !7) | i64::from((b & 7) % 6);
                if v & 0xf == 0 {
                    v |= 8;
                }
                inst.push_imm(v);
            }
        }
    }
    // Trailing registers feed register lists.
    for _ in 0..(next() % 8) {
        inst.push_reg(u16::from(next()));
    }

    let mut detail = Detail::arm();
    build_detail(&inst, &mut detail, Features::default());
    let _ = reg_access(&detail);

    let insn = Insn {
        detail: Some(Box::new(detail)),
        ..Insn::default()
    };
    let _ = arm_detail_line(&insn, Syntax::Default);
    let _ = arm_detail_line(&insn, Syntax::NoRegName);
});
