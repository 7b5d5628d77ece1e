//! Shared ALU/flag computations for the Z80-family engines (8080, Z80,
//! Z180). Pure result+flag functions; cycle charging stays with the
//! caller's dispatch. The 8085 carries its own PSW model and does not use
//! these.

use super::flags::*;

/// INC: H when the low nibble wrapped, V only at 0x80.
pub fn inc8(f: &mut Flags, v: u8) -> u8 {
    let v = v.wrapping_add(1);
    f.bits = SZ53_ADD[v as usize];
    if v & 0x0f == 0 {
        f.bits |= HALFCARRY;
    }
    if v == 0x80 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    v
}

/// DEC: H when the low nibble borrowed, V only at 0x7f.
pub fn dec8(f: &mut Flags, v: u8) -> u8 {
    let v = v.wrapping_sub(1);
    f.bits = SZ53_SUB[v as usize];
    if v & 0x0f == 0x0f {
        f.bits |= HALFCARRY;
    }
    if v == 0x7f {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    v
}

pub fn add8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let wide = a as u16 + b as u16;
    f.carry = wide > 0xff;
    let res = wide as u8;
    f.bits = SZ53_ADD[res as usize];
    // Without carry-in, a half-carry shows as the result nibble ending up
    // below the accumulator nibble.
    if res & 0x0f < a & 0x0f {
        f.bits |= HALFCARRY;
    }
    if (a ^ !b) & (a ^ res) & 0x80 != 0 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    res
}

pub fn adc8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let mut wide = a as u16 + b as u16;
    if f.carry {
        wide += 1;
    }
    f.carry = wide > 0xff;
    let res = wide as u8;
    f.bits = SZ53_ADD[res as usize];
    if (a ^ b ^ res) & 0x10 != 0 {
        f.bits |= HALFCARRY;
    }
    if (a ^ !b) & (a ^ res) & 0x80 != 0 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    res
}

pub fn sub8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let wide = (a as i16) - (b as i16);
    f.carry = wide < 0;
    let res = wide as u8;
    f.bits = SZ53_SUB[res as usize];
    if res & 0x0f > a & 0x0f {
        f.bits |= HALFCARRY;
    }
    if (a ^ b) & (a ^ res) & 0x80 != 0 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    res
}

pub fn sbc8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let mut wide = (a as i16) - (b as i16);
    if f.carry {
        wide -= 1;
    }
    f.carry = wide < 0;
    let res = wide as u8;
    f.bits = SZ53_SUB[res as usize];
    if (a ^ b ^ res) & 0x10 != 0 {
        f.bits |= HALFCARRY;
    }
    if (a ^ b) & (a ^ res) & 0x80 != 0 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    res
}

/// Compare. Like SUB but only flags, and bits 5/3 come from the operand,
/// not the result.
pub fn cp8(f: &mut Flags, a: u8, b: u8) {
    let wide = (a as i16) - (b as i16);
    f.carry = wide < 0;
    let res = wide as u8;
    f.bits = (SZ53_ADD[b as usize] & FLAG_53) | (SZ53_SUB[res as usize] & FLAG_SZHN);
    if res & 0x0f > a & 0x0f {
        f.bits |= HALFCARRY;
    }
    if (a ^ b) & (a ^ res) & 0x80 != 0 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
}

/// AND with half-carry forced set (Z80/Z180 behavior; the 8080 derives H
/// from the operands instead, see its engine).
pub fn and8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let res = a & b;
    f.carry = false;
    f.bits = SZ53P_ADD[res as usize] | HALFCARRY;
    f.q = true;
    res
}

pub fn xor8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let res = a ^ b;
    f.carry = false;
    f.bits = SZ53P_ADD[res as usize];
    f.q = true;
    res
}

pub fn or8(f: &mut Flags, a: u8, b: u8) -> u8 {
    let res = a | b;
    f.carry = false;
    f.bits = SZ53P_ADD[res as usize];
    f.q = true;
    res
}

/// ADD rr,rr': S/Z/P preserved, 5/3 from the high result byte, H at the
/// bit-12 boundary. Returns (result, memptr value).
pub fn add16(f: &mut Flags, a: u16, b: u16) -> (u16, u16) {
    let wide = a as u32 + b as u32;
    f.carry = wide > 0xffff;
    let res = wide as u16;
    f.bits = (f.bits & FLAG_SZP) | ((res >> 8) as u8 & FLAG_53);
    if res & 0x0fff < a & 0x0fff {
        f.bits |= HALFCARRY;
    }
    f.q = true;
    (res, a.wrapping_add(1))
}

/// ADC HL,rr. Returns (result, memptr value).
pub fn adc16(f: &mut Flags, hl: u16, b: u16) -> (u16, u16) {
    let mut wide = hl as u32 + b as u32;
    if f.carry {
        wide += 1;
    }
    f.carry = wide > 0xffff;
    let res = wide as u16;
    f.bits = SZ53_ADD[(res >> 8) as usize];
    if res != 0 {
        f.bits &= !ZERO;
    }
    if (res ^ hl ^ b) & 0x1000 != 0 {
        f.bits |= HALFCARRY;
    }
    if (hl ^ !b) & (hl ^ res) & 0x8000 != 0 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    (res, hl.wrapping_add(1))
}

/// SBC HL,rr. Returns (result, memptr value).
pub fn sbc16(f: &mut Flags, hl: u16, b: u16) -> (u16, u16) {
    let mut wide = (hl as i32) - (b as i32);
    if f.carry {
        wide -= 1;
    }
    f.carry = wide < 0;
    let res = wide as u16;
    f.bits = SZ53_SUB[(res >> 8) as usize];
    if res != 0 {
        f.bits &= !ZERO;
    }
    if (res ^ hl ^ b) & 0x1000 != 0 {
        f.bits |= HALFCARRY;
    }
    if (hl ^ b) & (hl ^ res) & 0x8000 != 0 {
        f.bits |= OVERFLOW;
    }
    f.q = true;
    (res, hl.wrapping_add(1))
}

/// BCD adjust, honoring the AddSub flag for the re-fixup direction.
pub fn daa(f: &mut Flags, a: u8) -> u8 {
    let mut adjust = 0u8;
    let mut carry = f.carry;

    if f.bits & HALFCARRY != 0 || a & 0x0f > 0x09 {
        adjust = 0x06;
    }
    if carry || a > 0x99 {
        adjust |= 0x60;
    }
    if a > 0x99 {
        carry = true;
    }

    let res = if f.bits & ADDSUB != 0 {
        let r = sub8(f, a, adjust);
        f.bits = (f.bits & HALFCARRY) | SZ53P_SUB[r as usize];
        r
    } else {
        let r = add8(f, a, adjust);
        f.bits = (f.bits & HALFCARRY) | SZ53P_ADD[r as usize];
        r
    };
    f.carry = carry;
    f.q = true;
    res
}

pub fn rlc(f: &mut Flags, v: u8) -> u8 {
    f.carry = v & 0x80 != 0;
    let mut v = v << 1;
    if f.carry {
        v |= 0x01;
    }
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

pub fn rl(f: &mut Flags, v: u8) -> u8 {
    let old_carry = f.carry;
    f.carry = v & 0x80 != 0;
    let mut v = v << 1;
    if old_carry {
        v |= 0x01;
    }
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

pub fn sla(f: &mut Flags, v: u8) -> u8 {
    f.carry = v & 0x80 != 0;
    let v = v << 1;
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

/// Undocumented shift: like SLA but shifts a 1 into bit 0.
pub fn sll(f: &mut Flags, v: u8) -> u8 {
    f.carry = v & 0x80 != 0;
    let v = (v << 1) | 0x01;
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

pub fn rrc(f: &mut Flags, v: u8) -> u8 {
    f.carry = v & 0x01 != 0;
    let mut v = v >> 1;
    if f.carry {
        v |= 0x80;
    }
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

pub fn rr(f: &mut Flags, v: u8) -> u8 {
    let old_carry = f.carry;
    f.carry = v & 0x01 != 0;
    let mut v = v >> 1;
    if old_carry {
        v |= 0x80;
    }
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

pub fn sra(f: &mut Flags, v: u8) -> u8 {
    let sign = v & 0x80;
    f.carry = v & 0x01 != 0;
    let v = (v >> 1) | sign;
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

pub fn srl(f: &mut Flags, v: u8) -> u8 {
    f.carry = v & 0x01 != 0;
    let v = v >> 1;
    f.bits = SZ53P_ADD[v as usize];
    f.q = true;
    v
}

/// BIT n: Z/P when the tested bit is clear, S only for a set bit 7;
/// bits 5/3 come from the value the caller supplies (register value,
/// MEMPTR high byte for (HL), address high byte for (IX+d)).
pub fn bit_test(f: &mut Flags, mask: u8, v: u8) {
    let zero = v & mask == 0;
    f.bits = (SZ53_ADD[v as usize] & !FLAG_SZP) | HALFCARRY;
    if zero {
        f.bits |= PARITY | ZERO;
    }
    if mask == SIGN && !zero {
        f.bits |= SIGN;
    }
    f.q = true;
}
