//! 8085 arithmetic and flag computations.
//!
//! PSW layout differs from the rest of the family: bit 5 is K and bit 1
//! is V, bit 3 always reads zero, so none of the shared tables apply.
//! K on add/sub is the carry out of bit 7 (majority of the operand and
//! result sign bits); on INR/DCR and the 16-bit increments it marks the
//! wrap instead.

use super::{HALFCARRY, I8085, K, PARITY, SIGN, V, ZERO};

const fn build_szp() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0usize;
    while i < 256 {
        let v = i as u8;
        let mut f = v & SIGN;
        if v == 0 {
            f |= ZERO;
        }
        if v.count_ones() & 1 == 0 {
            f |= PARITY;
        }
        table[i] = f;
        i += 1;
    }
    table
}

/// Sign/Zero/Parity of a result byte.
static SZP: [u8; 256] = build_szp();

impl I8085 {
    pub(crate) fn inc8(&mut self, v: u8) -> u8 {
        let v = v.wrapping_add(1);
        self.f = SZP[v as usize];
        if v & 0x0f == 0 {
            self.f |= HALFCARRY;
        }
        if v == 0 {
            self.f |= K;
        }
        if v == 0x80 {
            self.f |= V;
        }
        v
    }

    // DCR half-carry is a no-borrow flag, the inverse of the Z80 sense.
    pub(crate) fn dec8(&mut self, v: u8) -> u8 {
        let v = v.wrapping_sub(1);
        self.f = SZP[v as usize];
        if v & 0x0f != 0x0f {
            self.f |= HALFCARRY;
        }
        if v == 0xff {
            self.f |= K;
        }
        if v == 0x7f {
            self.f |= V;
        }
        v
    }

    pub(crate) fn add(&mut self, oper: u8) {
        let wide = self.a as u16 + oper as u16;
        self.carry = wide > 0xff;
        let res = wide as u8;
        self.f = SZP[res as usize];
        if res & 0x0f < self.a & 0x0f {
            self.f |= HALFCARRY;
        }
        if (self.a ^ oper) & (self.a ^ res) & 0x80 != 0 {
            self.f |= V;
        }
        if ((self.a & oper) | (self.a & res) | (oper & res)) & 0x80 != 0 {
            self.f |= K;
        }
        self.a = res;
    }

    pub(crate) fn adc(&mut self, oper: u8) {
        let mut wide = self.a as u16 + oper as u16;
        if self.carry {
            wide += 1;
        }
        self.carry = wide > 0xff;
        let res = wide as u8;
        self.f = SZP[res as usize];
        if (self.a ^ oper ^ res) & 0x10 != 0 {
            self.f |= HALFCARRY;
        }
        if (self.a ^ oper) & (self.a ^ res) & 0x80 != 0 {
            self.f |= V;
        }
        if ((self.a & oper) | (self.a & res) | (oper & res)) & 0x80 != 0 {
            self.f |= K;
        }
        self.a = res;
    }

    /// DAD: only carry (and MEMPTR) are touched. Returns the sum.
    pub(crate) fn add16(&mut self, reg16: u16, oper16: u16) -> u16 {
        let wide = reg16 as u32 + oper16 as u32;
        self.carry = wide > 0xffff;
        self.memptr = reg16.wrapping_add(1);
        wide as u16
    }

    // Subtract half-carry is also inverted: set when no borrow crossed
    // bit 3. K is the borrow-complement analogue of the add case.
    pub(crate) fn sub(&mut self, oper: u8) {
        let wide = self.a as i16 - oper as i16;
        self.carry = wide < 0;
        let res = wide as u8;
        self.f = SZP[res as usize];
        if (self.a ^ oper ^ res) & 0x10 == 0 {
            self.f |= HALFCARRY;
        }
        if (self.a ^ oper) & (self.a ^ res) & 0x80 != 0 {
            self.f |= V;
        }
        if ((self.a & !oper) | (self.a & res) | (!oper & res)) & 0x80 != 0 {
            self.f |= K;
        }
        self.a = res;
    }

    pub(crate) fn sbc(&mut self, oper: u8) {
        let mut wide = self.a as i16 - oper as i16;
        if self.carry {
            wide -= 1;
        }
        self.carry = wide < 0;
        let res = wide as u8;
        self.f = SZP[res as usize];
        if (self.a ^ oper ^ res) & 0x10 == 0 {
            self.f |= HALFCARRY;
        }
        if (self.a ^ oper) & (self.a ^ res) & 0x80 != 0 {
            self.f |= V;
        }
        if ((self.a & !oper) | (self.a & res) | (!oper & res)) & 0x80 != 0 {
            self.f |= K;
        }
        self.a = res;
    }

    /// DSUB: S/P from the high result byte, Z over all 16 bits, H/V/K as
    /// 16-bit analogues of the 8-bit subtract.
    pub(crate) fn sub16(&mut self, reg16: u16, oper16: u16) -> u16 {
        let wide = reg16 as i32 - oper16 as i32;
        self.carry = wide < 0;
        let res = wide as u16;
        self.f = SZP[(res >> 8) as usize];
        if res != 0 {
            self.f &= !ZERO;
        }
        if (res ^ reg16 ^ oper16) & 0x1000 == 0 {
            self.f |= HALFCARRY;
        }
        if (reg16 ^ oper16) & (reg16 ^ res) & 0x8000 != 0 {
            self.f |= V;
        }
        if ((reg16 & !oper16) | (reg16 & res) | (!oper16 & res)) & 0x8000 != 0 {
            self.f |= K;
        }
        res
    }

    pub(crate) fn and(&mut self, oper: u8) {
        self.a &= oper;
        self.carry = false;
        self.f = SZP[self.a as usize] | HALFCARRY;
    }

    pub(crate) fn xor(&mut self, oper: u8) {
        self.a ^= oper;
        self.carry = false;
        self.f = SZP[self.a as usize];
    }

    pub(crate) fn or(&mut self, oper: u8) {
        self.a |= oper;
        self.carry = false;
        self.f = SZP[self.a as usize];
    }

    /// CMP: subtract for flags only.
    pub(crate) fn cp(&mut self, oper: u8) {
        let wide = self.a as i16 - oper as i16;
        self.carry = wide < 0;
        let res = wide as u8;
        self.f = SZP[res as usize];
        if (self.a ^ oper ^ res) & 0x10 == 0 {
            self.f |= HALFCARRY;
        }
        if (self.a ^ oper) & (self.a ^ res) & 0x80 != 0 {
            self.f |= V;
        }
        if ((self.a & !oper) | (self.a & res) | (!oper & res)) & 0x80 != 0 {
            self.f |= K;
        }
    }

    /// DAA always runs as an addition; only the carry survives the
    /// pre-computed decision.
    pub(crate) fn daa(&mut self) {
        let mut adjust = 0u8;
        let mut carry = self.carry;

        if self.f & HALFCARRY != 0 || self.a & 0x0f > 0x09 {
            adjust = 0x06;
        }
        if carry || self.a > 0x99 {
            adjust |= 0x60;
        }
        if self.a > 0x99 {
            carry = true;
        }

        self.add(adjust);
        self.carry = carry;
    }
}
