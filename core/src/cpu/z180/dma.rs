//! MMU translation and the channel-0 memory-to-memory DMA engine.

use super::Z180;
use crate::core::Bus;

impl Z180 {
    /// Three-zone logical-to-physical mapping: common area 1 gets the
    /// CBR base, the bank area gets the BBR base, common area 0 passes
    /// through. Boundaries compare on the top nibble of the logical
    /// address, as CBAR does.
    pub fn phy_addr(&self, vaddr: u16) -> u32 {
        let pga = vaddr & 0xf000;
        if pga >= self.com1 {
            self.cbr + vaddr as u32
        } else if pga >= self.bnk1 {
            self.bbr + vaddr as u32
        } else {
            vaddr as u32
        }
    }

    /// 20-bit DMA address spread over three consecutive registers.
    fn dma_addr(&self, reg: usize) -> u32 {
        self.ccr[reg] as u32
            | (self.ccr[reg + 1] as u32) << 8
            | ((self.ccr[reg + 2] & 0x0f) as u32) << 16
    }

    fn set_dma_addr(&mut self, reg: usize, pa: u32) {
        self.ccr[reg] = pa as u8;
        self.ccr[reg + 1] = (pa >> 8) as u8;
        self.ccr[reg + 2] = (pa >> 16) as u8;
    }

    /// One DMA arbitration slot. Returns true when a transfer cycle was
    /// performed instead of CPU execution. Burst mode keeps winning the
    /// slot until the count runs out; cycle-steal mode alternates with
    /// the CPU. Addresses are already physical; the MMU is bypassed.
    pub(super) fn dma<B: Bus<Address = u32>>(&mut self, bus: &mut B) -> bool {
        // DE0 and DME both set
        if self.ccr[0x30] & 0b0100_0001 != 0b0100_0001 {
            return false;
        }
        let dmode = self.ccr[0x31];
        if dmode & 0b0011_0000 == 0b0011_0000 || dmode & 0b0000_1100 == 0b0000_1100 {
            // Memory-to-memory only: an I/O-sourced or I/O-sinked
            // channel shuts the channel down and signals completion so
            // the driver can observe the rejection.
            self.active_dma = false;
            self.ccr[0x30] &= !0b0100_0000; // DE0
            if self.ccr[0x30] & 0b0000_0100 != 0 {
                self.raise_internal_int(4);
            }
            return false;
        }
        let burst = dmode & 0b0000_0010 != 0;
        if !burst {
            self.active_dma = !self.active_dma;
            if !self.active_dma {
                return false;
            }
        }
        let mut sar = self.dma_addr(0x20);
        let mut dar = self.dma_addr(0x23);
        let mut bcr = (self.ccr[0x27] as u16) << 8 | self.ccr[0x26] as u16;
        let mut transferred = false;
        if bcr != 0 {
            let v = bus.read(sar);
            self.ticks += 3;
            bus.write(dar, v);
            self.ticks += 3;
            if dmode & 0b0000_1000 == 0 {
                sar = if dmode & 0b0000_0100 == 0 {
                    sar.wrapping_add(1)
                } else {
                    sar.wrapping_sub(1)
                };
                self.set_dma_addr(0x20, sar);
            }
            if dmode & 0b0010_0000 == 0 {
                dar = if dmode & 0b0001_0000 == 0 {
                    dar.wrapping_add(1)
                } else {
                    dar.wrapping_sub(1)
                };
                self.set_dma_addr(0x23, dar);
            }
            bcr = bcr.wrapping_sub(1);
            self.ccr[0x27] = (bcr >> 8) as u8;
            self.ccr[0x26] = bcr as u8;
            transferred = true;
        }
        if bcr == 0 {
            self.active_dma = false;
            self.ccr[0x30] &= !0b0100_0000; // DE0
            if self.ccr[0x30] & 0b0000_0100 != 0 {
                // DIE0
                self.raise_internal_int(4);
            }
        }
        transferred
    }
}

#[cfg(test)]
mod tests {
    use super::super::Z180;

    #[test]
    fn translation_has_three_zones() {
        let mut cpu = Z180::new();
        // CBAR 0xe8: bank area from 0x8000, common 1 from 0xe000
        cpu.ccr[0x3a] = 0xe8;
        cpu.com1 = 0xe000;
        cpu.bnk1 = 0x8000;
        cpu.bbr = 0x10 << 12;
        cpu.cbr = 0x20 << 12;

        assert_eq!(cpu.phy_addr(0x0000), 0x0000);
        assert_eq!(cpu.phy_addr(0x7fff), 0x7fff);
        assert_eq!(cpu.phy_addr(0x8000), 0x10000 + 0x8000);
        assert_eq!(cpu.phy_addr(0xdfff), 0x10000 + 0xdfff);
        assert_eq!(cpu.phy_addr(0xe000), 0x20000 + 0xe000);
        assert_eq!(cpu.phy_addr(0xffff), 0x20000 + 0xffff);
    }

    #[test]
    fn boundary_compares_top_nibble_only() {
        let mut cpu = Z180::new();
        cpu.com1 = 0xf000;
        cpu.bnk1 = 0x0000;
        cpu.bbr = 0x05 << 12;
        // 0xefff is still in the bank zone even though it is one short
        // of the common boundary
        assert_eq!(cpu.phy_addr(0xefff), 0x5000 + 0xefff);
        assert_eq!(cpu.phy_addr(0xf000), 0xf000);
    }
}
