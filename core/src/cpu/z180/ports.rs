//! The relocatable 64-byte internal I/O window: on-chip register
//! decode, pluggable port-mapped devices, and the internal interrupt
//! bitmap they feed.

use super::Z180;
use crate::core::Bus;

/// Port-mapped on-chip peripheral (ASCI, CSIO). A device claims a set
/// of internal ports and overrides the register file for them.
pub trait PortDevice {
    fn io_read(&mut self, port: u16) -> u8;
    fn io_write(&mut self, port: u16, data: u8);
}

impl Z180 {
    /// Attach an ASCI implementation over its internal port set (both
    /// channels plus the S180 extension registers).
    pub fn attach_asci(&mut self, dev: Box<dyn PortDevice>) {
        self.devices.push(dev);
        let id = self.devices.len() as u8;
        for p in 0x00..0x0a {
            self.port_claims[p] = id;
        }
        self.port_claims[0x12] = id;
        self.port_claims[0x13] = id;
        self.port_claims[0x1a] = id;
        self.port_claims[0x1b] = id;
        self.port_claims[0x1c] = id;
        self.port_claims[0x1d] = id;
    }

    pub(crate) fn raise_internal_int(&mut self, slot: u8) {
        self.int_lines |= 1 << (slot & 0x0f);
    }

    pub(crate) fn lower_internal_int(&mut self, slot: u8) {
        self.int_lines &= !(1 << (slot & 0x0f));
    }

    /// All port input routes through here: internal window decode
    /// first, external bus (plus I/O wait states) otherwise.
    pub(crate) fn in_port<B: Bus<Address = u32>>(&mut self, bus: &mut B, port: u16) -> u8 {
        if port & !0x3f != self.ioa {
            self.ticks += self.iw;
            return bus.io_read(port);
        }
        let port = (port & 0x3f) as usize;
        if self.port_claims[port] != 0 {
            let id = (self.port_claims[port] - 1) as usize;
            return self.devices[id].io_read(port as u16);
        }
        let val = self.ccr[port];
        if port == 0x10 {
            // Reading TCR acknowledges both timer interrupts
            self.ccr[port] &= 0b0011_1111;
            self.lower_internal_int(2);
            self.lower_internal_int(3);
        }
        val
    }

    /// All port output routes through here.
    pub(crate) fn out_port<B: Bus<Address = u32>>(&mut self, bus: &mut B, port: u16, val: u8) {
        if port & !0x3f != self.ioa {
            self.ticks += self.iw;
            bus.io_write(port, val);
            return;
        }
        let port = (port & 0x3f) as usize;
        if self.port_claims[port] != 0 {
            let id = (self.port_claims[port] - 1) as usize;
            self.devices[id].io_write(port as u16, val);
            return;
        }
        match port {
            0x34 => {
                // ITC: only the enable bits are writable; TRAP is
                // write-0-to-clear and UFO is read-only.
                let mut v = (self.ccr[port] & 0b1111_1000) | (val & 0b0000_0111);
                if val & 0b1000_0000 == 0 {
                    v &= 0b0111_1111;
                }
                self.ccr[port] = v;
                return;
            }
            0x30 => {
                // DSTAT: DE bits are gated by their write-enable bits
                if val & 0b0001_0000 != 0 {
                    return;
                }
                let mut v = (self.ccr[port] & 0b1100_0001) | (val & 0b0000_1100);
                v = (v & !0b0100_0000) | (val & 0b0100_0000);
                if v & 0b0100_0000 != 0 {
                    v |= 0b0000_0001; // DME
                }
                if val & 0b0010_0000 == 0 {
                    v = (v & !0b1000_0000) | (val & 0b1000_0000);
                    if v & 0b1000_0000 != 0 {
                        v |= 0b0000_0001;
                    }
                }
                self.ccr[port] = v;
                if v & 0b0100_0100 == 0b0000_0100 {
                    self.raise_internal_int(4);
                } else {
                    self.lower_internal_int(4);
                }
                if v & 0b1000_1000 == 0b0000_1000 {
                    self.raise_internal_int(5);
                } else {
                    self.lower_internal_int(5);
                }
                return;
            }
            _ => {}
        }
        self.ccr[port] = val;
        match port {
            0x32 => {
                // DCNTL: wait-state programming
                self.mw = ((val & 0b1100_0000) >> 6) as i32;
                self.iw = ((val & 0b0011_0000) >> 4) as i32;
            }
            0x36 => {
                // RCR: refresh enable, cycle width and interval
                if val & 0b1000_0000 != 0 {
                    self.rw = ((val & 0b0100_0000) >> 6) as i32 + 1;
                } else {
                    self.rw = 0;
                }
                self.rc = (1 << (val & 0b0000_0011)) * 10;
            }
            0x38 => {
                self.cbr = (val as u32) << 12;
            }
            0x39 => {
                self.bbr = (val as u32) << 12;
            }
            0x3a => {
                self.com1 = ((val & 0xf0) as u16) << 8;
                self.bnk1 = ((val & 0x0f) as u16) << 12;
            }
            0x3f => {
                // ICR relocates the internal window
                self.ioa = (val & 0xc0) as u16;
            }
            _ => {}
        }
    }
}
