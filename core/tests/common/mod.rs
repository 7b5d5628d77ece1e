#![allow(dead_code)]

use ferrite_core::core::{Bus, IntMode};

/// Minimal bus for the 16-bit-address engines: flat 64KB memory, a
/// 256-entry port input table and a log of port writes.
pub struct TestBus {
    pub memory: [u8; 0x10000],
    pub io_in: [u8; 0x100],
    pub io_out: Vec<(u16, u8)>,
    pub int_ack_byte: u8,
    pub reti_ops: Vec<u8>,
}

impl TestBus {
    pub fn new() -> Self {
        Self {
            memory: [0; 0x10000],
            io_in: [0; 0x100],
            io_out: Vec::new(),
            int_ack_byte: 0xff,
            reti_ops: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u16, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for TestBus {
    type Address = u16;

    fn read(&mut self, addr: u16) -> u8 {
        self.memory[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.memory[addr as usize] = data;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.io_in[(port & 0xff) as usize]
    }

    fn io_write(&mut self, port: u16, data: u8) {
        self.io_out.push((port, data));
    }

    fn int_ack(&mut self, _mode: IntMode) -> u8 {
        self.int_ack_byte
    }

    fn reti(&mut self, opcode: u8) {
        self.reti_ops.push(opcode);
    }
}

/// Physical-address bus for the Z180: 1MB flat memory so MMU routing
/// is observable end to end.
pub struct PhysBus {
    pub memory: Box<[u8]>,
    pub io_in: [u8; 0x100],
    pub io_out: Vec<(u16, u8)>,
    pub int_ack_byte: u8,
    pub reti_ops: Vec<u8>,
}

impl PhysBus {
    pub fn new() -> Self {
        Self {
            memory: vec![0; 0x100000].into_boxed_slice(),
            io_in: [0; 0x100],
            io_out: Vec::new(),
            int_ack_byte: 0xff,
            reti_ops: Vec::new(),
        }
    }

    pub fn load(&mut self, addr: u32, data: &[u8]) {
        let start = addr as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
    }
}

impl Bus for PhysBus {
    type Address = u32;

    fn read(&mut self, addr: u32) -> u8 {
        self.memory[(addr & 0xfffff) as usize]
    }

    fn write(&mut self, addr: u32, data: u8) {
        self.memory[(addr & 0xfffff) as usize] = data;
    }

    fn io_read(&mut self, port: u16) -> u8 {
        self.io_in[(port & 0xff) as usize]
    }

    fn io_write(&mut self, port: u16, data: u8) {
        self.io_out.push((port, data));
    }

    fn int_ack(&mut self, _mode: IntMode) -> u8 {
        self.int_ack_byte
    }

    fn reti(&mut self, opcode: u8) {
        self.reti_ops.push(opcode);
    }
}
