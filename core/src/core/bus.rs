/// Maskable-interrupt acceptance mode (Z80 family; the 8080/8085 INTR
/// line always acknowledges Mode0-style).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntMode {
    /// Host supplies instruction byte(s) during the acknowledge cycle.
    Mode0,
    /// Jump to the fixed vector 0x0038.
    Mode1,
    /// Host supplies the low vector byte, combined with the I register.
    Mode2,
}

/// Generic bus interface consumed by every engine.
///
/// Memory reads/writes carry the engine's address type: `u16` logical
/// addresses for the 8080/8085/Z80, `u32` physical (post-MMU, up to
/// 20 bits) for the Z180. Port I/O always uses the 16-bit port space.
/// Every call must return; there is no failure path at this layer.
pub trait Bus {
    type Address: Copy + Into<u32>;

    fn read(&mut self, addr: Self::Address) -> u8;
    fn write(&mut self, addr: Self::Address, data: u8);

    /// Read from the I/O port space (separate from memory on this family).
    fn io_read(&mut self, port: u16) -> u8;

    /// Write to the I/O port space.
    fn io_write(&mut self, port: u16, data: u8);

    /// Supply the interrupt-acknowledge byte: an instruction byte in
    /// Mode0, the low vector byte in Mode2. Mode1 never calls this.
    fn int_ack(&mut self, _mode: IntMode) -> u8 {
        0xff
    }

    /// Advisory notification that the engine is about to fetch from an
    /// address marked as a breakpoint. The engine continues regardless;
    /// stopping is the driver's decision.
    fn breakpoint(&mut self) {}

    /// Called after every retired instruction when the engine's
    /// exec-done reporting is enabled.
    fn retired(&mut self) {}

    /// A return-from-interrupt opcode was executed (Z80/Z180 RETI/RETN),
    /// so daisy-chained peripherals can observe it.
    fn reti(&mut self, _opcode: u8) {}

    /// Host timing hook for contended/stretched cycles.
    fn contend(&mut self, _t_states: u32) {}
}
