pub mod state;
pub use state::CpuState;

pub mod flags;
pub(crate) mod alu;

pub mod i8080;
pub use i8080::I8080;

pub mod i8085;
pub use i8085::I8085;

pub mod z80;
pub use z80::Z80;

pub mod z180;
pub use z180::Z180;
