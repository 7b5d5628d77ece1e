pub mod core;
pub mod cpu;

pub mod prelude {
    pub use crate::core::{Bus, IntMode};
    pub use crate::cpu::state::CpuState;
    pub use crate::cpu::{I8080, I8085, Z80, Z180};
}
