pub mod bus;

pub use bus::{Bus, IntMode};
