//! Device-level operations above raw register access: identity strings and
//! the arm/fire/standby control sequences.

pub mod control;
pub mod info;

pub use control::DeviceMode;
pub use info::DeviceInfo;
