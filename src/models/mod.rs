pub mod enums;
pub mod record;

pub use enums::*;
pub use record::*;
