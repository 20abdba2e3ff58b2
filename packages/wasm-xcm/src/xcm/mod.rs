//! Cross-consensus message construction and parsing

pub mod builder;
pub mod parser;
pub mod types;

pub use builder::{build_teleport, FeeSchedule};
pub use parser::{parse_program, parse_program_hex, parse_teleport, ParsedTeleport};
pub use types::{XcmInstruction, XcmProgram, XCM_VERSION};
