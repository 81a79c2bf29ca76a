//! Well-known opcodes.
//!
//! Values below [`CUSTOM_CODES`] are reserved for the system; applications
//! allocate their own opcodes from [`CUSTOM_CODES`] upward.

pub const PING: i32 = 1;
pub const CONNECT: i32 = 2;
pub const DISCONNECT: i32 = 3;
pub const CHAT_MESSAGE: i32 = 4;
pub const MOVE_PLAYER: i32 = 5;
pub const VOICE_DATA: i32 = 6;
pub const VIDEO_FRAME: i32 = 7;

/// First opcode available to applications.
pub const CUSTOM_CODES: i32 = 1000;

/// Whether `opcode` falls in the system-reserved range.
pub fn is_reserved(opcode: i32) -> bool {
    opcode < CUSTOM_CODES
}
