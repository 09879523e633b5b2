//! Wire protocol
//!
//! Every frame is a JSON object whose `type` field selects the message kind.
//!
//! ```text
//! client ──► server   {"type":"join","boxId":"..."}
//! client ──► server   {"type":"textUpdate","text":"..."}
//! server ──► client   {"type":"userCount","count":N}
//! server ──► client   {"type":"textUpdate","text":"..."}
//! ```

pub mod message;

pub use message::{encode_text_update, InboundMessage, OutboundMessage, ProtocolError};
