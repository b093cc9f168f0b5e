//! Chat command surface shared by every transport.

pub mod handlers;
pub mod parse;
pub mod router;

pub use handlers::HandlerContext;
pub use parse::{parse_command, BotCommand, ParsedCommand};
pub use router::{CommandRouter, ReplyRoutes, RouterLoop};
