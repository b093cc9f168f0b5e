//! Normalized types shared by transports and the command router.

mod event;
mod transport;

pub use event::{BotEvent, InboundCommand, RewardRedemption};
pub use transport::Transport;
