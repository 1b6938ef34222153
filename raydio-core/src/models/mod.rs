pub mod connection;
pub mod id;
pub mod livestream;
pub mod play_state;
pub mod player;

pub use connection::ConnectionState;
pub use id::{generate_id, BroadcasterId, SessionId, StreamId, UserId};
pub use livestream::{group_by_title, Language, Livestream, LivestreamGroup};
pub use play_state::PlayState;
pub use player::PlayerState;
