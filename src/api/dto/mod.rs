//! Data Transfer Objects for REST request/response serialization.
//!
//! Member identities are serialized as JSON strings to prevent precision
//! loss on 64-bit platform snowflakes.

pub mod common_dto;
pub mod member_dto;
pub mod roster_dto;
pub mod vzp_dto;

pub use common_dto::*;
pub use member_dto::*;
pub use roster_dto::*;
pub use vzp_dto::*;
