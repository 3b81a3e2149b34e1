//! Data Transfer Objects for REST request/response serialization.

pub mod common_dto;
pub mod team_dto;
pub mod tournament_dto;

pub use common_dto::*;
pub use team_dto::*;
pub use tournament_dto::*;
