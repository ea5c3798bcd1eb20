//! Domain definitions.

pub mod comment;
pub mod post;
pub mod thumbnail;
pub mod user;

pub use self::{
    comment::Comment, post::Post, thumbnail::Thumbnail, user::User,
};
