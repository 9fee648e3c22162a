pub mod post_dtos;
pub mod user_dtos;

pub use post_dtos::{CreatePostRequest, UpdatePostRequest};
pub use user_dtos::{CreateUserRequest, UpdateUserRequest};
