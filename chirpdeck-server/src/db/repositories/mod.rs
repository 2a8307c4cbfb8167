mod account_repository;
mod credential_repository;
mod error;
mod like_repository;
mod post_repository;

pub use account_repository::AccountRepository;
pub use credential_repository::CredentialRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use like_repository::{LikeRepository, NewLike, RECENT_LIKES_LIMIT};
pub use post_repository::{NewPost, PostRepository};
