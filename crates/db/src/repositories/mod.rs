//! One zero-sized repository per table; every method takes the pool first.

pub mod project_repo;
pub mod session_repo;
pub mod user_repo;

pub use project_repo::ProjectRepo;
pub use session_repo::SessionRepo;
pub use user_repo::UserRepo;
