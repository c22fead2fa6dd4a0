pub mod auth;
pub mod spaces;
pub mod taxonomy;
pub mod users;
