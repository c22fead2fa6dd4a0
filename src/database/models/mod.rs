mod space;
mod taxonomy;
mod user;

pub use space::{Space, SpaceDetail, SpaceIdentity};
pub use taxonomy::{TaxonomyEntry, TaxonomyKind};
pub use user::{PublicUserProfile, User, UserProfile};
