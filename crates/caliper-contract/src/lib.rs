pub mod catalogue;
pub mod contract;
pub mod predicates;
pub mod profile;

pub use catalogue::{Catalogue, CatalogueError};
pub use contract::{Check, CheckContext, Contract, Expectations};
pub use profile::{resolve_profile, Applicability, Profile, ProfileSource, ResolveError, ResolvedProfile};
