pub mod model;
pub mod repo;

pub use model::Profile;
