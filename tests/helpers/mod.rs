pub mod builders;

pub use builders::{SnapshotBuilder, UserBuilder};
