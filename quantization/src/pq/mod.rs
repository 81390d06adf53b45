pub mod pq;

pub use pq::{PqDistanceImpl, ProductQuantizer};
