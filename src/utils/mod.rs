pub mod rng;

pub use rng::{stream_seed, RandomSource};
