//! Sensor fusion of noisy position samples

pub mod buffer;
pub mod display;
pub mod filter;
pub mod heading;
pub mod orientation;
pub mod pipeline;
pub mod sample;
pub mod speed;


pub use buffer::RingBuffer;
pub use sample::{AcceptedSample, FusedEstimate, RawSample};
