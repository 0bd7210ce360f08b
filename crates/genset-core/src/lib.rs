pub mod exchange;
pub mod model;
mod model_proptest;
pub mod noise;
pub mod tags;
pub mod tick_loop;
pub mod timebase;

pub use exchange::{GeneratorSnapshot, StateExchange};
pub use model::{GeneratorConfig, GeneratorModel, Status};
pub use noise::{NoiseSource, SeededNoise};
pub use tick_loop::{SimThread, TickConfig, TickStats};
pub use timebase::TimeBase;
