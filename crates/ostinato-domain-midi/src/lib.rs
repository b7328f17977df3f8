pub mod accumulator;
pub mod midi_export;
pub mod midi_import;
pub mod model;
pub mod reader;
pub mod store;

pub use accumulator::*;
pub use midi_export::*;
pub use midi_import::*;
pub use model::*;
pub use reader::*;
pub use store::*;
