//! Model export and serialization module
//!
//! Writes the two artifacts of a successful run:
//! - Binary model file (bincode envelope with metadata and checksum)
//! - CSV trace of every optimization trial

mod serializer;
mod trace;

pub use serializer::{load_model, save_model, ModelMetadata};
pub use trace::{trials_dataframe, write_trace};
