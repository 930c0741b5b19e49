#![deny(missing_docs)]
#![doc = "Core value types shared by the QLC block compiler: error families, quantities scaling with the code distance, typed positions and Pauli bases."]

pub mod basis;
pub mod errors;
pub mod position;
pub mod scale;
pub mod schema;

pub use basis::Basis;
pub use errors::{ErrorInfo, QlcError};
pub use position::{BlockPosition2D, BlockPosition3D, Direction3D, Shift2D, SignedDirection3D};
pub use scale::{lcm, LinearFunction, Scalable2D, Shape2D};
pub use schema::SchemaVersion;
