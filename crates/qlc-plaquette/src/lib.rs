#![deny(missing_docs)]
#![doc = "Plaquette templates, the rotated CSS surface-code plaquette library and the layer-to-circuit capability of the QLC block compiler."]

pub mod generation;
pub mod library;
pub mod plaquette;
pub mod subtemplates;
pub mod template;

pub use generation::{generate_circuit, generate_circuit_from_instantiation};
pub use library::{
    css_plaquette, css_plaquette_on, patch_plaquettes, surface_code_plaquettes, Corner, PatchBases,
    PatchLayout, RoundKind,
};
pub use plaquette::{Plaquette, Plaquettes};
pub use subtemplates::{get_spatially_distinct_3d_subtemplates, SubTemplate3D, UniqueSubTemplates3D};
pub use template::{BorderIndices, PlaquetteGrid, RectangularTemplate, Template, TemplateBorder};
