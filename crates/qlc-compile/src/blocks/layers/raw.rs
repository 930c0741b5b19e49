use std::fmt;
use std::sync::Arc;

use qlc_circuit::ScheduledCircuit;
use qlc_core::{QlcError, Scalable2D};

/// Builds the circuit of a [`RawCircuitLayer`] at a given `k`.
pub type CircuitFactory = Arc<dyn Fn(u32) -> Result<ScheduledCircuit, QlcError> + Send + Sync>;

/// Atomic layer whose circuit is provided verbatim by the caller.
///
/// Two raw layers compare equal when they share a name and a shape; the factory
/// itself is opaque.
#[derive(Clone)]
pub struct RawCircuitLayer {
    name: String,
    shape: Scalable2D,
    factory: CircuitFactory,
}

impl RawCircuitLayer {
    /// Creates a raw layer covering `shape` qubits.
    pub fn new(name: impl Into<String>, shape: Scalable2D, factory: CircuitFactory) -> Self {
        Self {
            name: name.into(),
            shape,
            factory,
        }
    }

    /// Name used for equality and diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Footprint in qubits.
    pub fn scalable_shape(&self) -> Scalable2D {
        self.shape
    }

    /// Circuit at `k`.
    pub fn to_circuit(&self, k: u32) -> Result<ScheduledCircuit, QlcError> {
        (self.factory)(k)
    }
}

impl fmt::Debug for RawCircuitLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCircuitLayer")
            .field("name", &self.name)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

impl PartialEq for RawCircuitLayer {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.shape == other.shape
    }
}
