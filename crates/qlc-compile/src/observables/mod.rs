//! Logical observables: where they are measured and which qubits realise
//! them.

pub mod abstract_observable;
pub mod builder;

pub use abstract_observable::{AbstractObservable, ObservableCube, ObservablePipe};
pub use builder::{
    compute_observable_qubits, ObservableBuilder, ObservableComponent,
    SurfaceCodeObservableBuilder,
};
