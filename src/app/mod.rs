// Application layer - Use case interactors

pub mod container;
pub mod conversion_controller;
pub mod inspect_interactor;

// Re-export interactors
pub use conversion_controller::{ConversionController, JobEvent, JobHandle};
pub use inspect_interactor::InspectInteractor;
