//! Use case implementations.

mod load_narrow_use_case;

pub use load_narrow_use_case::LoadNarrowUseCase;
