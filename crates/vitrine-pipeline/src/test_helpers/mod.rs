//! Fakes shared by the unit tests and the scenario tests under `tests/`.

use crate::source::AssetSource;

#[allow(dead_code)]
mod fakes;

pub use fakes::*;
