// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod action;
pub mod controller;
pub mod ids;
pub mod model;
pub mod remote;
pub mod state;

pub use action::*;
pub use controller::*;
pub use ids::*;
pub use model::*;
pub use remote::*;
pub use state::*;
