// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

pub mod form;
pub mod ids;
pub mod model;
pub mod query;
pub mod results;
pub mod row;
pub mod state;

pub use form::*;
pub use ids::*;
pub use model::*;
pub use query::*;
pub use results::*;
pub use row::*;
pub use state::*;
