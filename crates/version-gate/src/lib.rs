//! Reference service that puts its API behind the client version
//! validation of the `version-validation` crate.

mod api;
mod cli;
mod run;
mod tracing;

pub use self::{
    api::router,
    run::{run, start},
};
