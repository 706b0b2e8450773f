//! Campus Core — domain models, request context, error taxonomy and
//! repository traits shared by every Campus crate.

pub mod context;
pub mod error;
pub mod models;
pub mod repository;
