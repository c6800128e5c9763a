//! HTTP interface
//!
//! JSON routes for reading and creating nodes and edges on a
//! [`SharedGraph`](crate::graph::SharedGraph).

pub mod handler;
pub mod server;

pub use server::{router, HttpServer};
