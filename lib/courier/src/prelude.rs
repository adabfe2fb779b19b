//! The client, its config, and the types requests resolve to.
//!
//! ```ignore
//! use courier::prelude::*;
//! ```

pub use crate::{
    Body, Cancel, CancelToken, Client, ClientBuilder, Error, Method, RequestConfig, Response,
    ResponseType, Result, Transport,
};
