pub mod games;
pub mod server;
pub mod utility;
