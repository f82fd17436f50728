mod bootstrap;
mod connection;
mod query;
mod schema;

pub use bootstrap::*;
pub use connection::*;
pub use query::*;
pub use schema::*;
