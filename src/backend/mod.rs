//! Backend adapters
//!
//! Three independent implementations of the compiler / converter /
//! transport seams:
//!
//! | backend       | strategy        | windowing         | sorts                        |
//! |---------------|-----------------|-------------------|------------------------------|
//! | `wide_column` | stateful cursor | native limit only | multi-key `ORDER BY`         |
//! | `document`    | stateless       | native from/size  | multi-key `sort`             |
//! | `key_value`   | stateful cursor | client-side       | first key + page-local rest  |

mod adapter;
mod traits;

pub mod document;
pub mod key_value;
pub mod wide_column;

pub use adapter::Adapter;
pub use traits::{
    EntityConverter, FetchWindow, Page, PageSource, QueryCompiler, Transport, WriteAdapter,
};
