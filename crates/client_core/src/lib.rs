pub mod error;
pub mod http;
pub mod render;
pub mod repository;
pub mod view;

pub use error::{ClientError, Result};
pub use http::HttpBackend;
pub use render::{OrderDetailsView, OrderTable, RowAction, TableQuery};
pub use repository::{AuthGate, CatalogRepository, OrderRepository};
pub use view::{ViewController, ViewEvent, ViewMode};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
