pub mod database;
pub mod index;
pub mod page_reference;
pub mod schema;
pub mod store;
pub mod table;
pub mod validation;
