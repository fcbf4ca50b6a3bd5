pub mod database;
pub mod database_logs;
pub mod database_users;
pub mod time;

#[allow(unused_imports)]
pub use database::Database;
#[allow(unused_imports)]
pub use database_logs::{RequestLog, RequestLogStore};
