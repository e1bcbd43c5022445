pub mod database {
    pub mod actions;
    pub mod error;
    pub mod form;
    pub mod memory;
    pub mod postgres;
    pub mod schema;
    pub mod shopping_list;
    pub mod store;
    pub mod views;
}
pub mod authentication {
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
pub mod config;
pub mod constants;
pub mod media;

pub use authentication::*;
pub use constants::*;
pub use database::*;
