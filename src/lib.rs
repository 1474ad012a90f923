mod database {
    pub mod actions;
    pub mod error;
    pub mod filters;
    pub mod form;
    pub mod pagination;
    pub mod schema;
    pub mod views;
}
mod authentication {
    pub mod jwt;
    pub mod middleware;
    pub mod permissions;
}
mod api {
    pub mod handlers;
    pub mod reply;
    pub mod routes;
}
pub mod config;
mod constants;
pub mod shopping_list;

pub use api::*;
pub use authentication::*;
pub use constants::*;
pub use database::*;
