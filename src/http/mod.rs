//! Read-only HTTP gateway over the site content aggregate
//! 站点内容聚合的只读HTTP网关

pub mod gateway;
pub mod handlers;
pub mod routes;

#[cfg(test)]
mod gateway_test;

pub use gateway::{create_gateway_router, GatewayState, HttpGateway};
