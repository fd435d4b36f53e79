pub mod client;
pub mod executor;
pub mod method;
pub mod request;
pub mod response;

#[cfg(test)]
pub(crate) mod stub;
