pub(crate) mod request;
pub mod response;
