pub mod authz;
pub mod cookies;
pub mod hash;
pub mod ids;
pub mod jwt;
pub mod pagination;
pub mod response;
pub mod sanitize;
pub mod validate;
