pub(crate) mod config;
pub(crate) mod get;
pub(crate) mod inspect;
pub(crate) mod refs;
