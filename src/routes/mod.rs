pub(crate) mod analyze;
pub(crate) mod chat;
pub(crate) mod fallback;
pub(crate) mod health;
pub(crate) mod payload;
