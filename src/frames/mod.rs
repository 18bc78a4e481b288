pub(crate) mod coordinator;
pub(crate) mod events;
pub(crate) mod gate;
pub(crate) mod store;
pub(crate) mod watch;
