pub mod bootstrap;
pub mod cleanup;
pub mod clone;
pub mod close;
pub mod configure;
pub mod context;
pub mod init;
pub mod output;
pub mod propagate;
pub mod status;
pub mod sync_template;
pub mod trigger;
