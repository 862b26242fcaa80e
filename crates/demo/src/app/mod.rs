pub(crate) mod bootstrap;
mod layout;
mod level;
pub(crate) mod loop_runner;
