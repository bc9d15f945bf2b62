pub(crate) mod generate;
pub(crate) mod list;
pub(crate) mod show;
pub(crate) mod transitions;
pub(crate) mod workflow;
