pub mod cleanup;
pub mod motivation_scheduler;
