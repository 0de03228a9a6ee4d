pub mod bootstrap;
pub mod commands;
pub mod drop;
pub mod planner;
pub mod schedule;
