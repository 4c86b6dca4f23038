pub mod harness;

mod faults;
mod height;
mod startup;
mod supervisor;
mod transfer;
mod turntable;
