//! CiA402 servo sequencing for cyclic EtherCAT masters.
//!
//! The drive logic lives in [`ctrl_402`] and is re-exported here. This crate
//! adds what an application needs around it: the startup parameter file,
//! the process-data image, a simulated drive and a tokio cycle runner.

pub use ctrl_402::*;

pub mod cyclic;
pub mod domain;
pub mod sim;
pub mod startup;
