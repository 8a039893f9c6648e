#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod mock;
mod recorder;

pub use mock::{DeleteCall, CallGate, ListCall, MockRemoteStore};
pub use recorder::ProgressRecorder;
