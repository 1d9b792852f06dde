#![deny(unsafe_code)]

//! Settings resolution against a target network model.
//!
//! Mapping rules turn a device's repository settings into attribute writes
//! on a [`TargetDeviceModel`]. The [`Orchestrator`] runs the full relay and
//! fuse flows over a batch of devices; the individual stages are public so
//! callers can drive them directly.

pub mod classify;
pub mod device;
pub mod dip;
pub mod engine;
pub mod error;
pub mod fuse;
pub mod logging;
pub mod memory;
pub mod model;
pub mod orchestrator;
pub mod reclosing;
pub mod repository;
pub mod resolve;
pub mod transformer;
pub mod types;

pub use device::{DeviceClass, Placement};
pub use engine::{ApplyContext, SettingDictionary, apply_settings, build_setting_dictionary};
pub use error::{CoreError, ModelError, Result};
pub use memory::{InMemoryModel, ModelStats};
pub use model::{ContentFilter, ModelResult, TargetDeviceModel};
pub use orchestrator::{Orchestrator, RunReport};
pub use repository::{fetch_with_retry, load_setting_rows};
pub use types::TypeIndex;
