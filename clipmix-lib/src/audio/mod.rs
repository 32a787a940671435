//! Hardware side: device lookup, the mic bridge, the monitor tap and the
//! device stream lifecycle.

pub mod device;
pub mod mic;
pub mod monitor;
pub mod stream;

pub use device::{list_input_devices, list_output_devices, DeviceInfo, Direction};
pub use mic::MicBridge;
pub use monitor::{MonitorSource, MonitorTap};
pub use stream::{DeviceStream, StreamParts};
