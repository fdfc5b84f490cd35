//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements       | Connects to                  |
//! |----------------|------------------|------------------------------|
//! | `config_file`  | ConfigPort       | JSON config file             |
//! | `group_store`  | GroupStorePort   | any StoragePort              |
//! | `log_sink`     | EventSink        | `log` facade                 |
//! | `sim_led`      | PhysicalLedPort  | in-memory registers          |
//! | `storage`      | StoragePort      | files (atomic) / memory      |
//! | `sysfs_led`    | PhysicalLedPort  | Linux `/sys/class/leds`      |

pub mod config_file;
pub mod group_store;
pub mod log_sink;
pub mod sim_led;
pub mod storage;
pub mod sysfs_led;
