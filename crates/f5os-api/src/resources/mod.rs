// Endpoint modules
//
// Each file adds inherent methods on `F5osClient` for one family of F5OS
// resources. Reads return `Ok(None)` when the device answers 404; writes
// return `Ok(())` once the device has accepted the change.

pub mod backup;
pub mod file_transfer;
pub mod images;
pub mod interfaces;
pub mod lag;
pub mod licensing;
pub mod partitions;
pub mod services;
pub mod system;
pub mod tenants;
pub mod vlans;
