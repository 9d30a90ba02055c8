//! Base driver trait and metadata.

/// The kind of hardware a driver manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverType {
    /// Serial port / UART.
    Serial,
    /// Early boot console.
    Console,
}

/// Static metadata describing a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverInfo {
    /// Short class name (e.g. "apq8064").
    pub name: &'static str,
    /// The kind of hardware this driver manages.
    pub driver_type: DriverType,
    /// Human-readable description.
    pub description: &'static str,
}

/// Identity and metadata, implemented by every driver.
pub trait Driver {
    /// Returns static information about this driver.
    fn info(&self) -> DriverInfo;
}
