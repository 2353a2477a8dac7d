/*!
 Contains the capability used to read the identifier of the machine a receipt is checked on.

 The receipt's identity hash binds it to a single computer. On macOS, that computer is identified by
 the hardware address of its primary network interface, usually `en0`.
*/

use crate::error::identity::HostIdentityError;

/// The interface whose hardware address identifies the machine
#[cfg(target_os = "macos")]
pub const DEFAULT_INTERFACE: &str = "en0";
/// The interface whose hardware address identifies the machine
#[cfg(not(target_os = "macos"))]
pub const DEFAULT_INTERFACE: &str = "eth0";

/// Number of bytes in an Ethernet hardware address
const HARDWARE_ADDRESS_LEN: usize = 6;

/// Defines behavior for reading a stable, non-user-editable identifier of the host
pub trait HostIdentity {
    /// Get the bytes that identify this machine
    fn machine_identifier(&self) -> Result<Vec<u8>, HostIdentityError>;
}

impl<T: HostIdentity + ?Sized> HostIdentity for &T {
    fn machine_identifier(&self) -> Result<Vec<u8>, HostIdentityError> {
        (**self).machine_identifier()
    }
}

impl<T: HostIdentity + ?Sized> HostIdentity for Box<T> {
    fn machine_identifier(&self) -> Result<Vec<u8>, HostIdentityError> {
        (**self).machine_identifier()
    }
}

/// Identifies the machine by the hardware address of a network interface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInterface {
    name: String,
}

impl NetworkInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The name of the interface, i.e. `en0`
    pub fn name(&self) -> &str {
        &self.name
    }

    #[cfg(target_os = "linux")]
    fn read_address(&self) -> Result<String, HostIdentityError> {
        let path = format!("/sys/class/net/{}/address", self.name);
        std::fs::read_to_string(path)
            .map(|address| address.trim().to_string())
            .map_err(|why| HostIdentityError::InterfaceUnavailable(self.name.clone(), why))
    }

    #[cfg(not(target_os = "linux"))]
    fn read_address(&self) -> Result<String, HostIdentityError> {
        let output = std::process::Command::new("ifconfig")
            .arg(&self.name)
            .output()
            .map_err(|why| HostIdentityError::InterfaceUnavailable(self.name.clone(), why))?;
        if !output.status.success() {
            return Err(HostIdentityError::InterfaceUnavailable(
                self.name.clone(),
                std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    String::from_utf8_lossy(&output.stderr).trim().to_string(),
                ),
            ));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_ifconfig(&stdout)
            .map(String::from)
            .ok_or_else(|| HostIdentityError::NoAddress(self.name.clone()))
    }
}

impl Default for NetworkInterface {
    /// The default interface is [`DEFAULT_INTERFACE`].
    fn default() -> Self {
        Self::new(DEFAULT_INTERFACE)
    }
}

impl HostIdentity for NetworkInterface {
    fn machine_identifier(&self) -> Result<Vec<u8>, HostIdentityError> {
        let address = self.read_address()?;
        if address.is_empty() {
            return Err(HostIdentityError::NoAddress(self.name.clone()));
        }
        let bytes = parse_hardware_address(&address)?;
        // Virtual interfaces report an all-zero address
        if bytes.iter().all(|byte| *byte == 0) {
            return Err(HostIdentityError::NoAddress(self.name.clone()));
        }
        Ok(bytes)
    }
}

/// A machine identifier that never changes, used to check receipts issued for another machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedIdentity(Vec<u8>);

impl FixedIdentity {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Create an identity from hex digits, optionally separated by `:` or `-`
    pub fn from_hex(text: &str) -> Result<Self, HostIdentityError> {
        parse_hex(text).map(Self)
    }
}

impl HostIdentity for FixedIdentity {
    fn machine_identifier(&self) -> Result<Vec<u8>, HostIdentityError> {
        Ok(self.0.clone())
    }
}

/// Find the hardware address in the output of `ifconfig`
///
/// The relevant line looks like `\tether 0:1b:63:84:45:e6 `.
pub fn parse_ifconfig(output: &str) -> Option<&str> {
    output.lines().find_map(|line| {
        let mut words = line.split_whitespace();
        match words.next() {
            Some("ether") => words.next(),
            _ => None,
        }
    })
}

/// Parse a colon separated hardware address
///
/// BSD tools omit leading zeros, so each group may have one or two hex digits.
pub fn parse_hardware_address(address: &str) -> Result<Vec<u8>, HostIdentityError> {
    let invalid = || HostIdentityError::InvalidAddress(address.to_string());

    let bytes = address
        .split([':', '-'])
        .map(|group| match group.len() {
            1 | 2 if group.bytes().all(|digit| digit.is_ascii_hexdigit()) => {
                u8::from_str_radix(group, 16).map_err(|_| invalid())
            }
            _ => Err(invalid()),
        })
        .collect::<Result<Vec<u8>, HostIdentityError>>()?;

    if bytes.len() != HARDWARE_ADDRESS_LEN {
        return Err(invalid());
    }
    Ok(bytes)
}

/// Parse a run of hex digit pairs, ignoring `:` and `-` separators
fn parse_hex(text: &str) -> Result<Vec<u8>, HostIdentityError> {
    let digits: String = text.chars().filter(|c| !matches!(c, ':' | '-')).collect();
    match hex::decode(&digits) {
        Ok(bytes) if !bytes.is_empty() => Ok(bytes),
        _ => Err(HostIdentityError::InvalidAddress(text.to_string())),
    }
}
