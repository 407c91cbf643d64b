//! Serial port discovery.
//!
//! Stateless queries over the ports the OS reports. The `select_*`
//! functions work on any list of descriptors.

use std::fmt;

use serialport::{SerialPortInfo, SerialPortType};

use crate::error::{DmxError, Result};

/// One serial device as reported by the OS.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PortDescriptor {
    pub device: String,
    pub vendor_id: Option<u16>,
    pub product_id: Option<u16>,
    pub serial_number: Option<String>,
    pub manufacturer: Option<String>,
    pub product: Option<String>,
    pub description: String,
}

impl From<SerialPortInfo> for PortDescriptor {
    fn from(info: SerialPortInfo) -> Self {
        match info.port_type {
            SerialPortType::UsbPort(usb) => PortDescriptor {
                description: usb
                    .product
                    .clone()
                    .unwrap_or_else(|| "USB serial device".to_string()),
                device: info.port_name,
                vendor_id: Some(usb.vid),
                product_id: Some(usb.pid),
                serial_number: usb.serial_number,
                manufacturer: usb.manufacturer,
                product: usb.product,
            },
            SerialPortType::PciPort => PortDescriptor {
                device: info.port_name,
                description: "PCI serial port".to_string(),
                ..PortDescriptor::default()
            },
            SerialPortType::BluetoothPort => PortDescriptor {
                device: info.port_name,
                description: "Bluetooth serial port".to_string(),
                ..PortDescriptor::default()
            },
            SerialPortType::Unknown => PortDescriptor {
                device: info.port_name,
                description: "n/a".to_string(),
                ..PortDescriptor::default()
            },
        }
    }
}

impl fmt::Display for PortDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt<T: fmt::Display>(value: &Option<T>) -> String {
            value
                .as_ref()
                .map(|v| v.to_string())
                .unwrap_or_else(|| "None".to_string())
        }

        writeln!(f, "{}", self.device)?;
        writeln!(f, "  description: {}", self.description)?;
        writeln!(
            f,
            "  vid: {}",
            self.vendor_id.map(|v| format!("0x{:04x}", v)).unwrap_or_else(|| "None".to_string())
        )?;
        writeln!(
            f,
            "  pid: {}",
            self.product_id.map(|v| format!("0x{:04x}", v)).unwrap_or_else(|| "None".to_string())
        )?;
        writeln!(f, "  serial_number: {}", opt(&self.serial_number))?;
        writeln!(f, "  manufacturer: {}", opt(&self.manufacturer))?;
        write!(f, "  product: {}", opt(&self.product))
    }
}

/// All serial ports currently present.
pub fn list_ports() -> Result<Vec<PortDescriptor>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(PortDescriptor::from).collect())
}

pub fn find_by_serial_number(serial_number: &str) -> Result<String> {
    select_by_serial_number(&list_ports()?, serial_number)
}

pub fn find_by_product_id(product_id: u16) -> Result<String> {
    select_by_product_id(&list_ports()?, product_id)
}

pub fn find_by_vendor_product_id(vendor_id: u16, product_id: u16) -> Result<String> {
    select_by_vendor_product_id(&list_ports()?, vendor_id, product_id)
}

/// Device path of the first port with this serial number.
pub fn select_by_serial_number(ports: &[PortDescriptor], serial_number: &str) -> Result<String> {
    select(ports, |p| p.serial_number.as_deref() == Some(serial_number))
        .ok_or_else(|| DmxError::NotFound(format!("serial {}", serial_number)))
}

pub fn select_by_product_id(ports: &[PortDescriptor], product_id: u16) -> Result<String> {
    select(ports, |p| p.product_id == Some(product_id))
        .ok_or_else(|| DmxError::NotFound(format!("product id 0x{:04x}", product_id)))
}

pub fn select_by_vendor_product_id(
    ports: &[PortDescriptor],
    vendor_id: u16,
    product_id: u16,
) -> Result<String> {
    select(ports, |p| {
        p.vendor_id == Some(vendor_id) && p.product_id == Some(product_id)
    })
    .ok_or_else(|| {
        DmxError::NotFound(format!(
            "vendor id 0x{:04x} and product id 0x{:04x}",
            vendor_id, product_id
        ))
    })
}

fn select<F>(ports: &[PortDescriptor], pred: F) -> Option<String>
where
    F: Fn(&PortDescriptor) -> bool,
{
    ports.iter().find(|p| pred(p)).map(|p| p.device.clone())
}
