use std::fmt;

/// USB-устройство, найденное при перечислении
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsbDevice {
    pub vendor_id: u16,
    pub product_id: u16,
    pub name: Option<String>,
    pub path: String,
}

impl UsbDevice {
    pub fn new(vendor_id: u16, product_id: u16, path: impl Into<String>) -> Self {
        Self {
            vendor_id,
            product_id,
            name: None,
            path: path.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// `046d:c31c` - как в udev (ID_VENDOR_ID:ID_MODEL_ID)
    pub fn composite_key(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor_id, self.product_id)
    }

    /// `USB\VID_046D&PID_C31C` - как DeviceID в WMI
    pub fn legacy_id(&self) -> String {
        format!("USB\\VID_{:04X}&PID_{:04X}", self.vendor_id, self.product_id)
    }
}

impl fmt::Display for UsbDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} \"{}\" ({})", self.composite_key(), name, self.path),
            None => write!(f, "{} ({})", self.composite_key(), self.path),
        }
    }
}

/// Идентификатор отслеживаемой клавиатуры из настроек
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyboardId {
    /// `vvvv:pppp`, сравнивается на точное совпадение
    VendorProduct { vendor: u16, product: u16 },
    /// Фрагмент пути устройства, сравнивается вхождением без учёта регистра
    Legacy(String),
}

impl KeyboardId {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        if let Some((vendor, product)) = trimmed.split_once(':') {
            if let (Some(vendor), Some(product)) = (parse_hex_u16(vendor), parse_hex_u16(product)) {
                return Self::VendorProduct { vendor, product };
            }
        }

        Self::Legacy(trimmed.to_lowercase())
    }

    pub fn matches(&self, device: &UsbDevice) -> bool {
        match self {
            Self::VendorProduct { vendor, product } => {
                device.vendor_id == *vendor && device.product_id == *product
            }
            Self::Legacy(needle) => {
                if needle.is_empty() {
                    return false;
                }
                device.legacy_id().to_lowercase().contains(needle.as_str())
                    || device.path.to_lowercase().contains(needle.as_str())
            }
        }
    }

    pub fn matches_any(&self, devices: &[UsbDevice]) -> bool {
        devices.iter().any(|device| self.matches(device))
    }
}

fn parse_hex_u16(part: &str) -> Option<u16> {
    let part = part.trim();
    if part.is_empty() || part.len() > 4 {
        return None;
    }
    u16::from_str_radix(part, 16).ok()
}

impl fmt::Display for KeyboardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VendorProduct { vendor, product } => write!(f, "{:04x}:{:04x}", vendor, product),
            Self::Legacy(needle) => write!(f, "\"{}\"", needle),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn devices() -> Vec<UsbDevice> {
        vec![
            UsbDevice::new(0x1d6b, 0x0002, "/sys/bus/usb/devices/usb1").with_name("xHCI Host Controller"),
            UsbDevice::new(0x04d9, 0xa1df, "/sys/bus/usb/devices/1-4").with_name("USB Keyboard"),
        ]
    }

    #[test]
    fn test_parse_vendor_product() {
        assert_eq!(
            KeyboardId::parse("046D:C31C"),
            KeyboardId::VendorProduct { vendor: 0x046d, product: 0xc31c }
        );
        assert_eq!(
            KeyboardId::parse("VID_04D9&PID_A1DF"),
            KeyboardId::Legacy("vid_04d9&pid_a1df".to_string())
        );
        assert!(matches!(KeyboardId::parse("zz:yy"), KeyboardId::Legacy(_)));
    }

    #[test]
    fn test_legacy_identifier_matches_case_insensitively() {
        let id = KeyboardId::parse("VID_04D9&PID_A1DF");
        assert!(id.matches_any(&devices()));

        let lower = KeyboardId::parse("vid_04d9&pid_a1df");
        assert!(lower.matches_any(&devices()));
    }

    #[test]
    fn test_legacy_identifier_without_match() {
        let id = KeyboardId::parse("VID_04D9&PID_FFFF");
        assert!(!id.matches_any(&devices()));
        assert!(!KeyboardId::parse("   ").matches_any(&devices()));
    }

    #[test]
    fn test_vendor_product_exact_match() {
        assert!(KeyboardId::parse("04d9:a1df").matches_any(&devices()));
        assert!(KeyboardId::parse("04D9:A1DF").matches_any(&devices()));
        assert!(!KeyboardId::parse("04d9:a1d0").matches_any(&devices()));
        assert!(!KeyboardId::parse("046d:c31c").matches_any(&[]));
    }

    #[test]
    fn test_device_keys() {
        let device = UsbDevice::new(0x04d9, 0xa1df, "1-4");
        assert_eq!(device.composite_key(), "04d9:a1df");
        assert_eq!(device.legacy_id(), "USB\\VID_04D9&PID_A1DF");
    }
}
