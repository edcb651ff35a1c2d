//! Class-specific descriptors of the composite function.
//!
//! Every array here is a complete descriptor, `bLength` and `bDescriptorType` included.
//! `DescriptorWriter::write` takes the type and body separately.

use crate::consts::*;

pub const CS_INTERFACE: u8 = 0x24;

const CDC_TYPE_HEADER: u8 = 0x00;
const CDC_TYPE_CALL_MANAGEMENT: u8 = 0x01;
const CDC_TYPE_ACM: u8 = 0x02;
const CDC_TYPE_UNION: u8 = 0x06;

/// CDC 1.10
const BCD_CDC: u16 = 0x0110;
/// HID 1.11
const BCD_HID: u16 = 0x0111;

/// Device supports SET_LINE_CODING, SET_CONTROL_LINE_STATE, GET_LINE_CODING and SERIAL_STATE
const ACM_CAPABILITIES: u8 = 0x02;

pub const CONFIGURATION_DESCRIPTOR_LEN: usize = 9;
pub const IAD_LEN: usize = 8;
pub const INTERFACE_DESCRIPTOR_LEN: usize = 9;
pub const ENDPOINT_DESCRIPTOR_LEN: usize = 7;
pub const CDC_HEADER_LEN: usize = 5;
pub const CDC_CALL_MANAGEMENT_LEN: usize = 5;
pub const CDC_ACM_LEN: usize = 4;
pub const CDC_UNION_LEN: usize = 5;

pub const fn cdc_header() -> [u8; CDC_HEADER_LEN] {
    let bcd = BCD_CDC.to_le_bytes();
    [CDC_HEADER_LEN as u8, CS_INTERFACE, CDC_TYPE_HEADER, bcd[0], bcd[1]]
}

/// Call management is not handled by the device; `data_interface` carries the calls
pub const fn cdc_call_management(data_interface: u8) -> [u8; CDC_CALL_MANAGEMENT_LEN] {
    [CDC_CALL_MANAGEMENT_LEN as u8, CS_INTERFACE, CDC_TYPE_CALL_MANAGEMENT, 0x00, data_interface]
}

pub const fn cdc_acm() -> [u8; CDC_ACM_LEN] {
    [CDC_ACM_LEN as u8, CS_INTERFACE, CDC_TYPE_ACM, ACM_CAPABILITIES]
}

pub const fn cdc_union(comm_interface: u8, data_interface: u8) -> [u8; CDC_UNION_LEN] {
    [CDC_UNION_LEN as u8, CS_INTERFACE, CDC_TYPE_UNION, comm_interface, data_interface]
}

/// HID class descriptor announcing one report descriptor of `report_len` bytes
pub const fn hid_descriptor(report_len: u16) -> [u8; USB_CUSTOM_HID_DESC_SIZ] {
    let bcd = BCD_HID.to_le_bytes();
    let len = report_len.to_le_bytes();
    [
        USB_CUSTOM_HID_DESC_SIZ as u8,
        CUSTOM_HID_DESCRIPTOR_TYPE,
        bcd[0],
        bcd[1],
        0x00, // not localized
        0x01,
        CUSTOM_HID_REPORT_DESC,
        len[0],
        len[1],
    ]
}

/// Vendor defined page with one input and one output report, each
/// `CUSTOM_HID_EPIN_SIZE` / `CUSTOM_HID_EPOUT_SIZE` bytes long.
pub const CUSTOM_HID_REPORT_DESCRIPTOR: [u8; 27] = [
    0x06, 0x00, 0xFF, // Usage Page (Vendor Defined 0xFF00)
    0x09, 0x01, // Usage (0x01)
    0xA1, 0x01, // Collection (Application)
    0x15, 0x00, //   Logical Minimum (0)
    0x26, 0xFF, 0x00, //   Logical Maximum (255)
    0x75, 0x08, //   Report Size (8)
    0x95, CUSTOM_HID_EPIN_SIZE as u8, //   Report Count
    0x09, 0x01, //   Usage (0x01)
    0x81, 0x02, //   Input (Data,Var,Abs)
    0x95, CUSTOM_HID_EPOUT_SIZE as u8, //   Report Count
    0x09, 0x01, //   Usage (0x01)
    0x91, 0x02, //   Output (Data,Var,Abs)
    0xC0, // End Collection
];

/// Length of the whole configuration descriptor the class produces, configuration
/// header included.
pub const fn configuration_descriptor_len() -> usize {
    let cdc_comm = INTERFACE_DESCRIPTOR_LEN
        + CDC_HEADER_LEN
        + CDC_CALL_MANAGEMENT_LEN
        + CDC_ACM_LEN
        + CDC_UNION_LEN
        + ENDPOINT_DESCRIPTOR_LEN;
    let cdc_data = INTERFACE_DESCRIPTOR_LEN + 2 * ENDPOINT_DESCRIPTOR_LEN;
    let hid = INTERFACE_DESCRIPTOR_LEN + USB_CUSTOM_HID_DESC_SIZ + 2 * ENDPOINT_DESCRIPTOR_LEN;
    CONFIGURATION_DESCRIPTOR_LEN + IAD_LEN + cdc_comm + cdc_data + hid
}

/// Splits a complete descriptor into `(bDescriptorType, body)`
pub(crate) fn split(descriptor: &[u8]) -> (u8, &[u8]) { (descriptor[1], &descriptor[2..]) }

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_length_matches() {
        assert_eq!(configuration_descriptor_len(), USB_CDC_CONFIG_DESC_SIZ);
    }

    #[test]
    fn test_functional_descriptors() {
        assert_eq!(cdc_header(), [0x05, 0x24, 0x00, 0x10, 0x01]);
        assert_eq!(cdc_call_management(1), [0x05, 0x24, 0x01, 0x00, 0x01]);
        assert_eq!(cdc_acm(), [0x04, 0x24, 0x02, 0x02]);
        assert_eq!(cdc_union(0, 1), [0x05, 0x24, 0x06, 0x00, 0x01]);
    }

    #[test]
    fn test_hid_descriptor_points_at_report() {
        let desc = hid_descriptor(CUSTOM_HID_REPORT_DESCRIPTOR.len() as u16);
        assert_eq!(desc, [0x09, 0x21, 0x11, 0x01, 0x00, 0x01, 0x22, 27, 0x00]);
    }

    #[test]
    fn test_lengths_are_self_describing() {
        for desc in [&cdc_header()[..], &cdc_call_management(1)[..], &cdc_acm()[..], &cdc_union(0, 1)[..]] {
            assert_eq!(desc[0] as usize, desc.len());
        }
        let acm = cdc_acm();
        let (kind, body) = split(&acm);
        assert_eq!(kind, CS_INTERFACE);
        assert_eq!(body, &[CDC_TYPE_ACM, ACM_CAPABILITIES]);
    }
}
