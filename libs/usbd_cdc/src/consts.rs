//! Endpoint addresses, packet sizes and request codes of the composite function.

/// EP1 for data IN
pub const CDC_IN_EP: u8 = 0x81;
/// EP1 for data OUT
pub const CDC_OUT_EP: u8 = 0x01;
/// EP2 for CDC commands
pub const CDC_CMD_EP: u8 = 0x82;

pub const CUSTOM_HID_EPIN_ADDR: u8 = 0x83;
pub const CUSTOM_HID_EPIN_SIZE: u16 = 0x02;

pub const CUSTOM_HID_EPOUT_ADDR: u8 = 0x02;
pub const CUSTOM_HID_EPOUT_SIZE: u16 = 0x02;

/// Polling interval of the command endpoint, in microframes when running at high speed
pub const CDC_HS_BINTERVAL: u8 = 0x10;
/// Polling interval of the command endpoint, in frames when running at full speed
pub const CDC_FS_BINTERVAL: u8 = 0x10;
pub const CUSTOM_HID_FS_BINTERVAL: u8 = 0x05;

// Endpoint IN & OUT packet sizes. These can be tuned to the needed baudrates and
// performance, as long as they stay within what the bus speed allows for bulk endpoints.
pub const CDC_DATA_HS_MAX_PACKET_SIZE: u16 = 512;
pub const CDC_DATA_FS_MAX_PACKET_SIZE: u16 = 64;
/// Command endpoint packet size
pub const CDC_CMD_PACKET_SIZE: u16 = 8;

pub const CDC_DATA_HS_IN_PACKET_SIZE: u16 = CDC_DATA_HS_MAX_PACKET_SIZE;
pub const CDC_DATA_HS_OUT_PACKET_SIZE: u16 = CDC_DATA_HS_MAX_PACKET_SIZE;

pub const CDC_DATA_FS_IN_PACKET_SIZE: u16 = CDC_DATA_FS_MAX_PACKET_SIZE;
pub const CDC_DATA_FS_OUT_PACKET_SIZE: u16 = CDC_DATA_FS_MAX_PACKET_SIZE;

/// Total length of the configuration descriptor, configuration header included
pub const USB_CDC_CONFIG_DESC_SIZ: usize = 107;

pub const CDC_SEND_ENCAPSULATED_COMMAND: u8 = 0x00;
pub const CDC_GET_ENCAPSULATED_RESPONSE: u8 = 0x01;
pub const CDC_SET_COMM_FEATURE: u8 = 0x02;
pub const CDC_GET_COMM_FEATURE: u8 = 0x03;
pub const CDC_CLEAR_COMM_FEATURE: u8 = 0x04;
pub const CDC_SET_LINE_CODING: u8 = 0x20;
pub const CDC_GET_LINE_CODING: u8 = 0x21;
pub const CDC_SET_CONTROL_LINE_STATE: u8 = 0x22;
pub const CDC_SEND_BREAK: u8 = 0x23;

pub const CUSTOM_HID_DESCRIPTOR_TYPE: u8 = 0x21;
pub const CUSTOM_HID_REPORT_DESC: u8 = 0x22;
pub const USB_CUSTOM_HID_DESC_SIZ: usize = 9;

pub const INTERFACE_MAX_EP_NUM: usize = 3;
/// CDC communication, CDC data and custom HID
pub const USBD_MAX_NUM_INTERFACES: usize = 3;

pub const CUSTOM_HID_REQ_SET_PROTOCOL: u8 = 0x0B;
pub const CUSTOM_HID_REQ_GET_PROTOCOL: u8 = 0x03;

pub const CUSTOM_HID_REQ_SET_IDLE: u8 = 0x0A;
pub const CUSTOM_HID_REQ_GET_IDLE: u8 = 0x02;

pub const CUSTOM_HID_REQ_SET_REPORT: u8 = 0x09;
pub const CUSTOM_HID_REQ_GET_REPORT: u8 = 0x01;

pub const CUSTOM_HID_OUTREPORT_BUF_SIZE: usize = 64;

/// Longest data stage of a CDC class request handled through the control scratch buffer.
/// A line coding structure is the largest payload the ACM requests carry.
pub const CDC_REQ_MAX_DATA_SIZE: usize = 7;

/// Capacity of the staging buffer behind `set_tx_buffer`
pub const CDC_TX_BUFFER_BYTES: usize = 2048;
/// Capacity of the receive store that `set_rx_buffer` indexes into
pub const CDC_RX_BUFFER_BYTES: usize = 2048;

pub const USB_CLASS_CDC: u8 = 0x02;
pub const USB_CLASS_CDC_DATA: u8 = 0x0A;
pub const USB_CLASS_HID: u8 = 0x03;
/// This should be used as `device_class` when building `UsbDevice`, with `device_sub_class`
/// 0x02 and `device_protocol` 0x01, because the function carries an interface association.
/// The association descriptor itself is only emitted when the device is built with
/// `UsbDeviceBuilder::composite_with_iads()`.
pub const USB_CLASS_MISC: u8 = 0xEF;
pub const CDC_SUBCLASS_ACM: u8 = 0x02;
/// AT commands: V.250 etc
pub const CDC_PROTOCOL_AT: u8 = 0x01;
