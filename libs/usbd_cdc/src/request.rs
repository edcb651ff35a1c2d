//! Class-specific request codes
use bitfield::bitfield;
use num_derive::{FromPrimitive, ToPrimitive};
use num_traits::{FromPrimitive, ToPrimitive};

use crate::consts::*;

/// CDC class requests understood by the ACM function
///
/// Section 6.2 [USB CDC 1.2](https://www.usb.org/document-library/class-definitions-communication-devices-12)
#[derive(Clone, Copy, Eq, PartialEq, Debug, FromPrimitive, ToPrimitive)]
pub enum CdcRequest {
    SendEncapsulatedCommand = CDC_SEND_ENCAPSULATED_COMMAND as isize,
    GetEncapsulatedResponse = CDC_GET_ENCAPSULATED_RESPONSE as isize,
    SetCommFeature = CDC_SET_COMM_FEATURE as isize,
    GetCommFeature = CDC_GET_COMM_FEATURE as isize,
    ClearCommFeature = CDC_CLEAR_COMM_FEATURE as isize,
    SetLineCoding = CDC_SET_LINE_CODING as isize,
    GetLineCoding = CDC_GET_LINE_CODING as isize,
    SetControlLineState = CDC_SET_CONTROL_LINE_STATE as isize,
    SendBreak = CDC_SEND_BREAK as isize,
}

impl CdcRequest {
    pub fn from_code(code: u8) -> Option<CdcRequest> { CdcRequest::from_u8(code) }

    pub fn code(self) -> u8 { self.to_u8().unwrap_or_default() }
}

/// HID class requests handled on the custom HID interface
///
/// Section 7.2 [Device Class Definition for HID 1.11](https://www.usb.org/document-library/device-class-definition-hid-111)
#[derive(Clone, Copy, Eq, PartialEq, Debug, FromPrimitive, ToPrimitive)]
pub enum HidRequest {
    GetReport = CUSTOM_HID_REQ_GET_REPORT as isize,
    GetIdle = CUSTOM_HID_REQ_GET_IDLE as isize,
    GetProtocol = CUSTOM_HID_REQ_GET_PROTOCOL as isize,
    SetReport = CUSTOM_HID_REQ_SET_REPORT as isize,
    SetIdle = CUSTOM_HID_REQ_SET_IDLE as isize,
    SetProtocol = CUSTOM_HID_REQ_SET_PROTOCOL as isize,
}

impl HidRequest {
    pub fn from_code(code: u8) -> Option<HidRequest> { HidRequest::from_u8(code) }
}

bitfield! {
    /// `wValue` of SET_CONTROL_LINE_STATE
    #[derive(Clone, Copy, Eq, PartialEq, Default)]
    pub struct ControlLineState(u16);
    impl Debug;
    /// Data terminal ready: the host has the port open
    pub dtr, set_dtr: 0;
    /// Request to send: carrier control for half duplex modems
    pub rts, set_rts: 1;
}

impl From<u16> for ControlLineState {
    fn from(value: u16) -> Self { ControlLineState(value) }
}
