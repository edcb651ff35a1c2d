use crate::{
    consts::*,
    descriptor::CUSTOM_HID_REPORT_DESCRIPTOR,
    CdcRequest,
    ControlLineState,
    InterfaceError,
    InterfaceResult,
    LineCoding,
};

/// # Application side of the class
///
/// The class calls these hooks from `UsbDevice::poll`, so they should not block.
/// Every hook but [`receive`](CdcInterface::receive) has a default. The default
/// [`control`](CdcInterface::control) decodes the ACM requests into the typed hooks, so most
/// applications only override those.
pub trait CdcInterface {
    /// The host configured the device and the class is ready to move data
    fn init(&mut self) -> InterfaceResult { Ok(()) }

    /// The host reset or deconfigured the device
    fn deinit(&mut self) -> InterfaceResult { Ok(()) }

    /// A CDC class request arrived on the communication interface.
    ///
    /// `data` holds the data stage of host-to-device requests, and is the reply buffer for
    /// device-to-host requests (it is already truncated to what the host asked for).
    /// `value` is the request's `wValue`.
    fn control(&mut self, request: CdcRequest, value: u16, data: &mut [u8]) -> InterfaceResult {
        match request {
            CdcRequest::SetLineCoding => {
                let coding = LineCoding::parse(data).map_err(|_| InterfaceError::Failed)?;
                self.set_line_coding(coding)
            }
            CdcRequest::GetLineCoding => {
                if let Some(coding) = self.line_coding() {
                    let bytes = coding.to_bytes();
                    let len = data.len().min(bytes.len());
                    data[..len].copy_from_slice(&bytes[..len]);
                }
                Ok(())
            }
            CdcRequest::SetControlLineState => self.set_control_line_state(ControlLineState::from(value)),
            CdcRequest::SendBreak => self.send_break(value),
            _ => Ok(()),
        }
    }

    /// A packet arrived on the data OUT endpoint. `data` is the received packet, located at
    /// the window chosen with `set_rx_buffer`.
    fn receive(&mut self, data: &mut [u8]) -> InterfaceResult;

    /// Everything staged with `set_tx_buffer` has been acknowledged by the host
    fn transmit_complete(&mut self, _data: &[u8]) {}

    fn set_line_coding(&mut self, _coding: LineCoding) -> InterfaceResult { Ok(()) }

    /// Coding reported by GET_LINE_CODING. `None` leaves the reply to the class, which answers
    /// with the last coding accepted through SET_LINE_CODING.
    fn line_coding(&self) -> Option<LineCoding> { None }

    fn set_control_line_state(&mut self, _state: ControlLineState) -> InterfaceResult { Ok(()) }

    /// `duration_ms` of 0xFFFF means "until further notice", 0 ends a break
    fn send_break(&mut self, _duration_ms: u16) -> InterfaceResult { Ok(()) }

    /// Report descriptor served for the custom HID interface
    fn report_descriptor(&self) -> &[u8] { &CUSTOM_HID_REPORT_DESCRIPTOR }

    /// An OUT report arrived, either on the HID OUT endpoint or through SET_REPORT
    fn out_report(&mut self, _report: &[u8]) -> InterfaceResult { Ok(()) }
}

/// USB endpoint transfer type, as encoded in `bmAttributes`
pub const EP_ATTR_BULK: u8 = 0x02;
pub const EP_ATTR_INTERRUPT: u8 = 0x03;

/// Endpoints and interfaces that the CDC function occupies, in the order
/// data IN, data OUT, command IN.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct InterfaceLayout {
    pub ep_addr: [u8; INTERFACE_MAX_EP_NUM],
    pub ep_attr: [u8; INTERFACE_MAX_EP_NUM],
    /// Max packet size of the data endpoints
    pub endpoint_size: u16,
    /// Class code of the interface each endpoint belongs to
    pub class_type: [u8; INTERFACE_MAX_EP_NUM],
    pub interface_numbers: [u8; USBD_MAX_NUM_INTERFACES],
    /// How many entries of `interface_numbers` are used
    pub interface_size: u8,
}
