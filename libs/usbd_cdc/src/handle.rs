use core::ops::{Deref, DerefMut};

use usb_device::{
    control::{Request, RequestType},
    UsbDirection,
};

use crate::{
    consts::*,
    descriptor::hid_descriptor,
    logging::*,
    CdcInterface,
    CdcRequest,
    Error,
    HidRequest,
    InterfaceResult,
    LineCoding,
    Result,
};

/// Largest data stage accepted for a host-to-device class request
pub const USB_MAX_EP0_SIZE: usize = 64;

/// `cmd_op_code` value while no class request waits for its data stage
const NO_PENDING_COMMAND: u8 = 0xFF;

/// Byte buffer with the 32 bit alignment DMA capable peripherals expect
#[repr(C, align(4))]
pub struct AlignedBuffer<const N: usize>(pub [u8; N]);

impl<const N: usize> Deref for AlignedBuffer<N> {
    type Target = [u8];

    fn deref(&self) -> &[u8] { &self.0 }
}

impl<const N: usize> DerefMut for AlignedBuffer<N> {
    fn deref_mut(&mut self) -> &mut [u8] { &mut self.0 }
}

#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum TransferState {
    Idle,
    Busy,
}

/// What the class has to do with the control transfer that was just decoded
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum ControlAction {
    /// Complete the status stage of a host-to-device request
    Accept,
    /// Answer a device-to-host request with the first `n` bytes of [`CdcHandle::control_data`]
    Reply(usize),
    /// Receive the data stage, then hand it to `ep0_rx_ready` / `hid_ep0_rx_ready`
    AwaitData,
    /// Stall the request
    Reject,
    /// Not for this function; leave it to the device or another class
    Ignore,
}

impl ControlAction {
    fn from_result(res: InterfaceResult) -> ControlAction {
        match res {
            Ok(()) => ControlAction::Accept,
            Err(e) => {
                log::warn!("Interface refused control request: {:?}", e);
                ControlAction::Reject
            }
        }
    }
}

/// # Per-instance state of the composite function
///
/// Holds the control scratch buffer, the data buffers and the transfer states of the CDC
/// endpoints, and the report buffer and protocol state of the custom HID interface.
///
/// The handle never touches endpoints itself: [`CdcClass`](crate::CdcClass) reads and writes
/// packets and reports the outcome through `data_out`, `tx_written`, `data_in` and friends.
pub struct CdcHandle {
    data: AlignedBuffer<{ CDC_DATA_HS_MAX_PACKET_SIZE as usize }>,
    cmd_op_code: u8,
    cmd_length: u8,
    cmd_value: u16,
    /// Last line coding the host set and the interface accepted
    line_coding: LineCoding,

    rx_buffer: AlignedBuffer<CDC_RX_BUFFER_BYTES>,
    /// Where in `rx_buffer` the next OUT packet lands
    rx_offset: usize,
    rx_length: usize,
    rx_state: TransferState,

    tx_buffer: AlignedBuffer<CDC_TX_BUFFER_BYTES>,
    tx_length: usize,
    /// Bytes acknowledged by the host so far
    tx_sent: usize,
    /// Length of the packet handed to the endpoint and not acknowledged yet
    tx_in_flight: Option<usize>,
    tx_zlp_sent: bool,
    tx_state: TransferState,

    report_buf: [u8; CUSTOM_HID_OUTREPORT_BUF_SIZE],
    report_length: usize,
    protocol: u8,
    idle_state: u8,
    alt_setting: u8,
    is_report_available: bool,
    hid_state: TransferState,
}

impl Default for CdcHandle {
    fn default() -> Self { Self::new() }
}

impl CdcHandle {
    pub const fn new() -> CdcHandle {
        CdcHandle {
            data: AlignedBuffer([0; CDC_DATA_HS_MAX_PACKET_SIZE as usize]),
            cmd_op_code: NO_PENDING_COMMAND,
            cmd_length: 0,
            cmd_value: 0,
            line_coding: LineCoding::DEFAULT,
            rx_buffer: AlignedBuffer([0; CDC_RX_BUFFER_BYTES]),
            rx_offset: 0,
            rx_length: 0,
            rx_state: TransferState::Idle,
            tx_buffer: AlignedBuffer([0; CDC_TX_BUFFER_BYTES]),
            tx_length: 0,
            tx_sent: 0,
            tx_in_flight: None,
            tx_zlp_sent: false,
            tx_state: TransferState::Idle,
            report_buf: [0; CUSTOM_HID_OUTREPORT_BUF_SIZE],
            report_length: 0,
            protocol: 0,
            idle_state: 0,
            alt_setting: 0,
            is_report_available: false,
            hid_state: TransferState::Idle,
        }
    }

    /// Back to the state of a freshly created handle. Buffer contents are left as they are.
    pub fn reset(&mut self) {
        trace_cdc_states!("STATE> handle reset");
        self.cmd_op_code = NO_PENDING_COMMAND;
        self.cmd_length = 0;
        self.cmd_value = 0;
        self.line_coding = LineCoding::default();
        self.rx_offset = 0;
        self.rx_length = 0;
        self.rx_state = TransferState::Idle;
        self.tx_length = 0;
        self.tx_sent = 0;
        self.tx_in_flight = None;
        self.tx_zlp_sent = false;
        self.tx_state = TransferState::Idle;
        self.report_length = 0;
        self.protocol = 0;
        self.idle_state = 0;
        self.alt_setting = 0;
        self.is_report_available = false;
        self.hid_state = TransferState::Idle;
    }

    pub fn tx_state(&self) -> TransferState { self.tx_state }

    pub fn rx_state(&self) -> TransferState { self.rx_state }

    pub fn tx_length(&self) -> usize { self.tx_length }

    pub fn rx_length(&self) -> usize { self.rx_length }

    pub fn rx_offset(&self) -> usize { self.rx_offset }

    pub fn line_coding(&self) -> LineCoding { self.line_coding }

    /// The class request waiting for its data stage, if any
    pub fn pending_command(&self) -> Option<(u8, u8)> {
        match self.cmd_op_code {
            NO_PENDING_COMMAND => None,
            op => Some((op, self.cmd_length)),
        }
    }

    /// The control scratch buffer. `ControlAction::Reply(n)` refers to its first `n` bytes.
    pub fn control_data(&self) -> &[u8] { &self.data }

    /// The whole receive store, for applications that accumulate packets by moving the
    /// window with `set_rx_buffer`
    pub fn rx_store(&self) -> &[u8] { &self.rx_buffer }

    /// The packet received last
    pub fn rx_data(&self) -> &[u8] { &self.rx_buffer[self.rx_offset..self.rx_offset + self.rx_length] }

    /// The data staged for transmission
    pub fn tx_data(&self) -> &[u8] { &self.tx_buffer[..self.tx_length] }

    pub fn protocol(&self) -> u8 { self.protocol }

    pub fn idle_state(&self) -> u8 { self.idle_state }

    pub fn alt_setting(&self) -> u8 { self.alt_setting }

    pub fn is_report_available(&self) -> bool { self.is_report_available }

    pub fn hid_state(&self) -> TransferState { self.hid_state }

    /// The OUT report received last
    pub fn report(&self) -> &[u8] { &self.report_buf[..self.report_length] }

    fn reply(&self, len: usize, requested: u16) -> ControlAction {
        ControlAction::Reply(len.min(requested as usize))
    }

    /// Decodes a SETUP packet addressed to the CDC communication or data interface.
    pub fn setup<I: CdcInterface>(&mut self, itf: &mut I, req: &Request) -> ControlAction {
        match (req.request_type, req.direction) {
            (RequestType::Class, UsbDirection::Out) => {
                let request = match CdcRequest::from_code(req.request) {
                    Some(r) => r,
                    None => {
                        trace_cdc_control!("CDC_CONTROL> Unknown class request: {:?}", req);
                        return ControlAction::Reject;
                    }
                };
                if req.length > 0 {
                    self.cmd_op_code = req.request;
                    self.cmd_length = (req.length as usize).min(USB_MAX_EP0_SIZE) as u8;
                    self.cmd_value = req.value;
                    trace_cdc_control!(
                        "CDC_CONTROL> {:?} waiting for {} bytes of data",
                        request,
                        self.cmd_length
                    );
                    ControlAction::AwaitData
                } else {
                    trace_cdc_control!("CDC_CONTROL> {:?} value {:#06x}", request, req.value);
                    ControlAction::from_result(itf.control(request, req.value, &mut []))
                }
            }
            (RequestType::Class, UsbDirection::In) => {
                let request = match CdcRequest::from_code(req.request) {
                    Some(r) => r,
                    None => {
                        trace_cdc_control!("CDC_CONTROL> Unknown class request: {:?}", req);
                        return ControlAction::Reject;
                    }
                };
                let len = (req.length as usize).min(CDC_REQ_MAX_DATA_SIZE);
                if request == CdcRequest::GetLineCoding {
                    self.data[..len].copy_from_slice(&self.line_coding.to_bytes()[..len]);
                }
                match itf.control(request, req.value, &mut self.data[..len]) {
                    Ok(()) => {
                        trace_cdc_control!("CDC_CONTROL> {:?} replying {:02x?}", request, &self.data[..len]);
                        ControlAction::Reply(len)
                    }
                    Err(e) => {
                        log::warn!("Interface refused {:?}: {:?}", request, e);
                        ControlAction::Reject
                    }
                }
            }
            (RequestType::Standard, UsbDirection::In) => match req.request {
                Request::GET_STATUS => {
                    self.data[..2].copy_from_slice(&[0, 0]);
                    self.reply(2, req.length)
                }
                // the CDC interfaces have no alternate settings
                Request::GET_INTERFACE => {
                    self.data[0] = 0;
                    self.reply(1, req.length)
                }
                _ => ControlAction::Ignore,
            },
            (RequestType::Standard, UsbDirection::Out) => match req.request {
                Request::SET_INTERFACE if req.value == 0 => ControlAction::Accept,
                Request::SET_INTERFACE => ControlAction::Reject,
                Request::CLEAR_FEATURE => ControlAction::Accept,
                _ => ControlAction::Ignore,
            },
            _ => ControlAction::Ignore,
        }
    }

    /// Delivers the data stage of the class request recorded by `setup`.
    pub fn ep0_rx_ready<I: CdcInterface>(&mut self, itf: &mut I, payload: &[u8]) -> ControlAction {
        let request = match CdcRequest::from_code(self.cmd_op_code) {
            Some(r) => r,
            None => return ControlAction::Ignore,
        };
        let len = payload.len().min(self.cmd_length as usize);
        self.data[..len].copy_from_slice(&payload[..len]);
        self.cmd_op_code = NO_PENDING_COMMAND;
        trace_cdc_control!("CDC_CONTROL> {:?} data {:02x?}", request, &self.data[..len]);
        let action = ControlAction::from_result(itf.control(request, self.cmd_value, &mut self.data[..len]));
        if action == ControlAction::Accept && request == CdcRequest::SetLineCoding {
            if let Ok(coding) = LineCoding::parse(&self.data[..len]) {
                self.line_coding = coding;
            }
        }
        action
    }

    /// Stage `data` for the next `transmit_packet`. Returns the staged length.
    pub fn set_tx_buffer(&mut self, data: &[u8]) -> Result<usize> {
        if self.tx_state == TransferState::Busy {
            return Err(Error::Busy);
        }
        if data.len() > self.tx_buffer.len() {
            return Err(Error::BufferOverflow);
        }
        self.tx_buffer[..data.len()].copy_from_slice(data);
        self.tx_length = data.len();
        Ok(self.tx_length)
    }

    pub fn start_transmit(&mut self) -> Result<()> {
        if self.tx_state == TransferState::Busy {
            return Err(Error::Busy);
        }
        trace_cdc_states!("STATE> tx Idle -> Busy, {} bytes", self.tx_length);
        self.tx_state = TransferState::Busy;
        self.tx_sent = 0;
        self.tx_in_flight = None;
        self.tx_zlp_sent = false;
        Ok(())
    }

    fn needs_zlp(&self, max_packet_size: usize) -> bool {
        self.tx_length % max_packet_size == 0 && !self.tx_zlp_sent
    }

    /// The packet to hand to the IN endpoint next, if the transfer has one and the
    /// previous packet has been acknowledged.
    pub fn pending_tx_chunk(&self, max_packet_size: usize) -> Option<&[u8]> {
        if self.tx_state != TransferState::Busy || self.tx_in_flight.is_some() {
            return None;
        }
        let remaining = self.tx_length - self.tx_sent;
        if remaining > 0 {
            let end = self.tx_sent + remaining.min(max_packet_size);
            Some(&self.tx_buffer[self.tx_sent..end])
        } else if self.needs_zlp(max_packet_size) {
            trace_cdc_zlp!("ZLP> required");
            Some(&[])
        } else {
            None
        }
    }

    /// The endpoint accepted a packet of `len` bytes
    pub fn tx_written(&mut self, len: usize) {
        trace_cdc_bytes!("BYTES> wrote {} bytes, {} of {} acknowledged", len, self.tx_sent, self.tx_length);
        self.tx_in_flight = Some(len);
    }

    /// The host acknowledged the packet in flight. Returns `true` when that completed the
    /// transfer, in which case the tx state is back to idle.
    pub fn data_in(&mut self, max_packet_size: usize) -> bool {
        match self.tx_in_flight.take() {
            Some(0) => {
                trace_cdc_zlp!("ZLP> sent");
                self.tx_zlp_sent = true;
            }
            Some(len) => self.tx_sent += len,
            None => return false,
        }
        if self.tx_sent == self.tx_length && !self.needs_zlp(max_packet_size) {
            trace_cdc_states!("STATE> tx Busy -> Idle");
            self.tx_state = TransferState::Idle;
            true
        } else {
            false
        }
    }

    /// Give up on the transfer in flight, e.g. after the endpoint reported an error
    pub fn abort_transmit(&mut self) {
        if self.tx_state == TransferState::Busy {
            log::warn!("tx aborted after {} of {} bytes", self.tx_sent, self.tx_length);
        }
        self.tx_in_flight = None;
        self.tx_state = TransferState::Idle;
    }

    /// Place the next OUT packet at `offset` in the receive store
    pub fn set_rx_buffer(&mut self, offset: usize, max_packet_size: usize) -> Result<()> {
        if self.rx_state == TransferState::Busy {
            return Err(Error::Busy);
        }
        match offset.checked_add(max_packet_size) {
            Some(end) if end <= self.rx_buffer.len() => {
                self.rx_offset = offset;
                Ok(())
            }
            _ => Err(Error::BufferOverflow),
        }
    }

    /// Arm reception of one OUT packet
    pub fn prepare_receive(&mut self) {
        if self.rx_state == TransferState::Idle {
            trace_cdc_states!("STATE> rx Idle -> Busy at offset {}", self.rx_offset);
        }
        self.rx_state = TransferState::Busy;
    }

    /// Where the armed OUT packet should be read to
    pub fn rx_slot(&mut self, max_packet_size: usize) -> Option<&mut [u8]> {
        match self.rx_state {
            TransferState::Busy => Some(&mut self.rx_buffer[self.rx_offset..self.rx_offset + max_packet_size]),
            TransferState::Idle => None,
        }
    }

    /// `len` bytes landed in the slot returned by `rx_slot`
    pub fn data_out(&mut self, len: usize) -> &mut [u8] {
        trace_cdc_bytes!("BYTES> received {} bytes at offset {}", len, self.rx_offset);
        trace_cdc_states!("STATE> rx Busy -> Idle");
        self.rx_length = len;
        self.rx_state = TransferState::Idle;
        &mut self.rx_buffer[self.rx_offset..self.rx_offset + len]
    }

    /// Decodes a SETUP packet addressed to the custom HID interface.
    pub fn hid_setup<I: CdcInterface>(&mut self, itf: &mut I, req: &Request) -> ControlAction {
        match (req.request_type, req.direction) {
            (RequestType::Class, direction) => {
                let request = HidRequest::from_code(req.request);
                trace_hid!("HID> {:?} value {:#06x} length {}", request, req.value, req.length);
                match (direction, request) {
                    (UsbDirection::Out, Some(HidRequest::SetProtocol)) => {
                        self.protocol = (req.value & 0xFF) as u8;
                        ControlAction::Accept
                    }
                    (UsbDirection::In, Some(HidRequest::GetProtocol)) => {
                        self.data[0] = self.protocol;
                        self.reply(1, req.length)
                    }
                    (UsbDirection::Out, Some(HidRequest::SetIdle)) => {
                        self.idle_state = (req.value >> 8) as u8;
                        ControlAction::Accept
                    }
                    (UsbDirection::In, Some(HidRequest::GetIdle)) => {
                        self.data[0] = self.idle_state;
                        self.reply(1, req.length)
                    }
                    (UsbDirection::Out, Some(HidRequest::SetReport)) if req.length > 0 => {
                        self.is_report_available = true;
                        ControlAction::AwaitData
                    }
                    _ => ControlAction::Reject,
                }
            }
            (RequestType::Standard, UsbDirection::In) => match req.request {
                Request::GET_DESCRIPTOR => match (req.value >> 8) as u8 {
                    CUSTOM_HID_REPORT_DESC => {
                        let desc = itf.report_descriptor();
                        if desc.len() > self.data.len() {
                            log::error!(
                                "report descriptor of {} bytes exceeds the {} byte control buffer",
                                desc.len(),
                                self.data.len()
                            );
                            return ControlAction::Reject;
                        }
                        let len = desc.len();
                        self.data[..len].copy_from_slice(desc);
                        trace_hid!("HID> report descriptor, {} bytes", len);
                        self.reply(len, req.length)
                    }
                    CUSTOM_HID_DESCRIPTOR_TYPE => {
                        let desc = hid_descriptor(itf.report_descriptor().len() as u16);
                        self.data[..desc.len()].copy_from_slice(&desc);
                        self.reply(desc.len(), req.length)
                    }
                    _ => ControlAction::Reject,
                },
                Request::GET_STATUS => {
                    self.data[..2].copy_from_slice(&[0, 0]);
                    self.reply(2, req.length)
                }
                Request::GET_INTERFACE => {
                    self.data[0] = self.alt_setting;
                    self.reply(1, req.length)
                }
                _ => ControlAction::Ignore,
            },
            (RequestType::Standard, UsbDirection::Out) => match req.request {
                Request::SET_INTERFACE => {
                    self.alt_setting = req.value as u8;
                    ControlAction::Accept
                }
                Request::CLEAR_FEATURE => ControlAction::Accept,
                _ => ControlAction::Ignore,
            },
            _ => ControlAction::Ignore,
        }
    }

    /// Delivers the data stage of SET_REPORT
    pub fn hid_ep0_rx_ready<I: CdcInterface>(&mut self, itf: &mut I, payload: &[u8]) -> ControlAction {
        if !self.is_report_available {
            return ControlAction::Ignore;
        }
        let len = payload.len().min(self.report_buf.len());
        self.report_buf[..len].copy_from_slice(&payload[..len]);
        self.report_length = len;
        self.is_report_available = false;
        trace_hid!("HID> SET_REPORT {:02x?}", &self.report_buf[..len]);
        ControlAction::from_result(itf.out_report(&self.report_buf[..len]))
    }

    /// Where an OUT report from the HID OUT endpoint should be read to
    pub fn hid_rx_slot(&mut self) -> &mut [u8] { &mut self.report_buf }

    /// `len` bytes landed in the slot returned by `hid_rx_slot`
    pub fn hid_data_out(&mut self, len: usize) -> &[u8] {
        self.report_length = len;
        trace_hid!("HID> OUT report {:02x?}", &self.report_buf[..len]);
        &self.report_buf[..len]
    }

    /// Claim the HID IN endpoint for one report
    pub fn hid_begin_send(&mut self) -> Result<()> {
        if self.hid_state == TransferState::Busy {
            return Err(Error::Busy);
        }
        self.hid_state = TransferState::Busy;
        Ok(())
    }

    /// The report was acknowledged, or could not be written
    pub fn hid_data_in(&mut self) { self.hid_state = TransferState::Idle; }
}
