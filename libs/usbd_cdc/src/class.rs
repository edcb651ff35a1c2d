use usb_device::class_prelude::*;
use usb_device::{
    control::{Recipient, Request},
    Result as UsbResult,
};

use crate::{
    consts::*,
    descriptor::{
        cdc_acm,
        cdc_call_management,
        cdc_header,
        cdc_union,
        hid_descriptor,
        split,
        CUSTOM_HID_REPORT_DESCRIPTOR,
    },
    logging::*,
    CdcConfig,
    CdcHandle,
    CdcInterface,
    ControlAction,
    Error,
    InterfaceLayout,
    Result,
    TransferState,
    EP_ATTR_BULK,
    EP_ATTR_INTERRUPT,
};

/// Which part of the composite a control request is addressed to
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
enum Target {
    Cdc,
    Hid,
}

/// # Composite CDC-ACM and custom HID class
///
/// Occupies three interfaces (CDC communication, CDC data, custom HID) and five endpoints
/// at fixed addresses: [`CDC_IN_EP`], [`CDC_OUT_EP`], [`CDC_CMD_EP`],
/// [`CUSTOM_HID_EPIN_ADDR`] and [`CUSTOM_HID_EPOUT_ADDR`].
///
/// ## Data flow
/// 1. Transmit: stage data with [`set_tx_buffer`](CdcClass::set_tx_buffer), then
///    [`transmit_packet`](CdcClass::transmit_packet). The transfer is split in packets and
///    terminated with a ZLP when needed; the interface's `transmit_complete` fires at the end.
/// 1. Receive: the OUT endpoint is armed after init. Each packet is placed at the window
///    chosen with [`set_rx_buffer`](CdcClass::set_rx_buffer) and handed to the interface's
///    `receive`. Depending on [`CdcConfig::rearm_on_receive`] the endpoint is armed again
///    right away, or when the application calls [`receive_packet`](CdcClass::receive_packet).
/// 1. HID: OUT reports go to `out_report`, IN reports are sent with
///    [`send_report`](CdcClass::send_report).
pub struct CdcClass<'a, B: UsbBus, I: CdcInterface> {
    comm_if: InterfaceNumber,
    data_if: InterfaceNumber,
    hid_if: InterfaceNumber,
    comm_ep: EndpointIn<'a, B>,
    write_ep: EndpointIn<'a, B>,
    read_ep: EndpointOut<'a, B>,
    hid_in_ep: EndpointIn<'a, B>,
    hid_out_ep: EndpointOut<'a, B>,
    config: CdcConfig,
    handle: CdcHandle,
    itf: Option<I>,
    initialized: bool,
}

impl<'a, B: UsbBus, I: CdcInterface> CdcClass<'a, B, I> {
    pub fn new(alloc: &'a UsbBusAllocator<B>, config: CdcConfig) -> Result<CdcClass<'a, B, I>> {
        let max_packet_size = config.max_packet_size();
        Ok(CdcClass {
            comm_if: alloc.interface(),
            data_if: alloc.interface(),
            hid_if: alloc.interface(),
            comm_ep: alloc.alloc(
                Some(CDC_CMD_EP.into()),
                EndpointType::Interrupt,
                CDC_CMD_PACKET_SIZE,
                config.cmd_interval(),
            )?,
            write_ep: alloc.alloc(Some(CDC_IN_EP.into()), EndpointType::Bulk, max_packet_size, 0)?,
            read_ep: alloc.alloc(Some(CDC_OUT_EP.into()), EndpointType::Bulk, max_packet_size, 0)?,
            hid_in_ep: alloc.alloc(
                Some(CUSTOM_HID_EPIN_ADDR.into()),
                EndpointType::Interrupt,
                CUSTOM_HID_EPIN_SIZE,
                CUSTOM_HID_FS_BINTERVAL,
            )?,
            hid_out_ep: alloc.alloc(
                Some(CUSTOM_HID_EPOUT_ADDR.into()),
                EndpointType::Interrupt,
                CUSTOM_HID_EPOUT_SIZE,
                CUSTOM_HID_FS_BINTERVAL,
            )?,
            config,
            handle: CdcHandle::new(),
            itf: None,
            initialized: false,
        })
    }

    /// Same as `new`, with the interface registered right away
    pub fn with_interface(alloc: &'a UsbBusAllocator<B>, config: CdcConfig, itf: I) -> Result<CdcClass<'a, B, I>> {
        let mut class = CdcClass::new(alloc, config)?;
        class.register_interface(itf);
        Ok(class)
    }

    /// Attach the application callbacks. Returns the interface that was registered before, if any.
    pub fn register_interface(&mut self, itf: I) -> Option<I> {
        trace_cdc_control!("CDC_CONTROL> interface registered");
        self.itf.replace(itf)
    }

    /// Detach the application callbacks, deinitializing the class first
    pub fn unregister_interface(&mut self) -> Option<I> {
        if let Err(e) = self.deinit() {
            log::warn!("deinit while unregistering failed: {:?}", e);
        }
        self.itf.take()
    }

    pub fn is_registered(&self) -> bool { self.itf.is_some() }

    pub fn is_initialized(&self) -> bool { self.initialized }

    pub fn interface(&self) -> Option<&I> { self.itf.as_ref() }

    pub fn interface_mut(&mut self) -> Option<&mut I> { self.itf.as_mut() }

    pub fn handle(&self) -> &CdcHandle { &self.handle }

    pub fn config(&self) -> &CdcConfig { &self.config }

    pub fn max_packet_size(&self) -> u16 {
        // The size is the same for both data endpoints.
        self.read_ep.max_packet_size()
    }

    /// Bring the function up: fresh handle state, interface `init`, OUT endpoint armed.
    pub fn init(&mut self) -> Result<()> {
        let itf = self.itf.as_mut().ok_or(Error::NotRegistered)?;
        self.initialized = false;
        self.handle.reset();
        itf.init()?;
        self.initialized = true;
        self.handle.prepare_receive();
        trace_cdc_states!("STATE> class initialized");
        Ok(())
    }

    /// Tear the function down. Does nothing if it was not initialized.
    pub fn deinit(&mut self) -> Result<()> {
        if !self.initialized {
            return Ok(());
        }
        self.initialized = false;
        self.handle.reset();
        trace_cdc_states!("STATE> class deinitialized");
        match self.itf.as_mut() {
            Some(itf) => Ok(itf.deinit()?),
            None => Ok(()),
        }
    }

    fn ensure_initialized(&self) -> Result<()> {
        match (self.itf.is_some(), self.initialized) {
            (false, _) => Err(Error::NotRegistered),
            (true, false) => Err(Error::NotInitialized),
            (true, true) => Ok(()),
        }
    }

    /// Stage data for the next `transmit_packet`
    pub fn set_tx_buffer(&mut self, data: &[u8]) -> Result<usize> { self.handle.set_tx_buffer(data) }

    /// Choose where in the receive store the next OUT packet lands
    pub fn set_rx_buffer(&mut self, offset: usize) -> Result<()> {
        let max_packet_size = self.max_packet_size() as usize;
        self.handle.set_rx_buffer(offset, max_packet_size)
    }

    /// Arm the data OUT endpoint for one packet. A packet the host already sent is picked up
    /// right away.
    pub fn receive_packet(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.handle.prepare_receive();
        self.cdc_data_out();
        Ok(())
    }

    /// Start sending what was staged with `set_tx_buffer`. `Error::Busy` while a previous
    /// transfer is still going.
    pub fn transmit_packet(&mut self) -> Result<()> {
        self.ensure_initialized()?;
        self.handle.start_transmit()?;
        self.flush()
    }

    /// Hand the next packet of the current transfer to the IN endpoint, if it can take one
    fn flush(&mut self) -> Result<()> {
        let max_packet_size = self.max_packet_size() as usize;
        if let Some(chunk) = self.handle.pending_tx_chunk(max_packet_size) {
            match self.write_ep.write(chunk) {
                Ok(written) => self.handle.tx_written(written),
                // retried from poll
                Err(UsbError::WouldBlock) => trace_cdc_bytes!("BYTES> IN endpoint busy"),
                Err(e) => {
                    self.handle.abort_transmit();
                    return Err(e.into());
                }
            }
        }
        Ok(())
    }

    /// Send one IN report on the custom HID interface
    pub fn send_report(&mut self, report: &[u8]) -> Result<usize> {
        self.ensure_initialized()?;
        self.handle.hid_begin_send()?;
        match self.hid_in_ep.write(report) {
            Ok(written) => {
                trace_hid!("HID> IN report {:02x?}", report);
                Ok(written)
            }
            Err(e) => {
                self.handle.hid_data_in();
                Err(e.into())
            }
        }
    }

    /// Endpoints and interfaces occupied by the CDC function
    pub fn layout(&self) -> InterfaceLayout {
        InterfaceLayout {
            ep_addr: [self.write_ep.address().into(), self.read_ep.address().into(), self.comm_ep.address().into()],
            ep_attr: [EP_ATTR_BULK, EP_ATTR_BULK, EP_ATTR_INTERRUPT],
            endpoint_size: self.max_packet_size(),
            class_type: [USB_CLASS_CDC_DATA, USB_CLASS_CDC_DATA, USB_CLASS_CDC],
            interface_numbers: [self.comm_if.into(), self.data_if.into(), self.hid_if.into()],
            interface_size: USBD_MAX_NUM_INTERFACES as u8,
        }
    }

    fn target(&self, req: &Request) -> Option<Target> {
        if req.recipient != Recipient::Interface {
            return None;
        }
        let interface = (req.index & 0xFF) as u8;
        if interface == u8::from(self.comm_if) || interface == u8::from(self.data_if) {
            Some(Target::Cdc)
        } else if interface == u8::from(self.hid_if) {
            Some(Target::Hid)
        } else {
            None
        }
    }

    fn cdc_data_out(&mut self) {
        let max_packet_size = self.max_packet_size() as usize;
        let slot = match self.handle.rx_slot(max_packet_size) {
            Some(slot) => slot,
            None => {
                trace_cdc_bytes!("BYTES> OUT packet pending, receiver not armed");
                return;
            }
        };
        let len = match self.read_ep.read(slot) {
            Ok(len) => len,
            Err(UsbError::WouldBlock) => return,
            Err(e) => {
                log::error!("CDC OUT read failed: {:?}", e);
                return;
            }
        };
        let data = self.handle.data_out(len);
        if let Some(itf) = self.itf.as_mut() {
            if let Err(e) = itf.receive(data) {
                log::warn!("Interface refused {} received bytes: {:?}", len, e);
            }
        }
        if self.config.rearm_on_receive {
            self.handle.prepare_receive();
        }
    }

    fn hid_data_out(&mut self) {
        let len = match self.hid_out_ep.read(self.handle.hid_rx_slot()) {
            Ok(len) => len,
            Err(UsbError::WouldBlock) => return,
            Err(e) => {
                log::error!("HID OUT read failed: {:?}", e);
                return;
            }
        };
        let report = self.handle.hid_data_out(len);
        if let Some(itf) = self.itf.as_mut() {
            if let Err(e) = itf.out_report(report) {
                log::warn!("Interface refused OUT report: {:?}", e);
            }
        }
    }
}

fn write_class_descriptor(writer: &mut DescriptorWriter, descriptor: &[u8]) -> UsbResult<()> {
    let (descriptor_type, body) = split(descriptor);
    writer.write(descriptor_type, body)
}

impl<B: UsbBus, I: CdcInterface> UsbClass<B> for CdcClass<'_, B, I> {
    fn get_configuration_descriptors(&self, writer: &mut DescriptorWriter) -> UsbResult<()> {
        let comm_if = u8::from(self.comm_if);
        let data_if = u8::from(self.data_if);

        writer.iad(self.comm_if, 2, USB_CLASS_CDC, CDC_SUBCLASS_ACM, CDC_PROTOCOL_AT)?;

        writer.interface(self.comm_if, USB_CLASS_CDC, CDC_SUBCLASS_ACM, CDC_PROTOCOL_AT)?;
        write_class_descriptor(writer, &cdc_header())?;
        write_class_descriptor(writer, &cdc_call_management(data_if))?;
        write_class_descriptor(writer, &cdc_acm())?;
        write_class_descriptor(writer, &cdc_union(comm_if, data_if))?;
        writer.endpoint(&self.comm_ep)?;

        writer.interface(self.data_if, USB_CLASS_CDC_DATA, 0x00, 0x00)?;
        writer.endpoint(&self.read_ep)?;
        writer.endpoint(&self.write_ep)?;

        let report_len = self
            .itf
            .as_ref()
            .map_or(CUSTOM_HID_REPORT_DESCRIPTOR.len(), |itf| itf.report_descriptor().len());
        writer.interface(self.hid_if, USB_CLASS_HID, 0x00, 0x00)?;
        write_class_descriptor(writer, &hid_descriptor(report_len as u16))?;
        writer.endpoint(&self.hid_in_ep)?;
        writer.endpoint(&self.hid_out_ep)
    }

    fn reset(&mut self) {
        trace_cdc_control!("CDC_CONTROL> reset");
        if let Err(e) = self.deinit() {
            log::warn!("deinit on reset failed: {:?}", e);
        }
        if self.itf.is_none() {
            log::warn!("bus reset with no CDC interface registered");
            return;
        }
        if let Err(e) = self.init() {
            log::error!("CDC init failed: {:?}", e);
        }
    }

    fn poll(&mut self) {
        if let Err(e) = self.flush() {
            log::error!("CDC IN write failed: {:?}", e);
        }
        if self.initialized && self.handle.rx_state() == TransferState::Busy {
            self.cdc_data_out();
        }
    }

    fn control_in(&mut self, xfer: ControlIn<B>) {
        let req = *xfer.request();
        let target = match self.target(&req) {
            Some(target) => target,
            None => return,
        };
        let itf = match self.itf.as_mut() {
            Some(itf) => itf,
            None => {
                trace_cdc_control!("CDC_CONTROL> No interface for control-IN: {:?}", req);
                return;
            }
        };
        let action = match target {
            Target::Cdc => self.handle.setup(itf, &req),
            Target::Hid => self.handle.hid_setup(itf, &req),
        };

        let res = match action {
            ControlAction::Reply(len) => xfer.accept_with(&self.handle.control_data()[..len]),
            ControlAction::Ignore => Ok(()),
            ControlAction::Reject | ControlAction::Accept | ControlAction::AwaitData => xfer.reject(),
        };
        if let Err(e) = res {
            log::error!("Error from ControlIn: {:?}", e);
        }
    }

    fn control_out(&mut self, xfer: ControlOut<B>) {
        let req = *xfer.request();
        let target = match self.target(&req) {
            Some(target) => target,
            None => return,
        };
        let itf = match self.itf.as_mut() {
            Some(itf) => itf,
            None => {
                trace_cdc_control!("CDC_CONTROL> No interface for control-OUT: {:?}", req);
                return;
            }
        };
        let action = match target {
            Target::Cdc => match self.handle.setup(itf, &req) {
                ControlAction::AwaitData => self.handle.ep0_rx_ready(itf, xfer.data()),
                action => action,
            },
            Target::Hid => match self.handle.hid_setup(itf, &req) {
                ControlAction::AwaitData => self.handle.hid_ep0_rx_ready(itf, xfer.data()),
                action => action,
            },
        };

        let res = match action {
            ControlAction::Accept => xfer.accept(),
            ControlAction::Ignore => Ok(()),
            ControlAction::Reject | ControlAction::Reply(_) | ControlAction::AwaitData => xfer.reject(),
        };
        if let Err(e) = res {
            log::error!("Error from ControlOut: {:?}", e);
        }
    }

    fn endpoint_out(&mut self, addr: EndpointAddress) {
        if addr == self.read_ep.address() {
            self.cdc_data_out();
        } else if addr == self.hid_out_ep.address() {
            self.hid_data_out();
        }
    }

    fn endpoint_in_complete(&mut self, addr: EndpointAddress) {
        if addr == self.write_ep.address() {
            let max_packet_size = self.max_packet_size() as usize;
            if self.handle.data_in(max_packet_size) {
                trace_cdc_states!("STATE> transmit complete, {} bytes", self.handle.tx_length());
                if let Some(itf) = self.itf.as_mut() {
                    itf.transmit_complete(self.handle.tx_data());
                }
            } else if let Err(e) = self.flush() {
                log::error!("CDC IN write failed: {:?}", e);
            }
        } else if addr == self.hid_in_ep.address() {
            self.handle.hid_data_in();
        }
    }
}
