//! In-memory `UsbBus` for exercising the class glue without a peripheral
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use usb_device::{
    bus::{PollResult, UsbBus},
    endpoint::{EndpointAddress, EndpointType},
    Result as UsbResult,
    UsbDirection,
    UsbError,
};

#[derive(Default)]
pub struct BusState {
    pub allocated: Vec<(u8, EndpointType, u16, u8)>,
    /// Packets the host sent, waiting to be read, by endpoint address
    pub out_packets: HashMap<u8, VecDeque<Vec<u8>>>,
    /// Packets the device wrote, in order
    pub written: Vec<(u8, Vec<u8>)>,
    /// Makes every write fail with `WouldBlock`
    pub block_writes: bool,
    /// SETUP packet waiting on EP0 OUT
    pub setup: Option<Vec<u8>>,
    /// IN endpoints with a written packet not yet reported complete, by endpoint number
    pub in_complete: u16,
    /// Endpoints that were stalled, in order
    pub stalls: Vec<u8>,
}

impl BusState {
    pub fn host_sends(&mut self, addr: u8, packet: &[u8]) {
        self.out_packets.entry(addr).or_default().push_back(packet.to_vec());
    }

    /// Queues a SETUP packet for EP0, followed by its data stage if it has one
    pub fn host_setup(&mut self, setup: [u8; 8], data: &[u8]) {
        self.setup = Some(setup.to_vec());
        if !data.is_empty() {
            self.host_sends(0x00, data);
        }
    }

    pub fn written_to(&self, addr: u8) -> Vec<Vec<u8>> {
        self.written.iter().filter(|(a, _)| *a == addr).map(|(_, p)| p.clone()).collect()
    }
}

pub struct MockBus {
    state: Arc<Mutex<BusState>>,
}

impl MockBus {
    pub fn new() -> (MockBus, Arc<Mutex<BusState>>) {
        let state = Arc::new(Mutex::new(BusState::default()));
        (MockBus { state: state.clone() }, state)
    }
}

impl UsbBus for MockBus {
    fn alloc_ep(
        &mut self,
        ep_dir: UsbDirection,
        ep_addr: Option<EndpointAddress>,
        ep_type: EndpointType,
        max_packet_size: u16,
        interval: u8,
    ) -> UsbResult<EndpointAddress> {
        let mut state = self.state.lock().unwrap();
        let taken = |state: &BusState, addr: EndpointAddress| {
            state.allocated.iter().any(|(a, ..)| *a == u8::from(addr))
        };
        let addr = match ep_addr {
            Some(addr) if taken(&state, addr) => return Err(UsbError::InvalidEndpoint),
            Some(addr) => addr,
            None => (1..16)
                .map(|index| EndpointAddress::from_parts(index, ep_dir))
                .find(|addr| !taken(&state, *addr))
                .ok_or(UsbError::EndpointOverflow)?,
        };
        state.allocated.push((addr.into(), ep_type, max_packet_size, interval));
        Ok(addr)
    }

    fn enable(&mut self) {}

    fn reset(&self) {}

    fn set_device_address(&self, _addr: u8) {}

    fn write(&self, ep_addr: EndpointAddress, buf: &[u8]) -> UsbResult<usize> {
        let mut state = self.state.lock().unwrap();
        if state.block_writes {
            return Err(UsbError::WouldBlock);
        }
        state.written.push((ep_addr.into(), buf.to_vec()));
        state.in_complete |= 1 << ep_addr.index();
        Ok(buf.len())
    }

    fn read(&self, ep_addr: EndpointAddress, buf: &mut [u8]) -> UsbResult<usize> {
        let mut state = self.state.lock().unwrap();
        if ep_addr.index() == 0 {
            if let Some(setup) = state.setup.take() {
                buf[..setup.len()].copy_from_slice(&setup);
                return Ok(setup.len());
            }
        }
        let queue = state.out_packets.entry(ep_addr.into()).or_default();
        match queue.front() {
            None => Err(UsbError::WouldBlock),
            Some(packet) if packet.len() > buf.len() => Err(UsbError::BufferOverflow),
            Some(_) => {
                let packet = queue.pop_front().unwrap();
                buf[..packet.len()].copy_from_slice(&packet);
                Ok(packet.len())
            }
        }
    }

    fn set_stalled(&self, ep_addr: EndpointAddress, stalled: bool) {
        if stalled {
            self.state.lock().unwrap().stalls.push(ep_addr.into());
        }
    }

    fn is_stalled(&self, _ep_addr: EndpointAddress) -> bool { false }

    fn suspend(&self) {}

    fn resume(&self) {}

    fn poll(&self) -> PollResult {
        let mut state = self.state.lock().unwrap();
        let ep_setup = u16::from(state.setup.is_some());
        let mut ep_out = 0;
        for (addr, queue) in state.out_packets.iter() {
            // the data stage of a control transfer waits behind its SETUP
            if !queue.is_empty() && !(*addr == 0 && ep_setup != 0) {
                ep_out |= 1 << (addr & 0x0F);
            }
        }
        let ep_in_complete = core::mem::take(&mut state.in_complete);
        if ep_setup | ep_out | ep_in_complete == 0 {
            PollResult::None
        } else {
            PollResult::Data { ep_out, ep_in_complete, ep_setup }
        }
    }
}
