//! USB CDC-ACM virtual serial port, composited with a vendor "custom HID" interface.
//!
//! The class driver sits on top of `usb-device`: [`CdcClass`] implements
//! [`UsbClass`](usb_device::class::UsbClass) and owns a [`CdcHandle`] that holds the
//! buffers and transfer state of one instance. The application supplies a [`CdcInterface`]
//! which is called back on initialization, control requests and received data.
//!
//! # Glossary
//!
//! | Term   | Description | More Info |
//! |--------|-------------|-----------|
//! | ACM    | Abstract Control Model. The CDC subclass used for virtual serial ports | Section 3.6.2 [USB CDC 1.2][UsbCdc] |
//! | IAD    | Interface association descriptor. Binds the CDC communication and data interfaces into one function | [IAD ECN][UsbIad] |
//! | Line coding | Baud rate, stop bits, parity and data bits of the emulated UART | Section 6.3.11 [USB PSTN 1.2][UsbCdc] |
//! | ZLP    | Zero length packet. Terminates a bulk transfer whose length is a multiple of the packet size | Section 5.8.3 [USB 2.0 Bus Spec][USB2Bus] |
//!
//! [USB2Bus]: https://www.usb.org/document-library/usb-20-specification
//! [UsbCdc]: https://www.usb.org/document-library/class-definitions-communication-devices-12
//! [UsbIad]: https://www.usb.org/document-library/interface-association-descriptor-ecn
//!

#![cfg_attr(not(test), no_std)]

mod consts;
mod config;
mod error;
mod request;
mod line_coding;
mod interface;
mod handle;
mod descriptor;
mod class;

#[cfg(test)]
mod mock_bus;

pub use usb_device::UsbError;
pub use consts::*;
pub use config::*;
pub use error::*;
pub use request::*;
pub use line_coding::*;
pub use interface::*;
pub use handle::*;
pub use descriptor::*;
pub use class::*;

mod logging {
    pub use log::debug as trace_cdc_control;
    pub use log::debug as trace_cdc_states;
    pub use log::trace as trace_cdc_bytes;
    pub use log::trace as trace_cdc_zlp;
    pub use log::debug as trace_hid;
}
