use core::mem::discriminant;

use usb_device::UsbError;

#[derive(Debug)]
pub enum Error {
    UsbError(UsbError),
    /// A transfer is already in flight on the endpoint
    Busy,
    /// No [`CdcInterface`](crate::CdcInterface) has been registered with the class
    NotRegistered,
    /// The class has not been initialized by a bus reset or `init`
    NotInitialized,
    /// The data or the requested window does not fit the handle's buffers
    BufferOverflow,
    /// A wire structure was shorter than its fixed size
    InvalidLength,
    /// A line coding carried an unknown stop bit or parity code
    InvalidLineCoding,
    /// An application callback reported failure
    Interface(InterfaceError),
}

// `UsbError` is only `Debug`; its variants carry no data, so the discriminant identifies it.
impl PartialEq for Error {
    fn eq(&self, other: &Error) -> bool {
        match (self, other) {
            (Error::UsbError(a), Error::UsbError(b)) => discriminant(a) == discriminant(b),
            (Error::Interface(a), Error::Interface(b)) => a == b,
            _ => discriminant(self) == discriminant(other),
        }
    }
}

impl Eq for Error {}

impl From<UsbError> for Error {
    fn from(e: UsbError) -> Error {
        Error::UsbError(e)
    }
}

impl From<InterfaceError> for Error {
    fn from(e: InterfaceError) -> Error {
        Error::Interface(e)
    }
}

pub type Result<T> = core::result::Result<T, Error>;

/// Failure reported by an application callback
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum InterfaceError {
    Failed,
    Busy,
}

pub type InterfaceResult = core::result::Result<(), InterfaceError>;
