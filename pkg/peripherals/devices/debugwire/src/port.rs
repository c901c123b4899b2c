use common::errors::*;
use usb::{Context, Device, DeviceSelector, SetupPacket};

/// Vendor ID of the LittleWire/Digispark gateway.
pub const VENDOR_ID: u16 = 0x1781;
/// Product ID of the LittleWire/Digispark gateway.
pub const PRODUCT_ID: u16 = 0x0c9f;

/// The fixed vendor control request number the adapter answers on.
const VENDOR_REQUEST: u8 = 60;

/// `wValue` used for the "set timing" OUT shape.
const SET_TIMING_VALUE: u16 = 2;

/// The capability this crate needs from a USB connection to the adapter.
///
/// The session and frame buffer are generic over `UsbPort` so tests can
/// drive the protocol with a `MockPort` instead of real hardware. There are
/// only two real
/// transaction shapes once framing is lifted out: an OUT carrying a state
/// byte and payload, and an IN that just reads back whatever the adapter has
/// staged.
pub trait UsbPort {
    /// Sends `data` tagged with the adapter's 6-bit command-state bitmask
    ///.
    fn control_out(&mut self, state: u8, data: &[u8]) -> Result<()>;

    /// Reads back up to `buf.len()` bytes staged by a previous `control_out`.
    /// Returns the number of bytes actually received; a short read is not an
    /// error.
    fn control_in(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Programs the adapter's bit-timing register (the "set timing" shape).
    fn set_timing(&mut self, bit_time: u8) -> Result<()>;

    fn close(&mut self) -> Result<()>;
}

/// `UsbPort` backed by a real LittleWire/Digispark gateway.
pub struct LittleWirePort {
    device: Device,
}

impl LittleWirePort {
    pub fn open() -> Result<Self> {
        let ctx = Context::create()?;
        let selector = DeviceSelector::new(VENDOR_ID, PRODUCT_ID);
        let device = ctx.open_device(&selector)?;
        Ok(Self { device })
    }
}

impl UsbPort for LittleWirePort {
    fn control_out(&mut self, state: u8, data: &[u8]) -> Result<()> {
        self.device.write_control(
            SetupPacket {
                bmRequestType: 0x40,
                bRequest: VENDOR_REQUEST,
                wValue: state as u16,
                wIndex: 0,
                wLength: data.len() as u16,
            },
            data,
        )
    }

    fn control_in(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.device.read_control(
            SetupPacket {
                bmRequestType: 0xC0,
                bRequest: VENDOR_REQUEST,
                wValue: 0,
                wIndex: 0,
                wLength: buf.len() as u16,
            },
            buf,
        )
    }

    fn set_timing(&mut self, bit_time: u8) -> Result<()> {
        self.device.write_control(
            SetupPacket {
                bmRequestType: 0x40,
                bRequest: VENDOR_REQUEST,
                wValue: SET_TIMING_VALUE,
                wIndex: 0,
                wLength: 2,
            },
            &[0, bit_time],
        )
    }

    fn close(&mut self) -> Result<()> {
        // Nothing to release explicitly: the usbfs node is closed when
        // `Device` is dropped.
        Ok(())
    }
}
