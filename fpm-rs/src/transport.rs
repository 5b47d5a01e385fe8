use fpm_sys::Packet;
use std::io::{Read, Write};

/// Moves packets between the host and a module.
pub trait Transport {
    fn send(&mut self, packet: &Packet) -> crate::Result<()>;

    /// Blocks until one packet arrives or the link's read timeout expires.
    fn receive(&mut self) -> crate::Result<Packet>;
}

/// Packet framing over any byte stream, typically a `fpm_sys::SerialPort`.
#[derive(Debug)]
pub struct Uart<P> {
    port: P,
}

impl<P> Uart<P> {
    pub fn new(port: P) -> Self {
        Uart { port }
    }

    pub fn get_ref(&self) -> &P {
        &self.port
    }

    pub fn into_inner(self) -> P {
        self.port
    }
}

impl<P: Read + Write> Transport for Uart<P> {
    fn send(&mut self, packet: &Packet) -> crate::Result<()> {
        log::trace!("-> {} {:02x?}", packet.kind, packet.payload);
        packet.write_to(&mut self.port)?;

        Ok(())
    }

    fn receive(&mut self) -> crate::Result<Packet> {
        let packet = Packet::read_from(&mut self.port)?;
        log::trace!("<- {} {:02x?}", packet.kind, packet.payload);

        Ok(packet)
    }
}
