use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::{AsRawFd, RawFd};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// A UART opened in raw 8N1 mode through termios.
///
/// Reads block for at most the configured timeout and then return whatever
/// arrived, possibly nothing. `Read::read_exact` therefore reports a silent
/// module as `UnexpectedEof`.
#[derive(Debug)]
pub struct SerialPort {
    file: File,
    path: PathBuf,
}

impl SerialPort {
    pub fn open<P: AsRef<Path>>(path: P, baud: u32, timeout: Duration) -> io::Result<SerialPort> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)?;

        let port = SerialPort {
            file,
            path: path.to_path_buf(),
        };
        port.configure(baud, timeout)?;
        port.discard_input()?;

        Ok(port)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn configure(&self, baud: u32, timeout: Duration) -> io::Result<()> {
        let speed = speed_constant(baud)?;
        let fd = self.file.as_raw_fd();

        let mut tty: libc::termios = unsafe { std::mem::zeroed() };
        check(unsafe { libc::tcgetattr(fd, &mut tty) })?;

        unsafe { libc::cfmakeraw(&mut tty) };
        tty.c_cflag |= libc::CLOCAL | libc::CREAD;
        tty.c_cflag &= !(libc::CSTOPB | libc::PARENB | libc::CRTSCTS);
        tty.c_cc[libc::VMIN] = 0;
        tty.c_cc[libc::VTIME] = deciseconds(timeout);

        check(unsafe { libc::cfsetispeed(&mut tty, speed) })?;
        check(unsafe { libc::cfsetospeed(&mut tty, speed) })?;
        check(unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tty) })?;

        Ok(())
    }

    /// Drops bytes the module sent before we started listening (power-on chatter).
    pub fn discard_input(&self) -> io::Result<()> {
        check(unsafe { libc::tcflush(self.file.as_raw_fd(), libc::TCIFLUSH) })
    }
}

impl Read for SerialPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.file.read(buf)
    }
}

impl Write for SerialPort {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        check(unsafe { libc::tcdrain(self.file.as_raw_fd()) })
    }
}

impl AsRawFd for SerialPort {
    fn as_raw_fd(&self) -> RawFd {
        self.file.as_raw_fd()
    }
}

fn check(result: libc::c_int) -> io::Result<()> {
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(())
    }
}

/// VTIME counts tenths of a second in a single byte.
fn deciseconds(timeout: Duration) -> libc::cc_t {
    let tenths = (timeout.as_millis() + 99) / 100;

    tenths.max(1).min(255) as libc::cc_t
}

fn speed_constant(baud: u32) -> io::Result<libc::speed_t> {
    let speed = match baud {
        9_600 => libc::B9600,
        19_200 => libc::B19200,
        38_400 => libc::B38400,
        57_600 => libc::B57600,
        115_200 => libc::B115200,
        n => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unsupported baud rate {}", n),
            ))
        }
    };

    Ok(speed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_is_rounded_up_to_tenths_and_clamped() {
        assert_eq!(deciseconds(Duration::from_millis(0)), 1);
        assert_eq!(deciseconds(Duration::from_millis(101)), 2);
        assert_eq!(deciseconds(Duration::from_secs(1)), 10);
        assert_eq!(deciseconds(Duration::from_secs(60)), 255);
    }

    #[test]
    fn module_baud_rates_are_supported() {
        for baud in &[9_600, 19_200, 38_400, 57_600, 115_200] {
            assert!(speed_constant(*baud).is_ok());
        }
        assert!(speed_constant(12_345).is_err());
    }
}
