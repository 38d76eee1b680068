//! Where the device companion lives and the stream type that reaches it.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::path::PathBuf;

#[cfg(unix)]
use std::os::unix::net::UnixStream;

/// Address of the device companion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Named local channel, a Unix socket in the temp directory.
    Local(String),
    /// TCP address, e.g. `127.0.0.1:7789`.
    Tcp(String),
}

impl Endpoint {
    /// Filesystem path of a named local channel. An absolute name is used as is.
    pub fn local_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    pub fn connect(&self) -> io::Result<DeviceStream> {
        match self {
            Endpoint::Tcp(addr) => {
                let stream = TcpStream::connect(addr)?;
                stream.set_nodelay(true)?;
                Ok(DeviceStream::Tcp(stream))
            }
            #[cfg(unix)]
            Endpoint::Local(name) => Ok(DeviceStream::Unix(UnixStream::connect(Self::local_path(name))?)),
            #[cfg(not(unix))]
            Endpoint::Local(name) => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                format!("local channel '{}' needs a Unix platform, use a TCP endpoint", name),
            )),
        }
    }
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Endpoint::Local(name) => write!(f, "local:{}", name),
            Endpoint::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

/// A connected byte stream to the device.
#[derive(Debug)]
pub enum DeviceStream {
    Tcp(TcpStream),
    #[cfg(unix)]
    Unix(UnixStream),
}

impl DeviceStream {
    pub fn try_clone(&self) -> io::Result<Self> {
        match self {
            DeviceStream::Tcp(s) => Ok(DeviceStream::Tcp(s.try_clone()?)),
            #[cfg(unix)]
            DeviceStream::Unix(s) => Ok(DeviceStream::Unix(s.try_clone()?)),
        }
    }

    pub fn shutdown(&self) -> io::Result<()> {
        match self {
            DeviceStream::Tcp(s) => s.shutdown(Shutdown::Both),
            #[cfg(unix)]
            DeviceStream::Unix(s) => s.shutdown(Shutdown::Both),
        }
    }
}

impl Read for DeviceStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            DeviceStream::Tcp(s) => s.read(buf),
            #[cfg(unix)]
            DeviceStream::Unix(s) => s.read(buf),
        }
    }
}

impl Write for DeviceStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            DeviceStream::Tcp(s) => s.write(buf),
            #[cfg(unix)]
            DeviceStream::Unix(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            DeviceStream::Tcp(s) => s.flush(),
            #[cfg(unix)]
            DeviceStream::Unix(s) => s.flush(),
        }
    }
}
