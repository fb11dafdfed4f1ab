//! Wire encoding of controller output and the actuator link.
//!
//! The controller on the other end reads one ASCII line per command:
//! `"<angle>,<code>\n"` with the angle in [0, 180] and the code one of
//! `A` (approach), `F` (move back) or `M` (hold).

use std::fmt;
use std::io::Write;

use log::{debug, info, warn};

use crate::config::ActuatorConfig;
use crate::control::controller::{ControlOutput, DepthDirection, SERVO_CENTER, SERVO_MAX};
use crate::error::{Result, ServoError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActuationCommand {
    angle: u8,
    depth: DepthDirection,
}

impl ActuationCommand {
    /// Servo centered, hold distance. Sent on shutdown.
    pub const NEUTRAL: ActuationCommand = ActuationCommand {
        angle: SERVO_CENTER,
        depth: DepthDirection::Hold,
    };

    /// Angles above 180 are clamped.
    pub fn new(angle: u8, depth: DepthDirection) -> Self {
        Self {
            angle: angle.min(SERVO_MAX),
            depth,
        }
    }

    pub fn from_output(output: &ControlOutput) -> Self {
        Self::new(output.servo_angle, output.depth.direction)
    }

    pub fn angle(&self) -> u8 {
        self.angle
    }

    pub fn code(&self) -> char {
        self.depth.code()
    }

    /// Encoded wire line, newline included.
    pub fn encode(&self) -> String {
        format!("{self}\n")
    }
}

impl fmt::Display for ActuationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.angle, self.code())
    }
}

/// Line-oriented transport to the actuator controller.
pub trait ActuatorLink {
    /// Write one full line. Implementations must not block for long; a slow
    /// or dead peer should surface as an error.
    fn send_line(&mut self, line: &str) -> std::io::Result<()>;

    fn describe(&self) -> String {
        "actuator link".to_string()
    }
}

/// Link over any writer (stdout, a file, a socket).
pub struct WriterLink<W: Write> {
    writer: W,
    name: String,
}

impl<W: Write> WriterLink<W> {
    pub fn new(writer: W, name: impl Into<String>) -> Self {
        Self {
            writer,
            name: name.into(),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ActuatorLink for WriterLink<W> {
    fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()
    }

    fn describe(&self) -> String {
        self.name.clone()
    }
}

/// Hardware serial port.
#[cfg(feature = "serial")]
pub struct SerialLink {
    port: Box<dyn serialport::SerialPort>,
    path: String,
}

#[cfg(feature = "serial")]
impl SerialLink {
    pub fn open(config: &ActuatorConfig, path: &str) -> Result<Self> {
        let port = serialport::new(path, config.baud_rate)
            .timeout(std::time::Duration::from_millis(config.write_timeout_ms))
            .open()
            .map_err(|e| ServoError::Actuator(format!("{path}: {e}")))?;
        Ok(Self {
            port,
            path: path.to_string(),
        })
    }
}

#[cfg(feature = "serial")]
impl ActuatorLink for SerialLink {
    fn send_line(&mut self, line: &str) -> std::io::Result<()> {
        self.port.write_all(line.as_bytes())?;
        self.port.flush()
    }

    fn describe(&self) -> String {
        format!("serial {}", self.path)
    }
}

/// Open the serial link named in the config.
#[cfg(feature = "serial")]
pub fn open_serial(config: &ActuatorConfig, path: &str) -> Result<Box<dyn ActuatorLink>> {
    Ok(Box::new(SerialLink::open(config, path)?))
}

#[cfg(not(feature = "serial"))]
pub fn open_serial(_config: &ActuatorConfig, path: &str) -> Result<Box<dyn ActuatorLink>> {
    Err(ServoError::Actuator(format!(
        "{path}: built without the `serial` feature"
    )))
}

/// Best-effort command sink around an optional link.
///
/// With no link, commands are counted and dropped. A failed write is logged
/// once; later failures are dropped quietly and the link is kept, so a peer
/// that comes back resumes receiving commands.
pub struct Actuator {
    link: Option<Box<dyn ActuatorLink>>,
    sent: u64,
    dropped: u64,
    failure_reported: bool,
}

impl Actuator {
    pub fn new(link: Box<dyn ActuatorLink>) -> Self {
        Self {
            link: Some(link),
            sent: 0,
            dropped: 0,
            failure_reported: false,
        }
    }

    pub fn disconnected() -> Self {
        Self {
            link: None,
            sent: 0,
            dropped: 0,
            failure_reported: false,
        }
    }

    /// Open the configured serial port. Failure is reported here, once, and
    /// yields a disconnected actuator.
    pub fn from_config(config: &ActuatorConfig) -> Self {
        let Some(path) = config.port.as_deref() else {
            info!("no actuator port configured, commands will not be delivered");
            return Self::disconnected();
        };
        match open_serial(config, path) {
            Ok(link) => {
                info!("actuator link open: {}", link.describe());
                Self::new(link)
            }
            Err(e) => {
                warn!("actuator unavailable, continuing without it: {e}");
                Self::disconnected()
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        self.link.is_some()
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Returns whether the command reached the link.
    pub fn send(&mut self, command: ActuationCommand) -> bool {
        let Some(link) = self.link.as_mut() else {
            self.dropped += 1;
            return false;
        };
        match link.send_line(&command.encode()) {
            Ok(()) => {
                self.sent += 1;
                true
            }
            Err(e) => {
                if !self.failure_reported {
                    warn!("actuator write failed on {}, dropping commands: {e}", link.describe());
                    self.failure_reported = true;
                } else {
                    debug!("actuator write failed: {e}");
                }
                self.dropped += 1;
                false
            }
        }
    }

    /// Park the actuator at [`ActuationCommand::NEUTRAL`] and release the link.
    pub fn shutdown(&mut self) {
        if self.link.is_some() {
            self.send(ActuationCommand::NEUTRAL);
        }
        if let Some(link) = self.link.take() {
            info!("actuator link closed: {}", link.describe());
        }
    }
}

impl Drop for Actuator {
    fn drop(&mut self) {
        self.shutdown();
    }
}
