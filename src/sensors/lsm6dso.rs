//! ST LSM6DSO 6-axis IMU, accelerometer half only.
//!
//! Configured once for 104 Hz / ±2 g and then polled.  The toy only cares
//! about horizontal acceleration, so [`Lsm6dso::read_axes`] drops Z after
//! the burst read.
//!
//! ## Register map (subset)
//!
//! | Register   | Addr | Use                                    |
//! |------------|------|----------------------------------------|
//! | WHO_AM_I   | 0x0F | must read 0x6C                         |
//! | CTRL1_XL   | 0x10 | ODR 104 Hz, FS ±2 g → 0x40             |
//! | CTRL3_C    | 0x12 | BDU + IF_INC → 0x44                    |
//! | OUTX_L_A   | 0x28 | X/Y/Z little-endian i16, auto-increment |

use embedded_hal::i2c::I2c;
use log::{info, warn};

use crate::error::SensorError;
use crate::motion::MotionSample;

/// SA0 pulled high on the breakout.
pub const DEFAULT_ADDRESS: u8 = 0x6B;
pub const WHO_AM_I_VALUE: u8 = 0x6C;

/// Sensitivity at ±2 g full scale.
const MG_PER_LSB: f32 = 0.061;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
enum Register {
    WhoAmI = 0x0F,
    Ctrl1Xl = 0x10,
    Ctrl3C = 0x12,
    OutxLA = 0x28,
}

const CTRL1_XL_104HZ_2G: u8 = 0x40;
const CTRL3_C_BDU_IF_INC: u8 = 0x44;

pub struct Lsm6dso<I>
where
    I: I2c,
{
    i2c: I,
    address: u8,
    initialised: bool,
}

impl<I> Lsm6dso<I>
where
    I: I2c,
{
    pub fn new(i2c: I, address: u8) -> Self {
        Self {
            i2c,
            address,
            initialised: false,
        }
    }

    /// Verify identity and configure the accelerometer.
    pub fn init(&mut self) -> Result<(), SensorError> {
        let id = self.read_register(Register::WhoAmI)?;
        if id != WHO_AM_I_VALUE {
            warn!("LSM6DSO: unexpected WHO_AM_I 0x{:02X}", id);
            return Err(SensorError::WrongDevice(id));
        }
        self.write_register(Register::Ctrl3C, CTRL3_C_BDU_IF_INC)?;
        self.write_register(Register::Ctrl1Xl, CTRL1_XL_104HZ_2G)?;
        self.initialised = true;
        info!("LSM6DSO ready at 0x{:02X} (104 Hz, ±2 g)", self.address);
        Ok(())
    }

    pub fn is_initialised(&self) -> bool {
        self.initialised
    }

    /// Latest X/Y acceleration in g.
    pub fn read_axes(&mut self) -> Result<MotionSample, SensorError> {
        if !self.initialised {
            return Err(SensorError::NotInitialised);
        }
        let mut raw = [0u8; 6];
        self.read_registers(Register::OutxLA, &mut raw)?;
        let x = i16::from_le_bytes([raw[0], raw[1]]);
        let y = i16::from_le_bytes([raw[2], raw[3]]);
        Ok(MotionSample::new(to_g(x), to_g(y)))
    }

    /// Give the bus back (e.g. to share it with another device).
    pub fn release(self) -> I {
        self.i2c
    }

    fn read_register(&mut self, reg: Register) -> Result<u8, SensorError> {
        let mut buf = [0; 1];
        self.read_registers(reg, &mut buf)?;
        Ok(buf[0])
    }

    fn read_registers(&mut self, reg: Register, buf: &mut [u8]) -> Result<(), SensorError> {
        self.i2c
            .write_read(self.address, &[reg as u8], buf)
            .map_err(|_| SensorError::BusFailed)
    }

    fn write_register(&mut self, reg: Register, value: u8) -> Result<(), SensorError> {
        self.i2c
            .write(self.address, &[reg as u8, value])
            .map_err(|_| SensorError::BusFailed)
    }
}

fn to_g(raw: i16) -> f32 {
    f32::from(raw) * MG_PER_LSB / 1000.0
}

#[cfg(test)]
pub(crate) mod fake_bus {
    use super::{DEFAULT_ADDRESS, WHO_AM_I_VALUE};
    use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

    /// Register-file fake: a write sets the pointer (and stores any data
    /// bytes), a read streams from the pointer with auto-increment.
    pub(crate) struct FakeBus {
        pub regs: [u8; 0x80],
        ptr: usize,
        pub fail: bool,
    }

    impl FakeBus {
        pub fn lsm6dso() -> Self {
            let mut regs = [0u8; 0x80];
            regs[0x0F] = WHO_AM_I_VALUE;
            Self {
                regs,
                ptr: 0,
                fail: false,
            }
        }
    }

    impl ErrorType for FakeBus {
        type Error = ErrorKind;
    }

    impl I2c for FakeBus {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.fail || address != DEFAULT_ADDRESS {
                return Err(ErrorKind::Other);
            }
            for op in operations {
                match op {
                    Operation::Write(bytes) => {
                        if let Some((&reg, data)) = bytes.split_first() {
                            self.ptr = reg as usize;
                            for (i, b) in data.iter().enumerate() {
                                self.regs[self.ptr + i] = *b;
                            }
                        }
                    }
                    Operation::Read(buf) => {
                        for (i, b) in buf.iter_mut().enumerate() {
                            *b = self.regs[self.ptr + i];
                        }
                    }
                }
            }
            Ok(())
        }
    }
}
