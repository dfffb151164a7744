//! Frame records for checking a run against reference ghost data.
//!
//! Reference files start with a [`TraceHeader`] and hold one [`ReferenceFrame`] per frame, in the
//! byte order announced by the header. [`FrameRecord`] is the richer per-tick dump written by this
//! crate, always big-endian.

use std::io::{self, Read, Write};

use ahash::AHashMap;
use arrayvec::ArrayVec;
use byteorder::{BigEndian, ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use glam::{Quat, Vec3, Vec4};
use log::warn;

use crate::sim::{MAX_WHEELS, VehiclePhysics};

/// `"KRKG"`
pub const TRACE_MAGIC: u32 = 0x4B52_4B47;
const BYTE_ORDER_MARK: u16 = 0xFEFF;

trait ReadExt: Read {
    fn read_vec3<B: ByteOrder>(&mut self) -> io::Result<Vec3> {
        Ok(Vec3::new(
            self.read_f32::<B>()?,
            self.read_f32::<B>()?,
            self.read_f32::<B>()?,
        ))
    }

    fn read_quat<B: ByteOrder>(&mut self) -> io::Result<Quat> {
        let v = self.read_vec3::<B>()?;
        let w = self.read_f32::<B>()?;
        Ok(Quat::from_xyzw(v.x, v.y, v.z, w))
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

trait WriteExt: Write {
    fn write_vec3<B: ByteOrder>(&mut self, v: Vec3) -> io::Result<()> {
        self.write_f32::<B>(v.x)?;
        self.write_f32::<B>(v.y)?;
        self.write_f32::<B>(v.z)
    }

    fn write_quat<B: ByteOrder>(&mut self, q: Quat) -> io::Result<()> {
        self.write_vec3::<B>(Vec3::new(q.x, q.y, q.z))?;
        self.write_f32::<B>(q.w)
    }
}

impl<W: Write + ?Sized> WriteExt for W {}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TraceEndian {
    Big,
    Little,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceHeader {
    pub frame_count: u16,
    pub version_major: u16,
    pub version_minor: u16,
}

impl TraceHeader {
    /// Bytes from the start of the file to the first frame.
    pub const SIZE: u32 = 16;

    /// Writes a big-endian header.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<BigEndian>(TRACE_MAGIC)?;
        writer.write_u16::<BigEndian>(BYTE_ORDER_MARK)?;
        writer.write_u16::<BigEndian>(self.frame_count)?;
        writer.write_u16::<BigEndian>(self.version_major)?;
        writer.write_u16::<BigEndian>(self.version_minor)?;
        writer.write_u32::<BigEndian>(Self::SIZE)
    }

    /// Reads the header and detects the byte order of the rest of the file.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<(Self, TraceEndian)> {
        let mut magic = [0; 4];
        reader.read_exact(&mut magic)?;
        let mut mark = [0; 2];
        reader.read_exact(&mut mark)?;

        if u16::from_be_bytes(mark) == BYTE_ORDER_MARK {
            Self::read_rest::<BigEndian, R>(reader, &magic).map(|h| (h, TraceEndian::Big))
        } else {
            Self::read_rest::<LittleEndian, R>(reader, &magic).map(|h| (h, TraceEndian::Little))
        }
    }

    fn read_rest<B: ByteOrder, R: Read>(reader: &mut R, magic: &[u8; 4]) -> io::Result<Self> {
        let magic = B::read_u32(magic);
        if magic != TRACE_MAGIC {
            return Err(invalid_data(format!(
                "TraceHeader::read_from(): bad magic 0x{magic:08X}"
            )));
        }

        let header = Self {
            frame_count: reader.read_u16::<B>()?,
            version_major: reader.read_u16::<B>()?,
            version_minor: reader.read_u16::<B>()?,
        };

        let offset = reader.read_u32::<B>()?;
        if offset != Self::SIZE {
            return Err(invalid_data(format!(
                "TraceHeader::read_from(): frame data at {offset}, expected {}",
                Self::SIZE
            )));
        }

        Ok(header)
    }
}

/// The per-frame entry of a reference file: where the vehicle was and how it was rotated.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReferenceFrame {
    pub pos: Vec3,
    pub full_rot: Quat,
}

impl ReferenceFrame {
    pub fn read_from<R: Read>(reader: &mut R, endian: TraceEndian) -> io::Result<Self> {
        match endian {
            TraceEndian::Big => Self::read_with::<BigEndian, R>(reader),
            TraceEndian::Little => Self::read_with::<LittleEndian, R>(reader),
        }
    }

    fn read_with<B: ByteOrder, R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            pos: reader.read_vec3::<B>()?,
            full_rot: reader.read_quat::<B>()?,
        })
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_vec3::<BigEndian>(self.pos)?;
        writer.write_quat::<BigEndian>(self.full_rot)
    }
}

/// Reads a whole reference file: the header, then every frame it announces.
pub fn read_reference<R: Read>(reader: &mut R) -> io::Result<(TraceHeader, Vec<ReferenceFrame>)> {
    let (header, endian) = TraceHeader::read_from(reader)?;

    let frames = (0..header.frame_count)
        .map(|_| ReferenceFrame::read_from(reader, endian))
        .collect::<io::Result<_>>()?;

    Ok((header, frames))
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WheelRecord {
    pub suspension_travel: f32,
    pub effective_radius: f32,
}

/// Everything needed to tell two runs apart after one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameRecord {
    pub pos: Vec3,
    pub ext_vel: Vec3,
    pub int_vel: Vec3,
    pub main_rot: Quat,
    pub full_rot: Quat,
    pub ang_vel0: Vec3,
    pub speed: f32,
    pub wheels: ArrayVec<WheelRecord, MAX_WHEELS>,
}

impl FrameRecord {
    #[must_use]
    pub fn from_vehicle(vehicle: &VehiclePhysics) -> Self {
        let state = vehicle.state();

        Self {
            pos: state.pos,
            ext_vel: state.ext_vel,
            int_vel: state.int_vel,
            main_rot: state.main_rot,
            full_rot: state.full_rot(),
            ang_vel0: state.ang_vel0,
            speed: state.speed_norm,
            wheels: vehicle
                .wheels()
                .iter()
                .map(|suspension| WheelRecord {
                    suspension_travel: suspension.wheel().suspension_travel(),
                    effective_radius: suspension.wheel().effective_radius(),
                })
                .collect(),
        }
    }

    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_vec3::<BigEndian>(self.pos)?;
        writer.write_vec3::<BigEndian>(self.ext_vel)?;
        writer.write_vec3::<BigEndian>(self.int_vel)?;
        writer.write_quat::<BigEndian>(self.main_rot)?;
        writer.write_quat::<BigEndian>(self.full_rot)?;
        writer.write_vec3::<BigEndian>(self.ang_vel0)?;
        writer.write_f32::<BigEndian>(self.speed)?;

        writer.write_u8(self.wheels.len() as u8)?;
        for wheel in &self.wheels {
            writer.write_f32::<BigEndian>(wheel.suspension_travel)?;
            writer.write_f32::<BigEndian>(wheel.effective_radius)?;
        }

        Ok(())
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let mut record = Self {
            pos: reader.read_vec3::<BigEndian>()?,
            ext_vel: reader.read_vec3::<BigEndian>()?,
            int_vel: reader.read_vec3::<BigEndian>()?,
            main_rot: reader.read_quat::<BigEndian>()?,
            full_rot: reader.read_quat::<BigEndian>()?,
            ang_vel0: reader.read_vec3::<BigEndian>()?,
            speed: reader.read_f32::<BigEndian>()?,
            wheels: ArrayVec::new(),
        };

        let wheel_count = usize::from(reader.read_u8()?);
        if wheel_count > MAX_WHEELS {
            return Err(invalid_data(format!(
                "FrameRecord::read_from(): {wheel_count} wheels exceed the limit of {MAX_WHEELS}"
            )));
        }

        for _ in 0..wheel_count {
            record.wheels.push(WheelRecord {
                suspension_travel: reader.read_f32::<BigEndian>()?,
                effective_radius: reader.read_f32::<BigEndian>()?,
            });
        }

        Ok(record)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ValueErrorStat {
    pub num_samples: usize,
    pub total: f32,
    pub max: f32,
}

impl Default for ValueErrorStat {
    fn default() -> Self {
        Self {
            num_samples: 0,
            total: 0.0,
            max: -f32::INFINITY,
        }
    }
}

impl ValueErrorStat {
    /// # Panics
    ///
    /// Panics if no sample was recorded.
    #[must_use]
    pub fn mean(&self) -> f32 {
        assert!(
            self.num_samples > 0,
            "ValueErrorStat::mean(): no samples recorded"
        );
        self.total / (self.num_samples as f32)
    }

    fn add(&mut self, err: f32) {
        self.num_samples += 1;
        self.max = f32::max(self.max, err);
        self.total += err;
    }
}

fn vec_bits(v: Vec3) -> [u32; 3] {
    v.to_array().map(f32::to_bits)
}

fn quat_bits(q: Quat) -> [u32; 4] {
    q.to_array().map(f32::to_bits)
}

fn quat_err(a: Quat, b: Quat) -> f32 {
    Vec4::from(a).distance(Vec4::from(b))
}

/// Accumulates per-value errors between an expected and an actual run.
#[derive(Debug, Clone, Default)]
pub struct TraceComparison {
    stats: AHashMap<String, ValueErrorStat>,
    first_desync: Option<u32>,
    frames: u32,
}

impl TraceComparison {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&mut self, frame: u32, name: &str, err: f32, synced: bool) -> bool {
        self.stats.entry(name.to_string()).or_default().add(err);

        if !synced && self.first_desync.is_none() {
            warn!("Desync at frame {frame} in \"{name}\" (error {err})");
            self.first_desync = Some(frame);
        }

        synced
    }

    fn record_vec(&mut self, frame: u32, name: &str, expected: Vec3, actual: Vec3) -> bool {
        let synced = vec_bits(expected) == vec_bits(actual);
        self.record(frame, name, expected.distance(actual), synced)
    }

    fn record_quat(&mut self, frame: u32, name: &str, expected: Quat, actual: Quat) -> bool {
        let synced = quat_bits(expected) == quat_bits(actual);
        self.record(frame, name, quat_err(expected, actual), synced)
    }

    fn record_f32(&mut self, frame: u32, name: &str, expected: f32, actual: f32) -> bool {
        let synced = expected.to_bits() == actual.to_bits();
        self.record(frame, name, (expected - actual).abs(), synced)
    }

    /// Compares one frame of a reference file. Returns whether it matched bit for bit.
    pub fn compare_reference(
        &mut self,
        frame: u32,
        expected: &ReferenceFrame,
        actual: &FrameRecord,
    ) -> bool {
        self.frames += 1;

        let pos = self.record_vec(frame, "pos", expected.pos, actual.pos);
        let rot = self.record_quat(frame, "full_rot", expected.full_rot, actual.full_rot);
        pos && rot
    }

    /// Compares every value of two records. Returns whether they matched bit for bit.
    pub fn compare(&mut self, frame: u32, expected: &FrameRecord, actual: &FrameRecord) -> bool {
        self.frames += 1;

        let mut synced = true;
        synced &= self.record_vec(frame, "pos", expected.pos, actual.pos);
        synced &= self.record_vec(frame, "ext_vel", expected.ext_vel, actual.ext_vel);
        synced &= self.record_vec(frame, "int_vel", expected.int_vel, actual.int_vel);
        synced &= self.record_quat(frame, "main_rot", expected.main_rot, actual.main_rot);
        synced &= self.record_quat(frame, "full_rot", expected.full_rot, actual.full_rot);
        synced &= self.record_vec(frame, "ang_vel0", expected.ang_vel0, actual.ang_vel0);
        synced &= self.record_f32(frame, "speed", expected.speed, actual.speed);

        if expected.wheels.len() != actual.wheels.len() {
            synced &= self.record(frame, "wheel_count", 1.0, false);
        }

        for (idx, (a, b)) in expected.wheels.iter().zip(&actual.wheels).enumerate() {
            synced &= self.record_f32(
                frame,
                &format!("wheel{idx}_travel"),
                a.suspension_travel,
                b.suspension_travel,
            );
            synced &= self.record_f32(
                frame,
                &format!("wheel{idx}_radius"),
                a.effective_radius,
                b.effective_radius,
            );
        }

        synced
    }

    #[must_use]
    pub const fn stats(&self) -> &AHashMap<String, ValueErrorStat> {
        &self.stats
    }

    #[must_use]
    pub fn stat(&self, name: &str) -> Option<&ValueErrorStat> {
        self.stats.get(name)
    }

    /// The first frame at which any value differed bit-wise.
    #[must_use]
    pub const fn first_desync(&self) -> Option<u32> {
        self.first_desync
    }

    #[must_use]
    pub const fn frames(&self) -> u32 {
        self.frames
    }

    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.first_desync.is_none()
    }
}
