//! Reader for NumPy `.npy` arrays of little-endian floats.

use std::io::Read;

use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};

use super::error::MotionError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// A dense, C ordered array of values.
#[derive(Debug)]
pub struct NpyArray {
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Dtype {
    F32,
    F64,
}

impl Dtype {
    fn size(self) -> usize {
        match self {
            Dtype::F32 => 4,
            Dtype::F64 => 8,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
struct Header {
    dtype: Dtype,
    shape: Vec<usize>,
}

pub fn read_npy(mut r: impl Read) -> Result<NpyArray, MotionError> {
    let mut magic = [0_u8; 6];
    r.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(MotionError::NotNpy);
    }

    let major = r.read_u8()?;
    let minor = r.read_u8()?;
    let header_len = match major {
        1 => r.read_u16::<LittleEndian>()? as usize,
        2 | 3 => r.read_u32::<LittleEndian>()? as usize,
        _ => return Err(MotionError::UnsupportedVersion(major, minor)),
    };

    let mut header = vec![0; header_len];
    r.read_exact(&mut header)?;
    let header = String::from_utf8_lossy(&header);
    let Header { dtype, shape } = parse_header(&header)?;

    let count = shape
        .iter()
        .try_fold(1_usize, |count, &dim| count.checked_mul(dim))
        .ok_or_else(|| MotionError::Header(format!("shape {shape:?} is too large")))?;
    let payload = read_payload(&mut r, count, dtype)?;

    let mut values = vec![0.0_f32; count];
    match dtype {
        Dtype::F32 => LittleEndian::read_f32_into(&payload, &mut values),
        Dtype::F64 => values
            .iter_mut()
            .zip(payload.chunks_exact(8))
            .for_each(|(value, bytes)| *value = LittleEndian::read_f64(bytes) as f32),
    }

    Ok(NpyArray { shape, values })
}

/// Read the raw bytes of `count` values. The buffer only grows as data arrives, so a header
/// that claims more values than the file holds fails with an IO error instead of allocating
/// for all of them up front.
fn read_payload(r: &mut impl Read, count: usize, dtype: Dtype) -> Result<Vec<u8>, MotionError> {
    let len = count
        .checked_mul(dtype.size())
        .and_then(|len| u64::try_from(len).ok())
        .ok_or_else(|| MotionError::Header(format!("{count} values do not fit in memory")))?;

    let mut payload = vec![];
    r.take(len).read_to_end(&mut payload)?;
    if payload.len() as u64 != len {
        return Err(std::io::Error::new(
            std::io::ErrorKind::UnexpectedEof,
            format!("expected {len} bytes of data, found {}", payload.len()),
        )
        .into());
    }

    Ok(payload)
}

/// Parse the python dict literal in the header, e.g.
/// `{'descr': '<f4', 'fortran_order': False, 'shape': (1, 22, 3, 120), }`.
fn parse_header(header: &str) -> Result<Header, MotionError> {
    let descr = dict_value(header, "descr")?;
    let descr = descr
        .strip_prefix('\'')
        .and_then(|rest| rest.split('\'').next())
        .ok_or_else(|| MotionError::Header(format!("descr is not a string: {descr}")))?;
    let dtype = match descr {
        "<f4" => Dtype::F32,
        "<f8" => Dtype::F64,
        other => return Err(MotionError::UnsupportedDtype(other.to_string())),
    };

    if dict_value(header, "fortran_order")?.starts_with("True") {
        return Err(MotionError::FortranOrder);
    }

    let shape = dict_value(header, "shape")?;
    let shape = shape
        .strip_prefix('(')
        .and_then(|rest| rest.split(')').next())
        .ok_or_else(|| MotionError::Header(format!("shape is not a tuple: {shape}")))?;
    let shape = shape
        .split(',')
        .map(str::trim)
        .filter(|dim| !dim.is_empty())
        .map(|dim| {
            dim.parse::<usize>()
                .map_err(|_| MotionError::Header(format!("invalid dimension: {dim}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Header { dtype, shape })
}

/// The text following `'key':`, with leading whitespace removed.
fn dict_value<'a>(header: &'a str, key: &str) -> Result<&'a str, MotionError> {
    let pattern = format!("'{key}':");
    let start = header
        .find(&pattern)
        .ok_or_else(|| MotionError::Header(format!("missing key '{key}'")))?;
    Ok(header[start + pattern.len()..].trim_start())
}
