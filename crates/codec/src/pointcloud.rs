//! Binary point-cloud decoder.
//!
//! Turns a self-describing fixed-stride record into a dense `N x F` float32
//! matrix, one column per requested field, in the requested order.

use std::collections::HashMap;

use contracts::{PipelineError, PointCloudData, ScalarType};
use ndarray::Array2;

/// Decode the requested fields of a point-cloud record.
///
/// Column order matches `requested`. Inter-field padding implied by
/// `point_step` is skipped; every value is cast to f32 with the scalar
/// type's natural conversion (unsigned types stay unsigned).
///
/// # Errors
/// - `MalformedRecord` when a requested field is absent from the record
/// - `Decode` when the declared layout does not fit the payload
pub fn decode_points(
    cloud: &PointCloudData,
    requested: &[&str],
) -> Result<Array2<f32>, PipelineError> {
    let lookup: HashMap<&str, (usize, ScalarType)> = cloud
        .fields
        .iter()
        .map(|f| (f.name.as_str(), (f.offset as usize, f.scalar_type)))
        .collect();

    let mut columns = Vec::with_capacity(requested.len());
    for &name in requested {
        let &(offset, scalar_type) =
            lookup
                .get(name)
                .ok_or_else(|| PipelineError::MalformedRecord {
                    field: name.to_string(),
                })?;
        columns.push((offset, scalar_type));
    }

    let rows = cloud.num_points as usize;
    let stride = cloud.point_step as usize;

    if rows == 0 {
        return Ok(Array2::zeros((0, requested.len())));
    }
    if stride == 0 {
        return Err(PipelineError::decode("point cloud", "point_step is zero"));
    }
    for (&name, &(offset, scalar_type)) in requested.iter().zip(&columns) {
        if offset + scalar_type.size() > stride {
            return Err(PipelineError::decode(
                "point cloud",
                format!("field '{name}' extends past point step {stride}"),
            ));
        }
    }
    if cloud.data.len() < rows * stride {
        return Err(PipelineError::decode(
            "point cloud",
            format!(
                "payload holds {} bytes, {} declared ({} rows x {} step)",
                cloud.data.len(),
                rows * stride,
                rows,
                stride
            ),
        ));
    }

    let mut out = Array2::<f32>::zeros((rows, requested.len()));
    for (r, row) in cloud.data.chunks_exact(stride).take(rows).enumerate() {
        for (c, &(offset, scalar_type)) in columns.iter().enumerate() {
            out[[r, c]] = read_scalar(row, offset, scalar_type);
        }
    }
    Ok(out)
}

/// Reinterpret one little-endian scalar and widen/narrow it to f32.
#[inline]
fn read_scalar(row: &[u8], offset: usize, scalar_type: ScalarType) -> f32 {
    // Offsets are validated against the stride before the row loop.
    match scalar_type {
        ScalarType::Int8 => row[offset] as i8 as f32,
        ScalarType::UInt8 => row[offset] as f32,
        ScalarType::Int16 => {
            i16::from_le_bytes([row[offset], row[offset + 1]]) as f32
        }
        ScalarType::UInt16 => {
            u16::from_le_bytes([row[offset], row[offset + 1]]) as f32
        }
        ScalarType::Int32 => {
            i32::from_le_bytes(row[offset..offset + 4].try_into().unwrap()) as f32
        }
        ScalarType::UInt32 => {
            u32::from_le_bytes(row[offset..offset + 4].try_into().unwrap()) as f32
        }
        ScalarType::Float32 => f32::from_le_bytes(row[offset..offset + 4].try_into().unwrap()),
        ScalarType::Float64 => {
            f64::from_le_bytes(row[offset..offset + 8].try_into().unwrap()) as f32
        }
    }
}
