//! Minimal reader for the NumPy `.npy` container.
//!
//! Only what the grid asset needs: format versions 1 through 3, C order,
//! and one-byte element types (`b1`, `u1`, `i1`).

use crate::error::AssetLoadError;

const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// A decoded array shape plus a borrowed view of the raw element bytes.
#[derive(Debug)]
pub struct NpyArray<'a> {
    pub shape: Vec<usize>,
    pub data: &'a [u8],
}

fn malformed(msg: &str) -> AssetLoadError {
    AssetLoadError::Npy(msg.to_string())
}

/// Parse an `.npy` byte buffer.
pub fn parse(bytes: &[u8]) -> Result<NpyArray<'_>, AssetLoadError> {
    if bytes.len() < 10 || &bytes[..6] != MAGIC {
        return Err(malformed("bad magic"));
    }
    let major = bytes[6];
    let (header_len, header_start) = match major {
        1 => (u16::from_le_bytes([bytes[8], bytes[9]]) as usize, 10),
        2 | 3 => {
            if bytes.len() < 12 {
                return Err(malformed("truncated header length"));
            }
            let len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
            (len as usize, 12)
        }
        _ => return Err(malformed("unsupported format version")),
    };
    let data_start = header_start + header_len;
    if bytes.len() < data_start {
        return Err(malformed("truncated header"));
    }
    let header = std::str::from_utf8(&bytes[header_start..data_start])
        .map_err(|_| malformed("header is not text"))?;

    let descr = dict_value(header, "descr")
        .and_then(quoted)
        .ok_or_else(|| malformed("missing descr"))?;
    let fortran_order = dict_value(header, "fortran_order")
        .ok_or_else(|| malformed("missing fortran_order"))?;
    if fortran_order.starts_with("True") {
        return Err(malformed("fortran order is not supported"));
    }
    let shape = dict_value(header, "shape")
        .and_then(parse_shape)
        .ok_or_else(|| malformed("missing or malformed shape"))?;

    let kind = descr.trim_start_matches(['|', '<', '>', '=']);
    if !matches!(kind, "b1" | "u1" | "i1") {
        return Err(AssetLoadError::Dtype(descr.to_string()));
    }

    let count = shape
        .iter()
        .try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
        .ok_or_else(|| malformed("shape too large"))?;
    let data = &bytes[data_start..];
    if data.len() < count {
        return Err(malformed("data shorter than shape"));
    }

    Ok(NpyArray {
        shape,
        data: &data[..count],
    })
}

/// Return the text following `'key':` in a Python dict literal.
fn dict_value<'h>(header: &'h str, key: &str) -> Option<&'h str> {
    let needle = format!("'{key}':");
    let at = header.find(&needle)?;
    Some(header[at + needle.len()..].trim_start())
}

/// Extract the contents of a leading single-quoted string.
fn quoted(s: &str) -> Option<&str> {
    let rest = s.strip_prefix('\'')?;
    let end = rest.find('\'')?;
    Some(&rest[..end])
}

/// Parse a leading tuple literal such as `(20, 20, 3)` or `(400,)`.
fn parse_shape(s: &str) -> Option<Vec<usize>> {
    let rest = s.strip_prefix('(')?;
    let end = rest.find(')')?;
    rest[..end]
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| part.parse().ok())
        .collect()
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Build a version 1 `.npy` buffer around `data`.
    pub(crate) fn encode(descr: &str, shape: &[usize], data: &[u8]) -> Vec<u8> {
        encode_ordered(descr, false, shape, data)
    }

    fn encode_ordered(descr: &str, fortran: bool, shape: &[usize], data: &[u8]) -> Vec<u8> {
        let order = if fortran { "True" } else { "False" };
        let dims: Vec<String> = shape.iter().map(|d| d.to_string()).collect();
        let tuple = if dims.len() == 1 {
            format!("({},)", dims[0])
        } else {
            format!("({})", dims.join(", "))
        };
        let mut header =
            format!("{{'descr': '{descr}', 'fortran_order': {order}, 'shape': {tuple}, }}");
        while (10 + header.len() + 1) % 64 != 0 {
            header.push(' ');
        }
        header.push('\n');

        let mut out = MAGIC.to_vec();
        out.extend_from_slice(&[1, 0]);
        out.extend_from_slice(&(header.len() as u16).to_le_bytes());
        out.extend_from_slice(header.as_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn test_parse_header() {
        let bytes = encode("|u1", &[2, 3], &[1, 2, 3, 4, 5, 6]);
        let arr = parse(&bytes).unwrap();
        assert_eq!(arr.shape, vec![2, 3]);
        assert_eq!(arr.data, &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_one_dimensional_shape() {
        let bytes = encode("|b1", &[4], &[0, 1, 1, 0]);
        let arr = parse(&bytes).unwrap();
        assert_eq!(arr.shape, vec![4]);
    }

    #[test]
    fn test_bad_magic() {
        let mut bytes = encode("|u1", &[1], &[1]);
        bytes[1] = b'X';
        assert!(matches!(parse(&bytes), Err(AssetLoadError::Npy(_))));
    }

    #[test]
    fn test_wide_dtype_rejected() {
        let bytes = encode("<f8", &[1], &[0; 8]);
        assert!(matches!(parse(&bytes), Err(AssetLoadError::Dtype(d)) if d == "<f8"));
    }

    #[test]
    fn test_truncated_data() {
        let bytes = encode("|u1", &[2, 2], &[1, 1, 1]);
        assert!(matches!(parse(&bytes), Err(AssetLoadError::Npy(_))));
    }

    #[test]
    fn test_oversized_shape_rejected() {
        let bytes = encode("|u1", &[20, 20, usize::MAX / 100], &[1; 400]);
        assert!(matches!(parse(&bytes), Err(AssetLoadError::Npy(m)) if m.contains("too large")));
    }

    #[test]
    fn test_fortran_order_rejected() {
        let bytes = encode_ordered("|u1", true, &[1], &[1]);
        assert!(matches!(parse(&bytes), Err(AssetLoadError::Npy(m)) if m.contains("fortran")));
    }
}
