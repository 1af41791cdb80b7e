// Hex scalar -> fixed-width byte / limb sequences for generated array literals.
//
// Inputs are arbitrary-precision hex strings ("0x" prefix optional). Values
// wider than the target width are truncated from the left: only the
// least-significant `width` bytes survive (same as masking mod 2^(8*width)).

use num_bigint::BigUint;
use num_traits::ToPrimitive;

use crate::error::{TranspileError, TranspileResult};

fn strip_prefix(hex_str: &str) -> &str {
    hex_str
        .strip_prefix("0x")
        .or_else(|| hex_str.strip_prefix("0X"))
        .unwrap_or(hex_str)
}

fn invalid(hex_str: &str) -> TranspileError {
    TranspileError::InvalidHex { value: hex_str.to_string() }
}

pub fn parse_hex(hex_str: &str) -> TranspileResult<BigUint> {
    let digits = strip_prefix(hex_str.trim());
    if digits.is_empty() {
        return Err(invalid(hex_str));
    }
    BigUint::parse_bytes(digits.as_bytes(), 16).ok_or_else(|| invalid(hex_str))
}

/// Number of bytes needed to hold the value (0 for zero).
pub fn significant_bytes(hex_str: &str) -> TranspileResult<usize> {
    let x = parse_hex(hex_str)?;
    Ok(((x.bits() + 7) / 8) as usize)
}

pub fn fits_width(hex_str: &str, width: usize) -> TranspileResult<bool> {
    Ok(significant_bytes(hex_str)? <= width)
}

/// Value as `width` big-endian bytes, most-significant first.
pub fn to_be_bytes(hex_str: &str, width: usize) -> TranspileResult<Vec<u8>> {
    let x = parse_hex(hex_str)?;
    let be = x.to_bytes_be();

    let mut out = vec![0u8; width];
    let take = core::cmp::min(width, be.len());
    out[width - take..].copy_from_slice(&be[be.len() - take..]);
    Ok(out)
}

/// Address layout: digits left-padded to `width` bytes, then byte-reversed.
pub fn to_address_bytes(hex_str: &str, width: usize) -> TranspileResult<Vec<u8>> {
    let digits = strip_prefix(hex_str.trim());
    if digits.is_empty() || !digits.bytes().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid(hex_str));
    }

    let n = 2 * width;
    let padded = if digits.len() >= n {
        digits[digits.len() - n..].to_string()
    } else {
        format!("{:0>n$}", digits, n = n)
    };

    let mut out = hex::decode(&padded).map_err(|_| invalid(hex_str))?;
    out.reverse();
    Ok(out)
}

/// Value as `limbs` u64 words, least-significant limb first.
pub fn to_le_limbs(hex_str: &str, limbs: usize) -> TranspileResult<Vec<u64>> {
    let x = parse_hex(hex_str)?;
    let mut out = x.to_u64_digits();
    out.resize(limbs, 0);
    Ok(out)
}

/// `None` when the value does not fit in a u64.
pub fn to_u64(hex_str: &str) -> TranspileResult<Option<u64>> {
    Ok(parse_hex(hex_str)?.to_u64())
}

// -----------------------------------------------------------------------------
// token rendering
// -----------------------------------------------------------------------------

/// `0xAB`
pub fn byte_token(b: u8) -> String {
    format!("0x{}", hex::encode_upper([b]))
}

/// `0xab`
pub fn byte_token_lower(b: u8) -> String {
    format!("0x{}", hex::encode([b]))
}

/// `0x00000000000000ab`
pub fn limb_token(w: u64) -> String {
    format!("0x{:016x}", w)
}

pub fn be_byte_tokens(hex_str: &str, width: usize) -> TranspileResult<Vec<String>> {
    Ok(to_be_bytes(hex_str, width)?.into_iter().map(byte_token).collect())
}

pub fn address_byte_tokens(hex_str: &str, width: usize) -> TranspileResult<Vec<String>> {
    Ok(to_address_bytes(hex_str, width)?.into_iter().map(byte_token).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn be_bytes_pad_on_the_left() {
        let b = to_be_bytes("0x1c", 4).unwrap();
        assert_eq!(b, vec![0x00, 0x00, 0x00, 0x1c]);
        assert_eq!(to_be_bytes("0", 2).unwrap(), vec![0, 0]);
        assert_eq!(to_be_bytes("abc", 2).unwrap(), vec![0x0a, 0xbc]);
    }

    #[test]
    fn be_bytes_truncate_from_the_left() {
        let b = to_be_bytes("0x112233445566", 4).unwrap();
        assert_eq!(b, vec![0x33, 0x44, 0x55, 0x66]);
        assert!(!fits_width("0x112233445566", 4).unwrap());
        assert!(fits_width("0x0000000033445566", 4).unwrap());
    }

    #[test]
    fn address_bytes_are_reversed() {
        let a = to_address_bytes("0xb7af5e18c9d9e294df3fad2e648f86d54a6744bc", 20).unwrap();
        assert_eq!(a[0], 0xbc);
        assert_eq!(a[19], 0xb7);

        let short = to_address_bytes("0x1", 20).unwrap();
        assert_eq!(short[0], 0x01);
        assert!(short[1..].iter().all(|b| *b == 0));
    }

    #[test]
    fn address_bytes_truncate_from_the_left() {
        // 22 bytes -> leading 0xaabb dropped
        let h = format!("0xaabb{}", "11".repeat(19) + "22");
        let a = to_address_bytes(&h, 20).unwrap();
        assert_eq!(a.len(), 20);
        assert_eq!(a[0], 0x22);
        assert_eq!(a[19], 0x11);
    }

    #[test]
    fn limbs_are_little_endian() {
        let h = "0xd9eba16ed0ecae432b71fe008c98cc872bb4cc214d3220a36f365326cf807d68";
        let l = to_le_limbs(h, 4).unwrap();
        assert_eq!(
            l,
            vec![0x6f365326cf807d68, 0x2bb4cc214d3220a3, 0x2b71fe008c98cc87, 0xd9eba16ed0ecae43]
        );
        assert_eq!(to_le_limbs("0x0", 4).unwrap(), vec![0, 0, 0, 0]);
        assert_eq!(to_le_limbs("0x1", 1).unwrap(), vec![1]);
    }

    #[test]
    fn invalid_hex_is_rejected() {
        assert!(matches!(parse_hex("0x"), Err(TranspileError::InvalidHex { .. })));
        assert!(matches!(parse_hex("0xzz"), Err(TranspileError::InvalidHex { .. })));
        assert!(to_address_bytes("0xg1", 20).is_err());
        assert!(to_be_bytes("", 32).is_err());
    }

    #[test]
    fn tokens() {
        assert_eq!(byte_token(0xab), "0xAB");
        assert_eq!(byte_token(0x05), "0x05");
        assert_eq!(byte_token_lower(0xab), "0xab");
        assert_eq!(limb_token(0xab), "0x00000000000000ab");
        assert_eq!(to_u64("0x1b").unwrap(), Some(27));
        assert_eq!(to_u64(&format!("0x1{}", "0".repeat(16))).unwrap(), None);
    }

    proptest! {
        #[test]
        fn be_tokens_reparse_modulo_width(h in "[0-9a-fA-F]{1,80}", w in 1usize..40) {
            let toks = be_byte_tokens(&h, w).unwrap();
            prop_assert_eq!(toks.len(), w);
            for t in &toks {
                prop_assert_eq!(t.len(), 4);
                prop_assert!(t.starts_with("0x"));
                prop_assert!(t[2..].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
            }

            let joined: String = toks.iter().map(|t| &t[2..]).collect();
            let got = BigUint::parse_bytes(joined.as_bytes(), 16).unwrap();
            let modulus = BigUint::from(1u8) << (8 * w);
            let want = BigUint::parse_bytes(h.as_bytes(), 16).unwrap() % modulus;
            prop_assert_eq!(got, want);
        }

        #[test]
        fn address_is_reverse_of_be(h in "0x[0-9a-f]{1,48}") {
            let mut be = to_be_bytes(&h, 20).unwrap();
            be.reverse();
            let addr = to_address_bytes(&h, 20).unwrap();
            prop_assert_eq!(addr.len(), 20);
            prop_assert_eq!(addr, be);
        }

        #[test]
        fn limbs_match_be_bytes(h in "0x[0-9a-f]{1,64}") {
            let be = to_be_bytes(&h, 32).unwrap();
            let limbs = to_le_limbs(&h, 4).unwrap();
            for (i, limb) in limbs.iter().enumerate() {
                let chunk = &be[32 - 8 * (i + 1)..32 - 8 * i];
                prop_assert_eq!(*limb, u64::from_be_bytes(chunk.try_into().unwrap()));
            }
        }
    }
}
