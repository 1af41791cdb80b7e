//! Renders committed blocks as Rust test bodies.
//!
//! Two layouts are supported:
//! - `Bytes`: `ecrecover(&sig, &hash, mode)` with a 65-byte signature
//!   (r || s || recovery id) and a 32-byte hash.
//! - `Limbs`: `ecrecover(&hash, v, &r, &s, mode)` with `[u64; 4]` operands,
//!   least-significant limb first, and the raw 27/28 `v`.
//!
//! Both end every test with the same two assertions (error code is 0, address
//! matches) and a blank line.

use std::io::Write;

use tracing::warn;

use crate::block_scanner::CommittedBlock;
use crate::error::{TranspileError, TranspileResult};
use crate::scalar_codec::{
    address_byte_tokens, be_byte_tokens, byte_token, byte_token_lower, fits_width, limb_token,
    to_be_bytes, to_le_limbs, to_u64,
};
use crate::vector_params::{
    ADDRESSBYTES, DEFAULT_FUNCTION, RAW_RECID_EVEN, RAW_RECID_ODD, RECID_EVEN, RECID_ODD,
    SCALARBYTES, SCALARLIMBS, SIGBYTES, SUCCESS_CODE,
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputLayout {
    #[default]
    Bytes,
    Limbs,
}

/// Byte order of the expected-address literal in the `Bytes` layout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressOrder {
    #[default]
    BigEndian,
    Reversed,
}

/// What to do with a `D` that is neither 27 nor 28.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecoveryIdPolicy {
    /// emit the value as its own byte, with a warning
    #[default]
    PassThrough,
    Strict,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitOptions {
    pub function_name: String,
    pub layout: OutputLayout,
    pub address_order: AddressOrder,
    pub recovery_id: RecoveryIdPolicy,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            function_name: DEFAULT_FUNCTION.to_string(),
            layout: OutputLayout::default(),
            address_order: AddressOrder::default(),
            recovery_id: RecoveryIdPolicy::default(),
        }
    }
}

/// Literal tokens for one test, already in the chosen layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedTestCase {
    pub hash: Vec<String>,
    pub r: Vec<String>,
    pub s: Vec<String>,
    pub recovery: String,
    pub expected_address: Vec<String>,
    pub mode: bool,
}

impl GeneratedTestCase {
    /// r || s || recovery id
    pub fn sig_tokens(&self) -> Vec<String> {
        let mut sig = Vec::with_capacity(SIGBYTES);
        sig.extend(self.r.iter().cloned());
        sig.extend(self.s.iter().cloned());
        sig.push(self.recovery.clone());
        sig
    }
}

/// Raw `D` value, checked against the policy. `index` is the 1-based test number.
pub fn recovery_value(index: usize, d: &str, policy: RecoveryIdPolicy) -> TranspileResult<u8> {
    let raw = to_u64(d)?
        .filter(|v| *v <= u8::MAX as u64)
        .ok_or_else(|| TranspileError::RecoveryIdOutOfRange { block: index, value: d.to_string() })?;

    if raw != RAW_RECID_EVEN && raw != RAW_RECID_ODD {
        match policy {
            RecoveryIdPolicy::Strict => {
                return Err(TranspileError::UnsupportedRecoveryId { block: index, value: raw });
            }
            RecoveryIdPolicy::PassThrough => {
                warn!(test = index, value = raw, "recovery id is not 27/28, passing it through");
            }
        }
    }
    Ok(raw as u8)
}

/// 27 -> 0x00, 28 -> 0x01, anything else unchanged.
pub fn canonical_recovery_id(raw: u8) -> u8 {
    match raw as u64 {
        RAW_RECID_EVEN => RECID_EVEN,
        RAW_RECID_ODD => RECID_ODD,
        _ => raw,
    }
}

fn warn_if_truncated(index: usize, field: &str, hex_str: &str, width: usize) -> TranspileResult<()> {
    if !fits_width(hex_str, width)? {
        warn!(test = index, field, width, "value wider than target, keeping low-order bytes");
    }
    Ok(())
}

pub fn build_test_case(
    index: usize,
    block: &CommittedBlock,
    opts: &EmitOptions,
) -> TranspileResult<GeneratedTestCase> {
    warn_if_truncated(index, "A", &block.hash, SCALARBYTES)?;
    warn_if_truncated(index, "B", &block.r, SCALARBYTES)?;
    warn_if_truncated(index, "C", &block.s, SCALARBYTES)?;
    warn_if_truncated(index, "expected", &block.expected, ADDRESSBYTES)?;

    let raw_v = recovery_value(index, &block.v, opts.recovery_id)?;

    let case = match opts.layout {
        OutputLayout::Bytes => {
            let expected_address = match opts.address_order {
                AddressOrder::BigEndian => be_byte_tokens(&block.expected, ADDRESSBYTES)?,
                AddressOrder::Reversed => address_byte_tokens(&block.expected, ADDRESSBYTES)?,
            };
            GeneratedTestCase {
                hash: be_byte_tokens(&block.hash, SCALARBYTES)?,
                r: be_byte_tokens(&block.r, SCALARBYTES)?,
                s: be_byte_tokens(&block.s, SCALARBYTES)?,
                recovery: byte_token(canonical_recovery_id(raw_v)),
                expected_address,
                mode: block.mode,
            }
        }
        OutputLayout::Limbs => {
            let limbs = |h: &str| -> TranspileResult<Vec<String>> {
                Ok(to_le_limbs(h, SCALARLIMBS)?.into_iter().map(limb_token).collect())
            };
            GeneratedTestCase {
                hash: limbs(&block.hash)?,
                r: limbs(&block.r)?,
                s: limbs(&block.s)?,
                recovery: raw_v.to_string(),
                expected_address: to_be_bytes(&block.expected, ADDRESSBYTES)?
                    .into_iter()
                    .map(byte_token_lower)
                    .collect(),
                mode: block.mode,
            }
        }
    };
    Ok(case)
}

pub fn render_test_case(index: usize, case: &GeneratedTestCase, opts: &EmitOptions) -> Vec<String> {
    let f = &opts.function_name;
    let mut out = vec![format!("// Test {}", index)];

    match opts.layout {
        OutputLayout::Bytes => {
            out.push(format!("let hash = [{}];", case.hash.join(", ")));
            out.push(format!("let sig = [{}];", case.sig_tokens().join(", ")));
            out.push(format!("let (addr, error_code) = {}(&sig, &hash, {});", f, case.mode));
        }
        OutputLayout::Limbs => {
            out.push(format!("let hash = [{}];", case.hash.join(", ")));
            out.push(format!("let r = [{}];", case.r.join(", ")));
            out.push(format!("let s = [{}];", case.s.join(", ")));
            out.push(format!("let v = {};", case.recovery));
            out.push(format!("let (addr, error_code) = {}(&hash, v, &r, &s, {});", f, case.mode));
        }
    }

    out.push(format!("let addr_expected = [{}];", case.expected_address.join(", ")));
    out.push(format!("assert_eq!(error_code, {});", SUCCESS_CODE));
    out.push("assert_eq!(addr, addr_expected);".to_string());
    out.push(String::new());
    out
}

/// All tests, numbered from 1 in block order.
///
/// Under `PassThrough` a block whose `D` does not fit in one byte is skipped
/// with a warning and numbering continues without it. Any other error (and
/// every recovery-id error under `Strict`) stops emission.
pub fn emit_tests(blocks: &[CommittedBlock], opts: &EmitOptions) -> TranspileResult<Vec<String>> {
    let mut lines = Vec::new();
    let mut index = 0;
    for block in blocks {
        let case = match build_test_case(index + 1, block, opts) {
            Ok(case) => case,
            Err(TranspileError::RecoveryIdOutOfRange { value, .. })
                if opts.recovery_id == RecoveryIdPolicy::PassThrough =>
            {
                warn!(recovery_id = %value, "recovery id does not fit in one byte, skipping block");
                continue;
            }
            Err(e) => return Err(e),
        };
        index += 1;
        lines.extend(render_test_case(index, &case, opts));
    }
    Ok(lines)
}

/// Renders everything first, so a failing block leaves the sink untouched.
pub fn write_tests<W: Write>(
    blocks: &[CommittedBlock],
    opts: &EmitOptions,
    sink: &mut W,
) -> TranspileResult<()> {
    for line in emit_tests(blocks, opts)? {
        writeln!(sink, "{}", line)?;
    }
    Ok(())
}

/// One line per block: index, mode, v, expected and the hash prefix.
pub fn summarize_blocks(blocks: &[CommittedBlock]) -> TranspileResult<Vec<String>> {
    blocks
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let hash = to_be_bytes(&b.hash, SCALARBYTES)?;
            Ok(format!(
                "{:>4}  mode={:<5}  v={}  expected={}  hash={}..",
                i + 1,
                b.mode,
                b.v,
                b.expected,
                hex::encode(&hash[..8])
            ))
        })
        .collect()
}
