// ecrecover test-vector widths and sentinels (secp256k1 / Ethereum address)

pub const SCALARBYTES: usize = 32; // hash, r, s
pub const ADDRESSBYTES: usize = 20;
pub const RECIDBYTES: usize = 1;

pub const SIGBYTES: usize = 2 * SCALARBYTES + RECIDBYTES; // 65

// u64 limbs per 256-bit scalar (limb layout)
pub const SCALARLIMBS: usize = SCALARBYTES / 8; // 4

// "0x" + 40 hex digits
pub const MAX_EXPECTED_HEX_LEN: usize = 2 + 2 * ADDRESSBYTES; // 42

// Ethereum-style v values and their canonical recovery ids
pub const RAW_RECID_EVEN: u64 = 27;
pub const RAW_RECID_ODD: u64 = 28;
pub const RECID_EVEN: u8 = 0x00;
pub const RECID_ODD: u8 = 0x01;

pub const SUCCESS_CODE: u8 = 0;

pub const DEFAULT_FUNCTION: &str = "ecrecover";
pub const DEFAULT_INPUT: &str = "tmp/ecrecover_test.zkasm";

// routine markers on :CALL lines
pub const PRECOMPILED_MARKER: &str = "ecrecover_precompiled";
pub const TX_MARKER: &str = "ecrecover_tx";
