pub mod vector_params;
pub mod error;

pub mod line_class;
pub mod scalar_codec;
pub mod block_scanner;
pub mod test_emitter;


pub use block_scanner::{scan_lines, scan_text, CommittedBlock};
pub use error::{TranspileError, TranspileResult};
pub use test_emitter::{emit_tests, EmitOptions};

/// Trace text -> generated test source lines.
pub fn transpile(text: &str, opts: &EmitOptions) -> TranspileResult<Vec<String>> {
    let blocks = scan_text(text);
    emit_tests(&blocks, opts)
}
