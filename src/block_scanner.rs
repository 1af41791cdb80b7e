//! Block accumulator: folds classified lines into committed test blocks.
//!
//! A block runs until a blank line or the end of input. At that boundary it
//! is committed only if it saw exactly one assertion and carries every
//! required field (A, B, C, D, mode, expected). Anything else is dropped
//! without an error.

use std::fmt;

use tracing::debug;

use crate::line_class::{classify_line, LineClass, Slot};
use crate::vector_params::MAX_EXPECTED_HEX_LEN;

/// Fields collected since the last boundary. Later assignments to the same
/// slot overwrite earlier ones.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PendingBlock {
    pub a: Option<String>,
    pub b: Option<String>,
    pub c: Option<String>,
    pub d: Option<String>,
    pub mode: Option<bool>,
    pub expected: Option<String>,
    pub assertion_count: usize,
}

/// A block that passed the validity check. Hex fields keep their `0x` prefix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedBlock {
    /// A: message hash
    pub hash: String,
    /// B: signature r
    pub r: String,
    /// C: signature s
    pub s: String,
    /// D: raw recovery id (27/28)
    pub v: String,
    /// true for the precompiled routine, false for the tx routine
    pub mode: bool,
    pub expected: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropReason {
    AssertionCount(usize),
    MissingFields(Vec<&'static str>),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::AssertionCount(n) => write!(f, "{} assertions (need exactly 1)", n),
            DropReason::MissingFields(fields) => write!(f, "missing {}", fields.join(", ")),
        }
    }
}

impl PendingBlock {
    pub fn set_slot(&mut self, slot: Slot, hex_value: String) {
        let field = match slot {
            Slot::A => &mut self.a,
            Slot::B => &mut self.b,
            Slot::C => &mut self.c,
            Slot::D => &mut self.d,
        };
        *field = Some(hex_value);
    }

    /// Counts the assertion; only the first one (and only if address-sized)
    /// provides `expected`.
    pub fn record_assertion(&mut self, hex_value: String) {
        self.assertion_count += 1;
        if self.assertion_count == 1 && hex_value.len() <= MAX_EXPECTED_HEX_LEN {
            self.expected = Some(hex_value);
        }
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            (self.a.is_some(), "A"),
            (self.b.is_some(), "B"),
            (self.c.is_some(), "C"),
            (self.d.is_some(), "D"),
            (self.expected.is_some(), "expected"),
            (self.mode.is_some(), "mode"),
        ]
        .into_iter()
        .filter_map(|(present, name)| (!present).then_some(name))
        .collect()
    }

    pub fn commit(self) -> Result<CommittedBlock, DropReason> {
        if self.assertion_count != 1 {
            return Err(DropReason::AssertionCount(self.assertion_count));
        }
        let missing = self.missing_fields();

        match self {
            PendingBlock {
                a: Some(hash),
                b: Some(r),
                c: Some(s),
                d: Some(v),
                mode: Some(mode),
                expected: Some(expected),
                ..
            } => Ok(CommittedBlock { hash, r, s, v, mode, expected }),
            _ => Err(DropReason::MissingFields(missing)),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    Empty,
    Accumulating(PendingBlock),
}

impl ScanState {
    fn into_pending(self) -> PendingBlock {
        match self {
            ScanState::Empty => PendingBlock::default(),
            ScanState::Accumulating(p) => p,
        }
    }

    /// Commit check at a boundary (blank line or end of input).
    pub fn close(self) -> Option<Result<CommittedBlock, DropReason>> {
        match self {
            ScanState::Empty => None,
            ScanState::Accumulating(p) => Some(p.commit()),
        }
    }
}

/// One transition of the scanner. Returns the next state and, on a blank
/// line, the outcome of the commit check for the block it closed.
pub fn step(
    state: ScanState,
    line: LineClass,
) -> (ScanState, Option<Result<CommittedBlock, DropReason>>) {
    match line {
        LineClass::Blank => (ScanState::Empty, state.close()),
        LineClass::HexAssignment { hex_value, slot: Some(slot) } => {
            let mut p = state.into_pending();
            p.set_slot(slot, hex_value);
            (ScanState::Accumulating(p), None)
        }
        LineClass::CallInvocation { precompiled } => {
            let mut p = state.into_pending();
            p.mode = Some(precompiled);
            (ScanState::Accumulating(p), None)
        }
        LineClass::AssertionLine { hex_value } => {
            let mut p = state.into_pending();
            p.record_assertion(hex_value);
            (ScanState::Accumulating(p), None)
        }
        LineClass::HexAssignment { slot: None, .. } | LineClass::Other => (state, None),
    }
}

/// Line-at-a-time driver around [`step`], for streaming input.
#[derive(Debug, Default)]
pub struct BlockScanner {
    state: ScanState,
    line_no: usize,
    committed: usize,
    dropped: usize,
}

impl BlockScanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn committed(&self) -> usize {
        self.committed
    }

    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn settle(
        &mut self,
        outcome: Option<Result<CommittedBlock, DropReason>>,
    ) -> Option<CommittedBlock> {
        match outcome? {
            Ok(block) => {
                self.committed += 1;
                debug!(line = self.line_no, index = self.committed, "committed block");
                Some(block)
            }
            Err(reason) => {
                self.dropped += 1;
                debug!(line = self.line_no, %reason, "dropped block");
                None
            }
        }
    }

    pub fn push_line(&mut self, line: &str) -> Option<CommittedBlock> {
        self.line_no += 1;
        let state = std::mem::take(&mut self.state);
        let (next, outcome) = step(state, classify_line(line));
        self.state = next;
        self.settle(outcome)
    }

    /// End of input: the last block does not need a trailing blank line.
    pub fn finish(&mut self) -> Option<CommittedBlock> {
        let state = std::mem::take(&mut self.state);
        let outcome = state.close();
        self.settle(outcome)
    }
}

pub fn scan_lines<I, S>(lines: I) -> Vec<CommittedBlock>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut scanner = BlockScanner::new();
    let mut blocks: Vec<CommittedBlock> = lines
        .into_iter()
        .filter_map(|line| scanner.push_line(line.as_ref()))
        .collect();
    blocks.extend(scanner.finish());

    debug!(committed = scanner.committed(), dropped = scanner.dropped(), "scan finished");
    blocks
}

pub fn scan_text(text: &str) -> Vec<CommittedBlock> {
    scan_lines(text.lines())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_pending() -> PendingBlock {
        PendingBlock {
            a: Some("0xaa".into()),
            b: Some("0xbb".into()),
            c: Some("0xcc".into()),
            d: Some("0x1b".into()),
            mode: Some(false),
            expected: Some("0xdd".into()),
            assertion_count: 1,
        }
    }

    fn hex(slot: Slot, v: &str) -> LineClass {
        LineClass::HexAssignment { hex_value: v.into(), slot: Some(slot) }
    }

    #[test]
    fn complete_block_commits() {
        let block = full_pending().commit().unwrap();
        assert_eq!(block.hash, "0xaa");
        assert_eq!(block.v, "0x1b");
        assert!(!block.mode);
        assert_eq!(block.expected, "0xdd");
    }

    #[test]
    fn any_single_missing_field_drops_block() {
        let clears: [fn(&mut PendingBlock); 6] = [
            |p| p.a = None,
            |p| p.b = None,
            |p| p.c = None,
            |p| p.d = None,
            |p| p.mode = None,
            |p| p.expected = None,
        ];
        let names = ["A", "B", "C", "D", "mode", "expected"];

        for (clear, name) in clears.iter().zip(names) {
            let mut p = full_pending();
            clear(&mut p);
            assert_eq!(
                p.commit(),
                Err(DropReason::MissingFields(vec![name])),
                "block without {} should be dropped",
                name
            );
        }
    }

    #[test]
    fn missing_fields_listed_in_slot_order() {
        let p = PendingBlock { b: Some("0xbb".into()), mode: Some(true), ..Default::default() };
        assert_eq!(p.missing_fields(), ["A", "C", "D", "expected"]);
        assert!(full_pending().missing_fields().is_empty());
    }

    #[test]
    fn assertion_count_must_be_exactly_one() {
        let mut p = full_pending();
        p.assertion_count = 0;
        assert_eq!(p.commit(), Err(DropReason::AssertionCount(0)));

        let mut p = full_pending();
        p.assertion_count = 2;
        assert_eq!(p.commit(), Err(DropReason::AssertionCount(2)));
    }

    #[test]
    fn step_on_blank_closes_block() {
        let state = ScanState::Accumulating(full_pending());
        let (next, outcome) = step(state, LineClass::Blank);
        assert_eq!(next, ScanState::Empty);
        assert!(matches!(outcome, Some(Ok(_))));

        let (next, outcome) = step(ScanState::Empty, LineClass::Blank);
        assert_eq!(next, ScanState::Empty);
        assert!(outcome.is_none());
    }

    #[test]
    fn step_ignores_other_and_unknown_slots() {
        let state = ScanState::Accumulating(full_pending());
        let (next, _) = step(state.clone(), LineClass::Other);
        assert_eq!(next, state);

        let unknown = LineClass::HexAssignment { hex_value: "0x1".into(), slot: None };
        let (next, _) = step(ScanState::Empty, unknown);
        assert_eq!(next, ScanState::Empty);
    }

    #[test]
    fn last_assignment_wins() {
        let mut state = ScanState::Empty;
        for line in [hex(Slot::A, "0x01"), hex(Slot::A, "0x02"), hex(Slot::A, "0x03")] {
            state = step(state, line).0;
        }
        match state {
            ScanState::Accumulating(p) => assert_eq!(p.a.as_deref(), Some("0x03")),
            ScanState::Empty => panic!("expected accumulating state"),
        }
    }

    #[test]
    fn first_assertion_sets_expected() {
        let mut p = PendingBlock::default();
        p.record_assertion("0x11".into());
        p.record_assertion("0x22".into());
        assert_eq!(p.expected.as_deref(), Some("0x11"));
        assert_eq!(p.assertion_count, 2);
    }

    #[test]
    fn oversized_expected_is_counted_but_not_stored() {
        let mut p = PendingBlock::default();
        let long = format!("0x{}", "f".repeat(41));
        p.record_assertion(long);
        assert_eq!(p.assertion_count, 1);
        assert!(p.expected.is_none());

        let mut p = PendingBlock::default();
        let fits = format!("0x{}", "f".repeat(40));
        p.record_assertion(fits.clone());
        assert_eq!(p.expected, Some(fits));
    }

    #[test]
    fn mode_follows_last_call() {
        let mut state = ScanState::Empty;
        state = step(state, LineClass::CallInvocation { precompiled: true }).0;
        state = step(state, LineClass::CallInvocation { precompiled: false }).0;
        match state {
            ScanState::Accumulating(p) => assert_eq!(p.mode, Some(false)),
            ScanState::Empty => panic!("expected accumulating state"),
        }
    }

    #[test]
    fn scanner_commits_final_block_without_blank() {
        let text = "0xaa => A\n0xbb => B\n0xcc => C\n0x1b => D\n:CALL(ecrecover_tx)\n0xdd :ASSERT";
        let blocks = scan_text(text);
        assert_eq!(blocks.len(), 1);
        assert!(!blocks[0].mode);
    }

    #[test]
    fn scanner_counts_committed_and_dropped() {
        let mut scanner = BlockScanner::new();
        let lines = [
            "0xaa => A", "0xbb => B", "0xcc => C", "0x1b => D",
            ":CALL(ecrecover_precompiled)", "0xdd : ASSERT", "",
            "0xaa => A", "0x1 : ASSERT", "",
            "",
        ];
        let got: Vec<_> = lines.iter().filter_map(|l| scanner.push_line(l)).collect();
        assert!(scanner.finish().is_none());
        assert_eq!(got.len(), 1);
        assert_eq!(scanner.committed(), 1);
        assert_eq!(scanner.dropped(), 1);
    }
}
