//! Per-slot result tracking for batch generation and single-slot remakes.
//!
//! A [`SlotBoard`] owns the ordered result slots, the set of operations in
//! flight, and the [`ErrorSurface`]. It is mutated only through four
//! operations, each applied in one step:
//!
//! - [`start_batch`](SlotBoard::start_batch) / [`complete_batch`](SlotBoard::complete_batch)
//! - [`start_remake`](SlotBoard::start_remake) / [`complete_remake`](SlotBoard::complete_remake)
//!
//! Starting an operation hands out a move-only ticket that the matching
//! completion consumes, so every started operation completes at most once.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{GenerationError, ValidationError};
use crate::image::ImagePayload;
use crate::surface::{ErrorNotice, ErrorSurface};

/// Slot lifecycle: Empty -> Pending -> Ready/Failed.
///
/// Ready and Failed slots go back to Pending only through a remake of that
/// exact slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SlotStatus {
    Empty,
    Pending,
    Ready,
    Failed,
}

impl SlotStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SlotStatus::Empty => "empty",
            SlotStatus::Pending => "pending",
            SlotStatus::Ready => "ready",
            SlotStatus::Failed => "failed",
        }
    }
}

/// One mockup result, addressed by its display position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSlot {
    index: usize,
    status: SlotStatus,
    image: Option<ImagePayload>,
}

impl ResultSlot {
    fn empty(index: usize) -> Self {
        Self {
            index,
            status: SlotStatus::Empty,
            image: None,
        }
    }

    fn set_pending(&mut self) {
        self.status = SlotStatus::Pending;
        self.image = None;
    }

    fn set_ready(&mut self, image: ImagePayload) {
        self.status = SlotStatus::Ready;
        self.image = Some(image);
    }

    fn set_failed(&mut self) {
        self.status = SlotStatus::Failed;
        self.image = None;
    }

    /// 0-based display position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// 1-based position, as shown to users ("mockup #N").
    pub fn ordinal(&self) -> usize {
        self.index + 1
    }

    pub fn status(&self) -> SlotStatus {
        self.status
    }

    /// The generated image; present only when the slot is Ready.
    pub fn image(&self) -> Option<&ImagePayload> {
        self.image.as_ref()
    }

    /// Whether a request for this slot is in flight.
    pub fn is_busy(&self) -> bool {
        self.status == SlotStatus::Pending
    }
}

/// Proof that a batch was started. Consumed by [`SlotBoard::complete_batch`].
#[must_use = "a started batch must be completed"]
#[derive(Debug)]
pub struct BatchTicket {
    size: usize,
}

impl BatchTicket {
    /// Number of images the batch expects.
    pub fn size(&self) -> usize {
        self.size
    }
}

/// Proof that a remake was started. Consumed by [`SlotBoard::complete_remake`].
#[must_use = "a started remake must be completed"]
#[derive(Debug)]
pub struct RemakeTicket {
    index: usize,
}

impl RemakeTicket {
    /// Index of the slot being remade.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// What a successful remake did to its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemakeApplied {
    /// The slot now holds the new image.
    Replaced,
    /// The service returned nothing; the slot was restored as it was.
    Unchanged,
}

/// Ordered result slots plus in-flight bookkeeping and the current error.
#[derive(Debug, Default)]
pub struct SlotBoard {
    slots: Vec<ResultSlot>,
    batch_in_flight: bool,
    // Slot state captured at remake start, keyed by slot index.
    remakes: BTreeMap<usize, ResultSlot>,
    surface: ErrorSurface,
}

impl SlotBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[ResultSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&ResultSlot> {
        self.slots.get(index)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether a batch generation is in flight.
    pub fn is_generating(&self) -> bool {
        self.batch_in_flight
    }

    /// Indices of slots with a remake in flight, ascending.
    pub fn remakes_in_flight(&self) -> impl Iterator<Item = usize> + '_ {
        self.remakes.keys().copied()
    }

    /// True when nothing is in flight.
    pub fn is_idle(&self) -> bool {
        !self.batch_in_flight && self.remakes.is_empty()
    }

    pub fn error(&self) -> Option<&ErrorNotice> {
        self.surface.current()
    }

    /// Surface an instructive message for a trigger rejected before any
    /// operation started. Slots are not touched.
    pub fn reject(&mut self, message: impl Into<String>) {
        self.surface.record_validation(message);
    }

    /// Clear the current message without starting an operation.
    pub fn clear_error(&mut self) {
        self.surface.clear();
    }

    /// Whether a batch could start now, without changing anything.
    pub fn check_batch(&self) -> Result<(), ValidationError> {
        if self.batch_in_flight {
            return Err(ValidationError::BatchInFlight);
        }
        if !self.remakes.is_empty() {
            return Err(ValidationError::OperationsInFlight(self.remakes.len()));
        }
        Ok(())
    }

    /// Whether slot `index` could be remade now, without changing anything.
    pub fn check_remake(&self, index: usize) -> Result<(), ValidationError> {
        if self.batch_in_flight {
            return Err(ValidationError::BatchInFlight);
        }
        if self.remakes.contains_key(&index) {
            return Err(ValidationError::SlotBusy { index });
        }
        let slot = self.slots.get(index).ok_or(ValidationError::SlotOutOfRange {
            index,
            len: self.slots.len(),
        })?;
        if !matches!(slot.status, SlotStatus::Ready | SlotStatus::Failed) {
            return Err(ValidationError::SlotNotRemakeable { index });
        }
        Ok(())
    }

    /// Discard all slots and create `n` Pending ones.
    ///
    /// Rejected while a batch or any remake is in flight. Clears the current
    /// error message.
    pub fn start_batch(&mut self, n: usize) -> Result<BatchTicket, ValidationError> {
        self.check_batch()?;
        if n == 0 {
            return Err(ValidationError::InvalidCount(0));
        }

        self.surface.clear();
        self.slots = (0..n)
            .map(|i| {
                let mut slot = ResultSlot::empty(i);
                slot.set_pending();
                slot
            })
            .collect();
        self.batch_in_flight = true;
        Ok(BatchTicket { size: n })
    }

    /// Apply the outcome of a batch call.
    ///
    /// On success every slot becomes Ready with the image at its index. A
    /// failure, or a response whose length differs from the batch size,
    /// empties the board and records the global failure message. The error
    /// is handed back to the caller.
    pub fn complete_batch(
        &mut self,
        ticket: BatchTicket,
        outcome: Result<Vec<ImagePayload>, GenerationError>,
    ) -> Result<(), GenerationError> {
        self.batch_in_flight = false;

        let outcome = outcome.and_then(|images| {
            if images.len() == ticket.size {
                Ok(images)
            } else {
                Err(GenerationError::ShortResponse {
                    expected: ticket.size,
                    received: images.len(),
                })
            }
        });

        match outcome {
            Ok(images) => {
                for (slot, image) in self.slots.iter_mut().zip(images) {
                    slot.set_ready(image);
                }
                Ok(())
            }
            Err(e) => {
                self.slots.clear();
                self.surface.record_batch_failure();
                Err(e)
            }
        }
    }

    /// Mark slot `index` Pending for a remake.
    ///
    /// Rejected while a batch is in flight, when the slot already has a
    /// remake in flight, or when the slot is not Ready or Failed. Clears the
    /// current error message.
    pub fn start_remake(&mut self, index: usize) -> Result<RemakeTicket, ValidationError> {
        self.check_remake(index)?;
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ValidationError::SlotOutOfRange { index, len })?;

        self.surface.clear();
        self.remakes.insert(index, slot.clone());
        slot.set_pending();
        Ok(RemakeTicket { index })
    }

    /// Apply the outcome of a remake call to its slot only.
    ///
    /// The first returned image replaces the slot. An empty success restores
    /// the slot to its state before the remake. A failure marks the slot
    /// Failed and records a message naming the slot's ordinal.
    pub fn complete_remake(
        &mut self,
        ticket: RemakeTicket,
        outcome: Result<Vec<ImagePayload>, GenerationError>,
    ) -> Result<RemakeApplied, GenerationError> {
        let index = ticket.index;
        let previous = self.remakes.remove(&index);
        let Some(slot) = self.slots.get_mut(index) else {
            return Ok(RemakeApplied::Unchanged);
        };

        match outcome {
            Ok(images) => match images.into_iter().next() {
                Some(image) => {
                    slot.set_ready(image);
                    Ok(RemakeApplied::Replaced)
                }
                None => {
                    if let Some(previous) = previous {
                        *slot = previous;
                    }
                    Ok(RemakeApplied::Unchanged)
                }
            },
            Err(e) => {
                slot.set_failed();
                self.surface.record_remake_failure(index);
                Err(e)
            }
        }
    }

    /// Roll back a batch whose call will never complete.
    ///
    /// The board empties and no message is recorded. Returns `false` when no
    /// batch was in flight.
    pub fn abandon_batch(&mut self) -> bool {
        if !self.batch_in_flight {
            return false;
        }
        self.batch_in_flight = false;
        self.slots.clear();
        true
    }

    /// Roll back a remake whose call will never complete, restoring slot
    /// `index` to its state before the remake. Returns `false` when no remake
    /// of that slot was in flight.
    pub fn abandon_remake(&mut self, index: usize) -> bool {
        let Some(previous) = self.remakes.remove(&index) else {
            return false;
        };
        if let Some(slot) = self.slots.get_mut(index) {
            *slot = previous;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{ErrorScope, GLOBAL_FAILURE_MESSAGE};

    fn img(tag: &str) -> ImagePayload {
        ImagePayload::new(tag, "image/png")
    }

    fn ready_board(tags: &[&str]) -> SlotBoard {
        let mut board = SlotBoard::new();
        let ticket = board.start_batch(tags.len()).unwrap();
        board
            .complete_batch(ticket, Ok(tags.iter().map(|t| img(t)).collect()))
            .unwrap();
        board
    }

    fn statuses(board: &SlotBoard) -> Vec<SlotStatus> {
        board.slots().iter().map(|s| s.status()).collect()
    }

    #[test]
    fn test_start_batch_creates_pending_slots() {
        let mut board = SlotBoard::new();
        let ticket = board.start_batch(3).unwrap();
        assert_eq!(ticket.size(), 3);
        assert_eq!(statuses(&board), vec![SlotStatus::Pending; 3]);
        assert!(board.slots().iter().all(|s| s.is_busy() && s.image().is_none()));
        assert!(board.is_generating());
    }

    #[test]
    fn test_start_batch_zero_rejected() {
        let mut board = SlotBoard::new();
        assert_eq!(
            board.start_batch(0).unwrap_err(),
            ValidationError::InvalidCount(0)
        );
        assert!(board.is_idle());
    }

    #[test]
    fn test_second_batch_rejected_while_in_flight() {
        let mut board = SlotBoard::new();
        let _ticket = board.start_batch(2).unwrap();
        assert_eq!(
            board.start_batch(2).unwrap_err(),
            ValidationError::BatchInFlight
        );
    }

    #[test]
    fn test_complete_batch_in_order() {
        let board = ready_board(&["A", "B", "C"]);
        assert!(!board.is_generating());
        for (slot, tag) in board.slots().iter().zip(["A", "B", "C"]) {
            assert_eq!(slot.status(), SlotStatus::Ready);
            assert_eq!(slot.image().unwrap().base64(), tag);
        }
    }

    #[test]
    fn test_complete_batch_failure_clears_slots() {
        let mut board = SlotBoard::new();
        let ticket = board.start_batch(4).unwrap();
        let err = board
            .complete_batch(ticket, Err(GenerationError::Rejected("quota".into())))
            .unwrap_err();
        assert!(matches!(err, GenerationError::Rejected(_)));
        assert!(board.is_empty());
        let notice = board.error().unwrap();
        assert_eq!(notice.scope, ErrorScope::Global);
        assert_eq!(notice.message, GLOBAL_FAILURE_MESSAGE);
        assert!(board.is_idle());
    }

    #[test]
    fn test_short_batch_treated_as_failure() {
        let mut board = SlotBoard::new();
        let ticket = board.start_batch(4).unwrap();
        let err = board
            .complete_batch(ticket, Ok(vec![img("A"), img("B")]))
            .unwrap_err();
        assert!(matches!(
            err,
            GenerationError::ShortResponse {
                expected: 4,
                received: 2
            }
        ));
        assert!(board.is_empty());
        assert!(board.error().is_some());
    }

    #[test]
    fn test_remake_replaces_only_target() {
        let mut board = ready_board(&["A", "B", "C", "D"]);
        let before = board.slots().to_vec();

        let ticket = board.start_remake(2).unwrap();
        assert_eq!(
            statuses(&board),
            vec![
                SlotStatus::Ready,
                SlotStatus::Ready,
                SlotStatus::Pending,
                SlotStatus::Ready
            ]
        );

        let applied = board.complete_remake(ticket, Ok(vec![img("E")])).unwrap();
        assert_eq!(applied, RemakeApplied::Replaced);
        assert_eq!(board.slot(2).unwrap().image().unwrap().base64(), "E");
        for i in [0, 1, 3] {
            assert_eq!(board.slot(i), before.get(i));
        }
    }

    #[test]
    fn test_remake_failure_marks_only_target() {
        let mut board = ready_board(&["A", "B", "C"]);
        let before = board.slots().to_vec();

        let ticket = board.start_remake(1).unwrap();
        board
            .complete_remake(ticket, Err(GenerationError::Rejected("policy".into())))
            .unwrap_err();

        let slot = board.slot(1).unwrap();
        assert_eq!(slot.status(), SlotStatus::Failed);
        assert!(slot.image().is_none());
        assert_eq!(board.slot(0), before.first());
        assert_eq!(board.slot(2), before.get(2));

        let notice = board.error().unwrap();
        assert_eq!(notice.scope, ErrorScope::Slot(1));
        assert!(notice.message.contains("#2"));
    }

    #[test]
    fn test_empty_remake_restores_previous() {
        let mut board = ready_board(&["A", "B"]);
        let before = board.slots().to_vec();

        let ticket = board.start_remake(0).unwrap();
        let applied = board.complete_remake(ticket, Ok(vec![])).unwrap();
        assert_eq!(applied, RemakeApplied::Unchanged);
        assert_eq!(board.slots(), before.as_slice());
    }

    #[test]
    fn test_failed_slot_can_be_remade() {
        let mut board = ready_board(&["A"]);
        let ticket = board.start_remake(0).unwrap();
        let _ = board.complete_remake(ticket, Err(GenerationError::Rejected("x".into())));

        let ticket = board.start_remake(0).unwrap();
        assert!(board.error().is_none());
        board.complete_remake(ticket, Ok(vec![img("Z")])).unwrap();
        assert_eq!(board.slot(0).unwrap().status(), SlotStatus::Ready);
    }

    #[test]
    fn test_double_remake_rejected() {
        let mut board = ready_board(&["A", "B"]);
        let ticket = board.start_remake(1).unwrap();
        assert_eq!(
            board.start_remake(1).unwrap_err(),
            ValidationError::SlotBusy { index: 1 }
        );
        assert_eq!(board.remakes_in_flight().collect::<Vec<_>>(), vec![1]);

        board.complete_remake(ticket, Ok(vec![img("C")])).unwrap();
        assert_eq!(board.slot(1).unwrap().image().unwrap().base64(), "C");
        assert!(board.is_idle());
    }

    #[test]
    fn test_concurrent_remakes_on_different_slots() {
        let mut board = ready_board(&["A", "B", "C"]);
        let t0 = board.start_remake(0).unwrap();
        let t2 = board.start_remake(2).unwrap();

        let _ = board.complete_remake(t2, Err(GenerationError::Rejected("x".into())));
        assert_eq!(board.slot(0).unwrap().status(), SlotStatus::Pending);

        board.complete_remake(t0, Ok(vec![img("D")])).unwrap();
        assert_eq!(
            statuses(&board),
            vec![SlotStatus::Ready, SlotStatus::Ready, SlotStatus::Failed]
        );
    }

    #[test]
    fn test_remake_rejected_during_batch() {
        let mut board = ready_board(&["A"]);
        let _batch = board.start_batch(1).unwrap();
        assert_eq!(
            board.start_remake(0).unwrap_err(),
            ValidationError::BatchInFlight
        );
    }

    #[test]
    fn test_batch_rejected_during_remake() {
        let mut board = ready_board(&["A", "B"]);
        let _remake = board.start_remake(0).unwrap();
        assert_eq!(
            board.start_batch(2).unwrap_err(),
            ValidationError::OperationsInFlight(1)
        );
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_remake_out_of_range_and_pending() {
        let mut board = SlotBoard::new();
        assert_eq!(
            board.start_remake(0).unwrap_err(),
            ValidationError::SlotOutOfRange { index: 0, len: 0 }
        );

        let _batch = board.start_batch(1).unwrap();
        board.batch_in_flight = false;
        assert_eq!(
            board.start_remake(0).unwrap_err(),
            ValidationError::SlotNotRemakeable { index: 0 }
        );
    }

    #[test]
    fn test_abandon_batch_frees_the_board() {
        let mut board = SlotBoard::new();
        let _ticket = board.start_batch(3).unwrap();
        assert!(board.abandon_batch());
        assert!(board.is_idle());
        assert!(board.is_empty());
        assert!(board.error().is_none());
        assert!(!board.abandon_batch());

        let ticket = board.start_batch(2).unwrap();
        board
            .complete_batch(ticket, Ok(vec![img("A"), img("B")]))
            .unwrap();
        assert_eq!(statuses(&board), vec![SlotStatus::Ready; 2]);
    }

    #[test]
    fn test_abandon_remake_restores_slot() {
        let mut board = ready_board(&["A", "B"]);
        let before = board.slots().to_vec();

        let _ticket = board.start_remake(1).unwrap();
        assert!(board.abandon_remake(1));
        assert_eq!(board.slots(), before.as_slice());
        assert!(board.is_idle());
        assert!(!board.abandon_remake(1));

        let ticket = board.start_remake(1).unwrap();
        board.complete_remake(ticket, Ok(vec![img("C")])).unwrap();
        assert_eq!(board.slot(1).unwrap().image().unwrap().base64(), "C");
    }

    #[test]
    fn test_starting_clears_error() {
        let mut board = SlotBoard::new();
        board.reject("missing inputs");
        assert!(board.error().is_some());
        let _ticket = board.start_batch(1).unwrap();
        assert!(board.error().is_none());
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(SlotStatus::Pending.as_str(), "pending");
        assert_eq!(
            serde_json::to_string(&SlotStatus::Failed).unwrap(),
            "\"failed\""
        );
    }
}
