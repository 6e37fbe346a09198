//! Restore sorted order to a nearly sorted record stream
//!

use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

/// Records which can be ordered by a reordering buffer
///
pub trait ReorderRecord {
    fn reference_name(&self) -> &str;
    fn position(&self) -> i64;
}

pub type RecordComparator<'a, T> = Box<dyn Fn(&T, &T) -> Ordering + 'a>;
pub type RecordSink<'a, T> = Box<dyn FnMut(T) + 'a>;

/// Bounded window buffer which emits records in sorted order
///
/// Records on each reference are accepted up to `window` positions behind the highest position
/// seen so far. A record further out of order than this, or a record for a reference which has
/// already been completed, is passed to the failure sink and never emitted.
///
/// Records are grouped by reference in the order references are first observed. When a record
/// from a new reference is added, all buffered records are emitted first.
///
pub struct ReorderingBuffer<'a, T: ReorderRecord> {
    window: i64,
    compare: RecordComparator<'a, T>,
    emit: RecordSink<'a, T>,
    failure: RecordSink<'a, T>,

    /// Sorted pending records for the current reference
    buffer: VecDeque<T>,

    current_reference: Option<String>,
    high_water_position: i64,
    completed_references: HashSet<String>,
    failure_count: usize,
}

impl<'a, T: ReorderRecord> ReorderingBuffer<'a, T> {
    pub fn new(
        window: i64,
        compare: RecordComparator<'a, T>,
        emit: RecordSink<'a, T>,
        failure: RecordSink<'a, T>,
    ) -> Self {
        assert!(window >= 0, "Invalid reordering window: {window}");
        Self {
            window,
            compare,
            emit,
            failure,
            buffer: VecDeque::new(),
            current_reference: None,
            high_water_position: i64::MIN,
            completed_references: HashSet::new(),
            failure_count: 0,
        }
    }

    pub fn failure_count(&self) -> usize {
        self.failure_count
    }

    fn fail(&mut self, record: T) {
        self.failure_count += 1;
        (self.failure)(record);
    }

    fn drain_all(&mut self) {
        while let Some(record) = self.buffer.pop_front() {
            (self.emit)(record);
        }
    }

    /// Emit all buffered records which are more than `window` positions behind the high-water mark
    fn drain_window(&mut self) {
        let min_retained_pos = self.high_water_position.saturating_sub(self.window);
        while let Some(front) = self.buffer.front() {
            if front.position() >= min_retained_pos {
                break;
            }
            if let Some(record) = self.buffer.pop_front() {
                (self.emit)(record);
            }
        }
    }

    pub fn add(&mut self, record: T) {
        let is_new_reference = self.current_reference.as_deref() != Some(record.reference_name());
        if is_new_reference {
            if self.completed_references.contains(record.reference_name()) {
                self.fail(record);
                return;
            }
            self.drain_all();
            if let Some(reference) = self.current_reference.take() {
                self.completed_references.insert(reference);
            }
            self.current_reference = Some(record.reference_name().to_string());
            self.high_water_position = record.position();
        } else if record.position() < self.high_water_position.saturating_sub(self.window) {
            self.fail(record);
            return;
        }

        self.high_water_position = std::cmp::max(self.high_water_position, record.position());
        let compare = &self.compare;
        let index = self
            .buffer
            .partition_point(|x| compare(x, &record) != Ordering::Greater);
        self.buffer.insert(index, record);
        self.drain_window();
    }

    /// Emit all remaining records and return the total failure count
    ///
    pub fn close(mut self) -> usize {
        self.drain_all();
        self.failure_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug)]
    struct TestRecord {
        chrom: &'static str,
        pos: i64,
    }

    impl ReorderRecord for TestRecord {
        fn reference_name(&self) -> &str {
            self.chrom
        }

        fn position(&self) -> i64 {
            self.pos
        }
    }

    fn rec(chrom: &'static str, pos: i64) -> TestRecord {
        TestRecord { chrom, pos }
    }

    #[test]
    fn test_reorder() {
        let emitted = RefCell::new(Vec::new());
        let failed = RefCell::new(Vec::new());
        let mut buffer = ReorderingBuffer::new(
            5,
            Box::new(|a: &TestRecord, b: &TestRecord| a.pos.cmp(&b.pos)),
            Box::new(|x: TestRecord| emitted.borrow_mut().push(x.pos)),
            Box::new(|x: TestRecord| failed.borrow_mut().push(x.pos)),
        );

        for pos in [10, 12, 11, 15, 13] {
            buffer.add(rec("chr1", pos));
        }
        assert!(emitted.borrow().is_empty());

        buffer.add(rec("chr1", 2));
        assert_eq!(buffer.failure_count(), 1);

        let failure_count = buffer.close();
        assert_eq!(failure_count, 1);
        assert_eq!(*emitted.borrow(), vec![10, 11, 12, 13, 15]);
        assert_eq!(*failed.borrow(), vec![2]);
    }

    #[test]
    fn test_window_emission() {
        let emitted = RefCell::new(Vec::new());
        let mut buffer = ReorderingBuffer::new(
            5,
            Box::new(|a: &TestRecord, b: &TestRecord| a.pos.cmp(&b.pos)),
            Box::new(|x: TestRecord| emitted.borrow_mut().push(x.pos)),
            Box::new(|_: TestRecord| {}),
        );

        for pos in [10, 12, 11, 17] {
            buffer.add(rec("chr1", pos));
        }
        assert_eq!(*emitted.borrow(), vec![10, 11]);

        // Exactly at the window edge is still accepted
        buffer.add(rec("chr1", 12));
        assert_eq!(buffer.close(), 0);
        assert_eq!(*emitted.borrow(), vec![10, 11, 12, 12, 17]);
    }

    #[test]
    fn test_reference_change() {
        let emitted = RefCell::new(Vec::new());
        let mut buffer = ReorderingBuffer::new(
            100,
            Box::new(|a: &TestRecord, b: &TestRecord| a.pos.cmp(&b.pos)),
            Box::new(|x: TestRecord| emitted.borrow_mut().push((x.chrom, x.pos))),
            Box::new(|_: TestRecord| {}),
        );

        buffer.add(rec("chr1", 50));
        buffer.add(rec("chr1", 20));
        buffer.add(rec("chr2", 5));
        assert_eq!(*emitted.borrow(), vec![("chr1", 20), ("chr1", 50)]);

        // Records for a completed reference are rejected
        buffer.add(rec("chr1", 60));
        assert_eq!(buffer.failure_count(), 1);

        assert_eq!(buffer.close(), 1);
        assert_eq!(
            *emitted.borrow(),
            vec![("chr1", 20), ("chr1", 50), ("chr2", 5)]
        );
    }
}
