//! In-place editing of streamed resource (`.resS`) bundle entries
//!
//! Rewriting the objects of a bundle usually moves their bulk data as well.
//! The manipulator tracks which parts of the original resource payload have
//! been carried over, collects the new payload, and only swaps it into the
//! entry once every original byte is accounted for.

use crate::bundle::BundleEntry;
use crate::error::{BinaryError, Result};
use crate::stream::Stream;
use tracing::debug;

/// Alignment of ranges and of appended data
const RESOURCE_ALIGNMENT: usize = 2;

pub struct StreamedResourceManipulator<'a> {
    entry: &'a mut BundleEntry,
    /// Sorted, disjoint `[start, end)` ranges of the original payload
    unconsumed: Vec<(usize, usize)>,
    replacement: Option<Stream>,
}

impl<'a> StreamedResourceManipulator<'a> {
    pub fn new(entry: &'a mut BundleEntry) -> Self {
        let unconsumed = whole_payload(&entry.data);
        Self {
            entry,
            unconsumed,
            replacement: None,
        }
    }

    /// View of the original payload
    pub fn original_view(&self, offset: usize, size: usize) -> Result<Stream> {
        self.entry.data.create_view(offset, size)
    }

    /// Ranges of the original payload not yet consumed
    pub fn unconsumed_ranges(&self) -> &[(usize, usize)] {
        &self.unconsumed
    }

    /// Mark `offset..offset + size` of the original payload as carried over.
    ///
    /// The range is widened to even boundaries. Every byte in it must still
    /// be unconsumed.
    pub fn consume_range(&mut self, offset: usize, size: usize) -> Result<()> {
        let length = self.entry.data.len();
        let end = offset
            .checked_add(size)
            .filter(|&end| end <= length)
            .ok_or_else(|| {
                BinaryError::out_of_range(format!(
                    "range {}+{} exceeds resource of {} bytes",
                    offset, size, length
                ))
            })?;

        let start = offset & !(RESOURCE_ALIGNMENT - 1);
        let end = (end + RESOURCE_ALIGNMENT - 1) & !(RESOURCE_ALIGNMENT - 1);
        let end = end.min(length);

        let position = self
            .unconsumed
            .iter()
            .position(|&(range_start, range_end)| range_start <= start && end <= range_end)
            .ok_or_else(|| {
                BinaryError::invalid_data(format!(
                    "resource range {}..{} is already consumed",
                    start, end
                ))
            })?;

        let (range_start, range_end) = self.unconsumed[position];
        let remainder: Vec<(usize, usize)> = [(range_start, start), (end, range_end)]
            .into_iter()
            .filter(|(from, to)| from < to)
            .collect();
        self.unconsumed.splice(position..=position, remainder);
        Ok(())
    }

    /// Append data to the replacement payload; returns its offset there
    pub fn add_new_data(&mut self, data: &[u8]) -> Result<usize> {
        let stream = self.replacement.get_or_insert_with(Stream::new);
        let offset = stream.len();
        stream.set_position(offset)?;
        stream.write_data(data)?;
        stream.align_position(RESOURCE_ALIGNMENT)?;
        Ok(offset)
    }

    /// Swap the replacement payload into the entry.
    ///
    /// Returns `false` when no new data was added. Fails while any part of
    /// the original payload is unconsumed.
    pub fn finalize(&mut self) -> Result<bool> {
        let Some(mut replacement) = self.replacement.take() else {
            return Ok(false);
        };
        if let Some(&(start, end)) = self.unconsumed.first() {
            let remaining = self.unconsumed.len();
            self.replacement = Some(replacement);
            return Err(BinaryError::invalid_data(format!(
                "{} unconsumed resource ranges remain, first {}..{}",
                remaining, start, end
            )));
        }

        replacement.set_position(0)?;
        debug!(
            entry = %self.entry.name,
            old_size = self.entry.data.len(),
            new_size = replacement.len(),
            "streamed resource replaced"
        );
        self.entry.replace_data(replacement);
        self.unconsumed = whole_payload(&self.entry.data);
        Ok(true)
    }
}

fn whole_payload(data: &Stream) -> Vec<(usize, usize)> {
    if data.is_empty() {
        Vec::new()
    } else {
        vec![(0, data.len())]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry() -> BundleEntry {
        BundleEntry::new("CAB-1.resS", Stream::from_vec((0u8..10).collect()))
    }

    #[test]
    fn test_consume_splits_ranges() {
        let mut entry = entry();
        let mut manipulator = StreamedResourceManipulator::new(&mut entry);
        manipulator.consume_range(3, 2).unwrap();
        assert_eq!(manipulator.unconsumed_ranges(), &[(0, 2), (6, 10)]);

        // Overlaps the consumed 2..6
        assert!(manipulator.consume_range(5, 2).is_err());
        manipulator.consume_range(0, 2).unwrap();
        manipulator.consume_range(6, 4).unwrap();
        assert!(manipulator.unconsumed_ranges().is_empty());
        assert!(manipulator.consume_range(11, 1).is_err());
    }

    #[test]
    fn test_odd_length_tail() {
        let mut entry = BundleEntry::new("CAB-2.resS", Stream::from_vec(vec![7; 5]));
        let mut manipulator = StreamedResourceManipulator::new(&mut entry);
        manipulator.consume_range(0, 5).unwrap();
        assert!(manipulator.unconsumed_ranges().is_empty());
    }

    #[test]
    fn test_add_new_data_is_aligned() {
        let mut entry = entry();
        let mut manipulator = StreamedResourceManipulator::new(&mut entry);
        assert_eq!(manipulator.add_new_data(&[1, 2, 3]).unwrap(), 0);
        assert_eq!(manipulator.add_new_data(&[4]).unwrap(), 4);
        assert_eq!(manipulator.add_new_data(&[5, 6]).unwrap(), 6);
    }

    #[test]
    fn test_finalize() {
        let mut entry = entry();
        {
            let mut manipulator = StreamedResourceManipulator::new(&mut entry);
            assert!(!manipulator.finalize().unwrap());

            let moved = manipulator.original_view(4, 4).unwrap().to_vec();
            let offset = manipulator.add_new_data(&moved).unwrap();
            assert_eq!(offset, 0);
            manipulator.consume_range(4, 4).unwrap();
            assert!(manipulator.finalize().is_err());

            manipulator.consume_range(0, 4).unwrap();
            manipulator.consume_range(8, 2).unwrap();
            assert!(manipulator.finalize().unwrap());
            assert_eq!(manipulator.unconsumed_ranges(), &[(0, 4)]);
        }
        assert_eq!(entry.data.to_vec(), vec![4, 5, 6, 7]);
    }
}
