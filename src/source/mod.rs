//! Sample sources: where raw ECG samples come from.
//!
//! Sources classify every unit of input instead of silently dropping what
//! they cannot read. `Ok(None)` means the input is exhausted and `Err` is a
//! fatal failure of the underlying transport.

pub mod channel;
pub mod line;
pub mod record;
pub mod wav;

pub use channel::ChannelSource;
pub use line::LineSource;
pub use record::{SampleRecord, SourceEvent, parse_line};
pub use wav::WavFileSource;

use crate::config::SampleRate;
use crate::error::Result;

pub trait SampleSource: Send {
    /// Next classified input, `Ok(None)` once exhausted
    fn next_event(&mut self) -> Result<Option<SourceEvent>>;

    /// Sample rate if the source knows it (e.g. from a file header)
    fn sample_rate(&self) -> Option<SampleRate> {
        None
    }
}

/// Source over an in-memory sequence of records
pub struct RecordSource<I> {
    records: I,
}

impl<I> RecordSource<I>
where
    I: Iterator<Item = SampleRecord>,
{
    pub fn new<T>(records: T) -> Self
    where
        T: IntoIterator<IntoIter = I>,
    {
        Self {
            records: records.into_iter(),
        }
    }
}

impl<I> SampleSource for RecordSource<I>
where
    I: Iterator<Item = SampleRecord> + Send,
{
    fn next_event(&mut self) -> Result<Option<SourceEvent>> {
        Ok(self.records.next().map(SourceEvent::Record))
    }
}

impl<S: SampleSource + ?Sized> SampleSource for Box<S> {
    fn next_event(&mut self) -> Result<Option<SourceEvent>> {
        (**self).next_event()
    }

    fn sample_rate(&self) -> Option<SampleRate> {
        (**self).sample_rate()
    }
}
