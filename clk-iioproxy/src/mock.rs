//! Scripted IIO device for tests.

use alloc::{
    string::{String, ToString},
    sync::Arc,
    vec,
    vec::Vec,
};

use rdif_base::{DriverGeneric, ErrorBase};
use rdif_iio::{ChanInfo, ChanSpec, ChanType, IioError, Interface, WriteRaw};
use spin::Mutex;

#[derive(Clone, Default)]
pub struct MockStats(Arc<Mutex<Vec<(usize, i64, ChanInfo)>>>);

impl MockStats {
    pub fn writes(&self) -> usize {
        self.0.lock().len()
    }

    pub fn last(&self) -> Option<(usize, i64, ChanInfo)> {
        self.0.lock().last().copied()
    }
}

pub struct MockIio {
    name: String,
    channels: Vec<ChanSpec>,
    writable: bool,
    fail: bool,
    stats: MockStats,
}

impl MockIio {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            channels: vec![ChanSpec::output(ChanType::AltVoltage, 0)],
            writable: true,
            fail: false,
            stats: MockStats::default(),
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.writable = false;
        self
    }

    pub fn without_channels(mut self) -> Self {
        self.channels.clear();
        self
    }

    pub fn stats(&self) -> MockStats {
        self.stats.clone()
    }
}

impl DriverGeneric for MockIio {
    fn open(&mut self) -> Result<(), ErrorBase> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ErrorBase> {
        Ok(())
    }
}

impl WriteRaw for MockIio {
    fn write_raw(
        &mut self,
        chan: &ChanSpec,
        val: i64,
        _val2: i64,
        mask: ChanInfo,
    ) -> Result<(), IioError> {
        self.stats.0.lock().push((chan.channel, val, mask));
        if self.fail { Err(IioError::Io) } else { Ok(()) }
    }
}

impl Interface for MockIio {
    fn name(&self) -> &str {
        &self.name
    }

    fn channels(&self) -> &[ChanSpec] {
        &self.channels
    }

    fn raw_writer(&mut self) -> Option<&mut dyn WriteRaw> {
        if self.writable { Some(self) } else { None }
    }
}
