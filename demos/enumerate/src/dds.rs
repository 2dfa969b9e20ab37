use clk_iioproxy::{
    ErrorBase,
    iio::{ChanInfo, ChanSpec, ChanType, IioError, Interface, WriteRaw},
};
use log::debug;

/// Direct digital synthesizer with one output and a 25 MHz ceiling.
pub struct Dds {
    name: &'static str,
    channels: [ChanSpec; 1],
    freq: i64,
}

impl Dds {
    pub const MAX_HZ: i64 = 25_000_000;

    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            channels: [ChanSpec::output(ChanType::AltVoltage, 0)],
            freq: 0,
        }
    }
}

impl clk_iioproxy::DriverGeneric for Dds {
    fn open(&mut self) -> Result<(), ErrorBase> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), ErrorBase> {
        Ok(())
    }
}

impl WriteRaw for Dds {
    fn write_raw(
        &mut self,
        chan: &ChanSpec,
        val: i64,
        _val2: i64,
        mask: ChanInfo,
    ) -> Result<(), IioError> {
        if mask != ChanInfo::Frequency {
            return Err(IioError::NotSupported(mask));
        }
        if !(0..=Self::MAX_HZ).contains(&val) {
            return Err(IioError::InvalidValue { val, mask });
        }
        debug!("{} out{}: {} -> {} Hz", self.name, chan.channel, self.freq, val);
        self.freq = val;
        Ok(())
    }
}

impl Interface for Dds {
    fn name(&self) -> &str {
        self.name
    }

    fn channels(&self) -> &[ChanSpec] {
        &self.channels
    }

    fn raw_writer(&mut self) -> Option<&mut dyn WriteRaw> {
        Some(self)
    }
}
