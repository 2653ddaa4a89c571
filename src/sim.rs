// 在 Host 上代替真实外设的软件模型
//
// SimDac 按照 Reference Manual 中 DAC 的行为建模：每收到一次触发，
// 若启用了 DMA，则 DMA 把下一个采样点写入 DHR，DHR 再被转移到 DOR；
// 若启用了三角波发生器，则三角计数器先加一（或减一），DOR = DHR + 计数器

use core::convert::Infallible;
use core::mem::discriminant;

use embedded_hal::digital::{ErrorType, OutputPin};

use crate::channel::{ChannelConfig, ChannelLifecycle, ChannelPhase, DacChannel};
use crate::error::PeripheralError;
use crate::latch::ButtonLatch;
use crate::timer::{CounterMode, MasterTrigger, TimerConfig, TriggerTimer};
use crate::waveform::{Alignment, TriangleAmplitude};

/// 注入的失败统一报告为超时
const INJECTED: PeripheralError = PeripheralError::Timeout;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DacOp {
    DeInit,
    Init,
    Configure(ChannelConfig),
    Triangle(TriangleAmplitude),
    Start,
    SetValue(Alignment, u16),
    StartDma(Alignment, usize),
}

struct Triangle {
    peak: u16,
    counter: u16,
    rising: bool,
}

struct Dma {
    table: &'static [u8],
    align: Alignment,
    index: usize,
}

pub struct SimDac {
    pub ops: Vec<DacOp>,
    /// 与该操作同类的调用会失败
    pub fail_on: Option<DacOp>,
    /// 在 init 时模拟一次按钮按下
    pub press_on_init: Option<&'static ButtonLatch>,
    lifecycle: ChannelLifecycle,
    triangle_amplitude: Option<TriangleAmplitude>,
    triangle: Option<Triangle>,
    dma: Option<Dma>,
    dhr: u16,
}

impl SimDac {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            fail_on: None,
            press_on_init: None,
            lifecycle: ChannelLifecycle::new(),
            triangle_amplitude: None,
            triangle: None,
            dma: None,
            dhr: 0,
        }
    }

    fn record(&mut self, op: DacOp) -> Result<(), PeripheralError> {
        self.ops.push(op);
        match self.fail_on {
            Some(f) if discriminant(&f) == discriminant(&op) => Err(INJECTED),
            _ => Ok(()),
        }
    }

    /// 一次 TRGO 触发，返回 DOR 中的 12 bit 输出值
    pub fn pulse(&mut self) -> Option<u16> {
        if self.lifecycle.phase() != ChannelPhase::Running {
            return None;
        }

        if let Some(dma) = self.dma.as_mut() {
            let sample = dma.table[dma.index];
            dma.index = (dma.index + 1) % dma.table.len();
            self.dhr = dma.align.to_output(sample as u16);
        }

        let offset = match self.triangle.as_mut() {
            Some(t) => {
                if t.rising {
                    t.counter += 1;
                    if t.counter == t.peak {
                        t.rising = false;
                    }
                } else {
                    t.counter -= 1;
                    if t.counter == 0 {
                        t.rising = true;
                    }
                }
                t.counter
            }
            None => 0,
        };

        Some((self.dhr + offset) & 0x0FFF)
    }
}

impl DacChannel for SimDac {
    fn deinit(&mut self) -> Result<(), PeripheralError> {
        self.record(DacOp::DeInit)?;
        self.lifecycle.deinit();
        self.triangle_amplitude = None;
        self.triangle = None;
        self.dma = None;
        self.dhr = 0;
        Ok(())
    }

    fn init(&mut self) -> Result<(), PeripheralError> {
        if let Some(latch) = self.press_on_init {
            latch.on_button_press();
        }
        self.record(DacOp::Init)?;
        self.lifecycle.init()
    }

    fn configure(&mut self, config: &ChannelConfig) -> Result<(), PeripheralError> {
        self.record(DacOp::Configure(*config))?;
        self.lifecycle.configure()
    }

    fn triangle_generate(&mut self, amplitude: TriangleAmplitude) -> Result<(), PeripheralError> {
        self.record(DacOp::Triangle(amplitude))?;
        self.lifecycle.check_triangle()?;
        self.triangle_amplitude = Some(amplitude);
        Ok(())
    }

    fn start(&mut self) -> Result<(), PeripheralError> {
        self.record(DacOp::Start)?;
        self.lifecycle.start()?;
        // 三角计数器在通道启用时从 0 开始
        self.triangle = self.triangle_amplitude.map(|a| Triangle {
            peak: a.peak(),
            counter: 0,
            rising: true,
        });
        Ok(())
    }

    fn set_value(&mut self, align: Alignment, value: u16) -> Result<(), PeripheralError> {
        self.record(DacOp::SetValue(align, value))?;
        self.lifecycle.check_value(align, value)?;
        self.dhr = align.to_output(value);
        Ok(())
    }

    fn start_dma(&mut self, table: &'static [u8], align: Alignment) -> Result<(), PeripheralError> {
        self.record(DacOp::StartDma(align, table.len()))?;
        if align != Alignment::Right8 {
            return Err(PeripheralError::Unsupported);
        }
        if table.is_empty() {
            return Err(PeripheralError::ValueOutOfRange);
        }
        self.lifecycle.start()?;
        self.dma = Some(Dma {
            table,
            align,
            index: 0,
        });
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerOp {
    Init(TimerConfig),
    Master(MasterTrigger, bool),
    Start,
}

/// 模拟一个只能向上计数的基础定时器
pub struct SimTimer {
    pub ops: Vec<TimerOp>,
    pub fail_on: Option<TimerOp>,
}

impl SimTimer {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            fail_on: None,
        }
    }

    fn record(&mut self, op: TimerOp) -> Result<(), PeripheralError> {
        self.ops.push(op);
        match self.fail_on {
            Some(f) if discriminant(&f) == discriminant(&op) => Err(INJECTED),
            _ => Ok(()),
        }
    }
}

impl TriggerTimer for SimTimer {
    fn init(&mut self, config: &TimerConfig) -> Result<(), PeripheralError> {
        self.record(TimerOp::Init(*config))?;
        match config.counter_mode {
            CounterMode::Up => Ok(()),
            CounterMode::Down => Err(PeripheralError::Unsupported),
        }
    }

    fn configure_master(
        &mut self,
        trigger: MasterTrigger,
        master_slave: bool,
    ) -> Result<(), PeripheralError> {
        self.record(TimerOp::Master(trigger, master_slave))?;
        // 基础定时器没有 SMCR
        if master_slave {
            return Err(PeripheralError::Unsupported);
        }
        Ok(())
    }

    fn start(&mut self) -> Result<(), PeripheralError> {
        self.record(TimerOp::Start)
    }
}

#[derive(Default)]
pub struct SimLed {
    pub is_on: bool,
}

impl ErrorType for SimLed {
    type Error = Infallible;
}

impl OutputPin for SimLed {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.is_on = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.is_on = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waveform::ESCALATOR_8BIT;

    #[test]
    fn idle_channel_emits_nothing() {
        let mut dac = SimDac::new();
        assert_eq!(dac.pulse(), None);
        dac.init().unwrap();
        dac.configure(&ChannelConfig::timer_paced()).unwrap();
        assert_eq!(dac.pulse(), None);
    }

    #[test]
    fn dma_cannot_start_twice() {
        let mut dac = SimDac::new();
        dac.init().unwrap();
        dac.configure(&ChannelConfig::timer_paced()).unwrap();
        dac.start_dma(&ESCALATOR_8BIT, Alignment::Right8).unwrap();
        assert_eq!(
            dac.start_dma(&ESCALATOR_8BIT, Alignment::Right8),
            Err(PeripheralError::Busy)
        );
    }

    #[test]
    fn dma_moves_bytes_only() {
        let mut dac = SimDac::new();
        dac.init().unwrap();
        dac.configure(&ChannelConfig::timer_paced()).unwrap();
        assert_eq!(
            dac.start_dma(&ESCALATOR_8BIT, Alignment::Right12),
            Err(PeripheralError::Unsupported)
        );
        assert_eq!(dac.pulse(), None);
    }
}
