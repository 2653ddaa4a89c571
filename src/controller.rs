//! 主控逻辑
//!
//! `Controller` 持有 DAC 通道、定时器和状态指示灯，并借用一个与按钮中断共享的 `ButtonLatch`
//!
//! 主循环不断轮询 latch，有待处理的请求时，先把 DAC 通道完全关掉，再按照请求的波形重新配置，
//! 最后清除标志位；没有请求时，这一轮循环什么都不做
//!
//! 任何一步配置失败，都会点亮状态指示灯并停机，之后既不响应按钮，也不再改动 DAC
//!
//! 主循环进入 `run` 之后，`Controller` 就被移走了，中断处理函数拿不到它，
//! 因此 EXTI 的中断处理函数直接调用 `static` 的 `ButtonLatch::on_button_press`，
//! 与 `Controller::on_button_press` 效果完全相同

use embedded_hal::digital::OutputPin;

use crate::channel::{ChannelConfig, DacChannel, OutputChannelConfig, WaveformSetup};
use crate::error::{fail_stop, ConfigFailure, ConfigStep, ResultExt};
use crate::latch::ButtonLatch;
use crate::log::wave_rprintln;
use crate::timer::{TimingSource, TriggerTimer};
use crate::waveform::{Alignment, TriangleAmplitude, WaveformMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Running(WaveformMode),
    /// 吸收态，只能通过复位离开
    Halted(ConfigFailure),
}

pub struct Controller<'a, D, T, L> {
    dac: D,
    timing: TimingSource<T>,
    indicator: L,
    latch: &'a ButtonLatch,
    state: ControllerState,
    reconfigurations: u32,
}

impl<'a, D, T, L> Controller<'a, D, T, L>
where
    D: DacChannel,
    T: TriggerTimer,
    L: OutputPin,
{
    pub fn new(dac: D, timer: T, indicator: L, latch: &'a ButtonLatch) -> Self {
        Self {
            dac,
            timing: TimingSource::new(timer),
            indicator,
            latch,
            state: ControllerState::Uninitialized,
            reconfigurations: 0,
        }
    }

    /// 让 latch 回到上电状态（三角波、需要配置），并启动定时器
    ///
    /// 时钟、GPIO 和 EXTI 的初始化由 `board` 完成，这里只负责与波形相关的部分
    pub fn initialize(&mut self) -> Result<(), ConfigFailure> {
        if let ControllerState::Halted(failure) = self.state {
            return Err(failure);
        }
        if self.timing.is_running() {
            return Ok(());
        }

        self.latch.reset();
        if let Err(failure) = self.timing.configure() {
            self.halt(failure);
            return Err(failure);
        }
        Ok(())
    }

    /// 主循环的一轮
    ///
    /// 定时器还没有启动（`initialize` 尚未成功）时，什么都不做
    pub fn poll(&mut self) -> ControllerState {
        if let ControllerState::Halted(_) = self.state {
            return self.state;
        }
        if !self.timing.is_running() {
            return self.state;
        }

        let Some(pending) = self.latch.pending() else {
            return self.state;
        };

        let mode = pending.mode();
        match self.reconfigure(mode) {
            Ok(()) => {
                self.reconfigurations += 1;
                self.state = ControllerState::Running(mode);
                if !self.latch.complete(pending) {
                    wave_rprintln!("button pressed during reconfiguration, queued");
                }
                wave_rprintln!(
                    "#{} now emitting {}",
                    self.reconfigurations,
                    mode.name()
                );
            }
            Err(failure) => self.halt(failure),
        }
        self.state
    }

    /// 永不返回的主循环
    pub fn run(mut self) -> ! {
        loop {
            if let ControllerState::Halted(_) = self.poll() {
                fail_stop(&mut self.indicator);
            }
        }
    }

    /// 按钮按下时的唯一入口
    pub fn on_button_press(&self) {
        self.latch.on_button_press();
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// 已经完成的重新配置次数（包括上电后的第一次）
    pub fn reconfigurations(&self) -> u32 {
        self.reconfigurations
    }

    fn reconfigure(&mut self, mode: WaveformMode) -> Result<(), ConfigFailure> {
        // 先拆除，再配置
        self.dac.deinit().at(ConfigStep::DacDeInit)?;

        let config = OutputChannelConfig::for_mode(mode);
        match config.waveform {
            WaveformSetup::Triangle { amplitude, initial } => {
                self.configure_triangle(&config.channel, amplitude, initial)
            }
            WaveformSetup::Escalator { table, align } => {
                self.configure_escalator(&config.channel, table, align)
            }
        }
    }

    fn configure_triangle(
        &mut self,
        channel: &ChannelConfig,
        amplitude: TriangleAmplitude,
        initial: u16,
    ) -> Result<(), ConfigFailure> {
        self.dac.init().at(ConfigStep::DacInit)?;
        self.dac
            .configure(channel)
            .at(ConfigStep::DacChannelConfig)?;
        self.dac
            .triangle_generate(amplitude)
            .at(ConfigStep::DacTriangle)?;
        self.dac.start().at(ConfigStep::DacStart)?;
        self.dac
            .set_value(Alignment::Right12, initial)
            .at(ConfigStep::DacSetValue)
    }

    fn configure_escalator(
        &mut self,
        channel: &ChannelConfig,
        table: &'static [u8],
        align: Alignment,
    ) -> Result<(), ConfigFailure> {
        self.dac.init().at(ConfigStep::DacInit)?;
        self.dac
            .configure(channel)
            .at(ConfigStep::DacChannelConfig)?;
        self.dac
            .start_dma(table, align)
            .at(ConfigStep::DacStartDma)
    }

    fn halt(&mut self, failure: ConfigFailure) {
        let _ = self.indicator.set_high();
        self.state = ControllerState::Halted(failure);
        wave_rprintln!("fatal: {}, halted", failure);
    }

    #[cfg(test)]
    pub(crate) fn dac(&self) -> &D {
        &self.dac
    }

    #[cfg(test)]
    pub(crate) fn dac_mut(&mut self) -> &mut D {
        &mut self.dac
    }

    #[cfg(test)]
    pub(crate) fn indicator(&self) -> &L {
        &self.indicator
    }

    #[cfg(test)]
    pub(crate) fn timing_mut(&mut self) -> &mut TimingSource<T> {
        &mut self.timing
    }
}
