//! 为 DAC 提供节拍的定时器
//!
//! TIM6 是基础定时器（Basic Timer），只能向上计数，也没有输入捕获、输出比较这些功能，
//! 不过它有一个 TRGO 输出，可以把 Update Event 传给 DAC，正好满足我们的需求
//!
//! 定时器的计数频率 f(CK_CNT) = f(CK_PSC) / (PSC + 1)，
//! 而 Update Event 的频率为 f(CK_CNT) / (ARR + 1)，
//! 也就是 DAC 每秒更新输出的次数
//!
//! 两种波形共用同一个定时器配置，定时器在启动后就一直运行，切换波形时不会动它

use crate::config;
use crate::error::{ConfigFailure, ConfigStep, PeripheralError, ResultExt};
use crate::log::wave_rprintln;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CounterMode {
    Up,
    Down,
}

/// 主模式下 TRGO 的来源，对应 TIMx_CR2 的 MMS 字段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MasterTrigger {
    Reset,
    Enable,
    Update,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimerConfig {
    /// 自动重载值 ARR
    pub period: u16,
    pub prescaler: u16,
    pub counter_mode: CounterMode,
    pub master_trigger: MasterTrigger,
    /// TIMx_SMCR 的 MSM 位，这里不需要与其它定时器同步
    pub master_slave: bool,
}

impl TimerConfig {
    /// 给定定时器的输入时钟，计算 TRGO 的频率
    pub const fn pulse_hz(&self, timer_clock_hz: u32) -> u32 {
        timer_clock_hz / (self.prescaler as u32 + 1) / (self.period as u32 + 1)
    }
}

/// 定时器需要提供的操作
pub trait TriggerTimer {
    /// 设置时基单元：PSC、ARR 和计数方向
    fn init(&mut self, config: &TimerConfig) -> Result<(), PeripheralError>;

    fn configure_master(
        &mut self,
        trigger: MasterTrigger,
        master_slave: bool,
    ) -> Result<(), PeripheralError>;

    fn start(&mut self) -> Result<(), PeripheralError>;
}

/// 定时器只会被配置一次，之后就作为只读的共享设施存在
pub struct TimingSource<T> {
    timer: T,
    config: TimerConfig,
    running: bool,
}

impl<T: TriggerTimer> TimingSource<T> {
    pub fn new(timer: T) -> Self {
        Self::with_config(timer, config::PACING_TIMER)
    }

    pub fn with_config(timer: T, config: TimerConfig) -> Self {
        Self {
            timer,
            config,
            running: false,
        }
    }

    /// 配置并启动定时器，重复调用不会产生任何效果
    pub fn configure(&mut self) -> Result<(), ConfigFailure> {
        if self.running {
            return Ok(());
        }

        self.timer.init(&self.config).at(ConfigStep::TimerInit)?;
        self.timer
            .configure_master(self.config.master_trigger, self.config.master_slave)
            .at(ConfigStep::TimerMaster)?;
        self.timer.start().at(ConfigStep::TimerStart)?;
        self.running = true;

        wave_rprintln!(
            "pacing timer running: ARR {:#x}, PSC {}, {} Hz",
            self.config.period,
            self.config.prescaler,
            self.config.pulse_hz(config::APB1_TIMER_HZ)
        );
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &TimerConfig {
        &self.config
    }

    #[cfg(test)]
    pub(crate) fn timer(&self) -> &T {
        &self.timer
    }

    #[cfg(test)]
    pub(crate) fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn release(self) -> T {
        self.timer
    }
}
