//! 配置失败的处理
//!
//! 这里只有一种错误：配置外设时失败。无论失败发生在哪一步，都被认为是不可恢复的，
//! 系统会点亮状态指示灯，然后停在一个死循环里，不再响应按钮，也不再更新 DAC 的输出，只能通过复位来恢复

use core::fmt;

use embedded_hal::digital::OutputPin;

/// 外设驱动返回的错误原因
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeripheralError {
    /// 外设尚未被反初始化，就又被要求初始化
    NotReset,
    /// 外设尚未初始化，或者通道尚未配置
    NotReady,
    /// 外设正在输出，不能再次启动
    Busy,
    /// 写入的值超出了当前数据格式的范围
    ValueOutOfRange,
    /// 在限定的轮询次数内，等待的标志位没有就绪
    Timeout,
    /// 外设不支持请求的配置
    Unsupported,
}

impl fmt::Display for PeripheralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PeripheralError::NotReset => "peripheral not de-initialized",
            PeripheralError::NotReady => "peripheral not ready",
            PeripheralError::Busy => "peripheral busy",
            PeripheralError::ValueOutOfRange => "value out of range",
            PeripheralError::Timeout => "timeout",
            PeripheralError::Unsupported => "unsupported configuration",
        };
        f.write_str(s)
    }
}

/// 出错时正在执行的配置步骤
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigStep {
    ClockOscillator,
    ClockOverDrive,
    ClockSwitch,
    TimerInit,
    TimerMaster,
    TimerStart,
    DacDeInit,
    DacInit,
    DacChannelConfig,
    DacTriangle,
    DacStart,
    DacStartDma,
    DacSetValue,
}

impl ConfigStep {
    pub const fn name(self) -> &'static str {
        match self {
            ConfigStep::ClockOscillator => "clock oscillator",
            ConfigStep::ClockOverDrive => "clock over-drive",
            ConfigStep::ClockSwitch => "clock switch",
            ConfigStep::TimerInit => "timer init",
            ConfigStep::TimerMaster => "timer master config",
            ConfigStep::TimerStart => "timer start",
            ConfigStep::DacDeInit => "DAC de-init",
            ConfigStep::DacInit => "DAC init",
            ConfigStep::DacChannelConfig => "DAC channel config",
            ConfigStep::DacTriangle => "DAC triangle generator",
            ConfigStep::DacStart => "DAC start",
            ConfigStep::DacStartDma => "DAC start DMA",
            ConfigStep::DacSetValue => "DAC set value",
        }
    }
}

/// 致命的配置失败
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigFailure {
    pub step: ConfigStep,
    pub cause: PeripheralError,
}

impl fmt::Display for ConfigFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.step.name(), self.cause)
    }
}

/// 给驱动返回的错误附上出错的步骤
pub trait ResultExt<T> {
    fn at(self, step: ConfigStep) -> Result<T, ConfigFailure>;
}

impl<T> ResultExt<T> for Result<T, PeripheralError> {
    fn at(self, step: ConfigStep) -> Result<T, ConfigFailure> {
        self.map_err(|cause| ConfigFailure { step, cause })
    }
}

/// 点亮状态指示灯，然后停机
///
/// 指示灯本身如果设置失败，也没有别的办法了，因此这里直接忽略它的错误
pub fn fail_stop<L: OutputPin>(indicator: &mut L) -> ! {
    let _ = indicator.set_high();

    #[allow(clippy::empty_loop)]
    loop {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_step_and_cause() {
        let r: Result<(), PeripheralError> = Err(PeripheralError::Busy);
        let failure = r.at(ConfigStep::DacStartDma).unwrap_err();
        assert_eq!(failure.step, ConfigStep::DacStartDma);
        assert_eq!(failure.cause, PeripheralError::Busy);
        assert_eq!(failure.to_string(), "DAC start DMA failed: peripheral busy");
    }

    #[test]
    fn ok_passes_through() {
        let r: Result<u8, PeripheralError> = Ok(3);
        assert_eq!(r.at(ConfigStep::DacInit), Ok(3));
    }
}
