//! DAC 输出通道
//!
//! 无论是三角波还是阶梯波，DAC 通道都需要先初始化，再配置触发源和输出缓冲，最后才能启动输出。
//! 切换波形前，还必须把通道完全反初始化，否则三角波发生器的配置会残留在 DAC_CR 里，与 DMA 的输出混在一起
//!
//! `ChannelLifecycle` 负责记录通道走到了哪一步，驱动在执行每个操作前都要先问问它，
//! 这样“先拆除，再配置”的规则就不依赖于调用者的自觉了

use crate::config;
use crate::error::PeripheralError;
use crate::waveform::{
    Alignment, TriangleAmplitude, WaveformMode, ESCALATOR_8BIT, TRIANGLE_INITIAL_VALUE,
};

/// DAC 转换的触发源，对应 DAC_CR 的 TSEL1 字段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Tim6Trgo,
    Tim8Trgo,
    Tim7Trgo,
    Tim5Trgo,
    Tim2Trgo,
    Tim4Trgo,
    Exti9,
    Software,
}

/// DAC 的输出缓冲
///
/// 启用缓冲后，DAC 可以直接驱动较低阻抗的负载，不需要外接运放
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputBuffer {
    Enabled,
    Disabled,
}

/// 两种波形共用的通道配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    pub trigger: Trigger,
    pub output_buffer: OutputBuffer,
}

impl ChannelConfig {
    /// 由定时器 TRGO 驱动、带输出缓冲的通道配置
    pub const fn timer_paced() -> Self {
        Self {
            trigger: config::DAC_TRIGGER,
            output_buffer: OutputBuffer::Enabled,
        }
    }
}

/// 与波形相关的那部分配置
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaveformSetup {
    Triangle {
        amplitude: TriangleAmplitude,
        initial: u16,
    },
    Escalator {
        table: &'static [u8],
        align: Alignment,
    },
}

/// 一次完整的通道配置，每次切换波形时都会重新生成
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputChannelConfig {
    pub channel: ChannelConfig,
    pub waveform: WaveformSetup,
}

impl OutputChannelConfig {
    pub fn for_mode(mode: WaveformMode) -> Self {
        let waveform = match mode {
            WaveformMode::Triangle => WaveformSetup::Triangle {
                amplitude: config::TRIANGLE_AMPLITUDE,
                initial: TRIANGLE_INITIAL_VALUE,
            },
            WaveformMode::Escalator => WaveformSetup::Escalator {
                table: &ESCALATOR_8BIT,
                align: Alignment::Right8,
            },
        };
        Self {
            channel: ChannelConfig::timer_paced(),
            waveform,
        }
    }

    pub fn mode(&self) -> WaveformMode {
        match self.waveform {
            WaveformSetup::Triangle { .. } => WaveformMode::Triangle,
            WaveformSetup::Escalator { .. } => WaveformMode::Escalator,
        }
    }
}

/// DAC 通道需要提供的操作
///
/// 每个操作都可能失败，失败的原因由驱动给出，具体如何处理由调用者决定
pub trait DacChannel {
    /// 完全关闭通道：停止 DMA、复位 DAC
    fn deinit(&mut self) -> Result<(), PeripheralError>;

    fn init(&mut self) -> Result<(), PeripheralError>;

    fn configure(&mut self, config: &ChannelConfig) -> Result<(), PeripheralError>;

    /// 启用三角波发生器
    fn triangle_generate(&mut self, amplitude: TriangleAmplitude) -> Result<(), PeripheralError>;

    /// 启动通道的输出
    fn start(&mut self) -> Result<(), PeripheralError>;

    fn set_value(&mut self, align: Alignment, value: u16) -> Result<(), PeripheralError>;

    /// 启动通道的输出，并由 DMA 以循环模式不断地将 `table` 写入对应格式的 DHR 寄存器
    fn start_dma(&mut self, table: &'static [u8], align: Alignment) -> Result<(), PeripheralError>;
}

/// 通道所处的阶段
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelPhase {
    Reset,
    Ready,
    Configured,
    Running,
}

/// 记录通道的阶段，并检查每个操作是否合法
#[derive(Debug)]
pub struct ChannelLifecycle {
    phase: ChannelPhase,
}

impl ChannelLifecycle {
    pub const fn new() -> Self {
        Self {
            phase: ChannelPhase::Reset,
        }
    }

    pub const fn phase(&self) -> ChannelPhase {
        self.phase
    }

    pub fn deinit(&mut self) {
        self.phase = ChannelPhase::Reset;
    }

    pub fn init(&mut self) -> Result<(), PeripheralError> {
        match self.phase {
            ChannelPhase::Reset => {
                self.phase = ChannelPhase::Ready;
                Ok(())
            }
            _ => Err(PeripheralError::NotReset),
        }
    }

    pub fn configure(&mut self) -> Result<(), PeripheralError> {
        match self.phase {
            ChannelPhase::Ready | ChannelPhase::Configured => {
                self.phase = ChannelPhase::Configured;
                Ok(())
            }
            ChannelPhase::Reset => Err(PeripheralError::NotReady),
            ChannelPhase::Running => Err(PeripheralError::Busy),
        }
    }

    /// 三角波发生器只能在通道配置之后、启动之前设置
    pub fn check_triangle(&self) -> Result<(), PeripheralError> {
        match self.phase {
            ChannelPhase::Configured => Ok(()),
            ChannelPhase::Running => Err(PeripheralError::Busy),
            _ => Err(PeripheralError::NotReady),
        }
    }

    pub fn start(&mut self) -> Result<(), PeripheralError> {
        match self.phase {
            ChannelPhase::Configured => {
                self.phase = ChannelPhase::Running;
                Ok(())
            }
            ChannelPhase::Running => Err(PeripheralError::Busy),
            _ => Err(PeripheralError::NotReady),
        }
    }

    pub fn check_value(&self, align: Alignment, value: u16) -> Result<(), PeripheralError> {
        match self.phase {
            ChannelPhase::Configured | ChannelPhase::Running => {}
            _ => return Err(PeripheralError::NotReady),
        }
        if align.accepts(value) {
            Ok(())
        } else {
            Err(PeripheralError::ValueOutOfRange)
        }
    }
}

impl Default for ChannelLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
