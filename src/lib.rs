//! 用 DAC 交替输出三角波与阶梯波
//!
//! DAC 的 Channel 1 由 TIM6 的 TRGO 触发，每个 Update Event 更新一次输出，有两种波形可选：
//!
//! 1. 三角波：由 DAC 内部的三角波发生器生成，软件只负责给出一个起始值和幅度，之后的每个采样点都由硬件自行产生
//! 2. 阶梯波（escalator）：6 个 8 bit 的采样点，由 DMA 以循环模式逐个搬运到 DHR8R1 寄存器，同样无需软件介入
//!
//! 板载的用户按钮每按下一次，就在两种波形之间切换一次
//!
//! 整个 crate 被分为两部分：
//!
//! - 不依赖具体芯片的核心逻辑（`controller`、`latch`、`channel`、`timer` 等模块），
//!   它们只通过 trait 访问外设，因此可以直接在 Host 上跑单元测试
//! - `board` 模块，只在为单片机编译时存在，用 PAC 寄存器实现上面那些 trait，并负责时钟、GPIO、EXTI 的初始化

#![cfg_attr(not(test), no_std)]

mod log;

pub mod channel;
pub mod config;
pub mod controller;
pub mod error;
pub mod latch;
pub mod timer;
pub mod waveform;

#[cfg(target_os = "none")]
pub mod board;

#[cfg(test)]
mod sim;

pub use channel::{ChannelConfig, DacChannel, OutputChannelConfig, WaveformSetup};
pub use controller::{Controller, ControllerState};
pub use error::{fail_stop, ConfigFailure, ConfigStep, PeripheralError};
pub use latch::ButtonLatch;
pub use timer::{TimerConfig, TimingSource, TriggerTimer};
pub use waveform::{Alignment, TriangleAmplitude, WaveformMode, ESCALATOR_8BIT};
