//! 编译期确定的全部参数
//!
//! 没有运行时配置，也没有持久化的状态，要改参数就得重新编译

use crate::channel::Trigger;
use crate::timer::{CounterMode, MasterTrigger, TimerConfig};
use crate::waveform::TriangleAmplitude;

// 时钟树
//
// NUCLEO-F446ZE 的 HSE 来自 ST-LINK 的 MCO 输出，为 8 MHz
// HSE 经过 PLLM 后得到 1 MHz，经过 PLLN 得到 360 MHz 的 VCO 输出，最后经过 PLLP 得到 180 MHz 的 SYSCLK
// 180 MHz 需要 Power Scale1 加上 Over-Drive 模式才能达到
pub const HSE_HZ: u32 = 8_000_000;
pub const PLL_M: u8 = 8;
pub const PLL_N: u16 = 360;
/// PLLP 固定为 /2
pub const PLL_P: u32 = 2;
pub const PLL_Q: u8 = 7;
pub const PLL_R: u8 = 6;
pub const SYSCLK_HZ: u32 = HSE_HZ / PLL_M as u32 * PLL_N as u32 / PLL_P;

/// APB1 的最大时钟为 45 MHz，因此需要 /4 分频
pub const APB1_DIV: u32 = 4;
/// APB2 的最大时钟为 90 MHz，因此需要 /2 分频
pub const APB2_DIV: u32 = 2;

/// APB1 上的定时器时钟（TIM6 就挂在 APB1 上）
///
/// 当 APB1 的分频不为 1 时，定时器时钟为 PCLK1 的 2 倍
pub const APB1_TIMER_HZ: u32 = SYSCLK_HZ / APB1_DIV * 2;

/// 等待 HSE、PLL、Over-Drive 等标志位就绪时，最多轮询的次数
pub const READY_SPIN_LIMIT: u32 = 1_000_000;

/// 等待 DMA Stream 关闭时，最多轮询的次数
pub const DMA_DISABLE_SPIN_LIMIT: u32 = 10_000;

// DAC 与 DMA
//
// 查询 DMA request mapping 可知，DAC 的 channel 1 发出的 DMA 请求处于 DMA1 的 Stream 5 Channel 7 上
pub const DAC_DMA_STREAM: usize = 5;
pub const DAC_DMA_CHANNEL: u8 = 7;

pub const DAC_TRIGGER: Trigger = Trigger::Tim6Trgo;

pub const TRIANGLE_AMPLITUDE: TriangleAmplitude = TriangleAmplitude::A1023;

/// TIM6：不分频，每 0x800 个时钟周期产生一次 Update Event，并通过 TRGO 触发 DAC
pub const PACING_TIMER: TimerConfig = TimerConfig {
    period: 0x7FF,
    prescaler: 0,
    counter_mode: CounterMode::Up,
    master_trigger: MasterTrigger::Update,
    master_slave: false,
};
