//! NUCLEO-F446ZE 板级支持
//!
//! 板上与本程序相关的资源：
//!
//! - PA4：DAC Channel 1 的输出引脚，需要切换到 analog 模式
//! - PB14：LED3（红色），作为出错时的状态指示灯
//! - PC13：用户按钮，板上已经有下拉电阻，按下时为高电平，因此我们使用上升沿触发 EXTI13
//!
//! 时钟树的配置是以寄存器的方式完成的，GPIO 与 EXTI 则直接使用 hal 库提供的接口

use rtt_target::rprintln;
use stm32f4xx_hal::{
    gpio::{self, Edge, Input, Output, PinState},
    pac,
    prelude::*,
    syscfg::SysCfgExt,
};

use crate::error::{fail_stop, PeripheralError};

pub mod dac;
mod rcc;
pub mod tim6;

pub use dac::Stm32Dac;
pub use tim6::Tim6;

pub type StatusLed = gpio::Pin<'B', 14, Output>;
pub type UserButton = gpio::Pin<'C', 13, Input>;

pub struct Board {
    pub dac: Stm32Dac,
    pub tim6: Tim6,
    pub led: StatusLed,
    pub button: UserButton,
}

/// 完成板级的初始化
///
/// LED 最先被初始化，这样时钟配置失败时，也能点亮它；时钟配置失败后直接停机，不会返回
pub fn init(mut dp: pac::Peripherals) -> Board {
    let gpiob = dp.GPIOB.split();
    let mut led = gpiob.pb14.into_push_pull_output_in_state(PinState::Low);

    if let Err(failure) = rcc::setup(&dp.RCC, &dp.PWR, &dp.FLASH) {
        rprintln!("fatal: {}, halted", failure);
        fail_stop(&mut led);
    }
    rprintln!("SYSCLK switched to PLL, {} Hz", crate::config::SYSCLK_HZ);

    let gpioa = dp.GPIOA.split();
    let gpioc = dp.GPIOC.split();

    // RM 中建议我们要预先将 GPIO PA4 设置为模拟模式，再开启 DAC 的输出
    let dac_pin = gpioa.pa4.into_analog();

    // SYSCFG 控制了 EXTI 线与 GPIO 端口的对应关系，因此需要先启用 SYSCFG
    let mut button = gpioc.pc13.into_pull_down_input();
    let mut syscfg = dp.SYSCFG.constrain();
    // 将 EXTI13 关联到 Port C
    button.make_interrupt_source(&mut syscfg);
    button.trigger_on_edge(&mut dp.EXTI, Edge::Rising);
    // 修改 中断请求遮罩，让 Line 13 的请求可以发送至 NVIC
    // NVIC 那边的 unmask 留给主程序，在共享资源就位之后再做
    button.enable_interrupt(&mut dp.EXTI);

    Board {
        dac: Stm32Dac::new(dp.DAC, dp.DMA1, dac_pin),
        tim6: Tim6::new(dp.TIM6),
        led,
        button,
    }
}

/// 轮询一个标志位，直到它就绪，或者轮询次数用尽
pub(crate) fn wait_until(limit: u32, mut ready: impl FnMut() -> bool) -> Result<(), PeripheralError> {
    for _ in 0..limit {
        if ready() {
            return Ok(());
        }
    }
    Err(PeripheralError::Timeout)
}

/// RCC 的寄存器块
///
/// 时钟树配置完成后，各外设驱动只会改动自己在 APB1ENR / AHB1ENR / APB1RSTR 中对应的那一位，
/// 这与 hal 库内部启用 GPIO 时钟的做法是一样的
pub(crate) fn rcc_regs() -> &'static pac::rcc::RegisterBlock {
    unsafe { &*pac::RCC::ptr() }
}
