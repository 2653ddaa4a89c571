// 把 STM32F446 的 HCLK 拉到 180 MHz
//
// HSE (8 MHz) >-- PLLM /8 --> 1 MHz >-- PLLN x360 --> 360 MHz >-- PLLP /2 --> SYSCLK 180 MHz
//
// 180 MHz 是 F446 的最高频率，要达到它，需要三个额外的操作：
// 1. 将 PWR 的 VOS 设置为 Scale1
// 2. 开启 Over-Drive 模式，并切换过去
// 3. Flash 的读取延迟设置为 5 个周期
//
// 每个需要等待的标志位都有轮询次数的上限，超过上限就视为配置失败

use stm32f4xx_hal::pac;

use super::wait_until;
use crate::config;
use crate::error::{ConfigFailure, ConfigStep, ResultExt};

pub(super) fn setup(
    rcc: &pac::RCC,
    pwr: &pac::PWR,
    flash: &pac::FLASH,
) -> Result<(), ConfigFailure> {
    // 启动 HSE
    rcc.cr.modify(|_, w| w.hseon().on());
    wait_until(config::READY_SPIN_LIMIT, || rcc.cr.read().hserdy().is_ready())
        .at(ConfigStep::ClockOscillator)?;

    // 提高供电电压
    rcc.apb1enr.modify(|_, w| w.pwren().enabled());
    pwr.cr.modify(|_, w| unsafe { w.vos().bits(0b11) });

    // 设置 PLL
    // PLLQ 和 PLLR 只影响 48 MHz 时钟与 I2S/SAI 的时钟，我们这里用不上，按照常见的值设置即可
    rcc.pllcfgr.modify(|_, w| {
        w.pllsrc().hse();
        unsafe {
            w.pllm().bits(config::PLL_M);
            w.plln().bits(config::PLL_N);
            w.pllq().bits(config::PLL_Q);
            w.pllr().bits(config::PLL_R);
        }
        w.pllp().div2();
        w
    });

    // 启动 PLL
    rcc.cr.modify(|_, w| w.pllon().on());
    wait_until(config::READY_SPIN_LIMIT, || rcc.cr.read().pllrdy().is_ready())
        .at(ConfigStep::ClockOscillator)?;

    // 开启 Over-Drive，等待就绪后，再切换到 Over-Drive 模式
    pwr.cr.modify(|_, w| w.oden().set_bit());
    wait_until(config::READY_SPIN_LIMIT, || pwr.csr.read().odrdy().bit_is_set())
        .at(ConfigStep::ClockOverDrive)?;
    pwr.cr.modify(|_, w| w.odswen().set_bit());
    wait_until(config::READY_SPIN_LIMIT, || pwr.csr.read().odswrdy().bit_is_set())
        .at(ConfigStep::ClockOverDrive)?;

    // 设置 Flash 读取延迟，并开启指令和数据的缓存，以及预取功能
    flash.acr.modify(|_, w| {
        w.latency().ws5();
        w.dcen().enabled();
        w.icen().enabled();
        w.prften().enabled();
        w
    });

    // 配置 AHB 与 APB 分频
    // APB1 最高 45 MHz，APB2 最高 90 MHz
    rcc.cfgr.modify(|_, w| {
        w.hpre().div1();
        w.ppre1().div4();
        w.ppre2().div2();
        w
    });

    // 切换系统时钟源
    rcc.cfgr.modify(|_, w| w.sw().pll());
    wait_until(config::READY_SPIN_LIMIT, || rcc.cfgr.read().sws().is_pll())
        .at(ConfigStep::ClockSwitch)
}
