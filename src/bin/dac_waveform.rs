//! 用按钮切换 DAC 输出的波形
//!
//! 上电后 PA4 先输出三角波：DAC 内置的三角波发生器，由 TIM6 的 TRGO 驱动，
//! 每按一次 PC13 上的用户按钮，就在三角波与 6 阶的阶梯波之间切换一次，阶梯波由 DMA 不断从 Flash 中转运
//!
//! 中断处理函数只负责记录按钮被按下了，真正的拆除与重新配置 DAC 都在主循环里完成
//! 任何一步配置失败，LED3 都会常亮，程序停机，只能通过复位恢复

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::cell::RefCell;

    use cortex_m::{interrupt::Mutex, peripheral::NVIC};
    use panic_rtt_target as _;
    use rtt_target::{rprintln, rtt_init_print};
    use stm32f4xx_hal::{interrupt, pac, prelude::*};

    use dac_waveform::{board, ButtonLatch, Controller};

    // 中断与主循环之间唯一共享的状态
    // 它只由原子量组成，因此不需要 Mutex
    static BUTTON_LATCH: ButtonLatch = ButtonLatch::new();

    // 按钮的 GPIO 量，在中断处理函数中用于清理 Pending Register 中对应的 bit
    // 上电时无法构造它，因此先放一个 None，等主线程完成初始化后再注入
    static G_BUTTON: Mutex<RefCell<Option<board::UserButton>>> = Mutex::new(RefCell::new(None));

    #[cortex_m_rt::entry]
    fn main() -> ! {
        rtt_init_print!();
        rprintln!("Program Start");

        let Some(dp) = pac::Peripherals::take() else {
            panic!("device peripherals already taken");
        };

        let board = board::init(dp);

        cortex_m::interrupt::free(|cs| {
            G_BUTTON.borrow(cs).replace(Some(board.button));
        });

        // 共享资源就位之后，才让 NVIC 接受这些中断
        unsafe {
            NVIC::unmask(interrupt::EXTI15_10);
            NVIC::unmask(interrupt::TIM6_DAC);
            NVIC::unmask(interrupt::DMA1_STREAM5);
        }

        let mut controller = Controller::new(board.dac, board.tim6, board.led, &BUTTON_LATCH);
        if let Err(failure) = controller.initialize() {
            rprintln!("initialization failed: {}", failure);
        }

        // 第一轮循环就会把 DAC 配置为三角波
        controller.run()
    }

    #[interrupt]
    fn EXTI15_10() {
        cortex_m::interrupt::free(|cs| {
            if let Some(button) = G_BUTTON.borrow(cs).borrow_mut().as_mut() {
                button.clear_interrupt_pending_bit();
            }
        });

        let count = BUTTON_LATCH.on_button_press();
        rprintln!("button pressed, count: {}\r", count);
    }

    // DAC 检测到 DMA 的速度跟不上触发的速度
    //
    // under-run 之后 DAC 不会再发出 DMA 请求，阶梯波就停住了，
    // 因此这里请求主循环按照当前的波形重新配置一次
    #[interrupt]
    fn TIM6_DAC() {
        // 这里只写 DAC_SR，不会与主循环中的 DAC 驱动产生冲突
        let dac = unsafe { &*pac::DAC::ptr() };
        if dac.sr.read().dmaudr1().bit_is_set() {
            // DMAUDR1 是 rc_w1 的，写 1 才能清除
            dac.sr.write(|w| w.dmaudr1().underrun());
            BUTTON_LATCH.request_rearm();
            rprintln!("DMA under-run, re-arming");
        }
    }

    #[interrupt]
    fn DMA1_STREAM5() {
        let dma1 = unsafe { &*pac::DMA1::ptr() };

        let dma1_hisr_reader = dma1.hisr.read();

        if dma1_hisr_reader.teif5().is_error() {
            dma1.hifcr.write(|w| w.cteif5().clear());
            rprintln!("DMA Transfer error");
        }

        if dma1_hisr_reader.feif5().is_error() {
            dma1.hifcr.write(|w| w.cfeif5().clear());
            rprintln!("DMA FIFO error");
        }
    }
}

// 在 Host 上只编译库和它的单元测试，固件入口在这里什么都不做
#[cfg(not(target_os = "none"))]
fn main() {}
