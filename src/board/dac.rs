//! DAC Channel 1 + DMA1 Stream 5 的寄存器级驱动
//!
//! DAC 要使用 DMA，需要一个触发源，这里使用的是 TIM6 的 TRGO，触发的流程为：
//! TIM6 发生 Update Event，该 Event 通过 TRGO 传播到 DAC 模块，DAC 将 DHR 转运到 DOR，
//! 同时发出 DMA 请求，DMA 再将下一个采样点从 Flash 中转运到 DHR 寄存器里
//!
//! 三角波则完全不需要 DMA，DAC 每收到一次触发，就让内部的三角计数器加一或减一，
//! 输出值为 DHR 加上三角计数器的值

use stm32f4xx_hal::{gpio, pac};

use super::{rcc_regs, wait_until};
use crate::channel::{ChannelConfig, ChannelLifecycle, DacChannel, OutputBuffer, Trigger};
use crate::config;
use crate::error::PeripheralError;
use crate::waveform::{Alignment, TriangleAmplitude};

pub struct Stm32Dac {
    dac: pac::DAC,
    dma: pac::DMA1,
    _pin: gpio::Pin<'A', 4, gpio::Analog>,
    lifecycle: ChannelLifecycle,
}

impl Stm32Dac {
    pub fn new(dac: pac::DAC, dma: pac::DMA1, pin: gpio::Pin<'A', 4, gpio::Analog>) -> Self {
        Self {
            dac,
            dma,
            _pin: pin,
            lifecycle: ChannelLifecycle::new(),
        }
    }

    /// 各数据格式对应的 DHR 寄存器的 AHB 地址
    fn dhr_address(&self, align: Alignment) -> u32 {
        match align {
            Alignment::Right8 => self.dac.dhr8r1.as_ptr() as u32,
            Alignment::Right12 => self.dac.dhr12r1.as_ptr() as u32,
            Alignment::Left12 => self.dac.dhr12l1.as_ptr() as u32,
        }
    }

    fn clear_stream_flags(&self) {
        // Stream 5 的标志位在 HISR / HIFCR 中
        self.dma.hifcr.write(|w| {
            w.ctcif5().clear();
            w.chtif5().clear();
            w.cteif5().clear();
            w.cdmeif5().clear();
            w.cfeif5().clear();
            w
        });
    }
}

impl DacChannel for Stm32Dac {
    fn deinit(&mut self) -> Result<(), PeripheralError> {
        let stream = &self.dma.st[config::DAC_DMA_STREAM];

        // 关闭 DMA Stream，写入 EN = 0 之后，需要等待当前的传输完成，EN 才会真正变为 0
        if stream.cr.read().en().is_enabled() {
            stream.cr.modify(|_, w| w.en().disabled());
            wait_until(config::DMA_DISABLE_SPIN_LIMIT, || {
                stream.cr.read().en().is_disabled()
            })?;
        }
        self.clear_stream_flags();

        // 通过 RCC 复位整个 DAC 模块，DAC_CR 中的三角波、DMA 等设置会被全部清除
        let rcc = rcc_regs();
        rcc.apb1rstr.modify(|_, w| w.dacrst().set_bit());
        rcc.apb1rstr.modify(|_, w| w.dacrst().clear_bit());

        self.lifecycle.deinit();
        Ok(())
    }

    fn init(&mut self) -> Result<(), PeripheralError> {
        self.lifecycle.init()?;

        let rcc = rcc_regs();
        rcc.apb1enr.modify(|_, w| w.dacen().enabled());
        rcc.ahb1enr.modify(|_, w| w.dma1en().enabled());
        Ok(())
    }

    fn configure(&mut self, config: &ChannelConfig) -> Result<(), PeripheralError> {
        self.lifecycle.configure()?;

        self.dac.cr.modify(|_, w| {
            match config.trigger {
                Trigger::Tim6Trgo => w.tsel1().tim6_trgo(),
                Trigger::Tim8Trgo => w.tsel1().tim8_trgo(),
                Trigger::Tim7Trgo => w.tsel1().tim7_trgo(),
                Trigger::Tim5Trgo => w.tsel1().tim5_trgo(),
                Trigger::Tim2Trgo => w.tsel1().tim2_trgo(),
                Trigger::Tim4Trgo => w.tsel1().tim4_trgo(),
                Trigger::Exti9 => w.tsel1().exti9(),
                Trigger::Software => w.tsel1().software(),
            };
            // 让 DAC 接受触发
            w.ten1().enabled();
            // BOFF 置位表示关闭输出缓冲
            w.boff1().bit(config.output_buffer == OutputBuffer::Disabled);
            w
        });
        Ok(())
    }

    fn triangle_generate(&mut self, amplitude: TriangleAmplitude) -> Result<(), PeripheralError> {
        self.lifecycle.check_triangle()?;

        self.dac.cr.modify(|_, w| {
            w.wave1().triangle();
            unsafe { w.mamp1().bits(amplitude.mamp_bits()) };
            w
        });
        Ok(())
    }

    fn start(&mut self) -> Result<(), PeripheralError> {
        self.lifecycle.start()?;

        self.dac.cr.modify(|_, w| w.en1().enabled());
        Ok(())
    }

    fn set_value(&mut self, align: Alignment, value: u16) -> Result<(), PeripheralError> {
        self.lifecycle.check_value(align, value)?;

        match align {
            Alignment::Right8 => self.dac.dhr8r1.write(|w| w.dacc1dhr().bits(value as u8)),
            Alignment::Right12 => self.dac.dhr12r1.write(|w| w.dacc1dhr().bits(value)),
            Alignment::Left12 => self.dac.dhr12l1.write(|w| w.dacc1dhr().bits(value >> 4)),
        }
        Ok(())
    }

    fn start_dma(&mut self, table: &'static [u8], align: Alignment) -> Result<(), PeripheralError> {
        // 采样点以 u8 存储，因此只能以 8 bit 的宽度搬运
        if align != Alignment::Right8 {
            return Err(PeripheralError::Unsupported);
        }
        if table.is_empty() || table.len() > u16::MAX as usize {
            return Err(PeripheralError::ValueOutOfRange);
        }

        let stream = &self.dma.st[config::DAC_DMA_STREAM];
        if stream.cr.read().en().is_enabled() {
            return Err(PeripheralError::Busy);
        }
        self.lifecycle.start()?;

        stream.cr.modify(|_, w| {
            // 将 Stream 5 切换到 Channel 7
            w.chsel().bits(config::DAC_DMA_CHANNEL);
            // 运输方向为内存到外设模式
            w.dir().memory_to_peripheral();
            // 由于我们要不断输出阶梯波，因此要启动循环模式
            w.circ().enabled();
            // 内存端和外设端都是 8 bit 宽度
            w.msize().bits8();
            w.psize().bits8();
            // 内存端的访问是自增的，外设端则因为 DHR 的地址是固定的，不需要自增
            w.minc().incremented();
            w.pinc().fixed();
            w.pl().high();
            // 传输错误时触发中断
            w.teie().enabled();
            w
        });

        // 给出采样点的实际内存地址（准确说是 AHB 地址）
        stream
            .m0ar
            .write(|w| unsafe { w.bits(table.as_ptr() as u32) });
        // 给出 DHR 的实际内存地址
        let dhr = self.dhr_address(align);
        stream.par.write(|w| unsafe { w.pa().bits(dhr) });
        // 内存端和外设端宽度一致，转移计数就是采样点的个数
        stream.ndtr.write(|w| w.ndt().bits(table.len() as u16));

        self.clear_stream_flags();
        stream.cr.modify(|_, w| w.en().enabled());

        self.dac.cr.modify(|_, w| {
            // DAC 被 TRGO 触发的时候，顺便触发 DMA 请求
            w.dmaen1().enabled();
            // 如果 DAC 检测到了错误（比如 DMA 运行的速度不够），就挂起中断标识符
            w.dmaudrie1().enabled();
            w
        });
        self.dac.cr.modify(|_, w| w.en1().enabled());
        Ok(())
    }
}
